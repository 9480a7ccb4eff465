use io_console::{tasks, TaskKind};
use rtt_target::rprintln;

use crate::app::{sample_analog, sample_inputs, ANALOG_SCALE};
use crate::board::Tick;
use crate::PERIODS;

/// Copies the buttons into the input bank. The bank is atomic, so no lock.
pub(crate) fn sample_inputs(context: sample_inputs::Context) {
    let release = context.local.inputs_release;
    release.arm(Tick::now(), PERIODS.get(TaskKind::Inputs));

    tasks::sample_inputs(context.local.buttons, &crate::INPUTS);

    // the period is re-read so a retune applies from the next release on
    reschedule!(
        sample_inputs,
        release.complete(Tick::now(), PERIODS.get(TaskKind::Inputs))
    );
}

pub(crate) fn sample_analog(mut context: sample_analog::Context) {
    let release = context.local.analog_release;
    release.arm(Tick::now(), PERIODS.get(TaskKind::Analog));

    // conversion happens before the lock is taken
    if let Err(e) = tasks::sample_analog(context.local.adc, ANALOG_SCALE, &mut context.shared.analog) {
        rprintln!("[WARNING] analog sample failed ({:?}), keeping the previous reading.", e);
    }

    reschedule!(
        sample_analog,
        release.complete(Tick::now(), PERIODS.get(TaskKind::Analog))
    );
}
