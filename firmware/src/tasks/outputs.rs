use io_console::{tasks, Channel, TaskKind};
use rtt_target::rprintln;

use crate::app::{apply_output, drive_outputs};
use crate::board::Tick;
use crate::PERIODS;

/// Consumes `channel`'s mailbox into the output bank. Only an empty
/// mailbox wakes this task, so it always finds a level waiting.
pub(crate) fn apply_output(context: apply_output::Context, channel: Channel) {
    let mut pending = context.shared.pending;
    let mut outputs = context.shared.outputs;
    if tasks::apply_output(channel, &mut pending, &mut outputs).is_none() {
        rprintln!(
            "[WARNING] apply task for output {} woke to an empty mailbox.",
            channel.number()
        );
    }
}

/// Re-asserts every logical output on its LED.
pub(crate) fn drive_outputs(mut context: drive_outputs::Context) {
    let release = context.local.outputs_release;
    release.arm(Tick::now(), PERIODS.get(TaskKind::Outputs));

    tasks::drive_outputs(&mut context.shared.outputs, context.local.leds);

    reschedule!(
        drive_outputs,
        release.complete(Tick::now(), PERIODS.get(TaskKind::Outputs))
    );
}
