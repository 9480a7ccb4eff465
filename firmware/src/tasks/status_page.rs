use io_console::{tasks, TaskKind};
use rtt_target::rprintln;

use crate::app::present_status;
use crate::board::Tick;
use crate::PERIODS;

pub(crate) fn present_status(mut context: present_status::Context) {
    let release = context.local.presenter_release;
    release.arm(Tick::now(), PERIODS.get(TaskKind::Presenter));

    // without a console there is nowhere to render to
    if let Some(console) = context.local.console.as_mut() {
        if tasks::present(
            &PERIODS,
            &mut context.shared.transcript,
            &mut **context.local.page,
            console,
        )
        .is_err()
        {
            rprintln!("[ERROR] status page did not fit its buffer!");
        }
    }

    reschedule!(
        present_status,
        release.complete(Tick::now(), PERIODS.get(TaskKind::Presenter))
    );
}
