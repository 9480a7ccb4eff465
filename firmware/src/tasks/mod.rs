//! This module contains RTIC tasks for doing various things.
//! Each task is in its own submodule, and is pub(crate) re-exported by this module for usage.
//!

/// Re-spawns a periodic task according to what its release bookkeeping
/// decided: at the release instant, or right away after an overrun.
macro_rules! reschedule {
    ($task:ident, $wake:expr) => {
        let spawned = match $wake {
            io_console::Wake::At(release) => $task::spawn_at(release.0).is_ok(),
            io_console::Wake::Overrun => {
                rtt_target::rprintln!("[WARNING] {} overran its period.", stringify!($task));
                $task::spawn().is_ok()
            }
        };
        if !spawned {
            rtt_target::rprintln!("[ERROR] failed to re-spawn {}!", stringify!($task));
        }
    };
}

/*
   private interface
*/

/// USART2 receive interrupt and the line-processing task behind it.
mod usart2_rx;

/// Output-apply task and the periodic output driver.
mod outputs;

/// Periodic samplers for the buttons and the ADC.
mod sampling;

/// Periodic status page on USART2.
mod status_page;

/*
    public(crate) interface
*/
pub(crate) use outputs::{apply_output, drive_outputs};
pub(crate) use sampling::{sample_analog, sample_inputs};
pub(crate) use status_page::present_status;
pub(crate) use usart2_rx::{on_usart2, process_rx};
