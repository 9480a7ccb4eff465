use core::iter;
use core::str;

use io_console::assembler::{self, Line};
use io_console::{tasks, Bindings, Reply};
use rtt_target::rprintln;

use crate::app::{apply_output, on_usart2, process_rx};
use crate::{INPUTS, PERIODS, RX_STATS};

/// Handles the USART2 interrupt.
///
/// Runs at raised priority and only moves bytes into the queue: no logging,
/// no locks. Faults are counted in `RX_STATS`, and every fault re-arms the
/// receiver before the next byte is read.
pub(crate) fn on_usart2(context: on_usart2::Context) {
    let receiver = match context.local.receiver {
        Some(receiver) => receiver,
        None => return,
    };
    let producer = context.local.rx_producer;

    loop {
        match receiver.read_byte() {
            Ok(byte) => {
                // a full queue drops the byte and counts it
                let _ = assembler::deliver_byte(producer, byte, &RX_STATS);
            }
            Err(nb::Error::WouldBlock) => break,
            Err(nb::Error::Other(error)) => {
                RX_STATS.record(error);
                if let Err(fatal) = assembler::recover_receiver(receiver) {
                    panic!("USART2 receiver could not be re-armed: {:?}", fatal);
                }
                RX_STATS.record_rearm();
            }
        }
    }

    // already pending is fine, it drains everything that is queued
    let _ = process_rx::spawn();
}

/// Drains the byte queue into the line assembler and runs every completed
/// line as a command.
pub(crate) fn process_rx(context: process_rx::Context) {
    let consumer = context.local.rx_consumer;
    let mut transcript = context.shared.transcript;
    let mut machine = Bindings {
        periods: &PERIODS,
        inputs: &INPUTS,
        analog: context.shared.analog,
        pending: context.shared.pending,
        wake: |channel| {
            if apply_output::spawn(channel).is_err() {
                rprintln!(
                    "[ERROR] could not wake the apply task, output {} is stuck pending!",
                    channel.number()
                );
            }
        },
    };

    tasks::process_received(
        iter::from_fn(|| consumer.dequeue()),
        context.local.assembler,
        &mut machine,
        &mut transcript,
        log_line,
    );

    let faults = RX_STATS.take();
    if !faults.is_clean() {
        rprintln!("[WARNING] USART2 receive faults: {:?}", faults);
    }
}

fn log_line(line: &Line, reply: &Reply) {
    let text = str::from_utf8(line.as_bytes()).unwrap_or("<non-utf8>");
    if line.is_truncated() {
        rprintln!("[WARNING] line overflowed, kept the first {} bytes.", line.as_bytes().len());
    }
    match reply {
        Reply::Invalid(e) => rprintln!("rx {:?} rejected: {:?}", text, e),
        reply => rprintln!("rx {:?} -> {}", text, reply),
    }
}
