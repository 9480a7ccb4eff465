//! One unit of work per task. The caller owns the loop and the timing
//! (see [`crate::schedule::Release`]); these functions only touch state.
//!
//! Every gate is taken, used and released inside a single call, and no
//! function holds two gates at the same time.

use core::fmt;

use heapless::String;

use crate::analog::AnalogScale;
use crate::assembler::{Feed, Line, LineAssembler};
use crate::command::{self, Machine, Reply};
use crate::config::CHANNELS;
use crate::error::SampleError;
use crate::hal::{AnalogSource, InputPins, OutputPins, TextSink};
use crate::presenter::{self, Transcript};
use crate::schedule::TaskPeriods;
use crate::state::{AnalogReading, Channel, InputBank, OutputBank};
use crate::sync::{Mutex, PendingOutputs};

/// Input sampler: copies the physical inputs into the table, unguarded.
pub fn sample_inputs<P: InputPins>(pins: &mut P, inputs: &InputBank) -> [bool; CHANNELS] {
    let levels = pins.read_all();
    inputs.store(levels);
    levels
}

/// Analog sampler. On error nothing is written and the previous reading
/// stays in place.
pub fn sample_analog<S, G>(
    source: &mut S,
    scale: AnalogScale,
    reading: &mut G,
) -> Result<AnalogReading, SampleError>
where
    S: AnalogSource,
    G: Mutex<T = AnalogReading>,
{
    // convert before taking the gate
    let value = AnalogReading(scale.convert(source.sample_analog()?)?);
    reading.lock(|reading| *reading = value);
    Ok(value)
}

/// Output-apply task for one channel: consumes the channel's mailbox and
/// copies the level into the output bank. `None` when nothing was pending,
/// which a wake-up discipline of one per empty mailbox never produces.
pub fn apply_output<P, O>(channel: Channel, pending: &mut P, outputs: &mut O) -> Option<bool>
where
    P: Mutex<T = PendingOutputs>,
    O: Mutex<T = OutputBank>,
{
    let level = pending.lock(|pending| pending.take(channel))?;
    outputs.lock(|outputs| outputs.set(channel, level));
    Some(level)
}

/// Output driver: asserts every logical output on its pin in one critical
/// section. Runs periodically so a lost pin write is corrected on the next
/// cycle.
pub fn drive_outputs<O, P>(outputs: &mut O, pins: &mut P) -> [bool; CHANNELS]
where
    O: Mutex<T = OutputBank>,
    P: OutputPins,
{
    outputs.lock(|outputs| {
        for channel in Channel::ALL.iter().copied() {
            pins.set_output(channel, outputs.level(channel));
        }
        outputs.levels()
    })
}

/// Presenter: renders the page under the transcript gate, then emits it
/// with no gate held.
pub fn present<G, S, const N: usize>(
    periods: &TaskPeriods,
    transcript: &mut G,
    page: &mut String<N>,
    sink: &mut S,
) -> fmt::Result
where
    G: Mutex<T = Transcript>,
    S: TextSink,
{
    page.clear();
    transcript.lock(|transcript| presenter::render_page(&mut *page, periods, transcript))?;
    sink.emit_text(page.as_str());
    Ok(())
}

/// Feeds received bytes through the assembler and interprets every line it
/// completes. `on_line` sees each line with its reply, for logging.
pub fn process_received<I, M, G, F>(
    bytes: I,
    assembler: &mut LineAssembler,
    machine: &mut M,
    transcript: &mut G,
    mut on_line: F,
) where
    I: IntoIterator<Item = u8>,
    M: Machine,
    G: Mutex<T = Transcript>,
    F: FnMut(&Line, &Reply),
{
    for byte in bytes {
        if let Feed::Line(line) = assembler.push(byte) {
            let reply = command::interpret(line.as_bytes(), machine, transcript);
            on_line(&line, &reply);
        }
    }
}
