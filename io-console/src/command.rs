//! The operator command language.
//!
//! | line      | effect                                              |
//! |-----------|-----------------------------------------------------|
//! | `/fu<N>`  | presenter runs at `N` Hz                            |
//! | `/fb<N>`  | input sampler runs at `N` Hz                        |
//! | `/fa<N>`  | analog sampler runs at `N` Hz                       |
//! | `/fo<N>`  | output driver runs at `N` Hz                        |
//! | `/b<x>`   | report input `x` (1-4)                              |
//! | `/o<x>_<y>` | post level `y` (0/1) to output `x` (1-4)          |
//! | `/a`      | report the analog reading                           |
//!
//! Matching is case-sensitive and exact: a line either parses completely
//! or is rejected without touching any state. Surrounding ASCII whitespace
//! is ignored, so a terminal sending CR LF still works.

use core::fmt;

use crate::error::CommandError;
use crate::presenter::Transcript;
use crate::schedule::{Period, TaskKind, TaskPeriods};
use crate::state::{AnalogReading, Channel, InputBank};
use crate::sync::{Mutex, PendingOutputs};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetFrequency { kind: TaskKind, hz: u32 },
    ReadInput(Channel),
    SetOutput { channel: Channel, level: bool },
    ReadAnalog,
}

impl Command {
    pub fn parse(line: &[u8]) -> Result<Command, CommandError> {
        let line = trim(line);
        let rest = match line {
            [] => return Err(CommandError::Empty),
            [b'/', rest @ ..] => rest,
            _ => return Err(CommandError::UnknownCommand),
        };
        match rest {
            [b'f', selector, number @ ..] => {
                let kind = TaskKind::from_selector(*selector).ok_or(CommandError::UnknownCommand)?;
                let hz = parse_decimal(number)?;
                Period::from_hz(hz)?;
                Ok(Command::SetFrequency { kind, hz })
            }
            [b'b', tail @ ..] => {
                let (channel, tail) = parse_channel(tail)?;
                end(tail)?;
                Ok(Command::ReadInput(channel))
            }
            [b'o', tail @ ..] => {
                let (channel, tail) = parse_channel(tail)?;
                let tail = match tail {
                    [b'_', tail @ ..] => tail,
                    _ => return Err(CommandError::MissingSeparator),
                };
                let (level, tail) = match tail {
                    [b'0', tail @ ..] => (false, tail),
                    [b'1', tail @ ..] => (true, tail),
                    _ => return Err(CommandError::BadLevel),
                };
                end(tail)?;
                Ok(Command::SetOutput { channel, level })
            }
            [b'a', tail @ ..] => {
                end(tail)?;
                Ok(Command::ReadAnalog)
            }
            _ => Err(CommandError::UnknownCommand),
        }
    }
}

fn trim(mut line: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = line {
        if !first.is_ascii_whitespace() {
            break;
        }
        line = rest;
    }
    while let [rest @ .., last] = line {
        if !last.is_ascii_whitespace() {
            break;
        }
        line = rest;
    }
    line
}

fn parse_decimal(digits: &[u8]) -> Result<u32, CommandError> {
    if digits.is_empty() {
        return Err(CommandError::MissingNumber);
    }
    digits.iter().try_fold(0u32, |acc, &d| {
        if !d.is_ascii_digit() {
            return Err(CommandError::BadNumber);
        }
        acc.checked_mul(10)
            .and_then(|acc| acc.checked_add(u32::from(d - b'0')))
            .ok_or(CommandError::BadNumber)
    })
}

fn parse_channel(tail: &[u8]) -> Result<(Channel, &[u8]), CommandError> {
    match tail {
        [digit, rest @ ..] => Channel::from_digit(*digit)
            .map(|channel| (channel, rest))
            .ok_or(CommandError::BadChannel),
        [] => Err(CommandError::BadChannel),
    }
}

fn end(tail: &[u8]) -> Result<(), CommandError> {
    if tail.is_empty() {
        Ok(())
    } else {
        Err(CommandError::TrailingInput)
    }
}

/// What the interpreter acts on.
pub trait Machine {
    /// Retunes `kind` to run at `hz`.
    fn set_frequency(&mut self, kind: TaskKind, hz: u32) -> Result<Period, CommandError>;
    fn input_level(&mut self, channel: Channel) -> bool;
    /// Posts `level` to the channel's mailbox. The apply task is woken only
    /// when the mailbox was empty; a level posted over an unconsumed one is
    /// picked up by the wake-up already outstanding, so there is never more
    /// than one wake-up per channel in flight.
    fn post_output(&mut self, channel: Channel, level: bool);
    fn analog_reading(&mut self) -> AnalogReading;
}

/// [`Machine`] over the shared state: unguarded inputs and periods, the
/// analog and mailbox gates, and a hook that wakes an apply task.
///
/// `wake` is called with no gate held.
pub struct Bindings<'a, A, P, W> {
    pub periods: &'a TaskPeriods,
    pub inputs: &'a InputBank,
    pub analog: A,
    pub pending: P,
    pub wake: W,
}

impl<'a, A, P, W> Machine for Bindings<'a, A, P, W>
where
    A: Mutex<T = AnalogReading>,
    P: Mutex<T = PendingOutputs>,
    W: FnMut(Channel),
{
    fn set_frequency(&mut self, kind: TaskKind, hz: u32) -> Result<Period, CommandError> {
        self.periods.set(kind, hz)
    }

    fn input_level(&mut self, channel: Channel) -> bool {
        self.inputs.level(channel)
    }

    fn post_output(&mut self, channel: Channel, level: bool) {
        let displaced = self.pending.lock(|pending| pending.post(channel, level));
        if displaced.is_none() {
            (self.wake)(channel);
        }
    }

    fn analog_reading(&mut self) -> AnalogReading {
        self.analog.lock(|reading| *reading)
    }
}

/// Outcome of one line, as shown on the status page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    FrequencySet { kind: TaskKind, hz: u32 },
    Input { channel: Channel, pressed: bool },
    OutputPosted { channel: Channel, level: bool },
    Analog(AnalogReading),
    Invalid(CommandError),
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Reply::FrequencySet { kind, hz } => write!(f, "{} frequency set to {} Hz", kind.label(), hz),
            Reply::Input { channel, pressed } => {
                write!(f, "Button {} state: {}", channel.number(), pressed as u8)
            }
            Reply::OutputPosted { channel, level } => {
                write!(f, "Output {} set to {}", channel.number(), level as u8)
            }
            Reply::Analog(AnalogReading(value)) => write!(f, "ADC value is: {}", value),
            Reply::Invalid(_) => f.write_str("Invalid command"),
        }
    }
}

/// Runs a parsed command to completion.
pub fn execute<M: Machine>(command: Command, machine: &mut M) -> Reply {
    match command {
        Command::SetFrequency { kind, hz } => match machine.set_frequency(kind, hz) {
            Ok(_) => Reply::FrequencySet { kind, hz },
            Err(error) => Reply::Invalid(error),
        },
        Command::ReadInput(channel) => Reply::Input {
            channel,
            pressed: machine.input_level(channel),
        },
        Command::SetOutput { channel, level } => {
            machine.post_output(channel, level);
            Reply::OutputPosted { channel, level }
        }
        Command::ReadAnalog => Reply::Analog(machine.analog_reading()),
    }
}

/// Parses and runs one line, then records the line and its result for the
/// status page.
pub fn interpret<M, G>(line: &[u8], machine: &mut M, transcript: &mut G) -> Reply
where
    M: Machine,
    G: Mutex<T = Transcript>,
{
    let reply = match Command::parse(line) {
        Ok(command) => execute(command, machine),
        Err(error) => Reply::Invalid(error),
    };
    transcript.lock(|transcript| transcript.record(line, &reply));
    reply
}
