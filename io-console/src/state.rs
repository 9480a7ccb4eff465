//! The shared state table: input levels, output levels and the latest
//! analog reading.
//!
//! The table is split into three field groups, each with its own access
//! discipline:
//!
//! - inputs ([`InputBank`]) have a single writer and are read without a
//!   gate. They are stored in one atomic byte so a reader never sees a torn
//!   value, only a stale one.
//! - outputs ([`OutputBank`]) live behind one gate shared by the apply tasks
//!   and the output driver.
//! - the analog reading ([`AnalogReading`]) lives behind its own gate,
//!   shared by the sampler and the `/a` command.

use core::sync::atomic::{AtomicU8, Ordering};

use crate::config::CHANNELS;

/// One of the four digital channels, stored zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel(u8);

impl Channel {
    pub const ALL: [Channel; CHANNELS] = [Channel(0), Channel(1), Channel(2), Channel(3)];

    /// Channel for a zero-based index, if in range.
    pub fn new(index: usize) -> Option<Self> {
        if index < CHANNELS {
            Some(Channel(index as u8))
        } else {
            None
        }
    }

    /// Parses the operator-facing ASCII digit `'1'..='4'`.
    pub fn from_digit(digit: u8) -> Option<Self> {
        match digit {
            b'1'..=b'9' => Self::new((digit - b'1') as usize),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// One-based number, as the operator types it.
    pub fn number(self) -> u8 {
        self.0 + 1
    }
}

/// Input levels, written only by the input sampler.
#[derive(Debug, Default)]
pub struct InputBank {
    bits: AtomicU8,
}

impl InputBank {
    pub const fn new() -> Self {
        Self {
            bits: AtomicU8::new(0),
        }
    }

    /// Publishes a full set of levels in one store.
    pub fn store(&self, levels: [bool; CHANNELS]) {
        let bits = levels
            .iter()
            .enumerate()
            .fold(0u8, |acc, (i, &on)| if on { acc | (1 << i) } else { acc });
        self.bits.store(bits, Ordering::Relaxed);
    }

    pub fn level(&self, channel: Channel) -> bool {
        self.bits.load(Ordering::Relaxed) & (1 << channel.index()) != 0
    }

    pub fn levels(&self) -> [bool; CHANNELS] {
        let bits = self.bits.load(Ordering::Relaxed);
        let mut levels = [false; CHANNELS];
        for (i, level) in levels.iter_mut().enumerate() {
            *level = bits & (1 << i) != 0;
        }
        levels
    }
}

/// Logical output levels. Only ever touched under the outputs gate.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OutputBank {
    levels: [bool; CHANNELS],
}

impl OutputBank {
    pub const fn new() -> Self {
        Self {
            levels: [false; CHANNELS],
        }
    }

    pub fn set(&mut self, channel: Channel, level: bool) {
        self.levels[channel.index()] = level;
    }

    pub fn level(&self, channel: Channel) -> bool {
        self.levels[channel.index()]
    }

    pub fn levels(&self) -> [bool; CHANNELS] {
        self.levels
    }
}

/// Latest derived analog reading. Only ever touched under the analog gate.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AnalogReading(pub i32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_digits_are_one_based() {
        assert_eq!(Channel::from_digit(b'1'), Some(Channel(0)));
        assert_eq!(Channel::from_digit(b'4').map(Channel::number), Some(4));
        assert_eq!(Channel::from_digit(b'0'), None);
        assert_eq!(Channel::from_digit(b'5'), None);
        assert_eq!(Channel::from_digit(b'x'), None);
    }

    #[test]
    fn input_bank_keeps_levels_per_channel() {
        let bank = InputBank::new();
        assert_eq!(bank.levels(), [false; CHANNELS]);

        bank.store([true, false, true, false]);
        assert!(bank.level(Channel::ALL[0]));
        assert!(!bank.level(Channel::ALL[1]));
        assert!(bank.level(Channel::ALL[2]));
        assert_eq!(bank.levels(), [true, false, true, false]);

        bank.store([false, false, false, true]);
        assert_eq!(bank.levels(), [false, false, false, true]);
    }

    #[test]
    fn output_bank_starts_off() {
        let mut bank = OutputBank::new();
        assert_eq!(bank.levels(), [false; CHANNELS]);
        bank.set(Channel::ALL[1], true);
        assert!(bank.level(Channel::ALL[1]));
        assert_eq!(bank.levels(), [false, true, false, false]);
    }
}
