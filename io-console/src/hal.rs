//! The hardware the core depends on.
//! The firmware implements these on top of the board's HAL; tests implement
//! them on plain arrays.

use crate::config::CHANNELS;
use crate::error::{RearmError, SampleError};
use crate::state::Channel;

/// Digital inputs.
pub trait InputPins {
    /// Logical level of one input, `true` when the button is pressed.
    fn read_input(&mut self, channel: Channel) -> bool;

    fn read_all(&mut self) -> [bool; CHANNELS] {
        let mut levels = [false; CHANNELS];
        for channel in Channel::ALL.iter().copied() {
            levels[channel.index()] = self.read_input(channel);
        }
        levels
    }
}

/// Digital outputs.
pub trait OutputPins {
    fn set_output(&mut self, channel: Channel, level: bool);
}

/// The analog channel.
pub trait AnalogSource {
    /// Takes one raw sample.
    fn sample_analog(&mut self) -> Result<u16, SampleError>;
}

/// Where the status page goes.
pub trait TextSink {
    fn emit_text(&mut self, text: &str);
}

/// The receive side of the serial transport.
pub trait SerialReceiver {
    /// Re-enables reception after the transport stopped it.
    fn rearm(&mut self) -> Result<(), RearmError>;
}
