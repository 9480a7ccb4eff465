//! Board bindings for the Nucleo-F446RE: the io-console collaborator traits
//! implemented on top of stm32f4xx-hal peripherals.

use core::fmt::Write;

use dwt_systick_monotonic::DwtSystick;
use io_console::config::CHANNELS;
use io_console::error::{RearmError, RxError, SampleError};
use io_console::hal::{AnalogSource, InputPins, OutputPins, SerialReceiver, TextSink};
use io_console::schedule::Timestamp;
use io_console::Channel;
use rtic::time::{duration::Microseconds, Instant};
use rtt_target::rprintln;
use stm32f4xx_hal::{
    adc::Adc,
    gpio::{gpioa::PA1, Analog, ErasedPin, Input, Output, PullUp, PushPull},
    hal::{
        adc::OneShot,
        digital::v2::{InputPin, OutputPin},
        serial::Read,
    },
    serial::{self, Rx, Tx},
    stm32::{ADC1, USART2},
};

/// SYSCLK, which also clocks the DWT cycle counter behind the monotonic.
pub(crate) const MONOTONIC_FREQ: u32 = 48_000_000;

/// Monotonic timer type.
pub(crate) type Mono = DwtSystick<MONOTONIC_FREQ>;

/// A point in time on the monotonic, as seen by the release bookkeeping.
/// Ordering goes through `Instant`, which compares across counter wrap.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Tick(pub(crate) Instant<Mono>);

impl Tick {
    pub(crate) fn now() -> Self {
        Tick(crate::app::monotonics::SysMono::now())
    }
}

impl Timestamp for Tick {
    fn add_micros(self, micros: u32) -> Self {
        Tick(self.0 + Microseconds(micros))
    }
}

/// User buttons on PC0..PC3, wired to ground with the internal pull-ups on.
pub(crate) struct Buttons(pub(crate) [ErasedPin<Input<PullUp>>; CHANNELS]);

impl InputPins for Buttons {
    fn read_input(&mut self, channel: Channel) -> bool {
        // active low
        self.0[channel.index()].is_low().unwrap_or(false)
    }
}

/// LEDs on PB0..PB3.
pub(crate) struct Leds(pub(crate) [ErasedPin<Output<PushPull>>; CHANNELS]);

impl OutputPins for Leds {
    fn set_output(&mut self, channel: Channel, level: bool) {
        let pin = &mut self.0[channel.index()];
        // infallible on this chip
        let _ = if level { pin.set_high() } else { pin.set_low() };
    }
}

/// Potentiometer on PA1, ADC1 in 10-bit mode.
pub(crate) struct AnalogInput {
    pub(crate) adc: Adc<ADC1>,
    pub(crate) pin: PA1<Analog>,
}

impl AnalogSource for AnalogInput {
    fn sample_analog(&mut self) -> Result<u16, SampleError> {
        match self.adc.read(&mut self.pin) {
            Ok(raw) => Ok(raw),
            Err(nb::Error::WouldBlock) => Err(SampleError::NotReady),
            Err(nb::Error::Other(_)) => Err(SampleError::Conversion),
        }
    }
}

/// Transmit half of USART2, where the status page goes.
pub(crate) struct Console(pub(crate) Tx<USART2>);

impl TextSink for Console {
    fn emit_text(&mut self, text: &str) {
        if self.0.write_str(text).is_err() {
            rprintln!("[WARNING] failed to write the status page to USART2.");
        }
    }
}

/// Receive half of USART2.
pub(crate) struct Receiver(pub(crate) Rx<USART2>);

impl Receiver {
    /// Takes the next byte off the data register, if any.
    pub(crate) fn read_byte(&mut self) -> nb::Result<u8, RxError> {
        self.0.read().map_err(|error| error.map(rx_error))
    }
}

impl SerialReceiver for Receiver {
    fn rearm(&mut self) -> Result<(), RearmError> {
        self.0.listen();
        Ok(())
    }
}

#[allow(unreachable_patterns)]
fn rx_error(error: serial::Error) -> RxError {
    match error {
        serial::Error::Overrun => RxError::Overrun,
        serial::Error::Framing => RxError::Framing,
        serial::Error::Noise => RxError::Noise,
        serial::Error::Parity => RxError::Parity,
        _ => RxError::Framing,
    }
}
