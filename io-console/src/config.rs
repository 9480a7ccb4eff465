//! Compile-time configuration. There is no run-time configuration source;
//! buffer sizes and the boot-time task periods are fixed here.

/// Number of digital inputs, digital outputs and output-apply tasks.
pub const CHANNELS: usize = 4;

/// Line buffer capacity in bytes, including the slot reserved for the
/// terminator sentinel.
pub const LINE_CAPACITY: usize = 60;

/// Byte handoff between the receive interrupt and the line assembler.
/// `heapless::spsc::Queue<_, N>` holds `N - 1` elements.
pub const RX_QUEUE_CAPACITY: usize = 64;

/// Bytes kept for the last command result.
pub const STATUS_CAPACITY: usize = 64;

/// Bytes for one rendered status page.
pub const PAGE_CAPACITY: usize = 1024;

/// Boot-time periods, milliseconds.
pub const PRESENTER_PERIOD_MS: u32 = 1000;
pub const INPUTS_PERIOD_MS: u32 = 200;
pub const ANALOG_PERIOD_MS: u32 = 200;
pub const OUTPUTS_PERIOD_MS: u32 = 200;

/// Largest frequency accepted by `/f*`; anything faster has no whole
/// microsecond left in its period.
pub const MAX_FREQUENCY_HZ: u32 = 1_000_000;

/// 10-bit conversion over a 0..3 V input range.
pub const ADC_FULL_SCALE: u16 = 1023;
pub const ADC_REFERENCE_MV: i32 = 3000;
