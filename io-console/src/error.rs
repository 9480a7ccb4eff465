//! Error kinds, one enum per concern.

/// A failed analog sample. The sampler keeps the previous reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleError {
    /// The converter reported a failure.
    Conversion,
    /// No conversion result was available.
    NotReady,
    /// The raw code is above the converter's full scale.
    OutOfRange(u16),
}

/// Why a line was not accepted as a command.
///
/// Every variant is reported to the operator as `Invalid command`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    Empty,
    UnknownCommand,
    MissingNumber,
    BadNumber,
    ZeroFrequency,
    FrequencyTooHigh,
    BadChannel,
    MissingSeparator,
    BadLevel,
    TrailingInput,
}

/// Faults seen on the receive path. Counted in interrupt context and
/// reported later from task context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxError {
    /// The handoff queue was full and the byte was dropped.
    QueueFull,
    Overrun,
    Framing,
    Noise,
    Parity,
}

/// The transport refused to re-enable reception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RearmError;

/// Conditions the device cannot run through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fatal {
    /// Reception stopped and could not be re-armed; no further command
    /// would ever arrive.
    ReceiverLost,
}

impl From<RearmError> for Fatal {
    fn from(_: RearmError) -> Self {
        Fatal::ReceiverLost
    }
}
