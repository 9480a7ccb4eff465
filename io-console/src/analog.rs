//! Raw converter codes to the reading kept in the state table.

use crate::config::{ADC_FULL_SCALE, ADC_REFERENCE_MV};
use crate::error::SampleError;

/// How a raw code becomes the stored reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalogScale {
    /// `60 * V - 60`: the sensor's linear transfer function over the
    /// 0..3 V input range, giving -60..=120.
    Derived,
    /// Plain millivolts, 0..=3000.
    Millivolts,
}

impl Default for AnalogScale {
    fn default() -> Self {
        AnalogScale::Derived
    }
}

impl AnalogScale {
    pub fn convert(self, raw: u16) -> Result<i32, SampleError> {
        let millivolts = to_millivolts(raw)?;
        Ok(match self {
            AnalogScale::Derived => (60 * millivolts - 60_000) / 1000,
            AnalogScale::Millivolts => millivolts,
        })
    }
}

/// Converts a 10-bit code to millivolts, rejecting codes above full scale.
pub fn to_millivolts(raw: u16) -> Result<i32, SampleError> {
    if raw > ADC_FULL_SCALE {
        return Err(SampleError::OutOfRange(raw));
    }
    Ok(i32::from(raw) * ADC_REFERENCE_MV / i32::from(ADC_FULL_SCALE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millivolt_end_points() {
        assert_eq!(to_millivolts(0), Ok(0));
        assert_eq!(to_millivolts(ADC_FULL_SCALE), Ok(3000));
        assert_eq!(to_millivolts(512), Ok(1501));
    }

    #[test]
    fn derived_end_points() {
        assert_eq!(AnalogScale::Derived.convert(0), Ok(-60));
        assert_eq!(AnalogScale::Derived.convert(341), Ok(0));
        assert_eq!(AnalogScale::Derived.convert(ADC_FULL_SCALE), Ok(120));
    }

    #[test]
    fn out_of_range_code_is_an_error() {
        assert_eq!(
            AnalogScale::default().convert(1024),
            Err(SampleError::OutOfRange(1024))
        );
        assert_eq!(
            AnalogScale::Millivolts.convert(u16::MAX),
            Err(SampleError::OutOfRange(u16::MAX))
        );
    }
}
