//! The status page.

use core::fmt::{self, Write};

use heapless::String;

use crate::assembler::LINE_PAYLOAD;
use crate::command::Reply;
use crate::config::STATUS_CAPACITY;
use crate::schedule::{TaskKind, TaskPeriods};

const RULE: &str =
    "#---------------------------------------------------------------------------#";

/// Command help shown on every page.
pub const HELP: &str = " Available commands:
  /fuN /fbN /faN /foN - set UART, buttons, ADC, outputs frequency to N Hz
  /bX - read button X (1-4)
  /oX_Y - set output X (1-4) on (Y=1) or off (Y=0)
  /a - read the ADC value";

/// The last line received and what came of it. Written by the interpreter,
/// read by the presenter; both fields change together, so it is only read
/// under its gate.
#[derive(Debug, Default, Clone)]
pub struct Transcript {
    status: String<STATUS_CAPACITY>,
    last_line: String<LINE_PAYLOAD>,
}

impl Transcript {
    pub const fn new() -> Self {
        Self {
            status: String::new(),
            last_line: String::new(),
        }
    }

    pub fn record(&mut self, line: &[u8], reply: &Reply) {
        self.last_line.clear();
        for &byte in line {
            let shown = if byte.is_ascii_graphic() || byte == b' ' {
                byte as char
            } else {
                '?'
            };
            // cannot overflow: the line fits the assembler's buffer
            let _ = self.last_line.push(shown);
        }

        self.status.clear();
        // a reply longer than the status line is cut short
        let _ = write!(Truncating(&mut self.status), "{}", reply);
    }

    /// Result of the last command.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// The last raw line received, non-printable bytes shown as `?`.
    pub fn last_line(&self) -> &str {
        &self.last_line
    }
}

/// Writes as much as fits and drops the rest.
struct Truncating<'a, const N: usize>(&'a mut String<N>);

impl<'a, const N: usize> Write for Truncating<'a, N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

/// Renders one status page.
pub fn render_page<W: Write>(out: &mut W, periods: &TaskPeriods, transcript: &Transcript) -> fmt::Result {
    writeln!(out, "{}", RULE)?;
    for kind in TaskKind::ALL.iter().copied() {
        writeln!(out, " {} frequency: {} Hz", kind.label(), periods.frequency_hz(kind))?;
    }
    writeln!(out)?;
    writeln!(out, " {}", transcript.status())?;
    writeln!(out, "{}", RULE)?;
    writeln!(out, "{}", HELP)?;
    writeln!(out, "{}", RULE)?;
    writeln!(out, " String sent: {}", transcript.last_line())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PAGE_CAPACITY;
    use crate::error::CommandError;
    use crate::config::MAX_FREQUENCY_HZ;
    use crate::state::{AnalogReading, Channel};

    #[test]
    fn records_line_and_result() {
        let mut transcript = Transcript::new();
        transcript.record(b"/b3", &Reply::Input { channel: Channel::ALL[2], pressed: false });
        assert_eq!(transcript.last_line(), "/b3");
        assert_eq!(transcript.status(), "Button 3 state: 0");

        transcript.record(b"gar\x01bage", &Reply::Invalid(CommandError::UnknownCommand));
        assert_eq!(transcript.last_line(), "gar?bage");
        assert_eq!(transcript.status(), "Invalid command");
    }

    #[test]
    fn page_shows_frequencies_status_and_line() {
        let periods = TaskPeriods::new();
        periods.set(TaskKind::Analog, 40).unwrap();
        let mut transcript = Transcript::new();
        transcript.record(b"/a", &Reply::Analog(AnalogReading(57)));

        let mut page: String<PAGE_CAPACITY> = String::new();
        render_page(&mut page, &periods, &transcript).unwrap();

        assert!(page.contains(" UART frequency: 1 Hz\n"));
        assert!(page.contains(" Buttons frequency: 5 Hz\n"));
        assert!(page.contains(" ADC frequency: 40 Hz\n"));
        assert!(page.contains(" Outputs(LEDs) frequency: 5 Hz\n"));
        assert!(page.contains(" ADC value is: 57\n"));
        assert!(page.contains(HELP));
        assert!(page.ends_with(" String sent: /a\n"));
    }

    #[test]
    fn longest_page_fits() {
        let periods = TaskPeriods::new();
        for kind in TaskKind::ALL.iter().copied() {
            periods.set(kind, MAX_FREQUENCY_HZ).unwrap();
        }
        let mut transcript = Transcript::new();
        transcript.record(&[b'x'; LINE_PAYLOAD], &Reply::Invalid(CommandError::TrailingInput));

        let mut page: String<PAGE_CAPACITY> = String::new();
        assert!(render_page(&mut page, &periods, &transcript).is_ok());
    }
}
