//! Task periods and the release computation every periodic task runs.
//!
//! A periodic task anchors its first release one period after it starts,
//! does its unit of work, then asks its [`Release`] when to run next:
//!
//! - still before the release instant: sleep until it, and move the
//!   release forward by one period;
//! - past it (overrun): run again right away and re-anchor one period from
//!   now. Missed releases are dropped, never replayed.
//!
//! The period is read fresh on every iteration, so a `/f*` command takes
//! effect at the task's next iteration boundary.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::config::{
    ANALOG_PERIOD_MS, INPUTS_PERIOD_MS, MAX_FREQUENCY_HZ, OUTPUTS_PERIOD_MS, PRESENTER_PERIOD_MS,
};
use crate::error::CommandError;

const MICROS_PER_SECOND: u32 = 1_000_000;

/// The tasks whose period the operator can retune.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Presenter,
    Inputs,
    Analog,
    Outputs,
}

impl TaskKind {
    pub const ALL: [TaskKind; 4] = [
        TaskKind::Presenter,
        TaskKind::Inputs,
        TaskKind::Analog,
        TaskKind::Outputs,
    ];

    /// Maps the letter after `/f` to a task.
    pub fn from_selector(selector: u8) -> Option<Self> {
        match selector {
            b'u' => Some(TaskKind::Presenter),
            b'b' => Some(TaskKind::Inputs),
            b'a' => Some(TaskKind::Analog),
            b'o' => Some(TaskKind::Outputs),
            _ => None,
        }
    }

    /// Name shown on the status page.
    pub fn label(self) -> &'static str {
        match self {
            TaskKind::Presenter => "UART",
            TaskKind::Inputs => "Buttons",
            TaskKind::Analog => "ADC",
            TaskKind::Outputs => "Outputs(LEDs)",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// A task period, microsecond resolution. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(u32);

impl Period {
    pub const fn from_millis(millis: u32) -> Self {
        Period(millis * 1000)
    }

    /// One second divided by `hz`, rounded down to whole microseconds.
    pub fn from_hz(hz: u32) -> Result<Self, CommandError> {
        match hz {
            0 => Err(CommandError::ZeroFrequency),
            hz if hz > MAX_FREQUENCY_HZ => Err(CommandError::FrequencyTooHigh),
            hz => Ok(Period(MICROS_PER_SECOND / hz)),
        }
    }

    pub fn as_micros(self) -> u32 {
        self.0
    }
}

/// Commanded rate of every retunable task.
///
/// The frequency is what is stored: the status page shows exactly what the
/// operator typed, and the sleep period is derived from it on every read.
/// Written only by the command interpreter and read by each task once per
/// iteration, so each slot is a plain atomic word.
#[derive(Debug)]
pub struct TaskPeriods {
    hz: [AtomicU32; 4],
}

impl TaskPeriods {
    /// Boot-time rates from the periods in [`crate::config`].
    pub const fn new() -> Self {
        Self {
            hz: [
                AtomicU32::new(1000 / PRESENTER_PERIOD_MS),
                AtomicU32::new(1000 / INPUTS_PERIOD_MS),
                AtomicU32::new(1000 / ANALOG_PERIOD_MS),
                AtomicU32::new(1000 / OUTPUTS_PERIOD_MS),
            ],
        }
    }

    /// Sleep period derived from the stored frequency.
    pub fn get(&self, kind: TaskKind) -> Period {
        Period(MICROS_PER_SECOND / self.frequency_hz(kind))
    }

    pub fn frequency_hz(&self, kind: TaskKind) -> u32 {
        self.hz[kind.index()].load(Ordering::Relaxed)
    }

    /// Retunes one task. A rejected frequency leaves the stored one alone.
    pub fn set(&self, kind: TaskKind, hz: u32) -> Result<Period, CommandError> {
        let period = Period::from_hz(hz)?;
        self.hz[kind.index()].store(hz, Ordering::Relaxed);
        Ok(period)
    }
}

impl Default for TaskPeriods {
    fn default() -> Self {
        Self::new()
    }
}

/// A point on the scheduler's time line.
pub trait Timestamp: Copy + Ord {
    fn add_micros(self, micros: u32) -> Self;
}

/// Microseconds since boot.
impl Timestamp for u64 {
    fn add_micros(self, micros: u32) -> Self {
        self + u64::from(micros)
    }
}

/// What a periodic task does after its unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake<T> {
    /// Sleep until this instant.
    At(T),
    /// The release instant already passed; run again immediately.
    Overrun,
}

/// Release bookkeeping for one periodic task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Release<T> {
    next: Option<T>,
}

impl<T: Timestamp> Release<T> {
    pub const fn new() -> Self {
        Self { next: None }
    }

    /// Anchors the first release one period after `now`. Later calls are
    /// no-ops, so a task may call this at the top of every iteration.
    pub fn arm(&mut self, now: T, period: Period) {
        if self.next.is_none() {
            self.next = Some(now.add_micros(period.as_micros()));
        }
    }

    /// Decides the next wake-up once the unit of work is done.
    pub fn complete(&mut self, now: T, period: Period) -> Wake<T> {
        let release = match self.next {
            Some(release) => release,
            None => now.add_micros(period.as_micros()),
        };
        if now < release {
            self.next = Some(release.add_micros(period.as_micros()));
            Wake::At(release)
        } else {
            self.next = Some(now.add_micros(period.as_micros()));
            Wake::Overrun
        }
    }

    /// Instant of the release after the pending one.
    pub fn next(&self) -> Option<T> {
        self.next
    }
}

impl<T: Timestamp> Default for Release<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_is_one_second_over_frequency() {
        assert_eq!(Period::from_hz(1), Ok(Period::from_millis(1000)));
        assert_eq!(Period::from_hz(20), Ok(Period::from_millis(50)));
        assert_eq!(Period::from_hz(3).map(Period::as_micros), Ok(333_333));
        assert_eq!(Period::from_hz(MAX_FREQUENCY_HZ).map(Period::as_micros), Ok(1));
    }

    #[test]
    fn rejects_zero_and_frequencies_with_no_period_left() {
        assert_eq!(Period::from_hz(0), Err(CommandError::ZeroFrequency));
        assert_eq!(
            Period::from_hz(MAX_FREQUENCY_HZ + 1),
            Err(CommandError::FrequencyTooHigh)
        );
    }

    #[test]
    fn boot_periods() {
        let periods = TaskPeriods::new();
        assert_eq!(periods.frequency_hz(TaskKind::Presenter), 1);
        assert_eq!(periods.get(TaskKind::Inputs), Period::from_millis(200));
        assert_eq!(periods.frequency_hz(TaskKind::Analog), 5);
        assert_eq!(periods.frequency_hz(TaskKind::Outputs), 5);
    }

    #[test]
    fn stored_frequency_is_shown_back_exactly() {
        let periods = TaskPeriods::new();
        for &hz in &[3u32, 999, 1001, 2000, 7919, 65_536, MAX_FREQUENCY_HZ] {
            assert!(periods.set(TaskKind::Analog, hz).is_ok(), "{} Hz", hz);
            assert_eq!(periods.frequency_hz(TaskKind::Analog), hz);
        }
    }

    #[test]
    fn set_only_touches_one_task() {
        let periods = TaskPeriods::new();
        assert_eq!(periods.set(TaskKind::Inputs, 20), Ok(Period::from_millis(50)));
        assert_eq!(periods.get(TaskKind::Inputs), Period::from_millis(50));
        assert_eq!(periods.get(TaskKind::Outputs), Period::from_millis(200));
    }

    #[test]
    fn rejected_set_keeps_the_old_frequency() {
        let periods = TaskPeriods::new();
        assert_eq!(periods.set(TaskKind::Inputs, 0), Err(CommandError::ZeroFrequency));
        assert_eq!(periods.frequency_hz(TaskKind::Inputs), 5);
    }

    #[test]
    fn selectors() {
        assert_eq!(TaskKind::from_selector(b'u'), Some(TaskKind::Presenter));
        assert_eq!(TaskKind::from_selector(b'b'), Some(TaskKind::Inputs));
        assert_eq!(TaskKind::from_selector(b'a'), Some(TaskKind::Analog));
        assert_eq!(TaskKind::from_selector(b'o'), Some(TaskKind::Outputs));
        assert_eq!(TaskKind::from_selector(b'x'), None);
    }

    #[test]
    fn releases_are_spaced_by_one_period() {
        let period = Period::from_millis(100);
        let mut release = Release::<u64>::new();
        release.arm(0, period);

        assert_eq!(release.complete(10_000, period), Wake::At(100_000));
        assert_eq!(release.complete(130_000, period), Wake::At(200_000));
        assert_eq!(release.complete(200_500, period), Wake::At(300_000));
    }

    #[test]
    fn arm_only_anchors_once() {
        let period = Period::from_millis(100);
        let mut release = Release::<u64>::new();
        release.arm(0, period);
        release.arm(50_000, period);
        assert_eq!(release.next(), Some(100_000));
    }

    #[test]
    fn overrun_does_not_replay_missed_releases() {
        let period = Period::from_millis(100);
        let mut release = Release::<u64>::new();
        release.arm(0, period);

        // work ran 3.5 periods long
        assert_eq!(release.complete(350_000, period), Wake::Overrun);
        // re-anchored from the overrun, not from the missed releases
        assert_eq!(release.complete(360_000, period), Wake::At(450_000));
        assert_eq!(release.complete(460_000, period), Wake::At(550_000));
    }

    #[test]
    fn new_period_applies_from_the_next_iteration() {
        let slow = Period::from_millis(200);
        let fast = Period::from_millis(50);
        let mut release = Release::<u64>::new();
        release.arm(0, slow);

        // the release already computed with the old period is kept
        assert_eq!(release.complete(1_000, fast), Wake::At(200_000));
        assert_eq!(release.complete(201_000, fast), Wake::At(250_000));
        assert_eq!(release.complete(251_000, fast), Wake::At(300_000));
    }
}
