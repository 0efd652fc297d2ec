use crate::error::{Error, Result};
use std::time::Duration;

/// Kernel clock ticks per second (`CLK_TCK`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockResolution(u64);

impl ClockResolution {
    pub fn new(ticks_per_sec: u64) -> Result<Self> {
        if ticks_per_sec == 0 {
            return Err(Error::InvalidArgument(
                "clock resolution must be non-zero".to_string(),
            ));
        }
        Ok(ClockResolution(ticks_per_sec))
    }

    pub fn ticks_per_sec(self) -> u64 {
        self.0
    }
}

/// Fixed time between two collector ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleInterval(Duration);

impl SampleInterval {
    pub fn new(interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(Error::InvalidArgument(
                "sample interval must be non-zero".to_string(),
            ));
        }
        Ok(SampleInterval(interval))
    }

    pub fn from_millis(ms: u64) -> Result<Self> {
        Self::new(Duration::from_millis(ms))
    }

    pub fn duration(self) -> Duration {
        self.0
    }

    pub fn as_millis_f64(self) -> f64 {
        self.0.as_nanos() as f64 / 1_000_000.0
    }
}

/// Converts raw tick deltas into percent of one core.
#[derive(Clone, Copy, Debug)]
pub struct Scale {
    clock: ClockResolution,
    interval: SampleInterval,
}

impl Scale {
    pub fn new(clock: ClockResolution, interval: SampleInterval) -> Self {
        Scale { clock, interval }
    }

    /// `(raw / clock) / (interval_ms / 1000) * 100`. Values above 100 are kept.
    pub fn scale(&self, raw: f64) -> f64 {
        let secs_busy = raw / self.clock.0 as f64;
        let secs_elapsed = self.interval.as_millis_f64() / 1000.0;
        secs_busy / secs_elapsed * 100.0
    }
}
