//! Sources of per-tick CPU deltas.

mod proc;

use crate::error::Result;
use std::collections::HashMap;

pub use proc::{ProcSampler, clock_resolution};

pub type Pid = u32;

/// System-wide tick deltas over one interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemDelta {
    pub usr: u64,
    pub sys: u64,
}

/// Everything the collector delivers for one tick.
#[derive(Debug, Clone, Default)]
pub struct Sample {
    pub system: SystemDelta,
    /// `utime + stime` deltas, keyed by pid. Pids that did not run may be absent.
    pub processes: HashMap<Pid, u64>,
    /// Tracked pids, busiest first.
    pub ranking: Vec<Pid>,
    pub names: HashMap<Pid, String>,
}

/// A source of samples, read once per interval.
pub trait SampleSource {
    /// Returns the deltas since the previous call.
    ///
    /// The first call only records a baseline and returns `Ok(None)`.
    fn observe(&mut self) -> Result<Option<Sample>>;
}
