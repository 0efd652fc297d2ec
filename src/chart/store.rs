use super::history::History;
use crate::sampler::Pid;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Per-pid buffer plus the last tick on which the pid reported or was tracked.
#[derive(Debug, Clone)]
struct ProcessEntry {
    history: History,
    last_seen: u64,
}

/// Owns every time series the dashboard draws.
#[derive(Debug, Default)]
pub struct SeriesStore {
    system: BTreeMap<String, History>,
    processes: HashMap<Pid, ProcessEntry>,
    tick: u64,
}

impl SeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty system series so it is drawn before its first sample.
    pub fn register_system(&mut self, name: &str) {
        self.system.entry(name.to_string()).or_default();
    }

    pub fn append_system_sample(&mut self, name: &str, value: f64) {
        self.system.entry(name.to_string()).or_default().push(value);
    }

    /// Appends to `pid`'s series, creating it seeded with `value` on first sight.
    pub fn append_process_sample(&mut self, pid: Pid, value: f64) {
        let tick = self.tick;
        self.processes
            .entry(pid)
            .and_modify(|e| {
                e.history.push(value);
                e.last_seen = tick;
            })
            .or_insert_with(|| ProcessEntry {
                history: History::seeded(value),
                last_seen: tick,
            });
    }

    /// Appends a `0` for every tracked pid that reported nothing this tick.
    pub fn pad_missing(&mut self, tracked: &[Pid], present: &HashSet<Pid>) {
        let tick = self.tick;
        for pid in tracked {
            if present.contains(pid) {
                continue;
            }
            self.processes
                .entry(*pid)
                .and_modify(|e| e.history.push(0.0))
                .or_insert_with(|| ProcessEntry {
                    history: History::seeded(0.0),
                    last_seen: tick,
                });
        }
    }

    /// Closes the current tick: stamps tracked pids and drops pids that have
    /// been neither tracked nor reporting for more than `grace` ticks.
    /// Returns the reaped pids.
    ///
    /// With `grace == None` untracked series are kept frozen forever.
    pub fn end_tick(&mut self, tracked: &[Pid], grace: Option<u64>) -> Vec<Pid> {
        let tick = self.tick;
        for pid in tracked {
            if let Some(entry) = self.processes.get_mut(pid) {
                entry.last_seen = tick;
            }
        }

        let mut reaped = Vec::new();
        if let Some(grace) = grace {
            self.processes.retain(|pid, entry| {
                let keep = tick - entry.last_seen <= grace;
                if !keep {
                    reaped.push(*pid);
                }
                keep
            });
        }

        self.tick += 1;
        reaped
    }

    pub fn system(&self, name: &str) -> Option<&[f64]> {
        self.system.get(name).map(History::as_slice)
    }

    pub fn system_series(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.system.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn process(&self, pid: Pid) -> Option<&[f64]> {
        self.processes.get(&pid).map(|e| e.history.as_slice())
    }

    pub fn process_count(&self) -> usize {
        self.processes.len()
    }
}
