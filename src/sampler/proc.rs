use super::{Pid, Sample, SampleSource, SystemDelta};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Fallback when `sysconf` cannot report `CLK_TCK`.
const DEFAULT_CLK_TCK: u64 = 100;

/// Kernel clock ticks per second.
pub fn clock_resolution() -> u64 {
    // SAFETY: sysconf has no preconditions and only reads a constant.
    let ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    if ticks > 0 {
        ticks as u64
    } else {
        DEFAULT_CLK_TCK
    }
}

/// Aggregate cpu times from the first line of `/proc/stat`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SystemTimes {
    usr: u64,
    sys: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ProcessTimes {
    name: String,
    ticks: u64,
}

#[derive(Debug, Clone, Default)]
struct Snapshot {
    system: SystemTimes,
    processes: HashMap<Pid, ProcessTimes>,
}

/// Samples `/proc` for system and per-process cpu time.
pub struct ProcSampler {
    root: PathBuf,
    top: usize,
    last: Option<Snapshot>,
    /// Ticks consumed by each live pid since the sampler started.
    cumulative: HashMap<Pid, u64>,
}

impl ProcSampler {
    pub fn new(top: usize) -> Self {
        Self::with_root("/proc", top)
    }

    pub fn with_root(root: impl Into<PathBuf>, top: usize) -> Self {
        ProcSampler {
            root: root.into(),
            top,
            last: None,
            cumulative: HashMap::new(),
        }
    }

    fn read_snapshot(&self) -> Result<Snapshot> {
        let stat_path = self.root.join("stat");
        let content = fs::read_to_string(&stat_path)?;
        let system = parse_cpu_line(&content)
            .ok_or_else(|| Error::parse(stat_path.display().to_string(), "no aggregate cpu line"))?;

        let mut processes = HashMap::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let Some(pid) = entry.file_name().to_str().and_then(|s| s.parse::<Pid>().ok())
            else {
                continue;
            };
            match read_process(&entry.path()) {
                Ok(times) => {
                    processes.insert(pid, times);
                }
                // processes can exit between readdir and read
                Err(e) => tracing::trace!(pid, error = %e, "skipping process"),
            }
        }

        Ok(Snapshot { system, processes })
    }

    /// Folds a new snapshot into the running totals and returns the deltas.
    fn advance(&mut self, next: Snapshot) -> Option<Sample> {
        // the first snapshot is only a baseline
        let prev = self.last.replace(next)?;
        let next = self.last.as_ref()?;

        let system = SystemDelta {
            usr: next.system.usr.saturating_sub(prev.system.usr),
            sys: next.system.sys.saturating_sub(prev.system.sys),
        };

        let mut processes = HashMap::new();
        for (pid, times) in &next.processes {
            let Some(before) = prev.processes.get(pid) else {
                continue;
            };
            let delta = times.ticks.saturating_sub(before.ticks);
            if delta > 0 {
                processes.insert(*pid, delta);
                *self.cumulative.entry(*pid).or_insert(0) += delta;
            }
        }
        self.cumulative.retain(|pid, _| next.processes.contains_key(pid));

        let mut ranked: Vec<(Pid, u64)> = self
            .cumulative
            .iter()
            .map(|(pid, total)| (*pid, *total))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        let ranking: Vec<Pid> = ranked.into_iter().take(self.top).map(|(pid, _)| pid).collect();

        let names = ranking
            .iter()
            .filter_map(|pid| next.processes.get(pid).map(|t| (*pid, t.name.clone())))
            .collect();

        Some(Sample {
            system,
            processes,
            ranking,
            names,
        })
    }
}

impl SampleSource for ProcSampler {
    fn observe(&mut self) -> Result<Option<Sample>> {
        let snapshot = self.read_snapshot()?;
        Ok(self.advance(snapshot))
    }
}

fn read_process(dir: &Path) -> Result<ProcessTimes> {
    let path = dir.join("stat");
    let content = fs::read_to_string(&path)?;
    parse_pid_stat(&content).ok_or_else(|| Error::parse(path.display().to_string(), "malformed stat"))
}

/// `usr = user + nice`, `sys = system + irq + softirq`.
fn parse_cpu_line(content: &str) -> Option<SystemTimes> {
    let line = content.lines().find(|l| l.starts_with("cpu "))?;
    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .map(str::parse)
        .collect::<std::result::Result<_, _>>()
        .ok()?;
    if fields.len() < 7 {
        return None;
    }
    let (user, nice, system, irq, softirq) = (fields[0], fields[1], fields[2], fields[5], fields[6]);
    Some(SystemTimes {
        usr: user + nice,
        sys: system + irq + softirq,
    })
}

/// Parses `comm` and `utime + stime` out of `/proc/<pid>/stat`.
///
/// `comm` may itself contain spaces and parentheses, so it runs up to the
/// last `)` on the line.
fn parse_pid_stat(content: &str) -> Option<ProcessTimes> {
    let open = content.find('(')?;
    let close = content.rfind(')')?;
    if close < open {
        return None;
    }
    let name = content[open + 1..close].to_string();

    // fields after comm start at `state` (field 3); utime and stime are 14 and 15
    let rest: Vec<&str> = content[close + 1..].split_whitespace().collect();
    let utime: u64 = rest.get(11)?.parse().ok()?;
    let stime: u64 = rest.get(12)?.parse().ok()?;

    Some(ProcessTimes {
        name,
        ticks: utime + stime,
    })
}
