//! Rolling multi-series chart engine.
//!
//! Turns one tick of raw cpu deltas into display-ready slices: scale the
//! deltas, append them to the series store, pad tracked pids that stayed idle,
//! cut the newest viewport's worth of every series, and colour the ranking.

mod history;
mod labels;
mod palette;
mod scale;
mod store;
mod window;

pub use history::History;
pub use labels::{LABEL_CAPACITY, LabelTable};
pub use palette::{Assigned, ColorAssigner, ColorAssignment, Palette, Rgb};
pub use scale::{ClockResolution, SampleInterval, Scale};
pub use store::SeriesStore;
pub use window::{Viewport, ViewportGeometry, labels_for, latest};

use crate::render::{ChartData, LineColor, ListItem};
use crate::sampler::{Pid, Sample};
use std::collections::{HashMap, HashSet};

pub const USR: &str = "usr";
pub const SYS: &str = "sys";

/// Startup parameters for an [`Engine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub clock: ClockResolution,
    pub interval: SampleInterval,
    pub geometry: ViewportGeometry,
    /// Ticks an untracked pid is kept before its series is dropped.
    /// `None` keeps stale series forever.
    pub reap_after: Option<u64>,
    pub sticky_colors: bool,
}

/// Display-ready state for one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub system: ChartData,
    pub processes: ChartData,
    pub list: Vec<ListItem>,
}

/// Owns every piece of chart state; one per session.
pub struct Engine {
    scale: Scale,
    labels: LabelTable,
    store: SeriesStore,
    palette: Palette,
    assigner: ColorAssigner,
    geometry: ViewportGeometry,
    reap_after: Option<u64>,
    ranking: Vec<Pid>,
    names: HashMap<Pid, String>,
    assignment: ColorAssignment,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let palette = Palette::qualitative();
        let assigner = if config.sticky_colors {
            ColorAssigner::sticky(&palette)
        } else {
            ColorAssigner::rank()
        };

        let mut store = SeriesStore::new();
        store.register_system(USR);
        store.register_system(SYS);

        Engine {
            scale: Scale::new(config.clock, config.interval),
            labels: LabelTable::new(config.interval),
            store,
            palette,
            assigner,
            geometry: config.geometry,
            reap_after: config.reap_after,
            ranking: Vec::new(),
            names: HashMap::new(),
            assignment: ColorAssignment::default(),
        }
    }

    /// Folds one tick into the store and returns the frame for `inner_width`.
    pub fn update(&mut self, sample: &Sample, inner_width: u16) -> Frame {
        self.store
            .append_system_sample(USR, self.scale.scale(sample.system.usr as f64));
        self.store
            .append_system_sample(SYS, self.scale.scale(sample.system.sys as f64));

        let mut present = HashSet::with_capacity(sample.processes.len());
        for (pid, delta) in &sample.processes {
            self.store
                .append_process_sample(*pid, self.scale.scale(*delta as f64));
            present.insert(*pid);
        }

        // pid 0 marks an unfilled ranking slot
        let tracked: Vec<Pid> = sample.ranking.iter().copied().filter(|p| *p != 0).collect();
        self.store.pad_missing(&tracked, &present);

        let reaped = self.store.end_tick(&tracked, self.reap_after);
        if !reaped.is_empty() {
            tracing::debug!(count = reaped.len(), ?reaped, "reaped stale process series");
        }

        self.assignment = self.assigner.assign(&self.palette, &tracked);
        self.ranking = tracked;
        self.names = sample.names.clone();

        self.relayout(inner_width)
    }

    /// Re-slices the current state for a new width without adding samples.
    pub fn relayout(&self, inner_width: u16) -> Frame {
        let viewport = self.geometry.viewport(inner_width);
        Frame {
            system: self.system_chart(viewport),
            processes: self.process_chart(viewport),
            list: self.list(),
        }
    }

    fn system_chart(&self, viewport: Viewport) -> ChartData {
        let mut chart = ChartData {
            viewport: viewport.points(),
            ..ChartData::default()
        };
        for (name, series) in self.store.system_series() {
            chart
                .series
                .insert(name.to_string(), latest(series, viewport).to_vec());
            let color = if name == SYS {
                LineColor::Red
            } else {
                LineColor::Cyan
            };
            chart.colors.insert(name.to_string(), color);
        }
        chart.labels = labels_for(&self.labels, chart.longest()).to_vec();
        chart
    }

    fn process_chart(&self, viewport: Viewport) -> ChartData {
        let mut chart = ChartData {
            viewport: viewport.points(),
            ..ChartData::default()
        };
        for assigned in self.assignment.entries() {
            let Some(series) = self.store.process(assigned.pid) else {
                continue;
            };
            chart
                .series
                .insert(assigned.key.clone(), latest(series, viewport).to_vec());
            chart
                .colors
                .insert(assigned.key.clone(), LineColor::Rgb(assigned.color));
        }
        chart.labels = labels_for(&self.labels, chart.longest()).to_vec();
        chart
    }

    fn list(&self) -> Vec<ListItem> {
        if self.assignment.is_empty() {
            return vec![ListItem::placeholder()];
        }
        self.assignment
            .entries()
            .iter()
            .map(|assigned| {
                let name = self
                    .names
                    .get(&assigned.pid)
                    .map(String::as_str)
                    .unwrap_or("?");
                ListItem::new(
                    format!("{} {} {}", assigned.rank, assigned.key, name),
                    LineColor::Rgb(assigned.color),
                )
            })
            .collect()
    }

    pub fn store(&self) -> &SeriesStore {
        &self.store
    }

    pub fn ranking(&self) -> &[Pid] {
        &self.ranking
    }
}
