//! The rendering boundary: widget state the engine fills in, and the trait a
//! display backend implements to draw it.

mod terminal;
#[cfg(test)]
pub(crate) mod testing;
mod ui;

use crate::chart::Rgb;
use crate::error::Result;
use std::collections::BTreeMap;

pub use terminal::TerminalBoundary;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChartId {
    /// Per-process usage, one line per tracked pid.
    Processes,
    /// System-wide `usr` and `sys`.
    System,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Widget {
    List,
    Chart(ChartId),
    All,
}

/// Colour a list row or series is drawn with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineColor {
    Cyan,
    Red,
    White,
    Rgb(Rgb),
}

/// One row of the ranked process list.
#[derive(Clone, Debug, PartialEq)]
pub struct ListItem {
    pub text: String,
    pub color: LineColor,
    pub background: Option<LineColor>,
}

impl ListItem {
    pub fn new(text: impl Into<String>, color: LineColor) -> Self {
        ListItem {
            text: text.into(),
            color,
            background: None,
        }
    }

    /// Shown until the first ranking arrives.
    pub fn placeholder() -> Self {
        ListItem {
            text: "gathering list of top processes".to_string(),
            color: LineColor::Red,
            background: Some(LineColor::White),
        }
    }
}

/// Everything a line chart draws.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChartData {
    /// Series name to samples, oldest first.
    pub series: BTreeMap<String, Vec<f64>>,
    /// Elapsed-time labels aligned with the longest series.
    pub labels: Vec<String>,
    pub colors: BTreeMap<String, LineColor>,
    /// Sample slots across the x axis; shorter series are right-aligned.
    pub viewport: usize,
}

impl ChartData {
    pub fn longest(&self) -> usize {
        self.series.values().map(Vec::len).max().unwrap_or(0)
    }
}

/// A display the render pump pushes widget state into.
pub trait RenderBoundary {
    fn set_list(&mut self, items: Vec<ListItem>) -> Result<()>;

    fn set_chart(&mut self, chart: ChartId, data: ChartData) -> Result<()>;

    /// Draws `widget` from its current state.
    fn render(&mut self, widget: Widget) -> Result<()>;

    /// Drawable width of `chart` in cells, inside borders and axes.
    fn inner_width(&self, chart: ChartId) -> Result<u16>;

    /// Restores the display. Called once when the session ends.
    fn teardown(&mut self) -> Result<()>;
}
