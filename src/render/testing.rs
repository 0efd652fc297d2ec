use super::{ChartData, ChartId, ListItem, RenderBoundary, Widget};
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Records what gets pushed; can be told to fail or panic.
#[derive(Default)]
pub(crate) struct RecordingBoundary {
    pub width: u16,
    pub charts: HashMap<ChartId, ChartData>,
    pub list: Vec<ListItem>,
    pub renders: Vec<Widget>,
    pub teardowns: usize,
    pub fail_render: bool,
    pub fail_width: bool,
    pub panic_render: bool,
}

impl RecordingBoundary {
    pub fn with_width(width: u16) -> Self {
        RecordingBoundary {
            width,
            ..Default::default()
        }
    }
}

impl RenderBoundary for RecordingBoundary {
    fn set_list(&mut self, items: Vec<ListItem>) -> Result<()> {
        self.list = items;
        Ok(())
    }

    fn set_chart(&mut self, chart: ChartId, data: ChartData) -> Result<()> {
        self.charts.insert(chart, data);
        Ok(())
    }

    fn render(&mut self, widget: Widget) -> Result<()> {
        if self.panic_render {
            panic!("widget state corrupt");
        }
        if self.fail_render {
            return Err(Error::Terminal("draw failed".to_string()));
        }
        self.renders.push(widget);
        Ok(())
    }

    fn inner_width(&self, _chart: ChartId) -> Result<u16> {
        if self.fail_width {
            return Err(Error::Layout("chart has no area".to_string()));
        }
        Ok(self.width)
    }

    fn teardown(&mut self) -> Result<()> {
        self.teardowns += 1;
        Ok(())
    }
}
