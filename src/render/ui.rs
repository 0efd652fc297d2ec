use super::{ChartData, ChartId, LineColor, ListItem};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, List, ListItem as Row},
};

/// Widget state drawn on every render.
#[derive(Debug, Clone)]
pub(super) struct Dashboard {
    pub list: Vec<ListItem>,
    pub system: ChartData,
    pub processes: ChartData,
}

impl Default for Dashboard {
    fn default() -> Self {
        Dashboard {
            list: vec![ListItem::placeholder()],
            system: ChartData::default(),
            processes: ChartData::default(),
        }
    }
}

impl Dashboard {
    pub fn chart_mut(&mut self, chart: ChartId) -> &mut ChartData {
        match chart {
            ChartId::System => &mut self.system,
            ChartId::Processes => &mut self.processes,
        }
    }
}

/// Screen regions: process chart top left, system chart top right, list below.
pub(super) struct Areas {
    pub processes: Rect,
    pub system: Rect,
    pub list: Rect,
}

pub(super) fn layout(area: Rect) -> Areas {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let top = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);

    Areas {
        processes: top[0],
        system: top[1],
        list: rows[1],
    }
}

/// Cells inside a chart's border.
pub(super) fn inner_width(area: Rect) -> u16 {
    area.width.saturating_sub(2)
}

pub(super) fn render(frame: &mut Frame, dashboard: &Dashboard) {
    let areas = layout(frame.area());
    render_chart(frame, " top procs ", &dashboard.processes, false, areas.processes);
    render_chart(frame, " total usr/sys time ", &dashboard.system, true, areas.system);
    render_list(frame, &dashboard.list, areas.list);
}

fn render_chart(frame: &mut Frame, title: &str, data: &ChartData, legend: bool, area: Rect) {
    let block = Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let slots = data.viewport.max(1);

    // right-align every series so the newest sample sits on the right edge
    let points: Vec<(&String, Vec<(f64, f64)>)> = data
        .series
        .iter()
        .map(|(name, values)| {
            let offset = slots.saturating_sub(values.len());
            let pts = values
                .iter()
                .enumerate()
                .map(|(i, v)| ((offset + i) as f64, *v))
                .collect();
            (name, pts)
        })
        .collect();

    let datasets: Vec<Dataset> = points
        .iter()
        .map(|(name, pts)| {
            let color = data
                .colors
                .get(*name)
                .copied()
                .map(to_color)
                .unwrap_or(Color::White);
            let dataset = Dataset::default()
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(color))
                .data(pts);
            if legend {
                dataset.name(name.to_string())
            } else {
                dataset
            }
        })
        .collect();

    let y_max = y_ceiling(data);
    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, (slots - 1).max(1) as f64])
                .labels(x_labels(&data.labels, slots)),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, y_max])
                .labels(vec![
                    Span::raw("0%"),
                    Span::raw(format!("{:.0}%", y_max / 2.0)),
                    Span::raw(format!("{:.0}%", y_max)),
                ]),
        );

    frame.render_widget(chart, area);
}

/// Labels at the left edge, middle, and right edge of the axis. Slots left of
/// the oldest sample have no label.
fn x_labels(labels: &[String], slots: usize) -> Vec<Span<'static>> {
    let gap = slots.saturating_sub(labels.len());
    [0, slots / 2, slots.saturating_sub(1)]
        .into_iter()
        .map(|slot| {
            slot.checked_sub(gap)
                .and_then(|i| labels.get(i))
                .map(|l| Span::raw(format!("{l}s")))
                .unwrap_or_else(|| Span::raw(""))
        })
        .collect()
}

/// Y axis floor is 0; the top rounds the largest sample up to a multiple of 5.
fn y_ceiling(data: &ChartData) -> f64 {
    let max = data
        .series
        .values()
        .flat_map(|v| v.iter().copied())
        .fold(0.0f64, f64::max);
    ((max / 5.0).ceil() * 5.0).max(5.0)
}

fn render_list(frame: &mut Frame, items: &[ListItem], area: Rect) {
    let rows: Vec<Row> = items
        .iter()
        .map(|item| {
            let mut style = Style::default().fg(to_color(item.color));
            if let Some(bg) = item.background {
                style = style.bg(to_color(bg));
            }
            Row::new(Line::from(Span::styled(item.text.clone(), style)))
        })
        .collect();

    let list = List::new(rows).block(Block::default().borders(Borders::ALL));
    frame.render_widget(list, area);
}

pub(super) fn to_color(color: LineColor) -> Color {
    match color {
        LineColor::Cyan => Color::Cyan,
        LineColor::Red => Color::Red,
        LineColor::White => Color::White,
        LineColor::Rgb(rgb) => Color::Rgb(rgb.0, rgb.1, rgb.2),
    }
}
