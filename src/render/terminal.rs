use super::ui::{self, Dashboard};
use super::{ChartData, ChartId, ListItem, RenderBoundary, Widget};
use crate::error::{Error, Result};
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend, layout::Rect};
use std::io::{self, Stdout, stdout};

/// Draws the dashboard into the controlling terminal.
pub struct TerminalBoundary {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    dashboard: Dashboard,
    active: bool,
}

impl TerminalBoundary {
    /// Switches the terminal to raw mode on the alternate screen.
    pub fn new() -> Result<Self> {
        enable_raw_mode().map_err(|e| Error::Terminal(format!("cannot enable raw mode: {e}")))?;
        let mut out = stdout();
        if let Err(e) = execute!(out, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(Error::Terminal(format!("cannot enter alternate screen: {e}")));
        }
        install_panic_hook();

        let backend = CrosstermBackend::new(out);
        let mut terminal = match Terminal::new(backend) {
            Ok(t) => t,
            Err(e) => {
                let _ = restore();
                return Err(Error::Terminal(format!("cannot start terminal: {e}")));
            }
        };
        terminal.hide_cursor()?;

        let mut boundary = TerminalBoundary {
            terminal,
            dashboard: Dashboard::default(),
            active: true,
        };
        boundary.render(Widget::All)?;
        Ok(boundary)
    }

    fn area(&self) -> Result<Rect> {
        let size = self.terminal.size()?;
        Ok(Rect::new(0, 0, size.width, size.height))
    }
}

impl RenderBoundary for TerminalBoundary {
    fn set_list(&mut self, items: Vec<ListItem>) -> Result<()> {
        self.dashboard.list = items;
        Ok(())
    }

    fn set_chart(&mut self, chart: ChartId, data: ChartData) -> Result<()> {
        *self.dashboard.chart_mut(chart) = data;
        Ok(())
    }

    /// Redraws the screen. ratatui diffs against the previous frame, so only
    /// the cells of widgets whose state changed reach the terminal.
    fn render(&mut self, widget: Widget) -> Result<()> {
        if !self.active {
            return Err(Error::Terminal("render after teardown".to_string()));
        }
        tracing::trace!(?widget, "render");
        let dashboard = &self.dashboard;
        self.terminal.draw(|frame| ui::render(frame, dashboard))?;
        Ok(())
    }

    fn inner_width(&self, chart: ChartId) -> Result<u16> {
        let areas = ui::layout(self.area()?);
        let area = match chart {
            ChartId::System => areas.system,
            ChartId::Processes => areas.processes,
        };
        if area.width < 3 {
            return Err(Error::Layout(format!(
                "{chart:?} chart is {} cells wide",
                area.width
            )));
        }
        Ok(ui::inner_width(area))
    }

    fn teardown(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        restore()?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for TerminalBoundary {
    fn drop(&mut self) {
        if self.active {
            let _ = self.teardown();
        }
    }
}

fn restore() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)
}

/// Leaves the alternate screen before the default hook prints a panic.
fn install_panic_hook() {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore();
        hook(info);
    }));
}
