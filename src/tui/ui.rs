//! Defines the terminal chart viewer

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::{io::stdout, time::Duration};

use super::components::*;
use super::Series;
use crate::simulator::Trajectory;

/// Shows a line chart of `series` until a key is pressed
pub fn plot(trajectory: &Trajectory, series: &[Series]) -> Result<()> {
    if series.is_empty() {
        tracing::warn!("No series selected for plotting");
        return Ok(());
    }
    let data = series_data(trajectory, series);

    let stdout = stdout();
    crossterm::terminal::enable_raw_mode()?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    terminal.clear()?;

    let tick_rate = Duration::from_millis(200);
    let result = (|| -> Result<()> {
        loop {
            terminal.draw(|rect| draw(rect, series, &data))?;

            if event::poll(tick_rate)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        break;
                    }
                }
            }
        }
        Ok(())
    })();

    terminal.clear()?;
    terminal.show_cursor()?;
    crossterm::terminal::disable_raw_mode()?;
    result
}

pub fn draw(rect: &mut Frame, series: &[Series], data: &[Vec<(f64, f64)>]) {
    let size = rect.size();

    // Vertical layout (overall)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(10)].as_ref())
        .split(size);

    rect.render_widget(draw_title(), chunks[0]);
    rect.render_widget(draw_chart(series, data), chunks[1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Compartment, Compartments, Parameters};
    use crate::simulator::{simulate, Method};
    use crate::tui::SeriesStyle;
    use ratatui::backend::TestBackend;
    use ratatui::style::Color;

    #[test]
    fn chart_renders_title_and_frame() {
        let trajectory = simulate(
            &Compartments::default(),
            &Parameters::default(),
            &[0.0, 1.0, 2.0, 3.0],
            Method::default(),
        )
        .unwrap();
        let series = vec![
            Series::new(Compartment::VS, SeriesStyle::new(Color::Green)),
            Series::new(Compartment::D, SeriesStyle::new(Color::Gray)),
        ];
        let data = series_data(&trajectory, &series);

        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        terminal.draw(|f| draw(f, &series, &data)).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content.iter().map(|cell| cell.symbol()).collect();
        assert!(text.contains("Trajectories"));
        assert!(text.contains("press any key"));
    }
}
