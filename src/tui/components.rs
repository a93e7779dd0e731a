/// This file contains the different components of the TUI
/// The purpose is to create common components with generic methods
use ratatui::{
    layout::Alignment,
    style::{Color, Style},
    text::Span,
    widgets::{Axis, Block, BorderType, Borders, Chart, Dataset, Paragraph},
};

use super::Series;
use crate::simulator::Trajectory;

pub fn draw_title<'a>() -> Paragraph<'a> {
    Paragraph::new("MTCT simulation - press any key to exit")
        .style(Style::default().fg(Color::LightCyan))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::White))
                .border_type(BorderType::Plain),
        )
}

/// (time, value) pairs of every series, in the order of `series`
pub fn series_data(trajectory: &Trajectory, series: &[Series]) -> Vec<Vec<(f64, f64)>> {
    series
        .iter()
        .map(|s| {
            trajectory
                .times()
                .iter()
                .copied()
                .zip(trajectory.column(s.compartment))
                .collect()
        })
        .collect()
}

/// Smallest and largest value over all points, widened when they coincide
pub fn bounds(points: impl Iterator<Item = f64>) -> [f64; 2] {
    let (min, max) = points
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
            (min.min(v), max.max(v))
        });
    if !min.is_finite() {
        return [0.0, 1.0];
    }
    if min == max {
        return [min - 0.5, max + 0.5];
    }
    [min, max]
}

fn labels<'a>(bounds: [f64; 2], n: usize) -> Vec<Span<'a>> {
    let step = (bounds[1] - bounds[0]) / (n - 1) as f64;
    (0..n)
        .map(|i| Span::from(format!("{:.0}", bounds[0] + step * i as f64)))
        .collect()
}

pub fn draw_chart<'a>(series: &[Series], data: &'a [Vec<(f64, f64)>]) -> Chart<'a> {
    let x_bounds = bounds(data.iter().flatten().map(|(x, _)| *x));
    let y_bounds = bounds(data.iter().flatten().map(|(_, y)| *y));

    let datasets = series
        .iter()
        .zip(data)
        .map(|(s, points)| {
            Dataset::default()
                .name(s.compartment.name())
                .marker(s.style.marker)
                .style(s.style.style())
                .graph_type(s.style.graph_type)
                .data(points)
        })
        .collect();

    Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("Time (days)")
                .bounds(x_bounds)
                .labels(labels(x_bounds, 5)),
        )
        .y_axis(
            Axis::default()
                .title("Population")
                .bounds(y_bounds)
                .labels(labels(y_bounds, 4)),
        )
        .block(
            Block::default()
                .title(" Trajectories ")
                .borders(Borders::ALL),
        )
}
