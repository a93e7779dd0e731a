//! Terminal line charts of a [crate::simulator::Trajectory]
pub mod components;
pub mod ui;

use std::str::FromStr;

use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::widgets::GraphType;

use crate::error::SimulationError;
use crate::model::Compartment;

pub use ui::plot;

/// Display style of a plotted column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStyle {
    pub color: Color,
    pub marker: Marker,
    pub graph_type: GraphType,
}

impl Default for SeriesStyle {
    fn default() -> Self {
        SeriesStyle {
            color: Color::White,
            marker: Marker::Braille,
            graph_type: GraphType::Line,
        }
    }
}

impl SeriesStyle {
    pub fn new(color: Color) -> Self {
        SeriesStyle {
            color,
            ..Default::default()
        }
    }

    /// Parses a colour name or `#rrggbb`, a marker name and the line flag
    pub fn parse(color: &str, marker: &str, line: bool) -> Result<Self, SimulationError> {
        let color = Color::from_str(color)
            .map_err(|_| SimulationError::invalid(format!("unknown colour '{}'", color)))?;
        let marker = match marker.to_lowercase().as_str() {
            "dot" => Marker::Dot,
            "block" => Marker::Block,
            "bar" => Marker::Bar,
            "braille" => Marker::Braille,
            other => {
                return Err(SimulationError::invalid(format!(
                    "unknown marker '{}'",
                    other
                )))
            }
        };
        let graph_type = match line {
            true => GraphType::Line,
            false => GraphType::Scatter,
        };
        Ok(SeriesStyle {
            color,
            marker,
            graph_type,
        })
    }

    pub(crate) fn style(&self) -> Style {
        Style::default().fg(self.color)
    }
}

/// A compartment to plot and how to draw it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Series {
    pub compartment: Compartment,
    pub style: SeriesStyle,
}

impl Series {
    pub fn new(compartment: Compartment, style: SeriesStyle) -> Self {
        Series { compartment, style }
    }
}
