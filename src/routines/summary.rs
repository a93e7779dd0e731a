use std::fmt;

use anyhow::{bail, Result};
use ndarray::Array1;
use ndarray_stats::interpolate::Linear;
use ndarray_stats::{Quantile1dExt, QuantileExt};
use noisy_float::types::{n64, N64};
use serde::Serialize;

use crate::model::Compartment;
use crate::simulator::Trajectory;

/// Descriptive statistics of one column over all rows
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Statistics {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub mean: f64,
    pub q3: f64,
    pub max: f64,
}

impl Statistics {
    /// Quartiles interpolate linearly between order statistics, at position `q * (n - 1)`
    pub fn from_values(values: &[f64]) -> Result<Self> {
        let Some(mean) = Array1::from_vec(values.to_vec()).mean() else {
            bail!("Cannot summarize an empty column");
        };
        if values.iter().any(|v| v.is_nan()) {
            bail!("Cannot summarize a column containing NaN");
        }
        let mut array: Array1<N64> = values.iter().map(|v| n64(*v)).collect();
        let min = array.min()?.raw();
        let max = array.max()?.raw();

        Ok(Statistics {
            min,
            q1: array.quantile_mut(n64(0.25), &Linear)?.raw(),
            median: array.quantile_mut(n64(0.5), &Linear)?.raw(),
            mean,
            q3: array.quantile_mut(n64(0.75), &Linear)?.raw(),
            max,
        })
    }
}

/// Per-column descriptive statistics of a trajectory
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    columns: Vec<(Compartment, Statistics)>,
}

/// Flattened row of a [Summary] for tabular output
#[derive(Debug, Serialize)]
pub struct SummaryRow {
    pub column: &'static str,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub mean: f64,
    pub q3: f64,
    pub max: f64,
}

impl Summary {
    pub fn columns(&self) -> &[(Compartment, Statistics)] {
        &self.columns
    }

    pub fn get(&self, compartment: Compartment) -> Option<&Statistics> {
        self.columns
            .iter()
            .find(|(c, _)| *c == compartment)
            .map(|(_, s)| s)
    }

    pub fn rows(&self) -> impl Iterator<Item = SummaryRow> + '_ {
        self.columns.iter().map(|(c, s)| SummaryRow {
            column: c.name(),
            min: s.min,
            q1: s.q1,
            median: s.median,
            mean: s.mean,
            q3: s.q3,
            max: s.max,
        })
    }
}

/// Summarizes the requested compartments over all rows of `trajectory`
pub fn summarize(trajectory: &Trajectory, columns: &[Compartment]) -> Result<Summary> {
    let columns = columns
        .iter()
        .map(|c| -> Result<(Compartment, Statistics)> {
            Ok((*c, Statistics::from_values(&trajectory.column(*c))?))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Summary { columns })
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<6} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
            "", "Min.", "1st Qu.", "Median", "Mean", "3rd Qu.", "Max."
        )?;
        for (compartment, s) in &self.columns {
            writeln!(
                f,
                "{:<6} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>12.2}",
                compartment.name(),
                s.min,
                s.q1,
                s.median,
                s.mean,
                s.q3,
                s.max
            )?;
        }
        Ok(())
    }
}
