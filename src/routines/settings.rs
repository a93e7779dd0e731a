use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use config::Config as eConfig;
use serde::{Deserialize, Serialize};

use crate::error::SimulationError;
use crate::model::{Compartment, Compartments, Parameters};
use crate::routines::output::OutputFile;
use crate::simulator::{Method, TimeGrid, DEFAULT_ATOL, DEFAULT_RTOL, DEFAULT_STEP};
use crate::tui::{Series, SeriesStyle};

/// Settings of a simulation run
///
/// Every section has defaults, so an empty configuration file reproduces the reference scenario.
/// Parameters and the initial state are kept as name to value maps and checked when converted
/// with [Settings::parameters] and [Settings::initial_state].
#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
pub struct Settings {
    #[serde(default = "default_parameters")]
    pub parameters: HashMap<String, f64>,
    #[serde(default = "default_initial")]
    pub initial: HashMap<String, f64>,
    #[serde(default)]
    pub time: Time,
    #[serde(default)]
    pub solver: Solver,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub log: Log,
    #[serde(default)]
    pub summary: Summary,
    #[serde(default)]
    pub plot: Plot,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            parameters: default_parameters(),
            initial: default_initial(),
            time: Time::default(),
            solver: Solver::default(),
            output: Output::default(),
            log: Log::default(),
            summary: Summary::default(),
            plot: Plot::default(),
        }
    }
}

/// Output time grid
///
/// An explicit list of `points` takes precedence over `start`, `end` and `step`.
#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
pub struct Time {
    #[serde(default = "default_start")]
    pub start: f64,
    #[serde(default = "default_end")]
    pub end: f64,
    #[serde(default = "default_time_step")]
    pub step: f64,
    #[serde(default)]
    pub points: Option<Vec<f64>>,
}

impl Default for Time {
    fn default() -> Self {
        Time {
            start: default_start(),
            end: default_end(),
            step: default_time_step(),
            points: None,
        }
    }
}

/// Name of a numerical method in the `[solver]` section
#[derive(Debug, Deserialize, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    #[default]
    Rk4,
    Dopri5,
    Dop853,
    Exact,
}

/// Numerical method and its settings
///
/// Only the fields used by `method` are read: `step` for `rk4`, the tolerances for `dopri5`
/// and `dop853`. Every field has a default, so single keys can be overridden from the
/// environment.
#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
pub struct Solver {
    #[serde(default)]
    pub method: MethodKind,
    #[serde(default = "default_solver_step")]
    pub step: f64,
    #[serde(default = "default_abs_tol")]
    pub abs_tol: f64,
    #[serde(default = "default_rel_tol")]
    pub rel_tol: f64,
}

impl Default for Solver {
    fn default() -> Self {
        Solver {
            method: MethodKind::default(),
            step: default_solver_step(),
            abs_tol: default_abs_tol(),
            rel_tol: default_rel_tol(),
        }
    }
}

impl Solver {
    pub fn method(&self) -> Method {
        match self.method {
            MethodKind::Rk4 => Method::Rk4 { step: self.step },
            MethodKind::Dopri5 => Method::Dopri5 {
                abs_tol: self.abs_tol,
                rel_tol: self.rel_tol,
            },
            MethodKind::Dop853 => Method::Dop853 {
                abs_tol: self.abs_tol,
                rel_tol: self.rel_tol,
            },
            MethodKind::Exact => Method::Exact,
        }
    }
}

impl From<Method> for Solver {
    fn from(method: Method) -> Self {
        let defaults = Solver::default();
        match method {
            Method::Rk4 { step } => Solver { step, ..defaults },
            Method::Dopri5 { abs_tol, rel_tol } => Solver {
                method: MethodKind::Dopri5,
                abs_tol,
                rel_tol,
                ..defaults
            },
            Method::Dop853 { abs_tol, rel_tol } => Solver {
                method: MethodKind::Dop853,
                abs_tol,
                rel_tol,
                ..defaults
            },
            Method::Exact => Solver {
                method: MethodKind::Exact,
                ..defaults
            },
        }
    }
}

#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
pub struct Output {
    /// Whether to write output files
    #[serde(default = "default_true")]
    pub write: bool,
    /// Folder for output files
    #[serde(default = "default_output_path")]
    pub path: String,
}

impl Default for Output {
    fn default() -> Self {
        Output {
            write: true,
            path: default_output_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
pub struct Log {
    /// Maximum log level, as understood by `tracing_subscriber::EnvFilter`
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Whether to also write the log to `file` in the output folder
    #[serde(default = "default_true")]
    pub write: bool,
    #[serde(default = "default_log_file")]
    pub file: String,
}

impl Default for Log {
    fn default() -> Self {
        Log {
            level: default_log_level(),
            write: true,
            file: default_log_file(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
pub struct Summary {
    /// Compartments to summarize, by name
    #[serde(default = "default_summary_columns")]
    pub columns: Vec<String>,
}

impl Default for Summary {
    fn default() -> Self {
        Summary {
            columns: default_summary_columns(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
pub struct Plot {
    /// Open the terminal chart after the run
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_series")]
    pub series: Vec<SeriesSettings>,
}

impl Default for Plot {
    fn default() -> Self {
        Plot {
            enabled: false,
            series: default_series(),
        }
    }
}

/// One plotted column and its display style
#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
pub struct SeriesSettings {
    pub column: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_marker")]
    pub marker: String,
    #[serde(default = "default_true")]
    pub line: bool,
}

impl Settings {
    pub fn parameters(&self) -> Result<Parameters, SimulationError> {
        Parameters::from_map(&self.parameters)
    }

    pub fn initial_state(&self) -> Result<Compartments, SimulationError> {
        Compartments::from_map(&self.initial)
    }

    pub fn grid(&self) -> Result<TimeGrid, SimulationError> {
        match &self.time.points {
            Some(points) => TimeGrid::new(points.clone()),
            None => TimeGrid::range(self.time.start, self.time.end, self.time.step),
        }
    }

    /// The configured method, checked for positive finite step and tolerances
    pub fn method(&self) -> Result<Method, SimulationError> {
        let method = self.solver.method();
        method.validate()?;
        Ok(method)
    }

    pub fn summary_columns(&self) -> Result<Vec<Compartment>, SimulationError> {
        self.summary.columns.iter().map(|c| c.parse()).collect()
    }

    pub fn series(&self) -> Result<Vec<Series>, SimulationError> {
        self.plot
            .series
            .iter()
            .map(|s| {
                let compartment: Compartment = s.column.parse()?;
                let style = SeriesStyle::parse(&s.color, &s.marker, s.line)?;
                Ok(Series::new(compartment, style))
            })
            .collect()
    }

    /// Checks every section that is converted before a run
    pub fn validate(&self) -> Result<(), SimulationError> {
        self.parameters()?;
        self.initial_state()?;
        self.grid()?;
        self.method()?;
        self.summary_columns()?;
        self.series()?;
        Ok(())
    }

    pub fn set_parameters(&mut self, parameters: &Parameters) {
        self.parameters = parameters.to_map();
    }

    pub fn set_initial_state(&mut self, state: &Compartments) {
        self.initial = state
            .iter()
            .map(|(compartment, value)| (compartment.key(), value))
            .collect();
    }

    pub fn set_method(&mut self, method: Method) {
        self.solver = Solver::from(method);
    }

    pub fn set_time(&mut self, start: f64, end: f64, step: f64) {
        self.time = Time {
            start,
            end,
            step,
            points: None,
        };
    }

    pub fn set_time_points(&mut self, points: Vec<f64>) {
        self.time.points = Some(points);
    }

    pub fn set_output(&mut self, write: bool) {
        self.output.write = write;
    }

    pub fn set_output_path(&mut self, path: &str) {
        self.output.path = path.to_string();
    }

    pub fn set_log_level(&mut self, level: &str) {
        self.log.level = level.to_string();
    }

    pub fn set_plot(&mut self, enabled: bool) {
        self.plot.enabled = enabled;
    }

    /// Writes the settings as JSON to `settings.json` in the output folder
    pub fn write(&self) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        let outputfile = OutputFile::new(&self.output.path, "settings.json")?;
        let mut file = outputfile.file_owned();
        std::io::Write::write_all(&mut file, serialized.as_bytes())?;
        Ok(())
    }
}

/// Reads settings from a TOML file
///
/// Values may be overridden with environment variables prefixed with `MTCT`, using `__` as the
/// separator between sections and keys, e.g. `MTCT__SOLVER__STEP=0.05`.
pub fn read(path: impl AsRef<Path>) -> Result<Settings> {
    let path = path.as_ref();
    let parsed = eConfig::builder()
        .add_source(config::File::from(path).format(config::FileFormat::Toml))
        .add_source(
            config::Environment::with_prefix("MTCT")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .with_context(|| format!("Failed to read settings from {:?}", path))?;

    let settings: Settings = parsed
        .try_deserialize()
        .with_context(|| format!("Failed to parse settings in {:?}", path))?;
    settings.validate()?;

    Ok(settings)
}

// *********************************
// Default values for deserializing
// *********************************
fn default_parameters() -> HashMap<String, f64> {
    Parameters::default().to_map()
}

fn default_initial() -> HashMap<String, f64> {
    Compartments::default()
        .iter()
        .map(|(compartment, value)| (compartment.key(), value))
        .collect()
}

fn default_true() -> bool {
    true
}

fn default_start() -> f64 {
    0.0
}

fn default_end() -> f64 {
    365.0
}

fn default_time_step() -> f64 {
    1.0
}

fn default_solver_step() -> f64 {
    DEFAULT_STEP
}

fn default_abs_tol() -> f64 {
    DEFAULT_ATOL
}

fn default_rel_tol() -> f64 {
    DEFAULT_RTOL
}

fn default_output_path() -> String {
    "outputs/".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "log.txt".to_string()
}

fn default_summary_columns() -> Vec<String> {
    Compartment::ALL.iter().map(|c| c.name().to_string()).collect()
}

fn default_color() -> String {
    "white".to_string()
}

fn default_marker() -> String {
    "braille".to_string()
}

fn default_series() -> Vec<SeriesSettings> {
    [
        ("WI", "red"),
        ("PWI", "magenta"),
        ("CIP", "yellow"),
        ("VS", "green"),
        ("D", "gray"),
    ]
    .into_iter()
    .map(|(column, color)| SeriesSettings {
        column: column.to_string(),
        color: color.to_string(),
        marker: default_marker(),
        line: true,
    })
    .collect()
}
