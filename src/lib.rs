//! Deterministic simulation of HIV prevalence among women of reproductive age and
//! mother-to-child transmission.
//!
//! The crate is organised as
//! - [model]: the compartments, the parameter set and the rate equations,
//! - [simulator]: integration of the rate equations over an output grid, and parameter sweeps,
//! - [routines]: settings, logging, output files and summary statistics,
//! - [tui]: terminal line charts of a trajectory.
//!
//! A run is the composition `settings -> integrate -> trajectory -> {summary, output, plot}`,
//! see [entrypoints::simulate].
pub mod entrypoints;
pub mod error;
pub mod model;
pub mod routines;
pub mod simulator;
pub mod tui;

pub mod prelude {
    pub use crate::entrypoints::{simulate as run, simulate_file};
    pub use crate::error::SimulationError;
    pub use crate::model::{
        linear_system, rates, Compartment, Compartments, MtctModel, Parameters, RateFunction,
        NSTATES, PARAMETER_KEYS,
    };
    pub use crate::routines::output::SimulationResult;
    pub use crate::routines::settings::{self, Settings};
    pub use crate::routines::summary::{summarize, Statistics, Summary};
    pub use crate::routines::{logger, output};
    pub use crate::simulator::sweep::{sweep, vary};
    pub use crate::simulator::{
        integrate, negative_compartments, simulate, Method, TimeGrid, Trajectory,
    };
    pub use crate::tui::{self, Series, SeriesStyle};
}
