//! Time integration of a [RateFunction] over an output grid
//!
//! Every interval between two consecutive grid points is integrated on its own, starting from
//! the state reported at the earlier point, so every output row lands exactly on its requested
//! time regardless of the method's internal step size.
pub mod analytical;
pub mod ode;
pub mod sweep;
pub mod trajectory;

use crate::error::SimulationError;
use crate::model::{Compartment, Compartments, Parameters, RateFunction, NSTATES};

pub use trajectory::Trajectory;

/// Default sub-step of the fixed-step method, in days
pub const DEFAULT_STEP: f64 = 0.1;
pub const DEFAULT_ATOL: f64 = 1e-8;
pub const DEFAULT_RTOL: f64 = 1e-8;

/// Numerical method used to advance the state between output times
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Method {
    /// Classical 4th-order Runge-Kutta with a fixed maximum sub-step
    ///
    /// Each output interval is split into `ceil(span / step)` equal sub-steps.
    Rk4 { step: f64 },

    /// Adaptive Dormand-Prince 5(4)
    Dopri5 {
        abs_tol: f64,
        rel_tol: f64,
    },

    /// Adaptive Dormand-Prince 8(5,3)
    Dop853 {
        abs_tol: f64,
        rel_tol: f64,
    },

    /// Closed form through the matrix exponential of the linear system
    ///
    /// Requires a model that provides [RateFunction::linear_system].
    Exact,
}

impl Default for Method {
    fn default() -> Self {
        Method::Rk4 { step: DEFAULT_STEP }
    }
}

impl Method {
    pub fn dopri5() -> Self {
        Method::Dopri5 {
            abs_tol: DEFAULT_ATOL,
            rel_tol: DEFAULT_RTOL,
        }
    }

    pub fn dop853() -> Self {
        Method::Dop853 {
            abs_tol: DEFAULT_ATOL,
            rel_tol: DEFAULT_RTOL,
        }
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SimulationError::invalid(format!(
                    "solver {} must be a positive finite number, found {}",
                    name, value
                )))
            }
        };
        match *self {
            Method::Rk4 { step } => positive("step", step),
            Method::Dopri5 { abs_tol, rel_tol } | Method::Dop853 { abs_tol, rel_tol } => {
                positive("abs_tol", abs_tol)?;
                positive("rel_tol", rel_tol)
            }
            Method::Exact => Ok(()),
        }
    }
}

/// An ordered, strictly increasing sequence of output times
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid(Vec<f64>);

impl TimeGrid {
    /// Validates an explicit list of times
    pub fn new(times: Vec<f64>) -> Result<Self, SimulationError> {
        if times.is_empty() {
            return Err(SimulationError::invalid("time grid is empty"));
        }
        if let Some(t) = times.iter().find(|t| !t.is_finite()) {
            return Err(SimulationError::invalid(format!(
                "time grid contains a non-finite value ({})",
                t
            )));
        }
        if let Some(pair) = times.windows(2).find(|w| w[1] <= w[0]) {
            return Err(SimulationError::invalid(format!(
                "time grid must be strictly increasing, found {} followed by {}",
                pair[0], pair[1]
            )));
        }
        Ok(TimeGrid(times))
    }

    /// Evenly spaced times from `start` to `end` inclusive
    ///
    /// Points are computed as `start + i * step` so rounding does not accumulate. `end` is
    /// included when it lies on the grid.
    pub fn range(start: f64, end: f64, step: f64) -> Result<Self, SimulationError> {
        if !(step.is_finite() && step > 0.0) {
            return Err(SimulationError::invalid(format!(
                "time step must be a positive finite number, found {}",
                step
            )));
        }
        if !(start.is_finite() && end.is_finite()) || end < start {
            return Err(SimulationError::invalid(format!(
                "time range [{}, {}] is not valid",
                start, end
            )));
        }
        let n = ((end - start) / step + 1e-9).floor() as usize;
        let times = (0..=n).map(|i| start + i as f64 * step).collect();
        TimeGrid::new(times)
    }

    pub fn times(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for TimeGrid {
    /// One year with daily output
    fn default() -> Self {
        TimeGrid((0..=365).map(|t| t as f64).collect())
    }
}

impl std::ops::Deref for TimeGrid {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.0
    }
}

/// Integrates `model` from `initial` across `grid`
///
/// The first row of the returned [Trajectory] is `initial`, unchanged, at `grid[0]`. All input
/// is validated before any integration; any failure aborts the run and no partial trajectory is
/// returned.
///
/// Negative compartments are not clamped. The first time a compartment turns negative a warning
/// is logged with its name and time.
pub fn integrate<M: RateFunction>(
    model: &M,
    initial: &Compartments,
    params: &Parameters,
    grid: &[f64],
    method: Method,
) -> Result<Trajectory, SimulationError> {
    let grid = TimeGrid::new(grid.to_vec())?;
    initial.validate()?;
    params.validate()?;
    method.validate()?;

    tracing::debug!(
        "Integrating {} output points over [{}, {}] with {:?}",
        grid.len(),
        grid[0],
        grid[grid.len() - 1],
        method
    );

    let mut states = Vec::with_capacity(grid.len());
    states.push(*initial);

    let mut stepper = Stepper::new(model, params, method)?;
    let mut reported = [false; NSTATES];
    let mut state = *initial;

    for window in grid.windows(2) {
        let (ti, tf) = (window[0], window[1]);
        state = stepper.advance(state, ti, tf)?;

        if !state.is_finite() {
            return Err(SimulationError::NumericalInstability {
                time: tf,
                reason: format!("non-finite state {:?}", state.as_slice()),
            });
        }
        warn_negative(&state, tf, &mut reported);
        states.push(state);
    }

    tracing::debug!(
        "Integration finished after {} rate evaluations",
        stepper.evaluations()
    );

    Ok(Trajectory::new(grid.times().to_vec(), states))
}

fn warn_negative(state: &Compartments, time: f64, reported: &mut [bool; NSTATES]) {
    for (compartment, value) in state.iter() {
        if value < 0.0 && !reported[compartment.index()] {
            reported[compartment.index()] = true;
            tracing::warn!(
                "Compartment {} became negative ({:.6e}) at t = {}",
                compartment,
                value,
                time
            );
        }
    }
}

/// Dispatches one output interval to the selected method
enum Stepper<'a, M: RateFunction> {
    Ode(ode::OdeStepper<'a, M>),
    Exact(analytical::ExactStepper),
}

impl<'a, M: RateFunction> Stepper<'a, M> {
    fn new(
        model: &'a M,
        params: &'a Parameters,
        method: Method,
    ) -> Result<Self, SimulationError> {
        match method {
            Method::Exact => {
                let (a, b) = model.linear_system(params).ok_or_else(|| {
                    SimulationError::invalid("the exact method requires a model with a matrix form")
                })?;
                Ok(Stepper::Exact(analytical::ExactStepper::new(&a, &b)))
            }
            _ => Ok(Stepper::Ode(ode::OdeStepper::new(model, params, method))),
        }
    }

    fn advance(
        &mut self,
        state: Compartments,
        ti: f64,
        tf: f64,
    ) -> Result<Compartments, SimulationError> {
        match self {
            Stepper::Ode(stepper) => stepper.advance(state, ti, tf),
            Stepper::Exact(stepper) => Ok(stepper.advance(state, tf - ti)),
        }
    }

    fn evaluations(&self) -> u32 {
        match self {
            Stepper::Ode(stepper) => stepper.evaluations(),
            Stepper::Exact(_) => 0,
        }
    }
}

/// Shorthand for [integrate] with the transmission model
pub fn simulate(
    initial: &Compartments,
    params: &Parameters,
    grid: &[f64],
    method: Method,
) -> Result<Trajectory, SimulationError> {
    integrate(&crate::model::MtctModel, initial, params, grid, method)
}

/// Compartments whose trajectory ever went negative
pub fn negative_compartments(trajectory: &Trajectory) -> Vec<Compartment> {
    Compartment::ALL
        .into_iter()
        .filter(|c| trajectory.column(*c).iter().any(|v| *v < 0.0))
        .collect()
}
