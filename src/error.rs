use thiserror::Error;

/// Errors raised while preparing or running a simulation
///
/// Both variants abort the run. No partial [crate::simulator::Trajectory] is ever returned.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimulationError {
    /// The time grid, parameter set, initial state or solver configuration was rejected
    /// before integration started.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A step produced non-finite values, or the underlying solver gave up.
    #[error("numerical instability at t = {time}: {reason}")]
    NumericalInstability { time: f64, reason: String },
}

impl SimulationError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        SimulationError::InvalidInput(msg.into())
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, SimulationError::InvalidInput(_))
    }

    pub fn is_numerical_instability(&self) -> bool {
        matches!(self, SimulationError::NumericalInstability { .. })
    }
}
