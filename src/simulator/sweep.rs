use rayon::prelude::*;

use crate::error::SimulationError;
use crate::model::{Compartments, Parameters, RateFunction};
use crate::simulator::{integrate, Method, Trajectory};

/// Integrates one trajectory per parameter set, in parallel
///
/// Results are returned in the order of `parameter_sets`. Each run owns its state and a failing
/// run does not affect the others.
pub fn sweep<M: RateFunction>(
    model: &M,
    initial: &Compartments,
    parameter_sets: &[Parameters],
    grid: &[f64],
    method: Method,
) -> Vec<Result<Trajectory, SimulationError>> {
    tracing::info!(
        "Running {} simulations across {} threads",
        parameter_sets.len(),
        rayon::current_num_threads()
    );
    parameter_sets
        .par_iter()
        .map(|params| integrate(model, initial, params, grid, method))
        .collect()
}

/// Parameter sets where a single coefficient takes each of `values`
///
/// All other coefficients are taken from `base`. Fails on an unknown key.
pub fn vary(
    base: &Parameters,
    key: &str,
    values: &[f64],
) -> Result<Vec<Parameters>, SimulationError> {
    values
        .iter()
        .map(|value| {
            let mut map = base.to_map();
            match map.get_mut(key) {
                Some(slot) => *slot = *value,
                None => {
                    return Err(SimulationError::invalid(format!(
                        "cannot vary unknown parameter '{}'",
                        key
                    )))
                }
            }
            Parameters::from_map(&map)
        })
        .collect()
}
