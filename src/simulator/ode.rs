use ode_solvers::dop_shared::OutputType;
use ode_solvers::{Dop853, Dopri5, Rk4, SVector, System};

use crate::error::SimulationError;
use crate::model::{Compartments, Parameters, RateFunction, NSTATES};
use crate::simulator::Method;

type State = SVector<f64, NSTATES>;
type Time = f64;

// Step size control of the adaptive methods, as in `Dopri5::new`
const SAFETY_FACTOR: f64 = 0.9;
const BETA: f64 = 0.04;
const FAC_MIN: f64 = 0.2;
const FAC_MAX: f64 = 10.0;
const MAX_STEPS: u32 = 100_000;
const STIFFNESS_CHECK: u32 = 1000;

/// Adapts a [RateFunction] and its parameters to the `ode_solvers` system interface
struct Model<'a, M: RateFunction> {
    model: &'a M,
    params: &'a Parameters,
}

impl<M: RateFunction> System<Time, State> for Model<'_, M> {
    fn system(&self, t: Time, y: &State, dy: &mut State) {
        let mut state = [0.0; NSTATES];
        state.copy_from_slice(y.as_slice());
        let rates = self.model.rates(t, &Compartments::new(state), self.params);
        dy.copy_from_slice(rates.as_slice());
    }
}

/// Advances the state across one output interval with an explicit Runge-Kutta method
pub(crate) struct OdeStepper<'a, M: RateFunction> {
    model: &'a M,
    params: &'a Parameters,
    method: Method,
    evaluations: u32,
}

impl<'a, M: RateFunction> OdeStepper<'a, M> {
    pub(crate) fn new(model: &'a M, params: &'a Parameters, method: Method) -> Self {
        OdeStepper {
            model,
            params,
            method,
            evaluations: 0,
        }
    }

    pub(crate) fn evaluations(&self) -> u32 {
        self.evaluations
    }

    pub(crate) fn advance(
        &mut self,
        x: Compartments,
        ti: f64,
        tf: f64,
    ) -> Result<Compartments, SimulationError> {
        let system = Model {
            model: self.model,
            params: self.params,
        };
        let y0 = State::from_row_slice(x.as_slice());
        let failure = |e: ode_solvers::dop_shared::IntegrationError| {
            SimulationError::NumericalInstability {
                time: ti,
                reason: e.to_string(),
            }
        };

        let y = match self.method {
            Method::Rk4 { step } => {
                let span = tf - ti;
                let nsteps = (span / step).ceil().max(1.0);
                let h = span / nsteps;
                let mut stepper = Rk4::new(system, ti, y0, tf, h);
                let stats = stepper.integrate().map_err(failure)?;
                self.evaluations += stats.num_eval;
                // Index `nsteps` is the sub-step ending at `tf`, even if rounding
                // made the solver take one extra step.
                let index = (nsteps as usize).min(stepper.y_out().len() - 1);
                stepper.y_out()[index]
            }
            // Sparse output keeps one row per accepted step; the last one sits on `tf`.
            Method::Dopri5 { abs_tol, rel_tol } => {
                let mut stepper = Dopri5::from_param(
                    system,
                    ti,
                    tf,
                    tf - ti,
                    y0,
                    rel_tol,
                    abs_tol,
                    SAFETY_FACTOR,
                    BETA,
                    FAC_MIN,
                    FAC_MAX,
                    tf - ti,
                    0.0,
                    MAX_STEPS,
                    STIFFNESS_CHECK,
                    OutputType::Sparse,
                );
                let stats = stepper.integrate().map_err(failure)?;
                self.evaluations += stats.num_eval;
                last(stepper.y_out(), ti)?
            }
            Method::Dop853 { abs_tol, rel_tol } => {
                let mut stepper = Dop853::from_param(
                    system,
                    ti,
                    tf,
                    tf - ti,
                    y0,
                    rel_tol,
                    abs_tol,
                    SAFETY_FACTOR,
                    BETA,
                    FAC_MIN,
                    FAC_MAX,
                    tf - ti,
                    0.0,
                    MAX_STEPS,
                    STIFFNESS_CHECK,
                    OutputType::Sparse,
                );
                let stats = stepper.integrate().map_err(failure)?;
                self.evaluations += stats.num_eval;
                last(stepper.y_out(), ti)?
            }
            Method::Exact => {
                return Err(SimulationError::invalid(
                    "the exact method is not an explicit Runge-Kutta scheme",
                ))
            }
        };

        tracing::trace!("Advanced from t = {} to t = {}", ti, tf);
        Compartments::from_slice(y.as_slice())
    }
}

fn last(y_out: &[State], ti: f64) -> Result<State, SimulationError> {
    y_out
        .last()
        .copied()
        .ok_or_else(|| SimulationError::NumericalInstability {
            time: ti,
            reason: "solver produced no output".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Compartment, MtctModel};
    use approx::assert_relative_eq;

    fn decay(_t: f64, s: &Compartments, _p: &Parameters) -> Compartments {
        Compartments::new(s.as_array().map(|v| -v))
    }

    #[test]
    fn rk4_reaches_interval_end() {
        let params = Parameters::default();
        let mut stepper = OdeStepper::new(&decay, &params, Method::Rk4 { step: 0.01 });
        let x = Compartments::new([1.0; NSTATES]);
        let y = stepper.advance(x, 0.0, 1.0).unwrap();
        assert_relative_eq!(y.get(Compartment::WS), (-1.0f64).exp(), max_relative = 1e-8);
        assert!(stepper.evaluations() > 0);
    }

    #[test]
    fn rk4_uses_equal_substeps_for_uneven_spans() {
        let params = Parameters::default();
        let mut stepper = OdeStepper::new(&decay, &params, Method::Rk4 { step: 0.3 });
        let x = Compartments::new([2.0; NSTATES]);
        let y = stepper.advance(x, 0.0, 1.0).unwrap();
        // 4 sub-steps of 0.25
        assert_relative_eq!(y.get(Compartment::D), 2.0 * (-1.0f64).exp(), max_relative = 1e-3);
    }

    #[test]
    fn adaptive_methods_reach_interval_end() {
        let params = Parameters::default();
        for method in [Method::dopri5(), Method::dop853()] {
            let mut stepper = OdeStepper::new(&decay, &params, method);
            let x = Compartments::new([1.0; NSTATES]);
            let y = stepper.advance(x, 2.0, 4.0).unwrap();
            assert_relative_eq!(y.get(Compartment::VS), (-2.0f64).exp(), max_relative = 1e-6);
        }
    }

    #[test]
    fn adaptive_methods_end_on_final_time() {
        let params = Parameters::default();
        for method in [Method::dopri5(), Method::dop853()] {
            let mut stepper = OdeStepper::new(&MtctModel, &params, method);
            let y = stepper.advance(Compartments::default(), 0.0, 1.0).unwrap();
            // WS(1) = f/δ + (WS0 − f/δ)·exp(−δ)
            let expected = 5.0 + (10_000.0 - 5.0) * (-0.01f64).exp();
            assert_relative_eq!(y.get(Compartment::WS), expected, max_relative = 1e-7);
            assert!(stepper.evaluations() < 1000);
        }
    }

    #[test]
    fn exact_is_not_an_ode_method() {
        let params = Parameters::default();
        let mut stepper = OdeStepper::new(&MtctModel, &params, Method::Exact);
        assert!(stepper
            .advance(Compartments::default(), 0.0, 1.0)
            .unwrap_err()
            .is_invalid_input());
    }
}
