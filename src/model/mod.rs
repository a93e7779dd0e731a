//! The mother-to-child transmission model
//!
//! Eleven coupled linear ODEs without explicit time dependence. See [rates] for the equations.
pub mod parameters;
pub mod state;

use nalgebra::{SMatrix, SVector};

pub use parameters::{Parameters, PARAMETER_KEYS};
pub use state::{Compartment, Compartments, NSTATES};

pub type Matrix = SMatrix<f64, NSTATES, NSTATES>;
pub type Vector = SVector<f64, NSTATES>;

/// Right-hand side of an ODE system over [Compartments]
///
/// Implementations must be pure: the same arguments always produce the same rates, so a single
/// model can be shared by concurrent integrations.
pub trait RateFunction: Sync {
    fn rates(&self, t: f64, state: &Compartments, params: &Parameters) -> Compartments;

    /// Matrix form `dS/dt = A·S + b` of [RateFunction::rates], if the model is affine and
    /// autonomous. Required by [crate::simulator::Method::Exact].
    fn linear_system(&self, _params: &Parameters) -> Option<(Matrix, Vector)> {
        None
    }
}

impl<F> RateFunction for F
where
    F: Fn(f64, &Compartments, &Parameters) -> Compartments + Sync,
{
    fn rates(&self, t: f64, state: &Compartments, params: &Parameters) -> Compartments {
        self(t, state, params)
    }
}

/// The transmission model defined by [rates]
#[derive(Debug, Clone, Copy, Default)]
pub struct MtctModel;

impl RateFunction for MtctModel {
    #[inline(always)]
    fn rates(&self, t: f64, state: &Compartments, params: &Parameters) -> Compartments {
        rates(t, state, params)
    }

    fn linear_system(&self, params: &Parameters) -> Option<(Matrix, Vector)> {
        Some(linear_system(params))
    }
}

/// Instantaneous rates of change of every compartment
///
/// ```text
/// dWS   = f − δ·WS
/// dWNI  = (1−p)·δ·WS − (α + (1−α)·D + x)·WNI
/// dWI   = p·δ·WS − ((1−β)·Dt + β + x)·WI
/// dNP   = α·WNI
/// dP    = x·WNI − D·P
/// dNPWI = β·WI
/// dPWI  = x·WI − (μ + Dt)·PWI
/// dCNIP = (1−μ)·PWI
/// dCIP  = μ·PWI − (r + d)·CIP
/// dVS   = r·CIP
/// dD    = d·CIP
/// ```
///
/// `f` is a constant inflow of susceptible women, not a per-capita birth rate.
/// The system is autonomous and `_t` is only accepted for solver compatibility.
pub fn rates(_t: f64, state: &Compartments, params: &Parameters) -> Compartments {
    let [ws, wni, wi, _np, p, _npwi, pwi, _cnip, cip, _vs, _d] = *state.as_array();
    let Parameters {
        fertility: f,
        prevalence,
        delta,
        alpha,
        mortality,
        pregnancy: x,
        beta,
        hiv_mortality: dt,
        transmission: mu,
        suppression: r,
        child_mortality: d,
    } = *params;

    Compartments::new([
        f - delta * ws,
        (1.0 - prevalence) * delta * ws - (alpha + (1.0 - alpha) * mortality + x) * wni,
        prevalence * delta * ws - ((1.0 - beta) * dt + beta + x) * wi,
        alpha * wni,
        x * wni - mortality * p,
        beta * wi,
        x * wi - (mu + dt) * pwi,
        (1.0 - mu) * pwi,
        mu * pwi - (r + d) * cip,
        r * cip,
        d * cip,
    ])
}

/// Matrix form `dS/dt = A·S + b` of [rates]
pub fn linear_system(params: &Parameters) -> (Matrix, Vector) {
    use Compartment::*;

    let Parameters {
        fertility: f,
        prevalence,
        delta,
        alpha,
        mortality,
        pregnancy: x,
        beta,
        hiv_mortality: dt,
        transmission: mu,
        suppression: r,
        child_mortality: d,
    } = *params;

    let mut a = Matrix::zeros();
    let mut set = |row: Compartment, col: Compartment, value: f64| {
        a[(row.index(), col.index())] = value;
    };

    set(WS, WS, -delta);
    set(WNI, WS, (1.0 - prevalence) * delta);
    set(WNI, WNI, -(alpha + (1.0 - alpha) * mortality + x));
    set(WI, WS, prevalence * delta);
    set(WI, WI, -((1.0 - beta) * dt + beta + x));
    set(NP, WNI, alpha);
    set(P, WNI, x);
    set(P, P, -mortality);
    set(NPWI, WI, beta);
    set(PWI, WI, x);
    set(PWI, PWI, -(mu + dt));
    set(CNIP, PWI, 1.0 - mu);
    set(CIP, PWI, mu);
    set(CIP, CIP, -(r + d));
    set(VS, CIP, r);
    set(D, CIP, d);

    let mut b = Vector::zeros();
    b[WS.index()] = f;

    (a, b)
}
