use serde::Serialize;

use crate::model::{Compartment, Compartments};

/// States at every requested output time
///
/// Row `i` holds the state at `times()[i]`; row 0 is the initial condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    times: Vec<f64>,
    states: Vec<Compartments>,
}

/// One row of a [Trajectory], flattened for tabular output
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajectoryRow {
    pub time: f64,
    #[serde(rename = "WS")]
    pub ws: f64,
    #[serde(rename = "WNI")]
    pub wni: f64,
    #[serde(rename = "WI")]
    pub wi: f64,
    #[serde(rename = "NP")]
    pub np: f64,
    #[serde(rename = "P")]
    pub p: f64,
    #[serde(rename = "NPWI")]
    pub npwi: f64,
    #[serde(rename = "PWI")]
    pub pwi: f64,
    #[serde(rename = "CNIP")]
    pub cnip: f64,
    #[serde(rename = "CIP")]
    pub cip: f64,
    #[serde(rename = "VS")]
    pub vs: f64,
    #[serde(rename = "D")]
    pub d: f64,
}

impl TrajectoryRow {
    fn new(time: f64, state: &Compartments) -> Self {
        let [ws, wni, wi, np, p, npwi, pwi, cnip, cip, vs, d] = *state.as_array();
        TrajectoryRow {
            time,
            ws,
            wni,
            wi,
            np,
            p,
            npwi,
            pwi,
            cnip,
            cip,
            vs,
            d,
        }
    }
}

impl Trajectory {
    pub(crate) fn new(times: Vec<f64>, states: Vec<Compartments>) -> Self {
        debug_assert_eq!(times.len(), states.len());
        Trajectory { times, states }
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn states(&self) -> &[Compartments] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// State at the last output time
    pub fn last(&self) -> &Compartments {
        // A trajectory always holds at least the initial state
        &self.states[self.states.len() - 1]
    }

    /// All values of one compartment, in time order
    pub fn column(&self, compartment: Compartment) -> Vec<f64> {
        self.states.iter().map(|s| s.get(compartment)).collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = TrajectoryRow> + '_ {
        self.times
            .iter()
            .zip(&self.states)
            .map(|(t, s)| TrajectoryRow::new(*t, s))
    }
}
