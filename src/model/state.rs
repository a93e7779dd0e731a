use std::collections::HashMap;
use std::fmt;
use std::ops::Mul;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SimulationError;

/// Number of compartments tracked by the model
pub const NSTATES: usize = 11;

/// A named compartment of the state vector
///
/// The declaration order is the order used by the initial condition, the rate function and
/// every row of a trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Compartment {
    /// Susceptible women
    WS,
    /// HIV-uninfected women
    WNI,
    /// HIV-infected women
    WI,
    /// Non-pregnant HIV-uninfected women
    NP,
    /// Pregnant HIV-uninfected women
    P,
    /// Non-pregnant HIV-infected women
    NPWI,
    /// Pregnant HIV-infected women
    PWI,
    /// HIV-uninfected children born during pregnancy
    CNIP,
    /// HIV-infected children born during pregnancy
    CIP,
    /// Virally suppressed children
    VS,
    /// Cumulative child deaths
    D,
}

impl Compartment {
    pub const ALL: [Compartment; NSTATES] = [
        Compartment::WS,
        Compartment::WNI,
        Compartment::WI,
        Compartment::NP,
        Compartment::P,
        Compartment::NPWI,
        Compartment::PWI,
        Compartment::CNIP,
        Compartment::CIP,
        Compartment::VS,
        Compartment::D,
    ];

    /// Position of the compartment in the state vector
    pub fn index(self) -> usize {
        self as usize
    }

    /// Column name used in tables and plots
    pub fn name(self) -> &'static str {
        match self {
            Compartment::WS => "WS",
            Compartment::WNI => "WNI",
            Compartment::WI => "WI",
            Compartment::NP => "NP",
            Compartment::P => "P",
            Compartment::NPWI => "NPWI",
            Compartment::PWI => "PWI",
            Compartment::CNIP => "CNIP",
            Compartment::CIP => "CIP",
            Compartment::VS => "VS",
            Compartment::D => "D",
        }
    }

    /// Key used in configuration files
    pub fn key(self) -> String {
        self.name().to_lowercase()
    }
}

impl fmt::Display for Compartment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Compartment {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Compartment::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| SimulationError::invalid(format!("unknown compartment '{}'", s)))
    }
}

/// Sizes of all compartments at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Compartments([f64; NSTATES]);

impl Compartments {
    pub fn new(values: [f64; NSTATES]) -> Self {
        Compartments(values)
    }

    pub fn zeros() -> Self {
        Compartments([0.0; NSTATES])
    }

    /// Builds a state from a slice, which must hold exactly [NSTATES] values
    pub fn from_slice(values: &[f64]) -> Result<Self, SimulationError> {
        let values: [f64; NSTATES] = values.try_into().map_err(|_| {
            SimulationError::invalid(format!(
                "state must have {} compartments, found {}",
                NSTATES,
                values.len()
            ))
        })?;
        Ok(Compartments(values))
    }

    /// Builds a state from a map of configuration keys (`ws`, `wni`, ...) to values
    ///
    /// Every compartment must be present exactly once and hold a finite, non-negative value.
    pub fn from_map(map: &HashMap<String, f64>) -> Result<Self, SimulationError> {
        let mut values = [0.0; NSTATES];
        for compartment in Compartment::ALL {
            let key = compartment.key();
            let value = map.iter().find(|(k, _)| k.eq_ignore_ascii_case(&key)).map(|(_, v)| *v);
            match value {
                Some(v) => values[compartment.index()] = v,
                None => {
                    return Err(SimulationError::invalid(format!(
                        "initial state is missing compartment '{}'",
                        key
                    )))
                }
            }
        }
        if let Some(unknown) = map.keys().find(|k| k.parse::<Compartment>().is_err()) {
            return Err(SimulationError::invalid(format!(
                "initial state has unknown compartment '{}'",
                unknown
            )));
        }
        let state = Compartments(values);
        state.validate()?;
        Ok(state)
    }

    /// Checks that all compartments are finite and non-negative
    pub fn validate(&self) -> Result<(), SimulationError> {
        for (compartment, value) in self.iter() {
            if !value.is_finite() {
                return Err(SimulationError::invalid(format!(
                    "compartment {} is not finite ({})",
                    compartment, value
                )));
            }
            if value < 0.0 {
                return Err(SimulationError::invalid(format!(
                    "compartment {} is negative ({})",
                    compartment, value
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, compartment: Compartment) -> f64 {
        self.0[compartment.index()]
    }

    pub fn set(&mut self, compartment: Compartment, value: f64) {
        self.0[compartment.index()] = value;
    }

    pub fn as_array(&self) -> &[f64; NSTATES] {
        &self.0
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = (Compartment, f64)> + '_ {
        Compartment::ALL.into_iter().zip(self.0.iter().copied())
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }
}

impl Default for Compartments {
    /// Initial condition of the reference scenario
    fn default() -> Self {
        Compartments([
            10_000.0, 9_000.0, 1_000.0, 4_500.0, 4_500.0, 300.0, 700.0, 490.0, 210.0, 189.0, 21.0,
        ])
    }
}

impl From<[f64; NSTATES]> for Compartments {
    fn from(values: [f64; NSTATES]) -> Self {
        Compartments(values)
    }
}

impl Mul<f64> for Compartments {
    type Output = Compartments;

    fn mul(self, rhs: f64) -> Self::Output {
        Compartments(self.0.map(|v| v * rhs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_is_fixed() {
        let names: Vec<&str> = Compartment::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec!["WS", "WNI", "WI", "NP", "P", "NPWI", "PWI", "CNIP", "CIP", "VS", "D"]
        );
        for (i, c) in Compartment::ALL.iter().enumerate() {
            assert_eq!(c.index(), i);
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("cip".parse::<Compartment>().unwrap(), Compartment::CIP);
        assert_eq!(" VS ".parse::<Compartment>().unwrap(), Compartment::VS);
        assert!("XYZ".parse::<Compartment>().is_err());
    }

    #[test]
    fn from_map_requires_every_compartment() {
        let mut map: HashMap<String, f64> = Compartment::ALL
            .iter()
            .map(|c| (c.key(), 1.0))
            .collect();
        assert!(Compartments::from_map(&map).is_ok());

        map.remove("pwi");
        let err = Compartments::from_map(&map).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn from_map_rejects_unknown_and_negative() {
        let mut map: HashMap<String, f64> = Compartment::ALL
            .iter()
            .map(|c| (c.key(), 1.0))
            .collect();
        map.insert("wx".to_string(), 1.0);
        assert!(Compartments::from_map(&map).is_err());

        map.remove("wx");
        map.insert("ws".to_string(), -1.0);
        assert!(Compartments::from_map(&map).is_err());
    }

    #[test]
    fn from_slice_checks_arity() {
        assert!(Compartments::from_slice(&[0.0; 10]).is_err());
        assert!(Compartments::from_slice(&[0.0; 11]).is_ok());
    }

    #[test]
    fn default_matches_reference_scenario() {
        let s = Compartments::default();
        assert_eq!(s.get(Compartment::WS), 10_000.0);
        assert_eq!(s.get(Compartment::CIP), 210.0);
        assert_eq!(s.get(Compartment::D), 21.0);
    }
}
