use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::SimulationError;

/// Configuration keys of the 11 model coefficients, in declaration order
pub const PARAMETER_KEYS: [&str; 11] = [
    "fertility",
    "prevalence",
    "delta",
    "alpha",
    "mortality",
    "pregnancy",
    "beta",
    "hiv_mortality",
    "transmission",
    "suppression",
    "child_mortality",
];

/// Coefficients of the transmission model
///
/// All rates are per day. The set is fixed for the duration of one simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    /// `f`: constant recruitment of susceptible women
    pub fertility: f64,
    /// `p`: HIV prevalence among women leaving the susceptible pool
    pub prevalence: f64,
    /// `δ`: rate at which susceptible women enter the risk pool
    pub delta: f64,
    /// `α`: rate at which uninfected women become non-pregnant
    pub alpha: f64,
    /// `D`: death rate of uninfected women
    pub mortality: f64,
    /// `x`: pregnancy rate
    pub pregnancy: f64,
    /// `β`: rate at which infected women become non-pregnant
    pub beta: f64,
    /// `Dt`: death rate of infected women
    pub hiv_mortality: f64,
    /// `μ`: mother-to-child transmission probability
    pub transmission: f64,
    /// `r`: viral suppression rate of infected children
    pub suppression: f64,
    /// `d`: death rate of infected children
    pub child_mortality: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            fertility: 0.05,
            prevalence: 0.1,
            delta: 0.01,
            alpha: 0.5,
            mortality: 0.01,
            pregnancy: 0.02,
            beta: 0.3,
            hiv_mortality: 0.05,
            transmission: 0.3,
            suppression: 0.9,
            child_mortality: 0.1,
        }
    }
}

impl Parameters {
    /// Values in the order of [PARAMETER_KEYS]
    pub fn values(&self) -> [f64; 11] {
        [
            self.fertility,
            self.prevalence,
            self.delta,
            self.alpha,
            self.mortality,
            self.pregnancy,
            self.beta,
            self.hiv_mortality,
            self.transmission,
            self.suppression,
            self.child_mortality,
        ]
    }

    /// Coefficients interpreted as probabilities, which must lie in `[0, 1]`
    fn is_probability(key: &str) -> bool {
        matches!(key, "prevalence" | "alpha" | "beta" | "transmission")
    }

    /// Builds a parameter set from a name to value map
    ///
    /// The map must contain exactly the 11 keys of [PARAMETER_KEYS].
    pub fn from_map(map: &HashMap<String, f64>) -> Result<Self, SimulationError> {
        let missing: Vec<&str> = PARAMETER_KEYS
            .iter()
            .copied()
            .filter(|key| !map.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            return Err(SimulationError::invalid(format!(
                "parameter set is missing {}",
                missing.join(", ")
            )));
        }
        let mut unknown: Vec<&String> = map
            .keys()
            .filter(|key| !PARAMETER_KEYS.contains(&key.as_str()))
            .collect();
        if !unknown.is_empty() {
            unknown.sort();
            return Err(SimulationError::invalid(format!(
                "parameter set has unknown keys: {:?}",
                unknown
            )));
        }

        let parameters = Parameters {
            fertility: map["fertility"],
            prevalence: map["prevalence"],
            delta: map["delta"],
            alpha: map["alpha"],
            mortality: map["mortality"],
            pregnancy: map["pregnancy"],
            beta: map["beta"],
            hiv_mortality: map["hiv_mortality"],
            transmission: map["transmission"],
            suppression: map["suppression"],
            child_mortality: map["child_mortality"],
        };
        parameters.validate()?;
        Ok(parameters)
    }

    /// Checks documented ranges: rates are finite and non-negative, probabilities lie in `[0, 1]`
    pub fn validate(&self) -> Result<(), SimulationError> {
        for (key, value) in PARAMETER_KEYS.iter().zip(self.values()) {
            if !value.is_finite() || value < 0.0 {
                return Err(SimulationError::invalid(format!(
                    "parameter {} must be a finite non-negative number, found {}",
                    key, value
                )));
            }
            if Self::is_probability(key) && value > 1.0 {
                return Err(SimulationError::invalid(format!(
                    "parameter {} is a probability and must be within [0, 1], found {}",
                    key, value
                )));
            }
        }
        Ok(())
    }

    pub fn to_map(&self) -> HashMap<String, f64> {
        PARAMETER_KEYS
            .iter()
            .zip(self.values())
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_round_trip_preserves_values() {
        let params = Parameters::default();
        let parsed = Parameters::from_map(&params.to_map()).unwrap();
        assert_eq!(parsed, params);
    }

    #[test]
    fn missing_key_is_invalid() {
        let mut map = Parameters::default().to_map();
        map.remove("hiv_mortality");
        let err = Parameters::from_map(&map).unwrap_err();
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("hiv_mortality"));
    }

    #[test]
    fn unknown_key_is_invalid() {
        let mut map = Parameters::default().to_map();
        map.insert("fertilty".to_string(), 0.1);
        assert!(Parameters::from_map(&map).unwrap_err().is_invalid_input());
    }

    #[test]
    fn probabilities_are_bounded() {
        let mut params = Parameters::default();
        params.transmission = 1.5;
        assert!(params.validate().is_err());

        // Rates may exceed one
        let mut params = Parameters::default();
        params.suppression = 2.0;
        assert!(params.validate().is_ok());
    }

    #[test]
    fn negative_or_nan_rates_are_invalid() {
        let mut params = Parameters::default();
        params.delta = -0.1;
        assert!(params.validate().is_err());

        let mut params = Parameters::default();
        params.mortality = f64::NAN;
        assert!(params.validate().is_err());
    }
}
