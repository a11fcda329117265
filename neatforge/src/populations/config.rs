use crate::errors::ConfigError;

use serde::{Deserialize, Serialize};

/// Configuration data for offspring generation.
///
/// # Note
/// All proportions must lie in `[0.0, 1.0]`, and the three
/// reproduction proportions must add up to 1. This is
/// checked by [`validate`] when an [`Evolver`] is built.
///
/// [`validate`]: EvolutionParameters::validate
/// [`Evolver`]: crate::Evolver
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvolutionParameters {
    /// Fraction of each species copied as-is
    /// to the next generation.
    pub elite_proportion: f64,
    /// Minimum number of elites per species.
    pub elite_copies: usize,
    /// Fraction of non-elite offspring produced by
    /// a single parent.
    pub asexual_proportion: f64,
    /// Fraction of non-elite offspring produced by
    /// two parents of the same species.
    pub sexual_proportion: f64,
    /// Fraction of non-elite offspring produced by
    /// parents from different species.
    pub interspecies_sexual_proportion: f64,
}

impl EvolutionParameters {
    /// Checks every proportion and their sum.
    ///
    /// # Examples
    /// ```
    /// use neatforge::EvolutionParameters;
    ///
    /// assert!(EvolutionParameters::default().validate().is_ok());
    ///
    /// let unbalanced = EvolutionParameters {
    ///     sexual_proportion: 0.9,
    ///     ..EvolutionParameters::default()
    /// };
    /// assert!(unbalanced.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (parameter, value) in [
            ("elite proportion", self.elite_proportion),
            ("asexual proportion", self.asexual_proportion),
            ("sexual proportion", self.sexual_proportion),
            (
                "interspecies sexual proportion",
                self.interspecies_sexual_proportion,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Probability { parameter, value });
            }
        }
        let sum =
            self.asexual_proportion + self.sexual_proportion + self.interspecies_sexual_proportion;
        if (sum - 1.0).abs() > 1e-9 {
            return Err(ConfigError::ProportionSum {
                parameter: "reproduction proportions",
                sum,
            });
        }
        Ok(())
    }
}

impl Default for EvolutionParameters {
    fn default() -> Self {
        EvolutionParameters {
            elite_proportion: 0.2,
            elite_copies: 1,
            asexual_proportion: 0.5,
            sexual_proportion: 0.45,
            interspecies_sexual_proportion: 0.05,
        }
    }
}
