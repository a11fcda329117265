//! Numeric crossover and mutation of real-valued genes.
use crate::errors::ConfigError;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A closed, non-empty range of admissible gene values.
///
/// Deserialized ranges are validated like those
/// built with [`ValueRange::new`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RangeRecord")]
pub struct ValueRange {
    min: f64,
    max: f64,
}

#[derive(Deserialize)]
struct RangeRecord {
    min: f64,
    max: f64,
}

impl TryFrom<RangeRecord> for ValueRange {
    type Error = ConfigError;

    fn try_from(record: RangeRecord) -> Result<Self, Self::Error> {
        ValueRange::new(record.min, record.max)
    }
}

impl ValueRange {
    /// # Errors
    /// Fails if either bound is not finite, or if `min >= max`.
    ///
    /// # Examples
    /// ```
    /// use neatforge::ValueRange;
    ///
    /// let range = ValueRange::new(-1.0, 1.0).unwrap();
    /// assert_eq!(range.clamp(3.0), 1.0);
    /// assert!(ValueRange::new(1.0, 1.0).is_err());
    /// ```
    pub fn new(min: f64, max: f64) -> Result<ValueRange, ConfigError> {
        if !min.is_finite() || !max.is_finite() {
            return Err(ConfigError::NonFinite {
                parameter: "value range bounds",
            });
        }
        if min >= max {
            return Err(ConfigError::EmptyRange { min, max });
        }
        Ok(ValueRange { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Draws a value uniformly from the range.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        rng.gen_range(self.min..=self.max)
    }
}

/// Available numeric crossover operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrossoverType {
    /// `a + α(b − a)`, with α uniform in `[0, 1]`.
    WholeArithmetic,
    /// `fitter + r(fitter − other)`, with r uniform in `[0, 1]`.
    Heuristic,
}

/// Settings for crossing two real values.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CrossoverSettings {
    pub value_range: ValueRange,
    pub crossover_type: CrossoverType,
}

impl CrossoverSettings {
    /// Combines `fitter` and `other` into a value within
    /// the configured range. Crossing a value with
    /// itself returns that same value (clamped).
    ///
    /// # Examples
    /// ```
    /// use neatforge::{CrossoverSettings, CrossoverType, ValueRange};
    ///
    /// let settings = CrossoverSettings {
    ///     value_range: ValueRange::new(-5.0, 5.0).unwrap(),
    ///     crossover_type: CrossoverType::WholeArithmetic,
    /// };
    /// let child = settings.crossover(1.0, 3.0, &mut rand::thread_rng());
    /// assert!((1.0..=3.0).contains(&child));
    /// ```
    pub fn crossover<R: Rng + ?Sized>(&self, fitter: f64, other: f64, rng: &mut R) -> f64 {
        if fitter == other {
            return self.value_range.clamp(fitter);
        }
        let r: f64 = rng.gen_range(0.0..=1.0);
        let value = match self.crossover_type {
            CrossoverType::WholeArithmetic => fitter + r * (other - fitter),
            CrossoverType::Heuristic => fitter + r * (fitter - other),
        };
        self.value_range.clamp(value)
    }
}

/// Available numeric mutation operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationType {
    /// Perturbation uniform in `[-max_mutation, max_mutation]`.
    Uniform,
    /// Perturbation shrinking as generations advance
    /// (Michalewicz's non-uniform mutation).
    NonUniform,
}

/// Settings for mutating a real value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MutationSettings {
    pub value_range: ValueRange,
    pub mutation_type: MutationType,
    /// Shape of the non-uniform perturbation decay.
    pub alpha: f64,
    /// Generation at which non-uniform perturbations vanish.
    pub generation_factor: f64,
    /// Largest possible perturbation.
    pub max_mutation: f64,
}

impl MutationSettings {
    /// Checks that `alpha`, `generation_factor`
    /// and `max_mutation` are positive and finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (parameter, value) in [
            ("mutation alpha", self.alpha),
            ("mutation generation factor", self.generation_factor),
            ("max mutation", self.max_mutation),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { parameter });
            }
            if value <= 0.0 {
                return Err(ConfigError::NonPositive { parameter, value });
            }
        }
        Ok(())
    }

    /// Perturbs `value`, returning a result within range.
    ///
    /// # Examples
    /// ```
    /// use neatforge::{MutationSettings, MutationType, ValueRange};
    ///
    /// let settings = MutationSettings {
    ///     value_range: ValueRange::new(-1.0, 1.0).unwrap(),
    ///     mutation_type: MutationType::NonUniform,
    ///     alpha: 1.0,
    ///     generation_factor: 100.0,
    ///     max_mutation: 0.5,
    /// };
    /// // Past the generation factor, values no longer change.
    /// assert_eq!(settings.mutate(0.25, 200, &mut rand::thread_rng()), 0.25);
    /// ```
    pub fn mutate<R: Rng + ?Sized>(&self, value: f64, generation: usize, rng: &mut R) -> f64 {
        let delta = match self.mutation_type {
            MutationType::Uniform => rng.gen_range(-self.max_mutation..=self.max_mutation),
            MutationType::NonUniform => {
                let progress = (generation as f64 / self.generation_factor).min(1.0);
                let u: f64 = rng.gen();
                let magnitude =
                    self.max_mutation * (1.0 - u.powf((1.0 - progress).powf(self.alpha)));
                if rng.gen::<bool>() {
                    magnitude
                } else {
                    -magnitude
                }
            }
        };
        self.value_range.clamp(value + delta)
    }
}
