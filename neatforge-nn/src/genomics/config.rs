use super::NeatMutation;
use crate::networks::ActivationFunction;

use neatforge::{
    ConfigError, CrossoverSettings, CrossoverType, MutationSettings, MutationType, ValueRange,
};
use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

fn check_probability(parameter: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Probability { parameter, value })
    }
}

/// Configuration data for genome generation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneticConfig {
    /// Number of inputs in a genome.
    pub input_count: NonZeroUsize,
    /// Number of outputs in a genome.
    pub output_count: NonZeroUsize,
    /// Activation function of neurons created by mutation.
    pub hidden_activation: ActivationFunction,
    /// Activation function of output neurons.
    pub output_activation: ActivationFunction,
    /// Chance that the connection between a bias or input
    /// neuron and an output neuron is created during
    /// initial genome generation.
    pub initial_expression_chance: f64,
}

impl GeneticConfig {
    /// Checks that `initial_expression_chance` is a probability.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_probability("initial expression chance", self.initial_expression_chance)
    }
}

impl Default for GeneticConfig {
    /// One input, one output, sigmoid activations
    /// and fully connected initial genomes.
    fn default() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::MIN,
            output_count: NonZeroUsize::MIN,
            hidden_activation: ActivationFunction::sigmoid(),
            output_activation: ActivationFunction::sigmoid(),
            initial_expression_chance: 1.0,
        }
    }
}

/// Settings for genome mutation.
///
/// Each call to [`NeatGenome::mutate`] applies a single
/// mutation, picked with probability proportional to
/// its weight among those that apply to the genome.
///
/// [`NeatGenome::mutate`]: crate::genomics::NeatGenome::mutate
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NeatMutationSettings {
    /// Weight perturbation, and the range
    /// from which new weights are drawn.
    pub mutation: MutationSettings,
    pub add_node: f64,
    pub remove_node: f64,
    pub add_connection: f64,
    pub remove_connection: f64,
    pub mutate_weight: f64,
}

impl NeatMutationSettings {
    /// Returns settings that keep weights within `range`,
    /// perturbing them by at most an eighth of its width,
    /// and which mostly mutate weights.
    ///
    /// # Examples
    /// ```
    /// use neatforge::ValueRange;
    /// use neatforge_nn::genomics::NeatMutationSettings;
    ///
    /// let settings = NeatMutationSettings::with_range(ValueRange::new(-4.0, 4.0).unwrap());
    /// assert_eq!(settings.mutation.max_mutation, 1.0);
    /// assert!(settings.validate().is_ok());
    /// ```
    pub fn with_range(range: ValueRange) -> NeatMutationSettings {
        NeatMutationSettings {
            mutation: MutationSettings {
                value_range: range,
                mutation_type: MutationType::Uniform,
                alpha: 1.0,
                generation_factor: 1000.0,
                max_mutation: (range.max() - range.min()) / 8.0,
            },
            add_node: 0.03,
            remove_node: 0.01,
            add_connection: 0.08,
            remove_connection: 0.02,
            mutate_weight: 0.86,
        }
    }

    /// Every mutation type paired with its weight.
    pub fn weights(&self) -> [(NeatMutation, f64); 5] {
        [
            (NeatMutation::AddNode, self.add_node),
            (NeatMutation::RemoveNode, self.remove_node),
            (NeatMutation::AddConnection, self.add_connection),
            (NeatMutation::RemoveConnection, self.remove_connection),
            (NeatMutation::Weight, self.mutate_weight),
        ]
    }

    /// Checks the weight perturbation settings, and that
    /// mutation weights are finite, non-negative, and
    /// not all zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.mutation.validate()?;
        for (_, value) in self.weights() {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite {
                    parameter: "mutation weight",
                });
            }
            if value < 0.0 {
                return Err(ConfigError::Negative {
                    parameter: "mutation weight",
                    value,
                });
            }
        }
        if self.weights().iter().all(|(_, value)| *value == 0.0) {
            return Err(ConfigError::AllZero {
                parameter: "mutation weights",
            });
        }
        Ok(())
    }
}

/// Settings for genome crossover.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NeatCrossoverSettings {
    /// How the weights of matching genes are combined.
    pub crossover: CrossoverSettings,
    /// Chance that matching genes have their weights
    /// combined, instead of inherited from the fitter parent.
    pub crossover_probability: f64,
    /// Chance that a matching gene enabled in only one
    /// parent is disabled in the child.
    pub disable_rate: f64,
    /// Chance that sexual offspring are also mutated.
    pub sexual_mutation_probability: f64,
}

impl NeatCrossoverSettings {
    /// Returns settings that average matching weights half
    /// of the time, within `range`.
    pub fn with_range(range: ValueRange) -> NeatCrossoverSettings {
        NeatCrossoverSettings {
            crossover: CrossoverSettings {
                value_range: range,
                crossover_type: CrossoverType::WholeArithmetic,
            },
            crossover_probability: 0.5,
            disable_rate: 0.75,
            sexual_mutation_probability: 0.25,
        }
    }

    /// Checks that every chance is a probability.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_probability("crossover probability", self.crossover_probability)?;
        check_probability("disable rate", self.disable_rate)?;
        check_probability(
            "sexual mutation probability",
            self.sexual_mutation_probability,
        )
    }
}
