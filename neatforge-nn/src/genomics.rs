//! Genomes are the focus of evolution in NEAT.
//! A [`NeatGenome`] owns a network whose connections are
//! its genes, each carrying an innovation number shared by
//! every historically identical mutation. This allows genomes
//! of different topologies to be aligned gene by gene, for
//! crossover and for measuring their genetic distance.
//!
//! Genomes can be progressively mutated, thus adding
//! complexity and functionality.

mod config;
mod correlation;
mod crossover;
mod errors;
mod history;
mod mutation;

pub use config::{GeneticConfig, NeatCrossoverSettings, NeatMutationSettings};
pub use correlation::{Alignment, Correlation, Parent};
pub use errors::{CrossoverError, MutationError, ReproductionError};
pub use history::History;
pub use mutation::NeatMutation;

use crate::networks::{ActivationFunction, Connection, Network, NeuronType};

use neatforge::{DistanceFactors, Genome, GenomeId, ValueRange};
use rand::Rng;
use serde::{Deserialize, Serialize};

use std::fmt;

/// A network-owning genome.
///
/// Suports Serde for convenient genome saving and loading.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NeatGenome {
    id: GenomeId,
    network: Network,
}

impl NeatGenome {
    /// Create a new genome with the specified configuration.
    ///
    /// The bias neuron has id 0, inputs `1..=input_count`,
    /// and outputs follow. Each bias or input neuron is
    /// connected to each output with probability
    /// `initial_expression_chance`, with a weight drawn
    /// from `weight_range`. The connection from neuron `s`
    /// to the `o`-th output has innovation number
    /// `s ⨯ output_count + o`.
    ///
    /// # Examples
    /// ```
    /// use neatforge::{GenomeId, ValueRange};
    /// use neatforge_nn::genomics::{GeneticConfig, NeatGenome};
    /// use neatforge_nn::networks::NeuronType;
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     initial_expression_chance: 1.0,
    ///     ..GeneticConfig::default()
    /// };
    /// let weights = ValueRange::new(-5.0, 5.0).unwrap();
    ///
    /// let genome = NeatGenome::new(GenomeId(0), &config, &weights, &mut rand::thread_rng());
    /// let network = genome.network();
    ///
    /// // As configured, the genome should have a bias, 3 inputs and 2 outputs.
    /// assert_eq!(network.neuron_count(), 1 + 3 + 2);
    /// assert_eq!(network.input_ids(), &[1, 2, 3]);
    /// assert_eq!(network.output_ids(), &[4, 5]);
    ///
    /// // And with an initial_expression_chance of 1, every output is
    /// // connected to the bias and every input.
    /// assert_eq!(network.connection_count(), (1 + 3) * 2);
    /// assert!(network.connections().all(|c| c.weight().abs() <= 5.0));
    /// assert!(network.connections().all(|c| (0..8).contains(&c.innovation())));
    /// ```
    pub fn new<R: Rng + ?Sized>(
        id: GenomeId,
        config: &GeneticConfig,
        weight_range: &ValueRange,
        rng: &mut R,
    ) -> NeatGenome {
        let input_count = config.input_count.get();
        let output_count = config.output_count.get();
        let mut network = Network::new();

        // Neuron ids are all distinct, and connections
        // only run from bias and inputs into outputs,
        // so none of the insertions below can fail.
        network
            .add_neuron(0, NeuronType::Bias, ActivationFunction::identity())
            .expect("fresh network has no bias");
        for input in 1..=input_count {
            network
                .add_neuron(input, NeuronType::Input, ActivationFunction::identity())
                .expect("input ids are distinct");
        }
        for o in 0..output_count {
            network
                .add_neuron(input_count + 1 + o, NeuronType::Output, config.output_activation)
                .expect("output ids are distinct");
        }

        for source in 0..=input_count {
            for o in 0..output_count {
                if rng.gen::<f64>() < config.initial_expression_chance {
                    let connection = Connection::new(
                        source * output_count + o,
                        source,
                        input_count + 1 + o,
                        weight_range.sample(rng),
                    );
                    network
                        .add_connection(connection)
                        .expect("initial connections are distinct");
                }
            }
        }

        NeatGenome { id, network }
    }

    /// Wraps an existing network.
    pub fn from_network(id: GenomeId, network: Network) -> NeatGenome {
        NeatGenome { id, network }
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Mutable access to the genome's network, meant for
    /// genomes still under construction.
    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.network
    }

    pub fn into_network(self) -> Network {
        self.network
    }

    pub fn input_count(&self) -> usize {
        self.network.input_ids().len()
    }

    pub fn output_count(&self) -> usize {
        self.network.output_ids().len()
    }

    /// Aligns the genes of both genomes by innovation number.
    pub fn correlate<'a>(&'a self, other: &'a NeatGenome) -> Correlation<'a> {
        Correlation::new(&self.network, &other.network)
    }

    /// Calculates the _genetic distance_ between `self` and `other`:
    ///
    /// `excess ⨯ E / N + disjoint ⨯ D / N + weight ⨯ W`
    ///
    /// where `E` and `D` are the excess and disjoint gene counts,
    /// `W` is the mean weight difference of matching genes, and `N`
    /// is 1, or the larger gene count if `factors.normalize` is set.
    ///
    /// # Examples
    /// ```
    /// use neatforge::{DistanceFactors, GenomeId, ValueRange};
    /// use neatforge_nn::genomics::{GeneticConfig, NeatGenome};
    ///
    /// let config = GeneticConfig::default();
    /// let weights = ValueRange::new(-1.0, 1.0).unwrap();
    /// let mut rng = rand::thread_rng();
    /// let first = NeatGenome::new(GenomeId(0), &config, &weights, &mut rng);
    /// let second = NeatGenome::new(GenomeId(1), &config, &weights, &mut rng);
    ///
    /// let factors = DistanceFactors::default();
    /// assert_eq!(first.distance(&first, &factors), 0.0);
    /// assert_eq!(first.distance(&second, &factors), second.distance(&first, &factors));
    /// ```
    pub fn distance(&self, other: &NeatGenome, factors: &DistanceFactors) -> f64 {
        let correlation = self.correlate(other);
        let norm = if factors.normalize {
            self.network
                .connection_count()
                .max(other.network.connection_count())
                .max(1) as f64
        } else {
            1.0
        };
        factors.excess * correlation.excess as f64 / norm
            + factors.disjoint * correlation.disjoint as f64 / norm
            + factors.weight * correlation.mean_weight_difference()
    }
}

impl Genome for NeatGenome {
    fn id(&self) -> GenomeId {
        self.id
    }

    fn with_id(self, id: GenomeId) -> Self {
        NeatGenome { id, ..self }
    }

    fn genetic_distance(&self, other: &Self, factors: &DistanceFactors) -> f64 {
        self.distance(other, factors)
    }

    fn complexity(&self) -> usize {
        self.network.connection_count()
    }
}

impl fmt::Display for NeatGenome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Genome {} {}", self.id, self.network)
    }
}
