//! # NEATForge-NN
//! A neural network-based implementation of the [`neatforge`] crate's
//! [`Genome`] trait, as described in the original NEAT paper.
//!
//! Provides:
//! - a [`NeatGenome`] type usable in `neatforge` populations, with
//!   innovation-aligned crossover, structural mutations and genetic distance,
//! - the [`Network`] it owns: an arbitrarily-structured (possibly cyclic)
//!   network evaluated by iterative relaxation,
//! - a [`FunctionApproximator`] view, best suited for instantaneous
//!   single-output-per-input function approximation tasks,
//! - [`NeatReproduction`], which plugs all of the above into an
//!   [`Evolver`].
//!
//! [`Genome`]: neatforge::Genome
//! [`Evolver`]: neatforge::Evolver
//! [`NeatGenome`]: crate::genomics::NeatGenome
//! [`Network`]: crate::networks::Network
//! [`FunctionApproximator`]: crate::networks::FunctionApproximator
//!
//! # Example usage: mutating and evaluating a genome
//! ```
//! use neatforge::{GenomeId, ValueRange};
//! use neatforge_nn::genomics::{GeneticConfig, History, NeatGenome, NeatMutationSettings};
//! use neatforge_nn::networks::FunctionApproximator;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//! use std::num::NonZeroUsize;
//!
//! let config = GeneticConfig {
//!     input_count: NonZeroUsize::new(2).unwrap(),
//!     output_count: NonZeroUsize::new(1).unwrap(),
//!     ..GeneticConfig::default()
//! };
//! let weights = ValueRange::new(-5.0, 5.0).unwrap();
//! let mut history = History::new(&config);
//! let mut rng = ChaCha8Rng::seed_from_u64(7);
//!
//! let mut genome = NeatGenome::new(GenomeId(0), &config, &weights, &mut rng);
//! genome
//!     .mutate(&NeatMutationSettings::with_range(weights), &config, &mut history, 0, &mut rng)
//!     .unwrap();
//!
//! let output = FunctionApproximator::new(genome.network())
//!     .evaluate(&[1.0, 0.0])
//!     .unwrap();
//! assert_eq!(output.len(), 1);
//!
//! // Genomes can be saved and loaded.
//! let saved = serde_json::to_string(&genome).unwrap();
//! let loaded: NeatGenome = serde_json::from_str(&saved).unwrap();
//! assert_eq!(loaded.network().connection_count(), genome.network().connection_count());
//! ```

pub mod genomics;
pub mod networks;
mod reproduction;

pub use reproduction::NeatReproduction;

/// Identifier type used to designate historically
/// identical mutations for the purposes of
/// genome comparison and genetic tracking.
pub type Innovation = usize;

/// Identifier of a neuron within a network. Neurons
/// created by identical mutations share their id.
pub type NeuronId = usize;
