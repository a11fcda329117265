//! A generic implementation of NeuroEvolution of Augmenting Topologies,
//! following the 2002 paper: <http://nn.cs.utexas.edu/keyword?stanley:ec02>
//!
//! The engine evolves populations of arbitrary genomes through the
//! [`Genome`], [`SpeciesMember`] and [`Reproduction`] traits. Parent
//! selection ([`SelectionStrategy`]) and speciation
//! ([`SpeciationStrategy`]) are pluggable, and every randomized
//! operation takes an explicit random number generator, so runs
//! are reproducible given a seeded generator.
//! A neural network-based genome, as in the original algorithm,
//! is supplied by the `neatforge-nn` crate.
//!
//! # Example usage: Evolution of XOR function approximator, using `neatforge-nn`
//! ```
//! use neatforge::{
//!     DistanceFactors, EvolutionParameters, Evolver, IncrementalSpeciation, LinearRanking,
//!     Member, SpeciesInheritance,
//! };
//! use neatforge_nn::genomics::{GeneticConfig, NeatGenome};
//! use neatforge_nn::networks::FunctionApproximator;
//! use neatforge_nn::NeatReproduction;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//! use std::num::NonZeroUsize;
//! use std::sync::Arc;
//!
//! fn evaluate_xor(genome: &NeatGenome) -> f64 {
//!     let mut network = FunctionApproximator::new(genome.network());
//!     let cases = [
//!         ([0.0, 0.0], 0.0),
//!         ([0.0, 1.0], 1.0),
//!         ([1.0, 0.0], 1.0),
//!         ([1.0, 1.0], 0.0),
//!     ];
//!     let squared_error: f64 = cases
//!         .iter()
//!         .map(|(input, expected)| match network.evaluate(input) {
//!             Ok(output) => (output[0] - expected).powi(2),
//!             Err(_) => 1.0,
//!         })
//!         .sum();
//!     1.0 - squared_error.sqrt()
//! }
//!
//! fn main() {
//!     let genetic_config = GeneticConfig {
//!         input_count: NonZeroUsize::new(2).unwrap(),
//!         output_count: NonZeroUsize::new(1).unwrap(),
//!         ..GeneticConfig::default()
//!     };
//!     let reproduction = NeatReproduction::with_defaults(genetic_config).unwrap();
//!     let speciation = IncrementalSpeciation::new(DistanceFactors::default(), 3.0, None)
//!         .unwrap()
//!         .with_inheritance(SpeciesInheritance::WithinThreshold);
//!     let mut evolver = Evolver::new(
//!         EvolutionParameters::default(),
//!         LinearRanking::new(0.5).unwrap(),
//!         speciation,
//!         reproduction,
//!     )
//!     .unwrap();
//!
//!     let mut rng = ChaCha8Rng::seed_from_u64(42);
//!     let fitness = Arc::new(evaluate_xor);
//!     let members = evolver
//!         .spawn_genomes(150, &mut rng)
//!         .unwrap()
//!         .into_iter()
//!         .map(|genome| Member::new(genome, Arc::clone(&fitness)))
//!         .collect();
//!     let population = evolver.create_new_population(members).unwrap();
//!
//!     let solution = evolver.solve(population, 20, 0.9, &mut rng).unwrap();
//!     println!(
//!         "best fitness {} after {} generations",
//!         solution.best_fitness, solution.iterations
//!     );
//! }
//! ```

mod distribution;
mod errors;
mod genome;
mod kmedoids;
mod operators;
mod populations;
mod selection;
mod speciation;

pub use distribution::*;
pub use errors::*;
pub use genome::*;
pub use kmedoids::*;
pub use operators::*;
pub use populations::*;
pub use selection::*;
pub use speciation::*;
