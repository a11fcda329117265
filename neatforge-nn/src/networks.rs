//! Networks are the phenotypes of genomes: neurons
//! joined by weighted, directed connections. Any
//! topology is allowed, including cycles and
//! self-connections, with the exception of connections
//! into bias or input neurons.
//!
//! A [`Network`] is evaluated by iterative relaxation
//! through [`Network::activate`], which can pipeline
//! several input sets through recurrent structures.
//!
//! For a more instantaneous input-result use-case, the
//! [`FunctionApproximator`] type is more appropiate.
mod activation;
mod errors;
mod function_approximator;
mod network;
mod neuron;

pub use activation::{ActivationFunction, ActivationType};
pub use errors::NetworkError;
pub use function_approximator::FunctionApproximator;
pub use network::{ActivationReport, Network};
pub use neuron::{Connection, Neuron, NeuronType};
