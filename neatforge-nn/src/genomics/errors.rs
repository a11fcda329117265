use crate::networks::NetworkError;

use std::error::Error;
use std::fmt;

/// An error type indicating a failure
/// to carry out a structural or weight mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationError {
    /// Node addition or connection removal on a
    /// genome without enabled connections.
    NoEnabledConnection,
    /// Weight mutation on a genome without connections.
    NoConnection,
    /// Node removal on a genome whose hidden neurons
    /// all have several inputs and several outputs.
    NoRemovableNeuron,
    /// Connection addition on a fully-connected genome.
    FullyConnected,
    /// Every mutation type with a positive weight failed.
    Exhausted,
    /// The genome's network rejected a change.
    Network(NetworkError),
}

/// An error type indicating a failure to cross two genomes.
#[derive(Debug, Clone, PartialEq)]
pub enum CrossoverError {
    /// The parents' `(input, output)` counts differ.
    IncompatibleParents {
        fitter: (usize, usize),
        other: (usize, usize),
    },
    /// The child's network rejected an inherited gene.
    Network(NetworkError),
}

/// An error type for NEAT genome reproduction.
#[derive(Debug, Clone, PartialEq)]
pub enum ReproductionError {
    Mutation(MutationError),
    Crossover(CrossoverError),
}

impl fmt::Display for MutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEnabledConnection => {
                write!(f, "mutation requires an enabled connection, but there are none")
            }
            Self::NoConnection => write!(f, "weight mutation on genome without connections"),
            Self::NoRemovableNeuron => write!(f, "no removable hidden neuron found"),
            Self::FullyConnected => write!(f, "connection mutation on fully-connected genome"),
            Self::Exhausted => write!(f, "every enabled mutation type failed"),
            Self::Network(e) => write!(f, "mutation produced an invalid network: {}", e),
        }
    }
}

impl fmt::Display for CrossoverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IncompatibleParents { fitter, other } => write!(
                f,
                "crossover between genomes with {} inputs and {} outputs, and {} inputs and {} outputs",
                fitter.0, fitter.1, other.0, other.1
            ),
            Self::Network(e) => write!(f, "crossover produced an invalid network: {}", e),
        }
    }
}

impl fmt::Display for ReproductionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mutation(e) => write!(f, "{}", e),
            Self::Crossover(e) => write!(f, "{}", e),
        }
    }
}

impl Error for MutationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Network(e) => Some(e),
            _ => None,
        }
    }
}

impl Error for CrossoverError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Network(e) => Some(e),
            _ => None,
        }
    }
}

impl Error for ReproductionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Mutation(e) => Some(e),
            Self::Crossover(e) => Some(e),
        }
    }
}

impl From<NetworkError> for MutationError {
    fn from(e: NetworkError) -> Self {
        MutationError::Network(e)
    }
}

impl From<NetworkError> for CrossoverError {
    fn from(e: NetworkError) -> Self {
        CrossoverError::Network(e)
    }
}

impl From<MutationError> for ReproductionError {
    fn from(e: MutationError) -> Self {
        ReproductionError::Mutation(e)
    }
}

impl From<CrossoverError> for ReproductionError {
    fn from(e: CrossoverError) -> Self {
        ReproductionError::Crossover(e)
    }
}
