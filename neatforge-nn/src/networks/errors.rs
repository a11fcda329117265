use super::NeuronType;
use crate::{Innovation, NeuronId};

use std::error::Error;
use std::fmt;

/// An error type indicating an invalid change to,
/// or use of, a [`Network`].
///
/// [`Network`]: crate::networks::Network
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkError {
    /// A neuron with the same id already exists.
    DuplicateNeuron(NeuronId),
    /// The network already has a bias neuron.
    DuplicateBias(NeuronId),
    /// A connection with the same innovation number already exists.
    DuplicateInnovation(Innovation),
    /// A different connection already joins the same endpoints.
    DuplicateEndpoints {
        innovation: Innovation,
        existing: Innovation,
        source: NeuronId,
        target: NeuronId,
    },
    /// The neuron does not exist.
    MissingNeuron(NeuronId),
    /// The connection does not exist.
    MissingConnection(Innovation),
    /// A connection into a bias or input neuron.
    InvalidTarget {
        innovation: Innovation,
        target: NeuronId,
        kind: NeuronType,
    },
    /// Only hidden neurons can be removed.
    NotHidden(NeuronId),
    /// Activation was requested without any input set.
    NoInputSets,
    /// An input set does not match the number of input neurons.
    InputWidth { expected: usize, found: usize },
    /// Activation was requested with a step budget of 0.
    ZeroSteps,
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateNeuron(id) => write!(f, "duplicate neuron insertion with id {}", id),
            Self::DuplicateBias(id) => write!(
                f,
                "bias neuron insertion with id {} in a network that already has one",
                id
            ),
            Self::DuplicateInnovation(innovation) => write!(
                f,
                "duplicate connection insertion with innovation {}",
                innovation
            ),
            Self::DuplicateEndpoints {
                innovation,
                existing,
                source,
                target,
            } => write!(
                f,
                "connection insertion with endpoints {} -> {} and innovation {} shadows connection {}",
                source, target, innovation, existing
            ),
            Self::MissingNeuron(id) => write!(f, "nonexistant neuron with id {}", id),
            Self::MissingConnection(innovation) => {
                write!(f, "nonexistant connection with innovation {}", innovation)
            }
            Self::InvalidTarget {
                innovation,
                target,
                kind,
            } => write!(
                f,
                "connection insertion with innovation {} into {:?} neuron {}",
                innovation, kind, target
            ),
            Self::NotHidden(id) => write!(f, "removal of non-hidden neuron {}", id),
            Self::NoInputSets => write!(f, "activation without input sets"),
            Self::InputWidth { expected, found } => write!(
                f,
                "input set of width {} for network with {} inputs",
                found, expected
            ),
            Self::ZeroSteps => write!(f, "activation with a step budget of 0"),
        }
    }
}

impl Error for NetworkError {}
