use super::ActivationFunction;
use crate::{Innovation, NeuronId};

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use std::collections::HashSet;
use std::fmt;

/// A NeuronType indicates the function
/// of a neuron within its network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeuronType {
    /// The constant-output neuron. At most one per network.
    Bias,
    /// Input neurons.
    Input,
    /// Hidden neurons.
    Hidden,
    /// Output neurons.
    Output,
}

impl NeuronType {
    /// Whether the neuron's output is computed
    /// from its inputs, as opposed to being set
    /// from outside the network.
    pub fn is_computed(self) -> bool {
        matches!(self, NeuronType::Hidden | NeuronType::Output)
    }
}

/// Neurons are the structural elements of networks
/// between which connections are created.
///
/// Only the neuron's identity, type and activation
/// function are serialized; its connection sets and
/// activation state are rebuilt by its network.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Neuron {
    id: NeuronId,
    kind: NeuronType,
    activation: ActivationFunction,
    #[serde(skip)]
    incoming: HashSet<Innovation, RandomState>,
    #[serde(skip)]
    outgoing: HashSet<Innovation, RandomState>,
    #[serde(skip)]
    pub(super) pre_synapse: f64,
    #[serde(skip)]
    pub(super) post_synapse: f64,
}

impl Neuron {
    pub(super) fn new(id: NeuronId, kind: NeuronType, activation: ActivationFunction) -> Neuron {
        Neuron {
            id,
            kind,
            activation,
            incoming: HashSet::default(),
            outgoing: HashSet::default(),
            pre_synapse: 0.0,
            post_synapse: 0.0,
        }
    }

    pub fn id(&self) -> NeuronId {
        self.id
    }

    pub fn kind(&self) -> NeuronType {
        self.kind
    }

    /// Only meaningful for hidden and output neurons.
    pub fn activation(&self) -> ActivationFunction {
        self.activation
    }

    /// Returns an iterator over the innovation numbers
    /// of the connections ending at this neuron.
    /// No ordering is guaranteed.
    pub fn incoming(&self) -> impl Iterator<Item = &Innovation> {
        self.incoming.iter()
    }

    /// Returns an iterator over the innovation numbers
    /// of the connections starting at this neuron.
    /// No ordering is guaranteed.
    pub fn outgoing(&self) -> impl Iterator<Item = &Innovation> {
        self.outgoing.iter()
    }

    pub fn incoming_count(&self) -> usize {
        self.incoming.len()
    }

    pub fn outgoing_count(&self) -> usize {
        self.outgoing.len()
    }

    /// The neuron's current output.
    pub fn post_synapse(&self) -> f64 {
        self.post_synapse
    }

    pub(super) fn link_incoming(&mut self, innovation: Innovation) {
        self.incoming.insert(innovation);
    }

    pub(super) fn link_outgoing(&mut self, innovation: Innovation) {
        self.outgoing.insert(innovation);
    }

    pub(super) fn unlink(&mut self, innovation: Innovation) {
        self.incoming.remove(&innovation);
        self.outgoing.remove(&innovation);
    }
}

impl fmt::Display for Neuron {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{:?}, {:?}, IN: {:?}, OUT: {:?}]",
            self.id, self.kind, self.activation.kind, self.incoming, self.outgoing,
        )
    }
}

/// A weighted, directed connection between two neurons.
/// Its endpoints are fixed once created.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    innovation: Innovation,
    source: NeuronId,
    target: NeuronId,
    weight: f64,
    enabled: bool,
}

impl Connection {
    /// Returns a new _enabled_ connection with the specified parameters.
    ///
    /// # Examples
    /// ```
    /// use neatforge_nn::networks::Connection;
    ///
    /// let connection = Connection::new(42, 3, 9, 2.0);
    /// assert!(connection.enabled());
    /// assert_eq!(connection.endpoints(), (3, 9));
    /// ```
    pub fn new(innovation: Innovation, source: NeuronId, target: NeuronId, weight: f64) -> Connection {
        Connection {
            innovation,
            source,
            target,
            weight,
            enabled: true,
        }
    }

    pub fn innovation(&self) -> Innovation {
        self.innovation
    }

    pub fn source(&self) -> NeuronId {
        self.source
    }

    pub fn target(&self) -> NeuronId {
        self.target
    }

    /// Returns `(source, target)`.
    pub fn endpoints(&self) -> (NeuronId, NeuronId) {
        (self.source, self.target)
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    /// Disabled connections carry no signal, but are
    /// kept for alignment against other genomes.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether the connection carries any signal.
    pub(super) fn is_active(&self) -> bool {
        self.enabled && self.weight != 0.0
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{} -> {}, {}{}]",
            self.innovation,
            self.source,
            self.target,
            self.weight,
            if self.enabled { "" } else { ", disabled" }
        )
    }
}
