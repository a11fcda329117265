use super::{ActivationFunction, Connection, NetworkError, Neuron, NeuronType};
use crate::{Innovation, NeuronId};

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Two outputs closer than this are considered equal
/// when checking whether an activation has settled.
const SETTLING_TOLERANCE: f64 = 1e-6;

/// An arbitrarily-structured neural network.
///
/// Neurons and connections are kept ordered by id and
/// innovation number respectively, which makes activation
/// deterministic. Endpoint pairs and each neuron's
/// incoming and outgoing connections are indexed
/// and kept up to date on every change.
///
/// Suports Serde for convenient network saving and loading.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(try_from = "NetworkRecord", into = "NetworkRecord")]
pub struct Network {
    neurons: BTreeMap<NeuronId, Neuron>,
    connections: BTreeMap<Innovation, Connection>,
    endpoints: HashMap<(NeuronId, NeuronId), Innovation, RandomState>,
    bias: Option<NeuronId>,
    inputs: Vec<NeuronId>,
    outputs: Vec<NeuronId>,
}

/// The result of [`Network::activate`].
#[derive(Clone, Debug, PartialEq)]
pub struct ActivationReport {
    /// Final output neuron values, in output id order.
    pub outputs: Vec<f64>,
    /// Number of iterations in which at least
    /// one neuron's output changed.
    pub steps: usize,
    /// Whether the network settled before
    /// the step budget ran out.
    pub converged: bool,
}

impl Network {
    /// Returns an empty network.
    pub fn new() -> Network {
        Network::default()
    }

    /// Adds a new neuron to the network.
    /// Returns a reference to the new neuron.
    ///
    /// # Errors
    /// This function returns an error if a neuron with the
    /// same id already exists, or if a second bias neuron
    /// is added.
    ///
    /// # Examples
    /// ```
    /// use neatforge_nn::networks::{ActivationFunction, Network, NeuronType};
    ///
    /// let mut network = Network::new();
    /// network.add_neuron(0, NeuronType::Bias, ActivationFunction::identity()).unwrap();
    /// network.add_neuron(1, NeuronType::Input, ActivationFunction::identity()).unwrap();
    /// network.add_neuron(2, NeuronType::Output, ActivationFunction::sigmoid()).unwrap();
    ///
    /// assert!(network.add_neuron(2, NeuronType::Hidden, ActivationFunction::sigmoid()).is_err());
    /// assert!(network.add_neuron(3, NeuronType::Bias, ActivationFunction::identity()).is_err());
    /// assert_eq!(network.output_ids(), &[2]);
    /// ```
    pub fn add_neuron(
        &mut self,
        id: NeuronId,
        kind: NeuronType,
        activation: ActivationFunction,
    ) -> Result<&Neuron, NetworkError> {
        if self.neurons.contains_key(&id) {
            return Err(NetworkError::DuplicateNeuron(id));
        }
        match kind {
            NeuronType::Bias => {
                if self.bias.is_some() {
                    return Err(NetworkError::DuplicateBias(id));
                }
                self.bias = Some(id);
            }
            NeuronType::Input => insert_sorted(&mut self.inputs, id),
            NeuronType::Output => insert_sorted(&mut self.outputs, id),
            NeuronType::Hidden => {}
        }
        Ok(self
            .neurons
            .entry(id)
            .or_insert_with(|| Neuron::new(id, kind, activation)))
    }

    /// Adds a connection to the network.
    /// Returns a reference to the new connection.
    ///
    /// # Errors
    /// This function returns an error if the innovation number
    /// is already present, if either endpoint is missing, if
    /// the target is a bias or input neuron, or if another
    /// connection already joins the same endpoints.
    ///
    /// # Examples
    /// ```
    /// use neatforge_nn::networks::{ActivationFunction, Connection, Network, NeuronType};
    ///
    /// let mut network = Network::new();
    /// network.add_neuron(1, NeuronType::Input, ActivationFunction::identity()).unwrap();
    /// network.add_neuron(2, NeuronType::Output, ActivationFunction::sigmoid()).unwrap();
    ///
    /// network.add_connection(Connection::new(0, 1, 2, 0.5)).unwrap();
    /// // Recurrent connection.
    /// network.add_connection(Connection::new(1, 2, 2, -1.0)).unwrap();
    ///
    /// // Connections into inputs are not allowed.
    /// assert!(network.add_connection(Connection::new(2, 2, 1, 1.0)).is_err());
    /// // Neither are parallel connections.
    /// assert!(network.add_connection(Connection::new(3, 1, 2, 1.0)).is_err());
    /// ```
    pub fn add_connection(&mut self, connection: Connection) -> Result<&Connection, NetworkError> {
        let innovation = connection.innovation();
        let (source, target) = connection.endpoints();
        if self.connections.contains_key(&innovation) {
            return Err(NetworkError::DuplicateInnovation(innovation));
        }
        let kind = match (self.neurons.get(&source), self.neurons.get(&target)) {
            (None, _) => return Err(NetworkError::MissingNeuron(source)),
            (_, None) => return Err(NetworkError::MissingNeuron(target)),
            (Some(_), Some(target)) => target.kind(),
        };
        if !kind.is_computed() {
            return Err(NetworkError::InvalidTarget {
                innovation,
                target,
                kind,
            });
        }
        if let Some(existing) = self.endpoints.get(&(source, target)) {
            return Err(NetworkError::DuplicateEndpoints {
                innovation,
                existing: *existing,
                source,
                target,
            });
        }

        if let Some(neuron) = self.neurons.get_mut(&source) {
            neuron.link_outgoing(innovation);
        }
        if let Some(neuron) = self.neurons.get_mut(&target) {
            neuron.link_incoming(innovation);
        }
        self.endpoints.insert((source, target), innovation);
        Ok(self.connections.entry(innovation).or_insert(connection))
    }

    /// Removes and returns the connection with
    /// the specified innovation number.
    ///
    /// # Errors
    /// Returns an error if there is no such connection.
    pub fn remove_connection(&mut self, innovation: Innovation) -> Result<Connection, NetworkError> {
        let connection = self
            .connections
            .remove(&innovation)
            .ok_or(NetworkError::MissingConnection(innovation))?;
        self.endpoints.remove(&connection.endpoints());
        for id in [connection.source(), connection.target()] {
            if let Some(neuron) = self.neurons.get_mut(&id) {
                neuron.unlink(innovation);
            }
        }
        Ok(connection)
    }

    /// Removes a hidden neuron and all its incident
    /// connections, which are returned in innovation order.
    ///
    /// # Errors
    /// Returns an error if the neuron does not exist
    /// or is not a hidden neuron.
    ///
    /// # Examples
    /// ```
    /// use neatforge_nn::networks::{ActivationFunction, Connection, Network, NeuronType};
    ///
    /// let mut network = Network::new();
    /// network.add_neuron(1, NeuronType::Input, ActivationFunction::identity()).unwrap();
    /// network.add_neuron(2, NeuronType::Output, ActivationFunction::sigmoid()).unwrap();
    /// network.add_neuron(3, NeuronType::Hidden, ActivationFunction::sigmoid()).unwrap();
    /// network.add_connection(Connection::new(4, 1, 3, 1.0)).unwrap();
    /// network.add_connection(Connection::new(5, 3, 2, 1.0)).unwrap();
    ///
    /// let (neuron, connections) = network.remove_neuron(3).unwrap();
    /// assert_eq!(neuron.id(), 3);
    /// assert_eq!(connections.len(), 2);
    /// assert_eq!(network.connection_count(), 0);
    ///
    /// assert!(network.remove_neuron(2).is_err());
    /// ```
    pub fn remove_neuron(&mut self, id: NeuronId) -> Result<(Neuron, Vec<Connection>), NetworkError> {
        let neuron = self.neurons.get(&id).ok_or(NetworkError::MissingNeuron(id))?;
        if neuron.kind() != NeuronType::Hidden {
            return Err(NetworkError::NotHidden(id));
        }
        let mut incident: Vec<Innovation> =
            neuron.incoming().chain(neuron.outgoing()).copied().collect();
        incident.sort_unstable();
        // Self-connections are both incoming and outgoing.
        incident.dedup();

        let connections = incident
            .into_iter()
            .map(|innovation| self.remove_connection(innovation))
            .collect::<Result<Vec<_>, _>>()?;
        let neuron = self
            .neurons
            .remove(&id)
            .ok_or(NetworkError::MissingNeuron(id))?;
        Ok((neuron, connections))
    }

    pub fn neuron(&self, id: NeuronId) -> Option<&Neuron> {
        self.neurons.get(&id)
    }

    /// Returns an iterator over all neurons, in id order.
    pub fn neurons(&self) -> impl Iterator<Item = &Neuron> {
        self.neurons.values()
    }

    pub fn connection(&self, innovation: Innovation) -> Option<&Connection> {
        self.connections.get(&innovation)
    }

    /// Returns a mutable reference to a connection.
    /// Only its weight and enabled flag can be changed.
    pub fn connection_mut(&mut self, innovation: Innovation) -> Option<&mut Connection> {
        self.connections.get_mut(&innovation)
    }

    /// Returns an iterator over all connections,
    /// in innovation number order.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Returns the connection from `source` to `target`, if any.
    pub fn connection_between(&self, source: NeuronId, target: NeuronId) -> Option<&Connection> {
        self.endpoints
            .get(&(source, target))
            .and_then(|innovation| self.connections.get(innovation))
    }

    pub fn neuron_count(&self) -> usize {
        self.neurons.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// The highest innovation number in the network.
    pub fn max_innovation(&self) -> Option<Innovation> {
        self.connections.keys().next_back().copied()
    }

    pub fn bias_id(&self) -> Option<NeuronId> {
        self.bias
    }

    /// Input neuron ids, in ascending order.
    pub fn input_ids(&self) -> &[NeuronId] {
        &self.inputs
    }

    /// Output neuron ids, in ascending order.
    pub fn output_ids(&self) -> &[NeuronId] {
        &self.outputs
    }

    /// Returns an iterator over hidden neuron ids, in ascending order.
    pub fn hidden_ids(&self) -> impl Iterator<Item = NeuronId> + '_ {
        self.neurons
            .values()
            .filter(|n| n.kind() == NeuronType::Hidden)
            .map(|n| n.id())
    }

    /// Activates the network by iterative relaxation.
    ///
    /// The bias neuron outputs `bias` throughout. Input set
    /// `i` is loaded into the input neurons at iteration `i`
    /// (NaN inputs count as 0), so several sets can be pipelined
    /// through recurrent structures. Each iteration propagates
    /// every enabled connection, and then recomputes all hidden
    /// and output neurons at once.
    ///
    /// Activation stops once all input sets have been loaded
    /// and an iteration leaves every neuron unchanged, or after
    /// `max_steps + input_sets.len() - 1` iterations. Running out
    /// of iterations is not an error: the report is marked as
    /// not converged.
    ///
    /// # Errors
    /// Returns an error if there are no input sets, if an input
    /// set does not have one value per input neuron, or if
    /// `max_steps` is 0.
    ///
    /// # Examples
    /// ```
    /// use neatforge_nn::networks::{ActivationFunction, ActivationType, Connection, Network, NeuronType};
    ///
    /// let mut network = Network::new();
    /// let relu = ActivationFunction::new(ActivationType::ReLU, 1.0);
    /// network.add_neuron(1, NeuronType::Input, ActivationFunction::identity()).unwrap();
    /// network.add_neuron(2, NeuronType::Input, ActivationFunction::identity()).unwrap();
    /// network.add_neuron(3, NeuronType::Output, relu).unwrap();
    /// network.add_connection(Connection::new(0, 1, 3, 2.5)).unwrap();
    /// network.add_connection(Connection::new(1, 2, 3, -2.5)).unwrap();
    ///
    /// let report = network.activate(&[[1.0, 0.5]], 1.0, 10, true).unwrap();
    /// assert_eq!(report.outputs, vec![1.25]);
    /// assert_eq!(report.steps, 1);
    /// assert!(report.converged);
    /// ```
    pub fn activate<S: AsRef<[f64]>>(
        &mut self,
        input_sets: &[S],
        bias: f64,
        max_steps: usize,
        reset: bool,
    ) -> Result<ActivationReport, NetworkError> {
        if input_sets.is_empty() {
            return Err(NetworkError::NoInputSets);
        }
        if max_steps == 0 {
            return Err(NetworkError::ZeroSteps);
        }
        if let Some(set) = input_sets
            .iter()
            .find(|set| set.as_ref().len() != self.inputs.len())
        {
            return Err(NetworkError::InputWidth {
                expected: self.inputs.len(),
                found: set.as_ref().len(),
            });
        }

        if reset {
            self.reset_state();
        }
        if let Some(neuron) = self.bias.and_then(|id| self.neurons.get_mut(&id)) {
            neuron.post_synapse = bias;
        }

        let iterations = max_steps + input_sets.len() - 1;
        let mut steps = 0;
        let mut converged = false;
        for iteration in 0..iterations {
            if let Some(set) = input_sets.get(iteration) {
                self.load_inputs(set.as_ref());
            }
            self.fire_neurons();
            if self.compute_activations() {
                steps += 1;
            } else if iteration + 1 >= input_sets.len() {
                converged = true;
                break;
            }
        }
        if !converged {
            log::debug!(
                "network activation did not settle within {} iterations",
                iterations
            );
        }

        Ok(ActivationReport {
            outputs: self.outputs(),
            steps,
            converged,
        })
    }

    fn load_inputs(&mut self, values: &[f64]) {
        for (id, value) in self.inputs.iter().zip(values) {
            if let Some(neuron) = self.neurons.get_mut(id) {
                neuron.post_synapse = if value.is_nan() { 0.0 } else { *value };
            }
        }
    }

    /// Propagates each neuron's output through all
    /// its active outgoing connections.
    fn fire_neurons(&mut self) {
        for connection in self.connections.values().filter(|c| c.is_active()) {
            let signal = match self.neurons.get(&connection.source()) {
                Some(source) => source.post_synapse * connection.weight(),
                None => continue,
            };
            if let Some(target) = self.neurons.get_mut(&connection.target()) {
                target.pre_synapse += signal;
            }
        }
    }

    /// Computes the output of every hidden and output
    /// neuron from its input sum. Returns whether any
    /// output changed.
    fn compute_activations(&mut self) -> bool {
        let mut changed = false;
        for neuron in self.neurons.values_mut().filter(|n| n.kind().is_computed()) {
            let post_synapse = neuron.activation().apply(neuron.pre_synapse);
            neuron.pre_synapse = 0.0;
            if !settled(post_synapse, neuron.post_synapse) {
                changed = true;
            }
            neuron.post_synapse = post_synapse;
        }
        changed
    }

    /// Clears the activation state of all neurons.
    pub fn reset_state(&mut self) {
        for neuron in self.neurons.values_mut() {
            neuron.pre_synapse = 0.0;
            neuron.post_synapse = 0.0;
        }
    }

    /// Returns the current output neuron values,
    /// in output id order.
    pub fn outputs(&self) -> Vec<f64> {
        self.outputs
            .iter()
            .filter_map(|id| self.neurons.get(id))
            .map(|n| n.post_synapse)
            .collect()
    }
}

fn settled(current: f64, previous: f64) -> bool {
    current == previous || (current - previous).abs() <= SETTLING_TOLERANCE
}

fn insert_sorted(ids: &mut Vec<NeuronId>, id: NeuronId) {
    if let Err(position) = ids.binary_search(&id) {
        ids.insert(position, id);
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Network {{")?;
        for neuron in self.neurons.values() {
            writeln!(f, "\t{}", neuron)?;
        }
        for connection in self.connections.values() {
            writeln!(f, "\t{}", connection)?;
        }
        write!(f, "}}")
    }
}

/// Serialized form of a [`Network`]. Indices are
/// rebuilt, and validated, on deserialization.
#[derive(Serialize, Deserialize)]
struct NetworkRecord {
    neurons: Vec<Neuron>,
    connections: Vec<Connection>,
}

impl From<Network> for NetworkRecord {
    fn from(network: Network) -> Self {
        NetworkRecord {
            neurons: network.neurons.into_values().collect(),
            connections: network.connections.into_values().collect(),
        }
    }
}

impl TryFrom<NetworkRecord> for Network {
    type Error = NetworkError;

    fn try_from(record: NetworkRecord) -> Result<Self, Self::Error> {
        let mut network = Network::new();
        for neuron in &record.neurons {
            network.add_neuron(neuron.id(), neuron.kind(), neuron.activation())?;
        }
        for connection in record.connections {
            network.add_connection(connection)?;
        }
        Ok(network)
    }
}
