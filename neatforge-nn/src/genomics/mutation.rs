use super::{GeneticConfig, History, MutationError, NeatGenome, NeatMutationSettings};
use crate::networks::{ActivationFunction, Connection, NetworkError, NeuronType};
use crate::{Innovation, NeuronId};

use neatforge::{MutationSettings, ValueRange, WeightedDistribution};
use rand::Rng;
use serde::{Deserialize, Serialize};

use std::fmt;

/// The kinds of mutation a genome can undergo.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeatMutation {
    AddNode,
    RemoveNode,
    AddConnection,
    RemoveConnection,
    Weight,
}

impl fmt::Display for NeatMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AddNode => "node addition",
            Self::RemoveNode => "node removal",
            Self::AddConnection => "connection addition",
            Self::RemoveConnection => "connection removal",
            Self::Weight => "weight",
        };
        write!(f, "{}", name)
    }
}

impl NeatGenome {
    /// Applies a single mutation to the genome, and returns
    /// its type.
    ///
    /// The mutation type is drawn with probability proportional
    /// to its weight in `settings`. If it cannot be applied
    /// (e.g. node removal on a genome without hidden neurons),
    /// another type is drawn among the remaining ones.
    ///
    /// # Errors
    /// Returns [`MutationError::Exhausted`] if no mutation type
    /// applies to the genome, and [`MutationError::Network`]
    /// if the network rejected a change.
    pub fn mutate<R: Rng + ?Sized>(
        &mut self,
        settings: &NeatMutationSettings,
        config: &GeneticConfig,
        history: &mut History,
        generation: usize,
        rng: &mut R,
    ) -> Result<NeatMutation, MutationError> {
        let mut distribution = WeightedDistribution::new(
            settings
                .weights()
                .into_iter()
                .filter(|(_, weight)| *weight > 0.0),
        )
        .map_err(|_| MutationError::Exhausted)?;

        loop {
            let mutation = *distribution.sample(rng, false);
            let result = match mutation {
                NeatMutation::AddNode => self
                    .mutate_add_node(config.hidden_activation, history, rng)
                    .map(|_| ()),
                NeatMutation::RemoveNode => self.mutate_remove_node(history, rng).map(|_| ()),
                NeatMutation::AddConnection => self
                    .mutate_add_connection(&settings.mutation.value_range, history, rng)
                    .map(|_| ()),
                NeatMutation::RemoveConnection => self.mutate_remove_connection(rng).map(|_| ()),
                NeatMutation::Weight => self
                    .mutate_weight(&settings.mutation, generation, rng)
                    .map(|_| ()),
            };
            match result {
                Ok(()) => return Ok(mutation),
                Err(MutationError::Network(e)) => return Err(MutationError::Network(e)),
                Err(e) => {
                    log::trace!("genome {}: {} mutation failed: {}", self.id, mutation, e);
                    distribution = distribution
                        .remove_outcome(&mutation)
                        .map_err(|_| MutationError::Exhausted)?;
                }
            }
        }
    }

    /// Splits a random enabled connection in two, inserting
    /// a new hidden neuron in between. Both new connections
    /// keep the split connection's weight, and the split
    /// connection is disabled.
    ///
    /// Returns the id of the new neuron.
    ///
    /// # Examples
    /// ```
    /// use neatforge::{GenomeId, ValueRange};
    /// use neatforge_nn::genomics::{GeneticConfig, History, NeatGenome};
    /// use neatforge_nn::networks::ActivationFunction;
    ///
    /// let config = GeneticConfig::default();
    /// let mut history = History::new(&config);
    /// let mut rng = rand::thread_rng();
    /// let mut genome = NeatGenome::new(GenomeId(0), &config, &ValueRange::new(-1.0, 1.0).unwrap(), &mut rng);
    ///
    /// let neuron = genome
    ///     .mutate_add_node(ActivationFunction::sigmoid(), &mut history, &mut rng)
    ///     .unwrap();
    /// assert_eq!(neuron, 3);
    /// assert_eq!(genome.network().connection_count(), 4);
    /// assert_eq!(genome.network().connections().filter(|c| c.enabled()).count(), 3);
    /// ```
    pub fn mutate_add_node<R: Rng + ?Sized>(
        &mut self,
        activation: ActivationFunction,
        history: &mut History,
        rng: &mut R,
    ) -> Result<NeuronId, MutationError> {
        let candidates: Vec<Connection> = self
            .network
            .connections()
            .filter(|c| c.enabled())
            .copied()
            .collect();
        if candidates.is_empty() {
            return Err(MutationError::NoEnabledConnection);
        }
        let split = candidates[rng.gen_range(0..candidates.len())];

        let mut neuron = history.split_neuron(split.innovation());
        if self.network.neuron(neuron).is_some() {
            neuron = history.new_neuron_id();
        }
        self.network
            .add_neuron(neuron, NeuronType::Hidden, activation)?;

        let incoming = history.connection_innovation(split.source(), neuron);
        self.network.add_connection(Connection::new(
            incoming,
            split.source(),
            neuron,
            split.weight(),
        ))?;
        let outgoing = history.connection_innovation(neuron, split.target());
        self.network.add_connection(Connection::new(
            outgoing,
            neuron,
            split.target(),
            split.weight(),
        ))?;

        self.network
            .connection_mut(split.innovation())
            .ok_or(NetworkError::MissingConnection(split.innovation()))?
            .set_enabled(false);
        Ok(neuron)
    }

    /// Removes a random hidden neuron with no inputs or outputs,
    /// or exactly one input or output, not counting recurrent
    /// connections onto itself. Each former input is connected
    /// to each former output, with the mean of both weights,
    /// unless the pair is already connected.
    ///
    /// Returns the id of the removed neuron.
    pub fn mutate_remove_node<R: Rng + ?Sized>(
        &mut self,
        history: &mut History,
        rng: &mut R,
    ) -> Result<NeuronId, MutationError> {
        let candidates: Vec<(NeuronId, Vec<Connection>, Vec<Connection>)> = self
            .network
            .hidden_ids()
            .map(|id| {
                let (incoming, outgoing) = self.neighbouring_connections(id);
                (id, incoming, outgoing)
            })
            .filter(|(_, incoming, outgoing)| incoming.len() <= 1 || outgoing.len() <= 1)
            .collect();
        if candidates.is_empty() {
            return Err(MutationError::NoRemovableNeuron);
        }
        let (neuron, incoming, outgoing) = &candidates[rng.gen_range(0..candidates.len())];

        self.network.remove_neuron(*neuron)?;
        for input in incoming {
            for output in outgoing {
                let (source, target) = (input.source(), output.target());
                if self.network.connection_between(source, target).is_some() {
                    continue;
                }
                let mut bridge = Connection::new(
                    history.connection_innovation(source, target),
                    source,
                    target,
                    (input.weight() + output.weight()) / 2.0,
                );
                bridge.set_enabled(input.enabled() && output.enabled());
                self.network.add_connection(bridge)?;
            }
        }
        Ok(*neuron)
    }

    /// Connects a random pair of unconnected neurons, with a
    /// weight drawn from `weight_range`. Connections may
    /// start anywhere, but only end at hidden or output neurons.
    ///
    /// Returns the new connection's innovation number.
    pub fn mutate_add_connection<R: Rng + ?Sized>(
        &mut self,
        weight_range: &ValueRange,
        history: &mut History,
        rng: &mut R,
    ) -> Result<Innovation, MutationError> {
        let candidates: Vec<(NeuronId, NeuronId)> = self
            .network
            .neurons()
            .flat_map(|source| {
                self.network
                    .neurons()
                    .filter(|target| target.kind().is_computed())
                    .map(move |target| (source.id(), target.id()))
            })
            .filter(|(source, target)| self.network.connection_between(*source, *target).is_none())
            .collect();
        if candidates.is_empty() {
            return Err(MutationError::FullyConnected);
        }
        let (source, target) = candidates[rng.gen_range(0..candidates.len())];

        let innovation = history.connection_innovation(source, target);
        self.network.add_connection(Connection::new(
            innovation,
            source,
            target,
            weight_range.sample(rng),
        ))?;
        Ok(innovation)
    }

    /// Removes a random enabled connection. Hidden endpoints
    /// left without inputs or outputs are removed as well.
    ///
    /// Returns the removed connection.
    pub fn mutate_remove_connection<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<Connection, MutationError> {
        let candidates: Vec<Innovation> = self
            .network
            .connections()
            .filter(|c| c.enabled())
            .map(|c| c.innovation())
            .collect();
        if candidates.is_empty() {
            return Err(MutationError::NoEnabledConnection);
        }
        let removed = self
            .network
            .remove_connection(candidates[rng.gen_range(0..candidates.len())])?;

        let mut endpoints = vec![removed.source(), removed.target()];
        endpoints.dedup();
        for id in endpoints {
            let is_hidden = self
                .network
                .neuron(id)
                .map_or(false, |n| n.kind() == NeuronType::Hidden);
            if is_hidden {
                let (incoming, outgoing) = self.neighbouring_connections(id);
                if incoming.is_empty() || outgoing.is_empty() {
                    self.network.remove_neuron(id)?;
                }
            }
        }
        Ok(removed)
    }

    /// Perturbs the weight of a random connection, enabled or not.
    ///
    /// Returns the mutated connection's innovation number.
    pub fn mutate_weight<R: Rng + ?Sized>(
        &mut self,
        settings: &MutationSettings,
        generation: usize,
        rng: &mut R,
    ) -> Result<Innovation, MutationError> {
        let count = self.network.connection_count();
        if count == 0 {
            return Err(MutationError::NoConnection);
        }
        let innovation = self
            .network
            .connections()
            .nth(rng.gen_range(0..count))
            .map(|c| c.innovation())
            .ok_or(MutationError::NoConnection)?;
        let connection = self
            .network
            .connection_mut(innovation)
            .ok_or(NetworkError::MissingConnection(innovation))?;
        let weight = settings.mutate(connection.weight(), generation, rng);
        connection.set_weight(weight);
        Ok(innovation)
    }

    /// The connections into and out of `id`, in innovation
    /// order, leaving out those from `id` to itself.
    fn neighbouring_connections(&self, id: NeuronId) -> (Vec<Connection>, Vec<Connection>) {
        let mut incoming = vec![];
        let mut outgoing = vec![];
        for connection in self.network.connections() {
            match connection.endpoints() {
                (source, target) if source == id && target == id => {}
                (_, target) if target == id => incoming.push(*connection),
                (source, _) if source == id => outgoing.push(*connection),
                _ => {}
            }
        }
        (incoming, outgoing)
    }
}
