use super::{Network, NetworkError};
use crate::NeuronId;

use ahash::RandomState;

use std::collections::{BTreeMap, HashSet};

/// Maximum number of neurons visited while measuring
/// a network's depth, before settling for an upper bound.
const SEARCH_LIMIT: usize = 100_000;

/// A neural network best suited for function
/// approximation: each evaluation starts from a
/// clean state and runs for as many steps as
/// the network is deep.
///
/// The depth of a network is the length of the longest
/// path from its bias or input neurons to an output neuron
/// that passes through no neuron twice. Networks too
/// intricate to measure use their number of hidden and
/// output neurons instead, which bounds any such path.
#[derive(Clone, Debug)]
pub struct FunctionApproximator {
    network: Network,
    depth: usize,
}

impl FunctionApproximator {
    /// Output of the bias neuron.
    pub const BIAS: f64 = 1.0;

    /// Generates a new approximator from a copy of `network`.
    ///
    /// # Examples
    /// ```
    /// use neatforge::{GenomeId, ValueRange};
    /// use neatforge_nn::genomics::{GeneticConfig, NeatGenome};
    /// use neatforge_nn::networks::FunctionApproximator;
    ///
    /// let genome = NeatGenome::new(
    ///     GenomeId(0),
    ///     &GeneticConfig::default(),
    ///     &ValueRange::new(-1.0, 1.0).unwrap(),
    ///     &mut rand::thread_rng(),
    /// );
    /// let approximator = FunctionApproximator::new(genome.network());
    /// assert_eq!(approximator.depth(), 1);
    /// ```
    pub fn new(network: &Network) -> FunctionApproximator {
        let mut adjacency: BTreeMap<NeuronId, Vec<NeuronId>> = BTreeMap::new();
        for connection in network.connections().filter(|c| c.enabled()) {
            adjacency
                .entry(connection.source())
                .or_default()
                .push(connection.target());
        }

        let mut expansions = 0;
        let depth = network
            .bias_id()
            .iter()
            .chain(network.input_ids())
            .map(|root| {
                let mut on_path: HashSet<NeuronId, RandomState> = HashSet::default();
                on_path.insert(*root);
                longest_path(
                    &adjacency,
                    network.output_ids(),
                    *root,
                    0,
                    &mut on_path,
                    &mut expansions,
                )
            })
            .try_fold(0, |deepest, depth| depth.map(|d| d.max(deepest)))
            .unwrap_or_else(|| network.hidden_ids().count() + network.output_ids().len());

        FunctionApproximator {
            network: network.clone(),
            depth,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the approximated function's value
    /// at the N-dimensional point given by `inputs`.
    ///
    /// # Errors
    /// Returns an error if `inputs` does not have one
    /// value per input neuron.
    ///
    /// # Examples
    /// ```
    /// use neatforge_nn::networks::{
    ///     ActivationFunction, Connection, FunctionApproximator, Network, NeuronType,
    /// };
    ///
    /// fn sigmoid(x: f64) -> f64 {
    ///     1.0 / (1.0 + (-4.9 * x).exp())
    /// }
    ///
    /// // Create a network with two chained sigmoid neurons.
    /// let mut network = Network::new();
    /// network.add_neuron(1, NeuronType::Input, ActivationFunction::identity()).unwrap();
    /// network.add_neuron(2, NeuronType::Output, ActivationFunction::sigmoid()).unwrap();
    /// network.add_neuron(3, NeuronType::Hidden, ActivationFunction::sigmoid()).unwrap();
    /// network.add_connection(Connection::new(0, 1, 3, 1.0)).unwrap();
    /// network.add_connection(Connection::new(1, 3, 2, 1.0)).unwrap();
    /// let mut approximator = FunctionApproximator::new(&network);
    ///
    /// // The result is identical to double application of a sigmoid function.
    /// for input in -20..=20 {
    ///     let input = input as f64 / 10.0;
    ///     let output = approximator.evaluate(&[input]).unwrap()[0];
    ///     assert!((output - sigmoid(sigmoid(input))).abs() < 1e-12);
    /// }
    /// ```
    pub fn evaluate(&mut self, inputs: &[f64]) -> Result<Vec<f64>, NetworkError> {
        self.network
            .activate(&[inputs], Self::BIAS, self.depth.max(1), true)
            .map(|report| report.outputs)
    }

    /// The approximator's own copy of the network.
    pub fn network(&self) -> &Network {
        &self.network
    }
}

/// Length of the longest path from `node` that ends at an
/// output and avoids the neurons in `on_path`, or `None`
/// once the search has gone on for too long.
fn longest_path(
    adjacency: &BTreeMap<NeuronId, Vec<NeuronId>>,
    outputs: &[NeuronId],
    node: NeuronId,
    length: usize,
    on_path: &mut HashSet<NeuronId, RandomState>,
    expansions: &mut usize,
) -> Option<usize> {
    *expansions += 1;
    if *expansions > SEARCH_LIMIT {
        return None;
    }
    let mut longest = if outputs.contains(&node) { length } else { 0 };
    for target in adjacency.get(&node).into_iter().flatten() {
        if on_path.insert(*target) {
            let depth = longest_path(adjacency, outputs, *target, length + 1, on_path, expansions);
            on_path.remove(target);
            longest = longest.max(depth?);
        }
    }
    Some(longest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::networks::{ActivationFunction, Connection, NeuronType};

    fn sigmoid(x: f64) -> f64 {
        1.0 / (1.0 + (-4.9 * x).exp())
    }

    /// Input 0, output 1, hidden 2, every computed
    /// neuron connected to every computed neuron.
    fn recurrent_network() -> Network {
        let mut network = Network::new();
        network
            .add_neuron(0, NeuronType::Input, ActivationFunction::identity())
            .unwrap();
        network
            .add_neuron(1, NeuronType::Output, ActivationFunction::sigmoid())
            .unwrap();
        network
            .add_neuron(2, NeuronType::Hidden, ActivationFunction::sigmoid())
            .unwrap();
        let endpoints = [(0, 1), (0, 2), (1, 1), (1, 2), (2, 1), (2, 2)];
        for (innovation, (source, target)) in endpoints.iter().enumerate() {
            network
                .add_connection(Connection::new(innovation, *source, *target, 0.0))
                .unwrap();
        }
        network
    }

    #[test]
    fn depth_ignores_revisits() {
        let approximator = FunctionApproximator::new(&recurrent_network());
        assert_eq!(approximator.depth(), 2);
    }

    #[test]
    fn depth_ignores_disabled_connections() {
        let mut network = recurrent_network();
        network.connection_mut(4).unwrap().set_enabled(false);
        assert_eq!(FunctionApproximator::new(&network).depth(), 1);
    }

    #[test]
    fn depth_of_disconnected_network() {
        let mut network = recurrent_network();
        for innovation in 0..6 {
            network.remove_connection(innovation).unwrap();
        }
        let mut approximator = FunctionApproximator::new(&network);
        assert_eq!(approximator.depth(), 0);
        // Evaluation still runs a single step.
        assert_eq!(approximator.evaluate(&[1.0]).unwrap(), vec![sigmoid(0.0)]);
    }

    #[test]
    fn dense_networks_fall_back_to_neuron_count() {
        let mut network = Network::new();
        network
            .add_neuron(0, NeuronType::Input, ActivationFunction::identity())
            .unwrap();
        network
            .add_neuron(1, NeuronType::Output, ActivationFunction::sigmoid())
            .unwrap();
        for hidden in 2..14 {
            network
                .add_neuron(hidden, NeuronType::Hidden, ActivationFunction::sigmoid())
                .unwrap();
        }
        let mut innovation = 0;
        for source in 0..14 {
            for target in 1..14 {
                network
                    .add_connection(Connection::new(innovation, source, target, 0.1))
                    .unwrap();
                innovation += 1;
            }
        }
        assert_eq!(FunctionApproximator::new(&network).depth(), 13);
    }

    #[test]
    fn evaluate_is_stateless() {
        let mut network = recurrent_network();
        network.connection_mut(0).unwrap().set_weight(1.0);
        network.connection_mut(2).unwrap().set_weight(-1.0);
        let mut approximator = FunctionApproximator::new(&network);
        let first = approximator.evaluate(&[0.5]).unwrap();
        assert_eq!(approximator.evaluate(&[0.5]).unwrap(), first);
        assert!(approximator.evaluate(&[0.5, 0.5]).is_err());
    }
}
