use super::GeneticConfig;
use crate::{Innovation, NeuronId};

use ahash::RandomState;

use std::collections::HashMap;

/// A `History` keeps track of structural innovations in a
/// population, in order to make sure identical mutations
/// are assigned the same innovation numbers and neuron ids.
///
/// Connection innovations are identified by their endpoints,
/// and neuron innovations by the connection they split.
/// Both are only remembered until the next call to
/// [`begin_generation`], while the counters from which
/// new numbers are drawn keep advancing.
///
/// [`begin_generation`]: History::begin_generation
#[derive(Debug, Clone)]
pub struct History {
    input_count: usize,
    output_count: usize,
    next_innovation: Innovation,
    next_neuron_id: NeuronId,
    connections: HashMap<(NeuronId, NeuronId), Innovation, RandomState>,
    splits: HashMap<Innovation, NeuronId, RandomState>,
}

impl History {
    /// Creates a new History for genomes generated with `config`.
    ///
    /// Initial connections, between the bias or an input neuron `s`
    /// and the `o`-th output, have the innovation number
    /// `s ⨯ output_count + o`, so new innovation numbers start
    /// at `(input_count + 1) ⨯ output_count`. Likewise, new
    /// neurons are numbered after the bias, inputs and outputs.
    ///
    /// # Examples
    /// ```
    /// use neatforge_nn::genomics::{GeneticConfig, History};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(2).unwrap(),
    ///     ..GeneticConfig::default()
    /// };
    /// let mut history = History::new(&config);
    /// assert_eq!(history.next_innovation(), 3);
    /// assert_eq!(history.next_neuron_id(), 4);
    ///
    /// // Initial connections keep their numbers.
    /// assert_eq!(history.connection_innovation(2, 3), 2);
    /// // New ones are numbered in order of appearance.
    /// assert_eq!(history.connection_innovation(3, 3), 3);
    /// assert_eq!(history.connection_innovation(1, 3), 1);
    /// assert_eq!(history.connection_innovation(3, 3), 3);
    /// ```
    pub fn new(config: &GeneticConfig) -> History {
        let input_count = config.input_count.get();
        let output_count = config.output_count.get();
        History {
            input_count,
            output_count,
            next_innovation: (input_count + 1) * output_count,
            next_neuron_id: 1 + input_count + output_count,
            connections: HashMap::default(),
            splits: HashMap::default(),
        }
    }

    /// Returns the innovation number of the connection
    /// `source -> target`, registering it if it is new
    /// to the current generation.
    pub fn connection_innovation(&mut self, source: NeuronId, target: NeuronId) -> Innovation {
        if let Some(innovation) = self.initial_innovation(source, target) {
            return innovation;
        }
        let next = &mut self.next_innovation;
        *self.connections.entry((source, target)).or_insert_with(|| {
            *next += 1;
            *next - 1
        })
    }

    /// Returns the id of the neuron inserted by splitting
    /// the connection `split`, registering it if it is
    /// new to the current generation.
    pub fn split_neuron(&mut self, split: Innovation) -> NeuronId {
        let next = &mut self.next_neuron_id;
        *self.splits.entry(split).or_insert_with(|| {
            *next += 1;
            *next - 1
        })
    }

    /// Returns a neuron id never handed out before.
    ///
    /// Used when a genome splits a connection for the second
    /// time in a generation, and already owns the neuron
    /// registered for that split.
    pub fn new_neuron_id(&mut self) -> NeuronId {
        self.next_neuron_id += 1;
        self.next_neuron_id - 1
    }

    /// Forgets the current generation's innovations.
    /// Counters are not reset, so numbers handed out
    /// later never clash with earlier ones.
    pub fn begin_generation(&mut self) {
        self.connections.clear();
        self.splits.clear();
    }

    pub fn next_innovation(&self) -> Innovation {
        self.next_innovation
    }

    pub fn next_neuron_id(&self) -> NeuronId {
        self.next_neuron_id
    }

    /// Returns an iterator over the connection innovations
    /// of the current generation, as `((source, target), innovation)`.
    /// No ordering is guaranteed.
    pub fn connection_innovations(
        &self,
    ) -> impl Iterator<Item = ((NeuronId, NeuronId), Innovation)> + '_ {
        self.connections.iter().map(|(k, v)| (*k, *v))
    }

    fn initial_innovation(&self, source: NeuronId, target: NeuronId) -> Option<Innovation> {
        let outputs = self.input_count + 1..=self.input_count + self.output_count;
        if source <= self.input_count && outputs.contains(&target) {
            Some(source * self.output_count + target - self.input_count - 1)
        } else {
            None
        }
    }
}
