use super::{Alignment, CrossoverError, NeatCrossoverSettings, NeatGenome, Parent};
use crate::networks::{Network, NetworkError, NeuronType};
use crate::NeuronId;

use neatforge::GenomeId;
use rand::Rng;

impl NeatGenome {
    /// Crosses `fitter` with `other`, returning a child with the given id.
    ///
    /// Genes are aligned by innovation number. Matching genes have
    /// their weights combined with probability `crossover_probability`,
    /// and are otherwise copied from `fitter`. If only one parent has
    /// the gene enabled, it is disabled in the child with probability
    /// `disable_rate`. Disjoint and excess genes are inherited from
    /// `fitter` alone, so the child has the same topology as `fitter`.
    ///
    /// # Errors
    /// Fails if the parents do not have the same number
    /// of inputs and outputs.
    ///
    /// # Examples
    /// ```
    /// use neatforge::{GenomeId, ValueRange};
    /// use neatforge_nn::genomics::{GeneticConfig, NeatCrossoverSettings, NeatGenome};
    ///
    /// let config = GeneticConfig::default();
    /// let range = ValueRange::new(-1.0, 1.0).unwrap();
    /// let mut rng = rand::thread_rng();
    /// let fitter = NeatGenome::new(GenomeId(0), &config, &range, &mut rng);
    /// let other = NeatGenome::new(GenomeId(1), &config, &range, &mut rng);
    ///
    /// let settings = NeatCrossoverSettings::with_range(range);
    /// let child = NeatGenome::crossover(&fitter, &other, GenomeId(2), &settings, &mut rng).unwrap();
    /// assert_eq!(
    ///     child.network().connection_count(),
    ///     fitter.network().connection_count()
    /// );
    /// ```
    pub fn crossover<R: Rng + ?Sized>(
        fitter: &NeatGenome,
        other: &NeatGenome,
        id: GenomeId,
        settings: &NeatCrossoverSettings,
        rng: &mut R,
    ) -> Result<NeatGenome, CrossoverError> {
        let fitter_layout = (fitter.input_count(), fitter.output_count());
        let other_layout = (other.input_count(), other.output_count());
        if fitter_layout != other_layout {
            return Err(CrossoverError::IncompatibleParents {
                fitter: fitter_layout,
                other: other_layout,
            });
        }

        let mut network = Network::new();
        for neuron in fitter
            .network
            .neurons()
            .filter(|n| n.kind() != NeuronType::Hidden)
        {
            network.add_neuron(neuron.id(), neuron.kind(), neuron.activation())?;
        }

        for alignment in fitter.correlate(other).alignments {
            let mut gene = match alignment {
                Alignment::Matching(a, b) => {
                    let mut gene = *a;
                    if a.weight() != b.weight()
                        && rng.gen::<f64>() < settings.crossover_probability
                    {
                        gene.set_weight(settings.crossover.crossover(a.weight(), b.weight(), rng));
                    }
                    gene
                }
                Alignment::Disjoint(Parent::First, gene) | Alignment::Excess(Parent::First, gene) => {
                    *gene
                }
                _ => continue,
            };
            if let Alignment::Matching(a, b) = alignment {
                if a.enabled() != b.enabled() {
                    gene.set_enabled(rng.gen::<f64>() >= settings.disable_rate);
                }
            }

            inherit_neuron(&mut network, &fitter.network, gene.source())?;
            inherit_neuron(&mut network, &fitter.network, gene.target())?;
            network.add_connection(gene)?;
        }

        Ok(NeatGenome { id, network })
    }
}

/// Copies neuron `id` from `parent` into `child`, unless already present.
fn inherit_neuron(child: &mut Network, parent: &Network, id: NeuronId) -> Result<(), CrossoverError> {
    if child.neuron(id).is_some() {
        return Ok(());
    }
    let neuron = parent
        .neuron(id)
        .ok_or(NetworkError::MissingNeuron(id))?;
    child.add_neuron(id, neuron.kind(), neuron.activation())?;
    Ok(())
}
