use crate::genomics::{
    GeneticConfig, History, NeatCrossoverSettings, NeatGenome, NeatMutationSettings,
    ReproductionError,
};

use neatforge::{ConfigError, Genome, GenomeId, IdPolicy, Reproduction, ValueRange};
use rand::Rng;

/// Creates, mutates and crosses [`NeatGenome`]s for the
/// evolution engine, tracking structural innovations
/// in a [`History`] renewed every generation.
#[derive(Clone, Debug)]
pub struct NeatReproduction {
    genetic: GeneticConfig,
    mutation: NeatMutationSettings,
    crossover: NeatCrossoverSettings,
    history: History,
    generation: usize,
}

impl NeatReproduction {
    /// # Errors
    /// Fails if any of the settings is invalid.
    pub fn new(
        genetic: GeneticConfig,
        mutation: NeatMutationSettings,
        crossover: NeatCrossoverSettings,
    ) -> Result<NeatReproduction, ConfigError> {
        genetic.validate()?;
        mutation.validate()?;
        crossover.validate()?;
        Ok(NeatReproduction {
            history: History::new(&genetic),
            genetic,
            mutation,
            crossover,
            generation: 0,
        })
    }

    /// Default mutation and crossover settings,
    /// with weights in `[-8, 8]`.
    ///
    /// # Examples
    /// ```
    /// use neatforge_nn::genomics::GeneticConfig;
    /// use neatforge_nn::NeatReproduction;
    ///
    /// let reproduction = NeatReproduction::with_defaults(GeneticConfig::default()).unwrap();
    /// assert_eq!(reproduction.mutation().mutation.value_range.max(), 8.0);
    /// ```
    pub fn with_defaults(genetic: GeneticConfig) -> Result<NeatReproduction, ConfigError> {
        let range = ValueRange::new(-8.0, 8.0)?;
        Self::new(
            genetic,
            NeatMutationSettings::with_range(range),
            NeatCrossoverSettings::with_range(range),
        )
    }

    pub fn genetic(&self) -> &GeneticConfig {
        &self.genetic
    }

    pub fn mutation(&self) -> &NeatMutationSettings {
        &self.mutation
    }

    pub fn crossover(&self) -> &NeatCrossoverSettings {
        &self.crossover
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// The generation offspring are currently created for.
    pub fn generation(&self) -> usize {
        self.generation
    }
}

impl Reproduction for NeatReproduction {
    type Genome = NeatGenome;
    type Error = ReproductionError;

    fn begin_generation(&mut self, generation: usize) {
        self.generation = generation;
        self.history.begin_generation();
    }

    fn create_genome<R: Rng + ?Sized>(
        &mut self,
        id: GenomeId,
        rng: &mut R,
    ) -> Result<NeatGenome, ReproductionError> {
        Ok(NeatGenome::new(
            id,
            &self.genetic,
            &self.mutation.mutation.value_range,
            rng,
        ))
    }

    fn create_offspring_asexual<R: Rng + ?Sized>(
        &mut self,
        parent: &NeatGenome,
        id: GenomeId,
        rng: &mut R,
    ) -> Result<NeatGenome, ReproductionError> {
        let mut child = parent.deep_clone(IdPolicy::Assign(id));
        child.mutate(
            &self.mutation,
            &self.genetic,
            &mut self.history,
            self.generation,
            rng,
        )?;
        Ok(child)
    }

    fn create_offspring_sexual<R: Rng + ?Sized>(
        &mut self,
        fitter: &NeatGenome,
        other: &NeatGenome,
        id: GenomeId,
        rng: &mut R,
    ) -> Result<NeatGenome, ReproductionError> {
        let mut child = NeatGenome::crossover(fitter, other, id, &self.crossover, rng)?;
        if rng.gen::<f64>() < self.crossover.sexual_mutation_probability {
            child.mutate(
                &self.mutation,
                &self.genetic,
                &mut self.history,
                self.generation,
                rng,
            )?;
        }
        Ok(child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use std::num::NonZeroUsize;

    fn reproduction() -> NeatReproduction {
        NeatReproduction::with_defaults(GeneticConfig {
            input_count: NonZeroUsize::new(3).unwrap(),
            output_count: NonZeroUsize::new(2).unwrap(),
            ..GeneticConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn invalid_settings() {
        let genetic = GeneticConfig {
            initial_expression_chance: -1.0,
            ..GeneticConfig::default()
        };
        assert!(NeatReproduction::with_defaults(genetic).is_err());
    }

    #[test]
    fn offspring_get_requested_ids() {
        let mut reproduction = reproduction();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        reproduction.begin_generation(0);
        let first = reproduction.create_genome(GenomeId(0), &mut rng).unwrap();
        let second = reproduction.create_genome(GenomeId(1), &mut rng).unwrap();
        assert_eq!(first.complexity(), 8);

        reproduction.begin_generation(1);
        assert_eq!(reproduction.generation(), 1);
        let asexual = reproduction
            .create_offspring_asexual(&first, GenomeId(2), &mut rng)
            .unwrap();
        let sexual = reproduction
            .create_offspring_sexual(&first, &second, GenomeId(3), &mut rng)
            .unwrap();
        assert_eq!(asexual.id(), GenomeId(2));
        assert_eq!(sexual.id(), GenomeId(3));
        // Parents are left untouched.
        assert_eq!(first.id(), GenomeId(0));
        assert_eq!(first.complexity(), 8);
    }

    #[test]
    fn asexual_offspring_are_mutated() {
        let mut reproduction = reproduction();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        reproduction.begin_generation(0);
        let parent = reproduction.create_genome(GenomeId(0), &mut rng).unwrap();
        for id in 1..20 {
            let child = reproduction
                .create_offspring_asexual(&parent, GenomeId(id), &mut rng)
                .unwrap();
            assert!(
                child.complexity() != parent.complexity()
                    || child.network().neuron_count() != parent.network().neuron_count()
                    || child
                        .network()
                        .connections()
                        .zip(parent.network().connections())
                        .any(|(a, b)| a != b)
            );
        }
    }
}
