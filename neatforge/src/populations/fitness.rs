use super::{Population, SpeciesMember};
use crate::errors::EvolutionError;
use crate::selection::FitnessItem;

/// The fitness of every member of a population,
/// evaluated once per generation.
///
/// Entries are indexed the same way as the population:
/// by species position, then by member position within
/// the species.
#[derive(Clone, Debug)]
pub struct FitnessSnapshot {
    species: Vec<Vec<FitnessItem<usize>>>,
    means: Vec<f64>,
    best: (usize, usize),
    min: f64,
}

impl FitnessSnapshot {
    /// Evaluates every member of `population` sequentially.
    ///
    /// # Errors
    /// Fails if any fitness is NaN or infinite.
    pub fn compute<M: SpeciesMember>(population: &Population<M>) -> Result<FitnessSnapshot, EvolutionError> {
        let values = population
            .species()
            .iter()
            .map(|s| s.members().iter().map(M::compute_fitness).collect())
            .collect();
        FitnessSnapshot::from_values(population, values)
    }

    /// Builds a snapshot from fitnesses evaluated elsewhere,
    /// e.g. in parallel. `values[s][m]` must be the fitness
    /// of member `m` of species `s`.
    ///
    /// # Errors
    /// Fails if `values` doesn't match the population's
    /// shape, or if any fitness is NaN or infinite.
    pub fn from_values<M>(
        population: &Population<M>,
        values: Vec<Vec<f64>>,
    ) -> Result<FitnessSnapshot, EvolutionError> {
        let shape_matches = values.len() == population.species().len()
            && values
                .iter()
                .zip(population.species())
                .all(|(v, s)| v.len() == s.len());
        if !shape_matches {
            return Err(EvolutionError::InvalidInput(
                "fitness values do not match the population's shape".into(),
            ));
        }

        let mut species = Vec::with_capacity(values.len());
        let mut means = Vec::with_capacity(values.len());
        let mut best = (0, 0);
        let mut best_fitness = f64::NEG_INFINITY;
        let mut min = f64::INFINITY;
        for (s, fitnesses) in values.into_iter().enumerate() {
            let mut items = Vec::with_capacity(fitnesses.len());
            for (m, fitness) in fitnesses.into_iter().enumerate() {
                let item = FitnessItem::new(m, fitness).map_err(|e| {
                    EvolutionError::InvalidInput(format!("member {} of species {}: {}", m, s, e))
                })?;
                if fitness > best_fitness {
                    best_fitness = fitness;
                    best = (s, m);
                }
                min = min.min(fitness);
                items.push(item);
            }
            means.push(mean(items.iter().map(FitnessItem::fitness)));
            species.push(items);
        }
        Ok(FitnessSnapshot {
            species,
            means,
            best,
            min,
        })
    }

    /// Fitness items of a species' members,
    /// where each item is the member's index.
    pub fn species_fitness(&self, species: usize) -> &[FitnessItem<usize>] {
        &self.species[species]
    }

    pub fn member_fitness(&self, species: usize, member: usize) -> f64 {
        self.species[species][member].fitness()
    }

    /// Mean member fitness of a species.
    pub fn species_mean(&self, species: usize) -> f64 {
        self.means[species]
    }

    /// Species and member index of the fittest member.
    /// Ties go to the first in population order.
    pub fn best(&self) -> (usize, usize) {
        self.best
    }

    pub fn best_fitness(&self) -> f64 {
        self.member_fitness(self.best.0, self.best.1)
    }

    /// Lowest member fitness.
    pub fn min_fitness(&self) -> f64 {
        self.min
    }

    /// Mean fitness over all members.
    pub fn mean_fitness(&self) -> f64 {
        mean(self.values())
    }

    /// Iterates over all fitnesses in population order.
    pub fn values(&self) -> impl Iterator<Item = f64> + Clone + '_ {
        self.species.iter().flatten().map(FitnessItem::fitness)
    }

    /// Member indices of a species, fittest first.
    /// Ties keep population order.
    pub fn ranked_members(&self, species: usize) -> Vec<usize> {
        let mut ranked: Vec<&FitnessItem<usize>> = self.species[species].iter().collect();
        ranked.sort_by(|a, b| b.cmp_by_fitness(a));
        ranked.into_iter().map(|i| *i.item()).collect()
    }

    pub(super) fn species_count(&self) -> usize {
        self.species.len()
    }

    pub(super) fn species_len(&self, species: usize) -> usize {
        self.species[species].len()
    }
}

/// Mean of finite values, without overflowing
/// when their sum exceeds the `f64` range.
fn mean(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let (sum, count) = values.clone().fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if sum.is_finite() {
        sum / count as f64
    } else {
        values.map(|v| v / count as f64).sum()
    }
}
