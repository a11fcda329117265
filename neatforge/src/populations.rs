//! A Population is a collection of members,
//! grouped into species, which can be evolved
//! using member fitness as the source of
//! selective pressure.
mod config;
mod evolver;
mod fitness;
pub mod logging;
mod member;
mod species;

use crate::errors::EvolutionError;
pub use config::EvolutionParameters;
pub use evolver::{Evolver, Reproduction, Solution};
pub use fitness::FitnessSnapshot;
pub use member::{Member, SpeciesMember};
pub use species::{Species, SpeciesId};

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use std::collections::HashSet;

/// A population of members, grouped into species.
///
/// Populations are not modified once built:
/// each generation produces a new one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "PopulationRecord<M>")]
pub struct Population<M> {
    generation: usize,
    species: Vec<Species<M>>,
}

#[derive(Deserialize)]
struct PopulationRecord<M> {
    generation: usize,
    species: Vec<Species<M>>,
}

impl<M> TryFrom<PopulationRecord<M>> for Population<M> {
    type Error = EvolutionError;

    fn try_from(record: PopulationRecord<M>) -> Result<Self, Self::Error> {
        Population::new(record.generation, record.species)
    }
}

impl<M> Population<M> {
    /// Creates a population of the given generation
    /// from its species.
    ///
    /// # Errors
    /// Fails if there are no species or if two
    /// species share an ID.
    ///
    /// # Examples
    /// ```
    /// use neatforge::{Population, Species, SpeciesId};
    ///
    /// let population = Population::new(
    ///     0,
    ///     vec![
    ///         Species::new(SpeciesId(0, 0), vec![1, 2], 0).unwrap(),
    ///         Species::new(SpeciesId(0, 1), vec![3], 0).unwrap(),
    ///     ],
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(population.member_count(), 3);
    /// assert_eq!(population.members().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    /// ```
    pub fn new(generation: usize, species: Vec<Species<M>>) -> Result<Population<M>, EvolutionError> {
        if species.is_empty() {
            return Err(EvolutionError::InvalidInput(
                "a population needs at least one species".into(),
            ));
        }
        let mut ids: HashSet<SpeciesId, RandomState> = HashSet::default();
        for s in &species {
            if !ids.insert(s.id()) {
                return Err(EvolutionError::InvalidInput(format!(
                    "duplicate species {:?}",
                    s.id()
                )));
            }
        }
        Ok(Population {
            generation,
            species,
        })
    }

    /// Returns the population's generation number.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Returns all current species.
    pub fn species(&self) -> &[Species<M>] {
        &self.species
    }

    /// Returns an iterator over all members, in species order.
    pub fn members(&self) -> impl Iterator<Item = &M> {
        self.species.iter().flat_map(|s| s.members())
    }

    /// Returns the total number of members.
    pub fn member_count(&self) -> usize {
        self.species.iter().map(Species::len).sum()
    }

    /// Returns the member at `(species, member)` position.
    pub fn member(&self, species: usize, member: usize) -> &M {
        &self.species[species].members()[member]
    }

    /// Returns the fittest member according to `snapshot`.
    pub fn champion(&self, snapshot: &FitnessSnapshot) -> &M {
        let (s, m) = snapshot.best();
        self.member(s, m)
    }

    pub fn into_species(self) -> Vec<Species<M>> {
        self.species
    }
}

/// Rounds all values to non-negative whole numbers
/// that add up to `total`.
/// Rounding is done in the manner that minimizes
/// the average error to the original set of values,
/// with ties going to the earliest values.
pub(crate) fn round_retain_sum(values: &[f64], total: usize) -> Vec<usize> {
    if values.is_empty() {
        return vec![];
    }
    let mut truncated: Vec<(usize, usize, f64)> = values
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let f = f.max(0.0);
            let u = f.floor();
            (i, u as usize, f - u)
        })
        .collect();
    let truncated_sum: usize = truncated.iter().map(|(_, u, _)| *u).sum();
    if truncated_sum < total {
        // Sort in decreasing order of error
        truncated.sort_by(|a, b| b.2.total_cmp(&a.2));
        let len = truncated.len();
        for k in 0..total - truncated_sum {
            truncated[k % len].1 += 1;
        }
    } else if truncated_sum > total {
        // Only reachable through accumulated float error.
        truncated.sort_by(|a, b| a.2.total_cmp(&b.2));
        let mut excess = truncated_sum - total;
        while excess > 0 {
            for (_, u, _) in truncated.iter_mut() {
                if excess > 0 && *u > 0 {
                    *u -= 1;
                    excess -= 1;
                }
            }
        }
    }
    truncated.sort_by_key(|(i, ..)| *i);
    truncated.iter().map(|(_, u, _)| *u).collect()
}
