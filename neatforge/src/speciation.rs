//! Grouping of population members into species
//! by genetic distance.
mod clustered;
mod incremental;

pub use clustered::KMedoidsSpeciation;
pub use incremental::{DynamicThreshold, IncrementalSpeciation, SpeciesInheritance};

use crate::errors::SpeciationError;
use crate::genome::{DistanceFactors, Genome};
use crate::populations::{Population, Species, SpeciesId, SpeciesMember};

/// A way of splitting members into species.
///
/// Implementations must place every member in exactly
/// one species, and must not return empty species.
pub trait SpeciationStrategy {
    /// Groups `members` into species. `previous` is the
    /// population the members descend from, if any, and
    /// `generation` the generation they will form.
    fn speciate<M: SpeciesMember>(
        &mut self,
        members: Vec<M>,
        previous: Option<&Population<M>>,
        generation: usize,
    ) -> Result<Vec<Species<M>>, SpeciationError>;
}

/// A species under construction, holding member indices.
#[derive(Debug, Clone)]
struct Grouping {
    id: SpeciesId,
    members: Vec<usize>,
    representative: usize,
}

/// Moves members into the species described by `groupings`,
/// skipping empty groupings.
fn into_species<M>(members: Vec<M>, groupings: Vec<Grouping>) -> Vec<Species<M>> {
    let mut slots: Vec<Option<M>> = members.into_iter().map(Some).collect();
    groupings
        .into_iter()
        .filter(|g| !g.members.is_empty())
        .map(|g| {
            let representative = g
                .members
                .iter()
                .position(|&m| m == g.representative)
                .unwrap_or(0);
            let members = g.members.iter().filter_map(|&m| slots[m].take()).collect();
            Species::from_parts(g.id, members, representative)
        })
        .collect()
}

fn distance<M: SpeciesMember>(a: &M, b: &M, factors: &DistanceFactors) -> Result<f64, SpeciationError> {
    let d = a.genome().genetic_distance(b.genome(), factors);
    if d.is_nan() {
        Err(SpeciationError::InvalidDistance)
    } else {
        Ok(d)
    }
}

/// Index of the previous species whose representative
/// is nearest to `member`, with its distance.
/// Ties go to the first species.
fn nearest_previous<M: SpeciesMember>(
    member: &M,
    previous: &Population<M>,
    factors: &DistanceFactors,
) -> Result<(usize, f64), SpeciationError> {
    let mut nearest = (0, f64::INFINITY);
    for (s, species) in previous.species().iter().enumerate() {
        let d = distance(member, species.representative(), factors)?;
        if d < nearest.1 {
            nearest = (s, d);
        }
    }
    Ok(nearest)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::genome::tests::PointGenome;
    use crate::populations::Member;

    use std::sync::Arc;

    pub(crate) type PointMember = Member<PointGenome, fn(&PointGenome) -> f64>;

    fn zero(_: &PointGenome) -> f64 {
        0.0
    }

    pub(crate) fn points(positions: &[f64]) -> Vec<PointMember> {
        let fitness: Arc<fn(&PointGenome) -> f64> = Arc::new(zero);
        positions
            .iter()
            .enumerate()
            .map(|(i, p)| Member::new(PointGenome::new(i as u64, *p), Arc::clone(&fitness)))
            .collect()
    }

    pub(crate) fn positions(species: &Species<PointMember>) -> Vec<f64> {
        species.members().iter().map(|m| m.genome().position).collect()
    }

    /// Every member ends up in exactly one non-empty species.
    pub(crate) fn check_coverage(species: &[Species<PointMember>], count: usize) {
        assert!(species.iter().all(|s| !s.members().is_empty()));
        let mut ids: Vec<u64> = species
            .iter()
            .flat_map(|s| s.members())
            .map(|m| m.genome().id().0)
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..count as u64).collect::<Vec<_>>());
    }

    #[test]
    fn into_species_skips_empty_groupings() {
        let species = into_species(
            points(&[0.0, 1.0, 2.0]),
            vec![
                Grouping {
                    id: SpeciesId(0, 0),
                    members: vec![2, 0],
                    representative: 0,
                },
                Grouping {
                    id: SpeciesId(0, 1),
                    members: vec![],
                    representative: 0,
                },
                Grouping {
                    id: SpeciesId(0, 2),
                    members: vec![1],
                    representative: 1,
                },
            ],
        );
        check_coverage(&species, 3);
        assert_eq!(species.len(), 2);
        assert_eq!(positions(&species[0]), vec![2.0, 0.0]);
        assert_eq!(species[0].representative().genome().position, 0.0);
        assert_eq!(species[1].id(), SpeciesId(0, 2));
    }
}
