use super::*;
use crate::errors::ConfigError;
use crate::kmedoids::{Clustering, KMedoids};

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Speciation by k-medoids clustering over genetic distance.
///
/// The first generation is clustered from scratch into
/// `initial_clusters` species (or fewer, if there are not
/// enough members). Later generations refine the previous
/// generation's species, seeded by assigning each member
/// to its nearest previous representative; every species
/// is represented by its medoid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMedoidsSpeciation {
    factors: DistanceFactors,
    initial_clusters: NonZeroUsize,
}

impl KMedoidsSpeciation {
    pub fn new(factors: DistanceFactors, initial_clusters: NonZeroUsize) -> Result<KMedoidsSpeciation, ConfigError> {
        factors.validate()?;
        Ok(KMedoidsSpeciation {
            factors,
            initial_clusters,
        })
    }
}

impl SpeciationStrategy for KMedoidsSpeciation {
    fn speciate<M: SpeciesMember>(
        &mut self,
        members: Vec<M>,
        previous: Option<&Population<M>>,
        generation: usize,
    ) -> Result<Vec<Species<M>>, SpeciationError> {
        if members.is_empty() {
            return Err(SpeciationError::NoMembers);
        }
        let factors = self.factors;
        let kmedoids = KMedoids::new(|a: &M, b: &M| a.genome().genetic_distance(b.genome(), &factors));

        let groupings = match previous {
            None => {
                let k = self.initial_clusters.get().min(members.len());
                let clustering = kmedoids.compute(&members, k)?;
                groupings_of(clustering, |c| SpeciesId(generation, c))
            }
            Some(previous) => {
                let mut ids: Vec<SpeciesId> = previous.species().iter().map(|s| s.id()).collect();
                let mut seeds = vec![vec![]; ids.len()];
                for (i, member) in members.iter().enumerate() {
                    let (nearest, _) = nearest_previous(member, previous, &self.factors)?;
                    seeds[nearest].push(i);
                }
                // Extinct species are only refilled while
                // there are enough members to go around.
                while seeds.len() > members.len() {
                    match seeds.iter().position(Vec::is_empty) {
                        Some(empty) => {
                            seeds.remove(empty);
                            ids.remove(empty);
                        }
                        None => break,
                    }
                }
                let clustering = kmedoids.refine(&members, seeds)?;
                groupings_of(clustering, |c| ids[c])
            }
        };
        Ok(into_species(members, groupings))
    }
}

fn groupings_of<I>(clustering: Clustering, id: I) -> Vec<Grouping>
where
    I: Fn(usize) -> SpeciesId,
{
    clustering
        .clusters
        .into_iter()
        .enumerate()
        .map(|(c, cluster)| Grouping {
            id: id(c),
            representative: cluster.medoid(),
            members: cluster.members().to_vec(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speciation::tests::{check_coverage, points, positions, PointMember};

    fn speciation(k: usize) -> KMedoidsSpeciation {
        KMedoidsSpeciation::new(
            DistanceFactors {
                weight: 1.0,
                ..DistanceFactors::default()
            },
            NonZeroUsize::new(k).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn clusters_from_scratch() {
        let members = points(&[0.0, 10.0, 0.2, 10.3, 0.1, 20.0, 20.1]);
        let species = speciation(3).speciate(members, None, 0).unwrap();
        check_coverage(&species, 7);
        let mut groups: Vec<Vec<f64>> = species.iter().map(positions).collect();
        groups.sort_by(|a, b| a[0].total_cmp(&b[0]));
        assert_eq!(groups, vec![vec![0.0, 0.2, 0.1], vec![10.0, 10.3], vec![20.0, 20.1]]);
        let mut ids: Vec<SpeciesId> = species.iter().map(|s| s.id()).collect();
        ids.sort();
        assert_eq!(ids, vec![SpeciesId(0, 0), SpeciesId(0, 1), SpeciesId(0, 2)]);
    }

    #[test]
    fn cluster_count_is_bounded_by_member_count() {
        let species = speciation(5).speciate(points(&[1.0, 2.0]), None, 0).unwrap();
        assert_eq!(species.len(), 2);
        check_coverage(&species, 2);
    }

    #[test]
    fn refines_previous_species() {
        let previous = Population::new(
            3,
            vec![
                Species::new(SpeciesId(1, 0), points(&[0.0]), 0).unwrap(),
                Species::new(SpeciesId(2, 0), points(&[10.0]), 0).unwrap(),
            ],
        )
        .unwrap();
        let members = points(&[9.0, 1.0, 11.0, -1.0, 0.0]);
        let species = speciation(4).speciate(members, Some(&previous), 4).unwrap();
        check_coverage(&species, 5);
        assert_eq!(species[0].id(), SpeciesId(1, 0));
        assert_eq!(positions(&species[0]), vec![1.0, -1.0, 0.0]);
        assert_eq!(species[0].representative().genome().position, 0.0);
        assert_eq!(species[1].id(), SpeciesId(2, 0));
        assert_eq!(positions(&species[1]), vec![9.0, 11.0]);
    }

    #[test]
    fn extinct_previous_species_are_refilled() {
        let previous = Population::new(
            3,
            vec![
                Species::new(SpeciesId(1, 0), points(&[0.0]), 0).unwrap(),
                Species::new(SpeciesId(2, 0), points(&[100.0]), 0).unwrap(),
            ],
        )
        .unwrap();
        let members = points(&[0.0, 0.1, 7.0, 7.2]);
        let species = speciation(2).speciate(members, Some(&previous), 4).unwrap();
        check_coverage(&species, 4);
        assert_eq!(species.len(), 2);
        assert!(species.iter().all(|s| s.len() == 2));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(
            speciation(1)
                .speciate(Vec::<PointMember>::new(), None, 0)
                .unwrap_err(),
            SpeciationError::NoMembers
        );
    }
}
