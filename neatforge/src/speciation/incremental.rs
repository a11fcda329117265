use super::*;
use crate::errors::ConfigError;

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// How members are matched to the previous
/// generation's species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeciesInheritance {
    /// Every member joins the species of the nearest previous
    /// representative, so no new species can appear.
    Nearest,
    /// Members join the species of the nearest previous
    /// representative only if it lies within the distance
    /// threshold. Others found new species.
    WithinThreshold,
}

/// Self-tuning of the distance threshold toward a
/// target band of species counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DynamicThreshold {
    /// Below this many species, the threshold is lowered.
    pub min_species: usize,
    /// Above this many species, the threshold is raised.
    pub max_species: usize,
    /// Amount by which the threshold changes.
    pub step: f64,
    /// Adjustments only happen on generations that
    /// are multiples of the interval.
    pub interval: NonZeroUsize,
}

impl DynamicThreshold {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_species > self.max_species {
            return Err(ConfigError::InvertedBand {
                parameter: "species count",
                min: self.min_species,
                max: self.max_species,
            });
        }
        if !self.step.is_finite() {
            return Err(ConfigError::NonFinite {
                parameter: "threshold step",
            });
        }
        if self.step <= 0.0 {
            return Err(ConfigError::NonPositive {
                parameter: "threshold step",
                value: self.step,
            });
        }
        Ok(())
    }
}

/// Speciation as in the original NEAT paper: members
/// join the first species whose representative lies
/// closer than a distance threshold, and found a new
/// species otherwise.
///
/// When speciating offspring of a previous population,
/// members are matched against the previous species'
/// representatives instead (see [`SpeciesInheritance`]),
/// and each inherited species is represented by the
/// member closest to its former representative.
///
/// # Examples
/// ```
/// use neatforge::{DistanceFactors, IncrementalSpeciation, SpeciesInheritance};
///
/// let speciation = IncrementalSpeciation::new(DistanceFactors::default(), 3.0, None)
///     .unwrap()
///     .with_inheritance(SpeciesInheritance::WithinThreshold);
/// assert_eq!(speciation.threshold(), 3.0);
///
/// assert!(IncrementalSpeciation::new(DistanceFactors::default(), 0.0, None).is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncrementalSpeciation {
    factors: DistanceFactors,
    threshold: f64,
    dynamic: Option<DynamicThreshold>,
    inheritance: SpeciesInheritance,
}

impl IncrementalSpeciation {
    /// # Errors
    /// Fails if the factors are invalid, the threshold is
    /// not positive and finite, or `dynamic` is invalid.
    pub fn new(
        factors: DistanceFactors,
        threshold: f64,
        dynamic: Option<DynamicThreshold>,
    ) -> Result<IncrementalSpeciation, ConfigError> {
        factors.validate()?;
        if !threshold.is_finite() {
            return Err(ConfigError::NonFinite {
                parameter: "distance threshold",
            });
        }
        if threshold <= 0.0 {
            return Err(ConfigError::NonPositive {
                parameter: "distance threshold",
                value: threshold,
            });
        }
        if let Some(dynamic) = &dynamic {
            dynamic.validate()?;
        }
        Ok(IncrementalSpeciation {
            factors,
            threshold,
            dynamic,
            inheritance: SpeciesInheritance::Nearest,
        })
    }

    pub fn with_inheritance(self, inheritance: SpeciesInheritance) -> IncrementalSpeciation {
        IncrementalSpeciation {
            inheritance,
            ..self
        }
    }

    /// Current distance threshold, which changes over
    /// time if it is dynamic.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn factors(&self) -> &DistanceFactors {
        &self.factors
    }

    fn group<M: SpeciesMember>(
        &self,
        members: &[M],
        previous: Option<&Population<M>>,
        generation: usize,
    ) -> Result<Vec<Grouping>, SpeciationError> {
        let inherited_count = previous.map_or(0, |p| p.species().len());
        let mut groupings: Vec<Grouping> = previous
            .map(|p| {
                p.species()
                    .iter()
                    .map(|s| Grouping {
                        id: s.id(),
                        members: vec![],
                        representative: 0,
                    })
                    .collect()
            })
            .unwrap_or_default();

        for (i, member) in members.iter().enumerate() {
            if let Some(previous) = previous {
                let (nearest, d) = nearest_previous(member, previous, &self.factors)?;
                if self.inheritance == SpeciesInheritance::Nearest || d < self.threshold {
                    groupings[nearest].members.push(i);
                    continue;
                }
            }
            let mut joined = false;
            for grouping in &mut groupings[inherited_count..] {
                if distance(member, &members[grouping.representative], &self.factors)? < self.threshold {
                    grouping.members.push(i);
                    joined = true;
                    break;
                }
            }
            if !joined {
                let ordinal = groupings.len() - inherited_count;
                groupings.push(Grouping {
                    id: SpeciesId(generation, ordinal),
                    members: vec![i],
                    representative: i,
                });
            }
        }

        if let Some(previous) = previous {
            for (grouping, species) in groupings.iter_mut().zip(previous.species()) {
                grouping.representative =
                    self.closest_member(members, &grouping.members, species.representative())?;
            }
        }
        Ok(groupings)
    }

    /// Picks the member nearest to `anchor`. Ties go to the
    /// more complex genome, then to the first candidate.
    fn closest_member<M: SpeciesMember>(
        &self,
        members: &[M],
        candidates: &[usize],
        anchor: &M,
    ) -> Result<usize, SpeciationError> {
        let mut best: Option<(usize, f64, usize)> = None;
        for &c in candidates {
            let d = distance(&members[c], anchor, &self.factors)?;
            let complexity = members[c].genome().complexity();
            let better = match best {
                None => true,
                Some((_, best_d, best_complexity)) => {
                    d < best_d || (d == best_d && complexity > best_complexity)
                }
            };
            if better {
                best = Some((c, d, complexity));
            }
        }
        Ok(best.map_or(0, |(c, ..)| c))
    }

    /// Nudges the threshold if `species_count` lies outside
    /// the configured band. Returns whether it changed.
    fn adjust_threshold(&mut self, species_count: usize, generation: usize) -> bool {
        let dynamic = match self.dynamic {
            Some(d) if generation % d.interval.get() == 0 => d,
            _ => return false,
        };
        let threshold = if species_count < dynamic.min_species {
            (self.threshold - dynamic.step).max(f64::EPSILON)
        } else if species_count > dynamic.max_species {
            self.threshold + dynamic.step
        } else {
            return false;
        };
        log::debug!(
            "{} species in generation {}, distance threshold {} -> {}",
            species_count,
            generation,
            self.threshold,
            threshold
        );
        let changed = threshold != self.threshold;
        self.threshold = threshold;
        changed
    }
}

impl SpeciationStrategy for IncrementalSpeciation {
    fn speciate<M: SpeciesMember>(
        &mut self,
        members: Vec<M>,
        previous: Option<&Population<M>>,
        generation: usize,
    ) -> Result<Vec<Species<M>>, SpeciationError> {
        if members.is_empty() {
            return Err(SpeciationError::NoMembers);
        }
        let mut groupings = self.group(&members, previous, generation)?;
        let species_count = groupings.iter().filter(|g| !g.members.is_empty()).count();
        if self.adjust_threshold(species_count, generation) {
            groupings = self.group(&members, previous, generation)?;
        }
        Ok(into_species(members, groupings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speciation::tests::{check_coverage, points, positions, PointMember};

    fn factors() -> DistanceFactors {
        DistanceFactors {
            weight: 1.0,
            ..DistanceFactors::default()
        }
    }

    fn speciation(threshold: f64) -> IncrementalSpeciation {
        IncrementalSpeciation::new(factors(), threshold, None).unwrap()
    }

    #[test]
    fn first_generation_uses_first_match() {
        let members = points(&[0.0, 0.5, 5.0, 1.2, 5.5, 20.0]);
        let species = speciation(1.0).speciate(members, None, 0).unwrap();
        check_coverage(&species, 6);
        let groups: Vec<Vec<f64>> = species.iter().map(positions).collect();
        // 1.2 is 1.2 away from the first representative (0.0).
        assert_eq!(
            groups,
            vec![vec![0.0, 0.5], vec![5.0, 5.5], vec![1.2], vec![20.0]]
        );
        assert_eq!(
            species.iter().map(|s| s.id()).collect::<Vec<_>>(),
            vec![SpeciesId(0, 0), SpeciesId(0, 1), SpeciesId(0, 2), SpeciesId(0, 3)]
        );
        assert!(species
            .iter()
            .all(|s| s.representative().genome() == s.members()[0].genome()));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(
            speciation(1.0)
                .speciate(Vec::<PointMember>::new(), None, 0)
                .unwrap_err(),
            SpeciationError::NoMembers
        );
    }

    fn previous() -> Population<PointMember> {
        let members = points(&[0.0, 10.0]);
        let mut members = members.into_iter();
        Population::new(
            4,
            vec![
                Species::new(SpeciesId(2, 0), vec![members.next().unwrap()], 0).unwrap(),
                Species::new(SpeciesId(3, 0), vec![members.next().unwrap()], 0).unwrap(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn nearest_inheritance_keeps_previous_species() {
        let previous = previous();
        let members = points(&[9.0, 0.4, 30.0, -0.2, 11.0]);
        let species = speciation(1.0).speciate(members, Some(&previous), 5).unwrap();
        check_coverage(&species, 5);
        assert_eq!(species.len(), 2);
        assert_eq!(species[0].id(), SpeciesId(2, 0));
        assert_eq!(positions(&species[0]), vec![0.4, -0.2]);
        // -0.2 is closest to the old representative at 0.0.
        assert_eq!(species[0].representative().genome().position, -0.2);
        assert_eq!(species[1].id(), SpeciesId(3, 0));
        assert_eq!(positions(&species[1]), vec![9.0, 30.0, 11.0]);
    }

    #[test]
    fn threshold_inheritance_founds_new_species() {
        let previous = previous();
        let members = points(&[9.5, 0.4, 30.0, 50.0, 30.5]);
        let species = speciation(1.0)
            .with_inheritance(SpeciesInheritance::WithinThreshold)
            .speciate(members, Some(&previous), 5)
            .unwrap();
        check_coverage(&species, 5);
        let ids: Vec<SpeciesId> = species.iter().map(|s| s.id()).collect();
        assert_eq!(
            ids,
            vec![SpeciesId(2, 0), SpeciesId(3, 0), SpeciesId(5, 0), SpeciesId(5, 1)]
        );
        assert_eq!(positions(&species[2]), vec![30.0, 30.5]);
    }

    #[test]
    fn extinct_species_are_dropped() {
        let previous = previous();
        let members = points(&[9.0, 10.5]);
        let species = speciation(1.0).speciate(members, Some(&previous), 5).unwrap();
        assert_eq!(species.len(), 1);
        assert_eq!(species[0].id(), SpeciesId(3, 0));
    }

    #[test]
    fn representative_ties_prefer_first_candidate() {
        let previous = previous();
        let members = points(&[1.0, -1.0]);
        let species = speciation(5.0).speciate(members, Some(&previous), 5).unwrap();
        assert_eq!(species[0].representative_index(), 0);
    }

    #[test]
    fn dynamic_threshold_moves_toward_band() {
        let dynamic = DynamicThreshold {
            min_species: 2,
            max_species: 3,
            step: 0.5,
            interval: NonZeroUsize::new(2).unwrap(),
        };
        let mut speciation = IncrementalSpeciation::new(factors(), 1.0, Some(dynamic)).unwrap();
        let spread = [0.0, 1.5, 3.0, 4.5, 6.0];

        // Odd generations never adjust.
        let species = speciation.speciate(points(&spread), None, 1).unwrap();
        assert_eq!(species.len(), 5);
        assert_eq!(speciation.threshold(), 1.0);

        // Too many species: the threshold grows and speciation re-runs once.
        let species = speciation.speciate(points(&spread), None, 2).unwrap();
        assert_eq!(speciation.threshold(), 1.5);
        assert_eq!(species.len(), 5);
        let species = speciation.speciate(points(&spread), None, 4).unwrap();
        assert_eq!(speciation.threshold(), 2.0);
        assert_eq!(species.len(), 3);
        check_coverage(&species, 5);

        // Too few species: the threshold shrinks.
        let species = speciation.speciate(points(&[0.0, 0.1]), None, 6).unwrap();
        assert_eq!(speciation.threshold(), 1.5);
        assert_eq!(species.len(), 1);
    }

    #[test]
    fn invalid_dynamic_threshold() {
        let dynamic = DynamicThreshold {
            min_species: 4,
            max_species: 3,
            step: 0.5,
            interval: NonZeroUsize::new(1).unwrap(),
        };
        assert!(IncrementalSpeciation::new(factors(), 1.0, Some(dynamic)).is_err());
        let dynamic = DynamicThreshold {
            min_species: 1,
            max_species: 3,
            step: 0.0,
            ..dynamic
        };
        assert!(IncrementalSpeciation::new(factors(), 1.0, Some(dynamic)).is_err());
    }
}
