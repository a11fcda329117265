//! Weighted random sampling over a finite set of outcomes.
use crate::errors::DistributionError;

use ahash::RandomState;
use rand::Rng;
use serde::{Deserialize, Serialize};

use std::collections::HashMap;

/// Summary statistics over a set of values.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DistributionStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub total: f64,
    pub average: f64,
}

impl DistributionStats {
    fn from_values(values: impl Iterator<Item = f64>) -> DistributionStats {
        let (mut count, mut min, mut max, mut total) = (0, f64::INFINITY, f64::NEG_INFINITY, 0.0);
        for v in values {
            count += 1;
            min = min.min(v);
            max = max.max(v);
            total += v;
        }
        DistributionStats {
            count,
            min,
            max,
            total,
            average: total / count as f64,
        }
    }
}

/// A group of outcomes sharing the same value.
#[derive(Clone, Debug)]
struct ValueGroup {
    value: f64,
    members: Vec<usize>,
}

/// A discrete distribution over outcomes with
/// non-negative values, sampled proportionally
/// to those values by stochastic acceptance.
///
/// Outcomes sharing an identical value form a
/// _value group_. Grouped sampling picks a group
/// proportionally to its value (each group counting
/// once, regardless of its size) and then one of its
/// members uniformly, which keeps rank-based weights
/// from favouring large tie groups.
///
/// # Examples
/// ```
/// use neatforge::WeightedDistribution;
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
///
/// let distribution = WeightedDistribution::new(vec![("a", 0.0), ("b", 2.0)]).unwrap();
/// let mut rng = ChaCha8Rng::seed_from_u64(1);
///
/// // "a" carries no weight and can never be drawn.
/// for _ in 0..100 {
///     assert_eq!(*distribution.sample(&mut rng, false), "b");
/// }
/// ```
#[derive(Clone, Debug)]
pub struct WeightedDistribution<T> {
    outcomes: Vec<(T, f64)>,
    groups: Vec<ValueGroup>,
    stats: DistributionStats,
    group_stats: DistributionStats,
}

impl<T> WeightedDistribution<T> {
    /// Builds a distribution from `(outcome, value)` pairs.
    ///
    /// # Errors
    /// Fails if no outcomes are given, or if any value
    /// is negative or not finite.
    pub fn new<I>(outcomes: I) -> Result<WeightedDistribution<T>, DistributionError>
    where
        I: IntoIterator<Item = (T, f64)>,
    {
        let outcomes: Vec<(T, f64)> = outcomes.into_iter().collect();
        if outcomes.is_empty() {
            return Err(DistributionError::Empty);
        }
        if let Some((index, (_, value))) = outcomes
            .iter()
            .enumerate()
            .find(|(_, (_, v))| !v.is_finite() || *v < 0.0)
        {
            return Err(DistributionError::InvalidValue {
                index,
                value: *value,
            });
        }

        let mut group_indices: HashMap<u64, usize, RandomState> = HashMap::default();
        let mut groups: Vec<ValueGroup> = vec![];
        for (i, (_, value)) in outcomes.iter().enumerate() {
            // -0.0 and 0.0 must share a group.
            let key = if *value == 0.0 { 0 } else { value.to_bits() };
            let g = *group_indices.entry(key).or_insert_with(|| {
                groups.push(ValueGroup {
                    value: *value,
                    members: vec![],
                });
                groups.len() - 1
            });
            groups[g].members.push(i);
        }

        let stats = DistributionStats::from_values(outcomes.iter().map(|(_, v)| *v));
        let group_stats = DistributionStats::from_values(groups.iter().map(|g| g.value));
        Ok(WeightedDistribution {
            outcomes,
            groups,
            stats,
            group_stats,
        })
    }

    /// Draws one outcome. With `grouped` set, a value
    /// group is drawn first and then one of its members
    /// uniformly.
    ///
    /// When all values are equal (including all zero)
    /// the draw is uniform.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, grouped: bool) -> &T {
        let index = if grouped {
            let g = stochastic_acceptance(
                self.groups.len(),
                |i| self.groups[i].value,
                &self.group_stats,
                rng,
            );
            let members = &self.groups[g].members;
            members[rng.gen_range(0..members.len())]
        } else {
            stochastic_acceptance(
                self.outcomes.len(),
                |i| self.outcomes[i].1,
                &self.stats,
                rng,
            )
        };
        &self.outcomes[index].0
    }

    /// Returns a new distribution equal to this one
    /// without the first outcome equal to `outcome`.
    ///
    /// # Errors
    /// Fails if `outcome` is not part of the distribution,
    /// or if it is its last remaining outcome.
    pub fn remove_outcome(&self, outcome: &T) -> Result<WeightedDistribution<T>, DistributionError>
    where
        T: PartialEq + Clone,
    {
        let position = self
            .outcomes
            .iter()
            .position(|(o, _)| o == outcome)
            .ok_or(DistributionError::UnknownOutcome)?;
        if self.outcomes.len() == 1 {
            return Err(DistributionError::Exhausted);
        }
        WeightedDistribution::new(
            self.outcomes
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != position)
                .map(|(_, (o, v))| (o.clone(), *v)),
        )
    }

    /// Statistics over the raw outcome values.
    pub fn stats(&self) -> &DistributionStats {
        &self.stats
    }

    /// Statistics over the distinct values (one per group).
    pub fn group_stats(&self) -> &DistributionStats {
        &self.group_stats
    }

    /// Returns the number of outcomes.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Always `false`: a distribution holds at least one outcome.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Returns the number of distinct values.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Iterates over all `(outcome, value)` pairs.
    pub fn outcomes(&self) -> impl Iterator<Item = (&T, f64)> {
        self.outcomes.iter().map(|(o, v)| (o, *v))
    }
}

/// Picks an index in `0..count` with probability
/// proportional to `value(index)`.
fn stochastic_acceptance<R, F>(count: usize, value: F, stats: &DistributionStats, rng: &mut R) -> usize
where
    R: Rng + ?Sized,
    F: Fn(usize) -> f64,
{
    if stats.max == stats.min {
        return rng.gen_range(0..count);
    }
    loop {
        let i = rng.gen_range(0..count);
        if rng.gen::<f64>() * stats.max < value(i) {
            return i;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn new_rejects_invalid_input() {
        assert_eq!(
            WeightedDistribution::<u8>::new(vec![]).unwrap_err(),
            DistributionError::Empty
        );
        assert!(matches!(
            WeightedDistribution::new(vec![(0, 1.0), (1, -0.5)]).unwrap_err(),
            DistributionError::InvalidValue { index: 1, .. }
        ));
        assert!(matches!(
            WeightedDistribution::new(vec![(0, f64::NAN)]).unwrap_err(),
            DistributionError::InvalidValue { index: 0, .. }
        ));
        assert!(matches!(
            WeightedDistribution::new(vec![(0, 1.0), (1, f64::INFINITY)]).unwrap_err(),
            DistributionError::InvalidValue { index: 1, .. }
        ));
    }

    #[test]
    fn extreme_values_sample() {
        let d = WeightedDistribution::new(vec![(0usize, f64::MAX), (1, f64::MIN_POSITIVE), (2, 0.0)])
            .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..1000 {
            assert_eq!(*d.sample(&mut rng, false), 0);
            assert_eq!(*d.sample(&mut rng, true), 0);
        }
    }

    #[test]
    fn stats() {
        let d = WeightedDistribution::new(vec![(0, 1.0), (1, 3.0), (2, 3.0), (3, 0.0)]).unwrap();
        assert_eq!(d.stats().count, 4);
        assert_eq!(d.stats().min, 0.0);
        assert_eq!(d.stats().max, 3.0);
        assert_eq!(d.stats().total, 7.0);
        assert_eq!(d.stats().average, 1.75);
        assert_eq!(d.group_count(), 3);
        assert_eq!(d.group_stats().count, 3);
        assert_eq!(d.group_stats().total, 4.0);
    }

    #[test]
    fn sampling_frequencies_follow_values() {
        let d = WeightedDistribution::new(vec![(0usize, 1.0), (1, 2.0), (2, 0.0), (3, 5.0)]).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut counts = [0usize; 4];
        let draws = 80_000;
        for _ in 0..draws {
            counts[*d.sample(&mut rng, false)] += 1;
        }
        assert_eq!(counts[2], 0);
        for (i, expected) in [(0, 1.0 / 8.0), (1, 2.0 / 8.0), (3, 5.0 / 8.0)] {
            let observed = counts[i] as f64 / draws as f64;
            assert!((observed - expected).abs() < 0.01, "{} vs {}", observed, expected);
        }
    }

    #[test]
    fn all_zero_values_sample_uniformly() {
        let d = WeightedDistribution::new((0..4usize).map(|i| (i, 0.0))).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut counts = [0usize; 4];
        for _ in 0..40_000 {
            counts[*d.sample(&mut rng, false)] += 1;
        }
        for c in counts {
            assert!((c as f64 / 40_000.0 - 0.25).abs() < 0.01);
        }
    }

    #[test]
    fn grouped_sampling_counts_each_value_once() {
        // Three outcomes share value 1.0, one has value 1.0 * 3.
        let d = WeightedDistribution::new(vec![(0usize, 1.0), (1, 1.0), (2, 1.0), (3, 3.0)]).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let draws = 80_000;
        let mut tied = 0;
        for _ in 0..draws {
            if *d.sample(&mut rng, true) != 3 {
                tied += 1;
            }
        }
        // Group {0, 1, 2} has value 1 against 3 for group {3}.
        let observed = tied as f64 / draws as f64;
        assert!((observed - 0.25).abs() < 0.01, "{}", observed);
    }

    #[test]
    fn remove_outcome() {
        let d = WeightedDistribution::new(vec![("a", 1.0), ("b", 4.0)]).unwrap();
        let d = d.remove_outcome(&"b").unwrap();
        assert_eq!(d.len(), 1);
        assert_eq!(d.stats().max, 1.0);
        assert_eq!(d.remove_outcome(&"a").unwrap_err(), DistributionError::Exhausted);
        assert_eq!(
            d.remove_outcome(&"z").unwrap_err(),
            DistributionError::UnknownOutcome
        );
    }
}
