//! Fitness-based parent selection strategies.
use crate::distribution::WeightedDistribution;
use crate::errors::{ConfigError, SelectionError};

use rand::Rng;
use serde::{Deserialize, Serialize};

use std::cmp::Ordering;

/// An item paired with its fitness.
///
/// Fitness values must be finite; ordering
/// between items is by fitness only (see
/// [`FitnessItem::cmp_by_fitness`]).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FitnessItem<T> {
    item: T,
    fitness: f64,
}

impl<T> FitnessItem<T> {
    /// Pairs `item` with `fitness`.
    ///
    /// # Errors
    /// Fails if `fitness` is NaN or infinite.
    ///
    /// # Examples
    /// ```
    /// use neatforge::FitnessItem;
    ///
    /// assert!(FitnessItem::new("a", 1.5).is_ok());
    /// assert!(FitnessItem::new("a", f64::NAN).is_err());
    /// ```
    pub fn new(item: T, fitness: f64) -> Result<FitnessItem<T>, SelectionError> {
        if fitness.is_finite() {
            Ok(FitnessItem { item, fitness })
        } else {
            Err(SelectionError::InvalidFitness(fitness))
        }
    }

    pub fn item(&self) -> &T {
        &self.item
    }

    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    pub fn into_item(self) -> T {
        self.item
    }

    /// Total ordering by fitness.
    pub fn cmp_by_fitness(&self, other: &FitnessItem<T>) -> Ordering {
        self.fitness.total_cmp(&other.fitness)
    }
}

/// A rule turning fitness values into selection
/// weights for a [`WeightedDistribution`].
pub trait SelectionStrategy {
    /// Maps each fitness to a non-negative weight.
    /// The output has the same length and order as the input.
    fn weights(&self, fitnesses: &[f64]) -> Vec<f64>;

    /// Whether sampling should be done per value group,
    /// so that ties do not multiply a weight.
    fn requires_grouping(&self) -> bool;

    /// Builds a distribution over the items passing `filter`.
    ///
    /// # Errors
    /// Fails if no items pass the filter.
    fn distribution<T, F>(
        &self,
        items: &[FitnessItem<T>],
        filter: F,
    ) -> Result<WeightedDistribution<T>, SelectionError>
    where
        T: Clone,
        F: Fn(&T) -> bool,
    {
        let candidates: Vec<&FitnessItem<T>> = items.iter().filter(|i| filter(&i.item)).collect();
        let fitnesses: Vec<f64> = candidates.iter().map(|i| i.fitness).collect();
        let weights = self.weights(&fitnesses);
        Ok(WeightedDistribution::new(
            candidates.into_iter().map(|i| i.item.clone()).zip(weights),
        )?)
    }

    /// Draws `count` distinct items.
    ///
    /// # Errors
    /// Fails if fewer than `count` items are available.
    fn select<T, R>(
        &self,
        items: &[FitnessItem<T>],
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<T>, SelectionError>
    where
        T: Clone + PartialEq,
        R: Rng + ?Sized,
    {
        let selected = self.try_select(items, count, rng)?;
        if selected.len() < count {
            Err(SelectionError::InsufficientCandidates {
                requested: count,
                selected: selected.len(),
            })
        } else {
            Ok(selected)
        }
    }

    /// Draws up to `count` distinct items, returning
    /// as many as could be drawn.
    fn try_select<T, R>(
        &self,
        items: &[FitnessItem<T>],
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<T>, SelectionError>
    where
        T: Clone + PartialEq,
        R: Rng + ?Sized,
    {
        if count == 0 || items.is_empty() {
            return Ok(vec![]);
        }
        let distribution = self.distribution(items, |_| true)?;
        Ok(draw_without_replacement(
            distribution,
            count,
            self.requires_grouping(),
            rng,
        ))
    }
}

/// Draws up to `count` outcomes from `distribution`,
/// never drawing the same outcome twice.
pub fn draw_without_replacement<T, R>(
    distribution: WeightedDistribution<T>,
    count: usize,
    grouped: bool,
    rng: &mut R,
) -> Vec<T>
where
    T: Clone + PartialEq,
    R: Rng + ?Sized,
{
    let mut selected = Vec::with_capacity(count);
    let mut remaining = Some(distribution);
    while selected.len() < count {
        let distribution = match remaining.take() {
            Some(d) => d,
            None => break,
        };
        let outcome = distribution.sample(rng, grouped).clone();
        remaining = distribution.remove_outcome(&outcome).ok();
        selected.push(outcome);
    }
    selected
}

/// Fitness-proportionate selection, with fitnesses
/// shifted so that the worst has weight 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RouletteWheel;

impl SelectionStrategy for RouletteWheel {
    fn weights(&self, fitnesses: &[f64]) -> Vec<f64> {
        let min = fitnesses.iter().copied().fold(f64::INFINITY, f64::min);
        let max = fitnesses.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if (max - min).is_finite() {
            fitnesses.iter().map(|f| f - min).collect()
        } else {
            // The spread exceeds f64::MAX.
            fitnesses.iter().map(|f| f / 2.0 - min / 2.0).collect()
        }
    }

    fn requires_grouping(&self) -> bool {
        false
    }
}

/// Rank-based selection with linearly decreasing weights.
///
/// A pressure of 0 selects uniformly, a pressure of 1
/// only ever selects the best-ranked items.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearRanking {
    pressure: f64,
}

impl LinearRanking {
    /// # Errors
    /// Fails if `pressure` is not within `[0, 1]`.
    pub fn new(pressure: f64) -> Result<LinearRanking, ConfigError> {
        check_pressure(pressure)?;
        Ok(LinearRanking { pressure })
    }

    pub fn pressure(&self) -> f64 {
        self.pressure
    }
}

impl SelectionStrategy for LinearRanking {
    fn weights(&self, fitnesses: &[f64]) -> Vec<f64> {
        let n = fitnesses.len();
        ranks(fitnesses)
            .into_iter()
            .map(|rank| {
                if self.pressure >= 1.0 {
                    return if rank == n { 1.0 } else { 0.0 };
                }
                let x = normalized_rank(rank, n);
                let slope = self.pressure / (1.0 - self.pressure);
                (1.0 + (x - 1.0) * slope).max(0.0)
            })
            .collect()
    }

    fn requires_grouping(&self) -> bool {
        true
    }
}

/// Rank-based selection with exponentially decreasing weights:
/// each rank step down multiplies the weight by `1 - pressure`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExponentialRanking {
    pressure: f64,
}

impl ExponentialRanking {
    /// # Errors
    /// Fails if `pressure` is not within `[0, 1]`.
    pub fn new(pressure: f64) -> Result<ExponentialRanking, ConfigError> {
        check_pressure(pressure)?;
        Ok(ExponentialRanking { pressure })
    }

    pub fn pressure(&self) -> f64 {
        self.pressure
    }
}

impl SelectionStrategy for ExponentialRanking {
    fn weights(&self, fitnesses: &[f64]) -> Vec<f64> {
        let n = fitnesses.len();
        let base = 1.0 - self.pressure;
        ranks(fitnesses)
            .into_iter()
            // (1 - x)(N - 1) == N - rank
            .map(|rank| base.powi((n - rank) as i32))
            .collect()
    }

    fn requires_grouping(&self) -> bool {
        true
    }
}

fn check_pressure(pressure: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&pressure) {
        Ok(())
    } else {
        Err(ConfigError::Probability {
            parameter: "selection pressure",
            value: pressure,
        })
    }
}

/// 1-based ascending ranks, where tied fitnesses
/// share the highest rank of their group.
fn ranks(fitnesses: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..fitnesses.len()).collect();
    order.sort_by(|a, b| fitnesses[*a].total_cmp(&fitnesses[*b]));
    let mut ranks = vec![0; fitnesses.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && fitnesses[order[end]] == fitnesses[order[start]] {
            end += 1;
        }
        for &i in &order[start..end] {
            ranks[i] = end;
        }
        start = end;
    }
    ranks
}

/// Maps a rank in `1..=n` to `[0, 1]`.
fn normalized_rank(rank: usize, n: usize) -> f64 {
    if n <= 1 {
        1.0
    } else {
        (rank - 1) as f64 / (n - 1) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn items(fitnesses: &[f64]) -> Vec<FitnessItem<usize>> {
        fitnesses
            .iter()
            .enumerate()
            .map(|(i, f)| FitnessItem::new(i, *f).unwrap())
            .collect()
    }

    #[test]
    fn ranks_share_highest_rank_on_ties() {
        assert_eq!(ranks(&[3.0, 1.0, 3.0, 2.0]), vec![4, 1, 4, 2]);
        assert_eq!(ranks(&[5.0]), vec![1]);
    }

    #[test]
    fn roulette_weights() {
        assert_eq!(RouletteWheel.weights(&[2.0, -1.0, 0.5]), vec![3.0, 0.0, 1.5]);
    }

    #[test]
    fn roulette_weights_survive_extreme_spreads() {
        let w = RouletteWheel.weights(&[1e308, -1e308, 0.0]);
        assert_eq!(w, vec![1e308, 0.0, 5e307]);
        assert!(w.iter().all(|w| w.is_finite()));
    }

    fn strategies() -> (RouletteWheel, LinearRanking, ExponentialRanking) {
        (
            RouletteWheel,
            LinearRanking::new(0.6).unwrap(),
            ExponentialRanking::new(0.6).unwrap(),
        )
    }

    fn check_degenerate<S: SelectionStrategy>(strategy: &S) {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        for fitnesses in [
            vec![0.0; 5],
            vec![3.5; 5],
            vec![f64::MAX, -f64::MAX, 0.0, f64::MAX, 1.0],
            vec![1e308, -1e308],
        ] {
            let items = items(&fitnesses);
            let weights = strategy.weights(&fitnesses);
            assert!(weights.iter().all(|w| w.is_finite() && *w >= 0.0));
            for count in 1..=fitnesses.len() {
                let mut selected = strategy.select(&items, count, &mut rng).unwrap();
                selected.sort_unstable();
                selected.dedup();
                assert_eq!(selected.len(), count);
            }
        }
    }

    #[test]
    fn degenerate_fitnesses_select() {
        let (roulette, linear, exponential) = strategies();
        check_degenerate(&roulette);
        check_degenerate(&linear);
        check_degenerate(&exponential);
    }

    #[test]
    fn pressure_bounds() {
        assert!(LinearRanking::new(-0.1).is_err());
        assert!(LinearRanking::new(1.1).is_err());
        assert!(ExponentialRanking::new(f64::NAN).is_err());
        assert!(ExponentialRanking::new(1.0).is_ok());
    }

    #[test]
    fn linear_ranking_boundaries() {
        let f = [1.0, 4.0, 2.0, 3.0];
        assert_eq!(LinearRanking::new(0.0).unwrap().weights(&f), vec![1.0; 4]);
        assert_eq!(
            LinearRanking::new(1.0).unwrap().weights(&f),
            vec![0.0, 1.0, 0.0, 0.0]
        );
        let w = LinearRanking::new(0.5).unwrap().weights(&f);
        // slope 1: x = 0, 1/3, 2/3, 1
        assert_eq!(w[1], 1.0);
        assert_eq!(w[0], 0.0);
        assert!((w[2] - 1.0 / 3.0).abs() < 1e-12);
        assert!((w[3] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn exponential_ranking_boundaries() {
        let f = [1.0, 4.0, 2.0, 3.0];
        assert_eq!(ExponentialRanking::new(0.0).unwrap().weights(&f), vec![1.0; 4]);
        assert_eq!(
            ExponentialRanking::new(1.0).unwrap().weights(&f),
            vec![0.0, 1.0, 0.0, 0.0]
        );
        let w = ExponentialRanking::new(0.5).unwrap().weights(&f);
        assert_eq!(w, vec![0.125, 1.0, 0.25, 0.5]);
    }

    #[test]
    fn exponential_ranking_is_monotone_in_pressure() {
        let f = [1.0, 2.0, 3.0, 4.0, 5.0];
        let share_of_best = |p: f64| {
            let w = ExponentialRanking::new(p).unwrap().weights(&f);
            w[4] / w.iter().sum::<f64>()
        };
        let mut last = share_of_best(0.0);
        for p in [0.2, 0.4, 0.6, 0.8, 1.0] {
            let share = share_of_best(p);
            assert!(share > last);
            last = share;
        }
        assert_eq!(last, 1.0);
    }

    #[test]
    fn single_item_rankings() {
        assert_eq!(LinearRanking::new(0.7).unwrap().weights(&[2.0]), vec![1.0]);
        assert_eq!(ExponentialRanking::new(0.7).unwrap().weights(&[2.0]), vec![1.0]);
    }

    #[test]
    fn select_draws_distinct_items() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let items = items(&[1.0, 2.0, 3.0, 4.0]);
        let strategy = LinearRanking::new(0.3).unwrap();
        for _ in 0..100 {
            let mut selected = strategy.select(&items, 4, &mut rng).unwrap();
            selected.sort_unstable();
            assert_eq!(selected, vec![0, 1, 2, 3]);
        }
    }

    #[test]
    fn select_fails_when_short_of_candidates() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let items = items(&[1.0, 2.0]);
        assert_eq!(
            RouletteWheel.select(&items, 3, &mut rng).unwrap_err(),
            SelectionError::InsufficientCandidates {
                requested: 3,
                selected: 2
            }
        );
        assert_eq!(RouletteWheel.try_select(&items, 3, &mut rng).unwrap().len(), 2);
        assert!(RouletteWheel.try_select(&items[..0], 1, &mut rng).unwrap().is_empty());
    }

    #[test]
    fn best_only_pressure_always_picks_the_best() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let items = items(&[0.1, 0.9, 0.5]);
        let strategy = LinearRanking::new(1.0).unwrap();
        for _ in 0..50 {
            assert_eq!(strategy.select(&items, 1, &mut rng).unwrap(), vec![1]);
        }
    }

    #[test]
    fn distribution_filter() {
        let items = items(&[1.0, 2.0, 3.0]);
        let d = RouletteWheel.distribution(&items, |i| *i != 1).unwrap();
        assert_eq!(d.len(), 2);
        assert!(RouletteWheel.distribution(&items, |_| false).is_err());
    }
}
