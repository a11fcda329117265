//! Partitioning of items into clusters around medoids,
//! using a precomputed distance matrix.
//!
//! Initial medoids are chosen following
//! [Park & Jun, 2009](https://doi.org/10.1016/j.eswa.2008.01.039):
//! items are scored by `v_j = Σ_i d(i, j) / Σ_l d(i, l)`, and the
//! `k` lowest-scoring items become medoids. Clusters are then
//! improved by alternating medoid updates and reassignment for
//! as long as the total distance strictly decreases.
use crate::errors::KMedoidsError;

/// A cluster of item indices around a medoid.
/// The medoid is always one of the members.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cluster {
    medoid: usize,
    members: Vec<usize>,
}

impl Cluster {
    pub fn medoid(&self) -> usize {
        self.medoid
    }

    /// Members in ascending index order.
    pub fn members(&self) -> &[usize] {
        &self.members
    }
}

/// The result of a clustering run.
#[derive(Clone, Debug, PartialEq)]
pub struct Clustering {
    pub clusters: Vec<Cluster>,
    /// Sum of each item's distance to its medoid.
    pub total_distance: f64,
    /// Number of accepted improvement steps.
    pub iterations: usize,
}

/// K-medoids clustering over a distance function.
///
/// # Examples
/// ```
/// use neatforge::KMedoids;
///
/// let points = [0.0, 0.1, 0.2, 10.0, 10.1];
/// let clustering = KMedoids::new(|a: &f64, b: &f64| (a - b).abs())
///     .compute(&points, 2)
///     .unwrap();
///
/// let mut sizes: Vec<usize> = clustering.clusters.iter().map(|c| c.members().len()).collect();
/// sizes.sort();
/// assert_eq!(sizes, vec![2, 3]);
/// ```
#[derive(Clone, Debug)]
pub struct KMedoids<D> {
    distance: D,
}

impl<D> KMedoids<D> {
    pub fn new(distance: D) -> KMedoids<D> {
        KMedoids { distance }
    }

    /// Partitions `items` into `k` clusters.
    ///
    /// # Errors
    /// Fails if `items` is empty, `k` is 0 or greater than
    /// the number of items, or a distance is NaN.
    pub fn compute<T>(&self, items: &[T], k: usize) -> Result<Clustering, KMedoidsError>
    where
        D: Fn(&T, &T) -> f64,
    {
        if items.is_empty() {
            return Err(KMedoidsError::NoItems);
        }
        if k == 0 || k > items.len() {
            return Err(KMedoidsError::InvalidClusterCount {
                clusters: k,
                items: items.len(),
            });
        }
        let matrix = DistanceMatrix::new(items, &self.distance)?;
        let medoids = matrix.initial_medoids(k);
        let (clusters, total) = matrix.assign(&medoids);
        Ok(matrix.improve(medoids, clusters, total, 0))
    }

    /// Improves an existing partition of `items`, given
    /// as one list of item indices per cluster. Seed
    /// clusters may be empty, in which case they are
    /// refilled with outliers taken from other clusters.
    ///
    /// The first update is always accepted, so the
    /// result is a valid clustering even if it is worse
    /// than the seed partition.
    ///
    /// # Errors
    /// Fails if `items` is empty, there are no seed
    /// clusters or more clusters than items, the seeds
    /// are not a partition of `0..items.len()`, a distance
    /// is NaN, or an empty cluster cannot be refilled.
    pub fn refine<T>(&self, items: &[T], seeds: Vec<Vec<usize>>) -> Result<Clustering, KMedoidsError>
    where
        D: Fn(&T, &T) -> f64,
    {
        if items.is_empty() {
            return Err(KMedoidsError::NoItems);
        }
        if seeds.is_empty() || seeds.len() > items.len() {
            return Err(KMedoidsError::InvalidClusterCount {
                clusters: seeds.len(),
                items: items.len(),
            });
        }
        let mut seen = vec![false; items.len()];
        for &item in seeds.iter().flatten() {
            if item >= items.len() || seen[item] {
                return Err(KMedoidsError::InvalidSeed { item });
            }
            seen[item] = true;
        }
        if let Some(item) = seen.iter().position(|s| !s) {
            return Err(KMedoidsError::InvalidSeed { item });
        }

        let matrix = DistanceMatrix::new(items, &self.distance)?;
        let mut seeds = seeds;
        seeds.iter_mut().for_each(|c| c.sort_unstable());
        let medoids = matrix.update_medoids(&seeds)?;
        let (clusters, total) = matrix.assign(&medoids);
        Ok(matrix.improve(medoids, clusters, total, 1))
    }
}

struct DistanceMatrix {
    size: usize,
    values: Vec<f64>,
}

impl DistanceMatrix {
    fn new<T, D>(items: &[T], distance: &D) -> Result<DistanceMatrix, KMedoidsError>
    where
        D: Fn(&T, &T) -> f64,
    {
        let size = items.len();
        let mut values = vec![0.0; size * size];
        for i in 0..size {
            for j in i + 1..size {
                let d = distance(&items[i], &items[j]);
                if d.is_nan() {
                    return Err(KMedoidsError::InvalidDistance {
                        first: i,
                        second: j,
                    });
                }
                values[i * size + j] = d;
                values[j * size + i] = d;
            }
        }
        Ok(DistanceMatrix { size, values })
    }

    fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }

    fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.size..(i + 1) * self.size]
    }

    fn initial_medoids(&self, k: usize) -> Vec<usize> {
        let row_sums: Vec<f64> = (0..self.size).map(|i| self.row(i).iter().sum()).collect();
        let scores: Vec<f64> = (0..self.size)
            .map(|j| {
                (0..self.size)
                    .filter(|&i| row_sums[i] != 0.0)
                    .map(|i| self.get(i, j) / row_sums[i])
                    .sum()
            })
            .collect();
        let mut order: Vec<usize> = (0..self.size).collect();
        order.sort_by(|a, b| scores[*a].total_cmp(&scores[*b]));
        order.truncate(k);
        order
    }

    /// Assigns every item to its nearest medoid (ties to
    /// the lowest cluster), returning the clusters and
    /// their total distance.
    fn assign(&self, medoids: &[usize]) -> (Vec<Vec<usize>>, f64) {
        let mut clusters = vec![vec![]; medoids.len()];
        let mut total = 0.0;
        for item in 0..self.size {
            let cluster = match medoids.iter().position(|&m| m == item) {
                Some(c) => c,
                None => {
                    let mut best = 0;
                    for c in 1..medoids.len() {
                        if self.get(item, medoids[c]) < self.get(item, medoids[best]) {
                            best = c;
                        }
                    }
                    best
                }
            };
            total += self.get(item, medoids[cluster]);
            clusters[cluster].push(item);
        }
        (clusters, total)
    }

    /// Computes each cluster's medoid. Empty clusters take
    /// the unclaimed item farthest from its own medoid.
    fn update_medoids(&self, clusters: &[Vec<usize>]) -> Result<Vec<usize>, KMedoidsError> {
        let mut medoids: Vec<Option<usize>> = clusters
            .iter()
            .map(|members| {
                members.iter().copied().min_by(|a, b| {
                    let cost = |c: usize| members.iter().map(|&m| self.get(c, m)).sum::<f64>();
                    cost(*a).total_cmp(&cost(*b))
                })
            })
            .collect();

        for empty in 0..clusters.len() {
            if medoids[empty].is_some() {
                continue;
            }
            let mut outlier: Option<(usize, f64)> = None;
            for (c, members) in clusters.iter().enumerate() {
                let medoid = match medoids[c] {
                    Some(m) => m,
                    None => continue,
                };
                for &item in members {
                    if medoids.contains(&Some(item)) {
                        continue;
                    }
                    let d = self.get(item, medoid);
                    if outlier.map_or(true, |(_, best)| d > best) {
                        outlier = Some((item, d));
                    }
                }
            }
            match outlier {
                Some((item, _)) => medoids[empty] = Some(item),
                None => return Err(KMedoidsError::NoOutlierAvailable { cluster: empty }),
            }
        }
        Ok(medoids.into_iter().flatten().collect())
    }

    /// Alternates medoid updates and reassignment while
    /// the total distance strictly decreases.
    fn improve(
        &self,
        mut medoids: Vec<usize>,
        mut clusters: Vec<Vec<usize>>,
        mut total: f64,
        mut iterations: usize,
    ) -> Clustering {
        loop {
            // Clusters built by `assign` are never empty.
            let candidate = match self.update_medoids(&clusters) {
                Ok(c) => c,
                Err(_) => break,
            };
            let (candidate_clusters, candidate_total) = self.assign(&candidate);
            if candidate_total < total {
                medoids = candidate;
                clusters = candidate_clusters;
                total = candidate_total;
                iterations += 1;
            } else {
                break;
            }
        }
        Clustering {
            clusters: medoids
                .into_iter()
                .zip(clusters)
                .map(|(medoid, members)| Cluster { medoid, members })
                .collect(),
            total_distance: total,
            iterations,
        }
    }
}
