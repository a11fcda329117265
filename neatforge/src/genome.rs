use crate::errors::ConfigError;

use serde::{Deserialize, Serialize};

use std::fmt;

/// Opaque genome identity.
///
/// Identities are only compared, never interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GenomeId(pub u64);

impl fmt::Display for GenomeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A monotone source of fresh [`GenomeId`]s.
///
/// # Examples
/// ```
/// use neatforge::{GenomeId, GenomeIdGenerator};
///
/// let mut ids = GenomeIdGenerator::new();
/// assert_eq!(ids.next_id(), GenomeId(0));
/// ids.observe(GenomeId(10));
/// assert_eq!(ids.next_id(), GenomeId(11));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenomeIdGenerator {
    next: u64,
}

impl GenomeIdGenerator {
    pub fn new() -> GenomeIdGenerator {
        GenomeIdGenerator { next: 0 }
    }

    /// Returns an id never returned before.
    pub fn next_id(&mut self) -> GenomeId {
        let id = GenomeId(self.next);
        self.next += 1;
        id
    }

    /// Ensures `id` will never be handed out,
    /// e.g. for externally created genomes.
    pub fn observe(&mut self, id: GenomeId) {
        self.next = self.next.max(id.0 + 1);
    }
}

/// What identity a deep copy of a genome should carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdPolicy {
    /// Keep the original's id.
    Preserve,
    /// Give the copy a new id.
    Assign(GenomeId),
}

/// Coefficients of the genetic distance between
/// two genomes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceFactors {
    /// Weight of excess genes.
    pub excess: f64,
    /// Weight of disjoint genes.
    pub disjoint: f64,
    /// Weight of the mean weight difference of matching genes.
    pub weight: f64,
    /// Whether to normalize gene counts by genome size.
    pub normalize: bool,
}

impl DistanceFactors {
    /// Checks that all coefficients are finite and non-negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (parameter, value) in [
            ("excess factor", self.excess),
            ("disjoint factor", self.disjoint),
            ("weight factor", self.weight),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { parameter });
            }
            if value < 0.0 {
                return Err(ConfigError::Negative { parameter, value });
            }
        }
        Ok(())
    }
}

impl Default for DistanceFactors {
    fn default() -> Self {
        DistanceFactors {
            excess: 1.0,
            disjoint: 1.0,
            weight: 0.4,
            normalize: false,
        }
    }
}

/// Genomes are the basic unit of evolution.
///
/// Cloning a genome must produce an independent
/// copy of the same type carrying the same id.
pub trait Genome: Clone {
    /// Returns the genome's identity.
    fn id(&self) -> GenomeId;

    /// Returns the genome re-labelled with `id`.
    fn with_id(self, id: GenomeId) -> Self;

    /// Returns an independent copy of the genome.
    fn deep_clone(&self, policy: IdPolicy) -> Self {
        match policy {
            IdPolicy::Preserve => self.clone(),
            IdPolicy::Assign(id) => self.clone().with_id(id),
        }
    }

    /// Returns the genetic distance between two genomes.
    /// Must be non-negative, symmetric, and zero between
    /// a genome and itself.
    fn genetic_distance(&self, other: &Self, factors: &DistanceFactors) -> f64;

    /// Size of the genome, used to break ties between
    /// otherwise equivalent candidates (bigger wins).
    fn complexity(&self) -> usize;
}
