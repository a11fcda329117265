use crate::genome::Genome;

use std::fmt;
use std::sync::Arc;

/// A population member: a genome together with
/// whatever is needed to evaluate it.
///
/// Members also act as templates for their offspring
/// through [`with_genome`](SpeciesMember::with_genome).
pub trait SpeciesMember: Clone {
    type Genome: Genome;

    fn genome(&self) -> &Self::Genome;

    /// Evaluates the member's fitness. Must not return NaN.
    fn compute_fitness(&self) -> f64;

    /// Returns a new member of the same kind carrying `genome`.
    fn with_genome(&self, genome: Self::Genome) -> Self;
}

/// A genome paired with a shared fitness function.
///
/// # Examples
/// ```
/// # use neatforge::{DistanceFactors, Genome, GenomeId};
/// use neatforge::{Member, SpeciesMember};
/// use std::sync::Arc;
///
/// # #[derive(Clone)]
/// # struct Point(GenomeId, f64);
/// # impl Genome for Point {
/// #     fn id(&self) -> GenomeId { self.0 }
/// #     fn with_id(self, id: GenomeId) -> Self { Point(id, self.1) }
/// #     fn genetic_distance(&self, other: &Self, _: &DistanceFactors) -> f64 { (self.1 - other.1).abs() }
/// #     fn complexity(&self) -> usize { 0 }
/// # }
/// let fitness = Arc::new(|p: &Point| -p.1.abs());
/// let member = Member::new(Point(GenomeId(0), 2.0), fitness);
/// assert_eq!(member.compute_fitness(), -2.0);
///
/// let child = member.with_genome(Point(GenomeId(1), 0.5));
/// assert_eq!(child.compute_fitness(), -0.5);
/// ```
pub struct Member<G, F> {
    genome: G,
    fitness_function: Arc<F>,
}

impl<G, F> Member<G, F> {
    pub fn new(genome: G, fitness_function: Arc<F>) -> Member<G, F> {
        Member {
            genome,
            fitness_function,
        }
    }

    pub fn into_genome(self) -> G {
        self.genome
    }
}

impl<G: Clone, F> Clone for Member<G, F> {
    fn clone(&self) -> Self {
        Member {
            genome: self.genome.clone(),
            fitness_function: Arc::clone(&self.fitness_function),
        }
    }
}

impl<G: fmt::Debug, F> fmt::Debug for Member<G, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member").field("genome", &self.genome).finish()
    }
}

impl<G, F> SpeciesMember for Member<G, F>
where
    G: Genome,
    F: Fn(&G) -> f64,
{
    type Genome = G;

    fn genome(&self) -> &G {
        &self.genome
    }

    fn compute_fitness(&self) -> f64 {
        (self.fitness_function)(&self.genome)
    }

    fn with_genome(&self, genome: G) -> Self {
        Member {
            genome,
            fitness_function: Arc::clone(&self.fitness_function),
        }
    }
}
