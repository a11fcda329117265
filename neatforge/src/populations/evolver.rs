use super::*;
use crate::distribution::WeightedDistribution;
use crate::errors::EvolutionError;
use crate::genome::{Genome, GenomeId, GenomeIdGenerator};
use crate::selection::{draw_without_replacement, FitnessItem, SelectionStrategy};
use crate::speciation::SpeciationStrategy;

use rand::Rng;

use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};

/// A source of new genomes: random ones for initial
/// populations, and offspring of one or two parents.
///
/// Implementors may keep per-generation state (such as
/// an innovation history), which is reset through
/// [`begin_generation`](Reproduction::begin_generation).
pub trait Reproduction {
    type Genome: Genome;
    type Error: Error + Send + Sync + 'static;

    /// Called once before any offspring of `generation`
    /// is created.
    fn begin_generation(&mut self, generation: usize);

    /// Returns a new random genome.
    fn create_genome<R: Rng + ?Sized>(
        &mut self,
        id: GenomeId,
        rng: &mut R,
    ) -> Result<Self::Genome, Self::Error>;

    /// Returns a (usually mutated) copy of `parent`.
    fn create_offspring_asexual<R: Rng + ?Sized>(
        &mut self,
        parent: &Self::Genome,
        id: GenomeId,
        rng: &mut R,
    ) -> Result<Self::Genome, Self::Error>;

    /// Returns a combination of both parents.
    /// `fitter` is at least as fit as `other`.
    fn create_offspring_sexual<R: Rng + ?Sized>(
        &mut self,
        fitter: &Self::Genome,
        other: &Self::Genome,
        id: GenomeId,
        rng: &mut R,
    ) -> Result<Self::Genome, Self::Error>;
}

/// The outcome of [`Evolver::solve`].
#[derive(Debug, Clone)]
pub struct Solution<M> {
    /// The fittest member of the last population.
    pub best_match: M,
    pub best_fitness: f64,
    /// Generations evolved.
    pub iterations: usize,
    /// Whether `best_fitness` reached the target.
    pub success: bool,
    /// The last population.
    pub population: Population<M>,
}

/// Generational evolution engine.
///
/// Every generation, each species is allotted a share of
/// the next population proportional to its mean fitness.
/// Each species fills its share with its elite, copied
/// unchanged, and with asexual, sexual and interspecies
/// offspring in the configured proportions. Parents are
/// picked with the selection strategy `S`, offspring are
/// created by the reproduction `F`, and the new members
/// are grouped into species with the speciation strategy `P`.
pub struct Evolver<S, P, F> {
    parameters: EvolutionParameters,
    selection: S,
    speciation: P,
    reproduction: F,
    genome_ids: GenomeIdGenerator,
}

/// Fitness-sorted view of one species during offspring generation.
struct Parents<'a, M> {
    index: usize,
    members: &'a [M],
    distribution: WeightedDistribution<usize>,
    ranked: Vec<usize>,
}

impl<S, P, F> Evolver<S, P, F>
where
    S: SelectionStrategy,
    P: SpeciationStrategy,
    F: Reproduction,
{
    /// # Errors
    /// Fails if `parameters` are invalid.
    pub fn new(
        parameters: EvolutionParameters,
        selection: S,
        speciation: P,
        reproduction: F,
    ) -> Result<Evolver<S, P, F>, EvolutionError> {
        parameters.validate()?;
        Ok(Evolver {
            parameters,
            selection,
            speciation,
            reproduction,
            genome_ids: GenomeIdGenerator::new(),
        })
    }

    pub fn parameters(&self) -> &EvolutionParameters {
        &self.parameters
    }

    pub fn reproduction(&self) -> &F {
        &self.reproduction
    }

    pub fn speciation(&self) -> &P {
        &self.speciation
    }

    /// Creates `count` random genomes with fresh ids.
    pub fn spawn_genomes<R: Rng + ?Sized>(
        &mut self,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<F::Genome>, EvolutionError> {
        self.reproduction.begin_generation(0);
        (0..count)
            .map(|_| {
                let id = self.genome_ids.next_id();
                self.reproduction
                    .create_genome(id, rng)
                    .map_err(reproduction_error)
            })
            .collect()
    }

    /// Speciates `members` into a generation 0 population.
    ///
    /// # Errors
    /// Fails if `members` is empty or speciation fails.
    pub fn create_new_population<M>(&mut self, members: Vec<M>) -> Result<Population<M>, EvolutionError>
    where
        M: SpeciesMember<Genome = F::Genome>,
    {
        if members.is_empty() {
            return Err(EvolutionError::InvalidInput(
                "cannot create an empty population".into(),
            ));
        }
        for m in &members {
            self.genome_ids.observe(m.genome().id());
        }
        let species = self.speciation.speciate(members, None, 0)?;
        Population::new(0, species)
    }

    /// Evaluates `population` and evolves it into the next generation.
    pub fn evolve<M, R>(&mut self, population: &Population<M>, rng: &mut R) -> Result<Population<M>, EvolutionError>
    where
        M: SpeciesMember<Genome = F::Genome>,
        R: Rng + ?Sized,
    {
        let snapshot = FitnessSnapshot::compute(population)?;
        self.evolve_with(population, &snapshot, rng)
    }

    /// Evolves `population` into the next generation using
    /// already evaluated fitnesses. The new population has
    /// the same number of members.
    ///
    /// # Errors
    /// Fails if `snapshot` does not belong to `population`,
    /// if selection, reproduction or speciation fail, or if
    /// the number of offspring doesn't match the population size.
    pub fn evolve_with<M, R>(
        &mut self,
        population: &Population<M>,
        snapshot: &FitnessSnapshot,
        rng: &mut R,
    ) -> Result<Population<M>, EvolutionError>
    where
        M: SpeciesMember<Genome = F::Genome>,
        R: Rng + ?Sized,
    {
        let shape_matches = snapshot.species_count() == population.species().len()
            && (0..snapshot.species_count())
                .all(|s| snapshot.species_len(s) == population.species()[s].len());
        if !shape_matches {
            return Err(EvolutionError::InvalidInput(
                "fitness snapshot does not belong to the population".into(),
            ));
        }

        let generation = population.generation() + 1;
        self.reproduction.begin_generation(generation);

        let allotment = self.allot_offspring(population, snapshot);
        let mut offspring = Vec::with_capacity(population.member_count());
        for (s, slots) in allotment.iter().copied().enumerate() {
            if slots > 0 {
                self.generate_species_offspring(population, snapshot, s, slots, &mut offspring, rng)?;
            }
        }

        if offspring.len() != population.member_count() {
            return Err(EvolutionError::InvariantViolation(format!(
                "generated {} offspring for a population of {}",
                offspring.len(),
                population.member_count()
            )));
        }

        let species = self
            .speciation
            .speciate(offspring, Some(population), generation)?;
        let next = Population::new(generation, species)?;
        log::info!(
            "generation {}: best fitness {:.4}, mean fitness {:.4}, {} species",
            population.generation(),
            snapshot.best_fitness(),
            snapshot.mean_fitness(),
            next.species().len()
        );
        Ok(next)
    }

    /// Evolves `initial` until a member reaches `min_fitness`
    /// or `max_iterations` generations have passed
    /// (0 meaning no limit).
    pub fn solve<M, R>(
        &mut self,
        initial: Population<M>,
        max_iterations: usize,
        min_fitness: f64,
        rng: &mut R,
    ) -> Result<Solution<M>, EvolutionError>
    where
        M: SpeciesMember<Genome = F::Genome>,
        R: Rng + ?Sized,
    {
        self.solve_cancellable(initial, max_iterations, min_fitness, &AtomicBool::new(false), rng)
    }

    /// Like [`solve`](Evolver::solve), but also stops
    /// once `cancel` is set. The flag is checked once
    /// per generation.
    pub fn solve_cancellable<M, R>(
        &mut self,
        initial: Population<M>,
        max_iterations: usize,
        min_fitness: f64,
        cancel: &AtomicBool,
        rng: &mut R,
    ) -> Result<Solution<M>, EvolutionError>
    where
        M: SpeciesMember<Genome = F::Genome>,
        R: Rng + ?Sized,
    {
        let mut population = initial;
        let mut iterations = 0;
        loop {
            let snapshot = FitnessSnapshot::compute(&population)?;
            let best_fitness = snapshot.best_fitness();
            let success = best_fitness >= min_fitness;
            let exhausted = max_iterations != 0 && iterations >= max_iterations;
            if success || exhausted || cancel.load(Ordering::Relaxed) {
                log::info!(
                    "stopped after {} generations with best fitness {:.4}",
                    iterations,
                    best_fitness
                );
                return Ok(Solution {
                    best_match: population.champion(&snapshot).clone(),
                    best_fitness,
                    iterations,
                    success,
                    population,
                });
            }
            population = self.evolve_with(&population, &snapshot, rng)?;
            iterations += 1;
        }
    }

    /// Computes how many members of the next generation
    /// each species produces.
    fn allot_offspring<M>(&self, population: &Population<M>, snapshot: &FitnessSnapshot) -> Vec<usize> {
        let total = population.member_count();
        let species_count = population.species().len();
        let shift = (-snapshot.min_fitness()).max(0.0);
        // Halved and scaled to [0, 1], keeping shares
        // of extreme fitnesses and their sum finite.
        let shares: Vec<f64> = (0..species_count)
            .map(|s| snapshot.species_mean(s) / 2.0 + shift / 2.0)
            .collect();
        let top = shares.iter().copied().fold(0.0, f64::max);
        let shares: Vec<f64> = if top > 0.0 {
            shares.iter().map(|f| f / top).collect()
        } else {
            shares
        };
        let share_sum: f64 = shares.iter().sum();
        let values: Vec<f64> = if share_sum > 0.0 {
            shares.iter().map(|f| f / share_sum * total as f64).collect()
        } else {
            vec![total as f64 / species_count as f64; species_count]
        };
        let mut allotment = round_retain_sum(&values, total);

        // The champion's species is never driven extinct.
        let (champion_species, _) = snapshot.best();
        if allotment[champion_species] == 0 {
            let mut donor = 0;
            for (s, slots) in allotment.iter().enumerate() {
                if *slots > allotment[donor] {
                    donor = s;
                }
            }
            allotment[donor] -= 1;
            allotment[champion_species] += 1;
        }
        allotment
    }

    /// Fills `slots` offspring of the `s`-th species.
    fn generate_species_offspring<M, R>(
        &mut self,
        population: &Population<M>,
        snapshot: &FitnessSnapshot,
        s: usize,
        slots: usize,
        offspring: &mut Vec<M>,
        rng: &mut R,
    ) -> Result<(), EvolutionError>
    where
        M: SpeciesMember<Genome = F::Genome>,
        R: Rng + ?Sized,
    {
        let species_count = population.species().len();
        let parents = Parents {
            index: s,
            members: population.species()[s].members(),
            distribution: self
                .selection
                .distribution(snapshot.species_fitness(s), |_| true)?,
            ranked: snapshot.ranked_members(s),
        };
        let size = parents.members.len();

        let elites = self
            .parameters
            .elite_copies
            .max((self.parameters.elite_proportion * size as f64).round() as usize)
            .min(slots)
            .min(size);
        offspring.extend(parents.ranked[..elites].iter().map(|&m| parents.members[m].clone()));

        let remaining = (slots - elites) as f64;
        let split = round_retain_sum(
            &[
                remaining * self.parameters.asexual_proportion,
                remaining * self.parameters.sexual_proportion,
                remaining * self.parameters.interspecies_sexual_proportion,
            ],
            slots - elites,
        );
        let (mut asexual, mut sexual, mut interspecies) = (split[0], split[1], split[2]);
        if species_count < 2 {
            sexual += interspecies;
            interspecies = 0;
        }
        if size < 2 {
            asexual += sexual;
            sexual = 0;
        }

        let grouped = self.selection.requires_grouping();
        for _ in 0..asexual {
            let parent = &parents.members[*parents.distribution.sample(rng, grouped)];
            let id = self.genome_ids.next_id();
            let child = self
                .reproduction
                .create_offspring_asexual(parent.genome(), id, rng)
                .map_err(reproduction_error)?;
            offspring.push(parent.with_genome(child));
        }

        for _ in 0..sexual {
            let pair = draw_without_replacement(parents.distribution.clone(), 2, grouped, rng);
            if pair.len() < 2 {
                return Err(EvolutionError::InvariantViolation(format!(
                    "species {:?} could not provide two parents",
                    population.species()[s].id()
                )));
            }
            let (first, second) = ((s, pair[0]), (s, pair[1]));
            offspring.push(self.mate(population, snapshot, first, second, rng)?);
        }

        if interspecies > 0 {
            let others = self.other_species_distribution(population, snapshot, &parents)?;
            for _ in 0..interspecies {
                let first = (s, *parents.distribution.sample(rng, grouped));
                let second = *others.sample(rng, grouped);
                offspring.push(self.mate(population, snapshot, first, second, rng)?);
            }
        }
        Ok(())
    }

    /// Builds a selection distribution over the members
    /// of every species but `parents`'.
    fn other_species_distribution<M>(
        &self,
        population: &Population<M>,
        snapshot: &FitnessSnapshot,
        parents: &Parents<'_, M>,
    ) -> Result<WeightedDistribution<(usize, usize)>, EvolutionError> {
        let mut items = Vec::with_capacity(population.member_count());
        for s in (0..population.species().len()).filter(|s| *s != parents.index) {
            for item in snapshot.species_fitness(s) {
                items.push(FitnessItem::new((s, *item.item()), item.fitness())?);
            }
        }
        Ok(self.selection.distribution(&items, |_| true)?)
    }

    /// Creates a child from two members given by
    /// `(species, member)` positions, fitter parent first.
    fn mate<M, R>(
        &mut self,
        population: &Population<M>,
        snapshot: &FitnessSnapshot,
        first: (usize, usize),
        second: (usize, usize),
        rng: &mut R,
    ) -> Result<M, EvolutionError>
    where
        M: SpeciesMember<Genome = F::Genome>,
        R: Rng + ?Sized,
    {
        let (fitter, other) =
            if snapshot.member_fitness(second.0, second.1) > snapshot.member_fitness(first.0, first.1) {
                (second, first)
            } else {
                (first, second)
            };
        let fitter = population.member(fitter.0, fitter.1);
        let other = population.member(other.0, other.1);
        let id = self.genome_ids.next_id();
        let child = self
            .reproduction
            .create_offspring_sexual(fitter.genome(), other.genome(), id, rng)
            .map_err(reproduction_error)?;
        Ok(fitter.with_genome(child))
    }
}

fn reproduction_error<E: Error + Send + Sync + 'static>(e: E) -> EvolutionError {
    EvolutionError::Reproduction(Box::new(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::tests::PointGenome;
    use crate::genome::DistanceFactors;
    use crate::selection::{ExponentialRanking, LinearRanking, RouletteWheel};
    use crate::speciation::IncrementalSpeciation;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use std::convert::Infallible;
    use std::sync::Arc;

    /// Moves points around the real line.
    struct Drift;

    impl Reproduction for Drift {
        type Genome = PointGenome;
        type Error = Infallible;

        fn begin_generation(&mut self, _generation: usize) {}

        fn create_genome<R: Rng + ?Sized>(&mut self, id: GenomeId, rng: &mut R) -> Result<PointGenome, Infallible> {
            Ok(PointGenome {
                id,
                position: rng.gen_range(-10.0..10.0),
            })
        }

        fn create_offspring_asexual<R: Rng + ?Sized>(
            &mut self,
            parent: &PointGenome,
            id: GenomeId,
            rng: &mut R,
        ) -> Result<PointGenome, Infallible> {
            Ok(PointGenome {
                id,
                position: parent.position + rng.gen_range(-0.5..0.5),
            })
        }

        fn create_offspring_sexual<R: Rng + ?Sized>(
            &mut self,
            fitter: &PointGenome,
            other: &PointGenome,
            id: GenomeId,
            _rng: &mut R,
        ) -> Result<PointGenome, Infallible> {
            Ok(PointGenome {
                id,
                position: (fitter.position + other.position) / 2.0,
            })
        }
    }

    type PointMember = Member<PointGenome, fn(&PointGenome) -> f64>;

    fn closeness_to_zero(g: &PointGenome) -> f64 {
        -g.position.abs()
    }

    fn speciation() -> IncrementalSpeciation {
        IncrementalSpeciation::new(
            DistanceFactors {
                weight: 1.0,
                ..DistanceFactors::default()
            },
            2.0,
            None,
        )
        .unwrap()
    }

    fn evolver() -> Evolver<LinearRanking, IncrementalSpeciation, Drift> {
        Evolver::new(
            EvolutionParameters::default(),
            LinearRanking::new(0.5).unwrap(),
            speciation(),
            Drift,
        )
        .unwrap()
    }

    fn initial_population(
        evolver: &mut Evolver<LinearRanking, IncrementalSpeciation, Drift>,
        size: usize,
        rng: &mut ChaCha8Rng,
    ) -> Population<PointMember> {
        let fitness: Arc<fn(&PointGenome) -> f64> = Arc::new(closeness_to_zero);
        let members = evolver
            .spawn_genomes(size, rng)
            .unwrap()
            .into_iter()
            .map(|g| Member::new(g, Arc::clone(&fitness)))
            .collect();
        evolver.create_new_population(members).unwrap()
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let parameters = EvolutionParameters {
            asexual_proportion: 0.0,
            ..EvolutionParameters::default()
        };
        assert!(Evolver::new(parameters, RouletteWheel, speciation(), Drift).is_err());
    }

    #[test]
    fn empty_initial_population_is_rejected() {
        let mut evolver = evolver();
        assert!(matches!(
            evolver.create_new_population(Vec::<PointMember>::new()),
            Err(EvolutionError::InvalidInput(_))
        ));
    }

    #[test]
    fn population_size_is_conserved() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut evolver = evolver();
        let mut population = initial_population(&mut evolver, 40, &mut rng);
        for g in 1..=30 {
            population = evolver.evolve(&population, &mut rng).unwrap();
            assert_eq!(population.member_count(), 40);
            assert_eq!(population.generation(), g);
            assert!(population.species().iter().all(|s| !s.members().is_empty()));
        }
    }

    #[test]
    fn genome_ids_stay_unique() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut evolver = evolver();
        let mut population = initial_population(&mut evolver, 30, &mut rng);
        for _ in 0..10 {
            population = evolver.evolve(&population, &mut rng).unwrap();
            let mut ids: Vec<GenomeId> = population.members().map(|m| m.genome().id()).collect();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), 30);
        }
    }

    #[test]
    fn champion_survives_unchanged() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut evolver = evolver();
        let population = initial_population(&mut evolver, 25, &mut rng);
        let snapshot = FitnessSnapshot::compute(&population).unwrap();
        let champion = population.champion(&snapshot).genome().clone();
        let next = evolver.evolve_with(&population, &snapshot, &mut rng).unwrap();
        assert!(next.members().any(|m| m.genome() == &champion));
    }

    #[test]
    fn mismatched_snapshot_is_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut evolver = evolver();
        let population = initial_population(&mut evolver, 10, &mut rng);
        let other = initial_population(&mut evolver, 11, &mut rng);
        let snapshot = FitnessSnapshot::compute(&other).unwrap();
        assert!(matches!(
            evolver.evolve_with(&population, &snapshot, &mut rng),
            Err(EvolutionError::InvalidInput(_))
        ));
    }

    #[test]
    fn allotment_follows_species_fitness() {
        let evolver = evolver();
        let fitness: Arc<fn(&PointGenome) -> f64> = Arc::new(closeness_to_zero);
        let member = |id, position| Member::new(PointGenome::new(id, position), Arc::clone(&fitness));
        let population = Population::new(
            0,
            vec![
                Species::new(SpeciesId(0, 0), vec![member(0, 0.0), member(1, 0.0)], 0).unwrap(),
                Species::new(SpeciesId(0, 1), vec![member(2, 4.0), member(3, 4.0)], 0).unwrap(),
            ],
        )
        .unwrap();
        let snapshot = FitnessSnapshot::compute(&population).unwrap();
        // Shifted means are 4 and 0.
        assert_eq!(evolver.allot_offspring(&population, &snapshot), vec![4, 0]);

        let snapshot = FitnessSnapshot::from_values(&population, vec![vec![1.0, 1.0], vec![1.0, 1.0]]).unwrap();
        assert_eq!(evolver.allot_offspring(&population, &snapshot), vec![2, 2]);
    }

    #[test]
    fn solve_reaches_target() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut evolver = evolver();
        let population = initial_population(&mut evolver, 50, &mut rng);
        let solution = evolver.solve(population, 500, -0.01, &mut rng).unwrap();
        assert!(solution.success);
        assert!(solution.best_fitness >= -0.01);
        assert_eq!(solution.population.member_count(), 50);
    }

    #[test]
    fn solve_respects_iteration_limit_and_cancellation() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut evolver = evolver();
        let population = initial_population(&mut evolver, 20, &mut rng);
        let solution = evolver.solve(population, 3, 1.0, &mut rng).unwrap();
        assert!(!solution.success);
        assert_eq!(solution.iterations, 3);

        let cancel = AtomicBool::new(true);
        let solution = evolver
            .solve_cancellable(solution.population, 0, 1.0, &cancel, &mut rng)
            .unwrap();
        assert_eq!(solution.iterations, 0);
    }

    fn zero_fitness(_: &PointGenome) -> f64 {
        0.0
    }

    fn equal_fitness(_: &PointGenome) -> f64 {
        3.5
    }

    fn extreme_fitness(g: &PointGenome) -> f64 {
        if g.position >= 0.0 {
            f64::MAX
        } else {
            -f64::MAX
        }
    }

    fn evolve_degenerate<S: SelectionStrategy>(selection: S, fitness: fn(&PointGenome) -> f64) {
        let mut evolver = Evolver::new(EvolutionParameters::default(), selection, speciation(), Drift).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let fitness = Arc::new(fitness);
        let members: Vec<PointMember> = evolver
            .spawn_genomes(30, &mut rng)
            .unwrap()
            .into_iter()
            .map(|g| Member::new(g, Arc::clone(&fitness)))
            .collect();
        let mut population = evolver.create_new_population(members).unwrap();
        for g in 1..=10 {
            let snapshot = FitnessSnapshot::compute(&population).unwrap();
            assert!(snapshot.mean_fitness().is_finite());
            population = evolver.evolve_with(&population, &snapshot, &mut rng).unwrap();
            assert_eq!(population.member_count(), 30);
            assert_eq!(population.generation(), g);
        }
    }

    #[test]
    fn degenerate_fitnesses_conserve_size() {
        for fitness in [
            zero_fitness as fn(&PointGenome) -> f64,
            equal_fitness,
            extreme_fitness,
        ] {
            evolve_degenerate(RouletteWheel, fitness);
            evolve_degenerate(LinearRanking::new(0.5).unwrap(), fitness);
            evolve_degenerate(ExponentialRanking::new(0.5).unwrap(), fitness);
        }
    }

    #[test]
    fn allotment_of_extreme_fitnesses() {
        let evolver = evolver();
        let fitness: Arc<fn(&PointGenome) -> f64> = Arc::new(extreme_fitness);
        let member = |id, position| Member::new(PointGenome::new(id, position), Arc::clone(&fitness));
        let population = Population::new(
            0,
            vec![
                Species::new(SpeciesId(0, 0), vec![member(0, 1.0), member(1, 1.0)], 0).unwrap(),
                Species::new(SpeciesId(0, 1), vec![member(2, -1.0), member(3, -1.0)], 0).unwrap(),
            ],
        )
        .unwrap();
        let snapshot = FitnessSnapshot::compute(&population).unwrap();
        assert_eq!(snapshot.species_mean(0), f64::MAX);
        assert_eq!(snapshot.mean_fitness(), 0.0);
        assert_eq!(evolver.allot_offspring(&population, &snapshot), vec![4, 0]);
    }
}
