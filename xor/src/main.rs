use neatforge::logging::{EvolutionLogger, ReportingLevel, Stats};
use neatforge::{
    DistanceFactors, EvolutionError, EvolutionParameters, Evolver, FitnessSnapshot, Genome,
    IncrementalSpeciation, LinearRanking, Member, Population, SpeciesInheritance, SpeciesMember,
};
use neatforge_nn::genomics::{GeneticConfig, NeatGenome};
use neatforge_nn::networks::FunctionApproximator;
use neatforge_nn::NeatReproduction;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use std::error::Error;
use std::num::NonZeroUsize;
use std::sync::Arc;

type XorMember = Member<NeatGenome, fn(&NeatGenome) -> f64>;

const POPULATION_SIZE: usize = 500;
const MAX_GENERATIONS: usize = 1000;
const TARGET_FITNESS: f64 = 0.9;
const RUNS: u64 = 100;

fn evaluate_xor(genome: &NeatGenome) -> f64 {
    let mut network = FunctionApproximator::new(genome.network());

    let values = [
        ([0.0, 0.0], 0.0),
        ([0.0, 1.0], 1.0),
        ([1.0, 0.0], 1.0),
        ([1.0, 1.0], 0.0),
    ];

    let squared_error: f64 = values
        .iter()
        .map(|(input, output)| match network.evaluate(input) {
            Ok(result) => (result[0] - output).powi(2),
            Err(_) => 1.0,
        })
        .sum();
    1.0 - squared_error.sqrt()
}

/// Evaluates every member in parallel.
fn evaluate(population: &Population<XorMember>) -> Result<FitnessSnapshot, EvolutionError> {
    let values = population
        .species()
        .par_iter()
        .map(|species| {
            species
                .members()
                .iter()
                .map(|member| evaluate_xor(member.genome()))
                .collect::<Vec<f64>>()
        })
        .collect();
    FitnessSnapshot::from_values(population, values)
}

struct Run {
    /// Generation in which the target fitness was reached.
    solved_at: Option<usize>,
    champion: NeatGenome,
    logger: EvolutionLogger<XorMember>,
}

fn run(seed: u64, reporting_level: ReportingLevel) -> Result<Run, EvolutionError> {
    let genetic_config = GeneticConfig {
        input_count: NonZeroUsize::new(2).unwrap(),
        output_count: NonZeroUsize::new(1).unwrap(),
        initial_expression_chance: 1.0,
        ..GeneticConfig::default()
    };
    let reproduction = NeatReproduction::with_defaults(genetic_config)?;
    let speciation = IncrementalSpeciation::new(DistanceFactors::default(), 3.0, None)?
        .with_inheritance(SpeciesInheritance::WithinThreshold);
    let mut evolver = Evolver::new(
        EvolutionParameters::default(),
        LinearRanking::new(0.5)?,
        speciation,
        reproduction,
    )?;

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let fitness_function = Arc::new(evaluate_xor as fn(&NeatGenome) -> f64);
    let members = evolver
        .spawn_genomes(POPULATION_SIZE, &mut rng)?
        .into_iter()
        .map(|genome| Member::new(genome, Arc::clone(&fitness_function)))
        .collect();
    let mut population = evolver.create_new_population(members)?;
    let mut logger = EvolutionLogger::new(reporting_level);

    loop {
        let snapshot = evaluate(&population)?;
        logger.log(
            &population,
            &snapshot,
            &|member: &XorMember| {
                [
                    member.genome().complexity() as f64,
                    member.genome().network().hidden_ids().count() as f64,
                ]
            },
            ["connections", "hidden neurons"],
        );

        let solved = snapshot.best_fitness() >= TARGET_FITNESS;
        if solved || population.generation() >= MAX_GENERATIONS {
            return Ok(Run {
                solved_at: solved.then(|| population.generation()),
                champion: population.champion(&snapshot).genome().clone(),
                logger,
            });
        }
        population = evolver.evolve_with(&population, &snapshot, &mut rng)?;
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    stress_test()?;
    serde_test()?;
    Ok(())
}

fn stress_test() -> Result<(), Box<dyn Error>> {
    let generations = (0..RUNS)
        .into_par_iter()
        .map(|seed| run(seed, ReportingLevel::NoMembers).map(|run| run.solved_at))
        .collect::<Result<Vec<_>, _>>()?;

    println!(
        "Successful run generation count {:?}, {}% failure rate over {} iterations",
        Stats::from(generations.iter().filter_map(|g| g.map(|g| g as f64))),
        generations.iter().filter(|g| g.is_none()).count() as f64 * 100.0 / RUNS as f64,
        RUNS
    );
    Ok(())
}

fn serde_test() -> Result<(), Box<dyn Error>> {
    let run = run(0, ReportingLevel::PopulationChampion)?;
    if let Some(log) = run.logger.iter().last() {
        println!("{}", log);
    }

    let saved = ron::to_string(&run.champion)?;
    println!("{}", saved);
    let loaded: NeatGenome = ron::from_str(&saved)?;
    println!(
        "champion {} (solved at {:?}): fitness {} before saving, {} after loading",
        loaded.id(),
        run.solved_at,
        evaluate_xor(&run.champion),
        evaluate_xor(&loaded)
    );
    Ok(())
}
