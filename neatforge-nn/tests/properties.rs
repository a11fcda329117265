use neatforge::{
    DistanceFactors, EvolutionParameters, Evolver, FitnessSnapshot, Genome, GenomeId,
    IncrementalSpeciation, KMedoidsSpeciation, Member, Reproduction, RouletteWheel,
    SpeciationStrategy, SpeciesMember, ValueRange,
};
use neatforge_nn::genomics::{
    GeneticConfig, History, NeatCrossoverSettings, NeatGenome, NeatMutationSettings,
};
use neatforge_nn::NeatReproduction;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

fn genetic(inputs: usize, outputs: usize) -> GeneticConfig {
    GeneticConfig {
        input_count: NonZeroUsize::new(inputs).unwrap(),
        output_count: NonZeroUsize::new(outputs).unwrap(),
        ..GeneticConfig::default()
    }
}

/// Reproduction that mostly changes structure.
fn structural_reproduction(inputs: usize, outputs: usize) -> NeatReproduction {
    let range = ValueRange::new(-4.0, 4.0).unwrap();
    NeatReproduction::new(
        genetic(inputs, outputs),
        NeatMutationSettings {
            add_node: 0.3,
            remove_node: 0.05,
            add_connection: 0.3,
            remove_connection: 0.05,
            ..NeatMutationSettings::with_range(range)
        },
        NeatCrossoverSettings::with_range(range),
    )
    .unwrap()
}

/// Genomes evolved by repeated asexual reproduction.
fn lineage(count: usize, seed: u64) -> Vec<NeatGenome> {
    let mut reproduction = structural_reproduction(3, 2);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    reproduction.begin_generation(0);
    let mut genomes = vec![reproduction.create_genome(GenomeId(0), &mut rng).unwrap()];
    for id in 1..count as u64 {
        reproduction.begin_generation(id as usize);
        let parent = genomes[(id as usize - 1) / 2].clone();
        genomes.push(
            reproduction
                .create_offspring_asexual(&parent, GenomeId(id), &mut rng)
                .unwrap(),
        );
    }
    genomes
}

fn complexity_fitness(genome: &NeatGenome) -> f64 {
    genome.complexity() as f64
}

#[test]
fn crossover_with_itself_is_identity() {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let settings = NeatCrossoverSettings {
        crossover_probability: 1.0,
        ..NeatCrossoverSettings::with_range(ValueRange::new(-4.0, 4.0).unwrap())
    };
    for genome in lineage(30, 0) {
        let child =
            NeatGenome::crossover(&genome, &genome, GenomeId(100), &settings, &mut rng).unwrap();
        assert_eq!(
            child.network().connections().collect::<Vec<_>>(),
            genome.network().connections().collect::<Vec<_>>()
        );
        assert_eq!(
            child.network().neurons().map(|n| n.id()).collect::<Vec<_>>(),
            genome.network().neurons().map(|n| n.id()).collect::<Vec<_>>()
        );
    }
}

#[test]
fn distance_is_symmetric() {
    let genomes = lineage(20, 2);
    let factors = [
        DistanceFactors::default(),
        DistanceFactors {
            excess: 2.0,
            disjoint: 0.5,
            weight: 1.0,
            normalize: true,
        },
    ];
    for factors in &factors {
        for a in &genomes {
            assert_eq!(a.genetic_distance(a, factors), 0.0);
            for b in &genomes {
                let d = a.genetic_distance(b, factors);
                assert!(d >= 0.0);
                assert_eq!(d, b.genetic_distance(a, factors));
            }
        }
    }
}

#[test]
fn identical_mutations_share_innovations() {
    let range = ValueRange::new(-1.0, 1.0).unwrap();
    let mut reproduction = NeatReproduction::new(
        genetic(1, 1),
        NeatMutationSettings {
            add_node: 1.0,
            remove_node: 0.0,
            add_connection: 0.0,
            remove_connection: 0.0,
            mutate_weight: 0.0,
            ..NeatMutationSettings::with_range(range)
        },
        NeatCrossoverSettings::with_range(range),
    )
    .unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    reproduction.begin_generation(0);
    let parent = reproduction.create_genome(GenomeId(0), &mut rng).unwrap();
    assert_eq!(parent.complexity(), 2);

    reproduction.begin_generation(1);
    // Offspring grouped by the connection they split.
    let mut splits: BTreeMap<usize, Vec<NeatGenome>> = BTreeMap::new();
    for id in 1..=20 {
        let child = reproduction
            .create_offspring_asexual(&parent, GenomeId(id), &mut rng)
            .unwrap();
        let split = child
            .network()
            .connections()
            .find(|c| !c.enabled())
            .unwrap()
            .innovation();
        splits.entry(split).or_default().push(child);
    }

    let mut hidden_ids = vec![];
    for children in splits.values() {
        let layout = |g: &NeatGenome| {
            (
                g.network().hidden_ids().collect::<Vec<_>>(),
                g.network()
                    .connections()
                    .map(|c| (c.innovation(), c.endpoints()))
                    .collect::<Vec<_>>(),
            )
        };
        for child in children {
            assert_eq!(layout(child), layout(&children[0]));
        }
        hidden_ids.extend(children[0].network().hidden_ids());
    }
    // Different splits never share a neuron.
    hidden_ids.sort_unstable();
    hidden_ids.dedup();
    assert_eq!(hidden_ids.len(), splits.len());
}

#[test]
fn identical_connections_share_innovations() {
    let config = genetic(1, 1);
    let range = ValueRange::new(-1.0, 1.0).unwrap();
    let mut history = History::new(&config);
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut first = NeatGenome::new(GenomeId(0), &config, &range, &mut rng);
    let mut second = NeatGenome::new(GenomeId(1), &config, &range, &mut rng);

    // The output's self-loop is the only connection left to add.
    let innovation = first
        .mutate_add_connection(&range, &mut history, &mut rng)
        .unwrap();
    assert_eq!(
        second.mutate_add_connection(&range, &mut history, &mut rng),
        Ok(innovation)
    );
    assert_eq!(
        first.network().connection(innovation).unwrap().endpoints(),
        second.network().connection(innovation).unwrap().endpoints()
    );
}

#[test]
fn initial_networks_settle_in_one_step() {
    let mut reproduction = structural_reproduction(4, 3);
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    reproduction.begin_generation(0);
    for id in 0..10 {
        let mut network = reproduction
            .create_genome(GenomeId(id), &mut rng)
            .unwrap()
            .into_network();
        let report = network
            .activate(&[[0.5, -1.0, 0.25, 2.0]], 1.0, 10, true)
            .unwrap();
        assert!(report.converged);
        assert_eq!(report.steps, 1);
        assert_eq!(report.outputs.len(), 3);
    }
}

fn assert_covers<M: SpeciesMember<Genome = NeatGenome>>(
    population: &neatforge::Population<M>,
    size: usize,
) {
    let mut ids: Vec<GenomeId> = population.members().map(|m| m.genome().id()).collect();
    assert_eq!(ids.len(), size);
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), size);
    assert!(population.species().iter().all(|s| !s.is_empty()));
}

fn evolve_and_check<P: SpeciationStrategy>(speciation: P, seed: u64) {
    let mut evolver = Evolver::new(
        EvolutionParameters::default(),
        RouletteWheel,
        speciation,
        structural_reproduction(2, 1),
    )
    .unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let fitness = Arc::new(complexity_fitness);
    let members = evolver
        .spawn_genomes(60, &mut rng)
        .unwrap()
        .into_iter()
        .map(|genome| Member::new(genome, Arc::clone(&fitness)))
        .collect();
    let mut population = evolver.create_new_population(members).unwrap();

    for generation in 1..=15 {
        let snapshot = FitnessSnapshot::compute(&population).unwrap();
        population = evolver.evolve_with(&population, &snapshot, &mut rng).unwrap();
        assert_eq!(population.generation(), generation);
        assert_covers(&population, 60);
    }
}

#[test]
fn evolution_conserves_size_with_incremental_speciation() {
    let speciation = IncrementalSpeciation::new(DistanceFactors::default(), 1.0, None).unwrap();
    evolve_and_check(speciation, 5);
}

#[test]
fn evolution_conserves_size_with_kmedoids_speciation() {
    let speciation =
        KMedoidsSpeciation::new(DistanceFactors::default(), NonZeroUsize::new(4).unwrap())
            .unwrap();
    evolve_and_check(speciation, 6);
}
