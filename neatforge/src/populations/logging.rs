use super::{FitnessSnapshot, Population, SpeciesId};

use serde::{Deserialize, Serialize};

use std::fmt;

/// Defines different possible reporting levels for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportingLevel {
    /// Clones the entire population.
    AllMembers,
    /// Clones species and their champions.
    SpeciesChampions,
    /// Clones only the population champion.
    PopulationChampion,
    /// Clones no members.
    NoMembers,
}

/// A snapshot of a population.
#[derive(Clone, Debug)]
pub struct Log<M> {
    pub generation_number: usize,
    pub generation_sample: GenerationMemberRecord<M>,
    pub species_count: usize,
    pub fitness: Stats,
    pub member_stats: Vec<(String, Stats)>,
}

impl<M> fmt::Display for Log<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Log {{\n\
            \tgeneration_number: {:?}\n\
            \tspecies_count: {:?}\n\
            \tfitness: {:?}\n\
            {}\
            }}",
            &self.generation_number,
            &self.species_count,
            &self.fitness,
            self.member_stats
                .iter()
                .map(|(name, stats)| format!("\t{}: {:?}\n", name, stats))
                .collect::<Vec<_>>()
                .join("")
        )
    }
}

/// A struct for reporting basic statistical data.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub maximum: f64,
    pub minimum: f64,
    pub mean: f64,
    pub median: f64,
}

impl Stats {
    /// Returns statistics about numbers in a sequence.
    /// All statistics of an empty sequence are NaN.
    ///
    /// # Examples
    /// ```
    /// use neatforge::logging::Stats;
    ///
    /// let stats = Stats::from([-2.0, -1.0, 0.5, 1.0, 1.5].iter().copied());
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    ///
    /// let stats = Stats::from([4.0, 1.0, 3.0, 2.0].iter().copied());
    /// assert_eq!(stats.median, 2.5);
    /// ```
    pub fn from(data: impl Iterator<Item = f64>) -> Stats {
        let mut data: Vec<f64> = data.collect();
        if data.is_empty() {
            return Stats {
                maximum: f64::NAN,
                minimum: f64::NAN,
                mean: f64::NAN,
                median: f64::NAN,
            };
        }
        let mid = data.len() / 2;
        let (mut max, mut min, mut sum) = (f64::MIN, f64::MAX, 0.0);
        for d in &data {
            max = d.max(max);
            min = d.min(min);
            sum += d;
        }
        let mean = sum / data.len() as f64;
        let mut median = *data.select_nth_unstable_by(mid, |a, b| a.total_cmp(b)).1;
        if data.len() % 2 == 0 {
            median = (median + *data.select_nth_unstable_by(mid - 1, |a, b| a.total_cmp(b)).1) / 2.0;
        }
        Stats {
            maximum: max,
            minimum: min,
            mean,
            median,
        }
    }
}

/// A reporting-level dependant store
/// of members from a population.
#[derive(Clone, Debug)]
pub enum GenerationMemberRecord<M> {
    /// Species IDs and members.
    Species(Vec<(SpeciesId, Vec<M>)>),
    /// Only species IDs and species champions.
    SpeciesChampions(Vec<(SpeciesId, M)>),
    /// Only population champion.
    PopulationChampion(M),
    /// Empty.
    None,
}

/// A log of the evolution of a population over time.
#[derive(Clone, Debug)]
pub struct EvolutionLogger<M> {
    reporting_level: ReportingLevel,
    logs: Vec<Log<M>>,
}

impl<M: Clone> EvolutionLogger<M> {
    /// Returns a logger with the appropiate reporting level.
    pub fn new(reporting_level: ReportingLevel) -> EvolutionLogger<M> {
        EvolutionLogger {
            reporting_level,
            logs: vec![],
        }
    }

    /// Store a snapshot of an evaluated population.
    ///
    /// The `member_stat_extractor` provides a way of
    /// obtaining arbitrary statistics on the population,
    /// where each statistic is named by `stat_names`.
    ///
    /// # Examples
    /// ```
    /// use neatforge::logging::{EvolutionLogger, ReportingLevel};
    /// use neatforge::{FitnessSnapshot, Population, Species, SpeciesId};
    ///
    /// let population = Population::new(
    ///     0,
    ///     vec![Species::new(SpeciesId(0, 0), vec![1.0, 3.0], 0).unwrap()],
    /// )
    /// .unwrap();
    /// let snapshot = FitnessSnapshot::from_values(&population, vec![vec![0.5, 0.9]]).unwrap();
    ///
    /// let mut logger = EvolutionLogger::new(ReportingLevel::PopulationChampion);
    /// logger.log(&population, &snapshot, &|m: &f64| [*m * 2.0], ["double"]);
    ///
    /// let log = logger.iter().next().unwrap();
    /// assert_eq!(log.fitness.maximum, 0.9);
    /// assert_eq!(log.member_stats[0].1.mean, 4.0);
    /// ```
    pub fn log<MSE, const N: usize>(
        &mut self,
        population: &Population<M>,
        snapshot: &FitnessSnapshot,
        member_stat_extractor: &MSE,
        stat_names: [&str; N],
    ) where
        MSE: Fn(&M) -> [f64; N],
    {
        let stats: Vec<[f64; N]> = population.members().map(member_stat_extractor).collect();
        let member_stats = stat_names
            .iter()
            .cloned()
            .map(String::from)
            .zip(unzip_n_vecs(stats.into_iter()))
            .map(|(name, data)| (name, Stats::from(data.into_iter())))
            .collect();
        self.logs.push(Log {
            generation_number: population.generation(),
            generation_sample: match self.reporting_level {
                ReportingLevel::AllMembers => GenerationMemberRecord::Species(
                    population
                        .species()
                        .iter()
                        .map(|s| (s.id(), s.members().to_vec()))
                        .collect(),
                ),
                ReportingLevel::SpeciesChampions => GenerationMemberRecord::SpeciesChampions(
                    population
                        .species()
                        .iter()
                        .enumerate()
                        .map(|(i, s)| (s.id(), s.members()[snapshot.ranked_members(i)[0]].clone()))
                        .collect(),
                ),
                ReportingLevel::PopulationChampion => {
                    GenerationMemberRecord::PopulationChampion(population.champion(snapshot).clone())
                }
                ReportingLevel::NoMembers => GenerationMemberRecord::None,
            },
            species_count: population.species().len(),
            fitness: Stats::from(snapshot.values()),
            member_stats,
        })
    }

    /// Iterate over all logged snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &Log<M>> {
        self.logs.iter()
    }
}

fn unzip_n_vecs<T: Clone, const N: usize>(iter: impl Iterator<Item = [T; N]>) -> Vec<Vec<T>> {
    let mut vecs = vec![Vec::default(); N];
    for items in iter {
        for (i, item) in items.into_iter().enumerate() {
            vecs[i].push(item);
        }
    }
    vecs
}
