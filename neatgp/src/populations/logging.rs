use super::{Population, SpeciesID};

use crate::genome::{Genome, InnovationHistory};

use std::fmt;

/// Defines different possible reporting levels for logging.
#[derive(Clone, Copy, Debug)]
pub enum ReportingLevel {
    /// Clones the entire population.
    AllGenomes,
    /// Clones species and their representatives.
    SpeciesRepresentatives,
    /// Clones only the population champion.
    PopulationChampion,
    /// Clones no genomes.
    NoGenomes,
}

/// A snapshot of a population.
#[derive(Clone, Debug)]
pub struct Log<G> {
    pub generation_number: usize,
    pub generation_sample: GenerationMemberRecord<G>,
    pub species_count: usize,
    pub compatibility_threshold: f64,
    pub genome_stats: Vec<(String, Stats)>,
}

impl<G> fmt::Display for Log<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Log {{")?;
        writeln!(f, "\tgeneration_number: {}", self.generation_number)?;
        writeln!(f, "\tspecies_count: {}", self.species_count)?;
        writeln!(f, "\tcompatibility_threshold: {:.3}", self.compatibility_threshold)?;
        for (name, stats) in &self.genome_stats {
            writeln!(f, "\t{}: {}", name, stats)?;
        }
        write!(f, "}}")
    }
}

/// A struct for reporting basic statistical data.
#[derive(Clone, Debug, PartialEq)]
pub struct Stats {
    pub maximum: f64,
    pub minimum: f64,
    pub mean: f64,
    pub median: f64,
}

impl Stats {
    /// Returns statistics about numbers in a sequence,
    /// or `None` if the sequence is empty.
    ///
    /// # Examples
    /// ```
    /// use neatgp::logging::Stats;
    ///
    /// let stats = Stats::from_values([-2.0, -1.0, 0.5, 1.0, 1.5]).unwrap();
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    ///
    /// let stats = Stats::from_values([4.0, 1.0, 3.0, 2.0]).unwrap();
    /// assert_eq!(stats.median, 2.5);
    ///
    /// assert!(Stats::from_values(std::iter::empty::<f64>()).is_none());
    /// ```
    pub fn from_values(data: impl IntoIterator<Item = f64>) -> Option<Stats> {
        let mut data: Vec<f64> = data.into_iter().collect();
        if data.is_empty() {
            return None;
        }
        data.sort_by(f64::total_cmp);
        let mid = data.len() / 2;
        let median = if data.len() % 2 == 0 {
            (data[mid - 1] + data[mid]) / 2.0
        } else {
            data[mid]
        };
        Some(Stats {
            maximum: data[data.len() - 1],
            minimum: data[0],
            mean: data.iter().sum::<f64>() / data.len() as f64,
            median,
        })
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "max {:.6}, min {:.6}, mean {:.6}, median {:.6}",
            self.maximum, self.minimum, self.mean, self.median
        )
    }
}

/// A reporting-level dependant store
/// of genomes from a population.
#[derive(Clone, Debug)]
pub enum GenerationMemberRecord<G> {
    /// Every genome of the generation.
    Genomes(Vec<G>),
    /// Only species IDs, species representatives, and stagnation level.
    SpeciesRepresentatives(Vec<(SpeciesID, G, usize)>),
    /// Only population champion.
    PopulationChampion(G),
    /// Empty.
    None,
}

/// A log of the evolution of a population over time.
#[derive(Clone, Debug)]
pub struct EvolutionLogger<G> {
    reporting_level: ReportingLevel,
    logs: Vec<Log<G>>,
}

impl<G: Genome> EvolutionLogger<G> {
    /// Returns a logger with the appropiate reporting level.
    ///
    /// # Examples
    /// ```
    /// use neatgp::logging::{EvolutionLogger, ReportingLevel};
    /// use neatgp_expr::genomics::ExprGenome;
    ///
    /// let logger = EvolutionLogger::<ExprGenome>::new(ReportingLevel::NoGenomes);
    /// assert_eq!(logger.iter().count(), 0);
    /// ```
    pub fn new(reporting_level: ReportingLevel) -> EvolutionLogger<G> {
        EvolutionLogger {
            reporting_level,
            logs: vec![],
        }
    }

    /// Store a snapshot of a population.
    ///
    /// The `genome_stat_extractor` provides a way of
    /// obtaining arbitrary statistics on the population,
    /// where each statistic is named by `stat_names`.
    ///
    /// Species are formed when the population evolves, so
    /// snapshots taken right after evaluation record the
    /// species of the previous generation.
    ///
    /// # Examples
    /// ```
    /// use neatgp::{Evaluation, Genome, Population, PopulationConfig};
    /// use neatgp::logging::{EvolutionLogger, ReportingLevel};
    /// use neatgp_expr::genomics::{ExprGenome, GeneticConfig};
    ///
    /// let mut logger = EvolutionLogger::new(ReportingLevel::PopulationChampion);
    /// let mut population = Population::<_, _, ExprGenome>::new(
    ///     PopulationConfig { size: 10, seed: Some(2), ..PopulationConfig::default() },
    ///     GeneticConfig::default(),
    /// )
    /// .unwrap();
    /// population.evaluate_fitness(|g| Evaluation {
    ///     fitness: 1.0 / g.complexity() as f64,
    ///     mse: 0.0,
    ///     complexity: g.complexity(),
    /// });
    ///
    /// logger.log(
    ///     &population,
    ///     &|g: &ExprGenome| [g.fitness(), g.complexity() as f64],
    ///     ["fitness", "complexity"],
    /// );
    /// let log = logger.iter().next().unwrap();
    /// assert_eq!(log.genome_stats.len(), 2);
    /// ```
    pub fn log<C, H, GSE, const N: usize>(
        &mut self,
        population: &Population<C, H, G>,
        genome_stat_extractor: &GSE,
        stat_names: [&str; N],
    ) where
        C: Sync,
        H: InnovationHistory<Config = C>,
        G: Genome<InnovationHistory = H, Config = C>,
        GSE: Fn(&G) -> [f64; N],
    {
        let stats: Vec<[f64; N]> = population.genomes().map(genome_stat_extractor).collect();
        let genome_stats = stat_names
            .iter()
            .map(|name| name.to_string())
            .zip(unzip_n_vecs(stats))
            .filter_map(|(name, data)| Stats::from_values(data).map(|stats| (name, stats)))
            .collect();

        self.logs.push(Log {
            generation_number: population.generation(),
            generation_sample: match self.reporting_level {
                ReportingLevel::AllGenomes => {
                    GenerationMemberRecord::Genomes(population.genomes().cloned().collect())
                }
                ReportingLevel::SpeciesRepresentatives => {
                    GenerationMemberRecord::SpeciesRepresentatives(
                        population
                            .species()
                            .map(|s| (s.id(), s.representative().clone(), s.time_stagnated()))
                            .collect(),
                    )
                }
                ReportingLevel::PopulationChampion => match population.champion() {
                    Some(champion) => GenerationMemberRecord::PopulationChampion(champion.clone()),
                    None => GenerationMemberRecord::None,
                },
                ReportingLevel::NoGenomes => GenerationMemberRecord::None,
            },
            species_count: population.species().count(),
            compatibility_threshold: population.compatibility_threshold(),
            genome_stats,
        })
    }

    /// Iterate over all logged snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &Log<G>> {
        self.logs.iter()
    }

    /// Returns the most recent snapshot.
    pub fn last(&self) -> Option<&Log<G>> {
        self.logs.last()
    }
}

fn unzip_n_vecs<T: Clone, const N: usize>(items: Vec<[T; N]>) -> Vec<Vec<T>> {
    let mut vecs = vec![Vec::with_capacity(items.len()); N];
    for item in items {
        for (vec, value) in vecs.iter_mut().zip(item) {
            vec.push(value);
        }
    }
    vecs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unzip_n_vecs() {
        let columns = super::unzip_n_vecs(vec![[1, 2, 3], [4, 5, 6]]);
        assert_eq!(columns, vec![vec![1, 4], vec![2, 5], vec![3, 6]]);
    }

    #[test]
    fn stats_of_single_value() {
        let stats = Stats::from_values([3.5]).unwrap();
        assert_eq!(stats.maximum, 3.5);
        assert_eq!(stats.minimum, 3.5);
        assert_eq!(stats.mean, 3.5);
        assert_eq!(stats.median, 3.5);
    }
}
