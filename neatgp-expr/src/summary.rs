//! Exportable summaries of evolved genomes.
use crate::equations::Equation;
use crate::genomics::{ExprGenome, GraphDescription};

use neatgp::Genome;
use serde::{Deserialize, Serialize};

/// Everything worth keeping about an evolved
/// genome, ready for serialization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenomeSummary {
    /// 1 for the fittest genome.
    pub rank: usize,
    pub fitness: f64,
    pub mse: f64,
    pub complexity: usize,
    pub equation: String,
    pub latex: String,
    pub graph: GraphDescription,
}

impl GenomeSummary {
    /// Summarizes a single genome, with the given rank.
    pub fn new(rank: usize, genome: &ExprGenome, input_names: &[String]) -> GenomeSummary {
        let equation = Equation::from_genome(genome, input_names);
        let evaluation = genome.evaluation();
        GenomeSummary {
            rank,
            fitness: evaluation.fitness,
            mse: evaluation.mse,
            complexity: evaluation.complexity,
            equation: equation.plain().to_string(),
            latex: equation.latex().to_string(),
            graph: genome.describe(input_names),
        }
    }

    /// Summarizes the genomes ranked by decreasing
    /// fitness, ties broken by lower complexity.
    ///
    /// # Examples
    /// ```
    /// use neatgp::{Evaluation, Genome};
    /// use neatgp_expr::genomics::{ExprGenome, GeneticConfig};
    /// use neatgp_expr::summary::GenomeSummary;
    /// use rand::SeedableRng;
    ///
    /// let config = GeneticConfig::default();
    /// let mut rng = rand::rngs::StdRng::seed_from_u64(0);
    /// let mut genomes: Vec<ExprGenome> =
    ///     (0..3).map(|_| ExprGenome::new(&config, &mut rng)).collect();
    /// for (i, genome) in genomes.iter_mut().enumerate() {
    ///     let complexity = genome.complexity();
    ///     genome.set_evaluation(Evaluation { fitness: i as f64 / 10.0, mse: 1.0, complexity });
    /// }
    ///
    /// let summaries = GenomeSummary::rank_all(&genomes, &config.input_names);
    /// assert_eq!(summaries[0].rank, 1);
    /// assert_eq!(summaries[0].fitness, 0.2);
    /// assert_eq!(summaries[2].fitness, 0.0);
    /// ```
    pub fn rank_all<'a>(
        genomes: impl IntoIterator<Item = &'a ExprGenome>,
        input_names: &[String],
    ) -> Vec<GenomeSummary> {
        let mut genomes: Vec<&ExprGenome> = genomes.into_iter().collect();
        genomes.sort_by(|a, b| {
            b.fitness()
                .total_cmp(&a.fitness())
                .then(a.complexity().cmp(&b.complexity()))
        });
        genomes
            .into_iter()
            .enumerate()
            .map(|(i, genome)| GenomeSummary::new(i + 1, genome, input_names))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{GeneticConfig, InnovationTracker};

    use neatgp::Evaluation;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn ties_prefer_simpler_genomes() {
        let config = GeneticConfig::default();
        let tracker = InnovationTracker::new(&config);
        let mut rng = StdRng::seed_from_u64(2);
        let simple = ExprGenome::new(&config, &mut rng);
        let mut complex = simple.clone();
        complex.mutate_add_node(&tracker, &config, &mut rng).unwrap();

        let evaluated = |mut genome: ExprGenome| {
            let complexity = genome.complexity();
            genome.set_evaluation(Evaluation {
                fitness: 0.5,
                mse: 0.1,
                complexity,
            });
            genome
        };
        let genomes = vec![evaluated(complex), evaluated(simple)];

        let summaries = GenomeSummary::rank_all(&genomes, &config.input_names);
        assert!(summaries[0].complexity < summaries[1].complexity);
        assert_eq!(summaries[1].rank, 2);

        let json = serde_json::to_string(&summaries).unwrap();
        let restored: Vec<GenomeSummary> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored[0].equation, summaries[0].equation);
        assert_eq!(restored[1].graph.nodes.len(), summaries[1].graph.nodes.len());
    }
}
