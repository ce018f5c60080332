use neatgp::logging::{EvolutionLogger, ReportingLevel};
use neatgp::{Genome, Population, PopulationConfig};
use neatgp_expr::equations::Equation;
use neatgp_expr::fitness::{Covariate, FitnessConfig, FitnessEvaluator, TimeSeries};
use neatgp_expr::genomics::{BinaryOp, ExprGenome, GeneticConfig, UnaryOp};
use neatgp_expr::summary::GenomeSummary;

use serde::{Deserialize, Serialize};

use std::error::Error;
use std::{env, fs};

/// A complete evolutionary experiment, loadable from RON.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
struct Scenario {
    /// Observation times.
    times: Vec<f64>,
    /// Observed values, the first being the initial condition.
    values: Vec<f64>,
    covariates: Vec<Covariate>,
    genetic: GeneticConfig,
    population: PopulationConfig,
    fitness: FitnessConfig,
}

impl Default for Scenario {
    /// Molar mass decay of a hydrolysing polyester sample,
    /// in kg/mol over days, modelled as `dMn/dt = f(Mn)`.
    fn default() -> Scenario {
        Scenario {
            times: vec![0.0, 30.0, 60.0, 90.0],
            values: vec![51.285, 25.447, 18.313, 7.904],
            covariates: vec![Covariate::State],
            genetic: GeneticConfig {
                input_names: vec!["Mn".to_string()],
                constant_count: 0,
                unary_operations: vec![UnaryOp::Negate],
                binary_operations: vec![BinaryOp::Add, BinaryOp::Subtract, BinaryOp::Multiply],
                weight_init_range: 0.1,
                weight_mutation_power: 0.05,
                ..GeneticConfig::default()
            },
            population: PopulationConfig {
                size: 100,
                max_generations: 50,
                seed: Some(2024),
                ..PopulationConfig::default()
            },
            fitness: FitnessConfig {
                complexity_weight: 0.005,
                ..FitnessConfig::default()
            },
        }
    }
}

/// Genomes integrate the state normalized by its initial value,
/// so the decoded variable stands for `name / initial`.
fn normalized_rate_equation(name: &str, equation: &Equation, initial: f64) -> String {
    format!(
        "d{0}/dt = {1}, with {0} normalized by its initial value {2}",
        name, equation, initial
    )
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let scenario = match args.next() {
        Some(path) => ron::from_str(&fs::read_to_string(&path)?)?,
        None => Scenario::default(),
    };
    let output = args.next();

    let series = TimeSeries::new(scenario.times, scenario.values)?;
    let evaluator = FitnessEvaluator::new(series, scenario.covariates, scenario.fitness)?;
    evaluator.ensure_inputs(&scenario.genetic)?;
    let input_names = scenario.genetic.input_names.clone();

    let mut population =
        Population::<_, _, ExprGenome>::new(scenario.population, scenario.genetic)?;
    let mut logger = EvolutionLogger::new(ReportingLevel::PopulationChampion);
    let stat_extractor =
        |g: &ExprGenome| [g.fitness(), g.evaluation().mse, g.complexity() as f64];

    loop {
        population.evaluate_fitness(|g| evaluator.evaluate(g));
        logger.log(&population, &stat_extractor, ["fitness", "mse", "complexity"]);
        if let Some(log) = logger.last() {
            log::debug!("{}", log);
        }
        if population.termination().is_some() {
            break;
        }
        population.evolve()?;
    }

    let best = population
        .hall_of_fame()
        .best()
        .ok_or("no genome with positive fitness was found")?;
    let equation = Equation::from_genome(best, &input_names);
    println!(
        "Best genome after {} generations (fitness {:.6}, mse {:.4}, complexity {}):",
        population.generation() + 1,
        best.fitness(),
        best.evaluation().mse,
        best.complexity(),
    );
    println!(
        "  {}",
        normalized_rate_equation(&input_names[0], &equation, evaluator.series().initial_value())
    );
    println!("  LaTeX: {}", equation.latex());
    if let Ok(predictions) = evaluator.predict(best) {
        for ((t, observed), predicted) in evaluator
            .series()
            .times()
            .iter()
            .zip(evaluator.series().values())
            .zip(predictions)
        {
            println!("  t = {:>6}: observed {:>8.3}, predicted {:>8.3}", t, observed, predicted);
        }
    }

    let summaries = GenomeSummary::rank_all(population.hall_of_fame().iter(), &input_names);
    let dump = ron::ser::to_string_pretty(&summaries, ron::ser::PrettyConfig::new())?;
    match output {
        Some(path) => fs::write(path, dump)?,
        None => log::info!("hall of fame:\n{}", dump),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use neatgp_expr::genomics::{Connection, GraphDescription, Operation};
    use neatgp_expr::networks::ExpressionNetwork;

    #[test]
    fn default_scenario_round_trips_through_ron() {
        let scenario = Scenario::default();
        let text = ron::to_string(&scenario).unwrap();
        let parsed: Scenario = ron::from_str(&text).unwrap();
        assert_eq!(parsed.values, scenario.values);
        assert_eq!(parsed.genetic.input_names, scenario.genetic.input_names);

        let partial: Scenario = ron::from_str("(times: [0.0, 1.0], values: [2.0, 1.0])").unwrap();
        assert_eq!(partial.times, vec![0.0, 1.0]);
        assert_eq!(partial.population.size, scenario.population.size);
    }

    #[test]
    fn printed_equation_is_marked_normalized() {
        let genome = ExprGenome::from_description(&GraphDescription {
            inputs: vec!["Mn".into()],
            output: 1,
            nodes: vec![
                (0, Operation::Variable(0)),
                (1, Operation::Binary(BinaryOp::Add)),
            ],
            connections: vec![Connection::new(0, 0, 1, 0, -0.02)],
        })
        .unwrap();
        let equation = Equation::from_genome(&genome, &["Mn".to_string()]);
        assert_eq!(
            normalized_rate_equation("Mn", &equation, 51.285),
            "dMn/dt = (((-0.02)*Mn) + 0), with Mn normalized by its initial value 51.285"
        );
    }

    #[test]
    fn recovers_first_order_decay() {
        let scenario = Scenario::default();
        let series = TimeSeries::new(scenario.times, scenario.values).unwrap();
        let evaluator =
            FitnessEvaluator::new(series, scenario.covariates, scenario.fitness).unwrap();
        evaluator.ensure_inputs(&scenario.genetic).unwrap();

        let mut population =
            Population::<_, _, ExprGenome>::new(scenario.population, scenario.genetic).unwrap();
        let mut best_so_far = 0.0;
        loop {
            population.evaluate_fitness(|g| evaluator.evaluate(g));
            let best = population.hall_of_fame().best().unwrap().fitness();
            assert!(best >= best_so_far);
            best_so_far = best;
            if population.termination().is_some() {
                break;
            }
            population.evolve().unwrap();
        }

        let best = population.hall_of_fame().best().unwrap();
        let predicted = evaluator.predict(best).unwrap();
        let final_mn = predicted[predicted.len() - 1];
        assert!(
            (final_mn - 7.904).abs() / 7.904 < 0.2,
            "predicted Mn(90) = {}",
            final_mn
        );

        // The derivative is linear in the state: f(x) = -k·x.
        let mut network = ExpressionNetwork::from(best);
        let at_one = network.evaluate_at(&[1.0]);
        assert!(network.evaluate_at(&[0.0]).abs() < 1e-9);
        assert!((network.evaluate_at(&[0.5]) - 0.5 * at_one).abs() < 1e-9);
        let rate = -at_one;
        assert!((0.019..0.029).contains(&rate), "rate = {}", rate);
    }
}
