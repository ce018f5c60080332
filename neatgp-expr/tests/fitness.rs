use neatgp_expr::fitness::{Covariate, FitnessConfig, FitnessEvaluator, TimeSeries};
use neatgp_expr::genomics::{
    BinaryOp, Connection, ExprGenome, GeneticConfig, GraphDescription, InnovationTracker,
    Operation, UnaryOp,
};

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn decay_series() -> TimeSeries {
    TimeSeries::new(vec![0.0, 30.0, 60.0, 90.0], vec![51.285, 25.447, 18.313, 7.904]).unwrap()
}

/// dx/dt = (w * x)²
fn square(weight: f64) -> ExprGenome {
    ExprGenome::from_description(&GraphDescription {
        inputs: vec!["Mn".into()],
        output: 1,
        nodes: vec![
            (0, Operation::Variable(0)),
            (1, Operation::Binary(BinaryOp::Add)),
            (2, Operation::Unary(UnaryOp::Square)),
        ],
        connections: vec![
            Connection::new(0, 0, 2, 0, weight),
            Connection::new(1, 2, 1, 0, 1.0),
        ],
    })
    .unwrap()
}

proptest! {
    #[test]
    fn fitness_is_bounded(seed in any::<u64>(), rounds in 0usize..40) {
        let config = GeneticConfig {
            input_names: vec!["Mn".into(), "t".into()],
            add_node_chance: 0.5,
            add_connection_chance: 0.5,
            ..GeneticConfig::default()
        };
        let evaluator = FitnessEvaluator::new(
            decay_series(),
            vec![Covariate::State, Covariate::Time { scale: 0.01 }],
            FitnessConfig::default(),
        )
        .unwrap();
        let tracker = InnovationTracker::new(&config);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut genome = ExprGenome::new(&config, &mut rng);
        for _ in 0..rounds {
            genome.mutate_all(&tracker, &config, &mut rng);
        }

        let evaluation = evaluator.evaluate(&genome);
        prop_assert!(evaluation.fitness.is_finite());
        prop_assert!(evaluation.fitness == 0.0 || (evaluation.fitness > 0.0 && evaluation.fitness <= 1.0));
        prop_assert_eq!(evaluation.complexity, genome.complexity());
        if evaluation.fitness > 0.0 {
            prop_assert!(evaluation.mse >= 0.0);
        }
    }
}

#[test]
fn divergent_genomes_score_zero() {
    let config = FitnessConfig {
        admissible_range: (0.0, f64::MAX),
        ..FitnessConfig::default()
    };
    let evaluator = FitnessEvaluator::new(decay_series(), vec![Covariate::State], config).unwrap();

    // x² blows up long before t = 30.
    let genome = square(1.0);
    assert!(evaluator.predict(&genome).is_err());
    let evaluation = evaluator.evaluate(&genome);
    assert_eq!(evaluation.fitness, 0.0);
    assert!(evaluation.is_failure());
}

#[test]
fn clamped_genomes_still_score() {
    let evaluator =
        FitnessEvaluator::new(decay_series(), vec![Covariate::State], FitnessConfig::default())
            .unwrap();
    let evaluation = evaluator.evaluate(&square(1.0));
    assert!(evaluation.fitness > 0.0);
    assert!(evaluation.fitness < 0.1);
}

#[test]
fn better_fits_score_higher() {
    let evaluator =
        FitnessEvaluator::new(decay_series(), vec![Covariate::State], FitnessConfig::default())
            .unwrap();
    let linear = |weight| {
        ExprGenome::from_description(&GraphDescription {
            inputs: vec!["Mn".into()],
            output: 1,
            nodes: vec![
                (0, Operation::Variable(0)),
                (1, Operation::Binary(BinaryOp::Add)),
            ],
            connections: vec![Connection::new(0, 0, 1, 0, weight)],
        })
        .unwrap()
    };
    let good = evaluator.evaluate(&linear(-0.02));
    let poor = evaluator.evaluate(&linear(-0.002));
    assert!(good.fitness > poor.fitness);
    assert!(good.mse < poor.mse);
}
