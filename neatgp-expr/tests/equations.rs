use neatgp_expr::equations::{parse, Equation};
use neatgp_expr::genomics::{ExprGenome, GeneticConfig, InnovationTracker};
use neatgp_expr::networks::ExpressionNetwork;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn agrees(a: f64, b: f64) -> bool {
    if a.is_nan() && b.is_nan() || a == b {
        return true;
    }
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

#[test]
fn parsed_equations_evaluate_like_networks() {
    let config = GeneticConfig {
        input_names: vec!["Mn".into(), "t".into(), "Xc".into()],
        constant_count: 2,
        add_node_chance: 0.4,
        binary_node_chance: 0.5,
        add_connection_chance: 0.4,
        change_operation_chance: 0.1,
        weight_mutation_power: 0.5,
        ..GeneticConfig::default()
    };
    let tracker = InnovationTracker::new(&config);
    let mut rng = StdRng::seed_from_u64(42);

    for trial in 0..100 {
        let mut genome = ExprGenome::new(&config, &mut rng);
        for _ in 0..rng.gen_range(0..30) {
            genome.mutate_all(&tracker, &config, &mut rng);
        }

        let equation = Equation::from_genome(&genome, &config.input_names);
        let expression = parse(equation.plain(), &config.input_names)
            .unwrap_or_else(|e| panic!("genome {} rendered as {:?}: {}", trial, equation.plain(), e));
        let mut network = ExpressionNetwork::from(&genome);

        for _ in 0..20 {
            let inputs: Vec<f64> = (0..config.input_names.len())
                .map(|_| rng.gen_range(-5.0..5.0))
                .collect();
            let expected = network.evaluate_at(&inputs);
            let parsed = expression.evaluate(&inputs);
            assert!(
                agrees(expected, parsed),
                "{} at {:?}: network {}, parsed {}",
                equation,
                inputs,
                expected,
                parsed
            );
        }
    }
}

#[test]
fn latex_has_no_plain_operators() {
    let config = GeneticConfig {
        input_names: vec!["Mn".into()],
        add_node_chance: 0.5,
        ..GeneticConfig::default()
    };
    let tracker = InnovationTracker::new(&config);
    let mut rng = StdRng::seed_from_u64(8);
    for _ in 0..20 {
        let mut genome = ExprGenome::new(&config, &mut rng);
        for _ in 0..10 {
            genome.mutate_all(&tracker, &config, &mut rng);
        }
        let equation = Equation::from_genome(&genome, &config.input_names);
        assert!(!equation.latex().contains('*'), "{}", equation.latex());
        assert!(!equation.latex().contains("sqrt("), "{}", equation.latex());
    }
}
