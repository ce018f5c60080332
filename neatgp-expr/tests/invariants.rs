use neatgp::{Evaluation, Genome};
use neatgp_expr::genomics::{ExprGenome, GeneticConfig, InnovationTracker, UnaryOp};

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn volatile_config() -> GeneticConfig {
    GeneticConfig {
        input_names: vec!["Mn".into(), "t".into()],
        constant_count: 2,
        add_node_chance: 0.5,
        binary_node_chance: 0.4,
        add_connection_chance: 0.5,
        change_operation_chance: 0.2,
        weight_mutation_power: 1.0,
        ..GeneticConfig::default()
    }
}

fn mutated(
    tracker: &InnovationTracker,
    config: &GeneticConfig,
    rng: &mut StdRng,
    rounds: usize,
) -> ExprGenome {
    let mut genome = ExprGenome::new(config, rng);
    for _ in 0..rounds {
        genome.mutate_all(tracker, config, rng);
    }
    genome
}

fn with_fitness(mut genome: ExprGenome, fitness: f64) -> ExprGenome {
    let complexity = genome.complexity();
    genome.set_evaluation(Evaluation {
        fitness,
        mse: 0.0,
        complexity,
    });
    genome
}

proptest! {
    #[test]
    fn mutation_preserves_invariants(seed in any::<u64>(), rounds in 1usize..60) {
        let config = volatile_config();
        let tracker = InnovationTracker::new(&config);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut genome = ExprGenome::new(&config, &mut rng);
        for _ in 0..rounds {
            genome.mutate_all(&tracker, &config, &mut rng);
            prop_assert_eq!(genome.check_invariants(), Ok(()));
        }
    }

    #[test]
    fn operands_respect_arity(seed in any::<u64>(), rounds in 1usize..60) {
        let config = volatile_config();
        let tracker = InnovationTracker::new(&config);
        let genome = mutated(&tracker, &config, &mut StdRng::seed_from_u64(seed), rounds);
        for node in genome.nodes() {
            let fed = genome
                .connections()
                .filter(|c| c.enabled() && c.output() == node.id())
                .count();
            prop_assert!(fed <= node.arity());
        }
        prop_assert!(genome.connections().all(|c| c.input() != genome.output()));
        let output_layer = genome.node(genome.output()).map(|n| n.layer()).unwrap();
        prop_assert!(genome
            .nodes()
            .all(|n| n.id() == genome.output() || n.layer() < output_layer));
    }

    #[test]
    fn crossover_preserves_invariants(
        seed in any::<u64>(),
        rounds in 1usize..40,
        fitness in (0.0..1.0f64, 0.0..1.0f64),
    ) {
        let config = volatile_config();
        let tracker = InnovationTracker::new(&config);
        let mut rng = StdRng::seed_from_u64(seed);
        let first = with_fitness(mutated(&tracker, &config, &mut rng, rounds), fitness.0);
        let second = with_fitness(mutated(&tracker, &config, &mut rng, rounds), fitness.1);

        let child = ExprGenome::mate(&first, &second, &config, &mut rng);
        prop_assert_eq!(child.check_invariants(), Ok(()));
        prop_assert_eq!(child.output(), first.output());
    }

    #[test]
    fn genetic_distance_is_symmetric(seed in any::<u64>(), rounds in 1usize..30) {
        let config = volatile_config();
        let tracker = InnovationTracker::new(&config);
        let mut rng = StdRng::seed_from_u64(seed);
        let first = mutated(&tracker, &config, &mut rng, rounds);
        let second = mutated(&tracker, &config, &mut rng, rounds);
        let forward = ExprGenome::genetic_distance(&first, &second, &config);
        let backward = ExprGenome::genetic_distance(&second, &first, &config);
        prop_assert!((forward - backward).abs() < 1e-12);
        prop_assert!(forward >= 0.0);
    }
}

#[test]
fn identical_mutations_share_innovations() {
    let config = GeneticConfig {
        initial_expression_chance: 0.0,
        ..volatile_config()
    };
    let tracker = InnovationTracker::new(&config);
    let mut rng = StdRng::seed_from_u64(3);
    let output = config.output_id();

    let mut first = ExprGenome::new(&config, &mut rng);
    let mut second = ExprGenome::new(&config, &mut rng);
    let a = first
        .add_connection(&tracker, 1, output, 0, 0.5)
        .unwrap()
        .innovation();
    let b = second
        .add_connection(&tracker, 1, output, 0, -2.0)
        .unwrap()
        .innovation();
    assert_eq!(a, b);

    // Splitting the same connection in both genomes
    // yields the same node and connections.
    let node_a = first.split_connection(&tracker, a, UnaryOp::Exp).unwrap();
    let node_b = second.split_connection(&tracker, b, UnaryOp::Log).unwrap();
    assert_eq!(node_a, node_b);
    let innovations = |g: &ExprGenome| g.connections().map(|c| c.innovation()).collect::<Vec<_>>();
    assert_eq!(innovations(&first), innovations(&second));
}

#[test]
fn tracker_is_consistent_across_threads() {
    let config = volatile_config();
    let tracker = InnovationTracker::new(&config);
    let output = config.output_id();

    let assigned: Vec<Vec<usize>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    (0..output)
                        .map(|input| tracker.connection_innovation(input, output + 7, 0))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(assigned.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(tracker.connection_count(), output * 2 + output);
}
