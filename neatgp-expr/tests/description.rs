use neatgp_expr::genomics::{ExprGenome, GeneticConfig, GraphDescription, InnovationTracker};

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn structure(genome: &ExprGenome) -> Vec<(usize, usize, usize, bool)> {
    genome
        .connections()
        .map(|c| (c.innovation(), c.input(), c.output(), c.enabled()))
        .collect()
}

proptest! {
    #[test]
    fn descriptions_rebuild_the_genome(seed in any::<u64>(), rounds in 0usize..40) {
        let config = GeneticConfig {
            input_names: vec!["Mn".into(), "t".into()],
            constant_count: 1,
            add_node_chance: 0.4,
            add_connection_chance: 0.4,
            ..GeneticConfig::default()
        };
        let tracker = InnovationTracker::new(&config);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut genome = ExprGenome::new(&config, &mut rng);
        for _ in 0..rounds {
            genome.mutate_all(&tracker, &config, &mut rng);
        }

        let description = genome.describe(&config.input_names);
        let rebuilt = ExprGenome::from_description(&description).unwrap();
        prop_assert_eq!(rebuilt.describe(&config.input_names), description.clone());
        prop_assert_eq!(structure(&rebuilt), structure(&genome));
        let layers = |g: &ExprGenome| g.nodes().map(|n| (n.id(), n.layer())).collect::<Vec<_>>();
        prop_assert_eq!(layers(&rebuilt), layers(&genome));

        let json = serde_json::to_string(&description).unwrap();
        let parsed: GraphDescription = serde_json::from_str(&json).unwrap();
        let restored = ExprGenome::from_description(&parsed).unwrap();
        prop_assert_eq!(structure(&restored), structure(&genome));
        prop_assert_eq!(parsed.inputs, config.input_names);
    }
}
