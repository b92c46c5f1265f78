#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use std::sync::Arc;

use simevo::simulation::environment::Environment;
use simevo::simulation::food::Food;
use simevo::simulation::genes::Genes;
use simevo::simulation::geometric_utils::Position;
use simevo::simulation::organism::Organism;
use simevo::simulation::params::Params;
use simevo::simulation::stats::{StatsHistory, TickStats, TraitSummary};

fn create_test_params() -> Params {
    Params {
        width: 100.0,
        height: 100.0,
        parallel: false,
        seed: Some(5),
        ..Params::default()
    }
}

#[test]
fn test_tick_stats_after_meal() {
    let mut env = Environment::new(create_test_params()).unwrap();
    let organism = Organism::new(Genes::from_dna([0, 8, 12, 40]), 10.0)
        .with_life_consumption(Arc::new(|_: &Organism| 1.0));
    env.add_organism(organism, Position::new(10.0, 10.0)).unwrap();
    env.add_food(Food::new(4.0), Position::new(11.0, 10.0)).unwrap();
    env.add_food(Food::new(4.0), Position::new(90.0, 90.0)).unwrap();

    env.step();
    let stats = TickStats::from_environment(&env);

    assert_eq!(stats.tick, 1);
    assert_eq!(stats.organisms, 1);
    assert_eq!(stats.food, 1);
    assert_eq!(stats.deaths, 0);
    assert_eq!(stats.food_consumed, 4.0);
    assert_eq!(stats.mean_energy, 13.0);
}

#[test]
fn test_trait_summary() {
    let mut env = Environment::new(create_test_params()).unwrap();
    assert!(TraitSummary::from_environment(&env).is_none());

    env.populate(3, &Genes::from_dna([40, 8, 20, 10])).unwrap();
    env.populate(1, &Genes::from_dna([40, 24, 20, 10])).unwrap();
    env.spawn_food_randomly(5).unwrap();

    let summary = TraitSummary::from_environment(&env).unwrap();

    assert_eq!(summary.mean, [10.0, 3.0, 5.0]);
    assert_eq!(summary.std_dev[0], 0.0);
    // sizes 2, 2, 2, 6
    assert!((summary.std_dev[1] - 3.0_f32.sqrt()).abs() < 1e-5);
    assert_eq!(summary.std_dev[2], 0.0);
}

#[test]
fn test_history_is_bounded() {
    let mut env = Environment::new(create_test_params()).unwrap();
    env.populate(10, &Genes::from_dna([20, 16, 40, 200])).unwrap();
    env.spawn_food_randomly(30).unwrap();

    let mut history = StatsHistory::new(5);
    assert!(history.is_empty());
    assert_eq!(history.avg_organisms(), 0.0);

    env.simulate(12, |env| history.record(env));

    assert_eq!(history.len(), 5);
    assert_eq!(history.latest().unwrap().tick, env.tick());
    assert_eq!(history.ticks.front().unwrap().tick, env.tick() - 4);
    assert!(history.avg_organisms() > 0.0);
}
