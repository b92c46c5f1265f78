use simevo::simulation::environment::Environment;
use simevo::simulation::error::EnvironmentError;
use simevo::simulation::genes::Genes;
use simevo::simulation::params::{IndexKind, Params};
use simevo::simulation::stats::{StatsHistory, TraitSummary};
use tracing::info;

const GENERATIONS: usize = 100;
const TICKS_PER_GENERATION: usize = 100;
const INITIAL_ORGANISMS: usize = 50;
const FOOD_PER_GENERATION: usize = 50;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn main() -> Result<(), EnvironmentError> {
    init_tracing();

    let params = Params {
        width: 1000.0,
        height: 1000.0,
        index: IndexKind::Optimized,
        ..Params::default()
    };
    let mut env = Environment::new(params)?;
    let mut history = StatsHistory::new(TICKS_PER_GENERATION);

    env.populate(INITIAL_ORGANISMS, &Genes::from_dna([40; 4]))?;
    info!(organisms = env.organism_count(), "starting simulation");

    for generation in 0..GENERATIONS {
        env.spawn_food_randomly(FOOD_PER_GENERATION)?;

        let ticks = env.simulate(TICKS_PER_GENERATION, |env| history.record(env));
        let offspring = env.reproduce_organisms()?;
        let leftover_food = env.remove_all_food();

        info!(
            generation,
            ticks,
            organisms = env.organism_count(),
            offspring = offspring.len(),
            leftover_food,
            deaths = history.total_deaths(),
            avg_food_consumed = history.avg_food_consumed(),
            "generation complete"
        );
        if let Some(traits) = TraitSummary::from_environment(&env) {
            info!(
                generation,
                speed = traits.mean[0],
                size = traits.mean[1],
                awareness = traits.mean[2],
                "mean traits"
            );
        }

        if env.organism_count() == 0 {
            info!(generation, "population died out");
            break;
        }
    }

    Ok(())
}
