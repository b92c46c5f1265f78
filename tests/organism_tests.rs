#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use std::sync::Arc;

use geo::coord;
use rand::SeedableRng;
use rand::rngs::StdRng;
use simevo::simulation::error::GenesError;
use simevo::simulation::food::{Food, FoodState};
use simevo::simulation::genes::{Dna, Genes};
use simevo::simulation::geometric_utils::{Position, get_distance};
use simevo::simulation::locatable::Locatable;
use simevo::simulation::object::ObjectId;
use simevo::simulation::organism::{DeathCause, Organism, Sighting, Target};
use slotmap::SlotMap;

fn handles(count: usize) -> Vec<ObjectId> {
    let mut keys: SlotMap<ObjectId, ()> = SlotMap::with_key();
    (0..count).map(|_| keys.insert(())).collect()
}

fn create_test_organism() -> Organism {
    // speed 5, size 4, awareness 10, lifespan 820
    let mut organism = Organism::new(Genes::from_dna([20, 16, 40, 40]), 100.0);
    organism.set_pos(Position::new(50.0, 50.0));
    organism
}

#[test]
fn test_genes_from_dna_string() {
    let genes = Genes::from_dna_str("((((").unwrap();

    assert_eq!(genes.dna(), &[40, 40, 40, 40]);
    assert_eq!(genes.speed(), 10.0);
    assert_eq!(genes.size(), 10.0);
    assert_eq!(genes.awareness(), 10.0);
    assert_eq!(genes.lifespan(), 41 * 20);
}

#[test]
fn test_genes_reject_wrong_length() {
    assert_eq!(
        Genes::from_dna_str("abc").unwrap_err(),
        GenesError::InvalidLength(3)
    );
    assert_eq!(
        Genes::new(&[1, 2, 3, 4, 5]).unwrap_err(),
        GenesError::InvalidLength(5)
    );
}

#[test]
fn test_default_mutation_stays_close() {
    let parent = Genes::from_dna([0, 128, 255, 7]);

    for _ in 0..50 {
        let child = parent.mutated();
        for (a, b) in child.dna().iter().zip(parent.dna()) {
            assert!((i16::from(*a) - i16::from(*b)).abs() <= 1);
        }
    }
    assert_eq!(parent.dna(), &[0, 128, 255, 7]);
}

#[test]
fn test_custom_mutation() {
    let genes = Genes::with_mutation(
        [1, 2, 3, 4],
        Arc::new(|dna: &mut Dna| dna.iter_mut().for_each(|byte| *byte *= 2)),
    );

    let child = genes.mutated();
    assert_eq!(child.dna(), &[2, 4, 6, 8]);
    // the mutation function is inherited
    assert_eq!(child.mutated().dna(), &[4, 8, 12, 16]);
    assert_eq!(genes.dna(), &[1, 2, 3, 4]);
}

#[test]
fn test_default_life_consumption() {
    let organism = Organism::new(Genes::from_dna([40, 40, 40, 40]), 10.0);
    // ((10/10)^2 + (10/10)^2 * 10 / 15 + 10/10) * 1.3
    let expected = (1.0 + 10.0 / 15.0 + 1.0) * 1.3;
    assert!((organism.life_consumption() - expected).abs() < 1e-5);
}

#[test]
fn test_radii_follow_genes() {
    let organism = create_test_organism();

    assert_eq!(organism.speed(), 5.0);
    assert_eq!(organism.size(), 4.0);
    assert_eq!(organism.reaction_radius(), 4.0);
    assert_eq!(organism.awareness_radius(), 14.0);
    assert!(organism.reaction_radius() <= organism.awareness_radius());
}

#[test]
fn test_live_one_tick() {
    let mut organism =
        create_test_organism().with_life_consumption(Arc::new(|organism: &Organism| {
            organism.size() / 2.0
        }));

    organism.live_one_tick();

    assert_eq!(organism.energy, 98.0);
    assert_eq!(organism.age, 1);
    assert!(organism.is_alive());
}

#[test]
fn test_death_causes() {
    let mut organism = create_test_organism();
    assert_eq!(organism.death_cause(), None);

    organism.age = organism.lifespan();
    assert_eq!(organism.death_cause(), Some(DeathCause::OldAge));

    organism.energy = 0.0;
    assert_eq!(organism.death_cause(), Some(DeathCause::Starved));

    organism.kill();
    assert_eq!(organism.death_cause(), Some(DeathCause::Eaten));
    assert!(!organism.is_alive());
}

#[test]
fn test_react_moves_towards_nearest_food() {
    let organism = create_test_organism();
    let ids = handles(2);
    let sightings = [
        Sighting {
            id: ids[0],
            pos: Position::new(60.0, 50.0),
            distance: 10.0,
            target: Target::Food,
        },
        Sighting {
            id: ids[1],
            pos: Position::new(50.0, 47.0),
            distance: 3.0,
            target: Target::Food,
        },
    ];

    assert_eq!(
        organism.react(&sightings, 1.5),
        Some(coord! { x: 0.0, y: -3.0 })
    );
    assert_eq!(organism.react(&[], 1.5), None);
}

#[test]
fn test_react_flees_and_chases() {
    let organism = create_test_organism();
    let ids = handles(1);
    let other = |size: f32| Sighting {
        id: ids[0],
        pos: Position::new(53.0, 54.0),
        distance: 5.0,
        target: Target::Organism { size },
    };

    // much larger: flee
    assert_eq!(
        organism.react(&[other(7.0)], 1.5),
        Some(coord! { x: -3.0, y: -4.0 })
    );
    // much smaller: chase
    assert_eq!(
        organism.react(&[other(2.0)], 1.5),
        Some(coord! { x: 3.0, y: 4.0 })
    );
    // similar size: ignore
    assert_eq!(organism.react(&[other(4.0)], 1.5), None);
}

#[test]
fn test_next_position_is_capped_at_speed() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut organism = create_test_organism();

    organism.set_intent(coord! { x: 30.0, y: 40.0 });
    let next = organism.next_position(&mut rng, 0.8);
    assert!((get_distance(organism.pos, next) - 5.0).abs() < 1e-5);
    assert!((next.x() - 53.0).abs() < 1e-5);
    assert!((next.y() - 54.0).abs() < 1e-5);

    for _ in 0..100 {
        let next = organism.next_position(&mut rng, 0.8);
        assert!(get_distance(organism.pos, next) <= organism.speed() + 1e-4);
    }
}

#[test]
fn test_full_persistence_keeps_heading() {
    let mut rng = StdRng::seed_from_u64(9);
    let mut organism = create_test_organism();
    organism.set_intent(coord! { x: 5.0, y: 0.0 });
    organism.next_position(&mut rng, 1.0);

    for _ in 0..10 {
        organism.next_position(&mut rng, 1.0);
        assert_eq!(organism.movement(), coord! { x: 5.0, y: 0.0 });
    }
}

#[test]
fn test_reproduce_splits_energy() {
    let mut parent = create_test_organism()
        .with_life_consumption(Arc::new(|_: &Organism| 0.5));
    parent.energy = 1200.0;
    assert!(parent.can_reproduce(1000.0));

    let child = parent.reproduce();

    assert_eq!(parent.energy, 600.0);
    assert_eq!(child.energy, 600.0);
    assert_eq!(child.pos, Position::new(52.0, 52.0));
    assert_eq!(child.age, 0);
    assert_eq!(child.life_consumption(), 0.5);
    assert!(!parent.can_reproduce(1000.0));
}

#[test]
fn test_food_is_consumed_once() {
    let mut food = Food::new(7.5);
    assert!(food.can_be_eaten());

    assert_eq!(food.consume(), Some(7.5));
    assert_eq!(food.state(), FoodState::Eaten);
    assert_eq!(food.consume(), None);
    assert!(!food.can_be_eaten());
}
