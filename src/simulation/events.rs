//! Event system for deferred, deterministic state updates.
//!
//! Perception runs against a read-only view of the environment (possibly on
//! many threads) and only emits events. The events are then applied serially
//! so that the outcome never depends on thread scheduling:
//! - claims are resolved claimant by claimant in ascending handle order
//! - within one claimant, nearer targets are resolved first
//! - a food item or prey goes to the first claimant reaching it; later
//!   claims on it are stale and dropped

use std::collections::BTreeMap;

use geo::Coord;
use slotmap::SlotMap;
use tracing::trace;

use super::object::{EnvironmentObject, ObjectId};

/// Events emitted during perception.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationEvent {
    /// An organism reached a fresh food item.
    FoodClaimed {
        /// The hungry organism.
        organism_id: ObjectId,
        /// The food item within its reaction radius.
        food_id: ObjectId,
        /// Distance between the two at tick start.
        distance: f32,
    },
    /// An organism reached a much smaller organism.
    PreyClaimed {
        /// The larger organism.
        predator_id: ObjectId,
        /// The organism within its reaction radius.
        prey_id: ObjectId,
        /// Distance between the two at tick start.
        distance: f32,
    },
    /// An organism decided where to head next.
    MovementDecided {
        /// The deciding organism.
        organism_id: ObjectId,
        /// Desired displacement, before capping to speed.
        movement: Coord<f32>,
    },
}

/// Queue for collecting simulation events from perception.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<SimulationEvent>,
}

impl EventQueue {
    /// Creates an empty event queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an event to the queue.
    pub fn push(&mut self, event: SimulationEvent) {
        self.events.push(event);
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` when no events are queued.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drains all events from the queue.
    pub fn drain(&mut self) -> std::vec::Drain<'_, SimulationEvent> {
        self.events.drain(..)
    }
}

impl FromIterator<SimulationEvent> for EventQueue {
    fn from_iter<I: IntoIterator<Item = SimulationEvent>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

/// What applying a batch of events changed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InteractionOutcome {
    /// Food items eaten.
    pub food_items: usize,
    /// Energy transferred from food to organisms.
    pub food_energy: f32,
    /// Organisms eaten by predators.
    pub predations: usize,
    /// Claims dropped because another claimant got there first.
    pub stale_claims: usize,
}

#[derive(Debug, Clone, Copy)]
enum Claim {
    Food(ObjectId),
    Prey(ObjectId),
}

impl Claim {
    fn target(self) -> ObjectId {
        match self {
            Claim::Food(id) | Claim::Prey(id) => id,
        }
    }
}

/// Applies all queued events to the environment's objects.
///
/// Eaten food is only marked; removing it (and dead organisms) is left to
/// the environment's cleanup phase.
pub fn apply_events(
    objects: &mut SlotMap<ObjectId, EnvironmentObject>,
    mut queue: EventQueue,
) -> InteractionOutcome {
    let mut claims: BTreeMap<ObjectId, Vec<(f32, Claim)>> = BTreeMap::new();
    let mut outcome = InteractionOutcome::default();

    for event in queue.drain() {
        match event {
            SimulationEvent::FoodClaimed {
                organism_id,
                food_id,
                distance,
            } => {
                claims
                    .entry(organism_id)
                    .or_default()
                    .push((distance, Claim::Food(food_id)));
            }
            SimulationEvent::PreyClaimed {
                predator_id,
                prey_id,
                distance,
            } => {
                claims
                    .entry(predator_id)
                    .or_default()
                    .push((distance, Claim::Prey(prey_id)));
            }
            SimulationEvent::MovementDecided {
                organism_id,
                movement,
            } => {
                if let Some(organism) = objects
                    .get_mut(organism_id)
                    .and_then(EnvironmentObject::as_organism_mut)
                {
                    organism.set_intent(movement);
                }
            }
        }
    }

    for (claimant, mut list) in claims {
        list.sort_by(|(da, a), (db, b)| da.total_cmp(db).then_with(|| a.target().cmp(&b.target())));

        for (_, claim) in list {
            let claimant_alive = objects
                .get(claimant)
                .and_then(EnvironmentObject::as_organism)
                .is_some_and(|organism| organism.is_alive());
            if !claimant_alive {
                break;
            }

            let gained = match claim {
                Claim::Food(food_id) => objects
                    .get_mut(food_id)
                    .and_then(EnvironmentObject::as_food_mut)
                    .and_then(|food| food.consume()),
                Claim::Prey(prey_id) => objects
                    .get_mut(prey_id)
                    .and_then(EnvironmentObject::as_organism_mut)
                    .filter(|prey| prey.is_alive())
                    .map(|prey| {
                        let energy = prey.energy.max(0.0);
                        prey.kill();
                        energy
                    }),
            };

            let Some(energy) = gained else {
                trace!(?claimant, target = ?claim.target(), "claim already taken");
                outcome.stale_claims += 1;
                continue;
            };

            if let Some(organism) = objects
                .get_mut(claimant)
                .and_then(EnvironmentObject::as_organism_mut)
            {
                organism.gain_energy(energy);
                match claim {
                    Claim::Food(food_id) => {
                        organism.food_eaten += 1;
                        outcome.food_items += 1;
                        outcome.food_energy += energy;
                        trace!(?claimant, ?food_id, energy, "food consumed");
                    }
                    Claim::Prey(prey_id) => {
                        outcome.predations += 1;
                        trace!(?claimant, ?prey_id, energy, "organism eaten");
                    }
                }
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::simulation::food::Food;
    use crate::simulation::genes::Genes;
    use crate::simulation::organism::Organism;

    fn organism(size_gene: u8, energy: f32) -> EnvironmentObject {
        Organism::new(Genes::from_dna([0, size_gene, 12, 255]), energy)
            .with_life_consumption(Arc::new(|_: &Organism| 0.0))
            .into()
    }

    fn energy_of(objects: &SlotMap<ObjectId, EnvironmentObject>, id: ObjectId) -> f32 {
        objects[id].as_organism().unwrap().energy
    }

    #[test]
    fn test_queue_push_and_drain() {
        let mut objects = SlotMap::with_key();
        let id = objects.insert(organism(8, 10.0));

        let mut queue = EventQueue::new();
        assert!(queue.is_empty());
        queue.push(SimulationEvent::MovementDecided {
            organism_id: id,
            movement: Coord { x: 1.0, y: 0.0 },
        });
        assert_eq!(queue.len(), 1);

        let outcome = apply_events(&mut objects, queue);
        assert_eq!(outcome, InteractionOutcome::default());
        assert_eq!(
            objects[id].as_organism().unwrap().movement(),
            Coord { x: 1.0, y: 0.0 }
        );
    }

    #[test]
    fn test_outcome_counts_food_and_stale_claims() {
        let mut objects = SlotMap::with_key();
        let first = objects.insert(organism(8, 10.0));
        let second = objects.insert(organism(8, 10.0));
        let food = objects.insert(Food::new(4.0).into());

        let queue: EventQueue = [
            SimulationEvent::FoodClaimed {
                organism_id: second,
                food_id: food,
                distance: 0.5,
            },
            SimulationEvent::FoodClaimed {
                organism_id: first,
                food_id: food,
                distance: 1.5,
            },
        ]
        .into_iter()
        .collect();

        let outcome = apply_events(&mut objects, queue);

        assert_eq!(outcome.food_items, 1);
        assert_eq!(outcome.food_energy, 4.0);
        assert_eq!(outcome.stale_claims, 1);
        // the lower handle resolves first even though it is farther away
        assert_eq!(energy_of(&objects, first), 14.0);
        assert_eq!(energy_of(&objects, second), 10.0);
        assert!(!objects[food].as_food().unwrap().can_be_eaten());
    }

    #[test]
    fn test_eaten_claimant_loses_its_claims() {
        let mut objects = SlotMap::with_key();
        let predator = objects.insert(organism(32, 10.0));
        let prey = objects.insert(organism(8, 5.0));
        let food = objects.insert(Food::new(4.0).into());

        let queue: EventQueue = [
            SimulationEvent::FoodClaimed {
                organism_id: prey,
                food_id: food,
                distance: 1.0,
            },
            SimulationEvent::PreyClaimed {
                predator_id: predator,
                prey_id: prey,
                distance: 3.0,
            },
        ]
        .into_iter()
        .collect();

        let outcome = apply_events(&mut objects, queue);

        assert_eq!(outcome.predations, 1);
        assert_eq!(outcome.food_items, 0);
        assert_eq!(energy_of(&objects, predator), 15.0);
        assert!(objects[food].as_food().unwrap().can_be_eaten());
    }
}
