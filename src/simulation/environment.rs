//! The simulation world: object ownership, spatial queries and the tick loop.
//!
//! The environment owns every organism and food item in a generational slot
//! map and mirrors their positions in a spatial index. Each tick runs four
//! phases:
//! 1. Snapshot: per-tick metrics are reset and the index is synced with
//!    object positions
//! 2. Perceive and act: every organism queries its surroundings against the
//!    tick-start snapshot (optionally in parallel with rayon) and emits
//!    events, which are then resolved serially
//! 3. Consume: every organism pays its life consumption and ages one tick
//! 4. Cleanup: dead organisms and eaten food leave the collections and the
//!    index; survivors move

use geo::Rect;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use slotmap::SlotMap;
use tracing::{debug, error, trace, warn};

use super::error::{EnvironmentError, SpatialError};
use super::events::{self, EventQueue, SimulationEvent};
use super::food::Food;
use super::genes::Genes;
use super::geometric_utils::{Position, clamp_to_rect, contains_inclusive, extent};
use super::locatable::Locatable;
use super::object::{EnvironmentObject, ObjectId, ObjectKind};
use super::organism::{DeathCause, Organism, Sighting, Target};
use super::params::{IndexKind, Params};
use super::spatial::{
    LinearSpatialIndex, OptimizedSpatialIndex, SpatialIndex, SpatialQueryResult,
};

/// An organism removed from the environment during the last tick.
#[derive(Debug, Clone)]
pub struct DeadOrganism {
    /// Handle the organism had while alive.
    pub id: ObjectId,
    /// Final state of the organism.
    pub organism: Organism,
    /// Why it died.
    pub cause: DeathCause,
}

/// The simulation world.
///
/// Manages organisms and food, and handles all per-tick simulation logic
/// including parallel perception, conflict resolution and cleanup.
pub struct Environment {
    params: Params,
    index: Box<dyn SpatialIndex<ObjectId>>,
    objects: SlotMap<ObjectId, EnvironmentObject>,
    dead_organisms: Vec<DeadOrganism>,
    food_consumed: f32,
    food_consumed_count: usize,
    tick: u64,
    rng: StdRng,
}

impl Environment {
    /// Creates an empty environment.
    ///
    /// # Arguments
    ///
    /// * `params` - Dimensions, index type and behaviour parameters
    ///
    /// # Returns
    ///
    /// The environment, [`EnvironmentError::InvalidDimensions`] if the
    /// extent is not strictly positive and finite, or
    /// [`EnvironmentError::InvalidParams`] if [`Params::validate`] rejects
    /// any other parameter.
    pub fn new(params: Params) -> Result<Self, EnvironmentError> {
        let (width, height) = (params.width, params.height);
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(EnvironmentError::InvalidDimensions { width, height });
        }
        params
            .validate()
            .map_err(|err| EnvironmentError::InvalidParams(err.to_string()))?;

        let bounds = extent(width, height);
        let index: Box<dyn SpatialIndex<ObjectId>> = match params.index {
            IndexKind::Optimized => Box::new(OptimizedSpatialIndex::new(
                bounds,
                params.node_capacity,
                params.max_depth,
                params.min_node_size,
            )),
            IndexKind::Linear => Box::new(LinearSpatialIndex::new(bounds)),
        };
        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Self {
            params,
            index,
            objects: SlotMap::with_key(),
            dead_organisms: Vec::new(),
            food_consumed: 0.0,
            food_consumed_count: 0,
            tick: 0,
            rng,
        })
    }

    /// Horizontal extent.
    pub fn width(&self) -> f32 {
        self.params.width
    }

    /// Vertical extent.
    pub fn height(&self) -> f32 {
        self.params.height
    }

    /// Parameters this environment was created with.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Number of completed ticks.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Adds an organism at `pos`.
    ///
    /// Fails with [`SpatialError::OutOfBounds`] if `pos` lies outside the environment.
    pub fn add_organism(
        &mut self,
        organism: Organism,
        pos: Position,
    ) -> Result<ObjectId, EnvironmentError> {
        self.add(organism.into(), pos)
    }

    /// Adds a food item at `pos`.
    ///
    /// Fails if `pos` lies outside the environment or the food carries no energy.
    pub fn add_food(&mut self, food: Food, pos: Position) -> Result<ObjectId, EnvironmentError> {
        let energy = food.energy();
        if !(energy.is_finite() && energy > 0.0) {
            return Err(EnvironmentError::InvalidFoodEnergy(energy));
        }
        self.add(food.into(), pos)
    }

    fn add(&mut self, mut object: EnvironmentObject, pos: Position) -> Result<ObjectId, EnvironmentError> {
        if !contains_inclusive(&self.index.bounds(), pos) {
            warn!(x = pos.x(), y = pos.y(), kind = ?object.kind(), "rejected placement outside the environment");
            return Err(SpatialError::OutOfBounds {
                x: pos.x(),
                y: pos.y(),
            }
            .into());
        }

        object.set_pos(pos);
        let id = self.objects.insert(object);
        if let Err(err) = self.index.insert(id, pos) {
            self.objects.remove(id);
            return Err(err.into());
        }
        Ok(id)
    }

    /// Removes an object from the environment and the spatial index.
    ///
    /// # Returns
    ///
    /// The removed object, or [`EnvironmentError::UnknownObject`] for a stale handle.
    pub fn remove(&mut self, id: ObjectId) -> Result<EnvironmentObject, EnvironmentError> {
        if !self.objects.contains_key(id) {
            return Err(EnvironmentError::UnknownObject(id));
        }
        self.index.remove(id)?;
        self.objects
            .remove(id)
            .ok_or(EnvironmentError::UnknownObject(id))
    }

    /// Moves an object to `pos`, keeping the spatial index in sync.
    pub fn relocate(&mut self, id: ObjectId, pos: Position) -> Result<(), EnvironmentError> {
        let object = self
            .objects
            .get_mut(id)
            .ok_or(EnvironmentError::UnknownObject(id))?;
        self.index.update(id, pos)?;
        object.set_pos(pos);
        Ok(())
    }

    /// Clears all objects, dead organisms and counters.
    pub fn reset(&mut self) {
        self.index.clear();
        self.objects.clear();
        self.dead_organisms.clear();
        self.food_consumed = 0.0;
        self.food_consumed_count = 0;
        self.tick = 0;
    }

    /// Returns the object behind `id`, if it is still alive.
    pub fn get(&self, id: ObjectId) -> Option<&EnvironmentObject> {
        self.objects.get(id)
    }

    /// Returns the organism behind `id`.
    pub fn organism(&self, id: ObjectId) -> Result<&Organism, EnvironmentError> {
        self.objects
            .get(id)
            .ok_or(EnvironmentError::UnknownObject(id))?
            .as_organism()
            .ok_or(EnvironmentError::WrongKind {
                id,
                expected: ObjectKind::Organism,
            })
    }

    /// Returns the organism behind `id` mutably.
    ///
    /// Positions changed through this reference are picked up at the start
    /// of the next tick; use [`Environment::relocate`] to move immediately.
    pub fn organism_mut(&mut self, id: ObjectId) -> Result<&mut Organism, EnvironmentError> {
        self.objects
            .get_mut(id)
            .ok_or(EnvironmentError::UnknownObject(id))?
            .as_organism_mut()
            .ok_or(EnvironmentError::WrongKind {
                id,
                expected: ObjectKind::Organism,
            })
    }

    /// Returns the food item behind `id`.
    pub fn food(&self, id: ObjectId) -> Result<&Food, EnvironmentError> {
        self.objects
            .get(id)
            .ok_or(EnvironmentError::UnknownObject(id))?
            .as_food()
            .ok_or(EnvironmentError::WrongKind {
                id,
                expected: ObjectKind::Food,
            })
    }

    /// Position the spatial index holds for `id`.
    pub fn position_of(&self, id: ObjectId) -> Result<Position, EnvironmentError> {
        self.index
            .position(id)
            .ok_or(EnvironmentError::UnknownObject(id))
    }

    /// All objects within `radius` of `center`.
    pub fn query_radius(&self, center: Position, radius: f32) -> SpatialQueryResult<ObjectId> {
        self.index.query_radius(center, radius)
    }

    /// All other objects within `radius` of the object behind `id`.
    pub fn neighbors(
        &self,
        id: ObjectId,
        radius: f32,
    ) -> Result<SpatialQueryResult<ObjectId>, EnvironmentError> {
        let center = self.position_of(id)?;
        let mut found = self.index.query_radius(center, radius);
        found.retain(|&(_, other)| other != id);
        Ok(found)
    }

    /// All live objects.
    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &EnvironmentObject)> {
        self.objects.iter()
    }

    /// All live organisms.
    pub fn organisms(&self) -> impl Iterator<Item = (ObjectId, &Organism)> {
        self.objects
            .iter()
            .filter_map(|(id, object)| object.as_organism().map(|organism| (id, organism)))
    }

    /// All food items still in the environment.
    pub fn foods(&self) -> impl Iterator<Item = (ObjectId, &Food)> {
        self.objects
            .iter()
            .filter_map(|(id, object)| object.as_food().map(|food| (id, food)))
    }

    /// Number of live organisms.
    pub fn organism_count(&self) -> usize {
        self.organisms().count()
    }

    /// Number of food items.
    pub fn food_count(&self) -> usize {
        self.foods().count()
    }

    /// Organisms that died during the last tick.
    pub fn dead_organisms(&self) -> &[DeadOrganism] {
        &self.dead_organisms
    }

    /// Energy of all food eaten during the last tick.
    pub fn food_consumed(&self) -> f32 {
        self.food_consumed
    }

    /// Number of food items eaten during the last tick.
    pub fn food_consumed_count(&self) -> usize {
        self.food_consumed_count
    }

    /// Advances the simulation by one tick.
    pub fn step(&mut self) {
        // snapshot
        self.dead_organisms.clear();
        self.food_consumed = 0.0;
        self.food_consumed_count = 0;
        self.sync_positions();

        // perceive and act: read-only against the snapshot, then resolve serially
        let queue = self.perceive();
        let queued = queue.len();
        let outcome = events::apply_events(&mut self.objects, queue);

        // consume
        for object in self.objects.values_mut() {
            if let EnvironmentObject::Organism(organism) = object {
                organism.live_one_tick();
            }
        }

        self.cleanup();
        debug_assert_eq!(outcome.food_items, self.food_consumed_count);
        debug_assert!(
            (outcome.food_energy - self.food_consumed).abs() <= 1e-3 * self.food_consumed.max(1.0),
            "eaten food energy {} does not match the removed food energy {}",
            outcome.food_energy,
            self.food_consumed
        );

        self.move_organisms();
        self.tick += 1;

        debug!(
            tick = self.tick,
            events = queued,
            organisms = self.organism_count(),
            food = self.food_count(),
            deaths = self.dead_organisms.len(),
            food_consumed = self.food_consumed,
            food_items = outcome.food_items,
            predations = outcome.predations,
            stale_claims = outcome.stale_claims,
            "tick complete"
        );
        debug_assert!(
            self.check_consistency().is_ok(),
            "environment diverged from its spatial index: {:?}",
            self.check_consistency()
        );
    }

    /// Runs up to `iterations` ticks.
    ///
    /// Stops early once no organism is left. `on_each_tick` is called after
    /// every completed tick.
    ///
    /// # Returns
    ///
    /// The number of ticks actually run.
    pub fn simulate<F>(&mut self, iterations: usize, mut on_each_tick: F) -> usize
    where
        F: FnMut(&Environment),
    {
        for completed in 0..iterations {
            if self.organism_count() == 0 {
                debug!(tick = self.tick, "no organisms left, stopping");
                return completed;
            }
            self.step();
            on_each_tick(self);
        }
        iterations
    }

    /// Lets every organism above the reproduction threshold produce one offspring.
    ///
    /// # Returns
    ///
    /// Handles of the new organisms.
    pub fn reproduce_organisms(&mut self) -> Result<Vec<ObjectId>, EnvironmentError> {
        let threshold = self.params.reproduction_threshold;
        let parents: Vec<ObjectId> = self
            .organisms()
            .filter(|(_, organism)| organism.can_reproduce(threshold))
            .map(|(id, _)| id)
            .collect();

        let bounds = self.index.bounds();
        let mut children = Vec::with_capacity(parents.len());
        for parent_id in parents {
            let child = self.organism_mut(parent_id)?.reproduce();
            let pos = clamp_to_rect(child.pos, &bounds);
            children.push(self.add_organism(child, pos)?);
        }

        debug!(tick = self.tick, offspring = children.len(), "reproduction round");
        Ok(children)
    }

    /// Scatters `count` food items uniformly over the environment.
    ///
    /// Each item carries `Params::food_energy`.
    pub fn spawn_food_randomly(&mut self, count: usize) -> Result<Vec<ObjectId>, EnvironmentError> {
        (0..count)
            .map(|_| {
                let pos = self.random_position();
                self.add_food(Food::new(self.params.food_energy), pos)
            })
            .collect()
    }

    /// Places `count` organisms carrying `genes` uniformly over the environment.
    ///
    /// Each organism starts with `Params::initial_energy`.
    pub fn populate(&mut self, count: usize, genes: &Genes) -> Result<Vec<ObjectId>, EnvironmentError> {
        (0..count)
            .map(|_| {
                let pos = self.random_position();
                let organism = Organism::new(genes.clone(), self.params.initial_energy);
                self.add_organism(organism, pos)
            })
            .collect()
    }

    /// Removes every food item.
    ///
    /// # Returns
    ///
    /// The number of removed items.
    pub fn remove_all_food(&mut self) -> usize {
        let food: Vec<ObjectId> = self.foods().map(|(id, _)| id).collect();
        for &id in &food {
            if let Err(err) = self.remove(id) {
                error!(?id, %err, "failed to remove food");
            }
        }
        food.len()
    }

    /// Verifies that the collections and the spatial index agree.
    pub fn check_consistency(&self) -> Result<(), EnvironmentError> {
        self.index.check_consistency()?;
        if self.index.len() != self.objects.len() {
            return Err(SpatialError::Inconsistent(format!(
                "index holds {} objects, environment holds {}",
                self.index.len(),
                self.objects.len()
            ))
            .into());
        }
        for (id, object) in &self.objects {
            if self.index.position(id) != Some(object.pos()) {
                return Err(SpatialError::Inconsistent(format!(
                    "object {id:?} is indexed at a stale position"
                ))
                .into());
            }
        }
        Ok(())
    }

    fn random_position(&mut self) -> Position {
        Position::new(
            self.rng.random_range(0.0..=self.params.width),
            self.rng.random_range(0.0..=self.params.height),
        )
    }

    /// Pushes positions changed outside the tick loop into the index.
    fn sync_positions(&mut self) {
        let bounds = self.index.bounds();
        for (id, object) in &mut self.objects {
            let pos = object.pos();
            if self.index.position(id) == Some(pos) {
                continue;
            }
            let clamped = clamp_to_rect(pos, &bounds);
            object.set_pos(clamped);
            if let Err(err) = self.index.update(id, clamped) {
                error!(?id, %err, "failed to sync position into the spatial index");
            }
        }
    }

    fn perceive(&self) -> EventQueue {
        let organisms: Vec<ObjectId> = self.organisms().map(|(id, _)| id).collect();
        if self.params.parallel {
            organisms
                .par_iter()
                .flat_map_iter(|&id| self.perceive_organism(id))
                .collect::<Vec<_>>()
                .into_iter()
                .collect()
        } else {
            let mut queue = EventQueue::new();
            for &id in &organisms {
                for event in self.perceive_organism(id) {
                    queue.push(event);
                }
            }
            queue
        }
    }

    fn perceive_organism(&self, id: ObjectId) -> Vec<SimulationEvent> {
        let Some(organism) = self.objects.get(id).and_then(EnvironmentObject::as_organism) else {
            return Vec::new();
        };
        if !organism.is_alive() {
            return Vec::new();
        }

        let sightings: Vec<Sighting> = self
            .index
            .query_radius(organism.pos, organism.awareness_radius())
            .into_iter()
            .filter(|&(_, other)| other != id)
            .filter_map(|(distance, other)| {
                let object = self.objects.get(other)?;
                let target = match object {
                    EnvironmentObject::Food(food) if food.can_be_eaten() => Target::Food,
                    EnvironmentObject::Organism(other) if other.is_alive() => Target::Organism {
                        size: other.size(),
                    },
                    _ => return None,
                };
                Some(Sighting {
                    id: other,
                    pos: object.pos(),
                    distance,
                    target,
                })
            })
            .collect();

        let ratio = self.params.predation_size_ratio;
        let reach = organism.reaction_radius();
        let mut events: Vec<SimulationEvent> = sightings
            .iter()
            .filter(|sighting| sighting.distance <= reach)
            .filter_map(|sighting| match sighting.target {
                Target::Food => Some(SimulationEvent::FoodClaimed {
                    organism_id: id,
                    food_id: sighting.id,
                    distance: sighting.distance,
                }),
                Target::Organism { size }
                    if self.params.predation && organism.can_prey_on(size, ratio) =>
                {
                    Some(SimulationEvent::PreyClaimed {
                        predator_id: id,
                        prey_id: sighting.id,
                        distance: sighting.distance,
                    })
                }
                Target::Organism { .. } => None,
            })
            .collect();

        if let Some(movement) = organism.react(&sightings, ratio) {
            events.push(SimulationEvent::MovementDecided {
                organism_id: id,
                movement,
            });
        }
        events
    }

    fn cleanup(&mut self) {
        let leaving: Vec<ObjectId> = self
            .objects
            .iter()
            .filter(|(_, object)| match object {
                EnvironmentObject::Organism(organism) => !organism.is_alive(),
                EnvironmentObject::Food(food) => !food.can_be_eaten(),
            })
            .map(|(id, _)| id)
            .collect();

        for id in leaving {
            let Some(object) = self.objects.remove(id) else {
                continue;
            };
            if let Err(err) = self.index.remove(id) {
                error!(?id, %err, "object missing from the spatial index during cleanup");
            }
            match object {
                EnvironmentObject::Organism(organism) => {
                    let cause = organism.death_cause().unwrap_or(DeathCause::Starved);
                    trace!(?id, ?cause, age = organism.age, "organism died");
                    self.dead_organisms.push(DeadOrganism {
                        id,
                        organism,
                        cause,
                    });
                }
                EnvironmentObject::Food(food) => {
                    self.food_consumed += food.energy();
                    self.food_consumed_count += 1;
                }
            }
        }
    }

    fn move_organisms(&mut self) {
        let bounds: Rect<f32> = self.index.bounds();
        let persistence = self.params.movement_persistence;

        let mut moved = Vec::new();
        for (id, object) in &mut self.objects {
            let EnvironmentObject::Organism(organism) = object else {
                continue;
            };
            let target = organism.next_position(&mut self.rng, persistence);
            let pos = clamp_to_rect(target, &bounds);
            if pos != target {
                trace!(?id, x = target.x(), y = target.y(), "clamped movement into bounds");
            }
            if pos != organism.pos {
                organism.pos = pos;
                moved.push((id, pos));
            }
        }

        for (id, pos) in moved {
            if let Err(err) = self.index.update(id, pos) {
                error!(?id, %err, "failed to move organism in the spatial index");
            }
        }
    }
}
