//! Organism state, traits and behaviour hooks.
//!
//! Organisms derive their traits from [`Genes`], burn energy every tick just
//! by existing, eat food within their reaction radius and steer towards (or
//! away from) whatever they notice within their awareness radius.

use std::fmt;
use std::sync::Arc;

use geo::{Coord, Point, coord};
use rand::Rng;

use super::genes::Genes;
use super::geometric_utils::Position;
use super::locatable::Locatable;
use super::object::ObjectId;

/// Custom per-tick energy cost of an organism.
pub type LifeConsumptionFn = Arc<dyn Fn(&Organism) -> f32 + Send + Sync>;

/// Why an organism left the live population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeathCause {
    /// Energy dropped to zero or below.
    Starved,
    /// Age reached the lifespan.
    OldAge,
    /// Eaten by a larger organism.
    Eaten,
}

/// What an organism noticed during perception.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    /// A fresh food item.
    Food,
    /// Another live organism of the given size.
    Organism {
        /// Size trait of the other organism.
        size: f32,
    },
}

/// A single object detected within an organism's awareness radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sighting {
    /// Handle of the detected object.
    pub id: ObjectId,
    /// Position of the object at tick start.
    pub pos: Position,
    /// Distance from the observing organism.
    pub distance: f32,
    /// What was detected.
    pub target: Target,
}

/// A simulated organism.
///
/// Organisms can:
/// - Detect food and other organisms within their awareness radius
/// - Eat food (and much smaller organisms) within their reaction radius
/// - Move up to `speed` per tick, chasing, fleeing or wandering
/// - Reproduce once they have stored enough energy
/// - Die when energy runs out or they reach their lifespan
#[derive(Clone)]
pub struct Organism {
    /// Position in 2D space.
    pub pos: Position,
    /// Current energy (dies when <= 0).
    pub energy: f32,
    /// Ticks survived so far.
    pub age: u32,
    /// Number of food items eaten.
    pub food_eaten: u32,
    genes: Genes,
    movement: Coord<f32>,
    reacted: bool,
    killed: bool,
    life_consumption: Option<LifeConsumptionFn>,
}

impl fmt::Debug for Organism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Organism")
            .field("pos", &self.pos)
            .field("energy", &self.energy)
            .field("age", &self.age)
            .field("food_eaten", &self.food_eaten)
            .field("genes", &self.genes)
            .field("movement", &self.movement)
            .field("killed", &self.killed)
            .finish_non_exhaustive()
    }
}

impl Organism {
    /// Creates a new organism at the origin.
    ///
    /// # Arguments
    ///
    /// * `genes` - Genetic traits (owned; reproduction mutates a copy)
    /// * `energy` - Starting energy
    pub fn new(genes: Genes, energy: f32) -> Self {
        Self {
            pos: Position::new(0.0, 0.0),
            energy,
            age: 0,
            food_eaten: 0,
            genes,
            movement: coord! { x: 0.0, y: 0.0 },
            reacted: false,
            killed: false,
            life_consumption: None,
        }
    }

    /// Replaces the default life-consumption formula.
    pub fn with_life_consumption(mut self, calculator: LifeConsumptionFn) -> Self {
        self.life_consumption = Some(calculator);
        self
    }

    /// Genetic traits of this organism.
    pub fn genes(&self) -> &Genes {
        &self.genes
    }

    /// Maximum displacement per tick.
    pub fn speed(&self) -> f32 {
        self.genes.speed()
    }

    /// Body size.
    pub fn size(&self) -> f32 {
        self.genes.size()
    }

    /// Awareness trait (sensing reach beyond the body).
    pub fn awareness(&self) -> f32 {
        self.genes.awareness()
    }

    /// Maximum age in ticks.
    pub fn lifespan(&self) -> u32 {
        self.genes.lifespan()
    }

    /// Distance at which this organism detects other objects.
    pub fn awareness_radius(&self) -> f32 {
        self.size() + self.awareness()
    }

    /// Distance at which this organism can act on a detected object.
    ///
    /// Never exceeds [`Organism::awareness_radius`].
    pub fn reaction_radius(&self) -> f32 {
        self.size()
    }

    /// Energy spent each tick just by existing.
    pub fn life_consumption(&self) -> f32 {
        if let Some(calculator) = &self.life_consumption {
            return calculator(self);
        }

        let speed = self.speed() / 10.0;
        let size = self.size() / 10.0;
        (speed * speed + size * size * self.size() / 15.0 + self.awareness() / 10.0) * 1.3
    }

    /// Movement vector carried over from the last tick.
    pub fn movement(&self) -> Coord<f32> {
        self.movement
    }

    /// Checks if the organism is alive.
    ///
    /// # Returns
    ///
    /// `true` if energy > 0, age < lifespan and it has not been eaten.
    pub fn is_alive(&self) -> bool {
        self.death_cause().is_none()
    }

    /// Reason this organism should leave the live population, if any.
    pub fn death_cause(&self) -> Option<DeathCause> {
        if self.killed {
            Some(DeathCause::Eaten)
        } else if self.energy <= 0.0 {
            Some(DeathCause::Starved)
        } else if self.age >= self.lifespan() {
            Some(DeathCause::OldAge)
        } else {
            None
        }
    }

    /// Reduces the organism's energy.
    pub fn consume_energy(&mut self, amount: f32) {
        self.energy -= amount;
    }

    /// Increases the organism's energy. There is no implicit cap.
    pub fn gain_energy(&mut self, amount: f32) {
        self.energy += amount;
    }

    /// Marks the organism as eaten by a predator.
    pub fn kill(&mut self) {
        self.killed = true;
        self.energy = 0.0;
    }

    /// Ages the organism by one tick and deducts its life consumption.
    pub fn live_one_tick(&mut self) {
        let cost = self.life_consumption();
        self.consume_energy(cost);
        self.age += 1;
    }

    /// Checks whether this organism is large enough to eat an organism of `other_size`.
    pub fn can_prey_on(&self, other_size: f32, size_ratio: f32) -> bool {
        self.size() > size_ratio * other_size
    }

    /// Chooses a movement intent from what the organism noticed.
    ///
    /// The nearest sighting wins (ties go to the lower handle). Food is
    /// approached, much smaller organisms are chased, much larger ones are
    /// fled from; anything else leaves the organism without an intent.
    ///
    /// # Arguments
    ///
    /// * `sightings` - Objects detected within the awareness radius
    /// * `size_ratio` - Size factor separating predators from prey
    ///
    /// # Returns
    ///
    /// The desired displacement vector, before capping to `speed`.
    pub fn react(&self, sightings: &[Sighting], size_ratio: f32) -> Option<Coord<f32>> {
        let nearest = sightings.iter().min_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.id.cmp(&b.id))
        })?;

        let towards = nearest.pos.0 - self.pos.0;
        match nearest.target {
            Target::Food => Some(towards),
            Target::Organism { size } if self.size() * size_ratio < size => Some(-towards),
            Target::Organism { size } if self.can_prey_on(size, size_ratio) => Some(towards),
            Target::Organism { .. } => None,
        }
    }

    /// Records a movement intent decided during perception.
    pub fn set_intent(&mut self, movement: Coord<f32>) {
        self.movement = movement;
        self.reacted = true;
    }

    /// Computes where the organism moves this tick and clears its intent.
    ///
    /// Without an intent the organism keeps its previous heading with
    /// probability `persistence`, otherwise it picks a random heading from
    /// `{-1, 0, 1}^2 * speed`. The displacement never exceeds `speed`.
    ///
    /// # Returns
    ///
    /// The unclamped target position.
    pub fn next_position<R: Rng + ?Sized>(&mut self, rng: &mut R, persistence: f32) -> Position {
        let speed = self.speed();

        if !self.reacted {
            let standing_still = self.movement.x == 0.0 && self.movement.y == 0.0;
            let keep = !standing_still && rng.random::<f32>() < persistence;
            if !keep {
                self.movement = coord! {
                    x: f32::from(rng.random_range(-1_i8..=1)) * speed,
                    y: f32::from(rng.random_range(-1_i8..=1)) * speed,
                };
            }
        }

        let length = self.movement.x.hypot(self.movement.y);
        if length > speed {
            self.movement = self.movement * (speed / length);
        }

        self.reacted = false;
        Point(self.pos.0 + self.movement)
    }

    /// Checks whether the organism has enough energy to reproduce.
    pub fn can_reproduce(&self, threshold: f32) -> bool {
        self.is_alive() && self.energy > threshold
    }

    /// Produces an offspring with mutated genes.
    ///
    /// The parent's energy is split evenly with the child. The child is
    /// placed at the parent's position offset by `(2, 2)`; the environment
    /// clamps it into bounds when adding it.
    pub fn reproduce(&mut self) -> Organism {
        let child_energy = self.energy / 2.0;
        self.energy -= child_energy;

        let mut child = Organism::new(self.genes.mutated(), child_energy);
        child.life_consumption = self.life_consumption.clone();
        child.pos = Position::new(self.pos.x() + 2.0, self.pos.y() + 2.0);
        child
    }
}

impl Locatable for Organism {
    fn pos(&self) -> Position {
        self.pos
    }

    fn set_pos(&mut self, pos: Position) {
        self.pos = pos;
    }
}
