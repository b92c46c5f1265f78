//! Handles and the tagged variant over everything an environment holds.

use slotmap::new_key_type;

use super::food::Food;
use super::geometric_utils::Position;
use super::locatable::Locatable;
use super::organism::Organism;

new_key_type! {
    /// Stable handle for environment objects backed by a generational slot map.
    ///
    /// A handle is invalidated when its object is removed; a later object
    /// never reuses it.
    pub struct ObjectId;
}

/// Discriminator for [`EnvironmentObject`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// A living organism.
    Organism,
    /// A food item.
    Food,
}

/// Anything that can live in an environment.
#[derive(Debug, Clone)]
pub enum EnvironmentObject {
    /// A living organism.
    Organism(Organism),
    /// A food item.
    Food(Food),
}

impl EnvironmentObject {
    /// Returns the variant discriminator.
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Organism(_) => ObjectKind::Organism,
            Self::Food(_) => ObjectKind::Food,
        }
    }

    /// Returns the organism, if this is one.
    pub fn as_organism(&self) -> Option<&Organism> {
        match self {
            Self::Organism(organism) => Some(organism),
            Self::Food(_) => None,
        }
    }

    /// Returns the organism mutably, if this is one.
    pub fn as_organism_mut(&mut self) -> Option<&mut Organism> {
        match self {
            Self::Organism(organism) => Some(organism),
            Self::Food(_) => None,
        }
    }

    /// Returns the food item, if this is one.
    pub fn as_food(&self) -> Option<&Food> {
        match self {
            Self::Food(food) => Some(food),
            Self::Organism(_) => None,
        }
    }

    /// Returns the food item mutably, if this is one.
    pub fn as_food_mut(&mut self) -> Option<&mut Food> {
        match self {
            Self::Food(food) => Some(food),
            Self::Organism(_) => None,
        }
    }
}

impl Locatable for EnvironmentObject {
    fn pos(&self) -> Position {
        match self {
            Self::Organism(organism) => organism.pos(),
            Self::Food(food) => food.pos(),
        }
    }

    fn set_pos(&mut self, pos: Position) {
        match self {
            Self::Organism(organism) => organism.set_pos(pos),
            Self::Food(food) => food.set_pos(pos),
        }
    }
}

impl From<Organism> for EnvironmentObject {
    fn from(organism: Organism) -> Self {
        Self::Organism(organism)
    }
}

impl From<Food> for EnvironmentObject {
    fn from(food: Food) -> Self {
        Self::Food(food)
    }
}
