//! Food items that organisms can consume for energy.

use super::geometric_utils::Position;
use super::locatable::Locatable;

/// Whether a food item can still be eaten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoodState {
    /// Not eaten yet.
    Fresh,
    /// Eaten during the current tick; removed at cleanup.
    Eaten,
}

/// A passive food item carrying an energy value.
///
/// Food is consumed exactly once: the first [`Food::consume`] call hands out
/// the energy, every later call gets nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct Food {
    /// Position in 2D space.
    pub pos: Position,
    energy: f32,
    state: FoodState,
}

impl Food {
    /// Creates a fresh food item at the origin.
    ///
    /// The environment places it when it is added.
    pub fn new(energy: f32) -> Self {
        Self {
            pos: Position::new(0.0, 0.0),
            energy,
            state: FoodState::Fresh,
        }
    }

    /// Energy handed to the organism that eats this item.
    pub fn energy(&self) -> f32 {
        self.energy
    }

    /// Current consumption state.
    pub fn state(&self) -> FoodState {
        self.state
    }

    /// Checks if this food item is still available.
    pub fn can_be_eaten(&self) -> bool {
        self.state == FoodState::Fresh
    }

    /// Marks the food as eaten and returns its energy.
    ///
    /// # Returns
    ///
    /// `Some(energy)` the first time, `None` once the item has been eaten.
    pub fn consume(&mut self) -> Option<f32> {
        match self.state {
            FoodState::Fresh => {
                self.state = FoodState::Eaten;
                Some(self.energy)
            }
            FoodState::Eaten => None,
        }
    }
}

impl Locatable for Food {
    fn pos(&self) -> Position {
        self.pos
    }

    fn set_pos(&mut self, pos: Position) {
        self.pos = pos;
    }
}
