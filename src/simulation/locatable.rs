//! Trait for entities that occupy a position in the environment.
//!
//! The spatial index only ever looks at positions and handles, never at
//! organism- or food-specific state, so everything it needs from an entity
//! goes through this trait.

use super::geometric_utils::Position;

/// Trait for entities with a position in the environment plane.
///
/// Any type that implements this trait:
/// - Has a position in 2D space
/// - Can be relocated by its owner
pub trait Locatable {
    /// Returns the entity's position.
    fn pos(&self) -> Position;

    /// Moves the entity to `pos`.
    ///
    /// Callers holding the entity inside an environment must keep the
    /// spatial index in sync; the environment does this for its own moves.
    fn set_pos(&mut self, pos: Position);
}
