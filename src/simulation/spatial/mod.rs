//! Spatial indexing for efficient neighbour queries.
//!
//! Provides a common interface over two implementations:
//! - [`OptimizedSpatialIndex`]: a region quadtree that splits crowded leaves
//!   and prunes whole subtrees during radius queries
//! - [`LinearSpatialIndex`]: a flat list scanned on every query, used as the
//!   reference model and for very small populations

use std::hash::Hash;

use geo::Rect;

use super::error::SpatialError;
use super::geometric_utils::Position;

mod linear;
mod optimized;

pub use super::geometric_utils::get_distance;
pub use linear::LinearSpatialIndex;
pub use optimized::{OptimizedSpatialIndex, get_child_index};

/// Result of a spatial radius query: `(distance, key)` pairs in no particular order.
pub type SpatialQueryResult<K> = Vec<(f32, K)>;

/// Keys that can be stored in a spatial index.
pub trait IndexKey: Copy + Eq + Hash + Send + Sync + 'static {}

impl<T> IndexKey for T where T: Copy + Eq + Hash + Send + Sync + 'static {}

/// Positional handle binding a key to its slot inside an index.
///
/// Every registered key has exactly one `SpatialObject`. Its `cell` names
/// the leaf that currently holds the key (always `0` for flat indices).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialObject<K> {
    /// Key of the indexed object.
    pub key: K,
    /// Position the index has recorded for the object.
    pub pos: Position,
    pub(crate) cell: usize,
    pub(crate) slot: usize,
}

impl<K> SpatialObject<K> {
    /// Leaf currently holding the object.
    pub fn cell(&self) -> usize {
        self.cell
    }
}

/// Common behaviour exposed by spatial indices.
///
/// Structural operations (`insert`, `remove`, `update`, `clear`) need
/// exclusive access; `query_radius` only reads and may run from many
/// threads at once against a structurally stable index.
pub trait SpatialIndex<K: IndexKey>: Send + Sync {
    /// Registers `key` at `pos`.
    ///
    /// Fails with [`SpatialError::OutOfBounds`] if `pos` lies outside the
    /// indexed extent and with [`SpatialError::DuplicateKey`] if the key is
    /// already registered.
    fn insert(&mut self, key: K, pos: Position) -> Result<(), SpatialError>;

    /// Unregisters `key`, returning its last recorded position.
    ///
    /// Fails with [`SpatialError::StaleReference`] if the key is unknown.
    fn remove(&mut self, key: K) -> Result<Position, SpatialError>;

    /// Moves `key` to `pos`.
    ///
    /// On error the index is left unchanged.
    fn update(&mut self, key: K, pos: Position) -> Result<(), SpatialError>;

    /// Finds every key whose position lies within `radius` of `center`.
    ///
    /// # Arguments
    ///
    /// * `center` - Center position for the query
    /// * `radius` - Search radius (inclusive); negative or `NaN` radii match nothing
    ///
    /// # Returns
    ///
    /// `(distance, key)` pairs, each key at most once.
    fn query_radius(&self, center: Position, radius: f32) -> SpatialQueryResult<K>;

    /// Recorded position of `key`, if registered.
    fn position(&self, key: K) -> Option<Position>;

    /// Number of registered keys.
    fn len(&self) -> usize;

    /// Returns `true` when nothing is registered.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unregisters everything.
    fn clear(&mut self);

    /// The indexed extent.
    fn bounds(&self) -> Rect<f32>;

    /// Verifies internal bookkeeping.
    fn check_consistency(&self) -> Result<(), SpatialError>;
}
