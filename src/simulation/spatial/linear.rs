//! Flat spatial index scanned linearly on every query.

use std::collections::HashMap;

use geo::Rect;

use super::{IndexKey, SpatialIndex, SpatialObject, SpatialQueryResult};
use crate::simulation::error::SpatialError;
use crate::simulation::geometric_utils::{Position, contains_inclusive, get_distance};

/// Spatial index storing every object in one list.
///
/// Queries are O(n); insert, remove and update are O(1).
#[derive(Debug, Clone)]
pub struct LinearSpatialIndex<K> {
    bounds: Rect<f32>,
    entries: Vec<(K, Position)>,
    slots: HashMap<K, usize>,
}

impl<K: IndexKey> LinearSpatialIndex<K> {
    /// Creates an empty index covering `bounds`.
    pub fn new(bounds: Rect<f32>) -> Self {
        Self {
            bounds,
            entries: Vec::new(),
            slots: HashMap::new(),
        }
    }

    /// Returns the positional handle of `key`, if registered.
    pub fn get(&self, key: K) -> Option<SpatialObject<K>> {
        let slot = *self.slots.get(&key)?;
        let (key, pos) = self.entries[slot];
        Some(SpatialObject {
            key,
            pos,
            cell: 0,
            slot,
        })
    }

    fn check_bounds(&self, pos: Position) -> Result<(), SpatialError> {
        if contains_inclusive(&self.bounds, pos) {
            Ok(())
        } else {
            Err(SpatialError::OutOfBounds {
                x: pos.x(),
                y: pos.y(),
            })
        }
    }
}

impl<K: IndexKey> SpatialIndex<K> for LinearSpatialIndex<K> {
    fn insert(&mut self, key: K, pos: Position) -> Result<(), SpatialError> {
        if self.slots.contains_key(&key) {
            return Err(SpatialError::DuplicateKey);
        }
        self.check_bounds(pos)?;
        self.slots.insert(key, self.entries.len());
        self.entries.push((key, pos));
        Ok(())
    }

    fn remove(&mut self, key: K) -> Result<Position, SpatialError> {
        let slot = self
            .slots
            .remove(&key)
            .ok_or(SpatialError::StaleReference)?;
        let (_, pos) = self.entries.swap_remove(slot);
        if let Some(&(moved, _)) = self.entries.get(slot) {
            self.slots.insert(moved, slot);
        }
        Ok(pos)
    }

    fn update(&mut self, key: K, pos: Position) -> Result<(), SpatialError> {
        let slot = *self.slots.get(&key).ok_or(SpatialError::StaleReference)?;
        self.check_bounds(pos)?;
        self.entries[slot].1 = pos;
        Ok(())
    }

    fn query_radius(&self, center: Position, radius: f32) -> SpatialQueryResult<K> {
        if radius.is_nan() || radius < 0.0 {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter_map(|&(key, pos)| {
                let distance = get_distance(center, pos);
                (distance <= radius).then_some((distance, key))
            })
            .collect()
    }

    fn position(&self, key: K) -> Option<Position> {
        self.slots.get(&key).map(|&slot| self.entries[slot].1)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.slots.clear();
    }

    fn bounds(&self) -> Rect<f32> {
        self.bounds
    }

    fn check_consistency(&self) -> Result<(), SpatialError> {
        if self.slots.len() != self.entries.len() {
            return Err(SpatialError::Inconsistent(format!(
                "{} slots for {} entries",
                self.slots.len(),
                self.entries.len()
            )));
        }
        for (&key, &slot) in &self.slots {
            if self.entries.get(slot).is_none_or(|&(stored, _)| stored != key) {
                return Err(SpatialError::Inconsistent(format!(
                    "slot {slot} does not hold its key"
                )));
            }
        }
        Ok(())
    }
}
