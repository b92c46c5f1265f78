//! Region quadtree over the environment extent.
//!
//! Nodes live in a flat arena and refer to each other by index. A leaf
//! splits into four children once it holds more than `capacity` objects
//! (unless it reached `max_depth` or its shorter side is at most
//! `min_size`); a branch whose children are all leaves holding at most
//! `capacity` objects in total is merged back on removal.
//!
//! Children cover half-open quadrants of their parent (a coordinate on a
//! midline belongs to the upper/right quadrant), and the root owns its
//! maximum edges. Together the leaves tile the extent exactly once.

use std::collections::HashMap;

use geo::{Rect, coord};

use super::{IndexKey, SpatialIndex, SpatialObject, SpatialQueryResult};
use crate::simulation::error::SpatialError;
use crate::simulation::geometric_utils::{
    Position, contains_inclusive, distance_to_rect, get_distance,
};

type NodeId = usize;

const ROOT: NodeId = 0;

/// Returns which child quadrant of `bounds` owns `pos`.
///
/// Quadrants are numbered `column + 2 * row`: `0` is the minimum corner,
/// `3` the maximum corner. Coordinates exactly on the midlines belong to
/// the upper/right quadrant.
pub fn get_child_index(bounds: &Rect<f32>, pos: Position) -> usize {
    let center = bounds.center();
    let column = usize::from(pos.x() >= center.x);
    let row = usize::from(pos.y() >= center.y);
    column + 2 * row
}

fn child_bounds(bounds: &Rect<f32>) -> [Rect<f32>; 4] {
    let min = bounds.min();
    let max = bounds.max();
    let mid = bounds.center();
    [
        Rect::new(min, mid),
        Rect::new(coord! { x: mid.x, y: min.y }, coord! { x: max.x, y: mid.y }),
        Rect::new(coord! { x: min.x, y: mid.y }, coord! { x: mid.x, y: max.y }),
        Rect::new(mid, max),
    ]
}

#[derive(Debug, Clone)]
struct Node<K> {
    bounds: Rect<f32>,
    parent: Option<NodeId>,
    depth: u32,
    /// Index of the first of four consecutive children.
    children: Option<NodeId>,
    entries: Vec<(K, Position)>,
}

impl<K> Node<K> {
    fn leaf(bounds: Rect<f32>, parent: Option<NodeId>, depth: u32) -> Self {
        Self {
            bounds,
            parent,
            depth,
            children: None,
            entries: Vec::new(),
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// Quadtree spatial index with O(1) removal through per-key slot bookkeeping.
#[derive(Debug, Clone)]
pub struct OptimizedSpatialIndex<K> {
    nodes: Vec<Node<K>>,
    /// First ids of released child quads, reused by later splits.
    free: Vec<NodeId>,
    objects: HashMap<K, SpatialObject<K>>,
    capacity: usize,
    max_depth: u32,
    min_size: f32,
}

impl<K: IndexKey> OptimizedSpatialIndex<K> {
    /// Creates an empty quadtree covering `bounds`.
    ///
    /// # Arguments
    ///
    /// * `bounds` - Indexed extent; positions outside it are rejected
    /// * `capacity` - Objects a leaf holds before it splits (at least 1)
    /// * `max_depth` - Maximum depth of any leaf
    /// * `min_size` - Leaves whose shorter side is at most this never split
    pub fn new(bounds: Rect<f32>, capacity: usize, max_depth: u32, min_size: f32) -> Self {
        Self {
            nodes: vec![Node::leaf(bounds, None, 0)],
            free: Vec::new(),
            objects: HashMap::new(),
            capacity: capacity.max(1),
            max_depth,
            min_size,
        }
    }

    /// Returns the positional handle of `key`, if registered.
    pub fn get(&self, key: K) -> Option<&SpatialObject<K>> {
        self.objects.get(&key)
    }

    /// Rectangles of all current leaves.
    pub fn leaf_bounds(&self) -> Vec<Rect<f32>> {
        let mut leaves = Vec::new();
        let mut stack = vec![ROOT];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            match node.children {
                Some(first) => stack.extend(first..first + 4),
                None => leaves.push(node.bounds),
            }
        }
        leaves
    }

    /// Depth of the deepest leaf.
    pub fn depth(&self) -> u32 {
        let mut depth = 0;
        let mut stack = vec![ROOT];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            match node.children {
                Some(first) => stack.extend(first..first + 4),
                None => depth = depth.max(node.depth),
            }
        }
        depth
    }

    fn in_bounds(&self, pos: Position) -> bool {
        contains_inclusive(&self.nodes[ROOT].bounds, pos)
    }

    fn locate_leaf(&self, pos: Position) -> NodeId {
        let mut id = ROOT;
        while let Some(first) = self.nodes[id].children {
            id = first + get_child_index(&self.nodes[id].bounds, pos);
        }
        id
    }

    fn place(&mut self, leaf: NodeId, key: K, pos: Position) {
        let entries = &mut self.nodes[leaf].entries;
        let slot = entries.len();
        entries.push((key, pos));
        self.objects.insert(
            key,
            SpatialObject {
                key,
                pos,
                cell: leaf,
                slot,
            },
        );
    }

    fn detach(&mut self, leaf: NodeId, slot: usize) {
        let entries = &mut self.nodes[leaf].entries;
        entries.swap_remove(slot);
        if let Some(&(moved, _)) = entries.get(slot) {
            if let Some(object) = self.objects.get_mut(&moved) {
                object.slot = slot;
            }
        }
    }

    fn should_split(&self, id: NodeId) -> bool {
        let node = &self.nodes[id];
        node.is_leaf()
            && node.entries.len() > self.capacity
            && node.depth < self.max_depth
            && node.bounds.width().min(node.bounds.height()) > self.min_size
    }

    fn allocate_children(&mut self, parent: NodeId) -> NodeId {
        let depth = self.nodes[parent].depth + 1;
        let quads = child_bounds(&self.nodes[parent].bounds);
        let first = match self.free.pop() {
            Some(first) => {
                for (offset, bounds) in quads.into_iter().enumerate() {
                    self.nodes[first + offset] = Node::leaf(bounds, Some(parent), depth);
                }
                first
            }
            None => {
                let first = self.nodes.len();
                self.nodes.extend(
                    quads
                        .into_iter()
                        .map(|bounds| Node::leaf(bounds, Some(parent), depth)),
                );
                first
            }
        };
        self.nodes[parent].children = Some(first);
        first
    }

    fn split_crowded(&mut self, leaf: NodeId) {
        let mut pending = vec![leaf];
        while let Some(id) = pending.pop() {
            if !self.should_split(id) {
                continue;
            }
            let first = self.allocate_children(id);
            let bounds = self.nodes[id].bounds;
            for (key, pos) in std::mem::take(&mut self.nodes[id].entries) {
                self.place(first + get_child_index(&bounds, pos), key, pos);
            }
            pending.extend(first..first + 4);
        }
    }

    fn can_merge(&self, id: NodeId) -> bool {
        let Some(first) = self.nodes[id].children else {
            return false;
        };
        let children = &self.nodes[first..first + 4];
        children.iter().all(Node::is_leaf)
            && children.iter().map(|child| child.entries.len()).sum::<usize>() <= self.capacity
    }

    fn merge(&mut self, id: NodeId) {
        let Some(first) = self.nodes[id].children.take() else {
            return;
        };
        for child in first..first + 4 {
            for (key, pos) in std::mem::take(&mut self.nodes[child].entries) {
                self.place(id, key, pos);
            }
        }
        self.free.push(first);
    }

    fn merge_upwards(&mut self, leaf: NodeId) {
        let mut next = self.nodes[leaf].parent;
        while let Some(id) = next {
            if !self.can_merge(id) {
                break;
            }
            self.merge(id);
            next = self.nodes[id].parent;
        }
    }
}

impl<K: IndexKey> SpatialIndex<K> for OptimizedSpatialIndex<K> {
    fn insert(&mut self, key: K, pos: Position) -> Result<(), SpatialError> {
        if self.objects.contains_key(&key) {
            return Err(SpatialError::DuplicateKey);
        }
        if !self.in_bounds(pos) {
            return Err(SpatialError::OutOfBounds {
                x: pos.x(),
                y: pos.y(),
            });
        }

        let leaf = self.locate_leaf(pos);
        self.place(leaf, key, pos);
        self.split_crowded(leaf);
        Ok(())
    }

    fn remove(&mut self, key: K) -> Result<Position, SpatialError> {
        let object = self
            .objects
            .remove(&key)
            .ok_or(SpatialError::StaleReference)?;
        self.detach(object.cell, object.slot);
        self.merge_upwards(object.cell);
        Ok(object.pos)
    }

    fn update(&mut self, key: K, pos: Position) -> Result<(), SpatialError> {
        let object = *self.objects.get(&key).ok_or(SpatialError::StaleReference)?;
        if !self.in_bounds(pos) {
            return Err(SpatialError::OutOfBounds {
                x: pos.x(),
                y: pos.y(),
            });
        }

        if self.locate_leaf(pos) == object.cell {
            self.nodes[object.cell].entries[object.slot].1 = pos;
            if let Some(object) = self.objects.get_mut(&key) {
                object.pos = pos;
            }
            return Ok(());
        }

        self.remove(key)?;
        self.insert(key, pos)
    }

    fn query_radius(&self, center: Position, radius: f32) -> SpatialQueryResult<K> {
        let mut result = Vec::new();
        if radius.is_nan() || radius < 0.0 {
            return result;
        }

        let mut stack = vec![ROOT];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if distance_to_rect(center, &node.bounds) > radius {
                continue;
            }
            match node.children {
                Some(first) => stack.extend(first..first + 4),
                None => result.extend(node.entries.iter().filter_map(|&(key, pos)| {
                    let distance = get_distance(center, pos);
                    (distance <= radius).then_some((distance, key))
                })),
            }
        }
        result
    }

    fn position(&self, key: K) -> Option<Position> {
        self.objects.get(&key).map(|object| object.pos)
    }

    fn len(&self) -> usize {
        self.objects.len()
    }

    fn clear(&mut self) {
        let bounds = self.nodes[ROOT].bounds;
        self.nodes = vec![Node::leaf(bounds, None, 0)];
        self.free.clear();
        self.objects.clear();
    }

    fn bounds(&self) -> Rect<f32> {
        self.nodes[ROOT].bounds
    }

    fn check_consistency(&self) -> Result<(), SpatialError> {
        let mut stored = 0;
        let mut stack = vec![ROOT];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            match node.children {
                Some(first) => {
                    if !node.entries.is_empty() {
                        return Err(SpatialError::Inconsistent(format!(
                            "branch node {id} holds {} entries",
                            node.entries.len()
                        )));
                    }
                    stack.extend(first..first + 4);
                }
                None => stored += node.entries.len(),
            }
        }
        if stored != self.objects.len() {
            return Err(SpatialError::Inconsistent(format!(
                "leaves hold {stored} entries but {} objects are registered",
                self.objects.len()
            )));
        }

        for object in self.objects.values() {
            let node = &self.nodes[object.cell];
            let entry = node.entries.get(object.slot);
            if !node.is_leaf() || entry.is_none_or(|&(key, pos)| key != object.key || pos != object.pos)
            {
                return Err(SpatialError::Inconsistent(format!(
                    "handle points at node {} slot {} which does not hold its object",
                    object.cell, object.slot
                )));
            }
            if self.locate_leaf(object.pos) != object.cell {
                return Err(SpatialError::Inconsistent(format!(
                    "object at ({}, {}) is stored outside its owning leaf",
                    object.pos.x(),
                    object.pos.y()
                )));
            }
        }
        Ok(())
    }
}
