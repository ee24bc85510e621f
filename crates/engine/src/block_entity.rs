//! Per-cell stateful objects ("block entities") that live beside the lattice.
//!
//! A block entity is owned by the map and mutated only from the owning
//! level's simulation step, so the map is a plain `HashMap` behind `&mut`.
//!
//! Structures spanning several cells need one entity to reach another while
//! it is itself being mutated. [`BlockEntityMap::detach`] hands the entity out
//! of the map for the duration of such an operation; the caller puts it back
//! with [`BlockEntityMap::attach`]. While detached, lookups at that position
//! see nothing, which is how re-entrant access to the same cell is cut off.

use std::collections::{HashMap, HashSet};

use crate::world::position::BlockPos;

pub struct BlockEntityMap<T> {
    entities: HashMap<BlockPos, T>,
    /// Positions whose entity changed since the last `take_dirty`.
    dirty: HashSet<BlockPos>,
}

impl<T> BlockEntityMap<T> {
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            dirty: HashSet::new(),
        }
    }

    /// Insert (or replace) the entity at `pos` and mark it dirty.
    /// Returns the entity that was there before, if any.
    pub fn insert(&mut self, pos: BlockPos, entity: T) -> Option<T> {
        self.dirty.insert(pos);
        self.entities.insert(pos, entity)
    }

    /// Remove the entity at `pos`. Removal is not a dirty change: the caller
    /// decides what (if anything) to persist for a removed entity.
    pub fn remove(&mut self, pos: BlockPos) -> Option<T> {
        self.dirty.remove(&pos);
        self.entities.remove(&pos)
    }

    pub fn get(&self, pos: BlockPos) -> Option<&T> {
        self.entities.get(&pos)
    }

    pub fn get_mut(&mut self, pos: BlockPos) -> Option<&mut T> {
        self.entities.get_mut(&pos)
    }

    pub fn contains(&self, pos: BlockPos) -> bool {
        self.entities.contains_key(&pos)
    }

    /// Take the entity out of the map without touching its dirty state.
    pub fn detach(&mut self, pos: BlockPos) -> Option<T> {
        self.entities.remove(&pos)
    }

    /// Put back an entity obtained from [`detach`](Self::detach).
    ///
    /// If something was inserted at `pos` in the meantime, the detached
    /// entity wins and the newcomer is returned.
    pub fn attach(&mut self, pos: BlockPos, entity: T) -> Option<T> {
        let previous = self.entities.insert(pos, entity);
        if previous.is_some() {
            tracing::warn!("Block entity at {} was replaced while detached", pos);
        }
        previous
    }

    /// Mark `pos` as changed. Works while the entity is detached, so an
    /// entity can flag itself in the middle of its own operation.
    pub fn mark_dirty(&mut self, pos: BlockPos) {
        self.dirty.insert(pos);
    }

    /// Drain and return all positions marked dirty since the last call that
    /// still hold an entity, sorted so that saves are deterministic.
    pub fn take_dirty(&mut self) -> Vec<BlockPos> {
        let entities = &self.entities;
        let mut dirty: Vec<BlockPos> = self
            .dirty
            .drain()
            .filter(|pos| entities.contains_key(pos))
            .collect();
        dirty.sort();
        dirty
    }

    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    pub fn positions(&self) -> impl Iterator<Item = BlockPos> + '_ {
        self.entities.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BlockPos, &T)> + '_ {
        self.entities.iter().map(|(pos, entity)| (*pos, entity))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl<T> Default for BlockEntityMap<T> {
    fn default() -> Self {
        Self::new()
    }
}
