pub mod block;
pub mod chunk;
pub mod dimension;
pub mod position;

use block::BlockId;
use chunk::Chunk;
use dashmap::DashMap;
use dimension::DimensionId;
use position::{BlockPos, ChunkPos};

/// One dimension's block lattice. Thread-safe, lock-sharded by chunk.
///
/// Stateful per-cell objects live beside the lattice in a
/// [`BlockEntityMap`](crate::block_entity::BlockEntityMap), not here.
pub struct World {
    dimension: DimensionId,
    chunks: DashMap<ChunkPos, Chunk>,
}

impl World {
    pub fn new(dimension: DimensionId) -> Self {
        Self {
            dimension,
            chunks: DashMap::new(),
        }
    }

    pub fn dimension(&self) -> DimensionId {
        self.dimension
    }

    /// Read a block at an absolute position. Returns AIR for unloaded chunks.
    pub fn get_block(&self, pos: BlockPos) -> BlockId {
        match self.chunks.get(&pos.chunk()) {
            Some(chunk) => chunk.get_block(pos.local()),
            None => BlockId::AIR,
        }
    }

    /// Write a block at an absolute position, returning the block it replaced.
    /// Creates the chunk if needed and drops it again once it holds only air.
    ///
    /// Takes `&self` (not `&mut self`) because `DashMap` provides interior
    /// mutability via per-shard locking.
    pub fn set_block(&self, pos: BlockPos, block: BlockId) -> BlockId {
        let chunk_pos = pos.chunk();
        let old = self
            .chunks
            .entry(chunk_pos)
            .or_default()
            .set_block(pos.local(), block);
        if self
            .chunks
            .remove_if(&chunk_pos, |_, chunk| chunk.is_empty())
            .is_some()
        {
            tracing::trace!("Dropped empty chunk ({}, {})", chunk_pos.x, chunk_pos.z);
        }
        old
    }

    pub fn has_chunk(&self, pos: ChunkPos) -> bool {
        self.chunks.contains_key(&pos)
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Snapshot of every non-air block, sorted by position.
    pub fn blocks(&self) -> Vec<(BlockPos, BlockId)> {
        let mut out = Vec::new();
        for entry in self.chunks.iter() {
            let chunk_pos = *entry.key();
            out.extend(
                entry
                    .value()
                    .iter()
                    .map(|(local, block)| (local.absolute(chunk_pos), block)),
            );
        }
        out.sort_by_key(|(pos, _)| *pos);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_block_returns_previous_and_prunes_empty_chunks() {
        let world = World::new(DimensionId::Overworld);
        let pos = BlockPos::new(5, 70, -3);
        assert_eq!(world.set_block(pos, BlockId::new(7)), BlockId::AIR);
        assert_eq!(world.get_block(pos), BlockId::new(7));
        assert!(world.has_chunk(pos.chunk()));

        assert_eq!(world.set_block(pos, BlockId::AIR), BlockId::new(7));
        assert_eq!(world.get_block(pos), BlockId::AIR);
        assert_eq!(world.chunk_count(), 0);
    }
}
