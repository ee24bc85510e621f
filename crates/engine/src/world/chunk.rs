use super::block::BlockId;
use super::position::LocalBlockPos;
use std::collections::HashMap;

/// A 16-wide column of blocks, stored sparsely.
///
/// Only non-air cells are kept. Structures in this engine are small and
/// scattered (a waystone is two cells), so a dense section array would be
/// almost entirely air.
#[derive(Clone, Default)]
pub struct Chunk {
    blocks: HashMap<LocalBlockPos, BlockId>,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_block(&self, pos: LocalBlockPos) -> BlockId {
        self.blocks.get(&pos).copied().unwrap_or(BlockId::AIR)
    }

    /// Returns the previous block at `pos`.
    pub fn set_block(&mut self, pos: LocalBlockPos, block: BlockId) -> BlockId {
        let old = if block.is_air() {
            self.blocks.remove(&pos)
        } else {
            self.blocks.insert(pos, block)
        };
        old.unwrap_or(BlockId::AIR)
    }

    pub fn iter(&self) -> impl Iterator<Item = (LocalBlockPos, BlockId)> + '_ {
        self.blocks.iter().map(|(pos, block)| (*pos, *block))
    }

    /// Number of non-air cells.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
