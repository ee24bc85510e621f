//! Block type definitions for the waystone structure.
//!
//! A waystone occupies two vertically stacked cells. Each half has its own
//! block state ID, so the half a cell belongs to can be read straight off the
//! lattice without any extra property storage.

use std::fmt;

use serde::{Deserialize, Serialize};
use waystones_engine::world::block::BlockId;
use waystones_engine::world::position::BlockPos;

pub const AIR: BlockId = BlockId(0);
pub const STONE: BlockId = BlockId(1);

// Modded states are allocated above the vanilla palette.
pub const WAYSTONE_LOWER: BlockId = BlockId(30_000);
pub const WAYSTONE_UPPER: BlockId = BlockId(30_001);

/// Which cell of the two-cell structure a block occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureHalf {
    Lower,
    Upper,
}

impl StructureHalf {
    /// The block state for this half.
    pub const fn block(self) -> BlockId {
        match self {
            Self::Lower => WAYSTONE_LOWER,
            Self::Upper => WAYSTONE_UPPER,
        }
    }

    pub const fn opposite(self) -> Self {
        match self {
            Self::Lower => Self::Upper,
            Self::Upper => Self::Lower,
        }
    }

    /// Where the other half of a structure sits, given this half's position.
    pub const fn partner_pos(self, pos: BlockPos) -> BlockPos {
        match self {
            Self::Lower => pos.up(),
            Self::Upper => pos.down(),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lower => "lower",
            Self::Upper => "upper",
        }
    }
}

impl fmt::Display for StructureHalf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The waystone half encoded by this block state, if it is one.
pub fn waystone_half(id: BlockId) -> Option<StructureHalf> {
    match id {
        WAYSTONE_LOWER => Some(StructureHalf::Lower),
        WAYSTONE_UPPER => Some(StructureHalf::Upper),
        _ => None,
    }
}

pub fn is_waystone(id: BlockId) -> bool {
    waystone_half(id).is_some()
}

/// Can a waystone half be placed into a cell holding this block?
pub fn is_replaceable(id: BlockId) -> bool {
    id == AIR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halves_round_trip_through_block_ids() {
        for half in [StructureHalf::Lower, StructureHalf::Upper] {
            assert_eq!(waystone_half(half.block()), Some(half));
        }
        assert_eq!(waystone_half(STONE), None);
        assert!(!is_waystone(AIR));
    }

    #[test]
    fn partners_point_at_each_other() {
        let lower = BlockPos::new(4, 64, 4);
        let upper = StructureHalf::Lower.partner_pos(lower);
        assert_eq!(upper, BlockPos::new(4, 65, 4));
        assert_eq!(StructureHalf::Upper.partner_pos(upper), lower);
        assert_eq!(StructureHalf::Lower.opposite(), StructureHalf::Upper);
    }
}
