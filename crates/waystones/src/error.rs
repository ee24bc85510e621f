//! Errors for structural operations on waystones.
//!
//! Identity resolution itself never fails: an unresolved, stale, or
//! suppressed binding is reported as [`Identity::Invalid`](crate::waystone::Identity)
//! (or an invalid proxy), not as an error. These errors cover placement,
//! breaking, and block entity bookkeeping, where the caller asked for
//! something the lattice cannot satisfy.

use thiserror::Error;
use waystones_engine::world::position::BlockPos;

use crate::block::StructureHalf;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WaystoneError {
    #[error("block at {pos} is not a waystone")]
    NotAWaystone { pos: BlockPos },

    #[error("waystone binding at {pos} is the {expected} half but the block is the {actual} half")]
    HalfMismatch {
        pos: BlockPos,
        expected: StructureHalf,
        actual: StructureHalf,
    },

    #[error("cannot place a waystone at {pos}: cell {blocking} is occupied")]
    Occupied { pos: BlockPos, blocking: BlockPos },

    #[error("no waystone binding at {pos}")]
    MissingBinding { pos: BlockPos },

    #[error("only the authoritative level may create waystones")]
    NotAuthoritative,

    #[error("waystone binding at {pos} is an upper half; only lower halves create waystones")]
    NotLowerHalf { pos: BlockPos },

    #[error("waystone binding at {pos} already holds a live waystone")]
    AlreadyInitialized { pos: BlockPos },
}
