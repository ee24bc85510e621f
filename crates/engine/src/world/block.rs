/// Opaque block state identifier. The engine stores these without
/// interpreting them; game layers assign meaning (e.g. which IDs are the two
/// halves of a waystone).
///
/// `BlockId::AIR` (0) is the only reserved value: air cells are never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlockId(pub u16);

impl BlockId {
    /// The universal "empty" block.
    pub const AIR: BlockId = BlockId(0);

    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    pub const fn is_air(self) -> bool {
        self.0 == Self::AIR.0
    }
}
