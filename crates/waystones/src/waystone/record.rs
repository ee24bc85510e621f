use std::fmt;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use waystones_engine::world::dimension::DimensionId;
use waystones_engine::world::position::BlockPos;

/// Stable unique identifier of a waystone. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WaystoneId(Uuid);

impl WaystoneId {
    /// A fresh random (v4) identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub const fn to_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for WaystoneId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WaystoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for WaystoneId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

/// A resolved waystone: the durable record a registry stores.
///
/// Everything except the name is fixed at creation. The name sits behind a
/// lock so a rename through the registry is seen by every holder of the
/// shared `Arc<Waystone>`, including both halves of the structure.
#[derive(Debug)]
pub struct Waystone {
    id: WaystoneId,
    dimension: DimensionId,
    pos: BlockPos,
    was_generated: bool,
    owner: Option<Uuid>,
    name: RwLock<String>,
}

impl Waystone {
    /// Create an unnamed record. Names are assigned afterwards, once the
    /// name generator has seen the rest of the record.
    pub fn new(
        id: WaystoneId,
        dimension: DimensionId,
        pos: BlockPos,
        was_generated: bool,
        owner: Option<Uuid>,
    ) -> Self {
        Self {
            id,
            dimension,
            pos,
            was_generated,
            owner,
            name: RwLock::new(String::new()),
        }
    }

    pub fn with_name(self, name: impl Into<String>) -> Self {
        self.set_name(name);
        self
    }

    pub fn id(&self) -> WaystoneId {
        self.id
    }

    pub fn dimension(&self) -> DimensionId {
        self.dimension
    }

    pub fn pos(&self) -> BlockPos {
        self.pos
    }

    /// `true` for waystones created by world generation, `false` for ones a
    /// player placed.
    pub fn was_generated(&self) -> bool {
        self.was_generated
    }

    /// The player who placed this waystone, if any.
    pub fn owner(&self) -> Option<Uuid> {
        self.owner
    }

    pub fn name(&self) -> String {
        self.name.read().expect("waystone name poisoned").clone()
    }

    pub fn has_name(&self) -> bool {
        !self.name.read().expect("waystone name poisoned").is_empty()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        *self.name.write().expect("waystone name poisoned") = name.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn rename_is_visible_through_every_handle() {
        let waystone = Arc::new(Waystone::new(
            WaystoneId::new(),
            DimensionId::Overworld,
            BlockPos::new(0, 64, 0),
            true,
            None,
        ));
        let other = Arc::clone(&waystone);
        assert!(!other.has_name());

        waystone.set_name("Emberfall");
        assert_eq!(other.name(), "Emberfall");
    }

    #[test]
    fn ids_are_fresh() {
        assert_ne!(WaystoneId::new(), WaystoneId::new());
    }
}
