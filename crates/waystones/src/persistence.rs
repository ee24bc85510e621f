//! Waystone persistence in NBT.
//!
//! Three things are saved:
//!   - a binding's block entity tag, which carries nothing but the waystone's
//!     UUID (omitted while unresolved),
//!   - a level snapshot (`level.<dimension>.dat`): its blocks and block entity
//!     tags,
//!   - the registry's saved data (`data/waystones.dat`): every record.
//!
//! Loading a binding never contacts the registry; it installs a proxy that
//! resolves on first access. So the level and the registry can be loaded in
//! either order, as long as no binding is resolved before both are in: a
//! lower half whose proxy misses on an authoritative level creates a new
//! waystone.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use waystones_engine::world::block::BlockId;
use waystones_engine::world::dimension::DimensionId;
use waystones_engine::world::position::BlockPos;

use crate::level::Level;
use crate::registry::{WaystoneManager, WaystoneRegistry};
use crate::waystone::{Waystone, WaystoneId};

/// DataVersion tag written into every saved file (MC 1.15.2).
const DATA_VERSION: i32 = 2230;

/// Block entity type id.
pub const BLOCK_ENTITY_ID: &str = "waystones:waystone";

/// Registry saved data, relative to the world directory.
const REGISTRY_FILE: &str = "data/waystones.dat";

// ── NBT structs (serde) ─────────────────────────────────────────────────────

/// A UUID as two longs, most significant first (`{M: long, L: long}`).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct UuidNbt {
    #[serde(rename = "M")]
    most: i64,
    #[serde(rename = "L")]
    least: i64,
}

impl From<Uuid> for UuidNbt {
    fn from(uuid: Uuid) -> Self {
        let (most, least) = uuid.as_u64_pair();
        Self {
            most: most as i64,
            least: least as i64,
        }
    }
}

impl From<UuidNbt> for Uuid {
    fn from(nbt: UuidNbt) -> Self {
        Uuid::from_u64_pair(nbt.most as u64, nbt.least as u64)
    }
}

/// The saved (and replicated) form of one waystone binding.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BindingNbt {
    id: String,
    x: i64,
    y: i64,
    z: i64,
    #[serde(rename = "UUID", default, skip_serializing_if = "Option::is_none")]
    uuid: Option<UuidNbt>,
}

impl BindingNbt {
    pub fn new(pos: BlockPos, waystone: Option<WaystoneId>) -> Self {
        Self {
            id: BLOCK_ENTITY_ID.into(),
            x: pos.x,
            y: pos.y,
            z: pos.z,
            uuid: waystone.map(|id| UuidNbt::from(id.to_uuid())),
        }
    }

    /// Always [`BLOCK_ENTITY_ID`] once decoded.
    pub fn block_entity_id(&self) -> &str {
        &self.id
    }

    pub fn pos(&self) -> BlockPos {
        BlockPos::new(self.x, self.y, self.z)
    }

    /// The saved identifier; `None` means the binding was unresolved.
    pub fn waystone_id(&self) -> Option<WaystoneId> {
        self.uuid.map(|nbt| WaystoneId::from_uuid(nbt.into()))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        fastnbt::to_bytes(self)
            .with_context(|| format!("serializing waystone block entity at {}", self.pos()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let nbt: Self =
            fastnbt::from_bytes(bytes).context("deserializing waystone block entity")?;
        if nbt.id != BLOCK_ENTITY_ID {
            bail!("block entity at {} is '{}', not a waystone", nbt.pos(), nbt.id);
        }
        Ok(nbt)
    }
}

#[derive(Serialize, Deserialize, Debug)]
struct LevelNbt {
    #[serde(rename = "DataVersion")]
    data_version: i32,
    #[serde(rename = "Dimension")]
    dimension: String,
    #[serde(rename = "Blocks")]
    blocks: Vec<BlockNbt>,
    #[serde(rename = "BlockEntities")]
    block_entities: Vec<BindingNbt>,
}

#[derive(Serialize, Deserialize, Debug)]
struct BlockNbt {
    x: i64,
    y: i64,
    z: i64,
    #[serde(rename = "State")]
    state: i32,
}

#[derive(Serialize, Deserialize, Debug)]
struct RegistryNbt {
    #[serde(rename = "DataVersion")]
    data_version: i32,
    #[serde(rename = "Waystones")]
    waystones: Vec<WaystoneNbt>,
}

#[derive(Serialize, Deserialize, Debug)]
struct WaystoneNbt {
    #[serde(rename = "UUID")]
    uuid: UuidNbt,
    #[serde(rename = "Dimension")]
    dimension: String,
    #[serde(rename = "X")]
    x: i64,
    #[serde(rename = "Y")]
    y: i64,
    #[serde(rename = "Z")]
    z: i64,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "WasGenerated")]
    was_generated: bool,
    #[serde(rename = "Owner", default, skip_serializing_if = "Option::is_none")]
    owner: Option<UuidNbt>,
}

// ── Bindings ────────────────────────────────────────────────────────────────

/// Build the saved form of the binding at `pos`.
///
/// This runs identity resolution first, so saving an unresolved lower half
/// on an authoritative level creates its waystone. Returns `None` if there is
/// no binding at `pos`.
pub fn capture(level: &mut Level, pos: BlockPos) -> Option<BindingNbt> {
    let identity = level.current_identity(pos)?;
    let id = identity.id(level.services().registry.as_ref());
    Some(BindingNbt::new(pos, id))
}

pub fn write_binding(level: &mut Level, pos: BlockPos) -> Result<Vec<u8>> {
    capture(level, pos)
        .ok_or_else(|| anyhow!("no waystone binding at {}", pos))?
        .to_bytes()
}

pub fn read_binding(bytes: &[u8]) -> Result<BindingNbt> {
    BindingNbt::from_bytes(bytes)
}

// ── Level ───────────────────────────────────────────────────────────────────

fn level_path(dir: &Path, dimension: DimensionId) -> PathBuf {
    let key = dimension.as_str();
    let path = key.split_once(':').map_or(key, |(_, path)| path);
    dir.join(format!("level.{}.dat", path))
}

/// Write a full snapshot of `level` (blocks and bindings) under `dir`.
/// Returns the number of block entities written.
///
/// The level's dirty set is left alone; it belongs to replication.
pub fn save_level(level: &mut Level, dir: &Path) -> Result<usize> {
    let start = Instant::now();
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let blocks = level
        .world()
        .blocks()
        .into_iter()
        .map(|(pos, block)| BlockNbt {
            x: pos.x,
            y: pos.y,
            z: pos.z,
            state: i32::from(block.0),
        })
        .collect();

    let block_entities: Vec<BindingNbt> = level
        .binding_positions()
        .into_iter()
        .filter_map(|pos| capture(level, pos))
        .collect();
    let count = block_entities.len();

    let nbt = LevelNbt {
        data_version: DATA_VERSION,
        dimension: level.dimension().as_str().to_string(),
        blocks,
        block_entities,
    };
    let bytes = fastnbt::to_bytes(&nbt)
        .with_context(|| format!("serializing level {}", level.dimension()))?;

    let path = level_path(dir, level.dimension());
    fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;

    tracing::info!(
        "Level {} saved: {} waystone block entities ({:.2?})",
        level.dimension(),
        count,
        start.elapsed(),
    );
    Ok(count)
}

/// Load a snapshot written by [`save_level`] into `level`.
///
/// Returns the number of block entities restored, or 0 if there is no save
/// for this dimension. Restored bindings hold proxies; nothing is looked up.
pub fn load_level_into(level: &mut Level, dir: &Path) -> Result<usize> {
    let path = level_path(dir, level.dimension());
    if !path.is_file() {
        return Ok(0);
    }

    let start = Instant::now();
    let bytes = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
    let nbt: LevelNbt = fastnbt::from_bytes(&bytes)
        .with_context(|| format!("deserializing {}", path.display()))?;

    let dimension: DimensionId = nbt
        .dimension
        .parse()
        .with_context(|| format!("dimension of {}", path.display()))?;
    if dimension != level.dimension() {
        bail!(
            "{} holds {}, but the level is {}",
            path.display(),
            dimension,
            level.dimension()
        );
    }

    for block in &nbt.blocks {
        let Ok(state) = u16::try_from(block.state) else {
            tracing::warn!(
                "Skipping block with out-of-range state {} at ({}, {}, {})",
                block.state,
                block.x,
                block.y,
                block.z,
            );
            continue;
        };
        level.apply_block_change(BlockPos::new(block.x, block.y, block.z), BlockId(state));
    }

    let mut restored = 0usize;
    for entity in &nbt.block_entities {
        if entity.id != BLOCK_ENTITY_ID {
            tracing::warn!("Skipping unknown block entity '{}' at {}", entity.id, entity.pos());
            continue;
        }
        level
            .restore_binding(entity.pos(), entity.waystone_id())
            .with_context(|| format!("restoring waystone block entity at {}", entity.pos()))?;
        restored += 1;
    }

    // Loading is not a change.
    level.take_dirty();

    tracing::info!(
        "Level {} loaded: {} blocks, {} waystone block entities ({:.2?})",
        level.dimension(),
        nbt.blocks.len(),
        restored,
        start.elapsed(),
    );
    Ok(restored)
}

// ── Registry ────────────────────────────────────────────────────────────────

/// Write every registered waystone to `<dir>/data/waystones.dat`.
pub fn save_registry(manager: &WaystoneManager, dir: &Path) -> Result<usize> {
    let path = dir.join(REGISTRY_FILE);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }

    let waystones: Vec<WaystoneNbt> = manager
        .snapshot()
        .iter()
        .map(|w| WaystoneNbt {
            uuid: w.id().to_uuid().into(),
            dimension: w.dimension().as_str().to_string(),
            x: w.pos().x,
            y: w.pos().y,
            z: w.pos().z,
            name: w.name(),
            was_generated: w.was_generated(),
            owner: w.owner().map(UuidNbt::from),
        })
        .collect();
    let count = waystones.len();

    let bytes = fastnbt::to_bytes(&RegistryNbt {
        data_version: DATA_VERSION,
        waystones,
    })
    .context("serializing waystone registry")?;
    fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;

    tracing::info!("Waystone registry saved: {} waystones", count);
    Ok(count)
}

/// Register every waystone saved under `dir`. Returns the number loaded, or
/// 0 if there is no saved registry.
pub fn load_registry(registry: &dyn WaystoneRegistry, dir: &Path) -> Result<usize> {
    let path = dir.join(REGISTRY_FILE);
    if !path.is_file() {
        return Ok(0);
    }

    let bytes = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
    let nbt: RegistryNbt = fastnbt::from_bytes(&bytes)
        .with_context(|| format!("deserializing {}", path.display()))?;

    let count = nbt.waystones.len();
    for entry in nbt.waystones {
        let dimension: DimensionId = entry
            .dimension
            .parse()
            .with_context(|| format!("dimension of waystone '{}'", entry.name))?;
        let waystone = Waystone::new(
            WaystoneId::from_uuid(entry.uuid.into()),
            dimension,
            BlockPos::new(entry.x, entry.y, entry.z),
            entry.was_generated,
            entry.owner.map(Uuid::from),
        )
        .with_name(entry.name);
        registry.register(Arc::new(waystone));
    }

    tracing::info!("Waystone registry loaded: {} waystones", count);
    Ok(count)
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_survives_signed_longs() {
        let uuid = Uuid::from_u128(0xffff_0000_1234_5678_9abc_def0_0000_ffff);
        let nbt = UuidNbt::from(uuid);
        assert!(nbt.most < 0);
        assert_eq!(Uuid::from(nbt), uuid);
    }

    #[test]
    fn unresolved_binding_omits_uuid() {
        let nbt = BindingNbt::new(BlockPos::new(1, 64, 1), None);
        let bytes = nbt.to_bytes().unwrap();
        let back = BindingNbt::from_bytes(&bytes).unwrap();
        assert_eq!(back.waystone_id(), None);
        assert_eq!(back.pos(), BlockPos::new(1, 64, 1));

        let value: fastnbt::Value = fastnbt::from_bytes(&bytes).unwrap();
        let fastnbt::Value::Compound(map) = value else {
            panic!("block entity is not a compound");
        };
        assert!(!map.contains_key("UUID"));
    }

    #[test]
    fn resolved_binding_writes_uuid_compound() {
        let id = WaystoneId::new();
        let bytes = BindingNbt::new(BlockPos::new(0, 70, 0), Some(id))
            .to_bytes()
            .unwrap();
        let value: fastnbt::Value = fastnbt::from_bytes(&bytes).unwrap();
        let fastnbt::Value::Compound(map) = value else {
            panic!("block entity is not a compound");
        };
        assert!(matches!(map.get("UUID"), Some(fastnbt::Value::Compound(uuid)) if uuid.contains_key("M") && uuid.contains_key("L")));
        assert_eq!(read_binding(&bytes).unwrap().waystone_id(), Some(id));
    }

    #[test]
    fn foreign_block_entity_is_rejected() {
        let mut nbt = BindingNbt::new(BlockPos::new(0, 0, 0), None);
        nbt.id = "minecraft:chest".into();
        let bytes = fastnbt::to_bytes(&nbt).unwrap();
        assert!(BindingNbt::from_bytes(&bytes).is_err());
    }

    #[test]
    fn level_file_is_named_after_dimension() {
        let dir = Path::new("world");
        assert_eq!(
            level_path(dir, DimensionId::Nether),
            dir.join("level.the_nether.dat")
        );
    }
}
