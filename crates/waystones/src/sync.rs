//! Replication of waystone structures from the authoritative level to replicas.
//!
//! After each simulation step the authoritative level publishes an
//! [`UpdateBatch`] to a shared `tokio::sync::broadcast` channel: the block
//! writes it made plus an [`UpdatePacket`] for every binding whose visible
//! state changed. A packet is exactly the binding's saved form, and replicas
//! apply it through the same restore path as loading from disk, so a replica
//! only ever holds proxies and never creates an identity itself.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::broadcast;
use waystones_engine::world::block::BlockId;
use waystones_engine::world::position::BlockPos;

use crate::binding::BindingHost;
use crate::error::WaystoneError;
use crate::level::Level;
use crate::persistence::{self, BindingNbt};

/// Recommended capacity for the broadcast channel.
pub const BUS_CAPACITY: usize = 256;

/// One binding's replicated state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdatePacket {
    pub tag: BindingNbt,
}

impl UpdatePacket {
    pub fn pos(&self) -> BlockPos {
        self.tag.pos()
    }

    /// Wire form: the NBT tag, byte for byte the same as on disk.
    pub fn encode(&self) -> Result<Vec<u8>> {
        self.tag.to_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let tag = BindingNbt::from_bytes(bytes).context("decoding waystone update packet")?;
        Ok(Self { tag })
    }
}

/// Everything one step changed, in application order: blocks first, then
/// block entities.
///
/// Uses `Arc<[...]>` so cloning per broadcast subscriber is just a refcount bump.
#[derive(Clone, Debug)]
pub struct UpdateBatch {
    pub blocks: Arc<[(BlockPos, BlockId)]>,
    pub block_entities: Arc<[UpdatePacket]>,
}

impl UpdateBatch {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.block_entities.is_empty()
    }
}

/// The update packet for the binding at `pos`, built from its saved form.
pub fn update_packet(level: &mut Level, pos: BlockPos) -> Option<UpdatePacket> {
    persistence::capture(level, pos).map(|tag| UpdatePacket { tag })
}

/// Drain the level's pending block writes and changed bindings into a batch.
pub fn collect_updates(level: &mut Level) -> UpdateBatch {
    let blocks = level.take_block_changes();
    let dirty = level.take_dirty();
    let block_entities: Vec<UpdatePacket> = dirty
        .iter()
        .filter_map(|&pos| update_packet(level, pos))
        .collect();
    // Capturing may resolve a binding, which marks it again. Anything already
    // in this batch is current; anything else stays queued.
    for pos in level.take_dirty() {
        if dirty.binary_search(&pos).is_err() {
            level.mark_changed(pos);
        }
    }
    UpdateBatch {
        blocks: blocks.into(),
        block_entities: block_entities.into(),
    }
}

/// Collect and broadcast this step's updates. Returns the number of packets
/// (blocks plus block entities) sent; 0 if there was nothing to send.
pub fn publish(level: &mut Level, bus: &broadcast::Sender<UpdateBatch>) -> usize {
    let batch = collect_updates(level);
    if batch.is_empty() {
        return 0;
    }
    let sent = batch.blocks.len() + batch.block_entities.len();
    // Ignore send errors (no subscribers = no problem).
    let _ = bus.send(batch);
    tracing::debug!("Published {} waystone updates", sent);
    sent
}

/// Apply one update packet on a receiving level.
pub fn apply_update(level: &mut Level, packet: &UpdatePacket) -> Result<(), WaystoneError> {
    level.restore_binding(packet.pos(), packet.tag.waystone_id())
}

/// Apply a whole batch. Packets for cells that are not waystones on this
/// level are skipped with a warning.
pub fn apply_batch(level: &mut Level, batch: &UpdateBatch) {
    for &(pos, block) in batch.blocks.iter() {
        level.apply_block_change(pos, block);
    }
    for packet in batch.block_entities.iter() {
        if let Err(e) = apply_update(level, packet) {
            tracing::warn!("Dropping waystone update: {}", e);
        }
    }
    // What arrived from upstream is not a local change.
    level.take_dirty();
}
