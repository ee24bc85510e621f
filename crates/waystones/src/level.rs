//! A level: one dimension's lattice plus the waystone bindings living in it.
//!
//! The level owns every binding and is the [`BindingHost`] they resolve
//! against. All mutation goes through `&mut Level`, i.e. the level's single
//! simulation step; a binding that needs its structural partner is detached
//! from the map for the duration of its own operation, so the partner can be
//! borrowed from the level at the same time.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use uuid::Uuid;
use waystones_engine::block_entity::BlockEntityMap;
use waystones_engine::world::World;
use waystones_engine::world::block::BlockId;
use waystones_engine::world::dimension::DimensionId;
use waystones_engine::world::position::BlockPos;

use crate::binding::{BindingHost, WaystoneBinding};
use crate::block::{self, StructureHalf};
use crate::error::WaystoneError;
use crate::services::Services;
use crate::waystone::{Identity, Waystone, WaystoneId};

/// Whether a level may create identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    /// The server-side level that owns the simulation.
    Authoritative,
    /// An observer's copy, rebuilt from replicated snapshots.
    Replica,
}

pub struct Level {
    world: World,
    bindings: BlockEntityMap<WaystoneBinding>,
    authority: Authority,
    services: Services,
    rng: StdRng,
    /// Block writes not yet handed to the update bus.
    block_changes: Vec<(BlockPos, BlockId)>,
}

impl Level {
    pub fn new(dimension: DimensionId, authority: Authority, services: Services, seed: u64) -> Self {
        Self {
            world: World::new(dimension),
            bindings: BlockEntityMap::new(),
            authority,
            services,
            rng: StdRng::seed_from_u64(seed),
            block_changes: Vec::new(),
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn dimension(&self) -> DimensionId {
        self.world.dimension()
    }

    pub fn authority(&self) -> Authority {
        self.authority
    }

    pub fn is_authoritative(&self) -> bool {
        self.authority == Authority::Authoritative
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn binding(&self, pos: BlockPos) -> Option<&WaystoneBinding> {
        self.bindings.get(pos)
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Positions of every binding, sorted.
    pub fn binding_positions(&self) -> Vec<BlockPos> {
        let mut positions: Vec<BlockPos> = self.bindings.positions().collect();
        positions.sort();
        positions
    }

    // ── Lattice ─────────────────────────────────────────────────────────

    /// Write a block and queue the change for replication.
    pub fn set_block(&mut self, pos: BlockPos, block: BlockId) -> BlockId {
        let old = self.world.set_block(pos, block);
        if old != block {
            self.block_changes.push((pos, block));
        }
        old
    }

    /// Apply a block change that arrived from elsewhere (replication, load).
    ///
    /// Keeps bindings in step with the lattice: a waystone half gets a fresh
    /// binding if it has none, and a cell that stops being a waystone loses
    /// its binding.
    pub fn apply_block_change(&mut self, pos: BlockPos, block: BlockId) {
        self.world.set_block(pos, block);
        match block::waystone_half(block) {
            Some(half) => {
                if self.binding(pos).map(WaystoneBinding::half) != Some(half) {
                    self.attach_new(WaystoneBinding::new(pos, half));
                }
            }
            None => {
                self.unload_binding(pos);
            }
        }
    }

    /// Drain block writes made since the last call.
    pub fn take_block_changes(&mut self) -> Vec<(BlockPos, BlockId)> {
        std::mem::take(&mut self.block_changes)
    }

    // ── Bindings ────────────────────────────────────────────────────────

    /// Attach a binding to this level.
    ///
    /// The block at the binding's position must be the waystone half the
    /// binding was built for; a structure never ends up with two halves of
    /// the same kind through this path.
    pub fn insert_binding(&mut self, binding: WaystoneBinding) -> Result<(), WaystoneError> {
        let pos = binding.pos();
        let actual = block::waystone_half(self.world.get_block(pos))
            .ok_or(WaystoneError::NotAWaystone { pos })?;
        if actual != binding.half() {
            return Err(WaystoneError::HalfMismatch {
                pos,
                expected: binding.half(),
                actual,
            });
        }
        self.attach_new(binding);
        Ok(())
    }

    fn attach_new(&mut self, mut binding: WaystoneBinding) {
        binding.on_load();
        if let Some(mut replaced) = self.bindings.insert(binding.pos(), binding) {
            replaced.on_unload();
        }
    }

    /// Detach a binding without destroying its waystone (e.g. chunk unload).
    pub fn unload_binding(&mut self, pos: BlockPos) -> Option<WaystoneBinding> {
        let mut binding = self.bindings.remove(pos)?;
        binding.on_unload();
        Some(binding)
    }

    /// Install a saved or replicated identifier into the binding at `pos`,
    /// creating the binding from the lattice if it does not exist yet.
    /// The registry is not consulted.
    pub fn restore_binding(
        &mut self,
        pos: BlockPos,
        id: Option<WaystoneId>,
    ) -> Result<(), WaystoneError> {
        if !self.bindings.contains(pos) {
            let half = block::waystone_half(self.world.get_block(pos))
                .ok_or(WaystoneError::NotAWaystone { pos })?;
            self.attach_new(WaystoneBinding::new(pos, half));
        }
        if let Some(binding) = self.bindings.get_mut(pos) {
            binding.restore(id);
        }
        Ok(())
    }

    /// Positions whose binding changed since the last call.
    pub fn take_dirty(&mut self) -> Vec<BlockPos> {
        self.bindings.take_dirty()
    }

    /// Run `f` on the binding at `pos` while it is out of the map, so `f`
    /// may reach other bindings through the level.
    fn with_detached<R>(
        &mut self,
        pos: BlockPos,
        f: impl FnOnce(&mut WaystoneBinding, &mut Level) -> R,
    ) -> Option<R> {
        let mut binding = self.bindings.detach(pos)?;
        let result = f(&mut binding, self);
        if let Some(mut displaced) = self.bindings.attach(pos, binding) {
            displaced.on_unload();
        }
        Some(result)
    }

    // ── Identity ────────────────────────────────────────────────────────

    /// Resolve the identity of the binding at `pos`.
    /// `None` if there is no binding there.
    pub fn current_identity(&mut self, pos: BlockPos) -> Option<Identity> {
        self.with_detached(pos, |binding, level| binding.current_identity(level))
    }

    /// Resolve the binding at `pos` all the way to its record.
    pub fn waystone_at(&mut self, pos: BlockPos) -> Option<Arc<Waystone>> {
        let identity = self.current_identity(pos)?;
        identity.resolve(self.services.registry.as_ref())
    }

    // ── Structures ──────────────────────────────────────────────────────

    /// A player places a waystone with its lower half at `lower`.
    ///
    /// Both cells are written, the lower half creates the identity right
    /// away, and the upper half is paired from it.
    pub fn place_waystone(
        &mut self,
        lower: BlockPos,
        owner: Option<Uuid>,
    ) -> Result<Identity, WaystoneError> {
        if !self.is_authoritative() {
            return Err(WaystoneError::NotAuthoritative);
        }
        self.build_structure(lower)?;

        let upper = StructureHalf::Lower.partner_pos(lower);
        self.with_detached(lower, |base, level| -> Result<Identity, WaystoneError> {
            base.initialize(level, owner, false)?;
            let paired = level.with_detached(upper, |top, level| {
                top.initialize_from_base(base, level);
            });
            if paired.is_none() {
                tracing::warn!("Waystone at {} placed without an upper half", lower);
            }
            Ok(base.identity().clone())
        })
        .unwrap_or(Err(WaystoneError::MissingBinding { pos: lower }))
    }

    /// World generation places a waystone structure at `lower`.
    ///
    /// No identity is created here: the first access to either half creates
    /// it, marked as generated.
    pub fn generate_waystone(&mut self, lower: BlockPos) -> Result<(), WaystoneError> {
        if !self.is_authoritative() {
            return Err(WaystoneError::NotAuthoritative);
        }
        self.build_structure(lower)?;
        tracing::debug!("Generated waystone structure at {}", lower);
        Ok(())
    }

    fn build_structure(&mut self, lower: BlockPos) -> Result<(), WaystoneError> {
        let upper = StructureHalf::Lower.partner_pos(lower);
        for cell in [lower, upper] {
            if !block::is_replaceable(self.world.get_block(cell)) {
                return Err(WaystoneError::Occupied {
                    pos: lower,
                    blocking: cell,
                });
            }
        }
        for (cell, half) in [(lower, StructureHalf::Lower), (upper, StructureHalf::Upper)] {
            self.set_block(cell, half.block());
            self.insert_binding(WaystoneBinding::new(cell, half))?;
        }
        Ok(())
    }

    /// Destroy the waystone of the structure containing `pos` (either half),
    /// leaving the blocks in place. Both halves end up suppressed.
    pub fn uninitialize(&mut self, pos: BlockPos) -> Result<(), WaystoneError> {
        self.with_detached(pos, |binding, level| binding.uninitialize(level))
            .ok_or(WaystoneError::MissingBinding { pos })
    }

    /// Break the structure containing `pos`: destroy its waystone, then clear
    /// both cells and drop both bindings.
    pub fn break_waystone(&mut self, pos: BlockPos) -> Result<(), WaystoneError> {
        let half = self
            .binding(pos)
            .map(WaystoneBinding::half)
            .ok_or(WaystoneError::MissingBinding { pos })?;
        self.uninitialize(pos)?;

        for cell in [pos, half.partner_pos(pos)] {
            self.unload_binding(cell);
            if block::is_waystone(self.world.get_block(cell)) {
                self.set_block(cell, block::AIR);
            }
        }
        tracing::debug!("Broke waystone structure at {}", pos);
        Ok(())
    }
}

impl BindingHost for Level {
    fn is_authoritative(&self) -> bool {
        Level::is_authoritative(self)
    }

    fn dimension(&self) -> DimensionId {
        Level::dimension(self)
    }

    fn services(&self) -> &Services {
        &self.services
    }

    fn rng(&mut self) -> &mut dyn RngCore {
        &mut self.rng
    }

    fn half_at(&self, pos: BlockPos) -> Option<StructureHalf> {
        block::waystone_half(self.world.get_block(pos))
    }

    fn current_identity_at(&mut self, pos: BlockPos) -> Option<Identity> {
        self.current_identity(pos)
    }

    fn revoke_at(&mut self, pos: BlockPos) -> bool {
        let Some(partner) = self.bindings.get_mut(pos) else {
            return false;
        };
        partner.revoke();
        self.bindings.mark_dirty(pos);
        true
    }

    fn mark_changed(&mut self, pos: BlockPos) {
        self.bindings.mark_dirty(pos);
    }
}
