//! The per-cell waystone binding and its identity resolution state machine.
//!
//! A waystone is two cells, each holding a [`WaystoneBinding`]. The lower half
//! is the only one that ever creates an identity; the upper half copies
//! whatever the lower half resolves to. Because only one role creates, at most
//! one registry entry exists per structure no matter which half is asked
//! first, and no locking between the halves is needed.
//!
//! ```text
//!  Unresolved --current_identity()--> Resolved   (lower: create, upper: copy)
//!  Unresolved --restore(id)---------> Restored   (proxy, resolved per access)
//!  any        --uninitialize()------> Suppressed (terminal; partner too)
//! ```
//!
//! Bindings never reach their surroundings directly. Everything goes through
//! a [`BindingHost`], which is how the level injects the registry and lets a
//! binding reach its structural partner.

use rand::RngCore;
use uuid::Uuid;
use waystones_engine::world::dimension::DimensionId;
use waystones_engine::world::position::BlockPos;

use crate::block::StructureHalf;
use crate::error::WaystoneError;
use crate::services::Services;
use crate::waystone::{Identity, Waystone, WaystoneId, WaystoneProxy};

/// Everything a binding needs from the level it lives in.
pub trait BindingHost {
    /// `false` on replicas: they rebuild from snapshots and never create.
    fn is_authoritative(&self) -> bool;

    fn dimension(&self) -> DimensionId;

    fn services(&self) -> &Services;

    /// The level's random source.
    fn rng(&mut self) -> &mut dyn RngCore;

    /// The waystone half at `pos` according to the block lattice.
    fn half_at(&self, pos: BlockPos) -> Option<StructureHalf>;

    /// Run identity resolution on the binding at `pos`.
    /// `None` if there is no binding there.
    fn current_identity_at(&mut self, pos: BlockPos) -> Option<Identity>;

    /// Invalidate the binding at `pos` (see [`WaystoneBinding::revoke`]).
    /// Returns `false` if there is no binding there.
    fn revoke_at(&mut self, pos: BlockPos) -> bool;

    /// The binding at `pos` changed in a way observers should see.
    fn mark_changed(&mut self, pos: BlockPos);
}

/// Where a binding is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    /// No identity yet; the next access may create or copy one.
    Unresolved,
    /// Holds a proxy from saved or replicated state, resolved on access.
    Restored,
    Resolved,
    /// Destroyed. Never resolves again for the rest of this object's life.
    Suppressed,
}

#[derive(Debug)]
pub struct WaystoneBinding {
    pos: BlockPos,
    half: StructureHalf,
    identity: Identity,
    suppress_auto_init: bool,
    attached: bool,
}

impl WaystoneBinding {
    /// A fresh, detached, unresolved binding.
    pub fn new(pos: BlockPos, half: StructureHalf) -> Self {
        Self {
            pos,
            half,
            identity: Identity::Invalid,
            suppress_auto_init: false,
            attached: false,
        }
    }

    pub fn pos(&self) -> BlockPos {
        self.pos
    }

    pub fn half(&self) -> StructureHalf {
        self.half
    }

    /// Where the other half of this structure is.
    pub fn partner_pos(&self) -> BlockPos {
        self.half.partner_pos(self.pos)
    }

    /// The identity as stored, without running resolution.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn state(&self) -> BindingState {
        match (&self.identity, self.suppress_auto_init) {
            (Identity::Resolved(_), _) => BindingState::Resolved,
            (Identity::Proxy(_), _) => BindingState::Restored,
            (Identity::Invalid, true) => BindingState::Suppressed,
            (Identity::Invalid, false) => BindingState::Unresolved,
        }
    }

    /// The binding joined a level.
    pub fn on_load(&mut self) {
        self.attached = true;
    }

    /// The binding left its level (chunk unload, removal).
    pub fn on_unload(&mut self) {
        self.attached = false;
    }

    /// Return the current identity, resolving it first if needed.
    ///
    /// A valid identity is returned untouched. A suppressed, detached, or
    /// non-authoritative binding returns what it has without side effects.
    /// Otherwise the lower half creates a new waystone and the upper half
    /// copies the lower half's identity; an upper half with no lower half
    /// next to it stays invalid and tries again on the next call.
    pub fn current_identity(&mut self, host: &mut dyn BindingHost) -> Identity {
        if self.identity.is_valid(host.services().registry.as_ref()) {
            return self.identity.clone();
        }
        if self.suppress_auto_init || !self.attached || !host.is_authoritative() {
            return self.identity.clone();
        }

        match host.half_at(self.pos) {
            Some(half) if half == self.half => {}
            found => {
                tracing::warn!(
                    "Waystone binding at {} expects the {} half, block is {:?}; not resolving",
                    self.pos,
                    self.half,
                    found,
                );
                return self.identity.clone();
            }
        }

        match self.half {
            StructureHalf::Lower => {
                if let Err(e) = self.initialize(host, None, true) {
                    tracing::warn!("Waystone binding at {} not created: {}", self.pos, e);
                }
            }
            StructureHalf::Upper => {
                let below = self.pos.down();
                match host.current_identity_at(below) {
                    Some(identity) => self.adopt(host, identity),
                    None => tracing::debug!(
                        "Upper waystone half at {} has no lower half yet",
                        self.pos
                    ),
                }
            }
        }

        self.identity.clone()
    }

    /// Create a brand-new waystone for this structure and register it.
    ///
    /// Only an unresolved lower half of an authoritative level may create; the
    /// upper half gets its identity through
    /// [`initialize_from_base`](Self::initialize_from_base). Anything else is
    /// refused before the registry is touched.
    pub fn initialize(
        &mut self,
        host: &mut dyn BindingHost,
        owner: Option<Uuid>,
        was_generated: bool,
    ) -> Result<(), WaystoneError> {
        if self.half != StructureHalf::Lower {
            return Err(WaystoneError::NotLowerHalf { pos: self.pos });
        }
        if !host.is_authoritative() {
            return Err(WaystoneError::NotAuthoritative);
        }
        let services = host.services().clone();
        if self.identity.is_valid(services.registry.as_ref()) {
            return Err(WaystoneError::AlreadyInitialized { pos: self.pos });
        }

        let waystone = Waystone::new(
            WaystoneId::new(),
            host.dimension(),
            self.pos,
            was_generated,
            owner,
        );
        let name = services.names.generate(&waystone, host.rng());
        let waystone = std::sync::Arc::new(waystone.with_name(name));
        services.registry.register(waystone.clone());

        tracing::info!(
            "Created waystone '{}' ({}) at {} in {}",
            waystone.name(),
            waystone.id(),
            self.pos,
            waystone.dimension(),
        );

        self.identity = Identity::Resolved(waystone);
        host.mark_changed(self.pos);
        Ok(())
    }

    /// Take the identity of the lower half of this structure.
    pub fn initialize_from_base(&mut self, base: &mut WaystoneBinding, host: &mut dyn BindingHost) {
        let identity = base.current_identity(host);
        self.adopt(host, identity);
    }

    /// Destroy this structure's waystone.
    ///
    /// The waystone (if any) is removed from the registry and from every
    /// player's knowledge, this binding is suppressed for good, and the other
    /// half is revoked. Calling it again is harmless.
    ///
    /// # Panics
    ///
    /// If the binding is not attached to a level: the surrounding
    /// orchestration is broken.
    pub fn uninitialize(&mut self, host: &mut dyn BindingHost) {
        assert!(
            self.attached,
            "uninitialize on detached waystone binding at {}",
            self.pos
        );

        let services = host.services().clone();
        if let Some(waystone) = self.identity.resolve(services.registry.as_ref()) {
            services.registry.remove(&waystone);
            services.knowledge.forget(&waystone);
            services.names.release(&waystone);
            tracing::info!(
                "Removed waystone '{}' ({}) at {}",
                waystone.name(),
                waystone.id(),
                waystone.pos(),
            );
        }

        self.revoke();
        host.mark_changed(self.pos);

        let partner = self.partner_pos();
        if !host.revoke_at(partner) {
            tracing::debug!(
                "No {} waystone half at {} to revoke",
                self.half.opposite(),
                partner
            );
        }
    }

    /// Drop the identity and block any further resolution.
    ///
    /// This is the partner-facing half of [`uninitialize`](Self::uninitialize):
    /// it does not touch the registry, which the destroying half has already
    /// cleaned up for the shared identity.
    pub fn revoke(&mut self) {
        self.identity = Identity::Invalid;
        self.suppress_auto_init = true;
    }

    /// Install the saved identifier as a proxy. The registry is not consulted
    /// until the next access. `None` leaves the binding as it is.
    pub fn restore(&mut self, id: Option<WaystoneId>) {
        if let Some(id) = id {
            self.identity = Identity::Proxy(WaystoneProxy::new(id));
        }
    }

    fn adopt(&mut self, host: &mut dyn BindingHost, identity: Identity) {
        let changed = identity.key() != self.identity.key();
        self.identity = identity;
        if changed {
            tracing::debug!(
                "Waystone half at {} adopted {:?}",
                self.pos,
                self.identity.key()
            );
            host.mark_changed(self.pos);
        }
    }
}
