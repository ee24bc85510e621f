use std::sync::Arc;

use uuid::Uuid;
use waystones_engine::world::dimension::DimensionId;
use waystones_engine::world::position::BlockPos;

use super::record::{Waystone, WaystoneId};
use crate::registry::WaystoneRegistry;

/// What a waystone binding currently points at.
///
/// All three variants answer the same accessors. Every accessor takes the
/// registry, because a [`Identity::Proxy`] has nothing but a key and must look
/// itself up each time. Callers check [`Identity::is_valid`] (or use
/// [`Identity::resolve`]) before relying on the answer.
#[derive(Debug, Clone, Default)]
pub enum Identity {
    /// No identity: not resolved yet, or revoked.
    #[default]
    Invalid,
    /// A reference by key, restored from saved or replicated state.
    Proxy(WaystoneProxy),
    /// A full record, shared with the registry.
    Resolved(Arc<Waystone>),
}

impl Identity {
    /// The record this identity stands for right now, if any.
    pub fn resolve(&self, registry: &dyn WaystoneRegistry) -> Option<Arc<Waystone>> {
        match self {
            Self::Invalid => None,
            Self::Proxy(proxy) => proxy.resolve(registry),
            Self::Resolved(waystone) => Some(Arc::clone(waystone)),
        }
    }

    pub fn is_valid(&self, registry: &dyn WaystoneRegistry) -> bool {
        match self {
            Self::Invalid => false,
            Self::Proxy(proxy) => proxy.resolve(registry).is_some(),
            Self::Resolved(_) => true,
        }
    }

    pub fn id(&self, registry: &dyn WaystoneRegistry) -> Option<WaystoneId> {
        self.resolve(registry).map(|w| w.id())
    }

    pub fn name(&self, registry: &dyn WaystoneRegistry) -> Option<String> {
        self.resolve(registry).map(|w| w.name())
    }

    pub fn dimension(&self, registry: &dyn WaystoneRegistry) -> Option<DimensionId> {
        self.resolve(registry).map(|w| w.dimension())
    }

    pub fn pos(&self, registry: &dyn WaystoneRegistry) -> Option<BlockPos> {
        self.resolve(registry).map(|w| w.pos())
    }

    pub fn was_generated(&self, registry: &dyn WaystoneRegistry) -> Option<bool> {
        self.resolve(registry).map(|w| w.was_generated())
    }

    pub fn owner(&self, registry: &dyn WaystoneRegistry) -> Option<Uuid> {
        self.resolve(registry).and_then(|w| w.owner())
    }

    /// The key this identity carries, without asking the registry whether it
    /// still exists. Good for change detection and logging, never for
    /// deciding validity.
    pub fn key(&self) -> Option<WaystoneId> {
        match self {
            Self::Invalid => None,
            Self::Proxy(proxy) => Some(proxy.id()),
            Self::Resolved(waystone) => Some(waystone.id()),
        }
    }
}

impl From<Arc<Waystone>> for Identity {
    fn from(waystone: Arc<Waystone>) -> Self {
        Self::Resolved(waystone)
    }
}

/// A weak reference to a waystone by key.
///
/// Holds no record and caches nothing, not even a failed lookup: a waystone
/// registered after the proxy was created becomes visible on the next access,
/// and one removed from the registry stops resolving immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WaystoneProxy {
    id: WaystoneId,
}

impl WaystoneProxy {
    pub const fn new(id: WaystoneId) -> Self {
        Self { id }
    }

    pub const fn id(&self) -> WaystoneId {
        self.id
    }

    pub fn resolve(&self, registry: &dyn WaystoneRegistry) -> Option<Arc<Waystone>> {
        let found = registry.lookup(self.id);
        if found.is_none() {
            tracing::trace!("Waystone proxy {} did not resolve", self.id);
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::WaystoneManager;

    fn record() -> Arc<Waystone> {
        Arc::new(
            Waystone::new(
                WaystoneId::new(),
                DimensionId::Nether,
                BlockPos::new(-8, 40, 12),
                false,
                Some(Uuid::new_v4()),
            )
            .with_name("Cinderhold"),
        )
    }

    #[test]
    fn invalid_answers_nothing() {
        let registry = WaystoneManager::new();
        let identity = Identity::Invalid;
        assert!(!identity.is_valid(&registry));
        assert_eq!(identity.id(&registry), None);
        assert_eq!(identity.name(&registry), None);
        assert_eq!(identity.pos(&registry), None);
        assert_eq!(identity.key(), None);
    }

    #[test]
    fn unknown_proxy_stays_invalid_without_side_effects() {
        let registry = WaystoneManager::new();
        let identity = Identity::Proxy(WaystoneProxy::new(WaystoneId::new()));
        for _ in 0..3 {
            assert!(!identity.is_valid(&registry));
            assert_eq!(identity.name(&registry), None);
            assert_eq!(identity.dimension(&registry), None);
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn proxy_tracks_registry_state_on_every_call() {
        let registry = WaystoneManager::new();
        let waystone = record();
        let identity = Identity::Proxy(WaystoneProxy::new(waystone.id()));
        assert!(!identity.is_valid(&registry));

        registry.register(Arc::clone(&waystone));
        assert!(identity.is_valid(&registry));
        assert_eq!(identity.name(&registry).as_deref(), Some("Cinderhold"));
        assert_eq!(identity.dimension(&registry), Some(DimensionId::Nether));
        assert_eq!(identity.owner(&registry), waystone.owner());

        registry.remove(&waystone);
        assert!(!identity.is_valid(&registry));
        assert_eq!(identity.key(), Some(waystone.id()));
    }

    #[test]
    fn resolved_is_valid_regardless_of_registry() {
        let registry = WaystoneManager::new();
        let waystone = record();
        let identity = Identity::from(Arc::clone(&waystone));
        assert!(identity.is_valid(&registry));
        assert_eq!(identity.pos(&registry), Some(BlockPos::new(-8, 40, 12)));
        assert_eq!(identity.was_generated(&registry), Some(false));
    }
}
