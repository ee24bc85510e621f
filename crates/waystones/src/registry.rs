//! The waystone registry: the source of truth for which waystones exist.
//!
//! Bindings in the world only ever hold an [`Identity`](crate::waystone::Identity);
//! the record itself lives here. Every proxy access is a [`WaystoneRegistry::lookup`],
//! so implementations must index by id.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::broadcast;

use crate::waystone::{Waystone, WaystoneId};

/// Registry contract consumed by waystone bindings.
pub trait WaystoneRegistry: Send + Sync {
    /// Add a newly created waystone. Called exactly once per record.
    fn register(&self, waystone: Arc<Waystone>);

    /// Remove a waystone. Removing an unknown waystone is a no-op.
    fn remove(&self, waystone: &Waystone);

    /// Current record for `id`, if it exists.
    fn lookup(&self, id: WaystoneId) -> Option<Arc<Waystone>>;
}

/// Registry lifecycle events, broadcast to subscribers (sync, UI).
#[derive(Clone, Debug)]
pub enum WaystoneEvent {
    Added { id: WaystoneId, name: String },
    Removed { id: WaystoneId },
    Renamed { id: WaystoneId, name: String },
}

/// In-memory registry keyed by [`WaystoneId`].
///
/// Uses `std::sync::RwLock` because every operation is brief and the access
/// pattern is read-heavy (every proxy access is a lookup).
pub struct WaystoneManager {
    waystones: RwLock<HashMap<WaystoneId, Arc<Waystone>>>,
    event_tx: broadcast::Sender<WaystoneEvent>,
}

impl WaystoneManager {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            waystones: RwLock::new(HashMap::new()),
            event_tx,
        }
    }

    /// Rename a waystone, returning `false` if it does not exist.
    pub fn rename(&self, id: WaystoneId, name: impl Into<String>) -> bool {
        let Some(waystone) = self.lookup(id) else {
            return false;
        };
        let name = name.into();
        waystone.set_name(name.clone());
        let _ = self.event_tx.send(WaystoneEvent::Renamed { id, name });
        true
    }

    pub fn contains(&self, id: WaystoneId) -> bool {
        self.waystones
            .read()
            .expect("waystone registry poisoned")
            .contains_key(&id)
    }

    /// First waystone with exactly this name.
    pub fn find_by_name(&self, name: &str) -> Option<Arc<Waystone>> {
        self.waystones
            .read()
            .expect("waystone registry poisoned")
            .values()
            .find(|w| w.name() == name)
            .cloned()
    }

    /// Snapshot of all registered waystones, ordered by id.
    pub fn snapshot(&self) -> Vec<Arc<Waystone>> {
        let mut all: Vec<Arc<Waystone>> = self
            .waystones
            .read()
            .expect("waystone registry poisoned")
            .values()
            .cloned()
            .collect();
        all.sort_by_key(|w| w.id());
        all
    }

    pub fn len(&self) -> usize {
        self.waystones
            .read()
            .expect("waystone registry poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WaystoneEvent> {
        self.event_tx.subscribe()
    }
}

impl Default for WaystoneManager {
    fn default() -> Self {
        Self::new()
    }
}

impl WaystoneRegistry for WaystoneManager {
    fn register(&self, waystone: Arc<Waystone>) {
        let id = waystone.id();
        let name = waystone.name();
        {
            let mut waystones = self.waystones.write().expect("waystone registry poisoned");
            if waystones.contains_key(&id) {
                tracing::warn!("Waystone {} is already registered, keeping the existing record", id);
                return;
            }
            waystones.insert(id, waystone);
        }
        // Best-effort: if no subscribers yet, the send fails silently.
        let _ = self.event_tx.send(WaystoneEvent::Added { id, name });
    }

    fn remove(&self, waystone: &Waystone) {
        let id = waystone.id();
        let removed = self
            .waystones
            .write()
            .expect("waystone registry poisoned")
            .remove(&id);
        if removed.is_some() {
            let _ = self.event_tx.send(WaystoneEvent::Removed { id });
        }
    }

    fn lookup(&self, id: WaystoneId) -> Option<Arc<Waystone>> {
        self.waystones
            .read()
            .expect("waystone registry poisoned")
            .get(&id)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waystones_engine::world::dimension::DimensionId;
    use waystones_engine::world::position::BlockPos;

    fn waystone(name: &str) -> Arc<Waystone> {
        Arc::new(
            Waystone::new(
                WaystoneId::new(),
                DimensionId::Overworld,
                BlockPos::new(0, 64, 0),
                false,
                None,
            )
            .with_name(name),
        )
    }

    #[test]
    fn register_lookup_remove() {
        let manager = WaystoneManager::new();
        let w = waystone("Ashgrove");
        manager.register(Arc::clone(&w));
        assert!(manager.contains(w.id()));
        assert_eq!(manager.lookup(w.id()).unwrap().name(), "Ashgrove");

        manager.remove(&w);
        assert!(manager.lookup(w.id()).is_none());
        // Second removal is harmless.
        manager.remove(&w);
        assert!(manager.is_empty());
    }

    #[test]
    fn duplicate_registration_keeps_first_record() {
        let manager = WaystoneManager::new();
        let first = waystone("First");
        let impostor = Arc::new(
            Waystone::new(first.id(), DimensionId::End, BlockPos::new(9, 9, 9), true, None)
                .with_name("Second"),
        );
        manager.register(Arc::clone(&first));
        manager.register(impostor);
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.lookup(first.id()).unwrap().name(), "First");
    }

    #[test]
    fn events_are_broadcast() {
        let manager = WaystoneManager::new();
        let mut rx = manager.subscribe();
        let w = waystone("Old");
        manager.register(Arc::clone(&w));
        assert!(manager.rename(w.id(), "New"));
        manager.remove(&w);

        assert!(matches!(rx.try_recv(), Ok(WaystoneEvent::Added { name, .. }) if name == "Old"));
        assert!(matches!(rx.try_recv(), Ok(WaystoneEvent::Renamed { name, .. }) if name == "New"));
        assert!(matches!(rx.try_recv(), Ok(WaystoneEvent::Removed { id }) if id == w.id()));
        assert_eq!(w.name(), "New");
    }
}
