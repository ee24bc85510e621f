//! Shared fixtures: a registry that counts every call, and level builders.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use waystones::knowledge::PlayerKnowledge;
use waystones::level::{Authority, Level};
use waystones::names::SyllableNameGenerator;
use waystones::registry::{WaystoneManager, WaystoneRegistry};
use waystones::services::Services;
use waystones::waystone::{Waystone, WaystoneId};
use waystones_engine::world::dimension::DimensionId;

/// In-memory registry that records how often each operation ran.
#[derive(Default)]
pub struct CountingRegistry {
    pub inner: WaystoneManager,
    registered: AtomicUsize,
    removed: AtomicUsize,
    lookups: AtomicUsize,
}

impl CountingRegistry {
    pub fn registered(&self) -> usize {
        self.registered.load(Ordering::SeqCst)
    }

    pub fn removed(&self) -> usize {
        self.removed.load(Ordering::SeqCst)
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn contains(&self, id: WaystoneId) -> bool {
        self.inner.contains(id)
    }
}

impl WaystoneRegistry for CountingRegistry {
    fn register(&self, waystone: Arc<Waystone>) {
        self.registered.fetch_add(1, Ordering::SeqCst);
        self.inner.register(waystone);
    }

    fn remove(&self, waystone: &Waystone) {
        self.removed.fetch_add(1, Ordering::SeqCst);
        self.inner.remove(waystone);
    }

    fn lookup(&self, id: WaystoneId) -> Option<Arc<Waystone>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.lookup(id)
    }
}

pub struct Fixture {
    pub level: Level,
    pub registry: Arc<CountingRegistry>,
    pub knowledge: Arc<PlayerKnowledge>,
}

pub fn services(registry: &Arc<CountingRegistry>, knowledge: &Arc<PlayerKnowledge>) -> Services {
    Services::new(
        registry.clone(),
        knowledge.clone(),
        Arc::new(SyllableNameGenerator::default()),
    )
}

pub fn level_with(authority: Authority, registry: Arc<CountingRegistry>) -> Fixture {
    let knowledge = Arc::new(PlayerKnowledge::new());
    let level = Level::new(
        DimensionId::Overworld,
        authority,
        services(&registry, &knowledge),
        1234,
    );
    Fixture {
        level,
        registry,
        knowledge,
    }
}

pub fn authoritative() -> Fixture {
    level_with(Authority::Authoritative, Arc::new(CountingRegistry::default()))
}

pub fn replica(registry: Arc<CountingRegistry>) -> Fixture {
    level_with(Authority::Replica, registry)
}
