//! Per-player record of which waystones each player has discovered.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use uuid::Uuid;

use crate::waystone::{Waystone, WaystoneId};

/// Knowledge contract consumed by waystone bindings: when a waystone is
/// destroyed, nobody may keep knowing it.
pub trait KnowledgeStore: Send + Sync {
    fn forget(&self, waystone: &Waystone);
}

/// In-memory knowledge store keyed by player UUID.
pub struct PlayerKnowledge {
    known: RwLock<HashMap<Uuid, HashSet<WaystoneId>>>,
}

impl PlayerKnowledge {
    pub fn new() -> Self {
        Self {
            known: RwLock::new(HashMap::new()),
        }
    }

    /// Record that `player` discovered `waystone`. Returns `false` if they
    /// already knew it.
    pub fn learn(&self, player: Uuid, waystone: WaystoneId) -> bool {
        self.known
            .write()
            .expect("player knowledge poisoned")
            .entry(player)
            .or_default()
            .insert(waystone)
    }

    pub fn knows(&self, player: Uuid, waystone: WaystoneId) -> bool {
        self.known
            .read()
            .expect("player knowledge poisoned")
            .get(&player)
            .is_some_and(|set| set.contains(&waystone))
    }

    /// Everything `player` knows, ordered by id.
    pub fn known_by(&self, player: Uuid) -> Vec<WaystoneId> {
        let mut ids: Vec<WaystoneId> = self
            .known
            .read()
            .expect("player knowledge poisoned")
            .get(&player)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// Number of players who know `waystone`.
    pub fn knower_count(&self, waystone: WaystoneId) -> usize {
        self.known
            .read()
            .expect("player knowledge poisoned")
            .values()
            .filter(|set| set.contains(&waystone))
            .count()
    }
}

impl Default for PlayerKnowledge {
    fn default() -> Self {
        Self::new()
    }
}

impl KnowledgeStore for PlayerKnowledge {
    fn forget(&self, waystone: &Waystone) {
        let id = waystone.id();
        let mut known = self.known.write().expect("player knowledge poisoned");
        let mut forgotten = 0usize;
        for set in known.values_mut() {
            if set.remove(&id) {
                forgotten += 1;
            }
        }
        if forgotten > 0 {
            tracing::debug!("Waystone {} forgotten by {} players", id, forgotten);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waystones_engine::world::dimension::DimensionId;
    use waystones_engine::world::position::BlockPos;

    #[test]
    fn forget_removes_from_every_player() {
        let knowledge = PlayerKnowledge::new();
        let waystone = Waystone::new(
            WaystoneId::new(),
            DimensionId::Overworld,
            BlockPos::new(1, 2, 3),
            true,
            None,
        );
        let other = WaystoneId::new();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

        assert!(knowledge.learn(alice, waystone.id()));
        assert!(!knowledge.learn(alice, waystone.id()));
        knowledge.learn(bob, waystone.id());
        knowledge.learn(bob, other);
        assert_eq!(knowledge.knower_count(waystone.id()), 2);

        knowledge.forget(&waystone);
        assert!(!knowledge.knows(alice, waystone.id()));
        assert!(!knowledge.knows(bob, waystone.id()));
        assert_eq!(knowledge.known_by(bob), vec![other]);
    }
}
