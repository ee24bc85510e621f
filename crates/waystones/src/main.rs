use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::broadcast;
use uuid::Uuid;
use waystones::config::Config;
use waystones::knowledge::PlayerKnowledge;
use waystones::level::{Authority, Level};
use waystones::persistence;
use waystones::registry::WaystoneManager;
use waystones::services::Services;
use waystones::sync::{self, UpdateBatch};
use waystones_engine::world::position::BlockPos;

#[tokio::main]
async fn main() {
    let demo_mode = std::env::args().any(|a| a == "--demo");
    let config_path: Option<PathBuf> = std::env::args()
        .skip_while(|a| a != "--config")
        .nth(1)
        .map(PathBuf::from);
    let world_override: Option<PathBuf> = std::env::args()
        .skip_while(|a| a != "--world")
        .nth(1)
        .map(PathBuf::from);
    let seed_override: Option<u64> = std::env::args()
        .skip_while(|a| a != "--seed")
        .nth(1)
        .and_then(|s| s.parse().ok());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".parse().unwrap()),
        )
        .init();

    let mut config = match Config::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load config: {:#}", e);
            return;
        }
    };
    if let Some(dir) = world_override {
        config.world_dir = dir;
    }
    if let Some(seed) = seed_override {
        config.seed = seed;
    }

    // ── Collaborators ───────────────────────────────────────────────────
    let registry = Arc::new(WaystoneManager::new());
    let knowledge = Arc::new(PlayerKnowledge::new());
    let names = Arc::new(config.name_generator());
    let services = Services::new(registry.clone(), knowledge.clone(), names.clone());

    match persistence::load_registry(&*registry, &config.world_dir) {
        Ok(0) => tracing::info!("No saved waystones found"),
        Ok(n) => tracing::info!("Loaded {} waystones from {}", n, config.world_dir.display()),
        Err(e) => tracing::error!("Failed to load waystone registry: {:#}", e),
    }
    for waystone in registry.snapshot() {
        names.reserve(&waystone.name());
    }

    // ── Level ───────────────────────────────────────────────────────────
    let mut level = Level::new(
        config.dimension,
        Authority::Authoritative,
        services.clone(),
        config.seed,
    );
    match persistence::load_level_into(&mut level, &config.world_dir) {
        Ok(0) => tracing::info!("No saved waystone structures in {}", config.dimension),
        Ok(n) => tracing::info!("Restored {} waystone block entities", n),
        Err(e) => tracing::error!("Failed to load level: {:#}", e),
    }

    if demo_mode {
        run_demo(&mut level, &registry, &knowledge, services).await;
    } else {
        report(&mut level);
    }

    // ── Save on exit ────────────────────────────────────────────────────
    tracing::info!("Saving world before exit...");
    if let Err(e) = persistence::save_level(&mut level, &config.world_dir) {
        tracing::error!("Level save failed: {:#}", e);
    }
    if let Err(e) = persistence::save_registry(&registry, &config.world_dir) {
        tracing::error!("Registry save failed: {:#}", e);
    }
}

/// Resolve every binding in the level and log what it points at.
fn report(level: &mut Level) {
    for pos in level.binding_positions() {
        match level.waystone_at(pos) {
            Some(waystone) => tracing::info!(
                "{} -> '{}' ({})",
                pos,
                waystone.name(),
                waystone.id()
            ),
            None => tracing::info!("{} -> unresolved", pos),
        }
    }
}

/// Walk one waystone through its whole life: placement, replication, a
/// generated neighbour resolving lazily, and destruction.
async fn run_demo(
    level: &mut Level,
    registry: &WaystoneManager,
    knowledge: &PlayerKnowledge,
    services: Services,
) {
    tracing::info!("Waystones -- binding lifecycle demo");

    let (bus_tx, mut bus_rx) = broadcast::channel::<UpdateBatch>(sync::BUS_CAPACITY);
    let mut replica = Level::new(level.dimension(), Authority::Replica, services, 0);

    // ── A player places a waystone ──────────────────────────────────────
    let player = Uuid::new_v4();
    let placed_at = BlockPos::new(8, 65, 8);
    let placed = match level.place_waystone(placed_at, Some(player)) {
        Ok(identity) => identity,
        Err(e) => {
            tracing::error!("Placement failed: {}", e);
            return;
        }
    };
    let Some(waystone) = placed.resolve(registry) else {
        tracing::error!("Placed waystone did not resolve");
        return;
    };
    knowledge.learn(player, waystone.id());
    tracing::info!("Player {} placed '{}'", player, waystone.name());

    // ── World generation drops a second one; nothing is created yet ─────
    let generated_at = BlockPos::new(40, 70, -12);
    if let Err(e) = level.generate_waystone(generated_at) {
        tracing::error!("Generation failed: {}", e);
    }
    tracing::info!("Registry holds {} waystones before first access", registry.len());

    // The upper half is asked first; it resolves through the lower half.
    if let Some(generated) = level.waystone_at(generated_at.up()) {
        tracing::info!("Generated waystone resolved as '{}'", generated.name());
    }

    // ── Replicate to an observer ────────────────────────────────────────
    let sent = sync::publish(level, &bus_tx);
    tracing::info!("Published {} updates", sent);
    if sent > 0 {
        match bus_rx.recv().await {
            Ok(batch) => sync::apply_batch(&mut replica, &batch),
            Err(e) => tracing::warn!("Replica missed updates: {}", e),
        }
    }
    match replica.waystone_at(placed_at.up()) {
        Some(seen) => tracing::info!("Replica sees '{}' at {}", seen.name(), placed_at.up()),
        None => tracing::warn!("Replica could not resolve {}", placed_at.up()),
    }

    // ── Rename through the registry; both halves see it ─────────────────
    registry.rename(waystone.id(), "Home");
    if let Some(upper) = level.waystone_at(placed_at.up()) {
        tracing::info!("Upper half now reads '{}'", upper.name());
    }

    // ── Break it ────────────────────────────────────────────────────────
    if let Err(e) = level.break_waystone(placed_at.up()) {
        tracing::error!("Break failed: {}", e);
    }
    tracing::info!(
        "After breaking: {} waystones registered, player knows {}",
        registry.len(),
        knowledge.known_by(player).len(),
    );

    let sent = sync::publish(level, &bus_tx);
    if sent > 0 {
        if let Ok(batch) = bus_rx.recv().await {
            sync::apply_batch(&mut replica, &batch);
        }
    }
    tracing::info!(
        "Published {} updates; replica keeps {} bindings",
        sent,
        replica.binding_count()
    );
}
