//! Block lattice and block entity bookkeeping under concurrent and arbitrary
//! write sequences.

use std::collections::BTreeMap;

use proptest::prelude::*;
use waystones_engine::block_entity::BlockEntityMap;
use waystones_engine::world::World;
use waystones_engine::world::block::BlockId;
use waystones_engine::world::dimension::DimensionId;
use waystones_engine::world::position::BlockPos;

const STONE: BlockId = BlockId(1);

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

#[test]
fn concurrent_writers_on_disjoint_cells_all_land() {
    let world = World::new(DimensionId::Overworld);
    std::thread::scope(|s| {
        for t in 0..8i64 {
            let world = &world;
            s.spawn(move || {
                for i in 0..64i64 {
                    world.set_block(BlockPos::new(i, 64 + t, -i), BlockId(1 + t as u16));
                }
            });
        }
    });

    assert_eq!(world.blocks().len(), 8 * 64);
    for t in 0..8i64 {
        assert_eq!(world.get_block(BlockPos::new(5, 64 + t, -5)), BlockId(1 + t as u16));
    }
}

#[test]
fn clearing_the_last_block_unloads_the_chunk() {
    let world = World::new(DimensionId::End);
    let pos = BlockPos::new(-17, 10, 33);

    assert_eq!(world.set_block(pos, STONE), BlockId::AIR);
    assert!(world.has_chunk(pos.chunk()));
    assert_eq!(world.set_block(pos, BlockId::AIR), STONE);
    assert!(!world.has_chunk(pos.chunk()));
    assert_eq!(world.chunk_count(), 0);
}

// ---------------------------------------------------------------------------
// BlockEntityMap
// ---------------------------------------------------------------------------

#[test]
fn detached_entity_keeps_its_dirty_mark() {
    let mut map = BlockEntityMap::new();
    let pos = BlockPos::new(0, 64, 0);
    map.insert(pos, "lower");
    map.take_dirty();

    let entity = map.detach(pos).unwrap();
    assert!(!map.contains(pos));
    map.mark_dirty(pos);
    map.attach(pos, entity);

    assert_eq!(map.take_dirty(), vec![pos]);
}

#[test]
fn removed_entity_is_not_reported_dirty() {
    let mut map = BlockEntityMap::new();
    let pos = BlockPos::new(3, 3, 3);
    map.insert(pos, 1u8);
    map.remove(pos);
    map.mark_dirty(pos);

    assert!(map.take_dirty().is_empty());
}

proptest! {
    #[test]
    fn world_matches_a_plain_map(
        writes in proptest::collection::vec(
            ((-40i64..40, 0i64..8, -40i64..40), 0u16..4),
            0..200,
        ),
    ) {
        let world = World::new(DimensionId::Overworld);
        let mut model = BTreeMap::new();
        for ((x, y, z), id) in writes {
            let pos = BlockPos::new(x, y, z);
            let old = world.set_block(pos, BlockId(id));
            let expected_old = model.get(&pos).copied().unwrap_or(BlockId::AIR);
            prop_assert_eq!(old, expected_old);
            if id == 0 {
                model.remove(&pos);
            } else {
                model.insert(pos, BlockId(id));
            }
        }

        let snapshot: Vec<(BlockPos, BlockId)> = model.into_iter().collect();
        prop_assert_eq!(world.blocks(), snapshot);
    }
}
