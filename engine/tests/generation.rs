use std::collections::HashSet;

use engine::{
    config::GeneratorSettings,
    digger::{DigResult, DungeonMap, FLOOR, LayoutDigger, RawCorridor, RawRoom},
    error::GenerationError,
    generator::{Dungeon, DungeonGenerator},
    rooms::{GridPos, RoomType, SpawnKind},
};
use rand::{SeedableRng, rngs::StdRng};

// Generates with a series of seeds and keeps the ones that pass validation.
fn generated_dungeons(seeds: std::ops::Range<u64>) -> Vec<Dungeon> {
    seeds
        .filter_map(|seed| {
            let mut generator =
                DungeonGenerator::new(GeneratorSettings::default(), StdRng::seed_from_u64(seed)).unwrap();
            match generator.generate() {
                Ok(dungeon) => Some(dungeon),
                Err(GenerationError::ValidationFailed { .. }) => None,
                Err(other) => panic!("unexpected generation error: {other}"),
            }
        })
        .collect()
}

#[test]
fn most_seeds_produce_a_valid_dungeon() {
    let dungeons = generated_dungeons(0..20);
    assert!(dungeons.len() >= 10, "only {} of 20 seeds generated", dungeons.len());
}

#[test]
fn walkable_cells_match_the_dug_map() {
    for dungeon in generated_dungeons(0..8) {
        let manager = &dungeon.manager;
        for z in 0..manager.height() {
            for x in 0..manager.width() {
                let dug = dungeon.map.is_floor(GridPos::new(x, z));
                assert_eq!(manager.is_walkable(x, z), dug, "cell ({x}, {z})");
            }
        }
    }
}

#[test]
fn room_tiles_point_back_at_their_room() {
    for dungeon in generated_dungeons(0..8) {
        let manager = &dungeon.manager;
        for room in manager.rooms() {
            assert!(room.bounds.is_valid());
            assert!(!room.tiles.is_empty());
            for tile in &room.tiles {
                assert!(manager.is_walkable(tile.x, tile.z));
                assert_eq!(manager.get_room_at_position(tile.x, tile.z).map(|r| r.id.as_str()), Some(room.id.as_str()));
            }
        }
    }
}

#[test]
fn room_bounds_are_unique_and_types_are_complete() {
    for dungeon in generated_dungeons(0..8) {
        let rooms = dungeon.manager.rooms();
        let keys: HashSet<String> = rooms.iter().map(|r| r.bounds.key()).collect();
        assert_eq!(keys.len(), rooms.len());
        assert!(rooms.len() >= 5);
        for required in [RoomType::Spawn, RoomType::Safe, RoomType::Standard] {
            assert!(rooms.iter().any(|r| r.room_type == required), "missing {required}");
        }
        assert_eq!(rooms[0].room_type, RoomType::Spawn);
        assert!(dungeon.validate().is_valid);
    }
}

#[test]
fn connections_are_symmetric_and_point_at_known_rooms() {
    for dungeon in generated_dungeons(0..8) {
        let manager = &dungeon.manager;
        for room in manager.rooms() {
            for other_id in &room.connections {
                let other = manager.room(other_id).expect("connection to unknown room");
                assert!(other.connections.contains(&room.id));
            }
            for door in &room.doors {
                assert!(manager.is_walkable(door.x, door.z));
            }
        }
    }
}

#[test]
fn spawn_points_follow_room_types() {
    for mut dungeon in generated_dungeons(0..8) {
        let manager = &mut dungeon.manager;
        for room in manager.rooms() {
            match room.room_type {
                RoomType::Safe => {
                    assert_eq!(room.spawn_points.get(&SpawnKind::Respawn), Some(&room.center));
                    assert_eq!(room.spawn_points.get(&SpawnKind::Health), Some(&room.center.offset(2, 0)));
                }
                RoomType::Standard | RoomType::Spawn => {
                    assert_eq!(room.patrol_points.len(), 2);
                    assert!(room.patrol_points.iter().all(|&p| room.contains(p)));
                }
                RoomType::Boss => assert_eq!(room.patrol_points.len(), 4),
                RoomType::Loot => assert!(room.spawn_points.contains_key(&SpawnKind::Loot)),
            }
        }
        let respawns = manager.spawn_points(SpawnKind::Respawn);
        let pick = manager.get_random_spawn_point(SpawnKind::Respawn);
        assert!(pick.is_some_and(|p| respawns.contains(&p)));
    }
}

#[test]
fn rooms_are_reachable_from_the_spawn_room() {
    for dungeon in generated_dungeons(0..5) {
        let manager = &dungeon.manager;
        let start = dungeon.player_start().unwrap();
        for room in manager.rooms() {
            let path = manager.find_path(start, room.center).expect("room unreachable");
            assert_eq!(path.first(), Some(&start));
            assert_eq!(path.last(), Some(&room.center));
            for pair in path.windows(2) {
                assert_eq!(pair[0].manhattan(pair[1]), 1);
            }
        }
    }
}

// ============================================================================
// Retry Scenario
// ============================================================================

struct SparseDigger {
    calls: u32,
}

impl LayoutDigger for SparseDigger {
    fn dig(&mut self, width: i32, height: i32, _rng: &mut StdRng) -> DigResult {
        self.calls += 1;
        let mut map = DungeonMap::new(width, height);
        let rooms: Vec<RawRoom> = [(2, 5, 2, 4), (10, 13, 2, 4), (20, 23, 10, 13)]
            .into_iter()
            .map(|(left, right, top, bottom)| RawRoom {
                left,
                right,
                top,
                bottom,
                doors: Vec::new(),
            })
            .collect();
        for room in &rooms {
            for cell in room.bounds().cells() {
                map.set(cell, FLOOR);
            }
        }
        for x in 6..10 {
            map.set(GridPos::new(x, 3), FLOOR);
        }
        for z in 5..10 {
            map.set(GridPos::new(21, z), FLOOR);
        }
        DigResult {
            map,
            rooms,
            corridors: vec![
                RawCorridor {
                    start: GridPos::new(6, 3),
                    end: GridPos::new(9, 3),
                },
                RawCorridor {
                    start: GridPos::new(21, 5),
                    end: GridPos::new(21, 9),
                },
            ],
        }
    }
}

#[test]
fn sparse_layout_is_accepted_after_retries_then_fails_validation() {
    let mut generator = DungeonGenerator::with_digger(
        GeneratorSettings::default(),
        SparseDigger { calls: 0 },
        StdRng::seed_from_u64(1),
    )
    .unwrap();

    let dungeon = generator.build_dungeon().unwrap();
    assert_eq!(generator.digger().calls, 5);
    assert_eq!(dungeon.attempts, 5);
    assert_eq!(dungeon.manager.room_count(), 3);

    let report = dungeon.validate();
    assert!(!report.is_valid);
    assert!(report.errors.iter().any(|e| e.contains("no SAFE room") || e.contains("no STANDARD room")));
    assert!(report.errors.iter().any(|e| e.contains("only 3 rooms")));
}

#[test]
fn sparse_layout_fails_generation_after_one_regeneration() {
    let mut generator = DungeonGenerator::with_digger(
        GeneratorSettings::default(),
        SparseDigger { calls: 0 },
        StdRng::seed_from_u64(2),
    )
    .unwrap();

    let result = generator.generate();
    assert!(matches!(result, Err(GenerationError::ValidationFailed { .. })));
    assert_eq!(generator.digger().calls, 10);
}
