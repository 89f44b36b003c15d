use std::collections::HashSet;

use bevy_math::Vec3;
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{debug, info, warn};

use crate::{
    collab::TileMapper,
    config::GeneratorSettings,
    constants::{
        LOOT_ROOM_MIN_AREA, MAX_ADJACENT_ROOM_GAP, MIN_DUNGEON_DIMENSION, MIN_VALID_ROOMS, ROOM_NEIGHBOR_DISTANCE,
        SAFE_ROOM_CHANCE,
    },
    digger::{DigResult, Digger, DiggerOptions, DungeonMap, LayoutDigger, RawCorridor},
    error::{GenerationError, GenerationResult},
    manager::DungeonManager,
    rooms::{Bounds, GridPos, Room, RoomNeighbor, RoomType},
};

// ============================================================================
// Generated Dungeon
// ============================================================================

#[derive(Debug, Clone)]
pub struct Dungeon {
    pub manager: DungeonManager,
    pub map: DungeonMap,
    pub corridors: Vec<RawCorridor>,
    // Dig attempts used for the accepted layout.
    pub attempts: u32,
}

impl Dungeon {
    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        validate_dungeon(
            self.manager.width(),
            self.manager.height(),
            Some(&self.map),
            self.manager.rooms(),
        )
    }

    // World positions where the enemy may (re)spawn: room centers away from the
    // player's entrance and the safe rooms.
    #[must_use]
    pub fn enemy_spawn_positions(&self, mapper: &TileMapper, y: f32) -> Vec<Vec3> {
        self.manager
            .rooms()
            .iter()
            .filter(|r| !matches!(r.room_type, RoomType::Spawn | RoomType::Safe))
            .map(|r| mapper.world_position(r.center, y))
            .collect()
    }

    #[must_use]
    pub fn player_start(&self) -> Option<GridPos> {
        self.manager
            .rooms_of_type(RoomType::Spawn)
            .first()
            .copied()
            .or_else(|| self.manager.rooms().first())
            .map(|r| r.center)
    }
}

// ============================================================================
// Validation
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

// Structural checks on a registered dungeon. Room types are a closed enum,
// so only bounds, tiles and the type mix are checked per room.
#[must_use]
pub fn validate_dungeon(width: i32, height: i32, map: Option<&DungeonMap>, rooms: &[Room]) -> ValidationReport {
    let mut errors = Vec::new();

    if width < MIN_DUNGEON_DIMENSION {
        errors.push(format!("dungeon width {width} is below the minimum of {MIN_DUNGEON_DIMENSION}"));
    }
    if height < MIN_DUNGEON_DIMENSION {
        errors.push(format!("dungeon height {height} is below the minimum of {MIN_DUNGEON_DIMENSION}"));
    }

    match map {
        None => errors.push("dungeon map is missing".to_string()),
        Some(map) if map.width() != width || map.height() != height => errors.push(format!(
            "dungeon map is {}x{} but the dungeon is {width}x{height}",
            map.width(),
            map.height()
        )),
        Some(_) => {}
    }

    for room in rooms {
        if !room.bounds.is_valid() {
            errors.push(format!("room {} has inverted bounds {:?}", room.id, room.bounds));
        }
        if room.tiles.is_empty() {
            errors.push(format!("room {} has no tiles", room.id));
        }
    }

    for required in [RoomType::Safe, RoomType::Spawn, RoomType::Standard] {
        if !rooms.iter().any(|r| r.room_type == required) {
            errors.push(format!("no {required} room"));
        }
    }

    if rooms.len() < MIN_VALID_ROOMS {
        errors.push(format!("only {} rooms, at least {MIN_VALID_ROOMS} required", rooms.len()));
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
    }
}

// ============================================================================
// Generator
// ============================================================================

pub struct DungeonGenerator<D: LayoutDigger = Digger> {
    settings: GeneratorSettings,
    digger: D,
    rng: StdRng,
}

impl DungeonGenerator<Digger> {
    pub fn new(settings: GeneratorSettings, rng: StdRng) -> GenerationResult<Self> {
        let digger = Digger::new(DiggerOptions::from(&settings));
        Self::with_digger(settings, digger, rng)
    }
}

impl<D: LayoutDigger> DungeonGenerator<D> {
    pub fn with_digger(settings: GeneratorSettings, digger: D, rng: StdRng) -> GenerationResult<Self> {
        settings.validate()?;
        Ok(Self { settings, digger, rng })
    }

    #[must_use]
    pub const fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    #[must_use]
    pub const fn digger(&self) -> &D {
        &self.digger
    }

    // Generates, registers and validates a dungeon, regenerating once on failure.
    pub fn generate(&mut self) -> GenerationResult<Dungeon> {
        let dungeon = self.build_dungeon()?;
        let report = dungeon.validate();
        if report.is_valid {
            info!(
                "generated dungeon with {} rooms and {} corridors",
                dungeon.manager.room_count(),
                dungeon.corridors.len()
            );
            return Ok(dungeon);
        }

        warn!("dungeon failed validation, regenerating: {}", report.errors.join("; "));
        let dungeon = self.build_dungeon()?;
        let report = dungeon.validate();
        if report.is_valid {
            info!(
                "generated dungeon with {} rooms and {} corridors on regeneration",
                dungeon.manager.room_count(),
                dungeon.corridors.len()
            );
            Ok(dungeon)
        } else {
            Err(GenerationError::ValidationFailed { errors: report.errors })
        }
    }

    // Digs a layout and registers it without validating.
    pub fn build_dungeon(&mut self) -> GenerationResult<Dungeon> {
        let (dig, attempts) = self.dig_layout();
        let rooms = self.build_rooms(&dig);

        let manager_rng = StdRng::from_rng(&mut self.rng);
        let mut manager = DungeonManager::initialize(
            self.settings.width,
            self.settings.height,
            self.settings.tile_size,
            manager_rng,
        )?;
        manager.apply_map(&dig.map);
        for room in rooms {
            manager.add_room(room);
        }

        Ok(Dungeon {
            manager,
            map: dig.map,
            corridors: dig.corridors,
            attempts,
        })
    }

    // Retries until the layout has enough rooms and corridors; after the last
    // attempt the layout is accepted as-is and left to validation.
    pub fn dig_layout(&mut self) -> (DigResult, u32) {
        let max_attempts = self.settings.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let dig = self.digger.dig(self.settings.width, self.settings.height, &mut self.rng);
            let enough = dig.rooms.len() >= self.settings.min_rooms && dig.corridors.len() >= self.settings.min_corridors;
            debug!(
                "dig attempt {attempt}: {} rooms, {} corridors",
                dig.rooms.len(),
                dig.corridors.len()
            );
            if enough {
                return (dig, attempt);
            }
            if attempt >= max_attempts {
                warn!(
                    "accepting layout with {} rooms and {} corridors after {attempt} attempts",
                    dig.rooms.len(),
                    dig.corridors.len()
                );
                return (dig, attempt);
            }
            attempt += 1;
        }
    }

    // Classifies raw rooms by position, drops duplicate bounds and links neighbours.
    pub fn build_rooms(&mut self, dig: &DigResult) -> Vec<Room> {
        let count = dig.rooms.len();
        let mut seen = HashSet::new();
        let mut rooms = Vec::with_capacity(count);

        for (index, raw) in dig.rooms.iter().enumerate() {
            let bounds = raw.bounds();
            let room_type = self.classify(index, count, &bounds);
            if !seen.insert(bounds.key()) {
                debug!("dropping duplicate room at {}", bounds.key());
                continue;
            }
            let mut room = Room::new(format!("room_{index}"), index + 1, room_type, bounds);
            room.doors.extend(raw.doors.iter().copied());
            rooms.push(room);
        }

        connect_rooms(&mut rooms, &dig.map);
        rooms
    }

    fn classify(&mut self, index: usize, count: usize, bounds: &Bounds) -> RoomType {
        if index == 0 {
            RoomType::Spawn
        } else if index + 1 == count {
            RoomType::Boss
        } else if bounds.area() > LOOT_ROOM_MIN_AREA {
            RoomType::Loot
        } else if self.rng.random_bool(SAFE_ROOM_CHANCE) {
            RoomType::Safe
        } else {
            RoomType::Standard
        }
    }
}

// ============================================================================
// Connectivity
// ============================================================================

// Inclusive overlap of two ranges.
fn overlap(a_min: i32, a_max: i32, b_min: i32, b_max: i32) -> Option<(i32, i32)> {
    let low = a_min.max(b_min);
    let high = a_max.min(b_max);
    (low <= high).then_some((low, high))
}

// Cells along each room's facing edge whose outward neighbour is solid and
// belongs to neither room. None when the rooms are not adjacent.
fn shared_doors(a: &Bounds, b: &Bounds, map: &DungeonMap) -> Option<Vec<GridPos>> {
    let gap_ok = |gap: i32| (1..=MAX_ADJACENT_ROOM_GAP).contains(&gap);

    // (edge cell, outward step) pairs along both facing edges
    let candidates: Vec<(GridPos, (i32, i32))> = if gap_ok(b.left - a.right) {
        let (low, high) = overlap(a.top, a.bottom, b.top, b.bottom)?;
        (low..=high)
            .flat_map(|z| [(GridPos::new(a.right, z), (1, 0)), (GridPos::new(b.left, z), (-1, 0))])
            .collect()
    } else if gap_ok(a.left - b.right) {
        let (low, high) = overlap(a.top, a.bottom, b.top, b.bottom)?;
        (low..=high)
            .flat_map(|z| [(GridPos::new(a.left, z), (-1, 0)), (GridPos::new(b.right, z), (1, 0))])
            .collect()
    } else if gap_ok(b.top - a.bottom) {
        let (low, high) = overlap(a.left, a.right, b.left, b.right)?;
        (low..=high)
            .flat_map(|x| [(GridPos::new(x, a.bottom), (0, 1)), (GridPos::new(x, b.top), (0, -1))])
            .collect()
    } else if gap_ok(a.top - b.bottom) {
        let (low, high) = overlap(a.left, a.right, b.left, b.right)?;
        (low..=high)
            .flat_map(|x| [(GridPos::new(x, a.top), (0, -1)), (GridPos::new(x, b.bottom), (0, 1))])
            .collect()
    } else {
        return None;
    };

    Some(
        candidates
            .into_iter()
            .filter(|&(cell, (dx, dz))| {
                let outward = cell.offset(dx, dz);
                !map.is_floor(outward) && !a.contains(outward) && !b.contains(outward)
            })
            .map(|(cell, _)| cell)
            .collect(),
    )
}

fn connect_rooms(rooms: &mut [Room], map: &DungeonMap) {
    for j in 1..rooms.len() {
        let (head, tail) = rooms.split_at_mut(j);
        let b = &mut tail[0];
        for a in head.iter_mut() {
            if let Some(doors) = shared_doors(&a.bounds, &b.bounds, map) {
                // Both rooms list every door on the shared boundary
                a.doors.extend(doors.iter().copied());
                b.doors.extend(doors);
                a.connections.insert(b.id.clone());
                b.connections.insert(a.id.clone());
            }

            let distance = a.center.distance(b.center);
            if distance <= ROOM_NEIGHBOR_DISTANCE {
                a.neighbors.push(RoomNeighbor {
                    id: b.id.clone(),
                    distance,
                });
                b.neighbors.push(RoomNeighbor {
                    id: a.id.clone(),
                    distance,
                });
            }
        }
    }

    for room in rooms.iter_mut() {
        room.is_connected = !room.neighbors.is_empty();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digger::RawRoom;

    fn raw(left: i32, right: i32, top: i32, bottom: i32) -> RawRoom {
        RawRoom {
            left,
            right,
            top,
            bottom,
            doors: Vec::new(),
        }
    }

    fn dig_result(rooms: Vec<RawRoom>) -> DigResult {
        let mut map = DungeonMap::new(31, 31);
        for room in &rooms {
            for cell in room.bounds().cells() {
                map.set(cell, crate::digger::FLOOR);
            }
        }
        DigResult {
            map,
            rooms,
            corridors: Vec::new(),
        }
    }

    fn generator() -> DungeonGenerator {
        DungeonGenerator::new(GeneratorSettings::default(), StdRng::seed_from_u64(7)).unwrap()
    }

    #[test]
    fn first_and_last_rooms_are_spawn_and_boss() {
        let dig = dig_result(vec![raw(1, 3, 1, 3), raw(6, 8, 1, 3), raw(11, 13, 1, 3), raw(1, 9, 10, 14)]);
        let rooms = generator().build_rooms(&dig);
        assert_eq!(rooms[0].room_type, RoomType::Spawn);
        assert_eq!(rooms[3].room_type, RoomType::Boss);
        assert!(matches!(rooms[1].room_type, RoomType::Safe | RoomType::Standard));
    }

    #[test]
    fn large_middle_room_is_loot() {
        let dig = dig_result(vec![raw(1, 3, 1, 3), raw(1, 9, 10, 14), raw(20, 22, 20, 22)]);
        let rooms = generator().build_rooms(&dig);
        assert_eq!(rooms[1].room_type, RoomType::Loot);
    }

    #[test]
    fn duplicate_bounds_are_dropped() {
        let dig = dig_result(vec![raw(1, 3, 1, 3), raw(6, 8, 1, 3), raw(6, 8, 1, 3), raw(20, 22, 20, 22)]);
        let rooms = generator().build_rooms(&dig);
        assert_eq!(rooms.len(), 3);
        let keys: HashSet<String> = rooms.iter().map(|r| r.bounds.key()).collect();
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn rooms_sharing_a_wall_are_connected_symmetrically() {
        // One wall column (x = 4) between the rooms
        let dig = dig_result(vec![raw(1, 3, 1, 3), raw(5, 8, 2, 5), raw(20, 22, 20, 22)]);
        let rooms = generator().build_rooms(&dig);
        assert!(rooms[0].connections.contains(&rooms[1].id));
        assert!(rooms[1].connections.contains(&rooms[0].id));
        assert!(rooms[2].connections.is_empty());
        assert!(rooms[2].doors.is_empty());
        for door in [GridPos::new(3, 2), GridPos::new(3, 3), GridPos::new(5, 2), GridPos::new(5, 3)] {
            assert!(rooms[0].doors.contains(&door), "{door} missing from {}", rooms[0].id);
            assert!(rooms[1].doors.contains(&door), "{door} missing from {}", rooms[1].id);
        }
        assert_eq!(rooms[0].doors, rooms[1].doors);
        for door in &rooms[0].doors {
            assert!(rooms[0].contains(*door) || rooms[1].contains(*door));
        }
    }

    #[test]
    fn invalid_settings_are_rejected_at_construction() {
        let settings = GeneratorSettings {
            dig_percentage: 1.5,
            ..GeneratorSettings::default()
        };
        let result = DungeonGenerator::new(settings, StdRng::seed_from_u64(7));
        assert!(matches!(result, Err(GenerationError::Settings(ref e)) if e.field == "generator.dig_percentage"));
    }

    #[test]
    fn distant_rooms_are_not_neighbors() {
        let dig = dig_result(vec![raw(1, 3, 1, 3), raw(6, 8, 1, 3), raw(25, 28, 25, 28)]);
        let rooms = generator().build_rooms(&dig);
        assert!(rooms[0].neighbors.iter().any(|n| n.id == rooms[1].id));
        assert!(rooms[0].is_connected);
        assert!(rooms[2].neighbors.is_empty());
        assert!(!rooms[2].is_connected);
    }

    #[test]
    fn validation_lists_every_deficiency() {
        let rooms = vec![Room::new("a", 1, RoomType::Boss, Bounds::new(3, 1, 1, 3))];
        let report = validate_dungeon(8, 31, None, &rooms);
        assert!(!report.is_valid);
        let joined = report.errors.join("\n");
        assert!(joined.contains("width 8"));
        assert!(joined.contains("map is missing"));
        assert!(joined.contains("inverted bounds"));
        assert!(joined.contains("no tiles"));
        assert!(joined.contains("no SAFE room"));
        assert!(joined.contains("no SPAWN room"));
        assert!(joined.contains("no STANDARD room"));
        assert!(joined.contains("only 1 rooms"));
    }

    #[test]
    fn mismatched_map_dimensions_are_reported() {
        let map = DungeonMap::new(20, 31);
        let report = validate_dungeon(31, 31, Some(&map), &[]);
        assert!(report.errors.iter().any(|e| e.contains("20x31")));
    }
}
