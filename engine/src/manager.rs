use std::collections::HashMap;

use rand::{Rng, rngs::StdRng};
use tracing::{debug, warn};

use crate::{
    collab::{OccupancyMap, PathProvider},
    constants::{BOSS_PATROL_POINTS, HEALTH_SPAWN_OFFSET_X, STANDARD_PATROL_POINTS},
    digger::{DungeonMap, FLOOR},
    error::GridError,
    grid::{Cell, Grid, ObjectId},
    pathfinding,
    rooms::{GridPos, Room, RoomId, RoomType, SpawnKind},
};

// ============================================================================
// Dungeon Manager
// ============================================================================

// Owns the walkability grid and the room registry. Written during
// generation, read by AI and hosts afterwards.
#[derive(Debug, Clone)]
pub struct DungeonManager {
    grid: Grid,
    rooms: Vec<Room>,
    room_index: HashMap<RoomId, usize>,
    rng: StdRng,
}

impl DungeonManager {
    pub fn initialize(width: i32, height: i32, tile_size: f32, rng: StdRng) -> Result<Self, GridError> {
        let grid = Grid::new(width, height, tile_size)?;
        debug!("initialized {width}x{height} dungeon grid (tile size {tile_size})");
        Ok(Self {
            grid,
            rooms: Vec::new(),
            room_index: HashMap::new(),
            rng,
        })
    }

    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub const fn width(&self) -> i32 {
        self.grid.width()
    }

    #[must_use]
    pub const fn height(&self) -> i32 {
        self.grid.height()
    }

    #[must_use]
    pub const fn tile_size(&self) -> f32 {
        self.grid.tile_size()
    }

    // Carves every floor cell of a dug map, corridors included.
    pub fn apply_map(&mut self, map: &DungeonMap) {
        let grid = &mut self.grid;
        map.for_each_cell(|x, z, value| {
            if value == FLOOR
                && let Some(cell) = grid.cell_mut(GridPos::new(x, z))
            {
                cell.make_floor();
            }
        });
    }

    // ========================================================================
    // Room Registry
    // ========================================================================

    pub fn add_room(&mut self, mut room: Room) {
        for &tile in &room.tiles {
            if let Some(cell) = self.grid.cell_mut(tile) {
                cell.make_floor();
                cell.room_id = Some(room.id.clone());
            } else {
                warn!("room {} has tile {tile} outside the grid", room.id);
            }
        }

        Self::generate_room_features(&mut room, &mut self.rng);
        debug!(
            "registered {} room {} ({}) with {} tiles",
            room.room_type,
            room.id,
            room.name,
            room.tiles.len()
        );

        if let Some(&existing) = self.room_index.get(&room.id) {
            warn!("room {} registered twice, replacing", room.id);
            self.rooms[existing] = room;
        } else {
            self.room_index.insert(room.id.clone(), self.rooms.len());
            self.rooms.push(room);
        }
    }

    // Spawn and patrol points by room type; patrol points are sampled inside the bounds.
    pub fn generate_room_features(room: &mut Room, rng: &mut StdRng) {
        let center = room.center;
        match room.room_type {
            RoomType::Safe => {
                room.spawn_points.insert(SpawnKind::Respawn, center);
                room.spawn_points
                    .insert(SpawnKind::Health, center.offset(HEALTH_SPAWN_OFFSET_X, 0));
            }
            RoomType::Boss => {
                room.spawn_points.insert(SpawnKind::Boss, center);
                room.patrol_points = sample_patrol_points(room, BOSS_PATROL_POINTS, rng);
            }
            RoomType::Loot => {
                room.spawn_points.insert(SpawnKind::Loot, center);
            }
            RoomType::Standard | RoomType::Spawn => {
                room.patrol_points = sample_patrol_points(room, STANDARD_PATROL_POINTS, rng);
            }
        }
    }

    #[must_use]
    pub fn room(&self, id: &str) -> Option<&Room> {
        self.room_index.get(id).map(|&i| &self.rooms[i])
    }

    #[must_use]
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    #[must_use]
    pub const fn room_count(&self) -> usize {
        self.rooms.len()
    }

    #[must_use]
    pub fn rooms_of_type(&self, room_type: RoomType) -> Vec<&Room> {
        self.rooms.iter().filter(|r| r.room_type == room_type).collect()
    }

    #[must_use]
    pub fn get_room_at_position(&self, x: i32, z: i32) -> Option<&Room> {
        let id = self.grid.cell(GridPos::new(x, z))?.room_id.as_deref()?;
        self.room(id)
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    #[must_use]
    pub fn cell(&self, x: i32, z: i32) -> Option<&Cell> {
        self.grid.cell(GridPos::new(x, z))
    }

    #[must_use]
    pub fn is_walkable(&self, x: i32, z: i32) -> bool {
        self.grid.is_walkable(GridPos::new(x, z))
    }

    #[must_use]
    pub fn get_neighbors(&self, x: i32, z: i32) -> Vec<(GridPos, u32)> {
        pathfinding::walkable_neighbors(&self.grid, GridPos::new(x, z))
    }

    #[must_use]
    pub fn find_path(&self, start: GridPos, goal: GridPos) -> Option<Vec<GridPos>> {
        pathfinding::find_path(&self.grid, start, goal)
    }

    // Every registered spawn point of a kind, in registration order.
    #[must_use]
    pub fn spawn_points(&self, kind: SpawnKind) -> Vec<GridPos> {
        self.rooms
            .iter()
            .filter_map(|r| r.spawn_points.get(&kind).copied())
            .collect()
    }

    pub fn get_random_spawn_point(&mut self, kind: SpawnKind) -> Option<GridPos> {
        let points = self.spawn_points(kind);
        if points.is_empty() {
            debug!("no {} spawn points registered", kind.as_str());
            return None;
        }
        Some(points[self.rng.random_range(0..points.len())])
    }

    // ========================================================================
    // Objects
    // ========================================================================

    pub fn place_object(&mut self, x: i32, z: i32, object: ObjectId) -> bool {
        self.grid.place_object(GridPos::new(x, z), object)
    }

    pub fn remove_object(&mut self, x: i32, z: i32, object: ObjectId) -> bool {
        self.grid.remove_object(GridPos::new(x, z), object)
    }

    #[must_use]
    pub fn is_tile_occupied(&self, x: i32, z: i32) -> bool {
        self.grid.is_occupied(GridPos::new(x, z))
    }
}

fn sample_patrol_points(room: &Room, count: usize, rng: &mut StdRng) -> Vec<GridPos> {
    let bounds = room.bounds;
    if !bounds.is_valid() {
        return Vec::new();
    }
    (0..count)
        .map(|_| {
            GridPos::new(
                rng.random_range(bounds.left..=bounds.right),
                rng.random_range(bounds.top..=bounds.bottom),
            )
        })
        .collect()
}

// ============================================================================
// Collaborator Impls
// ============================================================================

impl PathProvider for DungeonManager {
    fn find_path(&self, start: GridPos, goal: GridPos) -> Option<Vec<GridPos>> {
        pathfinding::find_path(&self.grid, start, goal)
    }

    fn find_path_where(
        &self,
        start: GridPos,
        goal: GridPos,
        passable: &dyn Fn(GridPos) -> bool,
    ) -> Option<Vec<GridPos>> {
        pathfinding::find_path_filtered(&self.grid, start, goal, passable)
    }

    fn room_at(&self, pos: GridPos) -> Option<&Room> {
        self.get_room_at_position(pos.x, pos.z)
    }

    fn rooms(&self) -> &[Room] {
        &self.rooms
    }
}

impl OccupancyMap for DungeonManager {
    fn is_tile_occupied(&self, x: i32, z: i32) -> bool {
        self.grid.is_occupied(GridPos::new(x, z))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::rooms::Bounds;

    fn manager(width: i32, height: i32) -> DungeonManager {
        DungeonManager::initialize(width, height, 4.0, StdRng::seed_from_u64(11)).unwrap()
    }

    #[test]
    fn initialize_rejects_non_positive_dimensions() {
        let rng = StdRng::seed_from_u64(0);
        assert!(DungeonManager::initialize(0, 10, 1.0, rng.clone()).is_err());
        assert!(DungeonManager::initialize(10, -3, 1.0, rng).is_err());
    }

    #[test]
    fn add_room_carves_and_tags_cells() {
        let mut m = manager(10, 10);
        m.add_room(Room::new("a", 1, RoomType::Standard, Bounds::new(2, 4, 3, 5)));
        assert!(m.is_walkable(3, 4));
        assert!(!m.is_walkable(5, 4));
        assert_eq!(m.get_room_at_position(2, 5).map(|r| r.id.as_str()), Some("a"));
        assert!(m.get_room_at_position(1, 1).is_none());
        assert!(m.get_room_at_position(-1, 40).is_none());
    }

    #[test]
    fn safe_room_gets_respawn_and_health_points() {
        let mut m = manager(12, 12);
        m.add_room(Room::new("safe", 1, RoomType::Safe, Bounds::new(2, 6, 2, 4)));
        let room = m.room("safe").unwrap();
        assert_eq!(room.spawn_points[&SpawnKind::Respawn], GridPos::new(4, 3));
        assert_eq!(room.spawn_points[&SpawnKind::Health], GridPos::new(6, 3));
        assert!(room.patrol_points.is_empty());
    }

    #[test]
    fn patrol_points_fall_inside_bounds() {
        let mut m = manager(20, 20);
        m.add_room(Room::new("boss", 1, RoomType::Boss, Bounds::new(3, 9, 4, 8)));
        m.add_room(Room::new("std", 2, RoomType::Standard, Bounds::new(12, 15, 12, 14)));
        let boss = m.room("boss").unwrap();
        assert_eq!(boss.patrol_points.len(), BOSS_PATROL_POINTS);
        assert!(boss.patrol_points.iter().all(|&p| boss.contains(p)));
        assert_eq!(boss.spawn_points[&SpawnKind::Boss], boss.center);
        let standard = m.room("std").unwrap();
        assert_eq!(standard.patrol_points.len(), STANDARD_PATROL_POINTS);
        assert!(standard.patrol_points.iter().all(|&p| standard.contains(p)));
    }

    #[test]
    fn random_spawn_point_picks_among_registered() {
        let mut m = manager(20, 20);
        assert_eq!(m.get_random_spawn_point(SpawnKind::Respawn), None);
        m.add_room(Room::new("s1", 1, RoomType::Safe, Bounds::new(1, 4, 1, 3)));
        m.add_room(Room::new("s2", 2, RoomType::Safe, Bounds::new(10, 14, 10, 13)));
        let candidates = m.spawn_points(SpawnKind::Respawn);
        assert_eq!(candidates.len(), 2);
        for _ in 0..20 {
            let pick = m.get_random_spawn_point(SpawnKind::Respawn).unwrap();
            assert!(candidates.contains(&pick));
        }
        assert_eq!(m.get_random_spawn_point(SpawnKind::Loot), None);
    }

    #[test]
    fn neighbors_are_walkable_with_unit_cost() {
        let mut m = manager(10, 10);
        m.add_room(Room::new("a", 1, RoomType::Loot, Bounds::new(1, 3, 1, 3)));
        let neighbors = m.get_neighbors(1, 1);
        assert_eq!(neighbors.len(), 2);
        assert!(neighbors.iter().all(|&(p, cost)| cost == 1 && m.is_walkable(p.x, p.z)));
        assert_eq!(m.get_neighbors(2, 2).len(), 4);
    }

    #[test]
    fn apply_map_makes_corridors_walkable() {
        let mut m = manager(6, 3);
        let mut map = DungeonMap::new(6, 3);
        for x in 1..5 {
            map.set(GridPos::new(x, 1), FLOOR);
        }
        m.apply_map(&map);
        assert!((1..5).all(|x| m.is_walkable(x, 1)));
        assert!(!m.is_walkable(0, 1));
        assert!(m.get_room_at_position(2, 1).is_none());
    }

    #[test]
    fn occupancy_tracks_placed_objects() {
        let mut m = manager(5, 5);
        assert!(m.place_object(2, 2, 9));
        assert!(m.is_tile_occupied(2, 2));
        assert!(m.remove_object(2, 2, 9));
        assert!(!m.is_tile_occupied(2, 2));
    }
}
