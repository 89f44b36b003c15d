use std::{
    collections::{BTreeMap, BTreeSet},
    time::{Duration, Instant},
};

use rand::{Rng, rngs::StdRng};
use tracing::debug;

use crate::{
    config::{GeneratorSettings, SizeRange},
    constants::{CORRIDOR_FEATURE_WEIGHT, FEATURE_ATTEMPTS, ROOM_FEATURE_WEIGHT},
    pathfinding::NEIGHBOR_OFFSETS,
    rooms::{Bounds, GridPos},
};

// Cell codes reported to the dig callback.
pub const FLOOR: u8 = 0;
pub const WALL: u8 = 1;
const DOOR: u8 = 2;

const NORMAL_WALL: u8 = 1;
const PRIORITY_WALL: u8 = 2;

// ============================================================================
// Dungeon Map
// ============================================================================

// Raw cell codes (0 = floor, 1 = wall) in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DungeonMap {
    width: i32,
    height: i32,
    cells: Vec<u8>,
}

impl DungeonMap {
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        let count = (width.max(0) as usize) * (height.max(0) as usize);
        Self {
            width,
            height,
            cells: vec![WALL; count],
        }
    }

    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    const fn index(&self, pos: GridPos) -> Option<usize> {
        if pos.x >= 0 && pos.x < self.width && pos.z >= 0 && pos.z < self.height {
            Some((pos.z * self.width + pos.x) as usize)
        } else {
            None
        }
    }

    #[must_use]
    pub fn get(&self, pos: GridPos) -> Option<u8> {
        self.index(pos).map(|i| self.cells[i])
    }

    pub fn set(&mut self, pos: GridPos, value: u8) {
        if let Some(i) = self.index(pos) {
            self.cells[i] = value;
        }
    }

    #[must_use]
    pub fn is_floor(&self, pos: GridPos) -> bool {
        self.get(pos) == Some(FLOOR)
    }

    #[must_use]
    pub fn floor_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c == FLOOR).count()
    }

    // Reports every cell as (x, z, code) in row-major order.
    pub fn for_each_cell<F>(&self, mut callback: F)
    where
        F: FnMut(i32, i32, u8),
    {
        for (i, &value) in self.cells.iter().enumerate() {
            let i = i as i32;
            callback(i % self.width, i / self.width, value);
        }
    }
}

// ============================================================================
// Layout Descriptors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRoom {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
    pub doors: Vec<GridPos>,
}

impl RawRoom {
    #[must_use]
    pub const fn bounds(&self) -> Bounds {
        Bounds::new(self.left, self.right, self.top, self.bottom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawCorridor {
    pub start: GridPos,
    pub end: GridPos,
}

#[derive(Debug, Clone)]
pub struct DigResult {
    pub map: DungeonMap,
    pub rooms: Vec<RawRoom>,
    pub corridors: Vec<RawCorridor>,
}

// Anything that can carve a room/corridor layout.
pub trait LayoutDigger {
    fn dig(&mut self, width: i32, height: i32, rng: &mut StdRng) -> DigResult;
}

// ============================================================================
// Digger
// ============================================================================

#[derive(Debug, Clone)]
pub struct DiggerOptions {
    pub room_width: SizeRange,
    pub room_height: SizeRange,
    pub corridor_length: SizeRange,
    pub dig_percentage: f64,
    pub time_limit: Duration,
}

impl From<&GeneratorSettings> for DiggerOptions {
    fn from(settings: &GeneratorSettings) -> Self {
        Self {
            room_width: settings.room_width,
            room_height: settings.room_height,
            corridor_length: settings.corridor_length,
            dig_percentage: settings.dig_percentage,
            time_limit: Duration::from_millis(settings.time_limit_ms),
        }
    }
}

// Grows rooms and corridors outward from a central room by repeatedly
// picking a wall and trying to attach a feature to it.
#[derive(Debug, Clone)]
pub struct Digger {
    options: DiggerOptions,
}

impl Digger {
    #[must_use]
    pub const fn new(options: DiggerOptions) -> Self {
        Self { options }
    }
}

impl LayoutDigger for Digger {
    fn dig(&mut self, width: i32, height: i32, rng: &mut StdRng) -> DigResult {
        let mut state = DigState::new(width, height, &self.options, rng);
        state.run();
        state.finish()
    }
}

// ============================================================================
// Features
// ============================================================================

#[derive(Debug, Clone)]
struct RoomFeature {
    x1: i32,
    z1: i32,
    x2: i32,
    z2: i32,
    entrance: Option<GridPos>,
    doors: BTreeSet<GridPos>,
}

impl RoomFeature {
    fn new(x1: i32, z1: i32, x2: i32, z2: i32, entrance: Option<GridPos>) -> Self {
        Self {
            x1,
            z1,
            x2,
            z2,
            entrance,
            doors: BTreeSet::new(),
        }
    }

    fn random_size(options: &DiggerOptions, rng: &mut StdRng) -> (i32, i32) {
        let width = rng.random_range(options.room_width.min..=options.room_width.max);
        let height = rng.random_range(options.room_height.min..=options.room_height.max);
        (width, height)
    }

    // Room attached to the wall cell `at`, extending away from it along (dx, dz).
    fn random_at(at: GridPos, dx: i32, dz: i32, options: &DiggerOptions, rng: &mut StdRng) -> Self {
        let (width, height) = Self::random_size(options, rng);
        let (x, z) = (at.x, at.z);
        let entrance = Some(at);

        match (dx, dz) {
            (1, _) => {
                let z2 = z - rng.random_range(0..height);
                Self::new(x + 1, z2, x + width, z2 + height - 1, entrance)
            }
            (-1, _) => {
                let z2 = z - rng.random_range(0..height);
                Self::new(x - width, z2, x - 1, z2 + height - 1, entrance)
            }
            (_, 1) => {
                let x2 = x - rng.random_range(0..width);
                Self::new(x2, z + 1, x2 + width - 1, z + height, entrance)
            }
            _ => {
                let x2 = x - rng.random_range(0..width);
                Self::new(x2, z - height, x2 + width - 1, z - 1, entrance)
            }
        }
    }

    // Kept inside the one-cell border of a `map_width x map_height` map.
    fn random_center(
        center: GridPos,
        map_width: i32,
        map_height: i32,
        options: &DiggerOptions,
        rng: &mut StdRng,
    ) -> Self {
        let (width, height) = Self::random_size(options, rng);
        let width = width.min(map_width - 2);
        let height = height.min(map_height - 2);
        let x1 = (center.x - rng.random_range(0..width)).clamp(1, map_width - 1 - width);
        let z1 = (center.z - rng.random_range(0..height)).clamp(1, map_height - 1 - height);
        Self::new(x1, z1, x1 + width - 1, z1 + height - 1, None)
    }

    fn ring(&self) -> impl Iterator<Item = (GridPos, bool)> + '_ {
        (self.x1 - 1..=self.x2 + 1).flat_map(move |x| {
            (self.z1 - 1..=self.z2 + 1).map(move |z| {
                let on_ring = x == self.x1 - 1 || x == self.x2 + 1 || z == self.z1 - 1 || z == self.z2 + 1;
                (GridPos::new(x, z), on_ring)
            })
        })
    }

    // The surrounding ring must still be wall and the interior must be diggable.
    fn is_valid(&self, state: &DigState<'_>) -> bool {
        self.ring().all(|(pos, on_ring)| {
            if on_ring {
                state.is_wall(pos)
            } else {
                state.can_be_dug(pos)
            }
        })
    }

    fn create(&self, state: &mut DigState<'_>) {
        for (pos, on_ring) in self.ring() {
            let value = if !on_ring {
                FLOOR
            } else if Some(pos) == self.entrance {
                DOOR
            } else {
                WALL
            };
            state.dig_cell(pos, value);
        }
    }

    fn collect_doors(&mut self, map: &DungeonMap) {
        self.doors = self
            .ring()
            .filter(|&(pos, on_ring)| on_ring && map.get(pos).is_some_and(|v| v != WALL))
            .map(|(pos, _)| pos)
            .collect();
    }

    fn into_raw(self) -> RawRoom {
        RawRoom {
            left: self.x1,
            right: self.x2,
            top: self.z1,
            bottom: self.z2,
            doors: self.doors.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone)]
struct CorridorFeature {
    start: GridPos,
    end: GridPos,
    ends_with_wall: bool,
}

impl CorridorFeature {
    fn random_at(at: GridPos, dx: i32, dz: i32, options: &DiggerOptions, rng: &mut StdRng) -> Self {
        let length = rng.random_range(options.corridor_length.min..=options.corridor_length.max);
        Self {
            start: at,
            end: at.offset(dx * length, dz * length),
            ends_with_wall: false,
        }
    }

    fn direction(&self) -> (i32, i32) {
        ((self.end.x - self.start.x).signum(), (self.end.z - self.start.z).signum())
    }

    // Truncates the corridor at the first cell that cannot be dug cleanly.
    fn validate(&mut self, state: &DigState<'_>) -> bool {
        let (dx, dz) = self.direction();
        let (nx, nz) = (dz, -dx);
        let mut length = 1 + (self.end.x - self.start.x).abs().max((self.end.z - self.start.z).abs());

        for i in 0..length {
            let cell = self.start.offset(i * dx, i * dz);
            let clean = state.can_be_dug(cell)
                && state.is_wall(cell.offset(nx, nz))
                && state.is_wall(cell.offset(-nx, -nz));
            if !clean {
                length = i;
                self.end = cell.offset(-dx, -dz);
                break;
            }
        }

        if length == 0 {
            return false;
        }
        let beyond = self.end.offset(dx, dz);
        if length == 1 && state.is_wall(beyond) {
            return false;
        }

        let first_corner_bad = !state.is_wall(beyond.offset(nx, nz));
        let second_corner_bad = !state.is_wall(beyond.offset(-nx, -nz));
        self.ends_with_wall = state.is_wall(beyond);
        !((first_corner_bad || second_corner_bad) && self.ends_with_wall)
    }

    fn create(&self, state: &mut DigState<'_>) {
        let (dx, dz) = self.direction();
        let length = 1 + (self.end.x - self.start.x).abs().max((self.end.z - self.start.z).abs());
        for i in 0..length {
            state.dig_cell(self.start.offset(i * dx, i * dz), FLOOR);
        }
    }

    // Walls past a dead end get picked first so the corridor leads somewhere.
    fn mark_priority_walls(&self, state: &mut DigState<'_>) {
        if !self.ends_with_wall {
            return;
        }
        let (dx, dz) = self.direction();
        let (nx, nz) = (dz, -dx);
        let beyond = self.end.offset(dx, dz);
        for pos in [beyond, beyond.offset(nx, nz), beyond.offset(-nx, -nz)] {
            state.walls.insert(pos, PRIORITY_WALL);
        }
    }
}

// ============================================================================
// Dig State
// ============================================================================

struct DigState<'a> {
    width: i32,
    height: i32,
    map: DungeonMap,
    walls: BTreeMap<GridPos, u8>,
    rooms: Vec<RoomFeature>,
    corridors: Vec<CorridorFeature>,
    dug: usize,
    options: &'a DiggerOptions,
    rng: &'a mut StdRng,
}

impl<'a> DigState<'a> {
    fn new(width: i32, height: i32, options: &'a DiggerOptions, rng: &'a mut StdRng) -> Self {
        Self {
            width,
            height,
            map: DungeonMap::new(width, height),
            walls: BTreeMap::new(),
            rooms: Vec::new(),
            corridors: Vec::new(),
            dug: 0,
            options,
            rng,
        }
    }

    fn is_wall(&self, pos: GridPos) -> bool {
        self.map.get(pos) == Some(WALL)
    }

    // Inside the one-cell border and not yet carved.
    fn can_be_dug(&self, pos: GridPos) -> bool {
        pos.x > 0 && pos.z > 0 && pos.x < self.width - 1 && pos.z < self.height - 1 && self.is_wall(pos)
    }

    fn dig_cell(&mut self, pos: GridPos, value: u8) {
        if value == FLOOR || value == DOOR {
            self.map.set(pos, FLOOR);
            self.dug += 1;
        } else {
            self.walls.insert(pos, NORMAL_WALL);
        }
    }

    fn dug_ratio(&self) -> f64 {
        let area = ((self.width - 2).max(1) * (self.height - 2).max(1)) as f64;
        self.dug as f64 / area
    }

    fn run(&mut self) {
        if self.width < 3 || self.height < 3 {
            return;
        }

        let center = GridPos::new(self.width / 2, self.height / 2);
        let first = RoomFeature::random_center(center, self.width, self.height, self.options, self.rng);
        first.create(self);
        self.rooms.push(first);

        // The time limit is checked once per iteration, so one feature may overrun it
        let started = Instant::now();
        loop {
            if started.elapsed() > self.options.time_limit {
                debug!("digger hit its time limit after {} rooms", self.rooms.len());
                break;
            }
            let Some(wall) = self.take_wall() else {
                break;
            };

            let mut priority_walls = 0;
            if let Some((dx, dz)) = self.digging_direction(wall) {
                for _ in 0..FEATURE_ATTEMPTS {
                    if self.try_feature(wall, dx, dz) {
                        self.remove_surrounding_walls(wall);
                        self.remove_surrounding_walls(wall.offset(-dx, -dz));
                        break;
                    }
                }
                priority_walls = self.walls.values().filter(|&&p| p == PRIORITY_WALL).count();
            }

            if self.dug_ratio() >= self.options.dig_percentage && priority_walls == 0 {
                break;
            }
        }

        let map = &self.map;
        for room in &mut self.rooms {
            room.collect_doors(map);
        }
    }

    // Random wall, preferring priority walls; removed from the pool.
    fn take_wall(&mut self) -> Option<GridPos> {
        let priority: Vec<GridPos> = self
            .walls
            .iter()
            .filter(|&(_, &p)| p == PRIORITY_WALL)
            .map(|(&pos, _)| pos)
            .collect();
        let pool: Vec<GridPos> = if priority.is_empty() {
            self.walls.keys().copied().collect()
        } else {
            priority
        };
        if pool.is_empty() {
            return None;
        }
        let wall = pool[self.rng.random_range(0..pool.len())];
        self.walls.remove(&wall);
        Some(wall)
    }

    // A wall can be extended only if exactly one 4-neighbour is open;
    // the feature then grows away from that neighbour.
    fn digging_direction(&self, pos: GridPos) -> Option<(i32, i32)> {
        if pos.x <= 0 || pos.z <= 0 || pos.x >= self.width - 1 || pos.z >= self.height - 1 {
            return None;
        }
        let mut open = None;
        for &(dx, dz) in &NEIGHBOR_OFFSETS {
            if self.map.is_floor(pos.offset(dx, dz)) {
                if open.is_some() {
                    return None;
                }
                open = Some((dx, dz));
            }
        }
        open.map(|(dx, dz)| (-dx, -dz))
    }

    fn try_feature(&mut self, at: GridPos, dx: i32, dz: i32) -> bool {
        let total = ROOM_FEATURE_WEIGHT + CORRIDOR_FEATURE_WEIGHT;
        if self.rng.random_range(0..total) < ROOM_FEATURE_WEIGHT {
            let room = RoomFeature::random_at(at, dx, dz, self.options, self.rng);
            if !room.is_valid(self) {
                return false;
            }
            room.create(self);
            self.rooms.push(room);
        } else {
            let mut corridor = CorridorFeature::random_at(at, dx, dz, self.options, self.rng);
            if !corridor.validate(self) {
                return false;
            }
            corridor.create(self);
            corridor.mark_priority_walls(self);
            self.corridors.push(corridor);
        }
        true
    }

    fn remove_surrounding_walls(&mut self, pos: GridPos) {
        for &(dx, dz) in &NEIGHBOR_OFFSETS {
            self.walls.remove(&pos.offset(dx, dz));
            self.walls.remove(&pos.offset(2 * dx, 2 * dz));
        }
    }

    fn finish(self) -> DigResult {
        DigResult {
            map: self.map,
            rooms: self.rooms.into_iter().map(RoomFeature::into_raw).collect(),
            corridors: self
                .corridors
                .into_iter()
                .map(|c| RawCorridor {
                    start: c.start,
                    end: c.end,
                })
                .collect(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    fn dig(seed: u64) -> DigResult {
        let options = DiggerOptions::from(&GeneratorSettings::default());
        let mut rng = StdRng::seed_from_u64(seed);
        Digger::new(options).dig(31, 31, &mut rng)
    }

    #[test]
    fn border_is_never_carved() {
        for seed in 0..10 {
            let result = dig(seed);
            let map = &result.map;
            for x in 0..31 {
                assert!(!map.is_floor(GridPos::new(x, 0)));
                assert!(!map.is_floor(GridPos::new(x, 30)));
            }
            for z in 0..31 {
                assert!(!map.is_floor(GridPos::new(0, z)));
                assert!(!map.is_floor(GridPos::new(30, z)));
            }
        }
    }

    #[test]
    fn room_interiors_are_floor_and_inside_the_map() {
        for seed in 0..10 {
            let result = dig(seed);
            assert!(!result.rooms.is_empty());
            for room in &result.rooms {
                let bounds = room.bounds();
                assert!(bounds.is_valid());
                assert!(bounds.left >= 1 && bounds.top >= 1);
                assert!(bounds.right <= 29 && bounds.bottom <= 29);
                assert!(bounds.cells().all(|c| result.map.is_floor(c)));
            }
        }
    }

    #[test]
    fn doors_sit_on_the_wall_ring_and_are_open() {
        let result = dig(3);
        for room in &result.rooms {
            let b = room.bounds();
            for door in &room.doors {
                let on_ring = door.x == b.left - 1 || door.x == b.right + 1 || door.z == b.top - 1 || door.z == b.bottom + 1;
                assert!(on_ring, "door {door} off the ring of {b:?}");
                assert!(result.map.is_floor(*door));
            }
        }
    }

    #[test]
    fn corridors_are_straight_and_carved() {
        let result = dig(5);
        for corridor in &result.corridors {
            assert!(corridor.start.x == corridor.end.x || corridor.start.z == corridor.end.z);
            assert!(result.map.is_floor(corridor.start));
            assert!(result.map.is_floor(corridor.end));
        }
    }

    #[test]
    fn same_seed_digs_same_map() {
        assert_eq!(dig(42).map, dig(42).map);
    }

    #[test]
    fn callback_reports_every_cell() {
        let result = dig(1);
        let mut seen = 0;
        let mut floors = 0;
        result.map.for_each_cell(|_, _, value| {
            seen += 1;
            if value == FLOOR {
                floors += 1;
            }
        });
        assert_eq!(seen, 31 * 31);
        assert_eq!(floors, result.map.floor_count());
    }
}
