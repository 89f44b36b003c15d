use std::{
    collections::{BTreeSet, HashMap},
    fmt,
};

// ============================================================================
// Grid Position
// ============================================================================

// Integer cell coordinate. `z` is the second grid axis (rows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPos {
    pub x: i32,
    pub z: i32,
}

impl GridPos {
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    #[must_use]
    pub const fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            z: self.z + dz,
        }
    }

    #[must_use]
    pub const fn manhattan(self, other: Self) -> i32 {
        (self.x - other.x).abs() + (self.z - other.z).abs()
    }

    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dz = (self.z - other.z) as f32;
        dx.hypot(dz)
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

// ============================================================================
// Room Type
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomType {
    Standard,
    Safe,
    Boss,
    Loot,
    Spawn,
}

impl RoomType {
    pub const ALL: [Self; 5] = [Self::Standard, Self::Safe, Self::Boss, Self::Loot, Self::Spawn];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "STANDARD",
            Self::Safe => "SAFE",
            Self::Boss => "BOSS",
            Self::Loot => "LOOT",
            Self::Spawn => "SPAWN",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Standard => "Chamber",
            Self::Safe => "Sanctuary",
            Self::Boss => "Lair",
            Self::Loot => "Vault",
            Self::Spawn => "Entrance",
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Spawn Kind
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpawnKind {
    Respawn,
    Health,
    Boss,
    Loot,
}

impl SpawnKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Respawn => "respawn",
            Self::Health => "health",
            Self::Boss => "boss",
            Self::Loot => "loot",
        }
    }
}

// ============================================================================
// Bounds
// ============================================================================

// Inclusive rectangle of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bounds {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

impl Bounds {
    #[must_use]
    pub const fn new(left: i32, right: i32, top: i32, bottom: i32) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.left <= self.right && self.top <= self.bottom
    }

    #[must_use]
    pub const fn width(&self) -> i32 {
        self.right - self.left + 1
    }

    #[must_use]
    pub const fn height(&self) -> i32 {
        self.bottom - self.top + 1
    }

    #[must_use]
    pub const fn area(&self) -> i32 {
        if self.is_valid() { self.width() * self.height() } else { 0 }
    }

    #[must_use]
    pub const fn contains(&self, pos: GridPos) -> bool {
        pos.x >= self.left && pos.x <= self.right && pos.z >= self.top && pos.z <= self.bottom
    }

    // Midpoint rounded half up on each axis.
    #[must_use]
    pub fn center(&self) -> GridPos {
        let x = (f64::from(self.left + self.right) / 2.0).round() as i32;
        let z = (f64::from(self.top + self.bottom) / 2.0).round() as i32;
        GridPos::new(x, z)
    }

    // Identity used to drop duplicate rooms emitted by the digger.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{},{},{},{}", self.left, self.right, self.top, self.bottom)
    }

    pub fn cells(&self) -> impl Iterator<Item = GridPos> + '_ {
        (self.top..=self.bottom).flat_map(move |z| (self.left..=self.right).map(move |x| GridPos::new(x, z)))
    }
}

// ============================================================================
// Room
// ============================================================================

pub type RoomId = String;

#[derive(Debug, Clone, PartialEq)]
pub struct RoomNeighbor {
    pub id: RoomId,
    pub distance: f32,
}

#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub room_type: RoomType,
    pub room_number: usize,
    pub bounds: Bounds,
    pub center: GridPos,
    pub connections: BTreeSet<RoomId>,
    pub doors: BTreeSet<GridPos>,
    pub spawn_points: HashMap<SpawnKind, GridPos>,
    pub patrol_points: Vec<GridPos>,
    pub tiles: Vec<GridPos>,
    pub neighbors: Vec<RoomNeighbor>,
    pub is_connected: bool,
}

impl Room {
    #[must_use]
    pub fn new(id: impl Into<RoomId>, room_number: usize, room_type: RoomType, bounds: Bounds) -> Self {
        Self {
            id: id.into(),
            name: format!("{} {room_number}", room_type.display_name()),
            room_type,
            room_number,
            bounds,
            center: bounds.center(),
            connections: BTreeSet::new(),
            doors: BTreeSet::new(),
            spawn_points: HashMap::new(),
            patrol_points: Vec::new(),
            tiles: bounds.cells().collect(),
            neighbors: Vec::new(),
            is_connected: false,
        }
    }

    #[must_use]
    pub const fn area(&self) -> i32 {
        self.bounds.area()
    }

    #[must_use]
    pub const fn contains(&self, pos: GridPos) -> bool {
        self.bounds.contains(pos)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_rounds_half_up() {
        assert_eq!(Bounds::new(2, 5, 4, 6).center(), GridPos::new(4, 5));
        assert_eq!(Bounds::new(3, 3, 1, 2).center(), GridPos::new(3, 2));
    }

    #[test]
    fn new_room_covers_every_cell_of_its_bounds() {
        let room = Room::new("room_0", 1, RoomType::Standard, Bounds::new(1, 4, 2, 3));
        assert_eq!(room.tiles.len(), 8);
        assert_eq!(room.area(), 8);
        assert!(room.tiles.iter().all(|&t| room.contains(t)));
        assert_eq!(room.name, "Chamber 1");
    }

    #[test]
    fn inverted_bounds_have_no_area() {
        let bounds = Bounds::new(5, 2, 0, 3);
        assert!(!bounds.is_valid());
        assert_eq!(bounds.area(), 0);
    }
}
