use std::collections::BTreeSet;

use crate::{
    error::GridError,
    rooms::{GridPos, RoomId},
};

pub type ObjectId = u32;

// ============================================================================
// Cell
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellType {
    #[default]
    Wall,
    Floor,
}

#[derive(Debug, Clone, Default)]
pub struct Cell {
    pub walkable: bool,
    pub room_id: Option<RoomId>,
    pub cell_type: CellType,
    pub objects: BTreeSet<ObjectId>,
}

impl Cell {
    pub fn make_floor(&mut self) {
        self.walkable = true;
        self.cell_type = CellType::Floor;
    }
}

// ============================================================================
// Grid
// ============================================================================

// Row-major `width x height` cells, all walls until carved.
#[derive(Debug, Clone)]
pub struct Grid {
    width: i32,
    height: i32,
    tile_size: f32,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(width: i32, height: i32, tile_size: f32) -> Result<Self, GridError> {
        if width <= 0 || height <= 0 {
            return Err(GridError::InvalidDimensions { width, height });
        }
        if !(tile_size.is_finite() && tile_size > 0.0) {
            return Err(GridError::InvalidTileSize(tile_size));
        }
        let count = (width as usize) * (height as usize);
        Ok(Self {
            width,
            height,
            tile_size,
            cells: vec![Cell::default(); count],
        })
    }

    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    #[must_use]
    pub const fn tile_size(&self) -> f32 {
        self.tile_size
    }

    #[must_use]
    pub const fn cell_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    #[must_use]
    pub const fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.z >= 0 && pos.z < self.height
    }

    #[must_use]
    pub const fn index(&self, pos: GridPos) -> Option<usize> {
        if self.in_bounds(pos) {
            Some((pos.z * self.width + pos.x) as usize)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn pos_of(&self, index: usize) -> GridPos {
        let index = index as i32;
        GridPos::new(index % self.width, index / self.width)
    }

    #[must_use]
    pub fn cell(&self, pos: GridPos) -> Option<&Cell> {
        self.index(pos).map(|i| &self.cells[i])
    }

    pub fn cell_mut(&mut self, pos: GridPos) -> Option<&mut Cell> {
        self.index(pos).map(|i| &mut self.cells[i])
    }

    // Out-of-bounds cells are never walkable.
    #[must_use]
    pub fn is_walkable(&self, pos: GridPos) -> bool {
        self.cell(pos).is_some_and(|c| c.walkable)
    }

    #[must_use]
    pub fn walkable_count(&self) -> usize {
        self.cells.iter().filter(|c| c.walkable).count()
    }

    // ========================================================================
    // Object Occupancy
    // ========================================================================

    pub fn place_object(&mut self, pos: GridPos, object: ObjectId) -> bool {
        self.cell_mut(pos).is_some_and(|c| c.objects.insert(object))
    }

    pub fn remove_object(&mut self, pos: GridPos, object: ObjectId) -> bool {
        self.cell_mut(pos).is_some_and(|c| c.objects.remove(&object))
    }

    #[must_use]
    pub fn is_occupied(&self, pos: GridPos) -> bool {
        self.cell(pos).is_some_and(|c| !c.objects.is_empty())
    }
}

// ============================================================================
// Tests
// ============================================================================
