use bevy_math::Vec3;

use crate::{
    constants::{PHYSICS_EPSILON, TILE_SIZE},
    rooms::{GridPos, Room},
};

pub type EffectId = u64;

// ============================================================================
// Physics
// ============================================================================

pub trait PhysicsBody {
    fn position(&self) -> Vec3;
    fn set_position(&mut self, position: Vec3);
    fn velocity(&self) -> Vec3;
    fn set_velocity(&mut self, velocity: Vec3);
    fn sleep(&mut self);
    fn wake_up(&mut self);
    fn is_sleeping(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyShape {
    Cylinder { radius: f32, height: f32 },
    Sphere { radius: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub shape: BodyShape,
    pub position: Vec3,
    pub mass: f32,
    pub collision_group: u32,
    pub collision_mask: u32,
}

pub trait PhysicsWorld {
    type Body: PhysicsBody;

    fn create_body(&mut self, desc: &BodyDesc) -> Self::Body;
}

// Velocity-integrating body with no collision response of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct KinematicBody {
    pub desc: BodyDesc,
    position: Vec3,
    velocity: Vec3,
    sleeping: bool,
}

impl KinematicBody {
    #[must_use]
    pub const fn new(desc: BodyDesc) -> Self {
        Self {
            position: desc.position,
            velocity: Vec3::ZERO,
            sleeping: false,
            desc,
        }
    }

    // Position this body would reach after `dt` seconds.
    #[must_use]
    pub fn predicted_position(&self, dt: f32) -> Vec3 {
        if self.sleeping {
            self.position
        } else {
            self.position + self.velocity * dt
        }
    }

    pub fn step(&mut self, dt: f32) {
        self.position = self.predicted_position(dt);
    }
}

impl PhysicsBody for KinematicBody {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    fn sleep(&mut self) {
        self.sleeping = true;
        self.velocity = Vec3::ZERO;
    }

    fn wake_up(&mut self) {
        self.sleeping = false;
    }

    fn is_sleeping(&self) -> bool {
        self.sleeping
    }
}

#[derive(Debug, Default)]
pub struct KinematicWorld {
    bodies_created: usize,
}

impl KinematicWorld {
    #[must_use]
    pub const fn bodies_created(&self) -> usize {
        self.bodies_created
    }
}

impl PhysicsWorld for KinematicWorld {
    type Body = KinematicBody;

    fn create_body(&mut self, desc: &BodyDesc) -> KinematicBody {
        self.bodies_created += 1;
        KinematicBody::new(*desc)
    }
}

// ============================================================================
// Coordinates
// ============================================================================

pub trait CoordinateMapper {
    fn world_to_grid(&self, x: f32, z: f32) -> GridPos;
    fn grid_to_world(&self, pos: GridPos) -> (f32, f32);
}

// Cell (x, z) is centered at (x * tile_size, z * tile_size).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileMapper {
    pub tile_size: f32,
}

impl Default for TileMapper {
    fn default() -> Self {
        Self { tile_size: TILE_SIZE }
    }
}

impl TileMapper {
    #[must_use]
    pub fn new(tile_size: f32) -> Self {
        Self {
            tile_size: tile_size.max(PHYSICS_EPSILON),
        }
    }

    #[must_use]
    pub fn world_position(&self, pos: GridPos, y: f32) -> Vec3 {
        let (x, z) = self.grid_to_world(pos);
        Vec3::new(x, y, z)
    }
}

impl CoordinateMapper for TileMapper {
    fn world_to_grid(&self, x: f32, z: f32) -> GridPos {
        GridPos::new((x / self.tile_size).round() as i32, (z / self.tile_size).round() as i32)
    }

    fn grid_to_world(&self, pos: GridPos) -> (f32, f32) {
        (pos.x as f32 * self.tile_size, pos.z as f32 * self.tile_size)
    }
}

// ============================================================================
// Navigation
// ============================================================================

pub trait PathProvider {
    fn find_path(&self, start: GridPos, goal: GridPos) -> Option<Vec<GridPos>>;
    fn find_path_where(
        &self,
        start: GridPos,
        goal: GridPos,
        passable: &dyn Fn(GridPos) -> bool,
    ) -> Option<Vec<GridPos>>;
    fn room_at(&self, pos: GridPos) -> Option<&Room>;
    fn rooms(&self) -> &[Room];
}

pub trait OccupancyMap {
    fn is_tile_occupied(&self, x: i32, z: i32) -> bool;
}

// ============================================================================
// Audio & Animation
// ============================================================================

pub trait AudioSink {
    // None when the effect is unknown or could not start.
    fn play_effect(&mut self, key: &str, position: Vec3) -> Option<EffectId>;
    fn stop_effect(&mut self, id: EffectId);
    fn set_effect_volume(&mut self, _id: EffectId, _volume: f32) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAudio;

impl AudioSink for SilentAudio {
    fn play_effect(&mut self, _key: &str, _position: Vec3) -> Option<EffectId> {
        None
    }

    fn stop_effect(&mut self, _id: EffectId) {}
}

pub trait AnimationDriver {
    // False when no clip with this name exists.
    fn transition_to_animation(&mut self, name: &str) -> bool;
    fn update(&mut self, dt: f32);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoAnimation;

impl AnimationDriver for NoAnimation {
    fn transition_to_animation(&mut self, _name: &str) -> bool {
        false
    }

    fn update(&mut self, _dt: f32) {}
}

// ============================================================================
// Encounter Hooks
// ============================================================================

// Host-side reactions to enemy events (game-over screen, particles).
pub trait EncounterHooks {
    fn player_captured(&mut self, enemy_position: Vec3);
    fn enemy_died(&mut self, position: Vec3);
    fn enemy_respawned(&mut self, _position: Vec3) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct IgnoreEncounters;

impl EncounterHooks for IgnoreEncounters {
    fn player_captured(&mut self, _enemy_position: Vec3) {}

    fn enemy_died(&mut self, _position: Vec3) {}
}

// ============================================================================
// Tests
// ============================================================================
