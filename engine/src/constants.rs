// ============================================================================
// Floating-Point Comparisons
// ============================================================================

// Small value for floating-point comparisons (near-zero checks, division guards).
pub const PHYSICS_EPSILON: f32 = 1e-6;

// ============================================================================
// Dungeon Grid
// ============================================================================

pub const DUNGEON_WIDTH: i32 = 31; // cells (X axis)
pub const DUNGEON_HEIGHT: i32 = 31; // cells (Z axis)
pub const TILE_SIZE: f32 = 4.0; // world units per cell
pub const MIN_DUNGEON_DIMENSION: i32 = 10; // cells, enforced by validation

// ============================================================================
// Digger
// ============================================================================

pub const ROOM_WIDTH_MIN: i32 = 3; // cells
pub const ROOM_WIDTH_MAX: i32 = 9; // cells
pub const ROOM_HEIGHT_MIN: i32 = 3; // cells
pub const ROOM_HEIGHT_MAX: i32 = 5; // cells
pub const CORRIDOR_LENGTH_MIN: i32 = 3; // cells
pub const CORRIDOR_LENGTH_MAX: i32 = 10; // cells
pub const DIG_PERCENTAGE: f64 = 0.45; // fraction of the inner area to carve
pub const GENERATION_TIME_LIMIT_MS: u64 = 1000; // soft cap per dig
pub const FEATURE_ATTEMPTS: u32 = 20; // tries per picked wall
pub const ROOM_FEATURE_WEIGHT: u32 = 4;
pub const CORRIDOR_FEATURE_WEIGHT: u32 = 4;

// ============================================================================
// Generation & Validation
// ============================================================================

pub const MAX_GENERATION_ATTEMPTS: u32 = 5;
pub const MIN_ROOMS_PER_ATTEMPT: usize = 8;
pub const MIN_CORRIDORS_PER_ATTEMPT: usize = 10;
pub const MIN_VALID_ROOMS: usize = 5;
pub const LOOT_ROOM_MIN_AREA: i32 = 30; // cells, rooms strictly larger become LOOT
pub const SAFE_ROOM_CHANCE: f64 = 0.2;
pub const ROOM_NEIGHBOR_DISTANCE: f32 = 15.0; // cells between centers
pub const MAX_ADJACENT_ROOM_GAP: i32 = 2; // cells between facing edges

// ============================================================================
// Room Features
// ============================================================================

pub const HEALTH_SPAWN_OFFSET_X: i32 = 2; // cells from the SAFE room center
pub const BOSS_PATROL_POINTS: usize = 4;
pub const STANDARD_PATROL_POINTS: usize = 2;

// ============================================================================
// Pathfinding
// ============================================================================

pub const HEURISTIC_WEIGHT: f32 = 1.001; // slight tie-break toward the goal

// ============================================================================
// Enemy
// ============================================================================

// Ranges (world units)
pub const DETECTION_RANGE: f32 = 40.0;
pub const CAPTURE_RANGE: f32 = 11.0;
pub const FLASH_RANGE: f32 = 20.0;
pub const WAYPOINT_REACHED_DISTANCE: f32 = 1.0;

// Speeds (world units per frame at the 60 Hz baseline)
pub const PATROL_SPEED: f32 = 3.0;
pub const CHASE_SPEED: f32 = 5.0;
pub const FRAME_RATE_BASELINE: f32 = 60.0; // velocity = speed * dt * baseline

// Timers (seconds)
pub const FLASH_DURATION: f32 = 3.0;
pub const PATH_UPDATE_INTERVAL: f32 = 0.5; // halved while chasing
pub const RESPAWN_DELAY: f32 = 1.0;
pub const WAIT_AT_POINT_DURATION: f32 = 2.0;
pub const ROOM_WAIT_TIME: f32 = 5.0;

pub const ROTATION_SLERP_FACTOR: f32 = 0.15; // fraction per tick
pub const ENEMY_MAX_HEALTH: f32 = 100.0;
pub const ENEMY_RADIUS: f32 = 1.0; // world units
pub const ENEMY_HEIGHT: f32 = 3.0; // world units
pub const ENEMY_MASS: f32 = 80.0; // kg
pub const ENEMY_COLLISION_GROUP: u32 = 0b0010;
pub const ENEMY_COLLISION_MASK: u32 = 0b0001;

// ============================================================================
// Audio
// ============================================================================

pub const AMBIENCE_EFFECT_KEY: &str = "enemy_ambience";
pub const AMBIENCE_THRESHOLD: f32 = 0.05; // volume above which the loop starts
pub const PROXIMITY_MIN_DISTANCE: f32 = 5.0; // full volume inside
pub const PROXIMITY_MAX_DISTANCE: f32 = 40.0; // silent beyond
