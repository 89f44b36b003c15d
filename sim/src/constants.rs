// ============================================================================
// Loop
// ============================================================================

pub const SIM_LOOP_FREQUENCY: u64 = 60; // ticks per second
pub const DEFAULT_TICKS: u64 = 3600; // one minute of game time
pub const LOG_FILTER: &str = "info";

// ============================================================================
// Player
// ============================================================================

pub const PLAYER_SPEED: f32 = 4.0; // world units per second, slower than a chase
pub const FLOOR_Y: f32 = 0.0; // everything moves on the floor plane
pub const FLASH_COOLDOWN: f32 = 8.0; // seconds
pub const SHOT_COOLDOWN: f32 = 1.5; // seconds
pub const SHOT_RANGE: f32 = 15.0; // world units
pub const SHOT_DAMAGE: f32 = 25.0;

// ============================================================================
// Audio
// ============================================================================

pub const FLASH_EFFECT_KEY: &str = "flashlight_click";
pub const SHOT_EFFECT_KEY: &str = "gunshot";
pub const SOUND_LIBRARY: &[&str] = &[engine::constants::AMBIENCE_EFFECT_KEY, FLASH_EFFECT_KEY, SHOT_EFFECT_KEY];
pub const LOOPING_EFFECTS: &[&str] = &[engine::constants::AMBIENCE_EFFECT_KEY];

// ============================================================================
// Enemy Model
// ============================================================================

// The stalker rig ships without a stun clip.
pub const ENEMY_CLIPS: &[&str] = &["walk", "run", "attack", "death"];
