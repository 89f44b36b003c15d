#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};

use crate::{constants::*, error::SettingsError};

// ============================================================================
// Shared Types
// ============================================================================

// Inclusive integer range used for room and corridor sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
pub struct SizeRange {
    pub min: i32,
    pub max: i32,
}

impl SizeRange {
    #[must_use]
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    fn validate(&self, field: &'static str) -> Result<(), SettingsError> {
        if self.min <= 0 {
            return Err(SettingsError::new(field, format!("minimum must be positive, got {}", self.min)));
        }
        if self.max < self.min {
            return Err(SettingsError::new(
                field,
                format!("maximum {} is below minimum {}", self.max, self.min),
            ));
        }
        Ok(())
    }
}

fn require_positive(field: &'static str, value: f32) -> Result<(), SettingsError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SettingsError::new(field, format!("must be positive and finite, got {value}")))
    }
}

// ============================================================================
// Generator Settings
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize), serde(default))]
pub struct GeneratorSettings {
    pub width: i32,
    pub height: i32,
    pub tile_size: f32,
    pub room_width: SizeRange,
    pub room_height: SizeRange,
    pub corridor_length: SizeRange,
    pub dig_percentage: f64,
    pub time_limit_ms: u64,
    pub max_attempts: u32,
    pub min_rooms: usize,
    pub min_corridors: usize,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            width: DUNGEON_WIDTH,
            height: DUNGEON_HEIGHT,
            tile_size: TILE_SIZE,
            room_width: SizeRange::new(ROOM_WIDTH_MIN, ROOM_WIDTH_MAX),
            room_height: SizeRange::new(ROOM_HEIGHT_MIN, ROOM_HEIGHT_MAX),
            corridor_length: SizeRange::new(CORRIDOR_LENGTH_MIN, CORRIDOR_LENGTH_MAX),
            dig_percentage: DIG_PERCENTAGE,
            time_limit_ms: GENERATION_TIME_LIMIT_MS,
            max_attempts: MAX_GENERATION_ATTEMPTS,
            min_rooms: MIN_ROOMS_PER_ATTEMPT,
            min_corridors: MIN_CORRIDORS_PER_ATTEMPT,
        }
    }
}

impl GeneratorSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.width <= 0 || self.height <= 0 {
            return Err(SettingsError::new(
                "generator.width/height",
                format!("must be positive, got {}x{}", self.width, self.height),
            ));
        }
        require_positive("generator.tile_size", self.tile_size)?;
        self.room_width.validate("generator.room_width")?;
        self.room_height.validate("generator.room_height")?;
        self.corridor_length.validate("generator.corridor_length")?;
        if !(self.dig_percentage > 0.0 && self.dig_percentage <= 1.0) {
            return Err(SettingsError::new(
                "generator.dig_percentage",
                format!("must be in (0, 1], got {}", self.dig_percentage),
            ));
        }
        if self.max_attempts == 0 {
            return Err(SettingsError::new("generator.max_attempts", "must be at least 1"));
        }
        Ok(())
    }
}

// ============================================================================
// Enemy Settings
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize), serde(default))]
pub struct EnemySettings {
    pub detection_range: f32,
    pub capture_range: f32,
    pub flash_range: f32,
    pub flash_duration: f32,
    pub patrol_speed: f32,
    pub chase_speed: f32,
    pub path_update_interval: f32,
    pub waypoint_reached_distance: f32,
    pub rotation_factor: f32,
    pub max_health: f32,
    pub respawn_enabled: bool,
    pub respawn_delay: f32,
    // World coordinates; filled from the dungeon when left empty by the host.
    pub spawn_positions: Vec<[f32; 3]>,
    pub wait_at_point_duration: f32,
    pub room_wait_time: f32,
    pub ambience_threshold: f32,
}

impl Default for EnemySettings {
    fn default() -> Self {
        Self {
            detection_range: DETECTION_RANGE,
            capture_range: CAPTURE_RANGE,
            flash_range: FLASH_RANGE,
            flash_duration: FLASH_DURATION,
            patrol_speed: PATROL_SPEED,
            chase_speed: CHASE_SPEED,
            path_update_interval: PATH_UPDATE_INTERVAL,
            waypoint_reached_distance: WAYPOINT_REACHED_DISTANCE,
            rotation_factor: ROTATION_SLERP_FACTOR,
            max_health: ENEMY_MAX_HEALTH,
            respawn_enabled: true,
            respawn_delay: RESPAWN_DELAY,
            spawn_positions: Vec::new(),
            wait_at_point_duration: WAIT_AT_POINT_DURATION,
            room_wait_time: ROOM_WAIT_TIME,
            ambience_threshold: AMBIENCE_THRESHOLD,
        }
    }
}

impl EnemySettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        require_positive("enemy.detection_range", self.detection_range)?;
        require_positive("enemy.capture_range", self.capture_range)?;
        require_positive("enemy.flash_range", self.flash_range)?;
        require_positive("enemy.flash_duration", self.flash_duration)?;
        require_positive("enemy.patrol_speed", self.patrol_speed)?;
        require_positive("enemy.chase_speed", self.chase_speed)?;
        require_positive("enemy.path_update_interval", self.path_update_interval)?;
        require_positive("enemy.waypoint_reached_distance", self.waypoint_reached_distance)?;
        require_positive("enemy.max_health", self.max_health)?;
        require_positive("enemy.respawn_delay", self.respawn_delay)?;
        if self.capture_range >= self.detection_range {
            return Err(SettingsError::new(
                "enemy.capture_range",
                format!(
                    "must be below detection range {}, got {}",
                    self.detection_range, self.capture_range
                ),
            ));
        }
        if !(self.rotation_factor > 0.0 && self.rotation_factor <= 1.0) {
            return Err(SettingsError::new(
                "enemy.rotation_factor",
                format!("must be in (0, 1], got {}", self.rotation_factor),
            ));
        }
        if self.spawn_positions.iter().flatten().any(|c| !c.is_finite()) {
            return Err(SettingsError::new("enemy.spawn_positions", "contains a non-finite coordinate"));
        }
        Ok(())
    }
}

// ============================================================================
// Proximity Settings
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize), serde(default))]
pub struct ProximitySettings {
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for ProximitySettings {
    fn default() -> Self {
        Self {
            min_distance: PROXIMITY_MIN_DISTANCE,
            max_distance: PROXIMITY_MAX_DISTANCE,
        }
    }
}

impl ProximitySettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.min_distance.is_finite() && self.min_distance >= 0.0) {
            return Err(SettingsError::new(
                "proximity.min_distance",
                format!("must be non-negative, got {}", self.min_distance),
            ));
        }
        if !(self.max_distance.is_finite() && self.max_distance > self.min_distance) {
            return Err(SettingsError::new(
                "proximity.max_distance",
                format!("must exceed min distance {}, got {}", self.min_distance, self.max_distance),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Game Settings
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize), serde(default))]
pub struct GameSettings {
    pub generator: GeneratorSettings,
    pub enemy: EnemySettings,
    pub proximity: ProximitySettings,
}

impl GameSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.generator.validate()?;
        self.enemy.validate()?;
        self.proximity.validate()
    }
}

// ============================================================================
// Tests
// ============================================================================
