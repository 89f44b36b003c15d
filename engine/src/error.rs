use thiserror::Error;

// ============================================================================
// Grid
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error("grid dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },

    #[error("tile size must be positive and finite, got {0}")]
    InvalidTileSize(f32),
}

// ============================================================================
// Settings
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid setting `{field}`: {reason}")]
pub struct SettingsError {
    pub field: &'static str,
    pub reason: String,
}

impl SettingsError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

// ============================================================================
// Generation
// ============================================================================

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("dungeon failed validation after regeneration: {}", errors.join("; "))]
    ValidationFailed { errors: Vec<String> },
}

// ============================================================================
// Enemy
// ============================================================================

#[derive(Error, Debug)]
pub enum EnemyError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("respawn is enabled but no spawn positions are configured")]
    NoSpawnPositions,
}

pub type GenerationResult<T> = std::result::Result<T, GenerationError>;
