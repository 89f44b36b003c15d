use std::path::Path;

use anyhow::{Context, Result};
use engine::config::GameSettings;
use tracing_subscriber::EnvFilter;

use crate::constants::LOG_FILTER;

// ============================================================================
// Tracing
// ============================================================================

// RUST_LOG wins over `filter`, which wins over the built-in default.
pub fn init_tracing(filter: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter.unwrap_or(LOG_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(LOG_FILTER));
    // A subscriber may already be installed (tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();
}

// ============================================================================
// Settings
// ============================================================================

pub fn load_settings(path: Option<&Path>) -> Result<GameSettings> {
    let settings = match path {
        Some(path) => read_settings(path)?,
        None => GameSettings::default(),
    };
    settings.validate().context("invalid game settings")?;
    Ok(settings)
}

#[cfg(feature = "json")]
fn read_settings(path: &Path) -> Result<GameSettings> {
    let text = std::fs::read_to_string(path).with_context(|| format!("failed to read settings file {}", path.display()))?;
    parse_settings(&text).with_context(|| format!("failed to parse settings file {}", path.display()))
}

#[cfg(not(feature = "json"))]
fn read_settings(path: &Path) -> Result<GameSettings> {
    anyhow::bail!("cannot read {}: built without json support", path.display())
}

// Missing fields fall back to their defaults.
#[cfg(feature = "json")]
pub fn parse_settings(text: &str) -> Result<GameSettings> {
    Ok(serde_json::from_str(text)?)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let settings = parse_settings(r#"{ "enemy": { "detection_range": 30.0 }, "generator": { "width": 41 } }"#).unwrap();
        assert_eq!(settings.enemy.detection_range, 30.0);
        assert_eq!(settings.enemy.capture_range, GameSettings::default().enemy.capture_range);
        assert_eq!(settings.generator.width, 41);
        assert_eq!(settings.generator.height, GameSettings::default().generator.height);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(parse_settings("{ \"enemy\": 5 }").is_err());
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_settings(Some(Path::new("/nonexistent/catacomb.json"))).unwrap_err();
        assert!(err.to_string().contains("failed to read settings file"));
    }
}
