use bevy_math::Vec3;
use tracing::warn;

use crate::config::ProximitySettings;

// Linear falloff: full volume inside `min_distance`, silent beyond `max_distance`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityVolume {
    pub min_distance: f32,
    pub max_distance: f32,
}

impl From<&ProximitySettings> for ProximityVolume {
    fn from(settings: &ProximitySettings) -> Self {
        Self {
            min_distance: settings.min_distance,
            max_distance: settings.max_distance,
        }
    }
}

impl ProximityVolume {
    #[must_use]
    pub fn at_distance(&self, distance: f32) -> f32 {
        if !distance.is_finite() {
            return 0.0;
        }
        if distance <= self.min_distance {
            return 1.0;
        }
        if distance >= self.max_distance {
            return 0.0;
        }
        let span = self.max_distance - self.min_distance;
        (1.0 - (distance - self.min_distance) / span).clamp(0.0, 1.0)
    }
}

// Volume in [0, 1] for a sound at `source` heard from `listener`.
// Malformed positions are silent.
#[must_use]
pub fn calculate_volume_by_distance(source: Vec3, listener: Vec3, settings: &ProximitySettings) -> f32 {
    if !source.is_finite() || !listener.is_finite() {
        warn!("proximity volume requested for malformed position {source} / {listener}");
        return 0.0;
    }
    ProximityVolume::from(settings).at_distance(source.distance(listener))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ProximitySettings {
        ProximitySettings {
            min_distance: 5.0,
            max_distance: 40.0,
        }
    }

    #[test]
    fn volume_falls_off_linearly() {
        let s = settings();
        assert_eq!(calculate_volume_by_distance(Vec3::ZERO, Vec3::new(3.0, 0.0, 0.0), &s), 1.0);
        assert_eq!(calculate_volume_by_distance(Vec3::ZERO, Vec3::new(0.0, 0.0, 50.0), &s), 0.0);
        let mid = calculate_volume_by_distance(Vec3::ZERO, Vec3::new(22.5, 0.0, 0.0), &s);
        assert!((mid - 0.5).abs() < 1e-5);
    }

    #[test]
    fn volume_is_exact_at_the_range_edges() {
        let s = settings();
        assert_eq!(calculate_volume_by_distance(Vec3::ONE, Vec3::ONE, &s), 1.0);
        assert_eq!(calculate_volume_by_distance(Vec3::ZERO, Vec3::new(0.0, 0.0, 5.0), &s), 1.0);
        assert_eq!(calculate_volume_by_distance(Vec3::ZERO, Vec3::new(40.0, 0.0, 0.0), &s), 0.0);
        let just_past_min = calculate_volume_by_distance(Vec3::ZERO, Vec3::new(5.5, 0.0, 0.0), &s);
        assert!(just_past_min < 1.0 && just_past_min > 0.95);
    }

    #[test]
    fn volume_never_increases_with_distance() {
        let s = settings();
        let mut last = 1.0;
        for step in 0..100 {
            let v = calculate_volume_by_distance(Vec3::ZERO, Vec3::new(step as f32 * 0.5, 0.0, 0.0), &s);
            assert!((0.0..=1.0).contains(&v));
            assert!(v <= last);
            last = v;
        }
    }

    #[test]
    fn malformed_position_is_silent() {
        let s = settings();
        assert_eq!(calculate_volume_by_distance(Vec3::new(f32::NAN, 0.0, 0.0), Vec3::ZERO, &s), 0.0);
        assert_eq!(calculate_volume_by_distance(Vec3::ZERO, Vec3::splat(f32::INFINITY), &s), 0.0);
    }
}
