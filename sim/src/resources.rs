use std::collections::{HashMap, HashSet};

use bevy_ecs::prelude::*;
use bevy_math::Vec3;
use engine::{
    collab::{AudioSink, EffectId, EncounterHooks, TileMapper},
    digger::{DungeonMap, RawCorridor},
    enemy::EnemyState,
    manager::DungeonManager,
};
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::constants::{LOOPING_EFFECTS, SOUND_LIBRARY};

// ============================================================================
// Bevy Resources
// ============================================================================

// Generated once before the loop starts; read-only afterwards
#[derive(Resource)]
pub struct DungeonRes {
    pub manager: DungeonManager,
    pub map: DungeonMap,
    pub corridors: Vec<RawCorridor>,
}

#[derive(Resource, Clone, Copy)]
pub struct MapperRes(pub TileMapper);

#[derive(Resource)]
pub struct SimRng(pub StdRng);

// Scripted player that wanders between rooms
#[derive(Resource, Debug, Clone)]
pub struct PlayerState {
    pub position: Vec3,
    pub path: Vec<Vec3>,
    pub path_index: usize,
    pub flash_cooldown: f32,
    pub shot_cooldown: f32,
}

impl PlayerState {
    #[must_use]
    pub const fn new(position: Vec3) -> Self {
        Self {
            position,
            path: Vec::new(),
            path_index: 0,
            flash_cooldown: 0.0,
            shot_cooldown: 0.0,
        }
    }
}

#[derive(Resource, Debug, Default)]
pub struct SimStats {
    pub seed: u64,
    pub ticks: u64,
    pub transitions: Vec<(u64, EnemyState)>,
    pub flashes: u32,
    pub shots: u32,
}

// ============================================================================
// Audio
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct PlayingEffect {
    pub key: String,
    pub position: Vec3,
    pub volume: f32,
}

// Bookkeeping stand-in for the audio engine. One-shots finish immediately;
// looping effects stay active until stopped.
#[derive(Resource, Debug)]
pub struct SimAudio {
    library: HashSet<&'static str>,
    next_id: EffectId,
    active: HashMap<EffectId, PlayingEffect>,
    missing: HashSet<String>,
    pub one_shots_played: u32,
}

impl Default for SimAudio {
    fn default() -> Self {
        Self::new(SOUND_LIBRARY)
    }
}

impl SimAudio {
    #[must_use]
    pub fn new(library: &[&'static str]) -> Self {
        Self {
            library: library.iter().copied().collect(),
            next_id: 0,
            active: HashMap::new(),
            missing: HashSet::new(),
            one_shots_played: 0,
        }
    }

    #[must_use]
    pub fn active(&self, id: EffectId) -> Option<&PlayingEffect> {
        self.active.get(&id)
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

impl AudioSink for SimAudio {
    fn play_effect(&mut self, key: &str, position: Vec3) -> Option<EffectId> {
        if !self.library.contains(key) {
            if self.missing.insert(key.to_string()) {
                warn!("sound '{key}' is not loaded");
            }
            return None;
        }

        self.next_id += 1;
        if LOOPING_EFFECTS.contains(&key) {
            self.active.insert(
                self.next_id,
                PlayingEffect {
                    key: key.to_string(),
                    position,
                    volume: 1.0,
                },
            );
        } else {
            self.one_shots_played += 1;
        }
        debug!("playing '{key}' as effect {}", self.next_id);
        Some(self.next_id)
    }

    fn stop_effect(&mut self, id: EffectId) {
        if self.active.remove(&id).is_none() {
            debug!("effect {id} was not playing");
        }
    }

    fn set_effect_volume(&mut self, id: EffectId, volume: f32) {
        if let Some(effect) = self.active.get_mut(&id) {
            effect.volume = volume.clamp(0.0, 1.0);
        }
    }
}

// ============================================================================
// Encounter Log
// ============================================================================

#[derive(Resource, Debug, Default)]
pub struct EncounterLog {
    pub captured: bool,
    pub captured_at: Option<Vec3>,
    pub deaths: u32,
    pub respawns: u32,
}

impl EncounterHooks for EncounterLog {
    fn player_captured(&mut self, enemy_position: Vec3) {
        info!("player captured, game over");
        self.captured = true;
        self.captured_at = Some(enemy_position);
    }

    fn enemy_died(&mut self, position: Vec3) {
        debug!("death particles at {position}");
        self.deaths += 1;
    }

    fn enemy_respawned(&mut self, _position: Vec3) {
        self.respawns += 1;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_sounds_are_not_played() {
        let mut audio = SimAudio::new(&["gunshot"]);
        assert_eq!(audio.play_effect("scream", Vec3::ZERO), None);
        assert_eq!(audio.play_effect("scream", Vec3::ZERO), None);
        assert_eq!(audio.missing.len(), 1);
        assert!(audio.play_effect("gunshot", Vec3::ZERO).is_some());
        assert_eq!(audio.one_shots_played, 1);
        assert_eq!(audio.active_count(), 0);
    }

    #[test]
    fn looping_effects_stay_until_stopped() {
        let mut audio = SimAudio::default();
        let id = audio.play_effect("enemy_ambience", Vec3::ONE).unwrap();
        audio.set_effect_volume(id, 1.7);
        assert_eq!(audio.active(id).unwrap().volume, 1.0);
        audio.stop_effect(id);
        assert!(audio.active(id).is_none());
    }
}
