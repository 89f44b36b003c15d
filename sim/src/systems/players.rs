use bevy_ecs::prelude::*;
use bevy_time::Time;
use engine::{
    collab::{AudioSink, CoordinateMapper},
    enemy::EnemyState,
};
use rand::Rng;
use tracing::{debug, info};

use crate::{
    components::Stalker,
    constants::{
        FLASH_COOLDOWN, FLASH_EFFECT_KEY, FLOOR_Y, PLAYER_SPEED, SHOT_COOLDOWN, SHOT_DAMAGE, SHOT_EFFECT_KEY,
        SHOT_RANGE,
    },
    resources::{DungeonRes, EncounterLog, MapperRes, PlayerState, SimAudio, SimRng, SimStats},
};

// ============================================================================
// Tick Counter System
// ============================================================================

pub fn tick_counter_system(mut stats: ResMut<SimStats>) {
    stats.ticks += 1;
}

// ============================================================================
// Player Movement System
// ============================================================================

// The scripted player walks to a random room, then picks another.
pub fn player_movement_system(
    time: Res<Time>,
    dungeon: Res<DungeonRes>,
    mapper: Res<MapperRes>,
    encounter: Res<EncounterLog>,
    mut rng: ResMut<SimRng>,
    mut player: ResMut<PlayerState>,
) {
    if encounter.captured {
        return;
    }

    if player.path_index >= player.path.len() {
        let rooms = dungeon.manager.rooms();
        if rooms.is_empty() {
            return;
        }
        let target = &rooms[rng.0.random_range(0..rooms.len())];
        let here = mapper.0.world_to_grid(player.position.x, player.position.z);
        let Some(cells) = dungeon.manager.find_path(here, target.center) else {
            debug!("no route from {here} to {}", target.id);
            return;
        };
        debug!("player heading to {} ({})", target.name, target.id);
        player.path = cells.into_iter().map(|cell| mapper.0.world_position(cell, FLOOR_Y)).collect();
        player.path_index = 0;
    }

    let mut budget = PLAYER_SPEED * time.delta_secs();
    while budget > 0.0 && player.path_index < player.path.len() {
        let waypoint = player.path[player.path_index];
        let distance = player.position.distance(waypoint);
        if distance <= budget {
            player.position = waypoint;
            player.path_index += 1;
            budget -= distance;
        } else {
            let step = (waypoint - player.position) / distance * budget;
            player.position += step;
            budget = 0.0;
        }
    }
}

// ============================================================================
// Player Actions System
// ============================================================================

// Flashes the stalker when it gets close and shoots it while it chases.
pub fn player_actions_system(
    time: Res<Time>,
    mut player: ResMut<PlayerState>,
    mut audio: ResMut<SimAudio>,
    mut encounter: ResMut<EncounterLog>,
    mut stats: ResMut<SimStats>,
    mut stalkers: Query<&mut Stalker>,
) {
    let delta = time.delta_secs();
    player.flash_cooldown = (player.flash_cooldown - delta).max(0.0);
    player.shot_cooldown = (player.shot_cooldown - delta).max(0.0);

    if encounter.captured {
        return;
    }

    for mut stalker in &mut stalkers {
        if stalker.0.is_dead() {
            continue;
        }
        let distance = player.position.distance(stalker.0.position());

        if player.flash_cooldown <= 0.0 && stalker.0.flash(distance) {
            audio.play_effect(FLASH_EFFECT_KEY, player.position);
            player.flash_cooldown = FLASH_COOLDOWN;
            stats.flashes += 1;
            info!("flashed the stalker at {distance:.1}");
            continue;
        }

        if player.shot_cooldown <= 0.0 && distance <= SHOT_RANGE && stalker.0.state() == EnemyState::Chase {
            audio.play_effect(SHOT_EFFECT_KEY, player.position);
            stalker.0.handle_hit(SHOT_DAMAGE, &mut *audio, &mut *encounter);
            player.shot_cooldown = SHOT_COOLDOWN;
            stats.shots += 1;
        }
    }
}
