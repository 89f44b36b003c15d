use bevy_ecs::prelude::*;
use bevy_time::Time;
use engine::enemy::{EnemyWorld, Navigation};
use tracing::debug;

use crate::{
    components::Stalker,
    resources::{DungeonRes, EncounterLog, MapperRes, PlayerState, SimAudio, SimStats},
};

// ============================================================================
// Enemy AI System
// ============================================================================

pub fn enemy_update_system(
    time: Res<Time>,
    dungeon: Res<DungeonRes>,
    mapper: Res<MapperRes>,
    player: Res<PlayerState>,
    mut audio: ResMut<SimAudio>,
    mut encounter: ResMut<EncounterLog>,
    mut stats: ResMut<SimStats>,
    mut stalkers: Query<&mut Stalker>,
) {
    let delta = time.delta_secs();
    let nav = Navigation::new(&dungeon.manager, &mapper.0);
    let tick = stats.ticks;

    for mut stalker in &mut stalkers {
        let before = stalker.0.state();
        let mut world = EnemyWorld {
            nav,
            audio: &mut *audio,
            hooks: &mut *encounter,
            player_position: player.position,
        };
        stalker.0.update(delta, &mut world);

        let after = stalker.0.state();
        if after != before {
            debug!("tick {tick}: {} -> {}", before.as_str(), after.as_str());
            stats.transitions.push((tick, after));
        }
    }
}
