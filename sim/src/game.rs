use std::fmt;

use anyhow::{Context, Result};
use bevy_app::{App, Update};
use bevy_ecs::prelude::*;
use bevy_math::Vec3;
use bevy_time::Time;
use engine::{
    collab::{KinematicWorld, TileMapper},
    config::GameSettings,
    enemy::{Enemy, EnemyState},
    generator::DungeonGenerator,
    rooms::{RoomType, SpawnKind},
};
use rand::{SeedableRng, rngs::StdRng};
use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::{
    animation::ClipMixer,
    components::{EnemyMarker, Stalker},
    constants::{ENEMY_CLIPS, FLOOR_Y, SIM_LOOP_FREQUENCY},
    resources::{DungeonRes, EncounterLog, MapperRes, PlayerState, SimAudio, SimRng, SimStats},
    systems::{
        enemy_update_system, physics_step_system, player_actions_system, player_movement_system, tick_counter_system,
    },
};

// ============================================================================
// Report
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SimReport {
    pub seed: u64,
    pub ticks: u64,
    pub rooms: usize,
    pub captured: bool,
    pub flashes: u32,
    pub shots: u32,
    pub deaths: u32,
    pub respawns: u32,
    pub transitions: Vec<(u64, EnemyState)>,
    pub final_state: Option<EnemyState>,
}

impl SimReport {
    #[must_use]
    pub fn collect(app: &mut App) -> Self {
        let world = app.world_mut();
        let final_state = world.query::<&Stalker>().iter(world).next().map(|s| s.0.state());
        let rooms = world.resource::<DungeonRes>().manager.room_count();
        let stats = world.resource::<SimStats>();
        let encounter = world.resource::<EncounterLog>();

        Self {
            seed: stats.seed,
            ticks: stats.ticks,
            rooms,
            captured: encounter.captured,
            flashes: stats.flashes,
            shots: stats.shots,
            deaths: encounter.deaths,
            respawns: encounter.respawns,
            transitions: stats.transitions.clone(),
            final_state,
        }
    }
}

impl fmt::Display for SimReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = if self.captured { "captured" } else { "escaped" };
        write!(
            f,
            "seed {} | {} ticks | {} rooms | player {outcome} | {} flashes, {} shots | {} deaths, {} respawns | {} state changes",
            self.seed,
            self.ticks,
            self.rooms,
            self.flashes,
            self.shots,
            self.deaths,
            self.respawns,
            self.transitions.len()
        )?;
        if let Some(state) = self.final_state {
            write!(f, " | ends in {}", state.as_str())?;
        }
        Ok(())
    }
}

// ============================================================================
// App Setup
// ============================================================================

pub fn build_app(settings: &GameSettings, seed: u64) -> Result<App> {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut generator = DungeonGenerator::new(settings.generator.clone(), StdRng::from_rng(&mut rng))?;
    let dungeon = generator.generate().context("failed to generate dungeon")?;
    info!(
        "generated {} rooms and {} corridors ({} floor tiles) in {} attempts",
        dungeon.manager.room_count(),
        dungeon.corridors.len(),
        dungeon.map.floor_count(),
        dungeon.attempts
    );
    let mix: Vec<String> = RoomType::ALL
        .iter()
        .map(|&room_type| format!("{} {}", dungeon.manager.rooms_of_type(room_type).len(), room_type.display_name()))
        .collect();
    info!("room mix: {}", mix.join(", "));

    let mapper = TileMapper::new(dungeon.manager.tile_size());
    let start = dungeon.player_start().context("dungeon has no rooms")?;
    let player_position = mapper.world_position(start, FLOOR_Y);

    let mut enemy_settings = settings.enemy.clone();
    if enemy_settings.spawn_positions.is_empty() {
        enemy_settings.spawn_positions = dungeon
            .enemy_spawn_positions(&mapper, FLOOR_Y)
            .iter()
            .map(|p| p.to_array())
            .collect();
    }

    // The stalker starts in its lair when there is one
    let enemy_start = dungeon
        .manager
        .spawn_points(SpawnKind::Boss)
        .first()
        .map(|&cell| mapper.world_position(cell, FLOOR_Y))
        .or_else(|| enemy_settings.spawn_positions.first().map(|&p| Vec3::from_array(p)))
        .context("no position to place the enemy")?;

    let mut physics = KinematicWorld::default();
    let enemy = Enemy::spawn(
        &mut physics,
        enemy_start,
        enemy_settings,
        settings.proximity,
        ClipMixer::new(ENEMY_CLIPS),
        StdRng::from_rng(&mut rng),
    )?;

    let mut app = App::new();
    app.insert_resource(Time::<()>::default())
        .insert_resource(DungeonRes {
            manager: dungeon.manager,
            map: dungeon.map,
            corridors: dungeon.corridors,
        })
        .insert_resource(MapperRes(mapper))
        .insert_resource(PlayerState::new(player_position))
        .insert_resource(SimAudio::default())
        .insert_resource(EncounterLog::default())
        .insert_resource(SimRng(rng))
        .insert_resource(SimStats {
            seed,
            ..SimStats::default()
        })
        .add_systems(
            Update,
            (
                tick_counter_system,
                player_movement_system,
                player_actions_system,
                enemy_update_system,
                physics_step_system,
            )
                .chain(),
        );

    app.world_mut().spawn((EnemyMarker, Stalker(enemy)));
    app.finish();
    app.cleanup();
    Ok(app)
}

// ============================================================================
// Loops
// ============================================================================

pub fn step(app: &mut App, delta: Duration) {
    app.world_mut().resource_mut::<Time>().advance_by(delta);
    app.update();
}

fn tick_duration() -> Duration {
    Duration::from_nanos(1_000_000_000 / SIM_LOOP_FREQUENCY)
}

fn captured(app: &App) -> bool {
    app.world().resource::<EncounterLog>().captured
}

// Runs as fast as possible with a fixed timestep. Stops early on capture.
pub fn run_headless(app: &mut App, ticks: u64) -> SimReport {
    let delta = tick_duration();
    for _ in 0..ticks {
        step(app, delta);
        if captured(app) {
            break;
        }
    }
    SimReport::collect(app)
}

// Paces ticks against the wall clock.
pub async fn run_realtime(app: &mut App, ticks: u64) -> SimReport {
    let tick_duration = tick_duration();
    let mut interval = time::interval(tick_duration);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    for frame in 0..ticks {
        interval.tick().await;

        let update_start = Instant::now();
        step(app, tick_duration);
        let update_elapsed = update_start.elapsed();

        if update_elapsed > tick_duration {
            warn!(
                "tick {} took {:.2}ms (exceeded {:.2}ms budget)",
                frame,
                update_elapsed.as_secs_f64() * 1000.0,
                tick_duration.as_secs_f64() * 1000.0
            );
        }

        if captured(app) {
            break;
        }
    }
    SimReport::collect(app)
}
