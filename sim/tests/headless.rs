use bevy_app::App;
use bevy_ecs::prelude::*;
use engine::{
    collab::{CoordinateMapper, SilentAudio},
    config::GameSettings,
    enemy::EnemyState,
};
use sim::{
    components::Stalker,
    game::{build_app, run_headless},
    resources::{DungeonRes, EncounterLog, MapperRes, PlayerState, SimStats},
};

// Generation may reject a layout for some seeds; use the first that builds.
fn first_app(settings: &GameSettings) -> (u64, App) {
    for seed in 0..50 {
        if let Ok(app) = build_app(settings, seed) {
            return (seed, app);
        }
    }
    panic!("no seed in 0..50 produced a dungeon");
}

#[test]
fn most_seeds_build_an_app() {
    let settings = GameSettings::default();
    let built = (0..20).filter(|&seed| build_app(&settings, seed).is_ok()).count();
    assert!(built >= 10, "only {built} of 20 seeds built");
}

#[test]
fn run_stays_within_tick_limit() {
    let (seed, mut app) = first_app(&GameSettings::default());
    let report = run_headless(&mut app, 600);

    assert_eq!(report.seed, seed);
    assert!(report.ticks >= 1 && report.ticks <= 600);
    if report.ticks < 600 {
        assert!(report.captured);
    }
    assert!(report.rooms >= 5);
    assert!(report.final_state.is_some());
    assert_eq!(report.ticks, app.world().resource::<SimStats>().ticks);
}

#[test]
fn player_wanders_on_walkable_floor() {
    let (_, mut app) = first_app(&GameSettings::default());
    let start = app.world().resource::<PlayerState>().position;
    run_headless(&mut app, 120);
    let world = app.world();
    let player = world.resource::<PlayerState>();
    assert!(player.position.is_finite());
    let cell = world.resource::<MapperRes>().0.world_to_grid(player.position.x, player.position.z);
    assert!(world.resource::<DungeonRes>().manager.is_walkable(cell.x, cell.z));
    assert!(world.resource::<EncounterLog>().captured || player.position != start || player.path.is_empty());
}

// Kills every stalker through the same encounter log the systems report to.
fn kill_stalkers(app: &mut App) {
    app.world_mut().resource_scope(|world, mut log: Mut<EncounterLog>| {
        let mut stalkers = world.query::<&mut Stalker>();
        for mut stalker in stalkers.iter_mut(world) {
            stalker.0.handle_hit(1000.0, &mut SilentAudio, &mut *log);
        }
    });
}

fn stalker_dead(app: &mut App) -> bool {
    let world = app.world_mut();
    world.query::<&Stalker>().iter(world).all(|s| s.0.is_dead())
}

#[test]
fn disabled_respawn_never_respawns() {
    let mut settings = GameSettings::default();
    settings.enemy.respawn_enabled = false;
    let (_, mut app) = first_app(&settings);
    kill_stalkers(&mut app);
    assert!(stalker_dead(&mut app));

    let report = run_headless(&mut app, 600);
    assert_eq!(report.ticks, 600);
    assert_eq!(report.deaths, 1);
    assert_eq!(report.respawns, 0);
    assert!(!report.captured);
    assert!(stalker_dead(&mut app));
}

#[test]
fn killed_stalker_respawns_after_its_delay() {
    let (_, mut app) = first_app(&GameSettings::default());
    kill_stalkers(&mut app);

    // Respawn delay is one second
    let report = run_headless(&mut app, 30);
    assert_eq!(report.deaths, 1);
    assert_eq!(report.respawns, 0);
    assert!(stalker_dead(&mut app));

    let report = run_headless(&mut app, 60);
    assert_eq!(report.respawns, 1);
    assert!(!stalker_dead(&mut app));
}

#[test]
fn capture_ends_in_caught_state() {
    let (_, mut app) = first_app(&GameSettings::default());
    let world = app.world_mut();
    let enemy_position = world.query::<&Stalker>().iter(world).next().map(|s| s.0.position()).unwrap();
    {
        let mut player = world.resource_mut::<PlayerState>();
        player.position = enemy_position;
        player.path.clear();
        player.path_index = 0;
        // Keep the player from flashing or shooting
        player.flash_cooldown = 1000.0;
        player.shot_cooldown = 1000.0;
    }

    let report = run_headless(&mut app, 600);
    assert!(report.captured);
    assert_eq!(report.ticks, 2);
    assert_eq!(report.final_state, Some(EnemyState::Caught));
    assert_eq!(report.transitions, vec![(1, EnemyState::Chase), (2, EnemyState::Caught)]);
    assert_eq!(report.flashes, 0);
    assert_eq!(report.shots, 0);
}
