use std::{collections::HashSet, time::Duration};

use bevy_math::{Quat, Vec3};
use bevy_time::{Timer, TimerMode};
use rand::{Rng, rngs::StdRng};
use tracing::{debug, info, warn};

use crate::{
    collab::{
        AnimationDriver, AudioSink, BodyDesc, BodyShape, CoordinateMapper, EffectId, EncounterHooks, OccupancyMap,
        PathProvider, PhysicsBody, PhysicsWorld,
    },
    config::{EnemySettings, ProximitySettings},
    constants::{
        AMBIENCE_EFFECT_KEY, ENEMY_COLLISION_GROUP, ENEMY_COLLISION_MASK, ENEMY_HEIGHT, ENEMY_MASS, ENEMY_RADIUS,
        FRAME_RATE_BASELINE,
    },
    error::EnemyError,
    proximity::calculate_volume_by_distance,
    rooms::{GridPos, Room},
};

pub const DEATH_ANIMATION: &str = "death";

// ============================================================================
// State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnemyState {
    Patrol,
    Chase,
    Caught,
    Flashed,
}

impl EnemyState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Patrol => "PATROL",
            Self::Chase => "CHASE",
            Self::Caught => "CAUGHT",
            Self::Flashed => "FLASHED",
        }
    }

    #[must_use]
    pub const fn animation(self) -> &'static str {
        match self {
            Self::Patrol => "walk",
            Self::Chase => "run",
            Self::Caught => "attack",
            Self::Flashed => "stunned",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    #[must_use]
    pub const fn full(max: f32) -> Self {
        Self { current: max, max }
    }
}

// ============================================================================
// Per-Tick Context
// ============================================================================

// Read-only navigation services the enemy queries while moving.
#[derive(Clone, Copy)]
pub struct Navigation<'a> {
    pub paths: &'a dyn PathProvider,
    pub mapper: &'a dyn CoordinateMapper,
    pub occupancy: &'a dyn OccupancyMap,
}

impl<'a> Navigation<'a> {
    pub fn new<M>(dungeon: &'a M, mapper: &'a dyn CoordinateMapper) -> Self
    where
        M: PathProvider + OccupancyMap,
    {
        Self {
            paths: dungeon,
            mapper,
            occupancy: dungeon,
        }
    }
}

pub struct EnemyWorld<'a> {
    pub nav: Navigation<'a>,
    pub audio: &'a mut dyn AudioSink,
    pub hooks: &'a mut dyn EncounterHooks,
    pub player_position: Vec3,
}

// ============================================================================
// Enemy
// ============================================================================

pub struct Enemy<B: PhysicsBody, A: AnimationDriver> {
    settings: EnemySettings,
    proximity: ProximitySettings,
    body: B,
    animation: A,
    rng: StdRng,
    spawn_positions: Vec<Vec3>,

    state: EnemyState,
    move_speed: f32,
    rotation: Quat,
    health: Health,
    is_dead: bool,
    visible: bool,
    has_captured_player: bool,

    current_path: Vec<Vec3>,
    path_index: usize,
    last_path_update: Option<f32>,
    patrol_points: Vec<Vec3>,
    patrol_index: usize,
    wait_started_at: Option<f32>,

    // Seconds since construction
    elapsed: f32,
    flash_timer: Timer,
    respawn_timer: Option<Timer>,
    ambience: Option<EffectId>,
    missing_animations: HashSet<String>,
}

impl<B: PhysicsBody, A: AnimationDriver> Enemy<B, A> {
    pub fn new(
        settings: EnemySettings,
        proximity: ProximitySettings,
        body: B,
        animation: A,
        rng: StdRng,
    ) -> Result<Self, EnemyError> {
        settings.validate()?;
        proximity.validate()?;

        let spawn_positions: Vec<Vec3> = settings.spawn_positions.iter().map(|&p| Vec3::from_array(p)).collect();
        if settings.respawn_enabled && spawn_positions.is_empty() {
            return Err(EnemyError::NoSpawnPositions);
        }

        let mut enemy = Self {
            proximity,
            body,
            animation,
            rng,
            spawn_positions,
            state: EnemyState::Patrol,
            move_speed: settings.patrol_speed,
            rotation: Quat::IDENTITY,
            health: Health::full(settings.max_health),
            is_dead: false,
            visible: true,
            has_captured_player: false,
            current_path: Vec::new(),
            path_index: 0,
            last_path_update: None,
            patrol_points: Vec::new(),
            patrol_index: 0,
            wait_started_at: None,
            elapsed: 0.0,
            flash_timer: Timer::from_seconds(settings.flash_duration, TimerMode::Once),
            respawn_timer: None,
            ambience: None,
            missing_animations: HashSet::new(),
            settings,
        };
        enemy.play_animation(EnemyState::Patrol.animation());
        info!("enemy created at {}", enemy.body.position());
        Ok(enemy)
    }

    // Creates the physics body through the host's world, then the enemy.
    pub fn spawn<W>(
        world: &mut W,
        position: Vec3,
        settings: EnemySettings,
        proximity: ProximitySettings,
        animation: A,
        rng: StdRng,
    ) -> Result<Self, EnemyError>
    where
        W: PhysicsWorld<Body = B>,
    {
        let body = world.create_body(&BodyDesc {
            shape: BodyShape::Cylinder {
                radius: ENEMY_RADIUS,
                height: ENEMY_HEIGHT,
            },
            position,
            mass: ENEMY_MASS,
            collision_group: ENEMY_COLLISION_GROUP,
            collision_mask: ENEMY_COLLISION_MASK,
        });
        Self::new(settings, proximity, body, animation, rng)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub const fn state(&self) -> EnemyState {
        self.state
    }

    #[must_use]
    pub const fn health(&self) -> Health {
        self.health
    }

    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.is_dead
    }

    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    #[must_use]
    pub const fn has_captured_player(&self) -> bool {
        self.has_captured_player
    }

    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.body.position()
    }

    #[must_use]
    pub const fn body(&self) -> &B {
        &self.body
    }

    pub const fn body_mut(&mut self) -> &mut B {
        &mut self.body
    }

    #[must_use]
    pub const fn animation(&self) -> &A {
        &self.animation
    }

    #[must_use]
    pub const fn move_speed(&self) -> f32 {
        self.move_speed
    }

    #[must_use]
    pub const fn rotation(&self) -> Quat {
        self.rotation
    }

    #[must_use]
    pub fn current_path(&self) -> &[Vec3] {
        &self.current_path
    }

    #[must_use]
    pub fn patrol_points(&self) -> &[Vec3] {
        &self.patrol_points
    }

    #[must_use]
    pub const fn patrol_index(&self) -> usize {
        self.patrol_index
    }

    // Time (seconds since creation) the enemy last arrived at a waypoint.
    // Recorded only; patrol does not pause there.
    #[must_use]
    pub const fn wait_started_at(&self) -> Option<f32> {
        self.wait_started_at
    }

    #[must_use]
    pub const fn settings(&self) -> &EnemySettings {
        &self.settings
    }

    #[must_use]
    pub fn spawn_positions(&self) -> &[Vec3] {
        &self.spawn_positions
    }

    // ========================================================================
    // Update
    // ========================================================================

    pub fn update(&mut self, dt: f32, world: &mut EnemyWorld<'_>) {
        if !(dt.is_finite() && dt >= 0.0) {
            warn!("ignoring enemy update with invalid dt {dt}");
            return;
        }
        self.elapsed += dt;
        self.animation.update(dt);

        if self.is_dead {
            self.tick_respawn(dt, world);
            return;
        }

        let distance = if world.player_position.is_finite() {
            self.body.position().distance(world.player_position)
        } else {
            warn!("player position {} is malformed", world.player_position);
            f32::INFINITY
        };

        if self.state == EnemyState::Flashed {
            self.flash_timer.tick(Duration::from_secs_f32(dt));
        }
        if let Some(next) = self.next_state(distance) {
            self.transition(next, &world.nav);
        }
        self.update_ambience(world);

        match self.state {
            EnemyState::Patrol => self.patrol(dt, &world.nav),
            EnemyState::Chase => self.chase(dt, world.player_position, &world.nav),
            EnemyState::Caught => {
                self.halt();
                self.capture_player(&mut *world.hooks);
            }
            EnemyState::Flashed => self.stop_horizontal(),
        }
    }

    fn next_state(&self, distance: f32) -> Option<EnemyState> {
        match self.state {
            EnemyState::Patrol if distance <= self.settings.detection_range => Some(EnemyState::Chase),
            EnemyState::Chase if distance <= self.settings.capture_range => Some(EnemyState::Caught),
            EnemyState::Chase if distance > self.settings.detection_range => Some(EnemyState::Patrol),
            EnemyState::Flashed if self.flash_timer.is_finished() => Some(EnemyState::Patrol),
            _ => None,
        }
    }

    fn transition(&mut self, next: EnemyState, nav: &Navigation<'_>) {
        self.enter_state(next);
        if next == EnemyState::Patrol {
            self.generate_patrol_points(nav);
        }
    }

    fn enter_state(&mut self, next: EnemyState) {
        info!("enemy {} -> {}", self.state.as_str(), next.as_str());
        self.state = next;
        match next {
            EnemyState::Patrol => {
                self.move_speed = self.settings.patrol_speed;
                self.clear_path();
            }
            EnemyState::Chase => {
                self.move_speed = self.settings.chase_speed;
                self.clear_path();
            }
            EnemyState::Caught => {
                self.move_speed = 0.0;
                self.halt();
            }
            EnemyState::Flashed => {
                self.move_speed = 0.0;
                self.flash_timer.reset();
                self.stop_horizontal();
            }
        }
        self.play_animation(next.animation());
    }

    // ========================================================================
    // Patrol & Chase
    // ========================================================================

    fn patrol(&mut self, dt: f32, nav: &Navigation<'_>) {
        if self.patrol_points.is_empty() {
            self.generate_patrol_points(nav);
            self.stop_horizontal();
            return;
        }

        let position = self.body.position();
        let mut waypoint = self.patrol_points[self.patrol_index];
        if horizontal_distance(position, waypoint) <= self.settings.waypoint_reached_distance {
            self.patrol_index = (self.patrol_index + 1) % self.patrol_points.len();
            self.wait_started_at = Some(self.elapsed);
            self.clear_path();
            waypoint = self.patrol_points[self.patrol_index];
            debug!(
                "enemy reached waypoint, heading to {} of {}",
                self.patrol_index + 1,
                self.patrol_points.len()
            );
        }

        if self.path_refresh_due(self.settings.path_update_interval) {
            self.refresh_path(waypoint, true, nav);
        }
        self.follow_path(waypoint, dt, false);
    }

    fn chase(&mut self, dt: f32, player: Vec3, nav: &Navigation<'_>) {
        if self.path_refresh_due(self.settings.path_update_interval * 0.5) {
            self.refresh_path(player, false, nav);
        }
        self.follow_path(player, dt, true);
    }

    // Current room first, then every other room; rooms without patrol points
    // contribute their center.
    fn generate_patrol_points(&mut self, nav: &Navigation<'_>) {
        let position = self.body.position();
        let here = nav.mapper.world_to_grid(position.x, position.z);
        let current = nav.paths.room_at(here);

        let mut cells = current.map(room_patrol_cells).unwrap_or_default();
        let current_id = current.map(|r| r.id.as_str());
        for room in nav.paths.rooms() {
            if Some(room.id.as_str()) != current_id {
                cells.extend(room_patrol_cells(room));
            }
        }

        self.patrol_points = cells
            .into_iter()
            .map(|cell| {
                let (x, z) = nav.mapper.grid_to_world(cell);
                Vec3::new(x, position.y, z)
            })
            .collect();
        self.patrol_index = 0;

        if self.patrol_points.is_empty() {
            debug!("enemy has no rooms to patrol");
        } else {
            debug!("enemy patrol route has {} points", self.patrol_points.len());
        }
    }

    fn path_refresh_due(&self, interval: f32) -> bool {
        self.last_path_update.is_none_or(|at| self.elapsed - at >= interval)
    }

    fn clear_path(&mut self) {
        self.current_path.clear();
        self.path_index = 0;
        self.last_path_update = None;
    }

    fn refresh_path(&mut self, target: Vec3, avoid_occupied: bool, nav: &Navigation<'_>) {
        let position = self.body.position();
        let start = nav.mapper.world_to_grid(position.x, position.z);
        let goal = nav.mapper.world_to_grid(target.x, target.z);
        self.last_path_update = Some(self.elapsed);

        let cells = if avoid_occupied {
            let occupancy = nav.occupancy;
            nav.paths
                .find_path_where(start, goal, &|p: GridPos| !occupancy.is_tile_occupied(p.x, p.z))
        } else {
            nav.paths.find_path(start, goal)
        };

        if let Some(cells) = cells {
            self.current_path = cells
                .into_iter()
                .map(|cell| {
                    let (x, z) = nav.mapper.grid_to_world(cell);
                    Vec3::new(x, position.y, z)
                })
                .collect();
            // The first node is the cell the enemy stands in
            self.path_index = usize::from(self.current_path.len() > 1);
        } else {
            debug!("no path from {start} to {goal}, moving directly");
            self.current_path.clear();
            self.path_index = 0;
        }
    }

    // Steps along the current path, or straight at `fallback` once the path is
    // used up or missing. Axis-aligned steps close one axis at a time.
    fn follow_path(&mut self, fallback: Vec3, dt: f32, axis_aligned: bool) {
        let position = self.body.position();
        if let Some(&node) = self.current_path.get(self.path_index)
            && horizontal_distance(position, node) <= self.settings.waypoint_reached_distance
        {
            self.path_index += 1;
        }

        let target = match self.current_path.get(self.path_index) {
            Some(&node) if axis_aligned => axis_step(position, node),
            Some(&node) => node,
            None => fallback,
        };
        self.move_in_direction(target, dt);
    }

    // Horizontal velocity toward `target`, scaled to the 60 Hz baseline.
    // Vertical velocity is left to physics.
    fn move_in_direction(&mut self, target: Vec3, dt: f32) {
        let position = self.body.position();
        let velocity = self.body.velocity();
        let offset = Vec3::new(target.x - position.x, 0.0, target.z - position.z);
        let Some(direction) = offset.try_normalize() else {
            self.body.set_velocity(Vec3::new(0.0, velocity.y, 0.0));
            return;
        };

        let speed = self.move_speed * dt * FRAME_RATE_BASELINE;
        self.body
            .set_velocity(Vec3::new(direction.x * speed, velocity.y, direction.z * speed));

        let facing = Quat::from_rotation_y(direction.x.atan2(direction.z));
        self.rotation = self.rotation.slerp(facing, self.settings.rotation_factor);
    }

    fn stop_horizontal(&mut self) {
        let velocity = self.body.velocity();
        self.body.set_velocity(Vec3::new(0.0, velocity.y, 0.0));
    }

    fn halt(&mut self) {
        self.body.set_velocity(Vec3::ZERO);
    }

    fn capture_player(&mut self, hooks: &mut dyn EncounterHooks) {
        if self.has_captured_player {
            return;
        }
        self.has_captured_player = true;
        let position = self.body.position();
        info!("enemy captured the player at {position}");
        hooks.player_captured(position);
    }

    // ========================================================================
    // Audio & Animation
    // ========================================================================

    fn update_ambience(&mut self, world: &mut EnemyWorld<'_>) {
        let position = self.body.position();
        let volume = calculate_volume_by_distance(position, world.player_position, &self.proximity);

        match self.ambience {
            Some(id) if volume <= 0.0 => {
                world.audio.stop_effect(id);
                self.ambience = None;
                debug!("enemy ambience stopped");
            }
            Some(id) => world.audio.set_effect_volume(id, volume),
            None if volume > self.settings.ambience_threshold => {
                self.ambience = world.audio.play_effect(AMBIENCE_EFFECT_KEY, position);
                if let Some(id) = self.ambience {
                    world.audio.set_effect_volume(id, volume);
                    debug!("enemy ambience started at volume {volume:.2}");
                }
            }
            None => {}
        }
    }

    fn play_animation(&mut self, name: &str) {
        if !self.animation.transition_to_animation(name) && self.missing_animations.insert(name.to_string()) {
            warn!("enemy animation '{name}' is missing");
        }
    }

    // ========================================================================
    // Combat
    // ========================================================================

    // Stuns the enemy when it is alive, not already holding the player, and in range.
    pub fn flash(&mut self, distance: f32) -> bool {
        if self.is_dead || self.state == EnemyState::Caught {
            return false;
        }
        if !distance.is_finite() || distance > self.settings.flash_range {
            return false;
        }
        self.enter_state(EnemyState::Flashed);
        true
    }

    // A caught enemy holds the player for good and no longer takes damage.
    pub fn handle_hit(&mut self, damage: f32, audio: &mut dyn AudioSink, hooks: &mut dyn EncounterHooks) {
        if self.is_dead || !self.visible || self.state == EnemyState::Caught {
            return;
        }
        if !damage.is_finite() {
            warn!("ignoring hit with malformed damage {damage}");
            return;
        }

        self.health.current = (self.health.current - damage.max(0.0)).max(0.0);
        debug!("enemy hit for {damage}, health {}/{}", self.health.current, self.health.max);
        if self.health.current <= 0.0 {
            self.die(audio, hooks);
        }
    }

    fn die(&mut self, audio: &mut dyn AudioSink, hooks: &mut dyn EncounterHooks) {
        let position = self.body.position();
        info!("enemy died at {position}");
        self.is_dead = true;
        self.visible = false;
        self.move_speed = 0.0;
        self.clear_path();
        self.body.sleep();

        if let Some(id) = self.ambience.take() {
            audio.stop_effect(id);
        }
        hooks.enemy_died(position);
        self.play_animation(DEATH_ANIMATION);

        if self.settings.respawn_enabled {
            self.respawn_timer = Some(Timer::from_seconds(self.settings.respawn_delay, TimerMode::Once));
        }
    }

    fn tick_respawn(&mut self, dt: f32, world: &mut EnemyWorld<'_>) {
        let Some(timer) = self.respawn_timer.as_mut() else {
            return;
        };
        timer.tick(Duration::from_secs_f32(dt));
        if timer.is_finished() {
            self.respawn(world);
        }
    }

    fn respawn(&mut self, world: &mut EnemyWorld<'_>) {
        self.respawn_timer = None;
        if self.spawn_positions.is_empty() {
            warn!("enemy cannot respawn without spawn positions");
            return;
        }

        let position = self.spawn_positions[self.rng.random_range(0..self.spawn_positions.len())];
        self.body.set_position(position);
        self.body.set_velocity(Vec3::ZERO);
        self.body.wake_up();
        self.health.current = self.health.max;
        self.is_dead = false;
        self.visible = true;
        info!("enemy respawned at {position}");

        self.transition(EnemyState::Patrol, &world.nav);
        world.hooks.enemy_respawned(position);
    }
}

fn room_patrol_cells(room: &Room) -> Vec<GridPos> {
    if room.patrol_points.is_empty() {
        vec![room.center]
    } else {
        room.patrol_points.clone()
    }
}

fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    (a.x - b.x).hypot(a.z - b.z)
}

// Moves along whichever axis has the larger remaining offset.
fn axis_step(from: Vec3, to: Vec3) -> Vec3 {
    if (to.x - from.x).abs() > (to.z - from.z).abs() {
        Vec3::new(to.x, from.y, from.z)
    } else {
        Vec3::new(from.x, from.y, to.z)
    }
}

// ============================================================================
// Tests
// ============================================================================
