use bevy_ecs::prelude::*;
use bevy_math::Vec3;
use bevy_time::Time;
use engine::collab::{CoordinateMapper, PhysicsBody};

use crate::{
    components::Stalker,
    resources::{DungeonRes, MapperRes},
};

// ============================================================================
// Physics Step System
// ============================================================================

// Integrates enemy velocity against the walkable grid. A blocked move keeps
// whichever single axis still lands on floor, otherwise the body stops.
pub fn physics_step_system(
    time: Res<Time>,
    dungeon: Res<DungeonRes>,
    mapper: Res<MapperRes>,
    mut stalkers: Query<&mut Stalker>,
) {
    let delta = time.delta_secs();
    let walkable = |p: Vec3| {
        let cell = mapper.0.world_to_grid(p.x, p.z);
        dungeon.manager.is_walkable(cell.x, cell.z)
    };

    for mut stalker in &mut stalkers {
        let body = stalker.0.body_mut();
        if body.is_sleeping() {
            continue;
        }

        let pos = body.position();
        let next = body.predicted_position(delta);
        if walkable(next) {
            body.step(delta);
            continue;
        }

        let slide_x = Vec3::new(next.x, next.y, pos.z);
        let slide_z = Vec3::new(pos.x, next.y, next.z);
        let velocity = body.velocity();
        if walkable(slide_x) {
            body.set_position(slide_x);
            body.set_velocity(Vec3::new(velocity.x, velocity.y, 0.0));
        } else if walkable(slide_z) {
            body.set_position(slide_z);
            body.set_velocity(Vec3::new(0.0, velocity.y, velocity.z));
        } else {
            body.set_velocity(Vec3::new(0.0, velocity.y, 0.0));
        }
    }
}
