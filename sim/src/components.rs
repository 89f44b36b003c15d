use bevy_ecs::prelude::*;
use engine::{collab::KinematicBody, enemy::Enemy};

use crate::animation::ClipMixer;

#[derive(Component, Debug, Default)]
pub struct EnemyMarker;

// The AI-driven stalker; owns its kinematic body and clip mixer.
#[derive(Component)]
pub struct Stalker(pub Enemy<KinematicBody, ClipMixer>);
