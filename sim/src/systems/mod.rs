pub mod enemy;
pub mod physics;
pub mod players;

pub use enemy::enemy_update_system;
pub use physics::physics_step_system;
pub use players::{player_actions_system, player_movement_system, tick_counter_system};
