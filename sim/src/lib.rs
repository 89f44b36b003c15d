pub mod animation;
pub mod components;
pub mod config;
pub mod constants;
pub mod game;
pub mod resources;
pub mod systems;
