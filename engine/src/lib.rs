pub mod collab;
pub mod config;
pub mod constants;
pub mod digger;
pub mod enemy;
pub mod error;
pub mod generator;
pub mod grid;
pub mod manager;
pub mod pathfinding;
pub mod proximity;
pub mod rooms;
