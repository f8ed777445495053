pub mod base_return;
pub mod bot;
pub mod config;
pub mod deviation;
pub mod game_interface;
pub mod movement;
pub mod route_memory;
pub mod scoring;
pub mod selector;
pub mod tick;
