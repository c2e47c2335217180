// Public API for the terminal client and integration tests

pub mod client;
pub mod config;
pub mod game;
pub mod services;
pub mod session;
pub mod types;
pub mod view;
