//! Boundaries to external state and files.

pub mod config;
pub mod quest_file;
pub mod state_store;
pub mod world;
