//! Host-side logic and the types shared with the engine.

pub mod config;
pub mod error;
pub mod hasher;
pub mod orchestrator;
pub mod project;
pub mod protocol;
pub mod store;
pub mod types;
