//! scenectl: headless scene editing over a framed operation protocol.
//!
//! The host (`core::orchestrator`) spawns one engine process per operation
//! and decodes the framed result it prints. The engine (`engine`) parses
//! text scenes, applies the operation and saves atomically.

pub mod cli;
pub mod core;
pub mod engine;
pub mod transport;
