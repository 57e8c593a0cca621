//! scenectl-engine: the batch-mode side of the operation protocol.
//! Logs go to stderr; stdout carries the framed result.

use clap::Parser;
use scenectl::engine::entry::{self, EngineArgs};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();
    let args = EngineArgs::parse();
    std::process::exit(entry::run(args));
}
