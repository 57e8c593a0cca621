//! scenectl: drive headless scene edits from the command line.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "scenectl",
    version,
    about = "Create and edit scenes, scripts, animations and resources through a headless engine"
)]
struct Cli {
    #[command(subcommand)]
    command: scenectl::cli::Commands,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    if let Err(e) = scenectl::cli::dispatch(cli.command) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
