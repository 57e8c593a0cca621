//! Command line of the engine binary.
//!
//! Accepts the same shape a batch-mode engine host does:
//! `--headless --path <project> --script <entry> -- <operation> <params-json>`.

use super::dispatcher::Dispatcher;
use crate::core::error::OpError;
use crate::core::project::{is_project_dir, PROJECT_FILE};
use crate::core::protocol;
use crate::core::types::{OperationRequest, OperationResult};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "scenectl-engine",
    version,
    about = "Headless scene-mutation engine driven by scenectl"
)]
pub struct EngineArgs {
    /// Run without a display (always the case; accepted for compatibility)
    #[arg(long)]
    pub headless: bool,

    /// Project directory
    #[arg(long, default_value = ".")]
    pub path: PathBuf,

    /// Operations entry script (accepted for compatibility)
    #[arg(long)]
    pub script: Option<String>,

    /// Editor mode (accepted, ignored)
    #[arg(short = 'e', long)]
    pub editor: bool,

    /// `<operation> [params-json]`
    #[arg(last = true)]
    pub rest: Vec<String>,
}

/// Build the request from the trailing arguments and run it.
pub fn execute(args: &EngineArgs) -> OperationResult {
    if !is_project_dir(&args.path) {
        return OpError::Input(format!(
            "Not a valid project directory (no {}): {}",
            PROJECT_FILE,
            args.path.display()
        ))
        .into();
    }
    let operation = args.rest.first().map(String::as_str);
    let params = args.rest.get(1).map(String::as_str);
    if args.rest.len() > 2 {
        log::warn!("ignoring {} extra trailing arguments", args.rest.len() - 2);
    }
    match OperationRequest::from_args(operation, params) {
        Ok(request) => Dispatcher::new(&args.path).dispatch(&request),
        Err(e) => e.into(),
    }
}

/// Entry point of the binary. Operation failures are reported in the framed
/// result and still exit 0; only a failure to write the result exits 1.
pub fn run(args: EngineArgs) -> i32 {
    if args.script.is_none() {
        log::debug!("no --script given");
    }
    let result = execute(&args);
    match protocol::emit(&result) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("error: failed to write result: {}", e);
            1
        }
    }
}
