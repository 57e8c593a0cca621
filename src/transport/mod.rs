//! SE-023: Process transport for the engine subprocess.

pub mod local;

use crate::core::error::OpError;
use std::time::Duration;

/// Output from running the engine to completion.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed waiting for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{} did not finish within {}s and was killed", .program, .after.as_secs())]
    TimedOut { program: String, after: Duration },
}

impl From<ProcessError> for OpError {
    fn from(e: ProcessError) -> Self {
        OpError::Process(e.to_string())
    }
}
