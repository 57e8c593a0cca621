//! SE-021: Result framing between the engine and the host.
//!
//! The engine may print anything to stdout. Its result is the single JSON
//! line between the two markers.

use super::types::{ErrorKind, OperationResult};
use std::io::{self, Write};

pub const RESULT_BEGIN: &str = "<<<SCENECTL_RESULT_BEGIN>>>";
pub const RESULT_END: &str = "<<<SCENECTL_RESULT_END>>>";

/// The framed block for one result, newline-terminated.
pub fn encode(result: &OperationResult) -> String {
    format!("{}\n{}\n{}\n", RESULT_BEGIN, result.to_json(), RESULT_END)
}

/// Write the framed result to stdout and flush.
pub fn emit(result: &OperationResult) -> io::Result<()> {
    let mut out = io::stdout().lock();
    out.write_all(encode(result).as_bytes())?;
    out.flush()
}

/// Text strictly between the first opening marker and the next closing one.
pub fn extract(stdout: &str) -> Option<&str> {
    let start = stdout.find(RESULT_BEGIN)? + RESULT_BEGIN.len();
    let len = stdout[start..].find(RESULT_END)?;
    Some(stdout[start..start + len].trim())
}

/// Recover the engine's result from a finished process.
pub fn decode(exit_code: i32, stdout: &str, stderr: &str) -> OperationResult {
    match extract(stdout).map(serde_json::from_str::<OperationResult>) {
        Some(Ok(result)) => return result,
        Some(Err(e)) => log::warn!("framed result is not valid JSON: {}", e),
        None => log::debug!("no framed result in engine output"),
    }
    fallback(exit_code, stdout, stderr)
}

fn fallback(exit_code: i32, stdout: &str, stderr: &str) -> OperationResult {
    if exit_code == 0 {
        return OperationResult::ok(stdout.trim());
    }
    let stderr = stderr.trim();
    let error = if stderr.is_empty() {
        format!("engine exited with code {}", exit_code)
    } else {
        stderr.to_string()
    };
    OperationResult::failure(ErrorKind::Process, error)
}
