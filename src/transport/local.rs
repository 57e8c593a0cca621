//! Local subprocess execution on the tokio runtime.

use super::{ExecOutput, ProcessError};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Run `program args...` to completion, collecting all output.
/// With a timeout, the child is killed when it overruns.
pub async fn exec(
    program: &str,
    args: &[String],
    timeout: Option<Duration>,
) -> Result<ExecOutput, ProcessError> {
    log::debug!("spawning {} {:?}", program, args);
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ProcessError::Spawn {
            program: program.to_string(),
            source,
        })?;

    let wait = child.wait_with_output();
    let output = match timeout {
        Some(after) => match tokio::time::timeout(after, wait).await {
            Ok(result) => result,
            Err(_) => {
                log::warn!("{} timed out after {:?}", program, after);
                return Err(ProcessError::TimedOut {
                    program: program.to_string(),
                    after,
                });
            }
        },
        None => wait.await,
    }
    .map_err(|source| ProcessError::Wait {
        program: program.to_string(),
        source,
    })?;

    Ok(ExecOutput {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

/// Start `program args...` without waiting for it. Returns the child's pid.
/// A background thread waits on the child so it is reaped when it exits.
pub fn spawn_detached(program: &str, args: &[String], cwd: Option<&Path>) -> Result<u32, ProcessError> {
    let mut cmd = std::process::Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    let mut child = cmd.spawn().map_err(|source| ProcessError::Spawn {
        program: program.to_string(),
        source,
    })?;
    let pid = child.id();
    log::debug!("detached {} as pid {}", program, pid);
    std::thread::spawn(move || match child.wait() {
        Ok(status) => log::debug!("detached pid {} exited with {}", pid, status),
        Err(e) => log::warn!("failed to reap detached pid {}: {}", pid, e),
    });
    Ok(pid)
}
