//! SE-025: Host-side process orchestration.
//!
//! One engine process per operation. The host checks the project, builds the
//! engine's argument vector, waits for exit under the configured bound and
//! decodes the framed result.

use super::config::HostConfig;
use super::error::OpError;
use super::project::{is_project_dir, PROJECT_FILE};
use super::protocol;
use super::types::{OperationRequest, OperationResult};
use crate::transport::{local, ExecOutput, ProcessError};
use serde_json::{json, Map, Value as JsonValue};
use std::path::Path;

pub struct Orchestrator {
    config: HostConfig,
}

fn check_project(project: &Path) -> Result<(), OpError> {
    if is_project_dir(project) {
        Ok(())
    } else {
        Err(OpError::Input(format!(
            "Not a valid project directory (no {}): {}",
            PROJECT_FILE,
            project.display()
        )))
    }
}

impl Orchestrator {
    pub fn new(config: HostConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// `[extra_args..] --headless --path <project> --script <ops> -- <op> <json>`
    pub fn command_args(&self, project: &Path, request: &OperationRequest) -> Vec<String> {
        let mut args = self.config.extra_args.clone();
        args.extend([
            "--headless".to_string(),
            "--path".to_string(),
            project.display().to_string(),
            "--script".to_string(),
            self.config.operations_script.clone(),
            "--".to_string(),
            request.operation.clone(),
            request.params_json(),
        ]);
        args
    }

    pub async fn execute(
        &self,
        project: &Path,
        operation: &str,
        params: Map<String, JsonValue>,
    ) -> OperationResult {
        self.execute_request(project, &OperationRequest::new(operation, params))
            .await
    }

    pub async fn execute_request(&self, project: &Path, request: &OperationRequest) -> OperationResult {
        if let Err(e) = check_project(project) {
            return e.into();
        }
        let args = self.command_args(project, request);
        match self.raw(&args).await {
            Ok(out) => {
                log::debug!("{} exited with {}", request.operation, out.exit_code);
                protocol::decode(out.exit_code, &out.stdout, &out.stderr)
            }
            Err(e) => OpError::from(e).into(),
        }
    }

    /// Run the engine with arbitrary arguments under the bounded wait.
    pub async fn raw(&self, args: &[String]) -> Result<ExecOutput, ProcessError> {
        local::exec(&self.config.engine_path, args, self.config.timeout()).await
    }

    pub async fn engine_version(&self) -> OperationResult {
        match self.raw(&["--version".to_string()]).await {
            Ok(out) => {
                let result = protocol::decode(out.exit_code, &out.stdout, &out.stderr);
                match result.message.clone() {
                    Some(version) if result.success => result.with("version", json!(version)),
                    _ => result,
                }
            }
            Err(e) => OpError::from(e).into(),
        }
    }

    /// Open the editor on a project. Success means the process started.
    pub fn launch_editor(&self, project: &Path) -> OperationResult {
        let mut args = self.config.extra_args.clone();
        args.extend([
            "-e".to_string(),
            "--path".to_string(),
            project.display().to_string(),
        ]);
        self.detach(project, args, "Editor launched")
    }

    /// Run a project, optionally starting from a specific scene.
    pub fn run_project(&self, project: &Path, scene: Option<&str>) -> OperationResult {
        let mut args = self.config.extra_args.clone();
        args.extend(["--path".to_string(), project.display().to_string()]);
        args.extend(scene.map(str::to_string));
        self.detach(project, args, "Project started")
    }

    fn detach(&self, project: &Path, args: Vec<String>, message: &str) -> OperationResult {
        if let Err(e) = check_project(project) {
            return e.into();
        }
        match local::spawn_detached(&self.config.engine_path, &args, Some(project)) {
            Ok(pid) => OperationResult::ok(message).with("pid", json!(pid)),
            Err(e) => OpError::from(e).into(),
        }
    }
}
