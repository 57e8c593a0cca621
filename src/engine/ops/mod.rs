//! Operation implementations and the load → mutate → save plumbing they share.

pub mod animation;
pub mod project;
pub mod resource;
pub mod scene;
pub mod script;

use super::classdb::TypeRegistry;
use super::document::{DocumentHandle, SceneDocument};
use crate::core::error::OpError;
use crate::core::project::ProjectPaths;
use crate::core::types::OperationResult;
use regex::Regex;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Characters a node name may not contain.
static INVALID_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[.:@/"%]"#).expect("Invalid regex"));

/// Everything an operation needs besides its parameters.
pub struct Context {
    pub paths: ProjectPaths,
    pub registry: TypeRegistry,
}

impl Context {
    pub fn new(project_root: &Path) -> Self {
        Self {
            paths: ProjectPaths::new(project_root),
            registry: TypeRegistry::new(),
        }
    }

    /// Filesystem path for a project path; escapes are input errors.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, OpError> {
        self.paths.resolve(path).map_err(OpError::Input)
    }
}

pub fn validate_node_name(name: &str) -> Result<(), OpError> {
    let invalid = name.trim().is_empty() || INVALID_NAME_RE.is_match(name);
    if invalid {
        return Err(OpError::Input(format!(
            "Invalid node name '{}': names must be non-empty and may not contain . : @ / \" %",
            name
        )));
    }
    Ok(())
}

/// Load a scene, run `mutate`, then save on success or discard on failure.
/// The saved file's hash is attached to the result.
pub fn mutate_document<F>(ctx: &Context, scene_path: &str, mutate: F) -> Result<OperationResult, OpError>
where
    F: FnOnce(&mut SceneDocument) -> Result<OperationResult, OpError>,
{
    let path = ctx.resolve(scene_path)?;
    let mut handle = DocumentHandle::load(&path, scene_path)?;
    match mutate(handle.doc_mut()) {
        Ok(result) => {
            let hash = handle.save()?;
            Ok(result.with("hash", json!(hash)))
        }
        Err(e) => {
            handle.discard();
            Err(e)
        }
    }
}

/// Load a scene, run `read`, and always discard.
pub fn read_document<F>(ctx: &Context, scene_path: &str, read: F) -> Result<OperationResult, OpError>
where
    F: FnOnce(&SceneDocument) -> Result<OperationResult, OpError>,
{
    let path = ctx.resolve(scene_path)?;
    let handle = DocumentHandle::load(&path, scene_path)?;
    let hash = handle.loaded_hash().map(str::to_string);
    let outcome = read(handle.doc());
    handle.discard();
    outcome.map(|r| match hash {
        Some(h) => r.with("hash", json!(h)),
        None => r,
    })
}
