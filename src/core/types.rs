//! SE-010: Request and result types shared by both sides of the protocol.
//!
//! The host serializes an `OperationRequest` into the engine's argument
//! vector; the engine answers with one framed `OperationResult`.

use super::error::OpError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Operations
// ============================================================================

/// Every operation the engine side understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateScene,
    AddNode,
    RemoveNode,
    ModifyNode,
    ReadScene,
    ListNodes,
    CreateScript,
    AttachScript,
    CreateAnimation,
    AddAnimationTrack,
    CreateResource,
    GetProjectInfo,
    ListScenes,
    ListScripts,
}

impl Operation {
    pub const ALL: [Operation; 14] = [
        Self::CreateScene,
        Self::AddNode,
        Self::RemoveNode,
        Self::ModifyNode,
        Self::ReadScene,
        Self::ListNodes,
        Self::CreateScript,
        Self::AttachScript,
        Self::CreateAnimation,
        Self::AddAnimationTrack,
        Self::CreateResource,
        Self::GetProjectInfo,
        Self::ListScenes,
        Self::ListScripts,
    ];

    /// Wire name (`create_scene`).
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateScene => "create_scene",
            Self::AddNode => "add_node",
            Self::RemoveNode => "remove_node",
            Self::ModifyNode => "modify_node",
            Self::ReadScene => "read_scene",
            Self::ListNodes => "list_nodes",
            Self::CreateScript => "create_script",
            Self::AttachScript => "attach_script",
            Self::CreateAnimation => "create_animation",
            Self::AddAnimationTrack => "add_animation_track",
            Self::CreateResource => "create_resource",
            Self::GetProjectInfo => "get_project_info",
            Self::ListScenes => "list_scenes",
            Self::ListScripts => "list_scripts",
        }
    }

    /// Required parameters, in the order they are documented.
    pub fn required_params(&self) -> &'static [&'static str] {
        match self {
            Self::CreateScene | Self::ReadScene | Self::ListNodes => &["scene_path"],
            Self::AddNode => &["scene_path", "node_type", "node_name"],
            Self::RemoveNode => &["scene_path", "node_path"],
            Self::ModifyNode => &["scene_path", "node_path", "properties"],
            Self::CreateScript => &["script_path"],
            Self::AttachScript => &["scene_path", "script_path"],
            Self::CreateAnimation => &["scene_path"],
            Self::AddAnimationTrack => &[
                "scene_path",
                "animation_player_path",
                "animation_name",
                "target_node_path",
                "property",
                "keyframes",
            ],
            Self::CreateResource => &["resource_path", "resource_type"],
            Self::GetProjectInfo | Self::ListScenes | Self::ListScripts => &[],
        }
    }

    /// Whether a successful run writes a document.
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            Self::ReadScene
                | Self::ListNodes
                | Self::GetProjectInfo
                | Self::ListScenes
                | Self::ListScripts
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Operation {
    type Err = OpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.name() == s)
            .ok_or_else(|| OpError::Resolution(format!("Unknown operation: {}", s)))
    }
}

// ============================================================================
// Request
// ============================================================================

/// One operation invocation. Built once from the two positional arguments
/// that follow `--`, consumed once by the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRequest {
    pub operation: String,
    #[serde(default)]
    pub params: Map<String, JsonValue>,
}

impl OperationRequest {
    pub fn new(operation: &str, params: Map<String, JsonValue>) -> Self {
        Self {
            operation: operation.to_string(),
            params,
        }
    }

    /// Build from the raw trailing arguments. A missing parameter argument
    /// means an empty parameter object.
    pub fn from_args(operation: Option<&str>, params: Option<&str>) -> Result<Self, OpError> {
        let operation = operation
            .filter(|op| !op.trim().is_empty())
            .ok_or_else(|| OpError::Input("No operation specified".to_string()))?;
        let params = match params {
            None => Map::new(),
            Some(raw) => match serde_json::from_str::<JsonValue>(raw) {
                Ok(JsonValue::Object(map)) => map,
                Ok(other) => {
                    return Err(OpError::Input(format!(
                        "Failed to parse parameters: expected a JSON object, got {}",
                        json_kind(&other)
                    )))
                }
                Err(e) => {
                    return Err(OpError::Input(format!(
                        "Failed to parse parameters: {}",
                        e
                    )))
                }
            },
        };
        Ok(Self::new(operation, params))
    }

    /// The serialized parameter object placed on the command line.
    pub fn params_json(&self) -> String {
        JsonValue::Object(self.params.clone()).to_string()
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

// ============================================================================
// Result
// ============================================================================

/// Failure taxonomy reported on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or missing parameters.
    Input,
    /// An operation, path, type or animation that does not resolve.
    Resolution,
    /// Load or save failure.
    Io,
    /// Spawn, wait or exit failure of the engine process.
    Process,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Input => "input",
            Self::Resolution => "resolution",
            Self::Io => "io",
            Self::Process => "process",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of one operation. Exactly one of `message` / `error` is set;
/// operation-specific fields are flattened into the same object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,

    #[serde(flatten)]
    pub data: Map<String, JsonValue>,
}

impl OperationResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
            error_kind: None,
            data: Map::new(),
        }
    }

    pub fn failure(kind: ErrorKind, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            error_kind: Some(kind),
            data: Map::new(),
        }
    }

    /// Attach an operation-specific field.
    pub fn with(mut self, key: &str, value: JsonValue) -> Self {
        self.data.insert(key.to_string(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.data.get(key)
    }

    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or_else(|e| {
            serde_json::json!({
                "success": false,
                "error": format!("failed to serialize result: {}", e),
                "error_kind": "process",
            })
        })
    }
}

impl From<OpError> for OperationResult {
    fn from(e: OpError) -> Self {
        Self::failure(e.kind(), e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_se010_operation_names_roundtrip() {
        for op in Operation::ALL {
            assert_eq!(op.name().parse::<Operation>().unwrap(), op);
        }
    }

    #[test]
    fn test_se010_unknown_operation() {
        let err = "frobnicate".parse::<Operation>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown operation: frobnicate");
        assert_eq!(err.kind(), ErrorKind::Resolution);
    }

    #[test]
    fn test_se010_mutating_split() {
        assert!(Operation::AddNode.is_mutating());
        assert!(Operation::CreateScript.is_mutating());
        assert!(!Operation::ReadScene.is_mutating());
        assert!(!Operation::ListScenes.is_mutating());
    }

    #[test]
    fn test_se010_request_from_args() {
        let req = OperationRequest::from_args(Some("read_scene"), Some(r#"{"scene_path":"a.tscn"}"#))
            .unwrap();
        assert_eq!(req.operation, "read_scene");
        assert_eq!(req.params["scene_path"], json!("a.tscn"));
    }

    #[test]
    fn test_se010_request_without_params() {
        let req = OperationRequest::from_args(Some("list_scenes"), None).unwrap();
        assert!(req.params.is_empty());
        assert_eq!(req.params_json(), "{}");
    }

    #[test]
    fn test_se010_request_missing_operation() {
        let err = OperationRequest::from_args(None, None).unwrap_err();
        assert_eq!(err.to_string(), "No operation specified");
    }

    #[test]
    fn test_se010_request_bad_params() {
        let err = OperationRequest::from_args(Some("add_node"), Some("{not json")).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse parameters:"));
        let err = OperationRequest::from_args(Some("add_node"), Some("[1, 2]")).unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_se010_result_flattens_fields() {
        let result = OperationResult::ok("Scene read").with("nodes", json!(3));
        let v = result.to_json();
        assert_eq!(v, json!({"success": true, "message": "Scene read", "nodes": 3}));
        let back: OperationResult = serde_json::from_value(v).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn test_se010_failure_shape() {
        let result: OperationResult = OpError::Resolution("Node not found: X".into()).into();
        let v = result.to_json();
        assert_eq!(
            v,
            json!({"success": false, "error": "Node not found: X", "error_kind": "resolution"})
        );
    }
}
