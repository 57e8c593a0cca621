//! End-to-end: the host orchestrator driving the real `scenectl-engine`.

use scenectl::core::config::HostConfig;
use scenectl::core::orchestrator::Orchestrator;
use scenectl::core::project::PROJECT_FILE;
use scenectl::core::protocol;
use scenectl::core::types::ErrorKind;
use serde_json::{json, Map, Value as JsonValue};
use std::path::Path;
use std::process::Command;

fn engine() -> Orchestrator {
    Orchestrator::new(HostConfig {
        engine_path: env!("CARGO_BIN_EXE_scenectl-engine").to_string(),
        timeout_secs: 60,
        ..HostConfig::default()
    })
}

fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(PROJECT_FILE),
        "config_version=5\n\n[application]\n\nconfig/name=\"E2E\"\n",
    )
    .unwrap();
    dir
}

fn params(v: JsonValue) -> Map<String, JsonValue> {
    match v {
        JsonValue::Object(m) => m,
        _ => panic!("params must be an object"),
    }
}

#[tokio::test]
async fn create_then_read_round_trip() {
    let proj = project();
    let o = engine();
    let created = o
        .execute(
            proj.path(),
            "create_scene",
            params(json!({"scene_path": "res://levels/main.tscn", "root_node_type": "Node3D", "root_node_name": "World"})),
        )
        .await;
    assert!(created.success, "{:?}", created.error);

    let added = o
        .execute(
            proj.path(),
            "add_node",
            params(json!({
                "scene_path": "levels/main.tscn",
                "node_type": "MeshInstance3D",
                "node_name": "Floor",
                "properties": {"position": {"_type": "Vector3", "y": -1}}
            })),
        )
        .await;
    assert!(added.success, "{:?}", added.error);

    let read = o
        .execute(proj.path(), "read_scene", params(json!({"scene_path": "levels/main.tscn"})))
        .await;
    assert!(read.success);
    let root = read.get("root").unwrap();
    assert_eq!(root["name"], "World");
    assert_eq!(root["type"], "Node3D");
    assert_eq!(root["children"][0]["path"], "Floor");

    let text = std::fs::read_to_string(proj.path().join("levels/main.tscn")).unwrap();
    assert!(text.contains("position = Vector3(0, -1, 0)"));
}

#[tokio::test]
async fn unknown_operation_is_reported_not_crashed() {
    let proj = project();
    let result = engine().execute(proj.path(), "bogus", Map::new()).await;
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Unknown operation: bogus"));
    assert_eq!(result.error_kind, Some(ErrorKind::Resolution));
}

#[tokio::test]
async fn failures_keep_the_file_untouched() {
    let proj = project();
    let o = engine();
    o.execute(proj.path(), "create_scene", params(json!({"scene_path": "a.tscn"})))
        .await;
    let before = std::fs::read_to_string(proj.path().join("a.tscn")).unwrap();
    let result = o
        .execute(
            proj.path(),
            "remove_node",
            params(json!({"scene_path": "a.tscn", "node_path": "."})),
        )
        .await;
    assert_eq!(result.error.as_deref(), Some("Cannot remove the root node"));
    assert_eq!(result.error_kind, Some(ErrorKind::Input));
    assert_eq!(std::fs::read_to_string(proj.path().join("a.tscn")).unwrap(), before);
}

#[tokio::test]
async fn concurrent_writers_never_tear_the_file() {
    let proj = project();
    let o = std::sync::Arc::new(engine());
    o.execute(proj.path(), "create_scene", params(json!({"scene_path": "shared.tscn"})))
        .await;

    let mut tasks = Vec::new();
    for i in 0..6 {
        let o = o.clone();
        let root = proj.path().to_path_buf();
        tasks.push(tokio::spawn(async move {
            o.execute(
                &root,
                "add_node",
                params(json!({"scene_path": "shared.tscn", "node_type": "Node2D", "node_name": format!("N{}", i)})),
            )
            .await
        }));
    }
    for task in tasks {
        assert!(task.await.unwrap().success);
    }

    let listed = o
        .execute(proj.path(), "list_nodes", params(json!({"scene_path": "shared.tscn"})))
        .await;
    assert!(listed.success, "file must still parse: {:?}", listed.error);
    let count = listed.get("count").and_then(JsonValue::as_u64).unwrap();
    assert!((2..=7).contains(&count), "count was {}", count);
}

fn run_engine(project: &Path, trailing: &[&str]) -> (i32, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_scenectl-engine"))
        .args(["--headless", "--path"])
        .arg(project)
        .args(["--script", "res://ops.gd", "--"])
        .args(trailing)
        .output()
        .unwrap();
    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).to_string(),
    )
}

#[test]
fn engine_exits_zero_and_frames_argument_errors() {
    let proj = project();
    let (code, stdout) = run_engine(proj.path(), &[]);
    assert_eq!(code, 0);
    assert!(stdout.starts_with(protocol::RESULT_BEGIN));
    let result = protocol::decode(code, &stdout, "");
    assert_eq!(result.error.as_deref(), Some("No operation specified"));

    let (code, stdout) = run_engine(proj.path(), &["create_scene", "not json"]);
    assert_eq!(code, 0);
    let result = protocol::decode(code, &stdout, "");
    assert!(result.error.unwrap().starts_with("Failed to parse parameters"));
}

#[tokio::test]
async fn version_comes_from_the_engine() {
    let result = engine().engine_version().await;
    let version = result.get("version").and_then(JsonValue::as_str).unwrap();
    assert!(version.starts_with("scenectl-engine "));
}

#[tokio::test]
async fn project_queries() {
    let proj = project();
    let o = engine();
    o.execute(proj.path(), "create_scene", params(json!({"scene_path": "main.tscn"})))
        .await;
    o.execute(proj.path(), "create_script", params(json!({"script_path": "player.gd", "template": "empty"})))
        .await;
    let info = o.execute(proj.path(), "get_project_info", Map::new()).await;
    let project = info.get("project").unwrap();
    assert_eq!(project["name"], "E2E");
    assert_eq!(project["scene_count"], 1);
    assert_eq!(project["script_count"], 1);
    let scenes = o.execute(proj.path(), "list_scenes", Map::new()).await;
    assert_eq!(scenes.get("scenes"), Some(&json!(["res://main.tscn"])));
}
