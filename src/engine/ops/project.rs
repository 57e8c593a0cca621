//! Read-only project queries.

use super::Context;
use crate::core::error::OpError;
use crate::core::project::{self, ProjectInfo, SCENE_EXTENSIONS, SCRIPT_EXTENSIONS};
use crate::core::types::OperationResult;
use crate::engine::params::Params;
use serde_json::json;

pub fn get_project_info(ctx: &Context, _params: &Params) -> Result<OperationResult, OpError> {
    let info = ProjectInfo::gather(ctx.paths.root()).map_err(OpError::Io)?;
    let value = serde_json::to_value(&info)
        .map_err(|e| OpError::Io(format!("Failed to serialize project info: {}", e)))?;
    Ok(OperationResult::ok(format!("Project '{}'", info.name)).with("project", value))
}

fn list(ctx: &Context, extensions: &[&str], key: &str, what: &str) -> Result<OperationResult, OpError> {
    let files = project::list_files(ctx.paths.root(), extensions).map_err(OpError::Io)?;
    let count = files.len();
    Ok(OperationResult::ok(format!("Found {} {}", count, what))
        .with(key, json!(files))
        .with("count", json!(count)))
}

pub fn list_scenes(ctx: &Context, _params: &Params) -> Result<OperationResult, OpError> {
    list(ctx, SCENE_EXTENSIONS, "scenes", "scenes")
}

pub fn list_scripts(ctx: &Context, _params: &Params) -> Result<OperationResult, OpError> {
    list(ctx, SCRIPT_EXTENSIONS, "scripts", "scripts")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ops::{scene, script, testutil};
    use serde_json::{Map, Value as JsonValue};

    fn empty() -> Map<String, JsonValue> {
        Map::new()
    }

    #[test]
    fn test_se019_listings_follow_writes() {
        let (_dir, ctx) = testutil::project();
        let p = empty();
        assert_eq!(list_scenes(&ctx, &Params::new(&p)).unwrap().get("count"), Some(&json!(0)));

        for path in ["levels/one.tscn", "main.tscn"] {
            let m: Map<String, JsonValue> =
                serde_json::from_value(json!({"scene_path": path})).unwrap();
            scene::create_scene(&ctx, &Params::new(&m)).unwrap();
        }
        let m: Map<String, JsonValue> =
            serde_json::from_value(json!({"script_path": "player.gd"})).unwrap();
        script::create_script(&ctx, &Params::new(&m)).unwrap();

        let scenes = list_scenes(&ctx, &Params::new(&p)).unwrap();
        assert_eq!(
            scenes.get("scenes").unwrap(),
            &json!(["res://levels/one.tscn", "res://main.tscn"])
        );
        let scripts = list_scripts(&ctx, &Params::new(&p)).unwrap();
        assert_eq!(scripts.get("scripts").unwrap(), &json!(["res://player.gd"]));
        assert_eq!(scripts.get("count"), Some(&json!(1)));
    }

    #[test]
    fn test_se019_project_info() {
        let (_dir, ctx) = testutil::project();
        let p = empty();
        let info = get_project_info(&ctx, &Params::new(&p)).unwrap();
        let project = info.get("project").unwrap();
        assert_eq!(project["name"], "Test");
        assert_eq!(project["config_version"], 5);
        assert_eq!(project["scene_count"], 0);
        assert!(project.get("main_scene").is_none());
    }
}
