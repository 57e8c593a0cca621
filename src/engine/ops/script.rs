//! Script operations: create a script file, attach one to a node.

use super::{mutate_document, Context};
use crate::core::error::OpError;
use crate::core::types::OperationResult;
use crate::core::{hasher, store};
use crate::engine::params::Params;
use crate::engine::tree;
use crate::engine::variant::Variant;
use serde_json::json;

pub const SCRIPT_EXTENSION: &str = ".gd";
pub const DEFAULT_TEMPLATE: &str = "basic";

/// Script body templates. `{extends}` and `{class_name}` are substituted.
const TEMPLATES: &[(&str, &str, &str)] = &[
    (
        "basic",
        "Node",
        "extends {extends}
{class_name}

# Called when the node enters the scene tree for the first time.
func _ready() -> void:
\tpass


# Called every frame. 'delta' is the elapsed time since the previous frame.
func _process(delta: float) -> void:
\tpass
",
    ),
    ("empty", "Node", "extends {extends}\n{class_name}\n"),
    (
        "character_2d",
        "CharacterBody2D",
        "extends {extends}
{class_name}

const SPEED = 300.0
const JUMP_VELOCITY = -400.0


func _physics_process(delta: float) -> void:
\tif not is_on_floor():
\t\tvelocity += get_gravity() * delta

\tif Input.is_action_just_pressed(\"ui_accept\") and is_on_floor():
\t\tvelocity.y = JUMP_VELOCITY

\tvar direction := Input.get_axis(\"ui_left\", \"ui_right\")
\tif direction:
\t\tvelocity.x = direction * SPEED
\telse:
\t\tvelocity.x = move_toward(velocity.x, 0, SPEED)

\tmove_and_slide()
",
    ),
    (
        "character_3d",
        "CharacterBody3D",
        "extends {extends}
{class_name}

const SPEED = 5.0
const JUMP_VELOCITY = 4.5


func _physics_process(delta: float) -> void:
\tif not is_on_floor():
\t\tvelocity += get_gravity() * delta

\tif Input.is_action_just_pressed(\"ui_accept\") and is_on_floor():
\t\tvelocity.y = JUMP_VELOCITY

\tvar input_dir := Input.get_vector(\"ui_left\", \"ui_right\", \"ui_up\", \"ui_down\")
\tvar direction := (transform.basis * Vector3(input_dir.x, 0, input_dir.y)).normalized()
\tif direction:
\t\tvelocity.x = direction.x * SPEED
\t\tvelocity.z = direction.z * SPEED
\telse:
\t\tvelocity.x = move_toward(velocity.x, 0, SPEED)
\t\tvelocity.z = move_toward(velocity.z, 0, SPEED)

\tmove_and_slide()
",
    ),
];

pub fn template_names() -> Vec<&'static str> {
    TEMPLATES.iter().map(|(name, _, _)| *name).collect()
}

/// Render a template. `extends` falls back to the template's base class.
pub fn render_template(
    template: &str,
    extends: Option<&str>,
    class_name: Option<&str>,
) -> Result<String, OpError> {
    let (_, base, body) = TEMPLATES
        .iter()
        .find(|(name, _, _)| *name == template)
        .ok_or_else(|| {
            OpError::Input(format!(
                "Unknown script template: {} (expected one of: {})",
                template,
                template_names().join(", ")
            ))
        })?;
    let class_line = class_name
        .map(|c| format!("class_name {}\n", c))
        .unwrap_or_default();
    let rendered = body
        .replace("{extends}", extends.unwrap_or(base))
        .replace("{class_name}\n", &class_line)
        .replace("{class_name}", class_line.trim_end());
    Ok(rendered)
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn create_script(ctx: &Context, params: &Params) -> Result<OperationResult, OpError> {
    let script_path = params.required_str("script_path")?;
    let extends = params.optional_str(&["extends"])?;
    let class_name = params.optional_str(&["class_name"])?;
    let content = params.optional_str(&["content"])?;
    let template = params
        .optional_str(&["template"])?
        .unwrap_or(DEFAULT_TEMPLATE);

    if !script_path.ends_with(SCRIPT_EXTENSION) {
        return Err(OpError::Input(format!(
            "Script path must end with {}: {}",
            SCRIPT_EXTENSION, script_path
        )));
    }
    if let Some(c) = class_name.filter(|c| !is_identifier(c)) {
        return Err(OpError::Input(format!("Invalid class_name: {}", c)));
    }

    let text = match content {
        Some(body) => body.to_string(),
        None => render_template(template, extends, class_name)?,
    };
    let path = ctx.resolve(script_path)?;
    let res = ctx.paths.to_res(&path);
    store::write_atomic(&path, &text)
        .map_err(|e| OpError::Io(format!("Failed to write script: {}", e)))?;

    let mut result = OperationResult::ok(format!("Script created at {}", res))
        .with("script_path", json!(res))
        .with("hash", json!(hasher::hash_string(&text)));
    if content.is_none() {
        result = result.with("template", json!(template));
    }
    Ok(result)
}

pub fn attach_script(ctx: &Context, params: &Params) -> Result<OperationResult, OpError> {
    let scene_path = params.required_str("scene_path")?;
    let script_path = params.required_str("script_path")?;
    let node_path = params.optional_str(&["node_path"])?.unwrap_or(".");

    let script_file = ctx.resolve(script_path)?;
    if !script_file.is_file() {
        return Err(OpError::Resolution(format!(
            "Script not found: {}",
            script_path
        )));
    }
    let script_res = ctx.paths.to_res(&script_file);

    mutate_document(ctx, scene_path, |doc| {
        let id = tree::resolve_path(doc, node_path)
            .ok_or_else(|| OpError::Resolution(format!("Node not found: {}", node_path)))?;
        let ext_id = doc.add_ext_resource("Script", &script_res);
        let resolved = doc.path_of(id).unwrap_or_default();
        let node = doc
            .node_mut(id)
            .ok_or_else(|| OpError::Resolution(format!("Node not found: {}", node_path)))?;
        node.properties
            .insert("script".to_string(), Variant::ExtResource(ext_id));
        Ok(
            OperationResult::ok(format!("Attached {} to {}", script_res, resolved))
                .with("node_path", json!(resolved))
                .with("script_path", json!(script_res)),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ErrorKind;
    use crate::engine::ops::{scene, testutil};
    use serde_json::{Map, Value as JsonValue};

    fn run(
        ctx: &Context,
        op: fn(&Context, &Params) -> Result<OperationResult, OpError>,
        v: JsonValue,
    ) -> Result<OperationResult, OpError> {
        let m: Map<String, JsonValue> = serde_json::from_value(v).unwrap();
        op(ctx, &Params::new(&m))
    }

    #[test]
    fn test_se016_basic_template() {
        let text = render_template("basic", Some("Node2D"), Some("Player")).unwrap();
        assert!(text.starts_with("extends Node2D\nclass_name Player\n\n"));
        assert!(text.contains("func _ready() -> void:\n\tpass"));
        assert!(text.contains("func _process(delta: float) -> void:"));
    }

    #[test]
    fn test_se016_templates_without_class_name() {
        assert_eq!(render_template("empty", None, None).unwrap(), "extends Node\n");
        assert_eq!(
            render_template("empty", None, Some("Thing")).unwrap(),
            "extends Node\nclass_name Thing\n"
        );
        let text = render_template("character_2d", None, None).unwrap();
        assert!(text.starts_with("extends CharacterBody2D\n\nconst SPEED"));
        let text = render_template("character_3d", Some("MyBody"), None).unwrap();
        assert!(text.starts_with("extends MyBody\n"));
    }

    #[test]
    fn test_se016_unknown_template() {
        let err = render_template("fancy", None, None).unwrap_err();
        assert!(err.to_string().contains("basic, empty, character_2d, character_3d"));
    }

    #[test]
    fn test_se016_create_script_file() {
        let (dir, ctx) = testutil::project();
        let result = run(
            &ctx,
            create_script,
            json!({"script_path": "res://scripts/player.gd", "extends": "CharacterBody2D", "template": "character_2d"}),
        )
        .unwrap();
        assert_eq!(result.get("script_path").unwrap(), "res://scripts/player.gd");
        let text = std::fs::read_to_string(dir.path().join("scripts/player.gd")).unwrap();
        assert!(text.contains("move_and_slide()"));
    }

    #[test]
    fn test_se016_explicit_content_wins() {
        let (dir, ctx) = testutil::project();
        run(
            &ctx,
            create_script,
            json!({"script_path": "a.gd", "content": "extends Node\n# custom\n", "template": "character_3d"}),
        )
        .unwrap();
        let text = std::fs::read_to_string(dir.path().join("a.gd")).unwrap();
        assert_eq!(text, "extends Node\n# custom\n");
    }

    #[test]
    fn test_se016_create_script_validation() {
        let (_dir, ctx) = testutil::project();
        let err = run(&ctx, create_script, json!({"script_path": "a.txt"})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
        let err = run(&ctx, create_script, json!({"script_path": "a.gd", "class_name": "2Bad"}))
            .unwrap_err();
        assert!(err.to_string().contains("class_name"));
    }

    #[test]
    fn test_se016_attach_script_reuses_resource() {
        let (dir, ctx) = testutil::project();
        run(&ctx, scene::create_scene, json!({"scene_path": "main.tscn"})).unwrap();
        run(
            &ctx,
            scene::add_node,
            json!({"scene_path": "main.tscn", "node_type": "Sprite2D", "node_name": "A"}),
        )
        .unwrap();
        run(&ctx, create_script, json!({"script_path": "a.gd"})).unwrap();
        run(&ctx, attach_script, json!({"scene_path": "main.tscn", "script_path": "a.gd"})).unwrap();
        let attached = run(
            &ctx,
            attach_script,
            json!({"scene_path": "main.tscn", "script_path": "res://a.gd", "node_path": "A"}),
        )
        .unwrap();
        assert_eq!(attached.get("node_path").unwrap(), "A");
        let text = std::fs::read_to_string(dir.path().join("main.tscn")).unwrap();
        assert_eq!(text.matches("[ext_resource").count(), 1);
        assert_eq!(text.matches("script = ExtResource(\"1\")").count(), 2);
        assert!(text.starts_with("[gd_scene load_steps=2 format=3]"));

        let read = run(&ctx, scene::read_scene, json!({"scene_path": "main.tscn"})).unwrap();
        let root = read.get("root").unwrap();
        assert_eq!(root["script"], "res://a.gd");
        assert_eq!(root["children"][0]["script"], "res://a.gd");
    }

    #[test]
    fn test_se016_attach_missing_script() {
        let (_dir, ctx) = testutil::project();
        run(&ctx, scene::create_scene, json!({"scene_path": "main.tscn"})).unwrap();
        let err = run(&ctx, attach_script, json!({"scene_path": "main.tscn", "script_path": "ghost.gd"}))
            .unwrap_err();
        assert_eq!(err.to_string(), "Script not found: ghost.gd");
        assert_eq!(err.kind(), ErrorKind::Resolution);
    }
}
