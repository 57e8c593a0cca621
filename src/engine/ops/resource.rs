//! `create_resource`: write a standalone `.tres` file.

use super::Context;
use crate::core::error::OpError;
use crate::core::types::OperationResult;
use crate::core::{hasher, store};
use crate::engine::classdb::assign_if_exposed;
use crate::engine::document::ResourceDocument;
use crate::engine::params::Params;
use indexmap::IndexMap;
use serde_json::json;

pub const RESOURCE_EXTENSION: &str = ".tres";

pub fn create_resource(ctx: &Context, params: &Params) -> Result<OperationResult, OpError> {
    let resource_path = params.required_str("resource_path")?;
    let resource_type = params.required_str("resource_type")?;
    let properties = params.properties("properties")?;

    if !resource_path.ends_with(RESOURCE_EXTENSION) {
        return Err(OpError::Input(format!(
            "Resource path must end with {}: {}",
            RESOURCE_EXTENSION, resource_path
        )));
    }
    let ctor = ctx.registry.resolve_resource(resource_type).ok_or_else(|| {
        OpError::Resolution(format!("Invalid resource type: {}", resource_type))
    })?;

    let mut assigned = IndexMap::new();
    let mut skipped = Vec::new();
    for (key, value) in properties {
        if !assign_if_exposed(&mut assigned, ctor.type_name(), &key, value)? {
            skipped.push(key);
        }
    }

    let path = ctx.resolve(resource_path)?;
    let res = ctx.paths.to_res(&path);
    let text = ResourceDocument::new(ctor.type_name(), assigned).to_text();
    store::write_atomic(&path, &text)
        .map_err(|e| OpError::Io(format!("Failed to save resource: {}", e)))?;
    log::debug!("wrote {} resource to {}", ctor.type_name(), res);

    let mut result = OperationResult::ok(format!("Resource created at {}", res))
        .with("resource_path", json!(res))
        .with("resource_type", json!(ctor.type_name()))
        .with("hash", json!(hasher::hash_string(&text)));
    if !skipped.is_empty() {
        result = result.with("skipped_properties", json!(skipped));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ErrorKind;
    use crate::engine::ops::testutil;
    use crate::engine::variant::{Variant, Vector2};
    use serde_json::{Map, Value as JsonValue};

    fn run(ctx: &Context, v: JsonValue) -> Result<OperationResult, OpError> {
        let m: Map<String, JsonValue> = serde_json::from_value(v).unwrap();
        create_resource(ctx, &Params::new(&m))
    }

    #[test]
    fn test_se018_create_shape_resource() {
        let (dir, ctx) = testutil::project();
        let result = run(
            &ctx,
            json!({
                "resource_path": "res://shapes/box.tres",
                "resource_type": "RectangleShape2D",
                "properties": {"size": {"_type": "Vector2", "x": 32, "y": 16}, "nonsense": true}
            }),
        )
        .unwrap();
        assert_eq!(result.get("resource_path").unwrap(), "res://shapes/box.tres");
        assert_eq!(result.get("skipped_properties").unwrap(), &json!(["nonsense"]));
        let text = std::fs::read_to_string(dir.path().join("shapes/box.tres")).unwrap();
        assert_eq!(
            text,
            "[gd_resource type=\"RectangleShape2D\" format=3]\n\n[resource]\nsize = Vector2(32, 16)\n"
        );
        let doc = ResourceDocument::parse(&text).unwrap();
        assert_eq!(
            doc.properties["size"],
            Variant::Vector2(Vector2 { x: 32.0, y: 16.0 })
        );
        assert_eq!(
            result.get("hash").unwrap(),
            &json!(hasher::hash_string(&text))
        );
    }

    #[test]
    fn test_se018_rejects_node_types_and_unknowns() {
        let (dir, ctx) = testutil::project();
        for bad in ["Sprite2D", "Shape2D", "Bogus"] {
            let err = run(&ctx, json!({"resource_path": "r.tres", "resource_type": bad})).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Resolution);
            assert_eq!(err.to_string(), format!("Invalid resource type: {}", bad));
        }
        assert!(!dir.path().join("r.tres").exists());
    }

    #[test]
    fn test_se018_type_mismatch_and_extension() {
        let (_dir, ctx) = testutil::project();
        let err = run(
            &ctx,
            json!({"resource_path": "c.tres", "resource_type": "CircleShape2D", "properties": {"radius": "big"}}),
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("Type mismatch for property 'radius'"));
        let err = run(&ctx, json!({"resource_path": "c.txt", "resource_type": "CircleShape2D"})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
    }
}
