//! Scene operations: create, add/remove/modify nodes, read, list.

use super::{mutate_document, read_document, validate_node_name, Context};
use crate::core::error::OpError;
use crate::core::types::OperationResult;
use crate::engine::classdb::{assign_if_exposed, assign_strict};
use crate::engine::document::{DocumentHandle, SceneDocument};
use crate::engine::params::Params;
use crate::engine::tree;
use serde_json::json;

pub const DEFAULT_ROOT_TYPE: &str = "Node2D";
pub const DEFAULT_ROOT_NAME: &str = "root";

pub fn create_scene(ctx: &Context, params: &Params) -> Result<OperationResult, OpError> {
    let scene_path = params.required_str("scene_path")?;
    let root_type = params
        .optional_str(&["root_node_type", "root_type"])?
        .unwrap_or(DEFAULT_ROOT_TYPE);
    let root_name = params
        .optional_str(&["root_node_name", "root_name"])?
        .unwrap_or(DEFAULT_ROOT_NAME);
    validate_node_name(root_name)?;

    let ctor = ctx
        .registry
        .resolve_node(root_type)
        .ok_or_else(|| OpError::Resolution(format!("Invalid root node type: {}", root_type)))?;
    let path = ctx.resolve(scene_path)?;
    let res = ctx.paths.to_res(&path);
    if path.exists() {
        log::debug!("overwriting existing scene {}", res);
    }

    let handle = DocumentHandle::create(&path, SceneDocument::new(ctor.instantiate(root_name)));
    let hash = handle.save()?;
    Ok(OperationResult::ok(format!("Scene created at {}", res))
        .with("scene_path", json!(res))
        .with("root_node_type", json!(root_type))
        .with("root_node_name", json!(root_name))
        .with("hash", json!(hash)))
}

pub fn add_node(ctx: &Context, params: &Params) -> Result<OperationResult, OpError> {
    let scene_path = params.required_str("scene_path")?;
    let node_type = params.required_str("node_type")?;
    let node_name = params.required_str("node_name")?;
    let parent_path = params
        .optional_str(&["parent_node_path", "parent_path"])?
        .unwrap_or(".");
    let properties = params.properties("properties")?;
    validate_node_name(node_name)?;

    mutate_document(ctx, scene_path, |doc| {
        let parent = tree::resolve_path(doc, parent_path)
            .ok_or_else(|| OpError::Resolution(format!("Parent node not found: {}", parent_path)))?;
        let ctor = ctx
            .registry
            .resolve_node(node_type)
            .ok_or_else(|| OpError::Resolution(format!("Invalid node type: {}", node_type)))?;

        let mut node = ctor.instantiate(node_name);
        let mut skipped = Vec::new();
        for (key, value) in properties {
            if !assign_if_exposed(&mut node.properties, ctor.class.name, &key, value)? {
                skipped.push(key);
            }
        }
        let id = doc
            .add_child(parent, node)
            .ok_or_else(|| OpError::Resolution(format!("Parent node not found: {}", parent_path)))?;
        let node_path = doc.path_of(id).unwrap_or_default();
        let final_name = doc.node(id).map(|n| n.name.clone()).unwrap_or_default();

        let mut result = OperationResult::ok(format!(
            "Added {} node '{}' at {}",
            node_type, final_name, node_path
        ))
        .with("node_path", json!(node_path))
        .with("node_name", json!(final_name));
        if !skipped.is_empty() {
            result = result.with("skipped_properties", json!(skipped));
        }
        Ok(result)
    })
}

pub fn remove_node(ctx: &Context, params: &Params) -> Result<OperationResult, OpError> {
    let scene_path = params.required_str("scene_path")?;
    let node_path = params.required_str("node_path")?;

    mutate_document(ctx, scene_path, |doc| {
        let id = tree::resolve_path(doc, node_path)
            .ok_or_else(|| OpError::Resolution(format!("Node not found: {}", node_path)))?;
        if id == doc.root() {
            return Err(OpError::Input("Cannot remove the root node".to_string()));
        }
        let removed = doc.path_of(id).unwrap_or_default();
        doc.remove_subtree(id);
        Ok(OperationResult::ok(format!("Removed node {}", removed))
            .with("node_path", json!(removed)))
    })
}

pub fn modify_node(ctx: &Context, params: &Params) -> Result<OperationResult, OpError> {
    let scene_path = params.required_str("scene_path")?;
    let node_path = params.required_str("node_path")?;
    let properties = params.properties("properties")?;

    mutate_document(ctx, scene_path, |doc| {
        let id = tree::resolve_path(doc, node_path)
            .ok_or_else(|| OpError::Resolution(format!("Node not found: {}", node_path)))?;
        let resolved = doc.path_of(id).unwrap_or_default();
        let node = doc
            .node_mut(id)
            .ok_or_else(|| OpError::Resolution(format!("Node not found: {}", node_path)))?;
        let class = node.class_name().to_string();
        let mut modified = Vec::with_capacity(properties.len());
        for (key, value) in properties {
            assign_strict(&mut node.properties, &class, &key, value)?;
            modified.push(key);
        }
        Ok(OperationResult::ok(format!(
            "Modified {} properties on {}",
            modified.len(),
            resolved
        ))
        .with("node_path", json!(resolved))
        .with("modified_properties", json!(modified)))
    })
}

pub fn read_scene(ctx: &Context, params: &Params) -> Result<OperationResult, OpError> {
    let scene_path = params.required_str("scene_path")?;
    read_document(ctx, scene_path, |doc| {
        let root = tree::serialize(doc, doc.root())
            .ok_or_else(|| OpError::Io(format!("Scene has no root: {}", scene_path)))?;
        let value = serde_json::to_value(&root)
            .map_err(|e| OpError::Io(format!("Failed to serialize scene: {}", e)))?;
        Ok(OperationResult::ok(format!("Read scene {}", scene_path)).with("root", value))
    })
}

pub fn list_nodes(ctx: &Context, params: &Params) -> Result<OperationResult, OpError> {
    let scene_path = params.required_str("scene_path")?;
    read_document(ctx, scene_path, |doc| {
        let entries = tree::list_paths(doc);
        let count = entries.len();
        let value = serde_json::to_value(&entries)
            .map_err(|e| OpError::Io(format!("Failed to serialize node list: {}", e)))?;
        Ok(OperationResult::ok(format!("Found {} nodes", count))
            .with("nodes", value)
            .with("count", json!(count)))
    })
}
