//! SE-006: Node descriptors, path resolution and path listing.

use super::document::{NodeId, SceneDocument};
use super::variant::Variant;
use serde::{Deserialize, Serialize};

/// Serializable view of one node and its subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub path: String,
    pub children: Vec<NodeDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
}

/// One row of a flat node listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub name: String,
}

/// Reported type of a node; instanced nodes report the scene they instance.
fn type_label(doc: &SceneDocument, id: NodeId) -> String {
    let Some(node) = doc.node(id) else {
        return String::new();
    };
    if let Some(t) = &node.type_name {
        return t.clone();
    }
    match node.extra.get("instance") {
        Some(Variant::ExtResource(ext)) => doc
            .ext_resource(ext)
            .map(|r| format!("Instance({})", r.path))
            .unwrap_or_else(|| "Instance".to_string()),
        _ => "Node".to_string(),
    }
}

/// Path of the attached script, if the node has one.
fn script_path(doc: &SceneDocument, id: NodeId) -> Option<String> {
    match doc.node(id)?.properties.get("script")? {
        Variant::ExtResource(ext) => doc.ext_resource(ext).map(|r| r.path.clone()),
        Variant::String(path) => Some(path.clone()),
        _ => None,
    }
}

/// Describe `id` and its subtree, children in order, paths recomputed.
pub fn serialize(doc: &SceneDocument, id: NodeId) -> Option<NodeDescriptor> {
    let node = doc.node(id)?;
    Some(NodeDescriptor {
        name: node.name.clone(),
        type_name: type_label(doc, id),
        path: doc.path_of(id)?,
        children: doc
            .children(id)
            .iter()
            .filter_map(|&c| serialize(doc, c))
            .collect(),
        script: script_path(doc, id),
    })
}

/// Resolve a node path relative to the root. `"."` and `""` are the root;
/// a leading `./` is accepted; `.` segments are skipped and `..` moves to
/// the parent, failing above the root.
pub fn resolve_path(doc: &SceneDocument, path: &str) -> Option<NodeId> {
    let path = path.trim();
    let mut current = doc.root();
    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => current = doc.parent(current)?,
            name => current = doc.find_child(current, name)?,
        }
    }
    Some(current)
}

/// Every node in pre-order, root first as `"."`.
pub fn list_paths(doc: &SceneDocument) -> Vec<PathEntry> {
    doc.pre_order()
        .into_iter()
        .filter_map(|id| {
            let node = doc.node(id)?;
            Some(PathEntry {
                path: doc.path_of(id)?,
                type_name: type_label(doc, id),
                name: node.name.clone(),
            })
        })
        .collect()
}
