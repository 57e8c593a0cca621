//! SE-005: Scene and resource documents.
//!
//! A `SceneDocument` is a node arena with exactly one root, plus the
//! external and embedded resources the nodes reference. Sections the model
//! does not interpret (connections, editable paths) are carried through
//! untouched. A `DocumentHandle` owns one document for the lifetime of one
//! operation and must be consumed by `save` or `discard`.

use super::tscn::{self, FormatError, Section};
use super::variant::Variant;
use crate::core::error::OpError;
use crate::core::{hasher, store};
use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};

pub type NodeId = usize;

/// Text format version written in headers.
pub const FORMAT_VERSION: i64 = 3;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("{0}")]
    Structure(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    /// Absent for nodes that instance another scene.
    pub type_name: Option<String>,
    /// Header attributes other than name, type and parent.
    pub extra: IndexMap<String, Variant>,
    pub properties: IndexMap<String, Variant>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneNode {
    pub fn new(name: &str, type_name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: Some(type_name.to_string()),
            extra: IndexMap::new(),
            properties: IndexMap::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Class used for property checks; empty for instanced nodes.
    pub fn class_name(&self) -> &str {
        self.type_name.as_deref().unwrap_or("")
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtResource {
    pub id: String,
    pub type_name: String,
    pub path: String,
    pub extra: IndexMap<String, Variant>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubResource {
    pub id: String,
    pub type_name: String,
    pub properties: IndexMap<String, Variant>,
}

#[derive(Debug, Clone)]
pub struct SceneDocument {
    header: IndexMap<String, Variant>,
    nodes: Vec<Option<SceneNode>>,
    root: NodeId,
    ext_resources: Vec<ExtResource>,
    sub_resources: Vec<SubResource>,
    trailing: Vec<Section>,
}

fn id_attr(section: &Section) -> Option<String> {
    match section.attrs.get("id")? {
        Variant::String(s) => Some(s.clone()),
        Variant::Int(i) => Some(i.to_string()),
        _ => None,
    }
}

fn without(attrs: &IndexMap<String, Variant>, skip: &[&str]) -> IndexMap<String, Variant> {
    attrs
        .iter()
        .filter(|(k, _)| !skip.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Collect every sub-resource id referenced by a value.
fn collect_sub_refs(value: &Variant, out: &mut Vec<String>) {
    match value {
        Variant::SubResource(id) => out.push(id.clone()),
        Variant::Array(items) | Variant::Constructor { args: items, .. } => {
            items.iter().for_each(|v| collect_sub_refs(v, out))
        }
        Variant::Dictionary(map) => map.values().for_each(|v| collect_sub_refs(v, out)),
        _ => {}
    }
}

impl SceneDocument {
    pub fn new(root: SceneNode) -> Self {
        let mut header = IndexMap::new();
        header.insert("format".to_string(), Variant::Int(FORMAT_VERSION));
        Self {
            header,
            nodes: vec![Some(root)],
            root: 0,
            ext_resources: Vec::new(),
            sub_resources: Vec::new(),
            trailing: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id).and_then(Option::as_ref)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id).and_then(Option::as_mut)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(SceneNode::parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(SceneNode::children).unwrap_or(&[])
    }

    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&c| self.node(c).is_some_and(|n| n.name == name))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    /// `name` if no sibling uses it, otherwise `name` plus the lowest free
    /// integer suffix starting at 2.
    pub fn unique_child_name(&self, parent: NodeId, name: &str) -> String {
        if self.find_child(parent, name).is_none() {
            return name.to_string();
        }
        let mut n = 2u64;
        loop {
            let candidate = format!("{}{}", name, n);
            if self.find_child(parent, &candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }

    /// Attach `node` as the last child of `parent`, renaming it if a sibling
    /// already uses its name. Returns None if `parent` does not exist.
    pub fn add_child(&mut self, parent: NodeId, mut node: SceneNode) -> Option<NodeId> {
        self.node(parent)?;
        node.name = self.unique_child_name(parent, &node.name);
        node.parent = Some(parent);
        node.children.clear();
        let id = self.nodes.len();
        self.nodes.push(Some(node));
        if let Some(p) = self.node_mut(parent) {
            p.children.push(id);
        }
        Some(id)
    }

    /// Remove a node and all its descendants. The root cannot be removed.
    /// Connections from or to a removed node are dropped with it.
    pub fn remove_subtree(&mut self, id: NodeId) -> bool {
        if id == self.root || self.node(id).is_none() {
            return false;
        }
        let Some(removed_path) = self.path_of(id) else {
            return false;
        };
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(current).and_then(Option::take) {
                stack.extend(node.children);
            }
        }
        for node in self.nodes.iter_mut().flatten() {
            node.children.retain(|&c| c != id);
        }
        let prefix = format!("{}/", removed_path);
        let touches = |p: Option<&str>| p.is_some_and(|p| p == removed_path || p.starts_with(&prefix));
        self.trailing.retain(|s| {
            s.tag != "connection" || !(touches(s.attr_str("from")) || touches(s.attr_str("to")))
        });
        true
    }

    /// Path relative to the root; the root itself is `"."`.
    pub fn path_of(&self, id: NodeId) -> Option<String> {
        self.node(id)?;
        let mut names = Vec::new();
        let mut current = id;
        while current != self.root {
            let node = self.node(current)?;
            names.push(node.name.as_str());
            current = node.parent?;
        }
        if names.is_empty() {
            return Some(".".to_string());
        }
        names.reverse();
        Some(names.join("/"))
    }

    /// Live node ids in pre-order, root first.
    pub fn pre_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().rev());
        }
        order
    }

    // ------------------------------------------------------------------
    // Resources
    // ------------------------------------------------------------------

    pub fn ext_resources(&self) -> &[ExtResource] {
        &self.ext_resources
    }

    pub fn ext_resource(&self, id: &str) -> Option<&ExtResource> {
        self.ext_resources.iter().find(|r| r.id == id)
    }

    /// Register an external resource, reusing the entry for an already
    /// registered path. Returns its id.
    pub fn add_ext_resource(&mut self, type_name: &str, path: &str) -> String {
        if let Some(existing) = self.ext_resources.iter().find(|r| r.path == path) {
            return existing.id.clone();
        }
        let mut n = self.ext_resources.len() + 1;
        while self.ext_resource(&n.to_string()).is_some() {
            n += 1;
        }
        let id = n.to_string();
        self.ext_resources.push(ExtResource {
            id: id.clone(),
            type_name: type_name.to_string(),
            path: path.to_string(),
            extra: IndexMap::new(),
        });
        id
    }

    pub fn sub_resources(&self) -> &[SubResource] {
        &self.sub_resources
    }

    pub fn sub_resource(&self, id: &str) -> Option<&SubResource> {
        self.sub_resources.iter().find(|r| r.id == id)
    }

    pub fn sub_resource_mut(&mut self, id: &str) -> Option<&mut SubResource> {
        self.sub_resources.iter_mut().find(|r| r.id == id)
    }

    /// Embed a new resource. Ids are `<Type>_<n>` with the lowest free `n`.
    pub fn add_sub_resource(
        &mut self,
        type_name: &str,
        properties: IndexMap<String, Variant>,
    ) -> String {
        let mut n = 1;
        let id = loop {
            let candidate = format!("{}_{}", type_name, n);
            if self.sub_resource(&candidate).is_none() {
                break candidate;
            }
            n += 1;
        };
        self.sub_resources.push(SubResource {
            id: id.clone(),
            type_name: type_name.to_string(),
            properties,
        });
        id
    }

    /// Sub-resources reachable from node properties, dependencies first.
    /// Unreferenced embedded resources are not written.
    fn sub_resource_order(&self) -> Vec<&SubResource> {
        fn visit<'a>(
            doc: &'a SceneDocument,
            id: &str,
            seen: &mut FxHashSet<String>,
            out: &mut Vec<&'a SubResource>,
        ) {
            if !seen.insert(id.to_string()) {
                return;
            }
            let Some(sub) = doc.sub_resource(id) else {
                return;
            };
            let mut deps = Vec::new();
            sub.properties
                .values()
                .for_each(|v| collect_sub_refs(v, &mut deps));
            for dep in deps {
                visit(doc, &dep, seen, out);
            }
            out.push(sub);
        }

        let mut roots = Vec::new();
        for id in self.pre_order() {
            if let Some(node) = self.node(id) {
                node.properties
                    .values()
                    .for_each(|v| collect_sub_refs(v, &mut roots));
            }
        }
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        for id in roots {
            visit(self, &id, &mut seen, &mut out);
        }
        out
    }

    // ------------------------------------------------------------------
    // Text form
    // ------------------------------------------------------------------

    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        Self::from_sections(tscn::parse(text)?)
    }

    pub fn to_text(&self) -> String {
        tscn::write(&self.to_sections())
    }

    pub fn from_sections(sections: Vec<Section>) -> Result<Self, DocumentError> {
        let mut iter = sections.into_iter();
        let header = match iter.next() {
            Some(s) if s.tag == "gd_scene" => s,
            _ => {
                return Err(DocumentError::Structure(
                    "missing [gd_scene] header".to_string(),
                ))
            }
        };
        let mut doc = Self {
            header: without(&header.attrs, &["load_steps"]),
            nodes: Vec::new(),
            root: 0,
            ext_resources: Vec::new(),
            sub_resources: Vec::new(),
            trailing: Vec::new(),
        };

        for section in iter {
            match section.tag.as_str() {
                "ext_resource" => {
                    let id = id_attr(&section).ok_or_else(|| {
                        DocumentError::Structure("ext_resource without id".to_string())
                    })?;
                    doc.ext_resources.push(ExtResource {
                        id,
                        type_name: section.attr_str("type").unwrap_or("Resource").to_string(),
                        path: section.attr_str("path").unwrap_or_default().to_string(),
                        extra: without(&section.attrs, &["type", "path", "id"]),
                    });
                }
                "sub_resource" => {
                    let id = id_attr(&section).ok_or_else(|| {
                        DocumentError::Structure("sub_resource without id".to_string())
                    })?;
                    doc.sub_resources.push(SubResource {
                        id,
                        type_name: section.attr_str("type").unwrap_or("Resource").to_string(),
                        properties: section.props,
                    });
                }
                "node" => doc.push_node_section(section)?,
                _ => doc.trailing.push(section),
            }
        }

        if doc.nodes.is_empty() {
            return Err(DocumentError::Structure("scene has no root node".to_string()));
        }
        Ok(doc)
    }

    fn push_node_section(&mut self, section: Section) -> Result<(), DocumentError> {
        let name = section
            .attr_str("name")
            .ok_or_else(|| DocumentError::Structure("node without name".to_string()))?
            .to_string();
        let node = SceneNode {
            type_name: section.attr_str("type").map(str::to_string),
            extra: without(&section.attrs, &["name", "type", "parent"]),
            properties: section.props,
            name,
            parent: None,
            children: Vec::new(),
        };
        match section.attrs.get("parent") {
            None => {
                if !self.nodes.is_empty() {
                    return Err(DocumentError::Structure(format!(
                        "second root node '{}'",
                        node.name
                    )));
                }
                self.root = 0;
                self.nodes.push(Some(node));
            }
            Some(parent) => {
                if self.nodes.is_empty() {
                    return Err(DocumentError::Structure(format!(
                        "node '{}' declared before the root",
                        node.name
                    )));
                }
                let parent_path = parent.as_str().unwrap_or_default();
                let parent_id = super::tree::resolve_path(self, parent_path).ok_or_else(|| {
                    DocumentError::Structure(format!(
                        "node '{}' has unknown parent '{}'",
                        node.name, parent_path
                    ))
                })?;
                let id = self.nodes.len();
                let mut node = node;
                node.parent = Some(parent_id);
                self.nodes.push(Some(node));
                if let Some(p) = self.node_mut(parent_id) {
                    p.children.push(id);
                }
            }
        }
        Ok(())
    }

    pub fn to_sections(&self) -> Vec<Section> {
        let subs = self.sub_resource_order();
        let mut sections = Vec::new();

        let mut header = Section::new("gd_scene");
        let load_steps = self.ext_resources.len() + subs.len() + 1;
        if load_steps > 1 {
            header
                .attrs
                .insert("load_steps".to_string(), Variant::Int(load_steps as i64));
        }
        header.attrs.extend(self.header.clone());
        if !header.attrs.contains_key("format") {
            header
                .attrs
                .insert("format".to_string(), Variant::Int(FORMAT_VERSION));
        }
        sections.push(header);

        for ext in &self.ext_resources {
            let mut s = Section::new("ext_resource")
                .with_attr("type", Variant::String(ext.type_name.clone()));
            s.attrs.extend(ext.extra.clone());
            sections.push(
                s.with_attr("path", Variant::String(ext.path.clone()))
                    .with_attr("id", Variant::String(ext.id.clone())),
            );
        }

        for sub in subs {
            let mut s = Section::new("sub_resource")
                .with_attr("type", Variant::String(sub.type_name.clone()))
                .with_attr("id", Variant::String(sub.id.clone()));
            s.props = sub.properties.clone();
            sections.push(s);
        }

        for id in self.pre_order() {
            let Some(node) = self.node(id) else {
                continue;
            };
            let mut s =
                Section::new("node").with_attr("name", Variant::String(node.name.clone()));
            if let Some(t) = &node.type_name {
                s = s.with_attr("type", Variant::String(t.clone()));
            }
            if let Some(parent) = node.parent.and_then(|p| self.path_of(p)) {
                s = s.with_attr("parent", Variant::String(parent));
            }
            s.attrs.extend(node.extra.clone());
            s.props = node.properties.clone();
            sections.push(s);
        }

        sections.extend(self.trailing.iter().cloned());
        sections
    }
}

// ============================================================================
// Standalone resources (.tres)
// ============================================================================

/// A standalone resource file: one `[resource]` section of properties,
/// typed by the `[gd_resource]` header.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDocument {
    pub type_name: String,
    pub properties: IndexMap<String, Variant>,
    /// ext_resource / sub_resource sections of a loaded file, kept verbatim.
    preserved: Vec<Section>,
}

impl ResourceDocument {
    pub fn new(type_name: &str, properties: IndexMap<String, Variant>) -> Self {
        Self {
            type_name: type_name.to_string(),
            properties,
            preserved: Vec::new(),
        }
    }

    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        let mut sections = tscn::parse(text)?.into_iter();
        let type_name = match sections.next() {
            Some(s) if s.tag == "gd_resource" => s.attr_str("type").unwrap_or("Resource").to_string(),
            _ => {
                return Err(DocumentError::Structure(
                    "missing [gd_resource] header".to_string(),
                ))
            }
        };
        let mut doc = Self::new(&type_name, IndexMap::new());
        for section in sections {
            if section.tag == "resource" {
                doc.properties = section.props;
            } else {
                doc.preserved.push(section);
            }
        }
        Ok(doc)
    }

    pub fn to_text(&self) -> String {
        let mut header = Section::new("gd_resource")
            .with_attr("type", Variant::String(self.type_name.clone()));
        let load_steps = self.preserved.len() + 1;
        if load_steps > 1 {
            header = header.with_attr("load_steps", Variant::Int(load_steps as i64));
        }
        header = header.with_attr("format", Variant::Int(FORMAT_VERSION));
        let mut sections = vec![header];
        sections.extend(self.preserved.iter().cloned());
        let mut body = Section::new("resource");
        body.props = self.properties.clone();
        sections.push(body);
        tscn::write(&sections)
    }
}

// ============================================================================
// Handle
// ============================================================================

/// Exclusive ownership of one scene document for one operation.
pub struct DocumentHandle {
    path: PathBuf,
    doc: SceneDocument,
    loaded_hash: Option<String>,
    finalized: bool,
}

impl DocumentHandle {
    /// Wrap a freshly constructed document that will be written to `path`.
    pub fn create(path: &Path, doc: SceneDocument) -> Self {
        log::debug!("created scene document for {}", path.display());
        Self {
            path: path.to_path_buf(),
            doc,
            loaded_hash: None,
            finalized: false,
        }
    }

    /// Load and parse an existing scene.
    pub fn load(path: &Path, display: &str) -> Result<Self, OpError> {
        let text = store::read_text(path)
            .map_err(OpError::Io)?
            .ok_or_else(|| OpError::Io(format!("Scene file not found: {}", display)))?;
        let doc = SceneDocument::parse(&text)
            .map_err(|e| OpError::Io(format!("Failed to load scene {}: {}", display, e)))?;
        log::debug!("loaded {} ({} nodes)", path.display(), doc.node_count());
        Ok(Self {
            path: path.to_path_buf(),
            doc,
            loaded_hash: Some(hasher::hash_string(&text)),
            finalized: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn doc(&self) -> &SceneDocument {
        &self.doc
    }

    pub fn doc_mut(&mut self) -> &mut SceneDocument {
        &mut self.doc
    }

    /// Hash of the file content as loaded; None for created documents.
    pub fn loaded_hash(&self) -> Option<&str> {
        self.loaded_hash.as_deref()
    }

    /// Write the document atomically. Returns the hash of the written text.
    pub fn save(mut self) -> Result<String, OpError> {
        self.finalized = true;
        let text = self.doc.to_text();
        store::write_atomic(&self.path, &text)
            .map_err(|e| OpError::Io(format!("Failed to save scene: {}", e)))?;
        log::debug!("saved {}", self.path.display());
        Ok(hasher::hash_string(&text))
    }

    /// Drop the in-memory document without writing.
    pub fn discard(mut self) {
        self.finalized = true;
        log::debug!("discarded {}", self.path.display());
    }
}

impl Drop for DocumentHandle {
    fn drop(&mut self) {
        if !self.finalized {
            log::debug!(
                "{} dropped without save or discard; changes discarded",
                self.path.display()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::variant::Vector2;

    const SCENE: &str = r#"[gd_scene load_steps=3 format=3 uid="uid://c1"]

[ext_resource type="Script" path="res://player.gd" id="1"]

[sub_resource type="RectangleShape2D" id="RectangleShape2D_1"]
size = Vector2(32, 32)

[node name="Main" type="Node2D"]

[node name="Player" type="CharacterBody2D" parent="."]
script = ExtResource("1")

[node name="Shape" type="CollisionShape2D" parent="Player"]
shape = SubResource("RectangleShape2D_1")

[node name="Enemy" parent="." instance=ExtResource("1")]

[connection signal="hit" from="Player" to="." method="_on_hit"]
"#;

    fn sample() -> SceneDocument {
        SceneDocument::parse(SCENE).unwrap()
    }

    #[test]
    fn test_se005_parse_structure() {
        let doc = sample();
        assert_eq!(doc.node_count(), 4);
        let root = doc.root();
        assert_eq!(doc.node(root).unwrap().name, "Main");
        let player = doc.find_child(root, "Player").unwrap();
        let shape = doc.find_child(player, "Shape").unwrap();
        assert_eq!(doc.path_of(shape).unwrap(), "Player/Shape");
        assert_eq!(doc.path_of(root).unwrap(), ".");
        let enemy = doc.find_child(root, "Enemy").unwrap();
        assert!(doc.node(enemy).unwrap().type_name.is_none());
        assert_eq!(doc.ext_resources().len(), 1);
        assert_eq!(doc.sub_resources().len(), 1);
    }

    #[test]
    fn test_se005_text_roundtrip_is_stable() {
        let doc = sample();
        let text = doc.to_text();
        assert_eq!(text, SCENE);
        let again = SceneDocument::parse(&text).unwrap();
        assert_eq!(again.to_text(), text);
    }

    #[test]
    fn test_se005_unique_sibling_names() {
        let mut doc = SceneDocument::new(SceneNode::new("root", "Node2D"));
        let root = doc.root();
        let a = doc.add_child(root, SceneNode::new("Sprite", "Sprite2D")).unwrap();
        let b = doc.add_child(root, SceneNode::new("Sprite", "Sprite2D")).unwrap();
        let c = doc.add_child(root, SceneNode::new("Sprite", "Sprite2D")).unwrap();
        assert_eq!(doc.node(a).unwrap().name, "Sprite");
        assert_eq!(doc.node(b).unwrap().name, "Sprite2");
        assert_eq!(doc.node(c).unwrap().name, "Sprite3");
        assert!(doc.remove_subtree(b));
        let d = doc.add_child(root, SceneNode::new("Sprite", "Sprite2D")).unwrap();
        assert_eq!(doc.node(d).unwrap().name, "Sprite2");
    }

    #[test]
    fn test_se005_remove_subtree() {
        let mut doc = sample();
        let player = doc.find_child(doc.root(), "Player").unwrap();
        assert!(doc.remove_subtree(player));
        assert_eq!(doc.node_count(), 2);
        let text = doc.to_text();
        assert!(!text.contains("Shape"));
        assert!(!text.contains("RectangleShape2D"), "unreferenced sub-resource kept");
        assert!(!text.contains("[connection"));
        assert!(text.starts_with("[gd_scene load_steps=2 format=3"));
    }

    #[test]
    fn test_se005_root_cannot_be_removed() {
        let mut doc = sample();
        assert!(!doc.remove_subtree(doc.root()));
        assert_eq!(doc.node_count(), 4);
    }

    #[test]
    fn test_se005_pre_order() {
        let doc = sample();
        let names: Vec<_> = doc
            .pre_order()
            .into_iter()
            .map(|id| doc.node(id).unwrap().name.clone())
            .collect();
        assert_eq!(names, vec!["Main", "Player", "Shape", "Enemy"]);
    }

    #[test]
    fn test_se005_ext_resource_reuse() {
        let mut doc = sample();
        assert_eq!(doc.add_ext_resource("Script", "res://player.gd"), "1");
        assert_eq!(doc.add_ext_resource("Script", "res://enemy.gd"), "2");
        assert_eq!(doc.ext_resources().len(), 2);
    }

    #[test]
    fn test_se005_sub_resources_written_dependencies_first() {
        let mut doc = SceneDocument::new(SceneNode::new("root", "Node"));
        let lib = doc.add_sub_resource("AnimationLibrary", IndexMap::new());
        let anim = doc.add_sub_resource("Animation", IndexMap::new());
        let mut data = IndexMap::new();
        data.insert("walk".to_string(), Variant::SubResource(anim.clone()));
        doc.sub_resource_mut(&lib)
            .unwrap()
            .properties
            .insert("_data".to_string(), Variant::Dictionary(data));
        let root = doc.root();
        let mut libraries = IndexMap::new();
        libraries.insert(String::new(), Variant::SubResource(lib.clone()));
        doc.node_mut(root)
            .unwrap()
            .properties
            .insert("libraries".to_string(), Variant::Dictionary(libraries));
        let text = doc.to_text();
        let anim_at = text.find("id=\"Animation_1\"").unwrap();
        let lib_at = text.find("id=\"AnimationLibrary_1\"").unwrap();
        assert!(anim_at < lib_at);
        assert!(text.starts_with("[gd_scene load_steps=3 format=3]"));
    }

    #[test]
    fn test_se005_structure_errors() {
        assert!(SceneDocument::parse("[gd_resource type=\"Theme\" format=3]\n").is_err());
        assert!(SceneDocument::parse("[gd_scene format=3]\n").is_err());
        let two_roots = "[gd_scene format=3]\n\n[node name=\"A\" type=\"Node\"]\n\n[node name=\"B\" type=\"Node\"]\n";
        assert!(SceneDocument::parse(two_roots).is_err());
        let orphan = "[gd_scene format=3]\n\n[node name=\"A\" type=\"Node\"]\n\n[node name=\"B\" type=\"Node\" parent=\"Missing\"]\n";
        let err = SceneDocument::parse(orphan).unwrap_err();
        assert!(err.to_string().contains("unknown parent"));
    }

    #[test]
    fn test_se005_resource_document() {
        let mut props = IndexMap::new();
        props.insert(
            "size".to_string(),
            Variant::Vector2(Vector2 { x: 4.0, y: 2.0 }),
        );
        let doc = ResourceDocument::new("RectangleShape2D", props);
        let text = doc.to_text();
        assert_eq!(
            text,
            "[gd_resource type=\"RectangleShape2D\" format=3]\n\n[resource]\nsize = Vector2(4, 2)\n"
        );
        assert_eq!(ResourceDocument::parse(&text).unwrap(), doc);
    }

    #[test]
    fn test_se005_handle_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenes/main.tscn");
        let handle = DocumentHandle::create(&path, sample());
        let saved_hash = handle.save().unwrap();
        let loaded = DocumentHandle::load(&path, "res://scenes/main.tscn").unwrap();
        assert_eq!(loaded.loaded_hash(), Some(saved_hash.as_str()));
        assert_eq!(loaded.doc().node_count(), 4);
        loaded.discard();
    }

    #[test]
    fn test_se005_handle_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = DocumentHandle::load(&dir.path().join("nope.tscn"), "res://nope.tscn")
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "Scene file not found: res://nope.tscn");
        assert_eq!(err.kind(), crate::core::types::ErrorKind::Io);
    }

    #[test]
    fn test_se005_handle_drop_without_save_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.tscn");
        {
            let _handle = DocumentHandle::create(&path, sample());
        }
        assert!(!path.exists());
    }
}
