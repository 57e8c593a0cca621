//! Animation operations. Animations live in AnimationLibrary sub-resources
//! referenced from an AnimationPlayer's `libraries` dictionary.

use super::{mutate_document, Context};
use crate::core::error::OpError;
use crate::core::types::OperationResult;
use crate::engine::animation::{AnimationDescriptor, Keyframe, LoopMode, DEFAULT_TRANSITION};
use crate::engine::classdb::ClassDb;
use crate::engine::convert;
use crate::engine::document::{NodeId, SceneDocument, SceneNode};
use crate::engine::params::Params;
use crate::engine::tree;
use crate::engine::variant::Variant;
use indexmap::IndexMap;
use serde_json::{json, Value as JsonValue};

pub const PLAYER_CLASS: &str = "AnimationPlayer";
pub const LIBRARY_CLASS: &str = "AnimationLibrary";
pub const ANIMATION_CLASS: &str = "Animation";
pub const DEFAULT_ANIMATION_NAME: &str = "new_animation";
pub const DEFAULT_DURATION: f64 = 1.0;

fn is_player(doc: &SceneDocument, id: NodeId) -> bool {
    doc.node(id)
        .is_some_and(|n| ClassDb::global().inherits(n.class_name(), PLAYER_CLASS))
}

/// Sub-resource id held under `key` in a dictionary property.
fn sub_resource_entry(props: &IndexMap<String, Variant>, property: &str, key: &str) -> Option<String> {
    match props.get(property)?.as_dictionary()?.get(key)? {
        Variant::SubResource(id) => Some(id.clone()),
        _ => None,
    }
}

/// Insert `key = SubResource(id)` into a dictionary property, replacing a
/// non-dictionary value if one is there.
fn set_sub_resource_entry(props: &mut IndexMap<String, Variant>, property: &str, key: &str, id: &str) {
    let entry = props
        .entry(property.to_string())
        .or_insert_with(|| Variant::Dictionary(IndexMap::new()));
    if !matches!(entry, Variant::Dictionary(_)) {
        *entry = Variant::Dictionary(IndexMap::new());
    }
    if let Variant::Dictionary(map) = entry {
        map.insert(key.to_string(), Variant::SubResource(id.to_string()));
    }
}

/// The library sub-resource registered under `key` on a player.
fn library_id(doc: &SceneDocument, player: NodeId, key: &str) -> Option<String> {
    let node = doc.node(player)?;
    let id = sub_resource_entry(&node.properties, "libraries", key)?;
    doc.sub_resource(&id)
        .filter(|sub| sub.type_name == LIBRARY_CLASS)
        .map(|_| id)
}

/// The default-keyed library of a player, created when missing.
fn ensure_default_library(doc: &mut SceneDocument, player: NodeId) -> Result<String, OpError> {
    if let Some(id) = library_id(doc, player, "") {
        return Ok(id);
    }
    let mut props = IndexMap::new();
    props.insert("_data".to_string(), Variant::Dictionary(IndexMap::new()));
    let id = doc.add_sub_resource(LIBRARY_CLASS, props);
    let node = doc
        .node_mut(player)
        .ok_or_else(|| OpError::Resolution("AnimationPlayer vanished".to_string()))?;
    set_sub_resource_entry(&mut node.properties, "libraries", "", &id);
    log::debug!("created default animation library {}", id);
    Ok(id)
}

/// `library/animation` or a bare name in the default library.
fn split_animation_name(name: &str) -> (&str, &str) {
    name.split_once('/').unwrap_or(("", name))
}

fn parse_keyframe(index: usize, raw: &JsonValue) -> Result<Keyframe, OpError> {
    let invalid = |what: &str| OpError::Input(format!("Keyframe {}: {}", index, what));
    let obj = raw.as_object().ok_or_else(|| invalid("expected an object"))?;
    let time = obj
        .get("time")
        .and_then(JsonValue::as_f64)
        .ok_or_else(|| invalid("'time' must be a number"))?;
    let value = obj
        .get("value")
        .map(|v| convert::convert(Variant::from_json(v)))
        .ok_or_else(|| invalid("missing 'value'"))?;
    let transition = match obj.get("transition") {
        None | Some(JsonValue::Null) => DEFAULT_TRANSITION,
        Some(t) => t
            .as_f64()
            .ok_or_else(|| invalid("'transition' must be a number"))?,
    };
    Ok(Keyframe {
        time,
        value,
        transition,
    })
}

pub fn create_animation(ctx: &Context, params: &Params) -> Result<OperationResult, OpError> {
    let scene_path = params.required_str("scene_path")?;
    let node_path = params.optional_str(&["node_path"])?.unwrap_or(".");
    let name = params
        .optional_str(&["animation_name"])?
        .unwrap_or(DEFAULT_ANIMATION_NAME);
    let duration = params.optional_f64("duration")?.unwrap_or(DEFAULT_DURATION);
    let looping = params.optional_bool("loop")?.unwrap_or(false);

    if !(duration.is_finite() && duration > 0.0) {
        return Err(OpError::Input(format!(
            "Animation duration must be positive, got {}",
            duration
        )));
    }
    if name.trim().is_empty() || name.contains(['/', ':', ',', '[']) {
        return Err(OpError::Input(format!("Invalid animation name: {}", name)));
    }
    let loop_mode = if looping { LoopMode::Linear } else { LoopMode::None };

    mutate_document(ctx, scene_path, |doc| {
        let target = tree::resolve_path(doc, node_path)
            .ok_or_else(|| OpError::Resolution(format!("Node not found: {}", node_path)))?;

        let view: &SceneDocument = doc;
        let existing = view
            .children(target)
            .iter()
            .copied()
            .find(|&c| is_player(view, c));
        let (player, created_player) = match existing {
            Some(id) => (id, false),
            None => {
                let id = doc
                    .add_child(target, SceneNode::new(PLAYER_CLASS, PLAYER_CLASS))
                    .ok_or_else(|| OpError::Resolution(format!("Node not found: {}", node_path)))?;
                (id, true)
            }
        };

        let library = ensure_default_library(doc, player)?;
        let props = AnimationDescriptor::new(name, duration, loop_mode).to_properties();
        let current = doc
            .sub_resource(&library)
            .and_then(|lib| sub_resource_entry(&lib.properties, "_data", name))
            .filter(|id| doc.sub_resource(id).is_some());
        let overwritten = match current {
            Some(id) => {
                if let Some(sub) = doc.sub_resource_mut(&id) {
                    sub.type_name = ANIMATION_CLASS.to_string();
                    sub.properties = props;
                }
                true
            }
            None => {
                let id = doc.add_sub_resource(ANIMATION_CLASS, props);
                let lib = doc
                    .sub_resource_mut(&library)
                    .ok_or_else(|| OpError::Resolution("AnimationLibrary vanished".to_string()))?;
                set_sub_resource_entry(&mut lib.properties, "_data", name, &id);
                false
            }
        };

        let player_path = doc.path_of(player).unwrap_or_default();
        Ok(OperationResult::ok(format!(
            "{} animation '{}' on {}",
            if overwritten { "Replaced" } else { "Created" },
            name,
            player_path
        ))
        .with("animation_player_path", json!(player_path))
        .with("animation_name", json!(name))
        .with("created_player", json!(created_player))
        .with("overwritten", json!(overwritten))
        .with("length", json!(duration))
        .with("loop_mode", json!(loop_mode.as_str())))
    })
}

pub fn add_animation_track(ctx: &Context, params: &Params) -> Result<OperationResult, OpError> {
    let scene_path = params.required_str("scene_path")?;
    let player_path = params.required_str("animation_player_path")?;
    let name = params.required_str("animation_name")?;
    let target = params.required_str("target_node_path")?;
    let property = params.required_str("property")?;
    let keyframes = params
        .array("keyframes")?
        .iter()
        .enumerate()
        .map(|(i, raw)| parse_keyframe(i, raw))
        .collect::<Result<Vec<_>, _>>()?;

    mutate_document(ctx, scene_path, |doc| {
        let player = tree::resolve_path(doc, player_path)
            .filter(|&id| is_player(doc, id))
            .ok_or_else(|| {
                OpError::Resolution(format!("AnimationPlayer not found: {}", player_path))
            })?;
        let (library_key, animation) = split_animation_name(name);
        let not_found = || OpError::Resolution(format!("Animation not found: {}", name));
        let anim_id = library_id(doc, player, library_key)
            .and_then(|lib| doc.sub_resource(&lib))
            .and_then(|lib| sub_resource_entry(&lib.properties, "_data", animation))
            .ok_or_else(not_found)?;
        let sub = doc
            .sub_resource_mut(&anim_id)
            .filter(|sub| sub.type_name == ANIMATION_CLASS)
            .ok_or_else(not_found)?;

        let count = keyframes.len();
        let mut descriptor = AnimationDescriptor::from_properties(&sub.properties);
        let index = descriptor.add_value_track(target, property, keyframes);
        let track_path = descriptor.tracks[index].node_path();
        sub.properties = descriptor.to_properties();

        Ok(OperationResult::ok(format!(
            "Added track {} to animation '{}'",
            track_path, name
        ))
        .with("track_index", json!(index))
        .with("track_path", json!(track_path))
        .with("keyframe_count", json!(count)))
    })
}
