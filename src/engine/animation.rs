//! SE-007: Typed view over an `Animation` sub-resource.
//!
//! On disk an animation is a flat property list (`length`, `loop_mode`,
//! `tracks/<n>/type`, `tracks/<n>/keys`, ...). This module maps that list to
//! `AnimationDescriptor` and back. Value tracks are decoded into keyframes;
//! other track kinds keep their keys verbatim so they survive a round trip.

use super::variant::Variant;
use indexmap::IndexMap;
use std::fmt;

pub const DEFAULT_STEP: f64 = 0.1;
pub const DEFAULT_TRANSITION: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    #[default]
    None,
    Linear,
    PingPong,
}

impl LoopMode {
    fn from_int(i: i64) -> Self {
        match i {
            1 => Self::Linear,
            2 => Self::PingPong,
            _ => Self::None,
        }
    }

    fn as_int(self) -> i64 {
        match self {
            Self::None => 0,
            Self::Linear => 1,
            Self::PingPong => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Linear => "linear",
            Self::PingPong => "ping_pong",
        }
    }
}

impl fmt::Display for LoopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe {
    pub time: f64,
    pub value: Variant,
    pub transition: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// Track type as written (`value`, `method`, `position_3d`, ...).
    pub kind: String,
    pub target_path: String,
    pub property: String,
    pub keyframes: Vec<Keyframe>,
    /// Update mode of a value track (0 continuous, 1 discrete, 2 capture).
    pub update: i64,
    /// Remaining `tracks/<n>/*` entries, in file order.
    raw: IndexMap<String, Variant>,
}

impl Track {
    /// A value track with the default interpolation settings.
    pub fn value(target_path: &str, property: &str, keyframes: Vec<Keyframe>) -> Self {
        let mut raw = IndexMap::new();
        raw.insert("imported".to_string(), Variant::Bool(false));
        raw.insert("enabled".to_string(), Variant::Bool(true));
        raw.insert("interp".to_string(), Variant::Int(1));
        raw.insert("loop_wrap".to_string(), Variant::Bool(true));
        Self {
            kind: "value".to_string(),
            target_path: target_path.to_string(),
            property: property.to_string(),
            keyframes,
            update: 0,
            raw,
        }
    }

    pub fn is_value(&self) -> bool {
        self.kind == "value"
    }

    /// The `NodePath` the track animates: `target:property`.
    pub fn node_path(&self) -> String {
        if self.property.is_empty() {
            self.target_path.clone()
        } else {
            format!("{}:{}", self.target_path, self.property)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationDescriptor {
    pub name: String,
    pub length: f64,
    pub loop_mode: LoopMode,
    pub step: f64,
    pub tracks: Vec<Track>,
    /// Non-track properties other than name, length, loop mode and step.
    extra: IndexMap<String, Variant>,
}

fn float_list(value: Option<&Variant>) -> Vec<f64> {
    match value {
        Some(Variant::PackedFloat32Array(values)) => values.clone(),
        Some(Variant::Array(items)) => items.iter().filter_map(Variant::as_f64).collect(),
        _ => Vec::new(),
    }
}

/// Split `tracks/<n>/<field>` into its index and field.
fn track_key(key: &str) -> Option<(usize, &str)> {
    let rest = key.strip_prefix("tracks/")?;
    let (index, field) = rest.split_once('/')?;
    Some((index.parse().ok()?, field))
}

impl AnimationDescriptor {
    pub fn new(name: &str, length: f64, loop_mode: LoopMode) -> Self {
        Self {
            name: name.to_string(),
            length,
            loop_mode,
            step: DEFAULT_STEP,
            tracks: Vec::new(),
            extra: IndexMap::new(),
        }
    }

    /// Decode the flat property list of an `Animation` sub-resource.
    pub fn from_properties(props: &IndexMap<String, Variant>) -> Self {
        let mut anim = Self::new("", 1.0, LoopMode::None);
        let mut fields: IndexMap<usize, IndexMap<String, Variant>> = IndexMap::new();
        for (key, value) in props {
            if let Some((index, field)) = track_key(key) {
                fields
                    .entry(index)
                    .or_default()
                    .insert(field.to_string(), value.clone());
                continue;
            }
            match key.as_str() {
                "resource_name" => anim.name = value.as_str().unwrap_or_default().to_string(),
                "length" => anim.length = value.as_f64().unwrap_or(1.0),
                "step" => anim.step = value.as_f64().unwrap_or(DEFAULT_STEP),
                "loop_mode" => {
                    anim.loop_mode = match value {
                        Variant::Int(i) => LoopMode::from_int(*i),
                        _ => LoopMode::None,
                    }
                }
                _ => {
                    anim.extra.insert(key.clone(), value.clone());
                }
            }
        }
        fields.sort_keys();
        anim.tracks = fields.into_values().map(Self::decode_track).collect();
        anim
    }

    fn decode_track(mut fields: IndexMap<String, Variant>) -> Track {
        let kind = fields
            .shift_remove("type")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| "value".to_string());
        let path = fields
            .shift_remove("path")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let (target_path, property) = match path.split_once(':') {
            Some((t, p)) => (t.to_string(), p.to_string()),
            None => (path, String::new()),
        };
        let mut track = Track {
            kind,
            target_path,
            property,
            keyframes: Vec::new(),
            update: 0,
            raw: IndexMap::new(),
        };
        if track.is_value() {
            match fields.shift_remove("keys") {
                Some(Variant::Dictionary(keys)) => {
                    let times = float_list(keys.get("times"));
                    let transitions = float_list(keys.get("transitions"));
                    let values = match keys.get("values") {
                        Some(Variant::Array(items)) => items.clone(),
                        _ => Vec::new(),
                    };
                    track.update = match keys.get("update") {
                        Some(Variant::Int(i)) => *i,
                        _ => 0,
                    };
                    track.keyframes = times
                        .iter()
                        .zip(values)
                        .enumerate()
                        .map(|(i, (&time, value))| Keyframe {
                            time,
                            value,
                            transition: transitions.get(i).copied().unwrap_or(DEFAULT_TRANSITION),
                        })
                        .collect();
                }
                Some(other) => {
                    fields.insert("keys".to_string(), other);
                }
                None => {}
            }
        }
        track.raw = fields;
        track
    }

    /// Encode back into the flat property list.
    pub fn to_properties(&self) -> IndexMap<String, Variant> {
        let mut props = IndexMap::new();
        props.insert(
            "resource_name".to_string(),
            Variant::String(self.name.clone()),
        );
        props.insert("length".to_string(), Variant::Float(self.length));
        if self.loop_mode != LoopMode::None {
            props.insert(
                "loop_mode".to_string(),
                Variant::Int(self.loop_mode.as_int()),
            );
        }
        props.insert("step".to_string(), Variant::Float(self.step));
        props.extend(self.extra.clone());

        for (i, track) in self.tracks.iter().enumerate() {
            let key = |field: &str| format!("tracks/{}/{}", i, field);
            props.insert(key("type"), Variant::String(track.kind.clone()));
            for field in ["imported", "enabled"] {
                if let Some(v) = track.raw.get(field) {
                    props.insert(key(field), v.clone());
                }
            }
            props.insert(key("path"), Variant::NodePath(track.node_path()));
            for (field, value) in &track.raw {
                if field != "imported" && field != "enabled" {
                    props.insert(key(field), value.clone());
                }
            }
            if track.is_value() {
                props.insert(key("keys"), Self::encode_keys(track));
            }
        }
        props
    }

    fn encode_keys(track: &Track) -> Variant {
        let mut keys = IndexMap::new();
        keys.insert(
            "times".to_string(),
            Variant::PackedFloat32Array(track.keyframes.iter().map(|k| k.time).collect()),
        );
        keys.insert(
            "transitions".to_string(),
            Variant::PackedFloat32Array(track.keyframes.iter().map(|k| k.transition).collect()),
        );
        keys.insert("update".to_string(), Variant::Int(track.update));
        keys.insert(
            "values".to_string(),
            Variant::Array(track.keyframes.iter().map(|k| k.value.clone()).collect()),
        );
        Variant::Dictionary(keys)
    }

    /// Append a value track; keyframes keep the given order. Returns the
    /// new track's index.
    pub fn add_value_track(
        &mut self,
        target_path: &str,
        property: &str,
        keyframes: Vec<Keyframe>,
    ) -> usize {
        self.tracks
            .push(Track::value(target_path, property, keyframes));
        self.tracks.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tscn;
    use crate::engine::variant::Vector2;

    const ANIM: &str = r#"[sub_resource type="Animation" id="Animation_1"]
resource_name = "bounce"
length = 2.0
loop_mode = 2
step = 0.05
tracks/0/type = "value"
tracks/0/imported = false
tracks/0/enabled = true
tracks/0/path = NodePath("Sprite:position")
tracks/0/interp = 2
tracks/0/loop_wrap = true
tracks/0/keys = {
"times": PackedFloat32Array(0, 1.5),
"transitions": PackedFloat32Array(1, 0.5),
"update": 1,
"values": [Vector2(0, 0), Vector2(0, -20)]
}
tracks/1/type = "method"
tracks/1/imported = false
tracks/1/enabled = true
tracks/1/path = NodePath(".")
tracks/1/interp = 1
tracks/1/loop_wrap = true
tracks/1/keys = {
"times": PackedFloat32Array(1),
"transitions": PackedFloat32Array(1),
"values": [{
"args": [],
"method": &"play_sound"
}]
}
"#;

    fn props() -> IndexMap<String, Variant> {
        tscn::parse(ANIM).unwrap().remove(0).props
    }

    #[test]
    fn test_se007_decode() {
        let anim = AnimationDescriptor::from_properties(&props());
        assert_eq!(anim.name, "bounce");
        assert_eq!(anim.length, 2.0);
        assert_eq!(anim.loop_mode, LoopMode::PingPong);
        assert_eq!(anim.step, 0.05);
        assert_eq!(anim.tracks.len(), 2);
        let t = &anim.tracks[0];
        assert_eq!(t.target_path, "Sprite");
        assert_eq!(t.property, "position");
        assert_eq!(t.update, 1);
        assert_eq!(t.keyframes.len(), 2);
        assert_eq!(t.keyframes[1].time, 1.5);
        assert_eq!(t.keyframes[1].transition, 0.5);
        assert_eq!(
            t.keyframes[1].value,
            Variant::Vector2(Vector2 { x: 0.0, y: -20.0 })
        );
        assert_eq!(anim.tracks[1].kind, "method");
        assert!(anim.tracks[1].keyframes.is_empty());
    }

    #[test]
    fn test_se007_roundtrip_preserves_file() {
        let original = props();
        let anim = AnimationDescriptor::from_properties(&original);
        assert_eq!(anim.to_properties(), original);
    }

    #[test]
    fn test_se007_new_animation_properties() {
        let anim = AnimationDescriptor::new("idle", 1.0, LoopMode::None);
        let props = anim.to_properties();
        let keys: Vec<_> = props.keys().cloned().collect();
        assert_eq!(keys, vec!["resource_name", "length", "step"]);
        let looped = AnimationDescriptor::new("walk", 0.5, LoopMode::Linear).to_properties();
        assert_eq!(looped["loop_mode"], Variant::Int(1));
    }

    #[test]
    fn test_se007_add_value_track_keeps_order() {
        let mut anim = AnimationDescriptor::new("walk", 1.0, LoopMode::Linear);
        let frames = vec![
            Keyframe {
                time: 1.0,
                value: Variant::Int(2),
                transition: 1.0,
            },
            Keyframe {
                time: 0.0,
                value: Variant::Int(1),
                transition: 1.0,
            },
            Keyframe {
                time: 0.0,
                value: Variant::Int(1),
                transition: 1.0,
            },
        ];
        let index = anim.add_value_track("Sprite", "frame", frames);
        assert_eq!(index, 0);
        let props = anim.to_properties();
        assert_eq!(
            props["tracks/0/path"],
            Variant::NodePath("Sprite:frame".into())
        );
        let keys = props["tracks/0/keys"].as_dictionary().unwrap();
        assert_eq!(
            keys["times"],
            Variant::PackedFloat32Array(vec![1.0, 0.0, 0.0])
        );
        let decoded = AnimationDescriptor::from_properties(&props);
        assert_eq!(decoded.tracks[0].keyframes.len(), 3);
        assert_eq!(decoded, anim);
    }

    #[test]
    fn test_se007_track_written_text() {
        let mut anim = AnimationDescriptor::new("walk", 1.0, LoopMode::None);
        anim.add_value_track(
            ".",
            "modulate",
            vec![Keyframe {
                time: 0.0,
                value: Variant::Float(1.0),
                transition: 1.0,
            }],
        );
        let mut section = tscn::Section::new("sub_resource");
        section.props = anim.to_properties();
        let text = tscn::write(&[section]);
        assert!(text.contains("tracks/0/path = NodePath(\".:modulate\")"));
        assert!(text.contains("\"times\": PackedFloat32Array(0)"));
    }
}
