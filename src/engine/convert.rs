//! SE-002: Tagged wire values → native structured values.
//!
//! A dictionary carrying `_type` = `Vector2` | `Vector3` | `Color` | `Rect2`
//! becomes the native value. Missing components default to 0, missing color
//! channels to 1. Anything else passes through untouched; a wrong shape is
//! caught later, when the value is assigned to a typed property.

use super::variant::{Color, Rect2, Variant, Vector2, Vector3};
use indexmap::IndexMap;

/// Discriminator field of a tagged record.
pub const TYPE_TAG: &str = "_type";

/// Convert a value, recognizing tagged records. Idempotent.
pub fn convert(value: Variant) -> Variant {
    let map = match value {
        Variant::Dictionary(map) => map,
        other => return other,
    };
    let tag = match map.get(TYPE_TAG) {
        Some(Variant::String(tag)) | Some(Variant::StringName(tag)) => tag.clone(),
        _ => String::new(),
    };
    match tag.as_str() {
        "Vector2" => Variant::Vector2(Vector2 {
            x: component(&map, "x", 0.0),
            y: component(&map, "y", 0.0),
        }),
        "Vector3" => Variant::Vector3(Vector3 {
            x: component(&map, "x", 0.0),
            y: component(&map, "y", 0.0),
            z: component(&map, "z", 0.0),
        }),
        "Color" => Variant::Color(Color {
            r: component(&map, "r", 1.0),
            g: component(&map, "g", 1.0),
            b: component(&map, "b", 1.0),
            a: component(&map, "a", 1.0),
        }),
        "Rect2" => Variant::Rect2(Rect2 {
            x: component(&map, "x", 0.0),
            y: component(&map, "y", 0.0),
            width: component(&map, "width", 0.0),
            height: component(&map, "height", 0.0),
        }),
        _ => Variant::Dictionary(map),
    }
}

/// Convert every value of a property map, preserving key order.
pub fn convert_all(properties: IndexMap<String, Variant>) -> IndexMap<String, Variant> {
    properties
        .into_iter()
        .map(|(k, v)| (k, convert(v)))
        .collect()
}

fn component(map: &IndexMap<String, Variant>, key: &str, default: f64) -> f64 {
    map.get(key).and_then(Variant::as_f64).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn wire(v: serde_json::Value) -> Variant {
        Variant::from_json(&v)
    }

    #[test]
    fn test_se002_color_alpha_defaults_to_opaque() {
        let v = convert(wire(json!({"_type": "Color", "r": 1, "g": 0, "b": 0})));
        assert_eq!(
            v,
            Variant::Color(Color {
                r: 1.0,
                g: 0.0,
                b: 0.0,
                a: 1.0
            })
        );
    }

    #[test]
    fn test_se002_vector2_missing_component_is_zero() {
        let v = convert(wire(json!({"_type": "Vector2", "x": 5})));
        assert_eq!(v, Variant::Vector2(Vector2 { x: 5.0, y: 0.0 }));
    }

    #[test]
    fn test_se002_vector3_and_rect2() {
        let v = convert(wire(json!({"_type": "Vector3", "x": 1, "y": 2.5, "z": -3})));
        assert_eq!(
            v,
            Variant::Vector3(Vector3 {
                x: 1.0,
                y: 2.5,
                z: -3.0
            })
        );
        let r = convert(wire(json!({"_type": "Rect2", "width": 32, "height": 16})));
        assert_eq!(
            r,
            Variant::Rect2(Rect2 {
                x: 0.0,
                y: 0.0,
                width: 32.0,
                height: 16.0
            })
        );
    }

    #[test]
    fn test_se002_color_all_defaults_is_white() {
        let v = convert(wire(json!({"_type": "Color"})));
        assert_eq!(v, Variant::Color(Color::default()));
    }

    #[test]
    fn test_se002_unknown_tag_passes_through() {
        let input = wire(json!({"_type": "Quaternion", "x": 1}));
        assert_eq!(convert(input.clone()), input);
    }

    #[test]
    fn test_se002_untagged_shapes_pass_through() {
        for v in [
            wire(json!(3)),
            wire(json!("hello")),
            wire(json!([1, 2])),
            wire(json!({"x": 1, "y": 2})),
            Variant::Nil,
        ] {
            assert_eq!(convert(v.clone()), v);
        }
    }

    #[test]
    fn test_se002_non_string_tag_passes_through() {
        let input = wire(json!({"_type": 7, "x": 1}));
        assert_eq!(convert(input.clone()), input);
    }

    #[test]
    fn test_se002_non_numeric_component_uses_default() {
        let v = convert(wire(json!({"_type": "Vector2", "x": "abc", "y": 2})));
        assert_eq!(v, Variant::Vector2(Vector2 { x: 0.0, y: 2.0 }));
    }

    #[test]
    fn test_se002_convert_all_keeps_order() {
        let mut props = IndexMap::new();
        props.insert("z".to_string(), wire(json!({"_type": "Vector2", "x": 1})));
        props.insert("a".to_string(), Variant::Int(1));
        let out = convert_all(props);
        let keys: Vec<_> = out.keys().cloned().collect();
        assert_eq!(keys, vec!["z", "a"]);
        assert!(matches!(out["z"], Variant::Vector2(_)));
    }

    fn arb_tagged() -> impl Strategy<Value = Variant> {
        let tag = prop_oneof![
            Just("Vector2"),
            Just("Vector3"),
            Just("Color"),
            Just("Rect2"),
            Just("Basis"),
        ];
        (tag, -1e6f64..1e6, -1e6f64..1e6, any::<bool>()).prop_map(|(tag, a, b, with_b)| {
            let mut map = IndexMap::new();
            map.insert(TYPE_TAG.to_string(), Variant::String(tag.to_string()));
            map.insert("x".to_string(), Variant::Float(a));
            map.insert("r".to_string(), Variant::Float(a));
            if with_b {
                map.insert("y".to_string(), Variant::Float(b));
                map.insert("width".to_string(), Variant::Float(b));
            }
            Variant::Dictionary(map)
        })
    }

    proptest! {
        #[test]
        fn test_se002_convert_is_idempotent(v in arb_tagged()) {
            let once = convert(v);
            let twice = convert(once.clone());
            prop_assert_eq!(once, twice);
        }
    }
}
