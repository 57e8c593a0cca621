//! SE-001: Native value universe for scene documents.
//!
//! A `Variant` is what a property holds once it is inside a document. Its
//! `Display` impl is the text form written to scene and resource files, and
//! `engine::tscn` parses that same text form back.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// RGBA color with float channels in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Default for Color {
    fn default() -> Self {
        Self {
            r: 1.0,
            g: 1.0,
            b: 1.0,
            a: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect2 {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A property value inside a scene or resource document.
#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    StringName(String),
    Vector2(Vector2),
    Vector3(Vector3),
    Color(Color),
    Rect2(Rect2),
    NodePath(String),
    SubResource(String),
    ExtResource(String),
    PackedFloat32Array(Vec<f64>),
    Array(Vec<Variant>),
    Dictionary(IndexMap<String, Variant>),
    /// Typed constructor the codec has no dedicated shape for
    /// (`Transform2D(...)`, `PackedStringArray(...)`), kept verbatim.
    Constructor { name: String, args: Vec<Variant> },
}

/// Declared type of a class property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantType {
    Bool,
    Int,
    Float,
    String,
    Vector2,
    Vector3,
    Color,
    Rect2,
    NodePath,
    Array,
    Dictionary,
    Resource,
    Any,
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "String",
            Self::Vector2 => "Vector2",
            Self::Vector3 => "Vector3",
            Self::Color => "Color",
            Self::Rect2 => "Rect2",
            Self::NodePath => "NodePath",
            Self::Array => "Array",
            Self::Dictionary => "Dictionary",
            Self::Resource => "Resource",
            Self::Any => "Variant",
        };
        write!(f, "{}", name)
    }
}

impl Variant {
    /// Human-readable type name used in error messages.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Nil => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "String",
            Self::StringName(_) => "StringName",
            Self::Vector2(_) => "Vector2",
            Self::Vector3(_) => "Vector3",
            Self::Color(_) => "Color",
            Self::Rect2(_) => "Rect2",
            Self::NodePath(_) => "NodePath",
            Self::SubResource(_) => "SubResource",
            Self::ExtResource(_) => "ExtResource",
            Self::PackedFloat32Array(_) => "PackedFloat32Array",
            Self::Array(_) => "Array",
            Self::Dictionary(_) => "Dictionary",
            Self::Constructor { name, .. } => name,
        }
    }

    /// Structural mapping from wire JSON. Tagged records stay dictionaries
    /// here; `engine::convert` turns them into native values.
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Nil,
            JsonValue::Bool(b) => Self::Bool(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(0.0)),
            },
            JsonValue::String(s) => Self::String(s.clone()),
            JsonValue::Array(items) => Self::Array(items.iter().map(Self::from_json).collect()),
            JsonValue::Object(map) => Self::Dictionary(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Numeric view; ints widen to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::StringName(s) | Self::NodePath(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&IndexMap<String, Variant>> {
        match self {
            Self::Dictionary(d) => Some(d),
            _ => None,
        }
    }
}

/// Write a real number the way the text format expects inside constructors:
/// integral values without a fraction.
fn write_real(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        write!(f, "{}", v as i64)
    } else {
        write!(f, "{}", v)
    }
}

fn write_reals(f: &mut fmt::Formatter<'_>, name: &str, values: &[f64]) -> fmt::Result {
    write!(f, "{}(", name)?;
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write_real(f, *v)?;
    }
    write!(f, ")")
}

/// Quote a string with the escapes the codec understands.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "null"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(v) => {
                // Scalars keep a fraction so they parse back as floats.
                if v.is_nan() {
                    write!(f, "nan")
                } else if v.is_infinite() {
                    write!(f, "{}inf", if *v < 0.0 { "-" } else { "" })
                } else if v.fract() == 0.0 && v.abs() < 1e15 {
                    write!(f, "{:.1}", v)
                } else {
                    write!(f, "{}", v)
                }
            }
            Self::String(s) => write!(f, "{}", quote(s)),
            Self::StringName(s) => write!(f, "&{}", quote(s)),
            Self::Vector2(v) => write_reals(f, "Vector2", &[v.x, v.y]),
            Self::Vector3(v) => write_reals(f, "Vector3", &[v.x, v.y, v.z]),
            Self::Color(c) => write_reals(f, "Color", &[c.r, c.g, c.b, c.a]),
            Self::Rect2(r) => write_reals(f, "Rect2", &[r.x, r.y, r.width, r.height]),
            Self::NodePath(p) => write!(f, "NodePath({})", quote(p)),
            Self::SubResource(id) => write!(f, "SubResource({})", quote(id)),
            Self::ExtResource(id) => write!(f, "ExtResource({})", quote(id)),
            Self::PackedFloat32Array(values) => write_reals(f, "PackedFloat32Array", values),
            Self::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Self::Dictionary(map) => {
                if map.is_empty() {
                    return write!(f, "{{}}");
                }
                writeln!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        writeln!(f, ",")?;
                    }
                    write!(f, "{}: {}", quote(k), v)?;
                }
                write!(f, "\n}}")
            }
            Self::Constructor { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match arg {
                        Self::Float(v) => write_real(f, *v)?,
                        other => write!(f, "{}", other)?,
                    }
                }
                write!(f, ")")
            }
        }
    }
}
