//! Typed access to an operation's parameter object.

use super::convert;
use super::variant::Variant;
use crate::core::error::OpError;
use indexmap::IndexMap;
use serde_json::{Map, Value as JsonValue};

pub struct Params<'a> {
    map: &'a Map<String, JsonValue>,
}

impl<'a> Params<'a> {
    pub fn new(map: &'a Map<String, JsonValue>) -> Self {
        Self { map }
    }

    /// Fail on the first required key that is absent or null.
    pub fn check_required(&self, keys: &[&str]) -> Result<(), OpError> {
        match keys
            .iter()
            .find(|k| self.map.get(**k).is_none_or(JsonValue::is_null))
        {
            Some(missing) => Err(OpError::missing_param(missing)),
            None => Ok(()),
        }
    }

    pub fn required_str(&self, key: &str) -> Result<&'a str, OpError> {
        match self.optional_str(&[key])? {
            Some(s) if !s.trim().is_empty() => Ok(s),
            _ => Err(OpError::missing_param(key)),
        }
    }

    /// First present key among `keys` (canonical name first, then aliases).
    pub fn optional_str(&self, keys: &[&str]) -> Result<Option<&'a str>, OpError> {
        for key in keys {
            match self.map.get(*key) {
                None | Some(JsonValue::Null) => continue,
                Some(JsonValue::String(s)) => return Ok(Some(s.as_str())),
                Some(_) => {
                    return Err(OpError::Input(format!(
                        "Parameter '{}' must be a string",
                        key
                    )))
                }
            }
        }
        Ok(None)
    }

    pub fn optional_f64(&self, key: &str) -> Result<Option<f64>, OpError> {
        match self.map.get(key) {
            None | Some(JsonValue::Null) => Ok(None),
            Some(JsonValue::Number(n)) => Ok(n.as_f64()),
            Some(_) => Err(OpError::Input(format!(
                "Parameter '{}' must be a number",
                key
            ))),
        }
    }

    pub fn optional_bool(&self, key: &str) -> Result<Option<bool>, OpError> {
        match self.map.get(key) {
            None | Some(JsonValue::Null) => Ok(None),
            Some(JsonValue::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(OpError::Input(format!(
                "Parameter '{}' must be a boolean",
                key
            ))),
        }
    }

    /// Property object converted to native values; absent means empty.
    pub fn properties(&self, key: &str) -> Result<IndexMap<String, Variant>, OpError> {
        match self.map.get(key) {
            None | Some(JsonValue::Null) => Ok(IndexMap::new()),
            Some(value @ JsonValue::Object(_)) => match Variant::from_json(value) {
                Variant::Dictionary(map) => Ok(convert::convert_all(map)),
                _ => Ok(IndexMap::new()),
            },
            Some(_) => Err(OpError::Input(format!(
                "Parameter '{}' must be an object",
                key
            ))),
        }
    }

    pub fn array(&self, key: &str) -> Result<&'a [JsonValue], OpError> {
        match self.map.get(key) {
            Some(JsonValue::Array(items)) => Ok(items.as_slice()),
            None | Some(JsonValue::Null) => Err(OpError::missing_param(key)),
            Some(_) => Err(OpError::Input(format!(
                "Parameter '{}' must be an array",
                key
            ))),
        }
    }
}
