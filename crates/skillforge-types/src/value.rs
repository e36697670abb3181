//! Tagged run-time values for skill outputs.
//!
//! A skill's stored value arrives "string or object" on the wire. Instead of
//! passing `serde_json::Value` around, it is decoded once into [`SkillValue`]
//! and read through typed accessors that fail with a
//! [`ValueError::TypeMismatch`] rather than silently defaulting.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// An explicit tagged union over the value shapes a skill can produce.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SkillValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<SkillValue>),
    Map(HashMap<String, SkillValue>),
}

impl SkillValue {
    /// The tag name used in mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    pub fn expect_str(&self) -> Result<&str, ValueError> {
        match self {
            Self::String(s) => Ok(s),
            other => Err(ValueError::TypeMismatch {
                expected: "string",
                actual: other.kind(),
            }),
        }
    }

    pub fn expect_number(&self) -> Result<f64, ValueError> {
        match self {
            Self::Number(n) => Ok(*n),
            other => Err(ValueError::TypeMismatch {
                expected: "number",
                actual: other.kind(),
            }),
        }
    }

    pub fn expect_bool(&self) -> Result<bool, ValueError> {
        match self {
            Self::Bool(b) => Ok(*b),
            other => Err(ValueError::TypeMismatch {
                expected: "bool",
                actual: other.kind(),
            }),
        }
    }

    pub fn expect_list(&self) -> Result<&[SkillValue], ValueError> {
        match self {
            Self::List(items) => Ok(items),
            other => Err(ValueError::TypeMismatch {
                expected: "list",
                actual: other.kind(),
            }),
        }
    }

    pub fn expect_map(&self) -> Result<&HashMap<String, SkillValue>, ValueError> {
        match self {
            Self::Map(map) => Ok(map),
            other => Err(ValueError::TypeMismatch {
                expected: "map",
                actual: other.kind(),
            }),
        }
    }
}

impl From<serde_json::Value> for SkillValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Self::from(v)))
                    .collect(),
            ),
        }
    }
}
