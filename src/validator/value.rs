#![forbid(unsafe_code)]

//! Typed parameter values produced by validation

use serde::Serialize;
use std::fmt;

/// A validated, typed parameter value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TypedValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    /// One of the record's declared enum values
    Enum(String),
    Array(Vec<String>),
}

impl TypedValue {
    /// Key used to look the value up in a value map
    ///
    /// Numbers use their shortest form (`3`, not `3.0`); booleans are
    /// `true`/`false`; arrays join their tokens with `", "`.
    pub fn key(&self) -> String {
        match self {
            TypedValue::Text(s) | TypedValue::Enum(s) => s.clone(),
            TypedValue::Number(n) => format_number(*n),
            TypedValue::Boolean(b) => b.to_string(),
            TypedValue::Array(items) => items.join(", "),
        }
    }

    /// Text substituted into a format template
    pub fn render(&self) -> String {
        self.key()
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::Text(s) | TypedValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TypedValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TypedValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[String]> {
        match self {
            TypedValue::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Render a number without a trailing `.0` when it is integral
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
