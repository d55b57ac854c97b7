//! Error types for prompt decorators
//!
//! This module defines the error types used throughout the crate, following
//! a hierarchical structure with specific error variants for different
//! error categories. Soft problems found while transforming text are not
//! errors; they are reported as [`Diagnostic`](crate::engine::Diagnostic)s.

use crate::version::Version;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Configuration-related errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration syntax
    #[error("Invalid configuration syntax: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration parsed but holds an unusable value
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Malformed version strings and version selectors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("Invalid version '{0}': expected major.minor.patch with an optional pre-release tag")]
    InvalidVersion(String),

    #[error("Invalid version selector '{input}': {reason}")]
    InvalidSelector { input: String, reason: String },
}

/// Registry load-time errors
///
/// Any of these aborts the whole load; a registry is never published with
/// part of its sources missing.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Two records share the same (name, version) pair
    #[error("Duplicate definition of {name} v{version} in {second} (first defined in {first})")]
    DuplicateDefinition {
        name: String,
        version: Version,
        first: String,
        second: String,
    },

    /// A record is structurally invalid
    #[error("Invalid decorator definition in {origin}: {message}")]
    InvalidDefinition { origin: String, message: String },

    /// A configured source path exists but is not a directory
    #[error("Registry source is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Invalid glob pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        source: globset::Error,
    },

    #[error("Walk error: {0}")]
    Walk(#[from] ignore::Error),

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl RegistryError {
    pub(crate) fn invalid(origin: impl fmt::Display, message: impl Into<String>) -> Self {
        RegistryError::InvalidDefinition {
            origin: origin.to_string(),
            message: message.into(),
        }
    }
}

/// Failure to resolve one invocation to a record
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("Unknown decorator '{0}'")]
    UnknownDecorator(String),

    /// An explicit version selector matched no loaded record
    #[error("No version of {name} matches selector '{selector}'")]
    VersionNotFound { name: String, selector: String },

    /// Records exist, but none supports the active standard version
    #[error("No version of {name} supports standard version {standard}")]
    IncompatibleVersion { name: String, standard: String },
}

/// The reason a single parameter failed validation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationKind {
    /// Required parameter with no value and no default
    Missing,
    /// Parameter name not declared on the record
    Unknown,
    /// A list was supplied where a scalar is expected, or the reverse
    TypeMismatch { expected: String, value: String },
    NotANumber { value: String },
    NotABoolean { value: String },
    NotInEnum { value: String, allowed: Vec<String> },
    MalformedArray { value: String, reason: String },
    OutOfRange {
        value: f64,
        min: Option<f64>,
        max: Option<f64>,
    },
    InvalidLength {
        length: usize,
        min: Option<usize>,
        max: Option<usize>,
    },
}

/// One offending parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterViolation {
    pub parameter: String,
    #[serde(flatten)]
    pub kind: ViolationKind,
}

impl ParameterViolation {
    pub fn new(parameter: impl Into<String>, kind: ViolationKind) -> Self {
        Self {
            parameter: parameter.into(),
            kind,
        }
    }
}

impl fmt::Display for ParameterViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = &self.parameter;
        match &self.kind {
            ViolationKind::Missing => write!(f, "'{p}' is required"),
            ViolationKind::Unknown => write!(f, "'{p}' is not a declared parameter"),
            ViolationKind::TypeMismatch { expected, value } => {
                write!(f, "'{p}' expects {expected}, got '{value}'")
            }
            ViolationKind::NotANumber { value } => {
                write!(f, "'{p}' expects a number, got '{value}'")
            }
            ViolationKind::NotABoolean { value } => {
                write!(f, "'{p}' expects true or false, got '{value}'")
            }
            ViolationKind::NotInEnum { value, allowed } => write!(
                f,
                "'{p}' must be one of [{}], got '{value}'",
                allowed.join(", ")
            ),
            ViolationKind::MalformedArray { value, reason } => {
                write!(f, "'{p}' expects an array, got '{value}' ({reason})")
            }
            ViolationKind::OutOfRange { value, min, max } => {
                write!(f, "'{p}' = {value} is outside {}", bounds(min, max))
            }
            ViolationKind::InvalidLength { length, min, max } => {
                write!(f, "'{p}' has length {length}, expected {}", bounds(min, max))
            }
        }
    }
}

fn bounds<T: fmt::Display>(min: &Option<T>, max: &Option<T>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("[{min}, {max}]"),
        (Some(min), None) => format!(">= {min}"),
        (None, Some(max)) => format!("<= {max}"),
        (None, None) => "any".to_string(),
    }
}

/// Every parameter violation found for one decorator invocation
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("Invalid parameters for {decorator}: {}", join_violations(.violations))]
pub struct ValidationError {
    pub decorator: String,
    pub violations: Vec<ParameterViolation>,
}

fn join_violations(violations: &[ParameterViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// The only error a transformation call raises
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    #[error("{}", join_validation(.0))]
    InvalidParameters(Vec<ValidationError>),
}

fn join_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Failure to preview a single invocation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExplainError {
    #[error("Not an invocation: {0}")]
    Parse(String),

    #[error("{0}")]
    Lookup(#[from] LookupError),

    #[error("{0}")]
    Validation(#[from] ValidationError),
}

/// Top-level error type
#[derive(Debug, thiserror::Error)]
pub enum DecoratorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("{0}")]
    Lookup(#[from] LookupError),

    #[error("{0}")]
    Version(#[from] VersionError),

    #[error("{0}")]
    Transform(#[from] TransformError),

    #[error("{0}")]
    Explain(#[from] ExplainError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
