#![forbid(unsafe_code)]

//! prompt-decorators: expand `+++Decorator` annotations into prompt instructions
//!
//! Annotation lines at the top of a prompt name versioned decorator records
//! from a registry. Each invocation is resolved, its parameters validated and
//! its instruction fragment rendered. The fragments are composed around the
//! remaining text before it is handed to a downstream language model.

pub mod cli;
pub mod compat;
pub mod compose;
pub mod config;
pub mod engine;
pub mod error;
pub mod output;
pub mod parser;
pub mod registry;
pub mod types;
pub mod validator;
pub mod version;

// Re-export error types for convenient access
pub use error::{
    ConfigError, DecoratorError, ExplainError, LookupError, RegistryError, TransformError,
    ValidationError, VersionError,
};

// Re-export the main pipeline types
pub use engine::{Diagnostic, TransformOptions, Transformation, Transformer};
pub use parser::{AnnotationParser, Invocation, ParsedText};
pub use registry::{DecoratorRecord, RegistryBuilder, RegistryHandle, RegistrySnapshot};
pub use types::{CompositionBehavior, Identifier, Placement, Severity, SourcePosition};
pub use version::{Version, VersionReq};
