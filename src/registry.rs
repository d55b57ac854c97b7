#![forbid(unsafe_code)]

//! Decorator registry: record model, loading, snapshots and reloads
//!
//! Records are loaded in one explicit bulk phase into an immutable
//! [`RegistrySnapshot`]. Transformations only ever read a snapshot; the
//! [`RegistryHandle`] publishes replacements atomically.

pub mod handle;
pub mod loader;
pub mod record;
pub mod snapshot;

pub use handle::{RegistryHandle, RegistrySource};
pub use loader::{DEFAULT_INCLUDE, SourcePatterns};
pub use record::{
    Bounds, Compatibility, DecoratorRecord, FormatTemplate, Literal, ParameterDecl,
    ParameterEffect, ParameterSpec, ParameterType, RecordBuilder, RecordFormat, RecordOrigin,
    TransformationTemplate,
};
pub use snapshot::{RegistryBuilder, RegistrySnapshot};
