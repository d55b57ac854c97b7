#![forbid(unsafe_code)]

//! Annotation parsing: invocation grammar, parameter lists, canonical form

pub mod annotation;
pub mod args;
pub mod invocation;

/// Marker that opens an invocation at the start of a line
pub const MARKER: &str = "+++";

pub use annotation::{AnnotationParser, ParseWarning, ParsedText};
pub use args::{RawParam, RawValue};
pub use invocation::Invocation;
