//! Transformation engine and diagnostics

pub mod diagnostics;
pub mod transformer;

pub use diagnostics::{Diagnostic, DiagnosticCode};
pub use transformer::{
    Explanation, InvalidPolicy, RawTextPolicy, TransformOptions, Transformation, Transformer,
};
