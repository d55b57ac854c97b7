#![forbid(unsafe_code)]

//! Parsed invocations and their canonical form

use crate::parser::MARKER;
use crate::parser::args::{RawParam, RawValue};
use crate::types::{Identifier, SourcePosition};
use crate::version::VersionReq;

/// One parsed occurrence of a decorator marker with its raw arguments
///
/// Invocations only live for the duration of one transformation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Decorator name as written
    pub name: Identifier,

    /// Explicit version selector (`:v1`, `:v>=1.2`), if any
    pub version: Option<VersionReq>,

    /// Parameters in written order
    pub params: Vec<RawParam>,

    /// Where the marker starts in the input
    pub position: SourcePosition,

    /// The source line the invocation was parsed from, without its newline
    pub raw: String,
}

impl Invocation {
    /// Look up a raw parameter value by name
    pub fn param(&self, name: &str) -> Option<&RawValue> {
        self.params
            .iter()
            .find(|p| p.name.as_str() == name)
            .map(|p| &p.value)
    }

    /// Re-serialize to `+++Name[:vSELECTOR][(k=v, ...)]`
    ///
    /// A parameterless invocation without a selector reproduces exactly the
    /// marker followed by the name.
    pub fn to_canonical(&self) -> String {
        let mut out = String::from(MARKER);
        out.push_str(self.name.as_str());

        if let Some(version) = &self.version {
            out.push_str(":v");
            out.push_str(&version.to_string());
        }

        if !self.params.is_empty() {
            let params: Vec<String> = self
                .params
                .iter()
                .map(|p| format!("{}={}", p.name, p.value.to_syntax()))
                .collect();
            out.push('(');
            out.push_str(&params.join(", "));
            out.push(')');
        }

        out
    }
}
