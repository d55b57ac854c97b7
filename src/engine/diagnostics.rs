#![forbid(unsafe_code)]

//! Soft problems found while transforming one text

use crate::compat::{CompatibilityIssue, IssueKind};
use crate::error::{LookupError, ValidationError};
use crate::parser::ParseWarning;
use crate::types::{Severity, SourcePosition};
use serde::Serialize;
use std::fmt;

/// Stable identifier for each kind of diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCode {
    ParseWarning,
    UnknownDecorator,
    VersionNotFound,
    IncompatibleVersion,
    InvalidParameters,
    DroppedParameter,
    Overridden,
    Conflict,
    MissingRequirement,
    DuplicateInvocation,
    TargetMismatch,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::ParseWarning => "parse_warning",
            DiagnosticCode::UnknownDecorator => "unknown_decorator",
            DiagnosticCode::VersionNotFound => "version_not_found",
            DiagnosticCode::IncompatibleVersion => "incompatible_version",
            DiagnosticCode::InvalidParameters => "invalid_parameters",
            DiagnosticCode::DroppedParameter => "dropped_parameter",
            DiagnosticCode::Overridden => "overridden",
            DiagnosticCode::Conflict => "conflict",
            DiagnosticCode::MissingRequirement => "missing_requirement",
            DiagnosticCode::DuplicateInvocation => "duplicate_invocation",
            DiagnosticCode::TargetMismatch => "target_mismatch",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reportable finding
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decorator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<SourcePosition>,
    /// Structured detail for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationError>,
}

impl Diagnostic {
    pub fn new(severity: Severity, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            decorator: None,
            position: None,
            validation: None,
        }
    }

    pub fn at(mut self, position: SourcePosition) -> Self {
        self.position = Some(position);
        self
    }

    pub fn for_decorator(mut self, name: impl Into<String>) -> Self {
        self.decorator = Some(name.into());
        self
    }

    pub fn parse_warning(warning: &ParseWarning) -> Self {
        Self::new(
            Severity::Warning,
            DiagnosticCode::ParseWarning,
            format!("Malformed invocation '{}': {}", warning.raw.trim(), warning.message),
        )
        .at(warning.position)
    }

    pub fn lookup(error: &LookupError, position: SourcePosition) -> Self {
        let (severity, code, name) = match error {
            LookupError::UnknownDecorator(name) => {
                (Severity::Warning, DiagnosticCode::UnknownDecorator, name)
            }
            LookupError::VersionNotFound { name, .. } => {
                (Severity::Error, DiagnosticCode::VersionNotFound, name)
            }
            LookupError::IncompatibleVersion { name, .. } => {
                (Severity::Error, DiagnosticCode::IncompatibleVersion, name)
            }
        };
        Self::new(severity, code, error.to_string())
            .for_decorator(name.clone())
            .at(position)
    }

    pub fn validation(error: ValidationError, position: SourcePosition) -> Self {
        Self::invalid_parameters(error).at(position)
    }

    /// Validation failure without a source position
    pub fn invalid_parameters(error: ValidationError) -> Self {
        let mut diagnostic = Self::new(
            Severity::Error,
            DiagnosticCode::InvalidParameters,
            error.to_string(),
        )
        .for_decorator(error.decorator.clone());
        diagnostic.validation = Some(error);
        diagnostic
    }

    pub fn compatibility(issue: &CompatibilityIssue) -> Self {
        let code = match issue.kind {
            IssueKind::Conflict => DiagnosticCode::Conflict,
            IssueKind::MissingRequirement => DiagnosticCode::MissingRequirement,
            IssueKind::DuplicateInvocation => DiagnosticCode::DuplicateInvocation,
            IssueKind::TargetMismatch => DiagnosticCode::TargetMismatch,
        };
        Self::new(issue.severity, code, issue.message.clone()).for_decorator(issue.name_a.clone())
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(position) = &self.position {
            write!(f, "{}: ", position)?;
        }
        write!(f, "{} [{}]: {}", self.severity, self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_severity() {
        let position = SourcePosition::new(1, 1, 0);
        let unknown = Diagnostic::lookup(&LookupError::UnknownDecorator("X".to_string()), position);
        assert_eq!(unknown.severity, Severity::Warning);
        assert_eq!(unknown.code, DiagnosticCode::UnknownDecorator);
        assert_eq!(unknown.decorator.as_deref(), Some("X"));

        let missing = Diagnostic::lookup(
            &LookupError::VersionNotFound {
                name: "X".to_string(),
                selector: "9".to_string(),
            },
            position,
        );
        assert!(missing.is_error());
    }

    #[test]
    fn test_display_and_json() {
        let diagnostic = Diagnostic::new(Severity::Warning, DiagnosticCode::ParseWarning, "bad")
            .at(SourcePosition::new(2, 3, 10));
        assert_eq!(diagnostic.to_string(), "2:3: warning [parse_warning]: bad");

        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(json["code"], "parse_warning");
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["position"]["line"], 2);
        assert!(json.get("decorator").is_none());
    }
}
