#![forbid(unsafe_code)]

//! JSONL output formatter for machine-readable output
//!
//! Outputs one JSON object per line in a deterministic order:
//! 1. All diagnostic records, in diagnostic order
//! 2. One summary record carrying the final text

use crate::engine::{Diagnostic, Transformation};
use crate::parser::{ParsedText, RawValue};
use crate::types::Severity;
use crate::validator::{ResolvedDirective, TypedValue};
use serde::Serialize;
use std::collections::BTreeMap;

/// JSONL output formatter
pub struct JsonlFormatter;

impl JsonlFormatter {
    pub fn new() -> Self {
        JsonlFormatter
    }

    /// Format a transformation as JSONL
    pub fn format(&self, transformation: &Transformation) -> String {
        let mut output = String::new();

        for diagnostic in &transformation.diagnostics {
            push_line(&mut output, &DiagnosticRecord::new(diagnostic));
        }

        let count = |severity: Severity| {
            transformation
                .diagnostics
                .iter()
                .filter(|d| d.severity == severity)
                .count()
        };
        let summary = SummaryRecord {
            record_type: "summary",
            directives: transformation.directives.iter().map(DirectiveRecord::new).collect(),
            errors: count(Severity::Error),
            warnings: count(Severity::Warning),
            infos: count(Severity::Info),
            text: &transformation.text,
        };
        push_line(&mut output, &summary);

        output
    }

    /// Diagnostic records only, for runs that produced no text
    pub fn format_diagnostics(&self, diagnostics: &[Diagnostic]) -> String {
        let mut output = String::new();
        for diagnostic in diagnostics {
            push_line(&mut output, &DiagnosticRecord::new(diagnostic));
        }
        output
    }

    /// Format the invocations of a parse, then one record with the clean text
    pub fn format_extraction(&self, parsed: &ParsedText) -> String {
        let mut output = String::new();

        for invocation in &parsed.invocations {
            let params: BTreeMap<&str, &RawValue> = invocation
                .params
                .iter()
                .map(|p| (p.name.as_str(), &p.value))
                .collect();
            push_line(
                &mut output,
                &InvocationRecord {
                    record_type: "invocation",
                    name: invocation.name.as_str(),
                    version: invocation.version.as_ref().map(ToString::to_string),
                    params,
                    line: invocation.position.line,
                    column: invocation.position.column,
                    canonical: invocation.to_canonical(),
                },
            );
        }
        for warning in &parsed.warnings {
            push_line(
                &mut output,
                &MalformedRecord {
                    record_type: "malformed",
                    line: warning.position.line,
                    column: warning.position.column,
                    message: &warning.message,
                    raw: &warning.raw,
                },
            );
        }
        push_line(
            &mut output,
            &CleanTextRecord {
                record_type: "clean_text",
                text: &parsed.clean_text,
            },
        );

        output
    }
}

impl Default for JsonlFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn push_line<T: Serialize>(output: &mut String, record: &T) {
    if let Ok(json) = serde_json::to_string(record) {
        output.push_str(&json);
        output.push('\n');
    }
}

/// Diagnostic record for JSONL output
#[derive(Debug, Serialize)]
struct DiagnosticRecord<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    #[serde(flatten)]
    diagnostic: &'a Diagnostic,
}

impl<'a> DiagnosticRecord<'a> {
    fn new(diagnostic: &'a Diagnostic) -> Self {
        Self {
            record_type: "diagnostic",
            diagnostic,
        }
    }
}

/// One applied directive in the summary record
#[derive(Debug, Serialize)]
struct DirectiveRecord<'a> {
    name: &'a str,
    version: String,
    values: BTreeMap<&'a str, &'a TypedValue>,
}

impl<'a> DirectiveRecord<'a> {
    fn new(directive: &'a ResolvedDirective) -> Self {
        Self {
            name: directive.name(),
            version: directive.record.version.to_string(),
            values: directive
                .values
                .iter()
                .map(|v| (v.name.as_str(), &v.value))
                .collect(),
        }
    }
}

/// Summary record for JSONL output
#[derive(Debug, Serialize)]
struct SummaryRecord<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    directives: Vec<DirectiveRecord<'a>>,
    errors: usize,
    warnings: usize,
    infos: usize,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct InvocationRecord<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    params: BTreeMap<&'a str, &'a RawValue>,
    line: u32,
    column: u32,
    canonical: String,
}

#[derive(Debug, Serialize)]
struct MalformedRecord<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    line: u32,
    column: u32,
    message: &'a str,
    raw: &'a str,
}

#[derive(Debug, Serialize)]
struct CleanTextRecord<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    text: &'a str,
}
