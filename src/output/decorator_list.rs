#![forbid(unsafe_code)]

//! Registry listing formatters
//!
//! Used by the `list` and `show` commands. Both human-readable and JSONL
//! output are supported.

use crate::registry::{DecoratorRecord, ParameterEffect, ParameterSpec};
use serde::Serialize;

/// One row of `list` output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecoratorSummary {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub description: String,
    pub parameters: usize,
    pub placement: &'static str,
    pub composition: &'static str,
    pub origin: String,
}

impl DecoratorSummary {
    pub fn new(record: &DecoratorRecord) -> Self {
        Self {
            name: record.name.to_string(),
            version: record.version.to_string(),
            category: record.category.clone(),
            description: record.description.clone(),
            parameters: record.parameters.len(),
            placement: record.template.placement.as_str(),
            composition: record.template.composition.as_str(),
            origin: record.origin.to_string(),
        }
    }
}

/// Human-readable formatter for registry listings
pub struct DecoratorListHumanFormatter;

impl DecoratorListHumanFormatter {
    pub fn new() -> Self {
        DecoratorListHumanFormatter
    }

    /// Format a list of decorators, one block per record
    pub fn format(&self, summaries: &[DecoratorSummary]) -> String {
        let mut output = String::new();

        output.push_str(&format!("Decorators ({} loaded):\n", summaries.len()));
        output.push('\n');

        for summary in summaries {
            output.push_str(&format!("{} v{}", summary.name, summary.version));
            if let Some(category) = &summary.category {
                output.push_str(&format!(" [{}]", category));
            }
            output.push('\n');
            if !summary.description.is_empty() {
                output.push_str(&format!("  {}\n", summary.description));
            }
            output.push_str(&format!(
                "  Parameters: {}  Placement: {}  Composition: {}\n",
                summary.parameters, summary.placement, summary.composition
            ));
            output.push('\n');
        }

        output
    }

    /// Format one record in full
    pub fn format_record(&self, record: &DecoratorRecord, versions: &[String]) -> String {
        let mut output = String::new();

        output.push_str(&format!("{}\n", record.label()));
        if !record.description.is_empty() {
            output.push_str(&format!("  {}\n", record.description));
        }
        if let Some(category) = &record.category {
            output.push_str(&format!("  Category: {}\n", category));
        }
        output.push_str(&format!("  Source: {}\n", record.origin));
        if versions.len() > 1 {
            output.push_str(&format!("  Available versions: {}\n", versions.join(", ")));
        }

        output.push_str("\nParameters:\n");
        if record.parameters.is_empty() {
            output.push_str("  (none)\n");
        }
        for spec in &record.parameters {
            output.push_str(&format!("  {}\n", describe_parameter(spec)));
            if !spec.description.is_empty() {
                output.push_str(&format!("      {}\n", spec.description));
            }
        }

        let template = &record.template;
        output.push_str("\nTemplate:\n");
        output.push_str(&format!("  Instruction: {}\n", template.instruction));
        output.push_str(&format!(
            "  Placement: {}  Composition: {}\n",
            template.placement.as_str(),
            template.composition.as_str()
        ));
        for (name, effect) in &template.parameter_mapping {
            match effect {
                ParameterEffect::Format(format) => {
                    output.push_str(&format!("  {} -> format \"{}\"\n", name, format.as_str()));
                }
                ParameterEffect::ValueMap(map) => {
                    output.push_str(&format!("  {} -> value map\n", name));
                    for (value, text) in map {
                        output.push_str(&format!("      {} = \"{}\"\n", value, text));
                    }
                }
            }
        }

        let compat = &record.compatibility;
        let names = |set: &std::collections::BTreeSet<crate::types::Identifier>| {
            set.iter().map(|n| n.as_str()).collect::<Vec<_>>().join(", ")
        };
        output.push_str("\nCompatibility:\n");
        output.push_str(&format!("  Standard versions: {}\n", compat.standard));
        if !compat.requires.is_empty() {
            output.push_str(&format!("  Requires: {}\n", names(&compat.requires)));
        }
        if !compat.conflicts.is_empty() {
            output.push_str(&format!("  Conflicts: {}\n", names(&compat.conflicts)));
        }
        if !compat.targets.is_empty() {
            let targets: Vec<&str> = compat.targets.iter().map(String::as_str).collect();
            output.push_str(&format!("  Targets: {}\n", targets.join(", ")));
        }

        output
    }
}

impl Default for DecoratorListHumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn describe_parameter(spec: &ParameterSpec) -> String {
    let mut line = format!("{}: {}", spec.name, spec.kind.as_str());
    if !spec.enum_values.is_empty() {
        line.push_str(&format!(" [{}]", spec.enum_values.join(", ")));
    }
    if spec.required {
        line.push_str(" (required)");
    }
    if let Some(default) = &spec.default {
        line.push_str(&format!(" = {}", default));
    }
    let bounds = &spec.bounds;
    if bounds.min.is_some() || bounds.max.is_some() {
        line.push_str(&format!(
            " range {}..{}",
            bounds.min.map(|n| n.to_string()).unwrap_or_default(),
            bounds.max.map(|n| n.to_string()).unwrap_or_default()
        ));
    }
    if bounds.min_length.is_some() || bounds.max_length.is_some() {
        line.push_str(&format!(
            " length {}..{}",
            bounds.min_length.map(|n| n.to_string()).unwrap_or_default(),
            bounds.max_length.map(|n| n.to_string()).unwrap_or_default()
        ));
    }
    line
}

/// JSONL formatter for registry listings
pub struct DecoratorListJsonlFormatter;

impl DecoratorListJsonlFormatter {
    pub fn new() -> Self {
        DecoratorListJsonlFormatter
    }

    /// One JSON object per decorator
    pub fn format(&self, summaries: &[DecoratorSummary]) -> String {
        let mut output = String::new();
        for summary in summaries {
            if let Ok(json) = serde_json::to_string(summary) {
                output.push_str(&json);
                output.push('\n');
            }
        }
        output
    }

    /// The full record as a single JSON line
    pub fn format_record(&self, record: &DecoratorRecord) -> String {
        match serde_json::to_string(record) {
            Ok(json) => format!("{}\n", json),
            Err(_) => String::new(),
        }
    }
}

impl Default for DecoratorListJsonlFormatter {
    fn default() -> Self {
        Self::new()
    }
}
