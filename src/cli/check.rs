//! Check command implementation
//!
//! Loads every configured registry source and reports:
//! - structural errors (invalid or duplicate records) as a failed load
//! - source directories that do not exist
//! - `requires`/`conflicts` entries naming decorators that are not loaded
//! - decorators with no version supporting the active standard

use crate::cli::args::OutputFormat;
use crate::cli::common::{
    EXIT_SUCCESS, GlobalOptions, load_context, load_registry, report_error,
};
use crate::error::DecoratorError;
use crate::registry::RegistrySnapshot;
use serde::Serialize;
use std::path::PathBuf;

/// Something worth fixing in a registry that still loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryWarning {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decorator: Option<String>,
    pub message: String,
}

/// Counts and warnings for one registry load
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub records: usize,
    pub decorators: usize,
    pub categories: usize,
    pub standard: String,
    pub warnings: Vec<RegistryWarning>,
}

/// Run the check command
///
/// # Returns
///
/// Exit code:
/// - 0: Registry loaded (warnings do not fail the check)
/// - 2: Error (invalid or duplicate record, I/O error)
/// - 3: Parse error (invalid decorators.toml)
pub fn run_check(globals: &GlobalOptions, format: Option<OutputFormat>) -> i32 {
    match run_check_inner(globals, format) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => report_error(&e),
    }
}

fn run_check_inner(globals: &GlobalOptions, format: Option<OutputFormat>) -> Result<(), DecoratorError> {
    let context = load_context(globals.config.as_deref())?;
    let handle = load_registry(&context)?;
    let snapshot = handle.current();

    let missing: Vec<PathBuf> = context
        .config
        .decorators
        .sources
        .iter()
        .map(|dir| context.base.join(dir))
        .filter(|dir| !dir.exists())
        .collect();

    let report = audit(&snapshot, &missing);

    match context.format(format) {
        OutputFormat::Human => print!("{}", format_human(&report)),
        OutputFormat::Jsonl => println!("{}", serde_json::to_string(&report)?),
    }
    Ok(())
}

/// Inspect a loaded snapshot for dangling references and unusable decorators
pub fn audit(snapshot: &RegistrySnapshot, missing_sources: &[PathBuf]) -> CheckReport {
    let mut warnings: Vec<RegistryWarning> = missing_sources
        .iter()
        .map(|dir| RegistryWarning {
            decorator: None,
            message: format!("Source directory {} does not exist", dir.display()),
        })
        .collect();

    for record in snapshot.iter() {
        let compat = &record.compatibility;
        for (relation, names) in [("requires", &compat.requires), ("conflicts with", &compat.conflicts)] {
            for name in names {
                if !snapshot.contains(name.as_str()) {
                    warnings.push(RegistryWarning {
                        decorator: Some(record.name.to_string()),
                        message: format!(
                            "{} {} '{}', which is not loaded",
                            record.label(),
                            relation,
                            name
                        ),
                    });
                }
            }
        }
    }

    for name in snapshot.names() {
        if snapshot.latest(name).is_none() {
            warnings.push(RegistryWarning {
                decorator: Some(name.to_string()),
                message: format!(
                    "No version of {} supports standard {}; only explicit selectors resolve it",
                    name,
                    snapshot.standard()
                ),
            });
        }
    }

    CheckReport {
        records: snapshot.len(),
        decorators: snapshot.names().count(),
        categories: snapshot.categories().count(),
        standard: snapshot.standard().to_string(),
        warnings,
    }
}

fn format_human(report: &CheckReport) -> String {
    let mut output = format!(
        "Loaded {} record(s) for {} decorator(s) in {} categor{} (standard {})\n",
        report.records,
        report.decorators,
        report.categories,
        if report.categories == 1 { "y" } else { "ies" },
        report.standard
    );
    if !report.warnings.is_empty() {
        output.push_str(&format!("\nWarnings ({}):\n", report.warnings.len()));
        for warning in &report.warnings {
            output.push_str(&format!("  {}\n", warning.message));
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{RecordBuilder, RegistryBuilder};
    use crate::version::Version;

    fn snapshot() -> RegistrySnapshot {
        let mut builder = RegistryBuilder::new(Version::new(1, 0, 0));
        for record in [
            RecordBuilder::new("Reasoning", "1.0.0")
                .category("reasoning")
                .instruction("Reason.")
                .requires("Outline")
                .conflicts("Concise"),
            RecordBuilder::new("Concise", "1.0.0")
                .category("style")
                .instruction("Be brief."),
            RecordBuilder::new("Future", "3.0.0")
                .instruction("Later.")
                .standard_window(Some("2.0.0"), None),
        ] {
            builder.register(record.build().unwrap()).unwrap();
        }
        builder.build()
    }

    #[test]
    fn test_audit_counts() {
        let report = audit(&snapshot(), &[]);
        assert_eq!(report.records, 3);
        assert_eq!(report.decorators, 3);
        assert_eq!(report.categories, 2);
        assert_eq!(report.standard, "1.0.0");
    }

    #[test]
    fn test_audit_warnings() {
        let report = audit(&snapshot(), &[PathBuf::from("gone")]);
        let messages: Vec<&str> = report.warnings.iter().map(|w| w.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Source directory gone does not exist",
                "Reasoning v1.0.0 requires 'Outline', which is not loaded",
                "No version of Future supports standard 1.0.0; only explicit selectors resolve it",
            ]
        );
        assert_eq!(report.warnings[1].decorator.as_deref(), Some("Reasoning"));
    }

    #[test]
    fn test_format_human() {
        let output = format_human(&audit(&snapshot(), &[]));
        assert!(output.starts_with("Loaded 3 record(s) for 3 decorator(s) in 2 categories (standard 1.0.0)\n"));
        assert!(output.contains("Warnings (2):"));
    }
}
