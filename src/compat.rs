#![forbid(unsafe_code)]

//! Advisory compatibility checks over one invocation group
//!
//! Issues never block composition; callers decide what to do with them.

use crate::registry::DecoratorRecord;
use crate::types::Severity;
use serde::Serialize;
use std::collections::BTreeSet;

/// What a compatibility issue is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Either decorator lists the other under `conflicts`
    Conflict,
    /// A `requires` entry is not present in the group
    MissingRequirement,
    /// The same decorator is invoked more than once
    DuplicateInvocation,
    /// The decorator does not list the configured target
    TargetMismatch,
}

impl IssueKind {
    pub fn severity(&self) -> Severity {
        match self {
            IssueKind::Conflict => Severity::Error,
            IssueKind::MissingRequirement | IssueKind::TargetMismatch => Severity::Warning,
            IssueKind::DuplicateInvocation => Severity::Info,
        }
    }
}

/// An advisory finding about the decorators in one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompatibilityIssue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub message: String,
    pub name_a: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_b: Option<String>,
}

impl CompatibilityIssue {
    fn new(kind: IssueKind, message: String, name_a: &str, name_b: Option<&str>) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            message,
            name_a: name_a.to_string(),
            name_b: name_b.map(str::to_string),
        }
    }
}

/// Checks conflicts, prerequisites, duplicates and targets
#[derive(Debug, Clone, Default)]
pub struct CompatibilityChecker {
    target: Option<String>,
}

impl CompatibilityChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also warn about decorators that do not apply to `target`
    pub fn with_target(target: impl Into<String>) -> Self {
        Self {
            target: Some(target.into()),
        }
    }

    /// Check records given in invocation order
    ///
    /// Issues come grouped: conflicts (every unordered pair once, earlier
    /// invocation as `name_a`), missing requirements, duplicate invocations,
    /// then target mismatches.
    pub fn check(&self, records: &[&DecoratorRecord]) -> Vec<CompatibilityIssue> {
        let mut issues = Vec::new();

        // First occurrence of each name, in invocation order
        let mut seen = BTreeSet::new();
        let mut distinct: Vec<&DecoratorRecord> = Vec::new();
        let mut duplicates: Vec<&str> = Vec::new();
        for &record in records {
            if seen.insert(record.name.as_str()) {
                distinct.push(record);
            } else if !duplicates.contains(&record.name.as_str()) {
                duplicates.push(record.name.as_str());
            }
        }

        for (i, a) in distinct.iter().enumerate() {
            for b in &distinct[i + 1..] {
                let (a_name, b_name) = (a.name.as_str(), b.name.as_str());
                if a.compatibility.conflicts_with(b_name) || b.compatibility.conflicts_with(a_name) {
                    issues.push(CompatibilityIssue::new(
                        IssueKind::Conflict,
                        format!("{} conflicts with {}", a_name, b_name),
                        a_name,
                        Some(b_name),
                    ));
                }
            }
        }

        for record in &distinct {
            for required in &record.compatibility.requires {
                if !seen.contains(required.as_str()) {
                    issues.push(CompatibilityIssue::new(
                        IssueKind::MissingRequirement,
                        format!("{} requires {}, which is not present", record.name, required),
                        record.name.as_str(),
                        Some(required.as_str()),
                    ));
                }
            }
        }

        for name in duplicates {
            issues.push(CompatibilityIssue::new(
                IssueKind::DuplicateInvocation,
                format!("{} is invoked more than once", name),
                name,
                None,
            ));
        }

        if let Some(target) = &self.target {
            for record in &distinct {
                if !record.compatibility.applies_to(target) {
                    let targets: Vec<&str> =
                        record.compatibility.targets.iter().map(String::as_str).collect();
                    issues.push(CompatibilityIssue::new(
                        IssueKind::TargetMismatch,
                        format!(
                            "{} does not apply to target '{}' (applies to: {})",
                            record.name,
                            target,
                            targets.join(", ")
                        ),
                        record.name.as_str(),
                        None,
                    ));
                }
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RecordBuilder;

    fn record(name: &str) -> RecordBuilder {
        RecordBuilder::new(name, "1.0.0").instruction(name)
    }

    #[test]
    fn test_mutual_conflict_reported_once() {
        let a = record("Reasoning").conflicts("Concise").build().unwrap();
        let b = record("Concise").conflicts("Reasoning").build().unwrap();

        let issues = CompatibilityChecker::new().check(&[&a, &b]);
        assert_eq!(issues.len(), 1);
        let issue = &issues[0];
        assert_eq!(issue.severity, Severity::Error);
        assert_eq!(issue.name_a, "Reasoning");
        assert_eq!(issue.name_b.as_deref(), Some("Concise"));
    }

    #[test]
    fn test_one_sided_conflict_detected() {
        let a = record("A").build().unwrap();
        let b = record("B").conflicts("A").build().unwrap();
        let issues = CompatibilityChecker::new().check(&[&a, &b]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::Conflict);
    }

    #[test]
    fn test_three_way_conflicts_all_reported() {
        let a = record("A").conflicts("B").conflicts("C").build().unwrap();
        let b = record("B").conflicts("C").build().unwrap();
        let c = record("C").build().unwrap();
        let issues = CompatibilityChecker::new().check(&[&a, &b, &c]);
        let pairs: Vec<(&str, &str)> = issues
            .iter()
            .map(|i| (i.name_a.as_str(), i.name_b.as_deref().unwrap()))
            .collect();
        assert_eq!(pairs, vec![("A", "B"), ("A", "C"), ("B", "C")]);
    }

    #[test]
    fn test_missing_requirement_warns() {
        let a = record("Refine").requires("Draft").build().unwrap();
        let issues = CompatibilityChecker::new().check(&[&a]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::MissingRequirement);
        assert_eq!(issues[0].severity, Severity::Warning);

        let draft = record("Draft").build().unwrap();
        assert!(CompatibilityChecker::new().check(&[&draft, &a]).is_empty());
    }

    #[test]
    fn test_duplicate_invocation_is_info() {
        let a = record("Tone").build().unwrap();
        let issues = CompatibilityChecker::new().check(&[&a, &a, &a]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::DuplicateInvocation);
        assert_eq!(issues[0].severity, Severity::Info);
    }

    #[test]
    fn test_target_mismatch() {
        let code_only = record("Lint").target("code").build().unwrap();
        let anywhere = record("Tone").build().unwrap();

        let issues = CompatibilityChecker::with_target("text").check(&[&code_only, &anywhere]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::TargetMismatch);
        assert_eq!(issues[0].name_a, "Lint");

        assert!(CompatibilityChecker::new().check(&[&code_only]).is_empty());
    }
}
