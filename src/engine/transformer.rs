#![forbid(unsafe_code)]

//! The transformation pipeline
//!
//! parse, resolve, validate, check, compose. A [`Transformer`] borrows one
//! snapshot for its whole lifetime, so every call made through it sees the
//! same records even if the registry is reloaded meanwhile.

use crate::compat::{CompatibilityChecker, CompatibilityIssue};
use crate::compose::{Composition, Compositor, Fragment};
use crate::engine::diagnostics::{Diagnostic, DiagnosticCode};
use crate::error::{ExplainError, LookupError, TransformError, ValidationError};
use crate::parser::{AnnotationParser, Invocation};
use crate::registry::{DecoratorRecord, RegistrySnapshot};
use crate::types::{Identifier, Severity, SourcePosition};
use crate::validator::{ParameterValidator, ResolvedDirective, ValidationMode};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Whether the raw line of an unusable invocation stays in the output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawTextPolicy {
    /// Re-insert the line ahead of the clean text
    #[default]
    Keep,
    Strip,
}

/// What happens when an invocation's parameters fail validation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidPolicy {
    /// The call returns `TransformError::InvalidParameters`
    #[default]
    Fail,
    /// The invocation is dropped and reported as a diagnostic
    Skip,
}

/// Caller-selected policies for one transformer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformOptions {
    pub unknown: RawTextPolicy,
    pub malformed: RawTextPolicy,
    pub parameters: ValidationMode,
    pub invalid: InvalidPolicy,
    /// Target checked against each record's applicable targets
    pub target: Option<String>,
}

/// Output of one transformation call
#[derive(Debug, Clone)]
pub struct Transformation {
    /// Final text to hand to the downstream service
    pub text: String,
    /// Input with the invocation group removed
    pub clean_text: String,
    /// Directives that were composed, in invocation order
    pub directives: Vec<ResolvedDirective>,
    pub issues: Vec<CompatibilityIssue>,
    /// Positioned diagnostics in source order, then group-level ones
    pub diagnostics: Vec<Diagnostic>,
    pub composition: Composition,
}

impl Transformation {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Highest severity among the diagnostics
    pub fn max_severity(&self) -> Option<Severity> {
        self.diagnostics.iter().map(|d| d.severity).max()
    }
}

/// Preview of a single invocation
#[derive(Debug, Clone)]
pub struct Explanation {
    pub directive: ResolvedDirective,
    pub fragment: Fragment,
    pub dropped: Vec<Identifier>,
}

/// Runs the pipeline against one registry snapshot
#[derive(Debug, Clone)]
pub struct Transformer<'a> {
    snapshot: &'a RegistrySnapshot,
    options: TransformOptions,
    parser: AnnotationParser,
    validator: ParameterValidator,
    checker: CompatibilityChecker,
}

impl<'a> Transformer<'a> {
    pub fn new(snapshot: &'a RegistrySnapshot, options: TransformOptions) -> Self {
        let checker = match &options.target {
            Some(target) => CompatibilityChecker::with_target(target.clone()),
            None => CompatibilityChecker::new(),
        };
        Self {
            snapshot,
            validator: ParameterValidator::new(options.parameters),
            parser: AnnotationParser::new(),
            checker,
            options,
        }
    }

    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    /// Transform one text
    ///
    /// Soft problems (bad syntax, unknown decorators, unresolvable versions,
    /// compatibility issues) become diagnostics.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::InvalidParameters` with every failing
    /// invocation when parameters are invalid and the policy is
    /// [`InvalidPolicy::Fail`].
    pub fn transform(&self, input: &str) -> Result<Transformation, TransformError> {
        let parsed = self.parser.parse(input);

        let mut located = Vec::new();
        let mut kept: Vec<(SourcePosition, &str)> = Vec::new();
        for warning in &parsed.warnings {
            located.push(Diagnostic::parse_warning(warning));
            if self.options.malformed == RawTextPolicy::Keep {
                kept.push((warning.position, warning.raw.as_str()));
            }
        }

        let mut directives = Vec::new();
        let mut failures: Vec<ValidationError> = Vec::new();
        for invocation in &parsed.invocations {
            let record = match self.resolve(invocation) {
                Ok(record) => record,
                Err(e) => {
                    tracing::debug!(invocation = %invocation.raw, error = %e, "Invocation not resolved");
                    if matches!(e, LookupError::UnknownDecorator(_))
                        && self.options.unknown == RawTextPolicy::Keep
                    {
                        kept.push((invocation.position, invocation.raw.as_str()));
                    }
                    located.push(Diagnostic::lookup(&e, invocation.position));
                    continue;
                }
            };

            match self.validator.validate(record, &invocation.params) {
                Ok(validated) => {
                    for name in &validated.dropped {
                        located.push(
                            Diagnostic::new(
                                Severity::Warning,
                                DiagnosticCode::DroppedParameter,
                                format!("Dropped undeclared parameter '{}' of {}", name, record.name),
                            )
                            .for_decorator(record.name.to_string())
                            .at(invocation.position),
                        );
                    }
                    directives.push(validated.directive);
                }
                Err(e) => match self.options.invalid {
                    InvalidPolicy::Fail => failures.push(e),
                    InvalidPolicy::Skip => located.push(Diagnostic::validation(e, invocation.position)),
                },
            }
        }

        if !failures.is_empty() {
            return Err(TransformError::InvalidParameters(failures));
        }

        located.sort_by_key(|d| d.position);
        kept.sort_by_key(|(position, _)| *position);

        let records: Vec<&DecoratorRecord> = directives.iter().map(|d| d.record.as_ref()).collect();
        let issues = self.checker.check(&records);
        let mut diagnostics = located;
        diagnostics.extend(issues.iter().map(Diagnostic::compatibility));

        let body = with_kept_lines(&kept, &parsed.clean_text);
        let mut compositor = Compositor::new();
        for directive in &directives {
            compositor.push(directive);
        }
        let composition = compositor.finish(&body);

        for name in composition
            .prepend
            .discarded()
            .iter()
            .chain(composition.append.discarded())
        {
            diagnostics.push(
                Diagnostic::new(
                    Severity::Info,
                    DiagnosticCode::Overridden,
                    format!("Fragment of {} was replaced by a later override", name),
                )
                .for_decorator(name.clone()),
            );
        }

        Ok(Transformation {
            text: composition.text.clone(),
            clean_text: parsed.clean_text,
            directives,
            issues,
            diagnostics,
            composition,
        })
    }

    /// Transform many texts in parallel over the same snapshot
    ///
    /// Results are returned in input order.
    pub fn transform_batch<S>(&self, inputs: &[S]) -> Vec<Result<Transformation, TransformError>>
    where
        S: AsRef<str> + Sync,
    {
        inputs
            .par_iter()
            .map(|input| self.transform(input.as_ref()))
            .collect()
    }

    /// Resolve, validate and render a single invocation line
    ///
    /// # Errors
    ///
    /// Returns `ExplainError` when the line is not a well-formed invocation,
    /// cannot be resolved, or has invalid parameters.
    pub fn explain(&self, line: &str) -> Result<Explanation, ExplainError> {
        let parsed = self.parser.parse(line.trim());
        let invocation = match (parsed.invocations.first(), parsed.warnings.first()) {
            (Some(invocation), _) => invocation,
            (None, Some(warning)) => return Err(ExplainError::Parse(warning.message.clone())),
            (None, None) => {
                return Err(ExplainError::Parse(format!("'{}' does not start with an invocation", line.trim())));
            }
        };

        let record = self.resolve(invocation)?;
        let validated = self.validator.validate(record, &invocation.params)?;
        let fragment = Fragment::render(&validated.directive);
        Ok(Explanation {
            directive: validated.directive,
            fragment,
            dropped: validated.dropped,
        })
    }

    fn resolve(
        &self,
        invocation: &Invocation,
    ) -> Result<&'a std::sync::Arc<DecoratorRecord>, LookupError> {
        self.snapshot
            .lookup(invocation.name.as_str(), invocation.version.as_ref())
    }
}

/// Place kept raw invocation lines ahead of the clean text
fn with_kept_lines(kept: &[(SourcePosition, &str)], clean: &str) -> String {
    if kept.is_empty() {
        return clean.to_string();
    }
    let mut body = kept
        .iter()
        .map(|(_, line)| *line)
        .collect::<Vec<_>>()
        .join("\n");
    if !clean.is_empty() {
        body.push('\n');
        body.push_str(clean);
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ParameterDecl, ParameterType, RecordBuilder, RegistryBuilder};
    use crate::types::{CompositionBehavior, Placement};
    use crate::version::Version;

    fn snapshot() -> RegistrySnapshot {
        let records = vec![
            RecordBuilder::new("Reasoning", "1.0.0")
                .instruction("Reason step by step.")
                .parameter(
                    ParameterDecl::new("depth", ParameterType::Enum)
                        .values(["basic", "comprehensive"])
                        .default("basic"),
                )
                .value_map("depth", [("comprehensive", "Be thorough.")])
                .conflicts("Concise")
                .build()
                .unwrap(),
            RecordBuilder::new("Reasoning", "2.0.0")
                .instruction("Reasoning v2.")
                .build()
                .unwrap(),
            RecordBuilder::new("Concise", "1.0.0")
                .instruction("Be brief.")
                .build()
                .unwrap(),
            RecordBuilder::new("Summary", "1.0.0")
                .instruction("Summarize at the end.")
                .placement(Placement::Append)
                .composition(CompositionBehavior::Override)
                .build()
                .unwrap(),
        ];
        let mut builder = RegistryBuilder::new(Version::new(1, 0, 0));
        for record in records {
            builder.register(record).unwrap();
        }
        builder.build()
    }

    #[test]
    fn test_identity_without_invocations() {
        let snap = snapshot();
        let transformer = Transformer::new(&snap, TransformOptions::default());
        let result = transformer.transform("Just text.\n").unwrap();
        assert_eq!(result.text, "Just text.\n");
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_prepend_and_append() {
        let snap = snapshot();
        let transformer = Transformer::new(&snap, TransformOptions::default());
        let result = transformer
            .transform("+++Reasoning:v1(depth=comprehensive)\n+++Summary\nExplain X.\n")
            .unwrap();
        assert_eq!(
            result.text,
            "Reason step by step. Be thorough.\n\nExplain X.\n\nSummarize at the end."
        );
        assert_eq!(result.clean_text, "Explain X.\n");
        assert_eq!(result.directives.len(), 2);
    }

    #[test]
    fn test_unknown_kept_or_stripped() {
        let snap = snapshot();
        let keep = Transformer::new(&snap, TransformOptions::default());
        let result = keep.transform("+++Mystery(a=1)\n+++Concise\nText").unwrap();
        assert_eq!(result.text, "Be brief.\n\n+++Mystery(a=1)\nText");
        assert_eq!(result.diagnostics[0].code, DiagnosticCode::UnknownDecorator);

        let strip = Transformer::new(
            &snap,
            TransformOptions {
                unknown: RawTextPolicy::Strip,
                ..TransformOptions::default()
            },
        );
        let result = strip.transform("+++Mystery(a=1)\n+++Concise\nText").unwrap();
        assert_eq!(result.text, "Be brief.\n\nText");
    }

    #[test]
    fn test_malformed_line_does_not_abort() {
        let snap = snapshot();
        let transformer = Transformer::new(&snap, TransformOptions::default());
        let result = transformer.transform("+++Unknown123(bad syntax\nExplain X.").unwrap();
        assert!(result.text.contains("Explain X."));
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, DiagnosticCode::ParseWarning);
    }

    #[test]
    fn test_invalid_parameters_fail_or_skip() {
        let snap = snapshot();
        let input = "+++Reasoning:v1(depth=extreme)\n+++Concise(tone=dry)\nText";

        let fail = Transformer::new(&snap, TransformOptions::default());
        let Err(TransformError::InvalidParameters(errors)) = fail.transform(input) else {
            panic!("expected validation failure");
        };
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].decorator, "Reasoning");
        assert_eq!(errors[1].decorator, "Concise");

        let skip = Transformer::new(
            &snap,
            TransformOptions {
                invalid: InvalidPolicy::Skip,
                ..TransformOptions::default()
            },
        );
        let result = skip.transform(input).unwrap();
        assert_eq!(result.text, "Text");
        assert!(result.has_errors());
    }

    #[test]
    fn test_conflict_reported_but_composed() {
        let snap = snapshot();
        let transformer = Transformer::new(&snap, TransformOptions::default());
        let result = transformer
            .transform("+++Reasoning:v1\n+++Concise\nText")
            .unwrap();
        assert_eq!(result.text, "Reason step by step. Be brief.\n\nText");
        assert_eq!(result.issues.len(), 1);
        assert!(result.has_errors());
    }

    #[test]
    fn test_version_not_found_is_diagnostic() {
        let snap = snapshot();
        let transformer = Transformer::new(&snap, TransformOptions::default());
        let result = transformer.transform("+++Reasoning:v7\nText").unwrap();
        assert_eq!(result.text, "Text");
        assert_eq!(result.diagnostics[0].code, DiagnosticCode::VersionNotFound);
    }

    #[test]
    fn test_lenient_mode_drops_unknown_parameter() {
        let snap = snapshot();
        let transformer = Transformer::new(
            &snap,
            TransformOptions {
                parameters: ValidationMode::Lenient,
                ..TransformOptions::default()
            },
        );
        let result = transformer.transform("+++Concise(tone=dry)\nText").unwrap();
        assert_eq!(result.text, "Be brief.\n\nText");
        assert_eq!(result.diagnostics[0].code, DiagnosticCode::DroppedParameter);
    }

    #[test]
    fn test_batch_preserves_order() {
        let snap = snapshot();
        let transformer = Transformer::new(&snap, TransformOptions::default());
        let inputs = vec!["+++Concise\nA", "B", "+++Summary\nC"];
        let texts: Vec<String> = transformer
            .transform_batch(&inputs)
            .into_iter()
            .map(|r| r.unwrap().text)
            .collect();
        assert_eq!(texts, vec!["Be brief.\n\nA", "B", "C\n\nSummarize at the end."]);
    }

    #[test]
    fn test_explain() {
        let snap = snapshot();
        let transformer = Transformer::new(&snap, TransformOptions::default());
        let explanation = transformer.explain("+++Reasoning:v1(depth=comprehensive)").unwrap();
        assert_eq!(explanation.fragment.text, "Reason step by step. Be thorough.");
        assert_eq!(explanation.directive.record.version, Version::new(1, 0, 0));

        assert!(matches!(
            transformer.explain("not an invocation"),
            Err(ExplainError::Parse(_))
        ));
        assert!(matches!(
            transformer.explain("+++Nope"),
            Err(ExplainError::Lookup(_))
        ));
    }
}
