//! Show command implementation
//!
//! `show Reasoning` prints the record the engine would pick by default,
//! `show Reasoning:v1` the best match for the selector, and
//! `show Reasoning:v1(depth=basic)` additionally renders that invocation's
//! fragment.

use crate::cli::args::OutputFormat;
use crate::cli::common::{
    EXIT_DIAGNOSTICS, EXIT_SUCCESS, GlobalOptions, load_context, load_registry, report_error,
};
use crate::engine::{Diagnostic, Explanation, Transformer};
use crate::error::{DecoratorError, ExplainError};
use crate::output::{DecoratorListHumanFormatter, DecoratorListJsonlFormatter, HumanFormatter, JsonlFormatter};
use crate::parser::{AnnotationParser, MARKER};
use serde::Serialize;
use std::io::Write;

/// Run the show command
///
/// # Returns
///
/// Exit code:
/// - 0: Success
/// - 1: The invocation's parameters are invalid
/// - 2: Error (unknown decorator, unmatched version, registry/I/O error)
/// - 3: Parse error (invalid decorators.toml)
pub fn run_show(globals: &GlobalOptions, decorator: &str, format: Option<OutputFormat>) -> i32 {
    match run_show_inner(globals, decorator, format) {
        Ok(code) => code,
        Err(e) => report_error(&e),
    }
}

fn run_show_inner(
    globals: &GlobalOptions,
    decorator: &str,
    format: Option<OutputFormat>,
) -> Result<i32, DecoratorError> {
    let context = load_context(globals.config.as_deref())?;
    let format = context.format(format);
    let handle = load_registry(&context)?;
    let snapshot = handle.current();

    let line = format!("{}{}", MARKER, decorator.trim().trim_start_matches(MARKER));
    let parsed = AnnotationParser::new().parse(&line);
    let invocation = match (parsed.invocations.first(), parsed.warnings.first()) {
        (Some(invocation), _) => invocation,
        (_, Some(warning)) => {
            return Err(ExplainError::Parse(format!("{} ({})", decorator, warning.message)).into());
        }
        (None, None) => return Err(ExplainError::Parse(decorator.to_string()).into()),
    };

    let record = snapshot.lookup(invocation.name.as_str(), invocation.version.as_ref())?;
    let versions: Vec<String> = snapshot
        .versions_of(invocation.name.as_str())
        .into_iter()
        .map(ToString::to_string)
        .collect();

    let explanation = if invocation.params.is_empty() {
        None
    } else {
        let transformer = Transformer::new(&snapshot, context.config.transform_options());
        match transformer.explain(&line) {
            Ok(explanation) => Some(explanation),
            Err(ExplainError::Validation(error)) => {
                let diagnostics = [Diagnostic::invalid_parameters(error)];
                match format {
                    OutputFormat::Human => {
                        let human = HumanFormatter::new(context.color(globals.color));
                        let mut stderr = human.stderr();
                        human.write_diagnostics(&mut stderr, &diagnostics)?;
                        stderr.flush()?;
                    }
                    OutputFormat::Jsonl => {
                        print!("{}", JsonlFormatter::new().format_diagnostics(&diagnostics));
                    }
                }
                return Ok(EXIT_DIAGNOSTICS);
            }
            Err(e) => return Err(e.into()),
        }
    };

    match format {
        OutputFormat::Human => {
            print!(
                "{}",
                DecoratorListHumanFormatter::new().format_record(record, &versions)
            );
            if let Some(explanation) = &explanation {
                print!("{}", render_human(explanation));
            }
        }
        OutputFormat::Jsonl => {
            print!("{}", DecoratorListJsonlFormatter::new().format_record(record));
            if let Some(explanation) = &explanation {
                println!("{}", serde_json::to_string(&FragmentRecord::new(explanation))?);
            }
        }
    }
    Ok(EXIT_SUCCESS)
}

fn render_human(explanation: &Explanation) -> String {
    let fragment = &explanation.fragment;
    let mut output = format!(
        "\nRendered ({}, {}):\n  {}\n",
        fragment.placement.as_str(),
        fragment.composition.as_str(),
        fragment.text
    );
    if !explanation.dropped.is_empty() {
        let dropped: Vec<&str> = explanation.dropped.iter().map(|n| n.as_str()).collect();
        output.push_str(&format!("  Dropped parameters: {}\n", dropped.join(", ")));
    }
    output
}

#[derive(Debug, Serialize)]
struct FragmentRecord<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    #[serde(flatten)]
    fragment: &'a crate::compose::Fragment,
    dropped: Vec<&'a str>,
}

impl<'a> FragmentRecord<'a> {
    fn new(explanation: &'a Explanation) -> Self {
        Self {
            record_type: "fragment",
            fragment: &explanation.fragment,
            dropped: explanation.dropped.iter().map(|n| n.as_str()).collect(),
        }
    }
}
