//! Apply command implementation
//!
//! Transforms one prompt (a file or stdin). The final text is the only thing
//! written to stdout in human mode; diagnostics go to stderr. In JSONL mode
//! stdout carries the diagnostic records and a summary holding the text.

use crate::cli::args::{OutputFormat, PolicyArgs};
use crate::cli::common::{
    EXIT_DIAGNOSTICS, EXIT_SUCCESS, GlobalOptions, load_context, load_registry, read_input,
    report_error,
};
use crate::engine::{Diagnostic, InvalidPolicy, RawTextPolicy, TransformOptions, Transformer};
use crate::error::{DecoratorError, TransformError};
use crate::output::{HumanFormatter, JsonlFormatter};
use crate::validator::ValidationMode;
use std::io::Write;
use std::path::Path;

/// Run the apply command
///
/// # Returns
///
/// Exit code:
/// - 0: Success
/// - 1: Error-severity diagnostics, or invalid parameters under the fail policy
/// - 2: Error (registry/I/O error)
/// - 3: Parse error (invalid decorators.toml)
pub fn run_apply(
    globals: &GlobalOptions,
    file: Option<&Path>,
    format: Option<OutputFormat>,
    policy: &PolicyArgs,
) -> i32 {
    match run_apply_inner(globals, file, format, policy) {
        Ok(code) => code,
        Err(e) => report_error(&e),
    }
}

fn run_apply_inner(
    globals: &GlobalOptions,
    file: Option<&Path>,
    format: Option<OutputFormat>,
    policy: &PolicyArgs,
) -> Result<i32, DecoratorError> {
    let context = load_context(globals.config.as_deref())?;
    let format = context.format(format);
    let human = HumanFormatter::new(context.color(globals.color));

    let input = read_input(file)?;
    let handle = load_registry(&context)?;
    let snapshot = handle.current();

    let options = override_options(context.config.transform_options(), policy);
    let transformer = Transformer::new(&snapshot, options);

    let transformation = match transformer.transform(&input) {
        Ok(transformation) => transformation,
        Err(TransformError::InvalidParameters(errors)) => {
            let diagnostics: Vec<Diagnostic> = errors
                .into_iter()
                .map(Diagnostic::invalid_parameters)
                .collect();
            match format {
                OutputFormat::Human => {
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
    };

    match format {
        OutputFormat::Human => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(transformation.text.as_bytes())?;
            if !transformation.text.is_empty() && !transformation.text.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
            stdout.flush()?;
            human.report_to_stderr(&transformation)?;
        }
        OutputFormat::Jsonl => {
            print!("{}", JsonlFormatter::new().format(&transformation));
        }
    }

    if transformation.has_errors() {
        Ok(EXIT_DIAGNOSTICS)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// Command-line flags win over the configured policy
fn override_options(mut options: TransformOptions, policy: &PolicyArgs) -> TransformOptions {
    if policy.strip_unknown {
        options.unknown = RawTextPolicy::Strip;
    }
    if policy.strip_malformed {
        options.malformed = RawTextPolicy::Strip;
    }
    if policy.lenient {
        options.parameters = ValidationMode::Lenient;
    }
    if policy.skip_invalid {
        options.invalid = InvalidPolicy::Skip;
    }
    if let Some(target) = &policy.target {
        options.target = Some(target.clone());
    }
    options
}
