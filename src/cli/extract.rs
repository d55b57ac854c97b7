//! Extract command implementation
//!
//! Parses a prompt without consulting the registry and shows each invocation
//! in canonical form, the malformed marker lines, and the clean text.

use crate::cli::args::OutputFormat;
use crate::cli::common::{EXIT_SUCCESS, GlobalOptions, load_context, read_input, report_error};
use crate::error::DecoratorError;
use crate::output::{HumanFormatter, JsonlFormatter};
use crate::parser::AnnotationParser;
use std::io::Write;
use std::path::Path;

/// Run the extract command
///
/// # Returns
///
/// Exit code:
/// - 0: Success (malformed lines are reported, not fatal)
/// - 2: Error (I/O error)
/// - 3: Parse error (invalid decorators.toml)
pub fn run_extract(globals: &GlobalOptions, file: Option<&Path>, format: Option<OutputFormat>) -> i32 {
    match run_extract_inner(globals, file, format) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => report_error(&e),
    }
}

fn run_extract_inner(
    globals: &GlobalOptions,
    file: Option<&Path>,
    format: Option<OutputFormat>,
) -> Result<(), DecoratorError> {
    let context = load_context(globals.config.as_deref())?;
    let input = read_input(file)?;
    let parsed = AnnotationParser::new().parse(&input);

    match context.format(format) {
        OutputFormat::Human => {
            let human = HumanFormatter::new(context.color(globals.color));
            let mut stdout = human.stdout();
            human.write_extraction(&mut stdout, &parsed)?;
            stdout.flush()?;
        }
        OutputFormat::Jsonl => {
            print!("{}", JsonlFormatter::new().format_extraction(&parsed));
        }
    }
    Ok(())
}
