//! List command implementation
//!
//! Lists every loaded decorator record (all versions), optionally limited to
//! one category.

use crate::cli::args::OutputFormat;
use crate::cli::common::{
    EXIT_SUCCESS, GlobalOptions, load_context, load_registry, report_error,
};
use crate::error::DecoratorError;
use crate::output::{DecoratorListHumanFormatter, DecoratorListJsonlFormatter, DecoratorSummary};

/// Run the list command
///
/// # Returns
///
/// Exit code:
/// - 0: Success
/// - 2: Error (registry/I/O error)
/// - 3: Parse error (invalid decorators.toml)
pub fn run_list(globals: &GlobalOptions, category: Option<&str>, format: Option<OutputFormat>) -> i32 {
    match run_list_inner(globals, category, format) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => report_error(&e),
    }
}

fn run_list_inner(
    globals: &GlobalOptions,
    category: Option<&str>,
    format: Option<OutputFormat>,
) -> Result<(), DecoratorError> {
    let context = load_context(globals.config.as_deref())?;
    let handle = load_registry(&context)?;
    let snapshot = handle.current();

    let summaries: Vec<DecoratorSummary> = match category {
        Some(category) => snapshot
            .by_category(category)
            .into_iter()
            .map(|record| DecoratorSummary::new(record))
            .collect(),
        None => snapshot
            .iter()
            .map(|record| DecoratorSummary::new(record))
            .collect(),
    };

    match context.format(format) {
        OutputFormat::Human => {
            if summaries.is_empty() {
                match category {
                    Some(category) => println!("No decorators in category '{}'.", category),
                    None => println!("No decorators loaded."),
                }
            } else {
                print!("{}", DecoratorListHumanFormatter::new().format(&summaries));
            }
        }
        OutputFormat::Jsonl => {
            print!("{}", DecoratorListJsonlFormatter::new().format(&summaries));
        }
    }
    Ok(())
}
