//! Initialize a decorators project
//!
//! Creates a starter decorators.toml and an example record under decorators/.

use std::fs;
use std::path::Path;

/// Default content for decorators.toml
const DEFAULT_DECORATORS_TOML: &str = r#"[decorators]
version = "1"
standard_version = "1.0.0"

# Registry directories, walked recursively
sources = ["decorators"]

# Record file patterns
# include = ["**/*.toml", "**/*.json"]
# exclude = ["drafts/**"]

[policy]
# keep | strip the raw text of unknown and malformed invocations
unknown = "keep"
malformed = "keep"
# strict | lenient handling of undeclared parameters
parameters = "strict"
# fail | skip when parameter validation fails
invalid = "fail"
# target = "text"

[output]
format = "human"
color = "auto"
"#;

/// Default content for decorators/example.toml
const EXAMPLE_RECORD_TOML: &str = r#"# Use it in a prompt with:
#   +++StepByStep(numbered=true)
[decorator]
name = "StepByStep"
version = "1.0.0"
description = "Structures the response as a sequence of steps"
category = "structure"

[[parameters]]
name = "numbered"
type = "boolean"
default = true
description = "Number each step"

[template]
instruction = "Break your answer into clear steps."
placement = "prepend"
composition = "accumulate"

[template.parameters.numbered.value_map]
true = "Number each step."
false = "Use bullet points instead of numbers."
"#;

/// Error type for init command
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Path error
    #[error("Path error: {0}")]
    Path(String),
}

/// Result of init command
#[derive(Debug, Default, PartialEq, Eq)]
pub struct InitResult {
    /// Files that were created
    pub created: Vec<String>,
    /// Files that were skipped (already existed)
    pub skipped: Vec<String>,
    /// Files that were overwritten
    pub overwritten: Vec<String>,
}

/// Run the init command in the current directory
///
/// Creates:
/// - decorators.toml (main configuration)
/// - decorators/ (registry directory)
/// - decorators/example.toml (an example record)
///
/// # Arguments
/// * `force` - If true, overwrite existing files. If false, skip existing files.
pub fn run_init(force: bool) -> Result<InitResult, InitError> {
    let mut result = InitResult::default();

    handle_file(
        Path::new("decorators.toml"),
        DEFAULT_DECORATORS_TOML,
        force,
        &mut result,
    )?;

    create_directory("decorators", &mut result)?;

    handle_file(
        Path::new("decorators/example.toml"),
        EXAMPLE_RECORD_TOML,
        force,
        &mut result,
    )?;

    Ok(result)
}

/// Handle creation of a single file
fn handle_file(
    path: &Path,
    content: &str,
    force: bool,
    result: &mut InitResult,
) -> Result<(), InitError> {
    let path_str = path_to_string(path)?;

    if path.exists() {
        if force {
            fs::write(path, content)?;
            result.overwritten.push(path_str);
        } else {
            result.skipped.push(path_str);
        }
    } else {
        fs::write(path, content)?;
        result.created.push(path_str);
    }

    Ok(())
}

/// Create a directory if it doesn't exist
fn create_directory(path: &str, result: &mut InitResult) -> Result<(), InitError> {
    let dir_path = Path::new(path);

    if dir_path.exists() {
        if dir_path.is_dir() {
            Ok(())
        } else {
            Err(InitError::Path(format!(
                "Path '{}' exists but is not a directory",
                path
            )))
        }
    } else {
        fs::create_dir_all(dir_path)?;
        result.created.push(format!("{}/", path));
        Ok(())
    }
}

fn path_to_string(path: &Path) -> Result<String, InitError> {
    path.to_str()
        .map(|s| s.to_string())
        .ok_or_else(|| InitError::Path(format!("Invalid UTF-8 in path: {:?}", path)))
}
