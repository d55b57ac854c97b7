//! Common helper functions shared across CLI commands
//!
//! Loading configuration and the registry, reading input, and mapping
//! errors and flags onto exit codes and output settings.

use crate::cli::args::{ColorChoice, OutputFormat};
use crate::config::{self, CONFIG_FILE, ColorOption, Config};
use crate::error::{ConfigError, DecoratorError};
use crate::registry::RegistryHandle;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

pub const EXIT_SUCCESS: i32 = 0;
/// At least one error-severity diagnostic
pub const EXIT_DIAGNOSTICS: i32 = 1;
pub const EXIT_ERROR: i32 = 2;
pub const EXIT_PARSE_ERROR: i32 = 3;

/// Flags shared by every command
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub color: Option<ColorChoice>,
}

/// Loaded configuration plus the directory relative sources resolve against
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub config: Config,
    pub base: PathBuf,
}

impl CommandContext {
    pub fn format(&self, requested: Option<OutputFormat>) -> OutputFormat {
        requested.unwrap_or(match self.config.output.format {
            config::OutputFormat::Human => OutputFormat::Human,
            config::OutputFormat::Jsonl => OutputFormat::Jsonl,
        })
    }

    pub fn color(&self, requested: Option<ColorChoice>) -> termcolor::ColorChoice {
        let choice = requested.unwrap_or(match self.config.output.color {
            ColorOption::Auto => ColorChoice::Auto,
            ColorOption::Always => ColorChoice::Always,
            ColorOption::Never => ColorChoice::Never,
        });
        match choice {
            ColorChoice::Auto => termcolor::ColorChoice::Auto,
            ColorChoice::Always => termcolor::ColorChoice::Always,
            ColorChoice::Never => termcolor::ColorChoice::Never,
        }
    }
}

/// Load decorators.toml
///
/// Without an explicit path, `decorators.toml` in the current directory is
/// optional and defaults apply when it is missing.
///
/// # Errors
///
/// Returns `ConfigError::Io` if an explicitly named file does not exist.
/// Returns `ConfigError::Parse` or `ConfigError::Validation` if the file is invalid.
pub(crate) fn load_context(path: Option<&Path>) -> Result<CommandContext, ConfigError> {
    let config = match path {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{} not found", path.display()),
                )));
            }
            Config::load(path)?
        }
        None => Config::load_or_default(CONFIG_FILE)?,
    };

    let base = path
        .and_then(Path::parent)
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    Ok(CommandContext { config, base })
}

/// Load every configured registry source
pub(crate) fn load_registry(context: &CommandContext) -> Result<RegistryHandle, DecoratorError> {
    let source = context.config.registry_source(&context.base)?;
    Ok(RegistryHandle::init(source)?)
}

/// Read the input text from a file, or stdin when no file (or "-") is given
pub(crate) fn read_input(file: Option<&Path>) -> io::Result<String> {
    match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path),
        _ => {
            let mut input = String::new();
            io::stdin().read_to_string(&mut input)?;
            Ok(input)
        }
    }
}

/// Exit code for a command that failed outright
pub(crate) fn exit_code_for(error: &DecoratorError) -> i32 {
    match error {
        DecoratorError::Config(ConfigError::Parse(_) | ConfigError::Validation(_)) => {
            EXIT_PARSE_ERROR
        }
        _ => EXIT_ERROR,
    }
}

/// Print the error and return its exit code
pub(crate) fn report_error(error: &DecoratorError) -> i32 {
    eprintln!("Error: {}", error);
    exit_code_for(error)
}
