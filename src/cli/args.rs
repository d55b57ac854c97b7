//! CLI argument parsing using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for decorator commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON Lines format (one JSON object per line)
    Jsonl,
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Automatically detect if terminal supports color
    Auto,
    /// Always use color
    Always,
    /// Never use color
    Never,
}

/// prompt-decorators CLI main entry point
#[derive(Parser, Debug)]
#[command(name = "prompt-decorators")]
#[command(about = "Expand +++Decorator annotations into prompt instructions")]
#[command(version)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Output coloring (overrides [output] color)
    #[arg(long, global = true)]
    pub color: Option<ColorChoice>,

    /// Path to decorators.toml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Policy overrides for `apply`
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyArgs {
    /// Remove the raw text of unknown decorator invocations
    #[arg(long)]
    pub strip_unknown: bool,

    /// Remove the raw text of malformed invocations
    #[arg(long)]
    pub strip_malformed: bool,

    /// Drop undeclared parameters instead of rejecting them
    #[arg(long)]
    pub lenient: bool,

    /// Skip invocations with invalid parameters instead of failing
    #[arg(long)]
    pub skip_invalid: bool,

    /// Target checked against each decorator's applicable targets
    #[arg(long)]
    pub target: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Transform a prompt, printing the final text
    Apply {
        /// Input file (reads stdin when omitted or "-")
        file: Option<PathBuf>,

        /// Output format
        #[arg(short, long)]
        format: Option<OutputFormat>,

        #[command(flatten)]
        policy: PolicyArgs,
    },

    /// Show the invocations of a prompt and its clean text
    Extract {
        /// Input file (reads stdin when omitted or "-")
        file: Option<PathBuf>,

        /// Output format
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },

    /// List loaded decorators
    List {
        /// Only list decorators in this category
        #[arg(long)]
        category: Option<String>,

        /// Output format
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },

    /// Show one decorator, optionally rendering an invocation
    Show {
        /// NAME[:vSEL][(params)], e.g. Reasoning:v1(depth=basic)
        decorator: String,

        /// Output format
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },

    /// Validate the registry sources
    Check {
        /// Output format
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },

    /// Write a starter decorators.toml and an example record
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_apply_default_args() {
        let cli = Cli::parse_from(["prompt-decorators", "apply"]);
        match cli.command {
            Command::Apply {
                file,
                format,
                policy,
            } => {
                assert_eq!(file, None);
                assert_eq!(format, None);
                assert_eq!(policy, PolicyArgs::default());
            }
            _ => panic!("Expected Apply command"),
        }
        assert_eq!(cli.color, None);
        assert_eq!(cli.config, None);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_apply_with_policy_flags() {
        let cli = Cli::parse_from([
            "prompt-decorators",
            "apply",
            "prompt.txt",
            "--strip-unknown",
            "--lenient",
            "--skip-invalid",
            "--target",
            "code",
            "-f",
            "jsonl",
        ]);
        match cli.command {
            Command::Apply {
                file,
                format,
                policy,
            } => {
                assert_eq!(file, Some(PathBuf::from("prompt.txt")));
                assert_eq!(format, Some(OutputFormat::Jsonl));
                assert!(policy.strip_unknown);
                assert!(!policy.strip_malformed);
                assert!(policy.lenient);
                assert!(policy.skip_invalid);
                assert_eq!(policy.target.as_deref(), Some("code"));
            }
            _ => panic!("Expected Apply command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "prompt-decorators",
            "list",
            "--color",
            "never",
            "--config",
            "conf/decorators.toml",
            "-v",
        ]);
        assert_eq!(cli.color, Some(ColorChoice::Never));
        assert_eq!(cli.config, Some(PathBuf::from("conf/decorators.toml")));
        assert!(cli.verbose);
    }

    #[test]
    fn test_list_with_category() {
        let cli = Cli::parse_from(["prompt-decorators", "list", "--category", "reasoning"]);
        match cli.command {
            Command::List { category, format } => {
                assert_eq!(category.as_deref(), Some("reasoning"));
                assert_eq!(format, None);
            }
            _ => panic!("Expected List command"),
        }
    }

    #[test]
    fn test_show_requires_decorator() {
        assert!(Cli::try_parse_from(["prompt-decorators", "show"]).is_err());

        let cli = Cli::parse_from(["prompt-decorators", "show", "Reasoning:v1"]);
        match cli.command {
            Command::Show { decorator, .. } => assert_eq!(decorator, "Reasoning:v1"),
            _ => panic!("Expected Show command"),
        }
    }

    #[test]
    fn test_init_with_force() {
        let cli = Cli::parse_from(["prompt-decorators", "init", "--force"]);
        match cli.command {
            Command::Init { force } => assert!(force),
            _ => panic!("Expected Init command"),
        }
    }

    #[test]
    fn test_invalid_format_rejected() {
        assert!(Cli::try_parse_from(["prompt-decorators", "check", "--format", "xml"]).is_err());
    }
}
