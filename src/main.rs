//! prompt-decorators CLI entry point

use clap::Parser;
use prompt_decorators::cli::{Command, GlobalOptions, args::Cli};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // --verbose forces debug, otherwise RUST_LOG or warn
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let globals = GlobalOptions {
        config: cli.config,
        color: cli.color,
    };

    let exit_code = match cli.command {
        Command::Init { force } => match prompt_decorators::cli::init::run_init(force) {
            Ok(result) => {
                for path in &result.created {
                    println!("Created {}", path);
                }
                for path in &result.overwritten {
                    println!("Overwrote {}", path);
                }
                for path in &result.skipped {
                    println!("Skipped {} (already exists, use --force to overwrite)", path);
                }
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                2
            }
        },
        Command::Apply {
            file,
            format,
            policy,
        } => prompt_decorators::cli::apply::run_apply(&globals, file.as_deref(), format, &policy),
        Command::Extract { file, format } => {
            prompt_decorators::cli::extract::run_extract(&globals, file.as_deref(), format)
        }
        Command::List { category, format } => {
            prompt_decorators::cli::list::run_list(&globals, category.as_deref(), format)
        }
        Command::Show { decorator, format } => {
            prompt_decorators::cli::show::run_show(&globals, &decorator, format)
        }
        Command::Check { format } => prompt_decorators::cli::check::run_check(&globals, format),
    };

    process::exit(exit_code);
}
