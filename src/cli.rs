//! CLI argument parsing and command dispatch

pub mod apply;
pub mod args;
pub mod check;
pub mod common;
pub mod extract;
pub mod init;
pub mod list;
pub mod show;

pub use args::{Cli, ColorChoice, Command, OutputFormat, PolicyArgs};
pub use common::GlobalOptions;
