//! CLI argument parsing

pub mod args;

pub use args::{CliArgs, UnmappedArg};

use clap::Parser;

/// Parse command-line arguments
///
/// Exits the process with a usage message on invalid input.
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}
