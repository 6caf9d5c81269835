//! CLI for the Delphi analysis frontend.
//!
//! ## Commands
//!
//! - `check <file>` - Analyze a unit and report diagnostics
//! - `dump <file>` - Parse a unit and print its recovered AST
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Static analysis frontend for Delphi source units
#[derive(Parser, Debug)]
#[command(name = "delfin")]
#[command(version = VERSION)]
#[command(about = "Static analysis frontend for Delphi source units", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// File to analyze (default action when no subcommand given)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a unit and report diagnostics
    Check {
        /// Source file to analyze
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Conditional symbol to predefine (repeatable)
        #[arg(short = 'd', long = "define", value_name = "SYMBOL")]
        defines: Vec<String>,
        /// Directory searched for include files (repeatable)
        #[arg(short = 'I', long = "include-path", value_name = "DIR")]
        include_paths: Vec<PathBuf>,
        /// Render diagnostics with full source context
        #[arg(long)]
        fancy: bool,
    },

    /// Parse a unit and print its recovered AST
    Dump {
        /// Source file to parse
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Tokenize a unit and print the token stream (debug)
    Lex {
        /// Source file to tokenize
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Some(Command::Check {
            file,
            defines,
            include_paths,
            fancy,
        }) => commands::check_file(&file, &defines, include_paths, fancy),
        Some(Command::Dump { file }) => commands::dump_file(&file),
        Some(Command::Lex { file }) => commands::lex_file(&file),
        None => {
            // Default: analyze the file if provided
            if let Some(file) = cli.file {
                commands::check_file(&file, &[], Vec::new(), false)
            } else {
                // No command and no file - show usage hint
                Err(CliError::failure("Usage: delfin <FILE> (see --help)"))
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_check() {
        let cli = Cli::try_parse_from(["delfin", "check", "unit.pas"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Check { .. })));
    }

    #[test]
    fn test_cli_parse_check_with_defines_and_includes() {
        let cli = Cli::try_parse_from([
            "delfin", "check", "unit.pas", "-d", "DEBUG", "-d", "MSWINDOWS", "-I", "inc",
        ])
        .unwrap();
        if let Some(Command::Check {
            defines,
            include_paths,
            ..
        }) = cli.command
        {
            assert_eq!(defines, vec!["DEBUG", "MSWINDOWS"]);
            assert_eq!(include_paths.len(), 1);
        } else {
            panic!("Expected Check command");
        }
    }

    #[test]
    fn test_cli_parse_dump() {
        let cli = Cli::try_parse_from(["delfin", "dump", "unit.pas"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Dump { .. })));
    }

    #[test]
    fn test_cli_bare_file_defaults_to_check() {
        let cli = Cli::try_parse_from(["delfin", "unit.pas"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.file.is_some());
    }
}
