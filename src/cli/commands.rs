//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::frontend::diagnostics::{print_diagnostic, Severity};
use crate::frontend::preprocessor::{self, NoIncludes};
use crate::frontend::{analyze, lexer, parser, AnalyzeOptions};

use super::{CliError, CliResult, ExitCode};

/// Analyze one unit and report its diagnostics.
///
/// Exit code is non-zero when any error-severity diagnostic was produced;
/// warnings and hints alone leave it at zero.
pub fn check_file(
    file: &Path,
    defines: &[String],
    include_paths: Vec<PathBuf>,
    fancy: bool,
) -> CliResult<ExitCode> {
    let source = read_source(file)?;
    let file_name = file.to_string_lossy();

    // The unit's own directory is always an include root.
    let mut include_paths = include_paths;
    if let Some(parent) = file.parent() {
        include_paths.push(parent.to_path_buf());
    }

    let options = AnalyzeOptions {
        defines: defines.to_vec(),
        include_paths,
    };
    let analysis = analyze(&source, &file_name, &options);

    for diagnostic in &analysis.diagnostics {
        if fancy {
            let report: miette::Report = diagnostic.to_report(&file_name, &source);
            eprintln!("{report:?}");
        } else {
            print_diagnostic(&file_name, &source, diagnostic);
        }
    }

    let errors = analysis
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    if errors > 0 {
        eprintln!(
            "{file_name}: {errors} error{} found",
            if errors == 1 { "" } else { "s" }
        );
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Parse one unit and print the recovered AST.
///
/// Runs the preprocessor with no defines so conditional branches behave as they
/// would in a default build, then parses whatever survives.
pub fn dump_file(file: &Path) -> CliResult<ExitCode> {
    let source = read_source(file)?;
    let file_name = file.to_string_lossy();

    let preprocessed =
        preprocessor::Preprocessor::new(&NoIncludes, &[]).process(&source, &file_name);
    let (module, diagnostics) = parser::parse(&preprocessed.tokens);

    println!("{module:#?}");
    for diagnostic in preprocessed.diagnostics.iter().chain(&diagnostics) {
        print_diagnostic(&file_name, &source, diagnostic);
    }
    Ok(ExitCode::SUCCESS)
}

/// Tokenize one unit and print the token stream. Debug aid.
pub fn lex_file(file: &Path) -> CliResult<ExitCode> {
    let source = read_source(file)?;
    let file_name = file.to_string_lossy();

    let lexed = lexer::lex(&source);
    for token in &lexed.tokens {
        println!("{:>5}..{:<5} {:?}", token.span.start, token.span.end, token.kind);
    }
    for diagnostic in &lexed.diagnostics {
        print_diagnostic(&file_name, &source, diagnostic);
    }
    Ok(ExitCode::SUCCESS)
}

fn read_source(file: &Path) -> CliResult<String> {
    fs::read_to_string(file)
        .map_err(|e| CliError::failure(format!("Error reading '{}': {e}", file.display())))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_unit(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("delfin_cmd_{}_{name}", std::process::id()));
        fs::write(&path, "unit U;\ninterface\nimplementation\nend.\n").unwrap();
        path
    }

    #[test]
    fn test_check_file_succeeds_on_clean_unit() {
        let path = temp_unit("check.pas");
        let result = check_file(&path, &[], Vec::new(), false);
        fs::remove_file(&path).ok();
        assert_eq!(result.unwrap(), ExitCode::SUCCESS);
    }

    #[test]
    fn test_dump_file_prints_the_tree() {
        let path = temp_unit("dump.pas");
        let result = dump_file(&path);
        fs::remove_file(&path).ok();
        assert_eq!(result.unwrap(), ExitCode::SUCCESS);
    }

    #[test]
    fn test_missing_file_is_a_cli_error() {
        let missing = std::env::temp_dir().join("delfin_cmd_does_not_exist.pas");
        assert!(check_file(&missing, &[], Vec::new(), false).is_err());
    }
}
