//! Delphi analysis frontend.
//!
//! The pipeline runs preprocess, parse, resolve, type, in that order, and never
//! aborts: each stage accumulates diagnostics and hands a best-effort result to
//! the next. Syntax components (lexer, preprocessor, parser, AST) live in the
//! shared `delfin_syntax` crate; the semantic passes remain local:
//! - `symbols`: symbol table and scope management
//! - `resolver`: declaration collection and name binding
//! - `types`: the type model, assignability, intrinsic returns, overloads
//! - `typing`: expression typing over the resolved module

// Syntax components are provided by the shared delfin_syntax crate.
pub use delfin_syntax::{ast, diagnostics, lexer, parser, preprocessor};

// Semantic passes remain local.
pub mod resolver;
pub mod symbols;
pub mod types;
pub mod typing;

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use delfin_syntax::ast::{Module, Span};
use delfin_syntax::diagnostics::Diagnostic;
use delfin_syntax::preprocessor::{IncludeResolver, Preprocessor};

use crate::frontend::symbols::{SymbolId, SymbolTable};
use crate::frontend::types::{TypeArena, TypeId};
use crate::frontend::typing::ExpressionTyper;

/// Host-side knobs for one analysis.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    /// Conditional-compilation symbols defined before the unit's own directives.
    pub defines: Vec<String>,
    /// Directories searched, in order, for `{$I file.inc}` targets.
    pub include_paths: Vec<PathBuf>,
}

/// Resolves include directives against a list of search directories.
#[derive(Debug, Default)]
pub struct PathIncludeResolver {
    include_paths: Vec<PathBuf>,
}

impl PathIncludeResolver {
    pub fn new(include_paths: Vec<PathBuf>) -> Self {
        Self { include_paths }
    }
}

impl IncludeResolver for PathIncludeResolver {
    fn resolve(&self, name: &str) -> Option<String> {
        self.include_paths
            .iter()
            .find_map(|dir| fs::read_to_string(dir.join(name)).ok())
    }
}

/// Everything the frontend derives from one compilation unit.
#[derive(Debug)]
pub struct Analysis {
    pub module: Module,
    pub symbols: SymbolTable,
    /// Binding of each resolved name reference, keyed by the reference's span.
    pub name_refs: HashMap<Span, SymbolId>,
    pub arena: TypeArena,
    /// Computed type of each expression, keyed by the expression's span.
    pub expr_types: HashMap<Span, TypeId>,
    /// All diagnostics from every stage, ordered by source position.
    pub diagnostics: Vec<Diagnostic>,
}

/// Analyze one compilation unit end to end.
#[tracing::instrument(skip_all, fields(file = file_name, len = source.len()))]
pub fn analyze(source: &str, file_name: &str, options: &AnalyzeOptions) -> Analysis {
    let include_resolver = PathIncludeResolver::new(options.include_paths.clone());
    let preprocessed =
        Preprocessor::new(&include_resolver, &options.defines).process(source, file_name);
    let mut diagnostics = preprocessed.diagnostics;

    let (module, parse_diagnostics) = parser::parse(&preprocessed.tokens);
    diagnostics.extend(parse_diagnostics);

    let resolution = resolver::resolve(&module);
    diagnostics.extend(resolution.diagnostics);

    let mut typer = ExpressionTyper::new(&resolution.symbols, &resolution.name_refs);
    typer.check_module(&module);
    let (arena, expr_types, typing_diagnostics) = typer.into_parts();
    diagnostics.extend(typing_diagnostics);

    diagnostics.sort_by_key(|d| (d.span.start, d.span.end));

    tracing::debug!(
        symbols = resolution.symbols.len(),
        diagnostics = diagnostics.len(),
        "analysis complete"
    );

    Analysis {
        module,
        symbols: resolution.symbols,
        name_refs: resolution.name_refs,
        arena,
        expr_types,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_unit_analyzes_without_diagnostics() {
        let analysis = analyze(
            "unit U;\ninterface\nvar\n  N: Integer;\nimplementation\nprocedure P;\nbegin\n  N := N + 1;\nend;\nend.",
            "u.pas",
            &AnalyzeOptions::default(),
        );
        assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);
        assert!(analysis.symbols.len() > 0);
    }

    #[test]
    fn diagnostics_arrive_in_source_order() {
        let analysis = analyze(
            "unit U;\ninterface\nimplementation\nprocedure P;\nbegin\n  First := 1;\n  Second := 2;\nend;\nend.",
            "u.pas",
            &AnalyzeOptions::default(),
        );
        assert_eq!(analysis.diagnostics.len(), 2);
        assert!(analysis.diagnostics[0].span.start < analysis.diagnostics[1].span.start);
    }

    #[test]
    fn defines_flow_into_the_preprocessor() {
        let source = "unit U;\ninterface\n{$IFDEF FEATURE}\nvar\n  Enabled: Boolean;\n{$ENDIF}\nimplementation\nend.";
        let without = analyze(source, "u.pas", &AnalyzeOptions::default());
        assert!(without.symbols.lookup_local(0, "Enabled").is_none());
        let with = analyze(
            source,
            "u.pas",
            &AnalyzeOptions {
                defines: vec!["FEATURE".to_string()],
                ..Default::default()
            },
        );
        assert!(with.symbols.lookup_local(0, "Enabled").is_some());
    }
}
