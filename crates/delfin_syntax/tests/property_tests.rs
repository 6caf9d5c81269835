//! Property-based tests for the syntax frontend.
//!
//! These use proptest to verify lexer, preprocessor, and parser invariants
//! across many randomly generated inputs.

use proptest::prelude::*;

use delfin_core::lang::keywords;
use delfin_core::strings;
use delfin_syntax::lexer;
use delfin_syntax::parser;
use delfin_syntax::preprocessor::{NoIncludes, Preprocessor};

/// Strategy for valid Delphi identifiers that are not reserved words.
fn ident_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9_]{0,8}".prop_filter("Not a keyword", |s| {
        keywords::from_str(s).is_none()
    })
}

// =============================================================================
// Lexer properties
// =============================================================================

proptest! {
    /// Property: Token spans stay within the source and arrive in order.
    #[test]
    fn lexer_spans_stay_in_bounds(source in "\\PC{0,80}") {
        let output = lexer::lex(&source);
        let mut last_start = 0usize;
        for token in &output.tokens {
            prop_assert!(token.span.start <= token.span.end);
            prop_assert!(token.span.end <= source.len());
            prop_assert!(token.span.start >= last_start);
            last_start = token.span.start;
        }
    }

    /// Property: Identifier tokens round-trip their spelling.
    #[test]
    fn identifiers_survive_lexing(ident in ident_strategy()) {
        let source = format!("{ident} := 1");
        let output = lexer::lex(&source);
        prop_assert!(output.diagnostics.is_empty());
        prop_assert_eq!(output.tokens[0].ident(), Some(ident.as_str()));
    }
}

// =============================================================================
// Preprocessor properties
// =============================================================================

proptest! {
    /// Property: Tokens under a false conditional never survive filtering.
    #[test]
    fn false_branch_tokens_never_survive(hidden in ident_strategy()) {
        prop_assume!(!strings::eq_ignore_case(&hidden, "U"));
        prop_assume!(!strings::eq_ignore_case(&hidden, "Integer"));
        let source = format!(
            "unit U;\ninterface\n{{$IFDEF NEVER_SET}}\nvar\n  {hidden}: Integer;\n{{$ENDIF}}\nimplementation\nend."
        );
        let out = Preprocessor::new(&NoIncludes, &[]).process(&source, "u.pas");
        for token in &out.tokens {
            if let Some(name) = token.ident() {
                prop_assert!(!strings::eq_ignore_case(name, &hidden));
            }
        }
    }

    /// Property: The same branch survives when the condition is inverted via
    /// `{$IFNDEF}` on an undefined symbol.
    #[test]
    fn ifndef_on_undefined_symbols_keeps_the_branch(name in ident_strategy()) {
        let source = format!(
            "unit U;\ninterface\n{{$IFNDEF NEVER_SET}}\nvar\n  {name}: Integer;\n{{$ENDIF}}\nimplementation\nend."
        );
        let out = Preprocessor::new(&NoIncludes, &[]).process(&source, "u.pas");
        let found = out
            .tokens
            .iter()
            .filter_map(|t| t.ident())
            .any(|n| strings::eq_ignore_case(n, &name));
        prop_assert!(found);
    }
}

// =============================================================================
// Parser robustness
// =============================================================================

proptest! {
    /// Property: The parser recovers from arbitrary input without panicking.
    #[test]
    fn parser_survives_arbitrary_input(source in "\\PC{0,80}") {
        let tokens = lexer::lex(&source).tokens;
        let (_module, _diagnostics) = parser::parse(&tokens);
    }
}
