//! Compiler-directive preprocessor.
//!
//! Consumes raw source text, interprets conditional compilation (`$IFDEF`/`$IFNDEF`/
//! `$ELSE`/`$ENDIF`), symbol definition (`$DEFINE`/`$UNDEF`), and textual inclusion
//! (`$I`/`$INCLUDE`), and produces the filtered token stream the parser consumes.
//!
//! ## Notes
//!
//! - Defines are scoped to one [`Preprocessor`] instance: one compilation unit plus
//!   everything it includes. Nothing leaks across units unless the host shares a
//!   predefined symbol set.
//! - Includes are resolved through the host-supplied [`IncludeResolver`]; the active
//!   include stack detects cycles, which fail with a `CircularInclude` diagnostic and
//!   an empty substitution instead of hanging.
//! - Directives the preprocessor does not interpret stay in the output stream as
//!   [`TokenKind::Directive`] tokens, so positions remain accurate downstream.
//! - An unterminated conditional block truncates gracefully: surviving tokens are
//!   kept and an `UnterminatedConditional` diagnostic is emitted.

pub mod directive;

pub use directive::{Directive, DirectiveKind};

use std::collections::HashSet;

use crate::ast::Span;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::lexer::{self, Token, TokenKind};
use delfin_core::strings;

/// Resolve include-directive targets to file contents.
///
/// The host owns path lookup and IO; the preprocessor only asks for "the text of
/// `types.inc`". Returning `None` produces an `UnresolvableInclude` diagnostic.
pub trait IncludeResolver {
    fn resolve(&self, name: &str) -> Option<String>;
}

/// Resolver for hosts that do not support includes.
pub struct NoIncludes;

impl IncludeResolver for NoIncludes {
    fn resolve(&self, _name: &str) -> Option<String> {
        None
    }
}

/// The filtered token stream produced by preprocessing, plus accumulated diagnostics.
#[derive(Debug)]
pub struct PreprocessedSource {
    pub tokens: Vec<Token>,
    pub diagnostics: Vec<Diagnostic>,
}

/// One frame of the conditional-compilation stack.
///
/// `active` says whether tokens in the current branch survive; `ever_taken` remembers
/// whether any branch of this `$IFDEF`/`$ELSE` chain has been active, so `$ELSE`
/// activates only when no earlier branch was taken.
#[derive(Debug, Clone, Copy)]
struct BranchFrame {
    active: bool,
    ever_taken: bool,
}

/// Preprocessor state for one compilation unit.
pub struct Preprocessor<'a> {
    resolver: &'a dyn IncludeResolver,
    /// Defined symbols, keyed case-insensitively.
    defines: HashSet<String>,
    /// Folded names of files currently being included, outermost first.
    include_stack: Vec<String>,
    frames: Vec<BranchFrame>,
    output: Vec<Token>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Preprocessor<'a> {
    /// Create a preprocessor with host-predefined symbols (e.g. `MSWINDOWS`).
    pub fn new(resolver: &'a dyn IncludeResolver, predefined: &[String]) -> Self {
        Self {
            resolver,
            defines: predefined.iter().map(|s| strings::fold(s)).collect(),
            include_stack: Vec::new(),
            frames: Vec::new(),
            output: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Preprocess one compilation unit's source text.
    #[tracing::instrument(skip_all, fields(file = file_name, len = source.len()))]
    pub fn process(mut self, source: &str, file_name: &str) -> PreprocessedSource {
        self.include_stack.push(strings::fold(file_name));
        self.consume(source);
        if !self.frames.is_empty() {
            self.diagnostics.push(Diagnostic::new(
                DiagnosticKind::UnterminatedConditional,
                "Conditional block not terminated before end of file",
                Span::new(source.len(), source.len()),
            ));
        }
        self.output.push(Token::new(TokenKind::Eof, Span::new(source.len(), source.len())));
        PreprocessedSource {
            tokens: self.output,
            diagnostics: self.diagnostics,
        }
    }

    fn consume(&mut self, source: &str) {
        let lexed = lexer::lex(source);
        self.diagnostics.extend(lexed.diagnostics);
        for token in lexed.tokens {
            match &token.kind {
                TokenKind::Directive(text) => {
                    let parsed = directive::parse(text, token.span);
                    self.handle_directive(parsed, token);
                }
                TokenKind::Eof => {}
                _ if self.is_active() => self.output.push(token),
                _ => {}
            }
        }
    }

    fn is_active(&self) -> bool {
        self.frames.iter().all(|f| f.active)
    }

    /// Whether everything *enclosing* the topmost frame is active.
    fn parent_active(&self) -> bool {
        self.frames.iter().rev().skip(1).all(|f| f.active)
    }

    fn handle_directive(&mut self, parsed: Directive, token: Token) {
        match parsed.kind {
            DirectiveKind::IfDef(name) => {
                let taken = self.is_active() && self.is_defined(&name);
                self.frames.push(BranchFrame {
                    active: taken,
                    ever_taken: taken,
                });
            }
            DirectiveKind::IfNDef(name) => {
                let taken = self.is_active() && !self.is_defined(&name);
                self.frames.push(BranchFrame {
                    active: taken,
                    ever_taken: taken,
                });
            }
            DirectiveKind::Else => {
                let parent_active = self.parent_active();
                match self.frames.last_mut() {
                    Some(frame) => {
                        frame.active = parent_active && !frame.ever_taken;
                        frame.ever_taken |= frame.active;
                    }
                    None => self.diagnostics.push(Diagnostic::syntax(
                        "$ELSE without a matching $IFDEF",
                        parsed.span,
                    )),
                }
            }
            DirectiveKind::EndIf => {
                if self.frames.pop().is_none() {
                    self.diagnostics.push(Diagnostic::syntax(
                        "$ENDIF without a matching $IFDEF",
                        parsed.span,
                    ));
                }
            }
            DirectiveKind::Define(name) => {
                if self.is_active() {
                    self.defines.insert(strings::fold(&name));
                }
            }
            DirectiveKind::Undef(name) => {
                if self.is_active() {
                    self.defines.remove(&strings::fold(&name));
                }
            }
            DirectiveKind::Include(name) => {
                if self.is_active() {
                    self.include(&name, parsed.span);
                }
            }
            DirectiveKind::Other(_) => {
                // Preserved as an annotation so later diagnostics keep their positions.
                if self.is_active() {
                    self.output.push(token);
                }
            }
        }
    }

    fn is_defined(&self, name: &str) -> bool {
        self.defines.contains(&strings::fold(name))
    }

    fn include(&mut self, name: &str, span: Span) {
        let folded = strings::fold(name);
        if self.include_stack.contains(&folded) {
            self.diagnostics.push(Diagnostic::new(
                DiagnosticKind::CircularInclude,
                format!("Include file '{name}' is already being included"),
                span,
            ));
            return;
        }
        let Some(contents) = self.resolver.resolve(name) else {
            self.diagnostics.push(Diagnostic::new(
                DiagnosticKind::UnresolvableInclude,
                format!("Cannot resolve include file '{name}'"),
                span,
            ));
            return;
        };
        self.include_stack.push(folded);
        self.consume(&contents);
        self.include_stack.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapResolver(HashMap<&'static str, &'static str>);

    impl IncludeResolver for MapResolver {
        fn resolve(&self, name: &str) -> Option<String> {
            self.0.get(name).map(|s| s.to_string())
        }
    }

    fn process(source: &str) -> PreprocessedSource {
        Preprocessor::new(&NoIncludes, &[]).process(source, "test.pas")
    }

    fn idents(out: &PreprocessedSource) -> Vec<String> {
        out.tokens
            .iter()
            .filter_map(|t| t.ident().map(|s| s.to_string()))
            .collect()
    }

    #[test]
    fn test_false_branch_tokens_are_dropped() {
        let out = process("{$IFDEF NOPE}hidden{$ENDIF}visible");
        assert_eq!(idents(&out), vec!["visible"]);
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn test_define_activates_branch() {
        let out = process("{$DEFINE YES}{$IFDEF YES}a{$ELSE}b{$ENDIF}");
        assert_eq!(idents(&out), vec!["a"]);
    }

    #[test]
    fn test_defines_are_case_insensitive() {
        let out = process("{$DEFINE Debug}{$IFDEF DEBUG}a{$ENDIF}");
        assert_eq!(idents(&out), vec!["a"]);
    }

    #[test]
    fn test_else_takes_untaken_chain() {
        let out = process("{$IFDEF NOPE}a{$ELSE}b{$ENDIF}");
        assert_eq!(idents(&out), vec!["b"]);
    }

    #[test]
    fn test_undef_deactivates_later_branch() {
        let out = process("{$DEFINE X}{$UNDEF X}{$IFDEF X}a{$ENDIF}b");
        assert_eq!(idents(&out), vec!["b"]);
    }

    #[test]
    fn test_nested_conditionals() {
        let out = process("{$DEFINE A}{$IFDEF A}x{$IFDEF B}y{$ENDIF}z{$ENDIF}");
        assert_eq!(idents(&out), vec!["x", "z"]);
    }

    #[test]
    fn test_defines_inside_false_branch_are_inert() {
        let out = process("{$IFDEF NOPE}{$DEFINE X}{$ENDIF}{$IFDEF X}a{$ENDIF}b");
        assert_eq!(idents(&out), vec!["b"]);
    }

    #[test]
    fn test_unterminated_conditional_truncates_gracefully() {
        let out = process("{$IFDEF NOPE}a");
        assert!(idents(&out).is_empty());
        assert!(
            out.diagnostics
                .iter()
                .any(|d| d.kind == DiagnosticKind::UnterminatedConditional)
        );
    }

    #[test]
    fn test_uninterpreted_directive_survives() {
        let out = process("{$WARNINGS OFF}x");
        assert!(matches!(&out.tokens[0].kind, TokenKind::Directive(t) if t == "WARNINGS OFF"));
        assert_eq!(idents(&out), vec!["x"]);
    }

    #[test]
    fn test_include_splices_tokens() {
        let resolver = MapResolver(HashMap::from([("types.inc", "included")]));
        let out = Preprocessor::new(&resolver, &[]).process("before {$I types.inc} after", "u.pas");
        assert_eq!(idents(&out), vec!["before", "included", "after"]);
    }

    #[test]
    fn test_include_shares_defines_with_includer() {
        let resolver = MapResolver(HashMap::from([("defs.inc", "{$DEFINE FROM_INC}")]));
        let out =
            Preprocessor::new(&resolver, &[]).process("{$I defs.inc}{$IFDEF FROM_INC}yes{$ENDIF}", "u.pas");
        assert_eq!(idents(&out), vec!["yes"]);
    }

    #[test]
    fn test_circular_include_terminates() {
        let resolver = MapResolver(HashMap::from([("a.inc", "{$I b.inc}"), ("b.inc", "{$I a.inc}")]));
        let out = Preprocessor::new(&resolver, &[]).process("{$I a.inc}done", "u.pas");
        assert_eq!(idents(&out), vec!["done"]);
        assert!(
            out.diagnostics
                .iter()
                .any(|d| d.kind == DiagnosticKind::CircularInclude)
        );
    }

    #[test]
    fn test_self_include_terminates() {
        let resolver = MapResolver(HashMap::from([("u.pas", "{$I u.pas}")]));
        let out = Preprocessor::new(&resolver, &[]).process("{$I u.pas}", "u.pas");
        assert!(
            out.diagnostics
                .iter()
                .any(|d| d.kind == DiagnosticKind::CircularInclude)
        );
    }

    #[test]
    fn test_unresolvable_include_is_diagnosed() {
        let out = process("{$I missing.inc}x");
        assert_eq!(idents(&out), vec!["x"]);
        assert!(
            out.diagnostics
                .iter()
                .any(|d| d.kind == DiagnosticKind::UnresolvableInclude)
        );
    }

    #[test]
    fn test_predefined_symbols() {
        let out = Preprocessor::new(&NoIncludes, &["MSWINDOWS".to_string()])
            .process("{$IFDEF MSWINDOWS}w{$ELSE}u{$ENDIF}", "u.pas");
        assert_eq!(idents(&out), vec!["w"]);
    }
}
