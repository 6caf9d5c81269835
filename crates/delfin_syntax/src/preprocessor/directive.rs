//! Parsing of compiler-directive text into structured directives.
//!
//! The lexer hands us the inner text of a `{$...}` comment (e.g. `IFDEF DEBUG` or
//! `I types.inc`). Directives the preprocessor does not interpret are kept as
//! [`DirectiveKind::Other`] and passed through to the filtered stream.

use crate::ast::Span;
use delfin_core::lang::directives::{self, DirectiveId};

/// A parsed compiler directive. Created during preprocessing and consumed
/// immediately by the conditional-compilation machinery; uninterpreted directives
/// survive only as token-level annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub kind: DirectiveKind,
    /// Span of the originating directive token, for diagnostics.
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DirectiveKind {
    IfDef(String),
    IfNDef(String),
    Else,
    EndIf,
    Define(String),
    Undef(String),
    Include(String),
    /// Anything the preprocessor does not interpret (`$R`, `$WARNINGS`, `$IF`, ...).
    Other(String),
}

/// Parse the inner text of a directive comment.
pub fn parse(text: &str, span: Span) -> Directive {
    let trimmed = text.trim();
    let name_len = trimmed
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(trimmed.len());
    let (name, rest) = trimmed.split_at(name_len);
    let argument = rest.trim();

    let kind = match directives::from_str(name) {
        Some(DirectiveId::IfDef) => DirectiveKind::IfDef(argument.to_string()),
        Some(DirectiveId::IfNDef) => DirectiveKind::IfNDef(argument.to_string()),
        Some(DirectiveId::Else) => DirectiveKind::Else,
        Some(DirectiveId::EndIf) | Some(DirectiveId::IfEnd) => DirectiveKind::EndIf,
        Some(DirectiveId::Define) => DirectiveKind::Define(argument.to_string()),
        Some(DirectiveId::Undef) => DirectiveKind::Undef(argument.to_string()),
        // `$I` with no filename argument is the IO-checking switch (`$I+`/`$I-`),
        // which we do not interpret.
        Some(DirectiveId::Include) if !argument.is_empty() && argument != "+" && argument != "-" => {
            DirectiveKind::Include(unquote(argument).to_string())
        }
        _ => DirectiveKind::Other(trimmed.to_string()),
    };

    Directive { kind, span }
}

/// Include arguments may be quoted: `{$I 'file.inc'}`.
fn unquote(argument: &str) -> &str {
    argument
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(argument)
}
