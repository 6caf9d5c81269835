//! Token types for the Delphi lexer.

use crate::ast::Span;
use delfin_core::lang::keywords::KeywordId;

/// Token types for Delphi source.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Reserved word, identified against the `delfin_core` keyword registry.
    Keyword(KeywordId),
    /// Identifier, with the `&` escape already stripped.
    Ident(String),

    // ========== Literals ==========
    IntLit(i64),
    RealLit(f64),
    /// String literal with quoting and `#NN` control characters already decoded.
    /// A single-character literal is also a character literal; the distinction is
    /// made during typing, not lexing.
    StrLit(String),

    // ========== Compiler directive ==========
    /// The inner text of a `{$...}` or `(*$...*)` comment, without the `$`.
    /// The preprocessor interprets these; uninterpreted ones survive into the
    /// filtered stream as annotations.
    Directive(String),

    // ========== Operators ==========
    Plus,      // +
    Minus,     // -
    Star,      // *
    Slash,     // /
    Eq,        // =
    NotEq,     // <>
    Lt,        // <
    Gt,        // >
    LtEq,      // <=
    GtEq,      // >=
    Assign,    // :=
    Caret,     // ^
    At,        // @
    Dot,       // .
    DotDot,    // ..
    Comma,     // ,
    Colon,     // :
    Semicolon, // ;

    // ========== Brackets ==========
    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]

    Eof,
}

/// A lexical unit: kind plus source position. Immutable once produced; AST nodes
/// reference positions, never tokens themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Identifier text, if this token is an identifier.
    pub fn ident(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_keyword(&self, id: KeywordId) -> bool {
        matches!(self.kind, TokenKind::Keyword(k) if k == id)
    }
}
