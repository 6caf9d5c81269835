//! Lexer for Delphi source text.
//!
//! Handles tokenization including:
//! - Case-insensitive keywords (via the `delfin_core` keyword registry)
//! - Identifiers (including the `&` reserved-word escape)
//! - Integer (decimal, `$` hex, `%` binary), real, and string/character literals
//! - Comments: `//`, `{ }`, `(* *)` — compiler directives (`{$...}`, `(*$...*)`)
//!   are emitted as [`TokenKind::Directive`] tokens for the preprocessor
//! - Operators and punctuation of the Delphi grammar
//!
//! The lexer never fails: malformed input produces diagnostics and a best-effort
//! token stream.

pub mod tokens;

pub use tokens::{Token, TokenKind};

use crate::ast::Span;
use crate::diagnostics::Diagnostic;
use delfin_core::lang::keywords;
use delfin_core::strings;

/// Result of lexing one source text.
#[derive(Debug)]
pub struct LexOutput {
    pub tokens: Vec<Token>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Tokenize Delphi source text.
pub fn lex(source: &str) -> LexOutput {
    let mut lexer = Lexer::new(source);
    lexer.run();
    LexOutput {
        tokens: lexer.tokens,
        diagnostics: lexer.diagnostics,
    }
}

/// Lexer state: a cursor over the source bytes plus accumulated output.
struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<Token>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn run(&mut self) {
        while self.pos < self.bytes.len() {
            let start = self.pos;
            let c = self.bytes[self.pos];
            match c {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    self.pos += 1;
                }
                b'/' if self.peek_at(1) == Some(b'/') => self.skip_line_comment(),
                b'{' => self.brace_comment_or_directive(start),
                b'(' if self.peek_at(1) == Some(b'*') => self.paren_star_comment_or_directive(start),
                b'\'' | b'#' => self.string_literal(start),
                b'0'..=b'9' => self.number(start),
                b'$' => self.hex_number(start),
                b'%' => self.bin_number(start),
                c if c == b'_' || c.is_ascii_alphabetic() || c == b'&' => self.ident_or_keyword(start),
                _ => self.operator(start),
            }
        }
        let end = self.source.len();
        self.push(TokenKind::Eof, Span::new(end, end));
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn push(&mut self, kind: TokenKind, span: Span) {
        self.tokens.push(Token::new(kind, span));
    }

    fn push_here(&mut self, kind: TokenKind, start: usize) {
        let span = Span::new(start, self.pos);
        self.push(kind, span);
    }

    // ========================================================================
    // Comments and directives
    // ========================================================================

    fn skip_line_comment(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
            self.pos += 1;
        }
    }

    fn brace_comment_or_directive(&mut self, start: usize) {
        // Consume '{'
        self.pos += 1;
        let is_directive = self.peek_at(0) == Some(b'$');
        if is_directive {
            self.pos += 1;
        }
        let content_start = self.pos;
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'}' {
            self.pos += 1;
        }
        if self.pos >= self.bytes.len() {
            self.diagnostics.push(Diagnostic::syntax(
                "Unterminated { comment",
                Span::new(start, self.source.len()),
            ));
            return;
        }
        let content = self.source[content_start..self.pos].to_string();
        self.pos += 1; // consume '}'
        if is_directive {
            self.push_here(TokenKind::Directive(content), start);
        }
    }

    fn paren_star_comment_or_directive(&mut self, start: usize) {
        // Consume '(*'
        self.pos += 2;
        let is_directive = self.peek_at(0) == Some(b'$');
        if is_directive {
            self.pos += 1;
        }
        let content_start = self.pos;
        while self.pos + 1 < self.bytes.len() && !(self.bytes[self.pos] == b'*' && self.bytes[self.pos + 1] == b')') {
            self.pos += 1;
        }
        if self.pos + 1 >= self.bytes.len() {
            self.pos = self.bytes.len();
            self.diagnostics.push(Diagnostic::syntax(
                "Unterminated (* comment",
                Span::new(start, self.source.len()),
            ));
            return;
        }
        let content = self.source[content_start..self.pos].to_string();
        self.pos += 2; // consume '*)'
        if is_directive {
            self.push_here(TokenKind::Directive(content), start);
        }
    }

    // ========================================================================
    // Literals
    // ========================================================================

    /// Scan a character string: any mix of `'...'` segments (with `''` escapes) and
    /// `#NN` / `#$HH` control characters, concatenated into one literal.
    fn string_literal(&mut self, start: usize) {
        let mut value = String::new();
        loop {
            match self.peek_at(0) {
                Some(b'\'') => {
                    self.pos += 1;
                    loop {
                        match self.peek_at(0) {
                            Some(b'\'') if self.peek_at(1) == Some(b'\'') => {
                                value.push('\'');
                                self.pos += 2;
                            }
                            Some(b'\'') => {
                                self.pos += 1;
                                break;
                            }
                            Some(b'\n') | None => {
                                self.diagnostics.push(Diagnostic::syntax(
                                    "Unterminated string literal",
                                    Span::new(start, self.pos),
                                ));
                                self.push_here(TokenKind::StrLit(value), start);
                                return;
                            }
                            Some(_) => {
                                // Multi-byte UTF-8 is copied through verbatim.
                                let ch_start = self.pos;
                                let ch = self.source[ch_start..].chars().next().unwrap_or('\u{FFFD}');
                                value.push(ch);
                                self.pos += ch.len_utf8();
                            }
                        }
                    }
                }
                Some(b'#') => {
                    self.pos += 1;
                    let code = if self.peek_at(0) == Some(b'$') {
                        self.pos += 1;
                        self.scan_while(|c| c.is_ascii_hexdigit())
                            .and_then(|digits| u32::from_str_radix(digits, 16).ok())
                    } else {
                        self.scan_while(|c| c.is_ascii_digit())
                            .and_then(|digits| digits.parse::<u32>().ok())
                    };
                    match code.and_then(char::from_u32) {
                        Some(ch) => value.push(ch),
                        None => self.diagnostics.push(Diagnostic::syntax(
                            "Invalid character code in string literal",
                            Span::new(start, self.pos),
                        )),
                    }
                }
                _ => break,
            }
        }
        self.push_here(TokenKind::StrLit(value), start);
    }

    /// Scan bytes matching a predicate and return the matched slice, or `None` if
    /// nothing matched.
    fn scan_while(&mut self, pred: fn(u8) -> bool) -> Option<&'a str> {
        let start = self.pos;
        while self.pos < self.bytes.len() && pred(self.bytes[self.pos]) {
            self.pos += 1;
        }
        (self.pos > start).then(|| &self.source[start..self.pos])
    }

    fn number(&mut self, start: usize) {
        self.scan_while(|c| c.is_ascii_digit());
        let mut is_real = false;
        // A '.' starts a fraction only if followed by a digit ('..' is a range).
        if self.peek_at(0) == Some(b'.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            is_real = true;
            self.pos += 1;
            self.scan_while(|c| c.is_ascii_digit());
        }
        if matches!(self.peek_at(0), Some(b'e' | b'E')) {
            let mark = self.pos;
            self.pos += 1;
            if matches!(self.peek_at(0), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if self.scan_while(|c| c.is_ascii_digit()).is_some() {
                is_real = true;
            } else {
                self.pos = mark;
            }
        }
        let text = &self.source[start..self.pos];
        if is_real {
            match text.parse::<f64>() {
                Ok(v) => self.push_here(TokenKind::RealLit(v), start),
                Err(_) => self
                    .diagnostics
                    .push(Diagnostic::syntax("Invalid real literal", Span::new(start, self.pos))),
            }
        } else {
            match text.parse::<i64>() {
                Ok(v) => self.push_here(TokenKind::IntLit(v), start),
                Err(_) => self
                    .diagnostics
                    .push(Diagnostic::syntax("Integer literal out of range", Span::new(start, self.pos))),
            }
        }
    }

    fn hex_number(&mut self, start: usize) {
        self.pos += 1; // consume '$'
        match self
            .scan_while(|c| c.is_ascii_hexdigit())
            .and_then(|digits| i64::from_str_radix(digits, 16).ok())
        {
            Some(v) => self.push_here(TokenKind::IntLit(v), start),
            None => self
                .diagnostics
                .push(Diagnostic::syntax("Invalid hexadecimal literal", Span::new(start, self.pos))),
        }
    }

    fn bin_number(&mut self, start: usize) {
        self.pos += 1; // consume '%'
        match self
            .scan_while(|c| c == b'0' || c == b'1')
            .and_then(|digits| i64::from_str_radix(digits, 2).ok())
        {
            Some(v) => self.push_here(TokenKind::IntLit(v), start),
            None => self
                .diagnostics
                .push(Diagnostic::syntax("Invalid binary literal", Span::new(start, self.pos))),
        }
    }

    // ========================================================================
    // Identifiers and keywords
    // ========================================================================

    fn ident_or_keyword(&mut self, start: usize) {
        let escaped = self.peek_at(0) == Some(b'&');
        if escaped {
            self.pos += 1;
        }
        self.scan_while(|c| c == b'_' || c.is_ascii_alphanumeric());
        let text = strings::unescape(&self.source[start..self.pos]);
        if text.is_empty() {
            self.diagnostics
                .push(Diagnostic::syntax("Stray '&'", Span::new(start, self.pos)));
            return;
        }
        // An escaped spelling is always an identifier, even if it matches a keyword.
        let kind = if escaped {
            TokenKind::Ident(text.to_string())
        } else {
            match keywords::from_str(text) {
                Some(id) => TokenKind::Keyword(id),
                None => TokenKind::Ident(text.to_string()),
            }
        };
        self.push_here(kind, start);
    }

    // ========================================================================
    // Operators and punctuation
    // ========================================================================

    fn operator(&mut self, start: usize) {
        let c = self.bytes[self.pos];
        self.pos += 1;
        let kind = match c {
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'*' => TokenKind::Star,
            b'/' => TokenKind::Slash,
            b'=' => TokenKind::Eq,
            b'^' => TokenKind::Caret,
            b'@' => TokenKind::At,
            b',' => TokenKind::Comma,
            b';' => TokenKind::Semicolon,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            b'.' => {
                if self.peek_at(0) == Some(b'.') {
                    self.pos += 1;
                    TokenKind::DotDot
                } else {
                    TokenKind::Dot
                }
            }
            b':' => {
                if self.peek_at(0) == Some(b'=') {
                    self.pos += 1;
                    TokenKind::Assign
                } else {
                    TokenKind::Colon
                }
            }
            b'<' => match self.peek_at(0) {
                Some(b'>') => {
                    self.pos += 1;
                    TokenKind::NotEq
                }
                Some(b'=') => {
                    self.pos += 1;
                    TokenKind::LtEq
                }
                _ => TokenKind::Lt,
            },
            b'>' => {
                if self.peek_at(0) == Some(b'=') {
                    self.pos += 1;
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }
            other => {
                self.diagnostics.push(Diagnostic::syntax(
                    format!("Unexpected character '{}'", other as char),
                    Span::new(start, self.pos),
                ));
                return;
            }
        };
        self.push_here(kind, start);
    }
}
