//! Syntax frontend for the delfin Delphi analyzer: lexer, preprocessor, parser, AST,
//! diagnostics.
//!
//! This crate is intentionally "syntax-only": it does not do name resolution or type
//! computation. Those live in the `delfin` analyzer crate, which consumes the AST
//! produced here.
//!
//! ## Pipeline
//!
//! 1. [`lexer`] turns raw source text into tokens, emitting `{$...}` comments as
//!    directive tokens.
//! 2. [`preprocessor`] interprets conditional-compilation and include directives and
//!    produces the filtered token stream the grammar sees.
//! 3. [`parser`] builds a best-effort [`ast::Module`] plus syntax diagnostics; it
//!    never fails outright on malformed input.
//!
//! ## Examples
//! ```rust
//! use delfin_syntax::{lexer, parser};
//!
//! let tokens = lexer::lex("unit U; interface implementation end.").tokens;
//! let (module, diagnostics) = parser::parse(&tokens);
//! assert!(diagnostics.is_empty());
//! assert_eq!(module.name.to_string(), "U");
//! ```

pub mod ast;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod preprocessor;
