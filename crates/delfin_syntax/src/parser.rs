//! Parser for Delphi source units.
//!
//! Consumes the preprocessor's filtered token stream and produces a best-effort
//! [`Module`] plus syntax diagnostics. The parser never fails outright: on malformed
//! input it records a diagnostic, synchronizes at the next declaration or statement
//! boundary, and keeps going, so downstream analyses always receive a tree.
//!
//! ## Examples
//!
//! ```rust
//! use delfin_syntax::{lexer, parser};
//!
//! let tokens = lexer::lex("unit U; interface implementation end.").tokens;
//! let (module, diagnostics) = parser::parse(&tokens);
//! assert!(diagnostics.is_empty());
//! ```

use crate::ast::*;
use crate::diagnostics::Diagnostic;
use crate::lexer::{Token, TokenKind};
use delfin_core::lang::keywords::{self, KeywordId, RoutineDirectiveId};

// NOTE: This module is split across multiple files using `include!` to keep all parser
// methods in the same Rust module (preserving privacy + call patterns) while avoiding
// a single large source file.

include!("parser/core.rs");
include!("parser/helpers.rs");
include!("parser/decl.rs");
include!("parser/types.rs");
include!("parser/stmts.rs");
include!("parser/expr.rs");
include!("parser/tests.rs");
