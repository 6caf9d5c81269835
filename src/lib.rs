#![forbid(unsafe_code)]
//! Delfin: a source-analysis frontend for Delphi (Object Pascal) units.
//!
//! The crate turns raw unit text into an analyzed module: preprocessed token
//! stream, recovered AST, symbol table with name bindings, and memoized
//! expression types, plus diagnostics from every stage. Nothing here executes
//! or compiles Delphi; the output is meant for analyzers and tooling.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`.
//!   The `cli` module enforces `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **True invariants**: If a panic represents a bug in the analyzer itself,
//!   use `.expect("INVARIANT: reason")` with a clear explanation.

pub mod cli;
pub mod frontend;

pub use frontend::ast;
pub use frontend::diagnostics;
pub use frontend::lexer;
pub use frontend::parser;
pub use frontend::preprocessor;
pub use frontend::symbols;

pub use frontend::{analyze, Analysis, AnalyzeOptions, PathIncludeResolver};
