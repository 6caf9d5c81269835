//! Provide shared, pure language vocabulary for the Delphi analysis frontend.
//!
//! This crate is intentionally small and dependency-free. It is the single source of
//! truth for spellings and metadata that both the syntax frontend and the semantic
//! analyzer need to agree on:
//! - reserved keywords and compiler-directive names,
//! - the intrinsic (primitive) type registry, including storage sizes,
//! - the intrinsic routine registry (compiler-magic functions like `High` or `Concat`),
//! - case-insensitive identifier helpers (Delphi identifiers ignore case).
//!
//! ## Notes
//!
//! - Every registry is a `static`/`const` table: no IO, no global mutable state, and
//!   safe for concurrent reads. The registries are the process-wide "intrinsic
//!   factory" data that per-unit analysis pipelines intern their primitive types from.

pub mod lang;
pub mod strings;
