//! Canonical Delphi language vocabulary.
//!
//! Registries here are spellings plus metadata only; semantics (type compatibility,
//! overload resolution, intrinsic return-type computation) live in the analyzer crate.
//!
//! - [`keywords`] — reserved words of the grammar.
//! - [`directives`] — compiler-directive names recognized by the preprocessor.
//! - [`intrinsic_types`] — primitive type names, aliases, and storage sizes.
//! - [`intrinsic_routines`] — compiler-magic routines whose return type depends on
//!   their argument types.

pub mod directives;
pub mod intrinsic_routines;
pub mod intrinsic_types;
pub mod keywords;
