//! Intrinsic (primitive) type vocabulary.
//!
//! This registry covers the built-in type names the compiler knows without any unit
//! being in scope: spellings, aliases, categories, and storage sizes. Semantics
//! (assignability, widening) live in the analyzer; this module is vocabulary only.
//!
//! ## Notes
//! - Lookup via [`from_str`] is **case-insensitive ASCII**.
//! - `Char` and `String` are aliases for their Unicode variants, matching the modern
//!   dialect default.
//!
//! ## Examples
//! ```rust
//! use delfin_core::lang::intrinsic_types::{self, IntrinsicKind};
//!
//! assert_eq!(intrinsic_types::from_str("integer"), Some(IntrinsicKind::Integer));
//! assert_eq!(intrinsic_types::from_str("Char"), Some(IntrinsicKind::WideChar));
//! assert_eq!(intrinsic_types::size(IntrinsicKind::WideChar), 2);
//! ```

/// Stable identifier for every intrinsic type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntrinsicKind {
    // Booleans
    Boolean,
    ByteBool,
    WordBool,
    LongBool,

    // Signed integers
    ShortInt,
    SmallInt,
    Integer,
    Int64,

    // Unsigned integers
    Byte,
    Word,
    Cardinal,
    UInt64,

    // Reals
    Single,
    Double,
    Extended,
    Currency,

    // Characters
    AnsiChar,
    WideChar,

    // Strings
    ShortString,
    AnsiString,
    WideString,
    UnicodeString,

    // Everything else
    Variant,
    Pointer,
}

/// Broad category of an intrinsic type, used by the analyzer's kind tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntrinsicCategory {
    Boolean,
    Integer,
    Real,
    Char,
    Text,
    Variant,
    Pointer,
}

/// Metadata for an intrinsic type.
#[derive(Debug, Clone, Copy)]
pub struct IntrinsicTypeInfo {
    pub kind: IntrinsicKind,
    /// Canonical spelling as it appears in documentation.
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
    pub category: IntrinsicCategory,
    /// Storage size in bytes. For string types this is the reference size; the
    /// character width that drives string compatibility comes from the char types.
    pub size: usize,
}

const fn info(
    kind: IntrinsicKind,
    canonical: &'static str,
    aliases: &'static [&'static str],
    category: IntrinsicCategory,
    size: usize,
) -> IntrinsicTypeInfo {
    IntrinsicTypeInfo {
        kind,
        canonical,
        aliases,
        category,
        size,
    }
}

/// Registry of intrinsic types.
pub const INTRINSIC_TYPES: &[IntrinsicTypeInfo] = &[
    info(IntrinsicKind::Boolean, "Boolean", &[], IntrinsicCategory::Boolean, 1),
    info(IntrinsicKind::ByteBool, "ByteBool", &[], IntrinsicCategory::Boolean, 1),
    info(IntrinsicKind::WordBool, "WordBool", &[], IntrinsicCategory::Boolean, 2),
    info(IntrinsicKind::LongBool, "LongBool", &[], IntrinsicCategory::Boolean, 4),
    info(IntrinsicKind::ShortInt, "ShortInt", &[], IntrinsicCategory::Integer, 1),
    info(IntrinsicKind::SmallInt, "SmallInt", &[], IntrinsicCategory::Integer, 2),
    info(
        IntrinsicKind::Integer,
        "Integer",
        &["LongInt"],
        IntrinsicCategory::Integer,
        4,
    ),
    info(IntrinsicKind::Int64, "Int64", &["NativeInt"], IntrinsicCategory::Integer, 8),
    info(IntrinsicKind::Byte, "Byte", &[], IntrinsicCategory::Integer, 1),
    info(IntrinsicKind::Word, "Word", &[], IntrinsicCategory::Integer, 2),
    info(
        IntrinsicKind::Cardinal,
        "Cardinal",
        &["LongWord"],
        IntrinsicCategory::Integer,
        4,
    ),
    info(
        IntrinsicKind::UInt64,
        "UInt64",
        &["NativeUInt"],
        IntrinsicCategory::Integer,
        8,
    ),
    info(IntrinsicKind::Single, "Single", &[], IntrinsicCategory::Real, 4),
    info(IntrinsicKind::Double, "Double", &["Real"], IntrinsicCategory::Real, 8),
    info(IntrinsicKind::Extended, "Extended", &[], IntrinsicCategory::Real, 10),
    info(IntrinsicKind::Currency, "Currency", &[], IntrinsicCategory::Real, 8),
    info(IntrinsicKind::AnsiChar, "AnsiChar", &[], IntrinsicCategory::Char, 1),
    info(
        IntrinsicKind::WideChar,
        "WideChar",
        &["Char"],
        IntrinsicCategory::Char,
        2,
    ),
    info(
        IntrinsicKind::ShortString,
        "ShortString",
        &[],
        IntrinsicCategory::Text,
        256,
    ),
    info(IntrinsicKind::AnsiString, "AnsiString", &[], IntrinsicCategory::Text, 8),
    info(IntrinsicKind::WideString, "WideString", &[], IntrinsicCategory::Text, 8),
    info(
        IntrinsicKind::UnicodeString,
        "UnicodeString",
        &["String"],
        IntrinsicCategory::Text,
        8,
    ),
    info(IntrinsicKind::Variant, "Variant", &["OleVariant"], IntrinsicCategory::Variant, 16),
    info(IntrinsicKind::Pointer, "Pointer", &[], IntrinsicCategory::Pointer, 8),
];

/// Resolve a type name to an [`IntrinsicKind`], case-insensitively.
pub fn from_str(name: &str) -> Option<IntrinsicKind> {
    if let Some(t) = INTRINSIC_TYPES.iter().find(|t| t.canonical.eq_ignore_ascii_case(name)) {
        return Some(t.kind);
    }
    INTRINSIC_TYPES
        .iter()
        .find(|t| t.aliases.iter().any(|a| a.eq_ignore_ascii_case(name)))
        .map(|t| t.kind)
}

fn lookup(kind: IntrinsicKind) -> &'static IntrinsicTypeInfo {
    INTRINSIC_TYPES
        .iter()
        .find(|t| t.kind == kind)
        .unwrap_or(&INTRINSIC_TYPES[0])
}

/// Canonical spelling of an intrinsic type.
pub fn as_str(kind: IntrinsicKind) -> &'static str {
    lookup(kind).canonical
}

/// Storage size in bytes.
pub fn size(kind: IntrinsicKind) -> usize {
    lookup(kind).size
}

/// Broad category of an intrinsic type.
pub fn category(kind: IntrinsicKind) -> IntrinsicCategory {
    lookup(kind).category
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modern_dialect_aliases() {
        assert_eq!(from_str("Char"), Some(IntrinsicKind::WideChar));
        assert_eq!(from_str("string"), Some(IntrinsicKind::UnicodeString));
        assert_eq!(from_str("Real"), Some(IntrinsicKind::Double));
        assert_eq!(from_str("LongInt"), Some(IntrinsicKind::Integer));
    }

    #[test]
    fn test_char_widths_drive_string_compatibility() {
        assert_eq!(size(IntrinsicKind::AnsiChar), 1);
        assert_eq!(size(IntrinsicKind::WideChar), 2);
    }

    #[test]
    fn test_registry_round_trips() {
        for t in INTRINSIC_TYPES {
            assert_eq!(from_str(t.canonical), Some(t.kind));
        }
    }
}
