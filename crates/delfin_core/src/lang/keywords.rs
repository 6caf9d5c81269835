//! Define the reserved keyword vocabulary of the Delphi grammar.
//!
//! This module is the single source of truth for reserved words: a stable identifier
//! ([`KeywordId`]) plus a const metadata table ([`KEYWORDS`]) recording the canonical
//! (lowercase) spelling of each.
//!
//! ## Notes
//! - Lookup via [`from_str`] is **case-insensitive ASCII**, matching the language.
//! - Contextual routine directives (`overload`, `virtual`, `forward`, ...) are *not*
//!   reserved words; they are plain identifiers that the parser recognizes in
//!   directive position via [`routine_directive_from_str`].
//!
//! ## Examples
//! ```rust
//! use delfin_core::lang::keywords::{self, KeywordId};
//!
//! assert_eq!(keywords::from_str("BEGIN"), Some(KeywordId::Begin));
//! assert_eq!(keywords::as_str(KeywordId::Begin), "begin");
//! ```

/// Stable identifier for every reserved keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordId {
    // Module structure
    Unit,
    Program,
    Library,
    Interface,
    Implementation,
    Uses,
    In,

    // Declaration sections
    Type,
    Const,
    Var,
    Label,
    Threadvar,
    Property,

    // Routines
    Procedure,
    Function,
    Constructor,
    Destructor,
    Operator,
    Inherited,

    // Structured types
    Class,
    Record,
    Object,
    Packed,
    Set,
    Array,
    File,
    StringKw,
    Helper,
    Reference,
    Of,

    // Visibility
    Private,
    Protected,
    Public,
    Published,
    Strict,

    // Statements
    Begin,
    End,
    If,
    Then,
    Else,
    While,
    Do,
    For,
    To,
    Downto,
    Repeat,
    Until,
    Case,
    Try,
    Except,
    Finally,
    Raise,
    On,
    With,
    Goto,

    // Operators and literals
    Nil,
    Not,
    And,
    Or,
    Xor,
    Div,
    Mod,
    Shl,
    Shr,
    Is,
    As,
    Out,
}

/// Metadata for a reserved keyword.
#[derive(Debug, Clone, Copy)]
pub struct KeywordInfo {
    pub id: KeywordId,
    /// Canonical lowercase spelling.
    pub canonical: &'static str,
}

const fn info(id: KeywordId, canonical: &'static str) -> KeywordInfo {
    KeywordInfo { id, canonical }
}

/// Registry of reserved keywords.
pub const KEYWORDS: &[KeywordInfo] = &[
    info(KeywordId::Unit, "unit"),
    info(KeywordId::Program, "program"),
    info(KeywordId::Library, "library"),
    info(KeywordId::Interface, "interface"),
    info(KeywordId::Implementation, "implementation"),
    info(KeywordId::Uses, "uses"),
    info(KeywordId::In, "in"),
    info(KeywordId::Type, "type"),
    info(KeywordId::Const, "const"),
    info(KeywordId::Var, "var"),
    info(KeywordId::Label, "label"),
    info(KeywordId::Threadvar, "threadvar"),
    info(KeywordId::Property, "property"),
    info(KeywordId::Procedure, "procedure"),
    info(KeywordId::Function, "function"),
    info(KeywordId::Constructor, "constructor"),
    info(KeywordId::Destructor, "destructor"),
    info(KeywordId::Operator, "operator"),
    info(KeywordId::Inherited, "inherited"),
    info(KeywordId::Class, "class"),
    info(KeywordId::Record, "record"),
    info(KeywordId::Object, "object"),
    info(KeywordId::Packed, "packed"),
    info(KeywordId::Set, "set"),
    info(KeywordId::Array, "array"),
    info(KeywordId::File, "file"),
    info(KeywordId::StringKw, "string"),
    info(KeywordId::Helper, "helper"),
    info(KeywordId::Reference, "reference"),
    info(KeywordId::Of, "of"),
    info(KeywordId::Private, "private"),
    info(KeywordId::Protected, "protected"),
    info(KeywordId::Public, "public"),
    info(KeywordId::Published, "published"),
    info(KeywordId::Strict, "strict"),
    info(KeywordId::Begin, "begin"),
    info(KeywordId::End, "end"),
    info(KeywordId::If, "if"),
    info(KeywordId::Then, "then"),
    info(KeywordId::Else, "else"),
    info(KeywordId::While, "while"),
    info(KeywordId::Do, "do"),
    info(KeywordId::For, "for"),
    info(KeywordId::To, "to"),
    info(KeywordId::Downto, "downto"),
    info(KeywordId::Repeat, "repeat"),
    info(KeywordId::Until, "until"),
    info(KeywordId::Case, "case"),
    info(KeywordId::Try, "try"),
    info(KeywordId::Except, "except"),
    info(KeywordId::Finally, "finally"),
    info(KeywordId::Raise, "raise"),
    info(KeywordId::On, "on"),
    info(KeywordId::With, "with"),
    info(KeywordId::Goto, "goto"),
    info(KeywordId::Nil, "nil"),
    info(KeywordId::Not, "not"),
    info(KeywordId::And, "and"),
    info(KeywordId::Or, "or"),
    info(KeywordId::Xor, "xor"),
    info(KeywordId::Div, "div"),
    info(KeywordId::Mod, "mod"),
    info(KeywordId::Shl, "shl"),
    info(KeywordId::Shr, "shr"),
    info(KeywordId::Is, "is"),
    info(KeywordId::As, "as"),
    info(KeywordId::Out, "out"),
];

/// Resolve a spelling to a [`KeywordId`], case-insensitively.
pub fn from_str(name: &str) -> Option<KeywordId> {
    KEYWORDS
        .iter()
        .find(|k| k.canonical.eq_ignore_ascii_case(name))
        .map(|k| k.id)
}

/// Canonical (lowercase) spelling of a keyword.
pub fn as_str(id: KeywordId) -> &'static str {
    KEYWORDS
        .iter()
        .find(|k| k.id == id)
        .map(|k| k.canonical)
        .unwrap_or("<unknown>")
}

/// Contextual routine directives.
///
/// These are not reserved words; they only have meaning after a routine heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutineDirectiveId {
    Overload,
    Forward,
    Virtual,
    Override,
    Reintroduce,
    Abstract,
    Static,
    Inline,
    External,
    Cdecl,
    Stdcall,
    Safecall,
    RegisterCc,
}

const ROUTINE_DIRECTIVES: &[(RoutineDirectiveId, &str)] = &[
    (RoutineDirectiveId::Overload, "overload"),
    (RoutineDirectiveId::Forward, "forward"),
    (RoutineDirectiveId::Virtual, "virtual"),
    (RoutineDirectiveId::Override, "override"),
    (RoutineDirectiveId::Reintroduce, "reintroduce"),
    (RoutineDirectiveId::Abstract, "abstract"),
    (RoutineDirectiveId::Static, "static"),
    (RoutineDirectiveId::Inline, "inline"),
    (RoutineDirectiveId::External, "external"),
    (RoutineDirectiveId::Cdecl, "cdecl"),
    (RoutineDirectiveId::Stdcall, "stdcall"),
    (RoutineDirectiveId::Safecall, "safecall"),
    (RoutineDirectiveId::RegisterCc, "register"),
];

/// Resolve a contextual routine-directive spelling, case-insensitively.
pub fn routine_directive_from_str(name: &str) -> Option<RoutineDirectiveId> {
    ROUTINE_DIRECTIVES
        .iter()
        .find(|(_, s)| s.eq_ignore_ascii_case(name))
        .map(|(id, _)| *id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(from_str("BEGIN"), Some(KeywordId::Begin));
        assert_eq!(from_str("Begin"), Some(KeywordId::Begin));
        assert_eq!(from_str("begin"), Some(KeywordId::Begin));
    }

    #[test]
    fn test_non_keyword_is_none() {
        assert_eq!(from_str("WriteLn"), None);
        assert_eq!(from_str("overload"), None, "routine directives are contextual");
        assert_eq!(
            routine_directive_from_str("OVERLOAD"),
            Some(RoutineDirectiveId::Overload)
        );
    }

    #[test]
    fn test_registry_round_trips() {
        for kw in KEYWORDS {
            assert_eq!(from_str(kw.canonical), Some(kw.id));
            assert_eq!(as_str(kw.id), kw.canonical);
        }
    }
}
