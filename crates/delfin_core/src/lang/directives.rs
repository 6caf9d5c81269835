//! Compiler-directive name vocabulary.
//!
//! Directives appear inside `{$...}` and `(*$...*)` comments. The preprocessor acts on
//! the conditional-compilation family and on includes; every other directive is passed
//! through untouched so source positions stay accurate for diagnostics.
//!
//! ## Examples
//! ```rust
//! use delfin_core::lang::directives::{self, DirectiveId};
//!
//! assert_eq!(directives::from_str("IFDEF"), Some(DirectiveId::IfDef));
//! assert_eq!(directives::from_str("i"), Some(DirectiveId::Include));
//! ```

/// Stable identifier for directives the preprocessor interprets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveId {
    IfDef,
    IfNDef,
    Else,
    EndIf,
    /// `$IFEND` closes `$IF`-family blocks; treated identically to `$ENDIF`.
    IfEnd,
    Define,
    Undef,
    Include,
}

/// Metadata for an interpreted directive.
#[derive(Debug, Clone, Copy)]
pub struct DirectiveInfo {
    pub id: DirectiveId,
    /// Canonical lowercase spelling.
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
}

const fn info(id: DirectiveId, canonical: &'static str, aliases: &'static [&'static str]) -> DirectiveInfo {
    DirectiveInfo { id, canonical, aliases }
}

/// Registry of directives the preprocessor acts on.
pub const DIRECTIVES: &[DirectiveInfo] = &[
    info(DirectiveId::IfDef, "ifdef", &[]),
    info(DirectiveId::IfNDef, "ifndef", &[]),
    info(DirectiveId::Else, "else", &[]),
    info(DirectiveId::EndIf, "endif", &[]),
    info(DirectiveId::IfEnd, "ifend", &[]),
    info(DirectiveId::Define, "define", &[]),
    info(DirectiveId::Undef, "undef", &["undefine"]),
    // `$I` doubles as the short form of `$INCLUDE`; the preprocessor only treats it as
    // an include when an argument is present (bare `$I+`/`$I-` is IO checking).
    info(DirectiveId::Include, "include", &["i"]),
];

/// Resolve a directive name, case-insensitively.
pub fn from_str(name: &str) -> Option<DirectiveId> {
    if let Some(d) = DIRECTIVES.iter().find(|d| d.canonical.eq_ignore_ascii_case(name)) {
        return Some(d.id);
    }
    DIRECTIVES
        .iter()
        .find(|d| d.aliases.iter().any(|a| a.eq_ignore_ascii_case(name)))
        .map(|d| d.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conditional_family() {
        assert_eq!(from_str("IFDEF"), Some(DirectiveId::IfDef));
        assert_eq!(from_str("ifndef"), Some(DirectiveId::IfNDef));
        assert_eq!(from_str("EndIf"), Some(DirectiveId::EndIf));
        assert_eq!(from_str("IFEND"), Some(DirectiveId::IfEnd));
    }

    #[test]
    fn test_include_short_form() {
        assert_eq!(from_str("I"), Some(DirectiveId::Include));
        assert_eq!(from_str("include"), Some(DirectiveId::Include));
    }

    #[test]
    fn test_uninterpreted_directives_are_none() {
        assert_eq!(from_str("R"), None);
        assert_eq!(from_str("WARNINGS"), None);
        assert_eq!(from_str("MODE"), None);
    }
}
