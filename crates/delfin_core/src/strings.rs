//! Case-insensitive identifier helpers.
//!
//! Delphi identifiers are case-insensitive: `WriteLn`, `writeln` and `WRITELN` name
//! the same declaration. Everything that keys a map by identifier (scopes, helper
//! registries, overload sets) must agree on one normalization, defined here.

/// Normalize an identifier for use as a lookup key.
///
/// Delphi identifiers are ASCII, so ASCII lowercasing is sufficient and keeps the
/// normalization locale-independent.
pub fn fold(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// Compare two identifiers the way the language does.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Strip the `&` escape prefix that lets reserved words be used as identifiers
/// (e.g. `&type`). The unescaped spelling is what declarations are keyed by.
pub fn unescape(name: &str) -> &str {
    name.strip_prefix('&').unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_is_case_insensitive() {
        assert_eq!(fold("TObject"), fold("TOBJECT"));
        assert_eq!(fold("WriteLn"), "writeln");
    }

    #[test]
    fn test_unescape_strips_ampersand() {
        assert_eq!(unescape("&type"), "type");
        assert_eq!(unescape("Plain"), "Plain");
    }
}
