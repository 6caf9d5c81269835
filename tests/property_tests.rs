//! Property-based tests for the analysis pipeline.
//!
//! Lexer, preprocessor, and parser properties live in `delfin_syntax`; here we
//! cover the end-to-end pipeline and the case-folding helpers it leans on.

use proptest::prelude::*;

use delfin::{analyze, AnalyzeOptions};
use delfin_core::strings;

// =============================================================================
// Pipeline robustness
// =============================================================================

proptest! {
    /// Property: Full analysis completes on arbitrary input; diagnostics come
    /// out ordered by source position.
    #[test]
    fn analysis_survives_arbitrary_input(source in "\\PC{0,60}") {
        let analysis = analyze(&source, "fuzz.pas", &AnalyzeOptions::default());
        for pair in analysis.diagnostics.windows(2) {
            prop_assert!(pair[0].span.start <= pair[1].span.start);
        }
    }
}

// =============================================================================
// Case-insensitive string properties
// =============================================================================

proptest! {
    /// Property: Folding is idempotent.
    #[test]
    fn case_folding_is_idempotent(s in "[A-Za-z0-9_]{0,16}") {
        let once = strings::fold(&s);
        prop_assert_eq!(strings::fold(&once), once.clone());
    }

    /// Property: A name compares equal to its own case variants.
    #[test]
    fn names_match_their_case_variants(s in "[A-Za-z0-9_]{0,16}") {
        prop_assert!(strings::eq_ignore_case(&s, &s.to_uppercase()));
        prop_assert!(strings::eq_ignore_case(&s, &s.to_lowercase()));
    }
}
