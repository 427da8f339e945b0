//! Text normalization around translation calls.
//!
//! Three stages:
//! 1. `preprocess` before the cache key is computed: collapse whitespace
//!    runs and rewrite rating phrases to their target-language form.
//! 2. `protect_terms` / `restore_terms` around the backend call: brand
//!    and technical terms are swapped for opaque placeholder tokens so
//!    the engine passes them through verbatim.
//! 3. `postprocess` after chunk reassembly: collapse punctuation marks
//!    doubled at chunk seams.

use once_cell::sync::Lazy;
use regex::Regex;

/// Terms the translation backend must never touch.
pub const PROTECTED_TERMS: &[&str] = &["ASIN", "USB-C", "HDMI", "WiFi", "Bluetooth"];

/// Star-rating phrases rewritten before translation; backends mangle
/// these often enough that a fixed mapping beats translating them.
const RATING_PHRASES: &[(&str, &str)] = &[
    ("5 stars", "5星"),
    ("4 stars", "4星"),
    ("3 stars", "3星"),
    ("2 stars", "2星"),
    ("1 star", "1星"),
];

/// Doubled sentence-ending marks introduced when translated chunks are
/// rejoined. One pattern per CJK mark; ASCII runs are left alone since
/// ellipses and "!!" are legitimate review text.
static DOUBLED_MARKS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        ("。{2,}", "。"),
        ("，{2,}", "，"),
        ("！{2,}", "！"),
        ("？{2,}", "？"),
    ]
    .iter()
    .map(|(pattern, replacement)| {
        // Patterns are fixed literals; construction cannot fail.
        (Regex::new(pattern).unwrap(), *replacement)
    })
    .collect()
});

/// Collapse every whitespace run (spaces, tabs, newlines) to one space
/// and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a text before keying and translating it.
pub fn preprocess(text: &str) -> String {
    let mut out = collapse_whitespace(text);
    for (phrase, replacement) in RATING_PHRASES {
        out = out.replace(phrase, replacement);
    }
    out
}

fn placeholder(index: usize) -> String {
    format!("§T{}§", index)
}

/// Replace each protected term with a placeholder token the backend will
/// pass through unchanged.
pub fn protect_terms(text: &str) -> String {
    let mut out = text.to_string();
    for (index, term) in PROTECTED_TERMS.iter().enumerate() {
        out = out.replace(term, &placeholder(index));
    }
    out
}

/// Swap placeholder tokens back to the original terms.
pub fn restore_terms(text: &str) -> String {
    let mut out = text.to_string();
    for (index, term) in PROTECTED_TERMS.iter().enumerate() {
        out = out.replace(&placeholder(index), term);
    }
    out
}

/// Clean up a reassembled translation: collapse doubled punctuation left
/// by chunk seams.
pub fn postprocess(text: &str) -> String {
    let mut out = text.to_string();
    for (regex, replacement) in DOUBLED_MARKS.iter() {
        out = regex.replace_all(&out, *replacement).into_owned();
    }
    out
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace_runs() {
        assert_eq!(
            collapse_whitespace("  great   product\n\tworks well  "),
            "great product works well"
        );
    }

    #[test]
    fn test_collapse_whitespace_identity_on_clean_text() {
        assert_eq!(collapse_whitespace("already clean"), "already clean");
    }

    #[test]
    fn test_preprocess_rewrites_rating_phrases() {
        assert_eq!(preprocess("I give it 5 stars"), "I give it 5星");
        assert_eq!(preprocess("only 1 star from me"), "only 1星 from me");
    }

    #[test]
    fn test_preprocess_is_idempotent() {
        let once = preprocess("  5 stars!  really   good ");
        assert_eq!(preprocess(&once), once);
    }

    #[test]
    fn test_protect_restore_roundtrip() {
        let text = "Checked the ASIN, the USB-C port and WiFi all work over HDMI and Bluetooth";
        let protected = protect_terms(text);
        for term in PROTECTED_TERMS {
            assert!(!protected.contains(term), "{} leaked through", term);
        }
        assert_eq!(restore_terms(&protected), text);
    }

    #[test]
    fn test_protect_without_terms_is_identity() {
        let text = "nothing technical here";
        assert_eq!(protect_terms(text), text);
        assert_eq!(restore_terms(text), text);
    }

    #[test]
    fn test_postprocess_collapses_doubled_marks() {
        assert_eq!(postprocess("很好。。下次再买。"), "很好。下次再买。");
        assert_eq!(postprocess("真的吗？？太棒了！！"), "真的吗？太棒了！");
    }

    #[test]
    fn test_postprocess_leaves_single_marks_alone() {
        let text = "很好。下次再买！";
        assert_eq!(postprocess(text), text);
    }

    #[test]
    fn test_postprocess_preserves_ascii_runs() {
        assert_eq!(postprocess("wait... really??"), "wait... really??");
    }
}

// =============================================================================
// PROPERTY-BASED TESTS
// =============================================================================
