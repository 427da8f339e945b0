//! Sentence-boundary chunking for long translations.
//!
//! Backends cap request size, so texts past the threshold are split on
//! `". "` boundaries into chunks, translated one by one in order, and
//! rejoined with a single space. Every chunk but the last gets its
//! boundary period back, so reassembly of an untranslated split
//! reproduces the input exactly.

/// Character threshold above which a text is split.
pub const MAX_CHUNK_CHARS: usize = 4000;

/// Split `text` into translation-sized chunks.
///
/// Texts at or under `max_chars` come back as a single chunk. A single
/// sentence longer than `max_chars` becomes its own oversized chunk;
/// there is no mid-sentence split.
pub fn split_for_translation(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;
    let mut chunk_start = true;

    for sentence in text.split(". ") {
        let sentence_chars = sentence.chars().count();
        // +2 for the ". " joiner, +1 for the boundary period restored below.
        if !chunk_start && current_chars + 2 + sentence_chars + 1 > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
            chunk_start = true;
        }
        if !chunk_start {
            current.push_str(". ");
            current_chars += 2;
        }
        current.push_str(sentence);
        current_chars += sentence_chars;
        chunk_start = false;
    }
    chunks.push(current);

    // Each chunk boundary consumed a ". " separator; give every chunk
    // except the last its period back.
    let last = chunks.len() - 1;
    for chunk in &mut chunks[..last] {
        chunk.push('.');
    }
    chunks
}

/// Rejoin translated chunks in their original order.
pub fn reassemble(parts: &[String]) -> String {
    parts.join(" ")
}

// =============================================================================
// TESTS
// =============================================================================


// =============================================================================
// PROPERTY-BASED TESTS
// =============================================================================

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Splitting then reassembling is the identity for any text.
        #[test]
        fn prop_split_reassemble_roundtrip(
            text in "[a-z .]{0,400}",
            max_chars in 10usize..200,
        ) {
            let chunks = split_for_translation(&text, max_chars);
            prop_assert_eq!(reassemble(&chunks), text);
        }
    }
}
