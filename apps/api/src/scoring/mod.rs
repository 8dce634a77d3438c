// Relevance Scoring Engine
// Hybrid resume/JD score: dictionary + tagged keywords (Jaccard) fused with
// embedding cosine similarity, plus deterministic qualitative feedback.
// External capabilities (embedding, tagging) are injected; failures degrade to
// neutral defaults instead of propagating.

pub mod engine;
pub mod feedback;
pub mod handlers;
pub mod keywords;
pub mod semantic;
pub mod tagger;

pub use engine::{round2, DetailedCritique, ScoringEngine, ScoringWeights};

/// Returns at most `max_chars` characters of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_short_text_untouched() {
        assert_eq!(truncate_chars("rust", 10), "rust");
    }

    #[test]
    fn test_truncate_chars_respects_multibyte() {
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo");
    }

    #[test]
    fn test_truncate_chars_exact_length() {
        assert_eq!(truncate_chars("abc", 3), "abc");
    }
}
