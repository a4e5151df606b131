//! Text normalization: raw question → token sequence + keyword set.
//!
//! Steps, in order: NFC Unicode normalization (accented Vietnamese letters
//! compare consistently whether typed precomposed or combining), lowering,
//! punctuation spacing, Vietnamese word segmentation, stop-word removal,
//! noise-token removal. The segmentation capability is mandatory — there
//! is deliberately no whitespace-split fallback, since that would corrupt
//! retrieval quality silently.

use std::collections::BTreeSet;
use std::sync::Arc;

use luatbot_core::error::Result;
use luatbot_core::traits::Segmenter;
use luatbot_core::types::NormalizedQuery;
use unicode_normalization::UnicodeNormalization;

use crate::stopwords::StopWords;

pub struct Normalizer {
    segmenter: Arc<dyn Segmenter>,
    stopwords: Arc<StopWords>,
}

impl Normalizer {
    pub fn new(segmenter: Arc<dyn Segmenter>, stopwords: Arc<StopWords>) -> Self {
        Self {
            segmenter,
            stopwords,
        }
    }

    /// Normalize a raw question. Pure given the loaded resources: the same
    /// input always yields the same tokens and keywords.
    pub fn normalize(&self, raw: &str) -> Result<NormalizedQuery> {
        let canonical: String = raw.nfc().collect::<String>().to_lowercase();
        let spaced = separate_punctuation(&canonical);
        let segmented = self.segmenter.segment(&spaced)?;

        let tokens: Vec<String> = segmented
            .into_iter()
            .filter(|t| !is_noise(t))
            .filter(|t| !self.stopwords.contains(t))
            .collect();
        let keywords: BTreeSet<String> = tokens.iter().cloned().collect();

        tracing::debug!(token_count = tokens.len(), "normalized query");
        Ok(NormalizedQuery { tokens, keywords })
    }
}

/// Insert spaces between letters/digits and punctuation so that glued
/// punctuation ("60km/h," or "phạt?") never leaks into segmented tokens,
/// then collapse runs of whitespace.
fn separate_punctuation(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut prev_kind: Option<bool> = None; // true = word char
    for c in text.chars() {
        if c.is_whitespace() {
            out.push(' ');
            prev_kind = None;
            continue;
        }
        let is_word = c.is_alphanumeric();
        if let Some(prev) = prev_kind
            && prev != is_word
        {
            out.push(' ');
        }
        out.push(c);
        prev_kind = Some(is_word);
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A noise token carries no alphanumeric content (pure punctuation, empty).
fn is_noise(token: &str) -> bool {
    !token.chars().any(|c| c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::LexiconSegmenter;

    fn normalizer() -> Normalizer {
        let segmenter = Arc::new(LexiconSegmenter::from_words([
            "xe máy",
            "tốc độ",
            "giao thông",
            "bao nhiêu",
        ]));
        let stopwords = Arc::new(StopWords::from_words(["bị", "bao_nhiêu", "là", "gì"]));
        Normalizer::new(segmenter, stopwords)
    }

    #[test]
    fn full_pipeline_extracts_compound_keywords() {
        let q = normalizer()
            .normalize("Xe máy chạy quá tốc độ bị phạt bao nhiêu tiền?")
            .unwrap();
        assert!(q.tokens.contains(&"xe_máy".to_string()));
        assert!(q.tokens.contains(&"tốc_độ".to_string()));
        assert!(q.keywords.contains("phạt"));
        // Stop words (compound ones included) and punctuation are gone.
        assert!(!q.tokens.iter().any(|t| t == "bị" || t == "bao_nhiêu" || t == "?"));
    }

    #[test]
    fn normalize_is_idempotent() {
        let n = normalizer();
        let raw = "Xe máy vượt đèn đỏ thì bị phạt?";
        let first = n.normalize(raw).unwrap();
        let second = n.normalize(raw).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn combining_accents_normalize_to_precomposed() {
        let n = normalizer();
        // "máy" written with a combining acute accent (a + ́ + y).
        let decomposed = "xe ma\u{0301}y";
        let precomposed = "xe máy";
        assert_eq!(
            n.normalize(decomposed).unwrap(),
            n.normalize(precomposed).unwrap()
        );
    }

    #[test]
    fn punctuation_separation() {
        assert_eq!(separate_punctuation("phạt?xe,  máy"), "phạt ? xe , máy");
        assert_eq!(separate_punctuation("60km/h"), "60km / h");
    }

    #[test]
    fn noise_tokens_filtered() {
        assert!(is_noise("?!"));
        assert!(is_noise(""));
        assert!(!is_noise("xe_máy"));
        assert!(!is_noise("100"));
    }
}
