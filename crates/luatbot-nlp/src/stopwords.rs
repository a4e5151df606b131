//! Configurable Vietnamese stop-word set.
//!
//! File format follows the corpus convention: one word per line, compound
//! words with syllables joined by `_` (matching segmenter output).

use std::collections::HashSet;
use std::path::Path;

use luatbot_core::error::{LuatbotError, Result};
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Default)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    /// Load from a stop-word file. A missing or unreadable file is a
    /// startup-time configuration error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LuatbotError::Config(format!("cannot read stop words {}: {e}", path.display()))
        })?;
        Ok(Self::from_words(content.lines()))
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| normalize_entry(w.as_ref()))
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(&normalize_entry(token))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

fn normalize_entry(word: &str) -> String {
    word.trim().nfc().collect::<String>().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_compound_entries() {
        let stop = StopWords::from_words(["là", "gì", "bao_nhiêu"]);
        assert!(stop.contains("là"));
        assert!(stop.contains("bao_nhiêu"));
        assert!(!stop.contains("xe_máy"));
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = StopWords::load_from(Path::new("/nonexistent/stop.txt")).unwrap_err();
        assert!(matches!(err, LuatbotError::Config(_)));
    }
}
