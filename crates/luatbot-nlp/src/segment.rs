//! Lexicon-driven Vietnamese word segmentation.
//!
//! Vietnamese writes one syllable per whitespace-separated unit, but words
//! are frequently multi-syllable ("xe máy", "giấy phép lái xe"). Retrieval
//! quality depends on treating those compounds as single tokens, so the
//! segmenter greedily matches the longest compound known to its lexicon at
//! each position and joins the syllables with `_`.
//!
//! The lexicon file holds one word per line, syllables separated by spaces
//! or underscores. It is loaded once on first use and reused afterwards; a
//! failed load is cached and reported as `PreprocessingUnavailable` on
//! every call so the caller can never drift into naive tokenization.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use luatbot_core::error::{LuatbotError, Result};
use luatbot_core::traits::Segmenter;
use unicode_normalization::UnicodeNormalization;

struct Lexicon {
    /// Compound words, space-joined, NFC + lowercase.
    compounds: HashSet<String>,
    /// Longest compound length in syllables.
    max_syllables: usize,
}

impl Lexicon {
    fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut compounds = HashSet::new();
        let mut max_syllables = 1;
        for word in words {
            let normalized: String = word
                .as_ref()
                .trim()
                .replace('_', " ")
                .nfc()
                .collect::<String>()
                .to_lowercase();
            if normalized.is_empty() {
                continue;
            }
            let syllables = normalized.split_whitespace().count();
            if syllables < 2 {
                // Single syllables segment trivially; only compounds matter.
                continue;
            }
            max_syllables = max_syllables.max(syllables);
            compounds.insert(normalized.split_whitespace().collect::<Vec<_>>().join(" "));
        }
        Self {
            compounds,
            max_syllables,
        }
    }

    fn load(path: &Path) -> std::result::Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read lexicon {}: {e}", path.display()))?;
        let lexicon = Self::from_words(content.lines());
        if lexicon.compounds.is_empty() {
            return Err(format!(
                "lexicon {} contains no compound words",
                path.display()
            ));
        }
        Ok(lexicon)
    }
}

/// Segmenter backed by a compound-word lexicon, lazily loaded.
pub struct LexiconSegmenter {
    path: PathBuf,
    lexicon: OnceLock<std::result::Result<Lexicon, String>>,
}

impl LexiconSegmenter {
    /// Cheap handle; nothing is read until [`initialize`](Self::initialize)
    /// or the first [`segment`](Segmenter::segment) call.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lexicon: OnceLock::new(),
        }
    }

    /// Build directly from an in-memory word list (tests, embedded sets).
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let cell = OnceLock::new();
        let _ = cell.set(Ok(Lexicon::from_words(words)));
        Self {
            path: PathBuf::new(),
            lexicon: cell,
        }
    }

    /// Explicit eager load. Idempotent; a failure here is a startup-time
    /// configuration error.
    pub fn initialize(&self) -> Result<()> {
        match self.lexicon() {
            Ok(_) => Ok(()),
            Err(msg) => Err(LuatbotError::Config(msg)),
        }
    }

    fn lexicon(&self) -> std::result::Result<&Lexicon, String> {
        let slot = self.lexicon.get_or_init(|| {
            tracing::debug!(path = %self.path.display(), "loading segmentation lexicon");
            Lexicon::load(&self.path)
        });
        slot.as_ref().map_err(|e| e.clone())
    }
}

impl Segmenter for LexiconSegmenter {
    fn segment(&self, text: &str) -> Result<Vec<String>> {
        let lexicon = self
            .lexicon()
            .map_err(LuatbotError::PreprocessingUnavailable)?;

        let syllables: Vec<&str> = text.split_whitespace().collect();
        let mut tokens = Vec::with_capacity(syllables.len());
        let mut i = 0;
        while i < syllables.len() {
            let mut matched = 1;
            // Longest match first, down to two syllables.
            let limit = lexicon.max_syllables.min(syllables.len() - i);
            for len in (2..=limit).rev() {
                let candidate = syllables[i..i + len].join(" ");
                if lexicon.compounds.contains(&candidate) {
                    matched = len;
                    break;
                }
            }
            if matched > 1 {
                tokens.push(syllables[i..i + matched].join("_"));
            } else {
                tokens.push(syllables[i].to_string());
            }
            i += matched;
        }
        Ok(tokens)
    }
}
