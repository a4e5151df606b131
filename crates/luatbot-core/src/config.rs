//! LuatBot configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{LuatbotError, Result};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LuatbotConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub synthesis: SynthesisConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

impl Default for LuatbotConfig {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            embedding: EmbeddingConfig::default(),
            llm: LlmConfig::default(),
            retrieval: RetrievalConfig::default(),
            synthesis: SynthesisConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl LuatbotConfig {
    /// Load config from the default path (~/.luatbot/config.toml),
    /// falling back to defaults when the file does not exist.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LuatbotError::Config(format!("failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| LuatbotError::Config(format!("failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the LuatBot home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".luatbot")
    }
}

/// Paths to the corpus resources loaded once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Vietnamese stop-word list, one word per line, compounds with `_`.
    #[serde(default = "default_stopwords_path")]
    pub stopwords_path: String,
    /// Compound-word lexicon driving Vietnamese word segmentation.
    #[serde(default = "default_lexicon_path")]
    pub lexicon_path: String,
    /// Domain rule table (`keyword: weight` lines) for query admission.
    #[serde(default = "default_rules_path")]
    pub rules_path: String,
    /// Sqlite file persisting the vector index.
    #[serde(default = "default_index_path")]
    pub index_path: String,
}

fn default_stopwords_path() -> String { "data/vietnamese-stopwords.txt".into() }
fn default_lexicon_path() -> String { "data/lexicon.txt".into() }
fn default_rules_path() -> String { "data/luat-keywords.txt".into() }
fn default_index_path() -> String { "data/index.db".into() }

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            stopwords_path: default_stopwords_path(),
            lexicon_path: default_lexicon_path(),
            rules_path: default_rules_path(),
            index_path: default_index_path(),
        }
    }
}

/// Embedding capability settings. The index is keyed by `model`: changing
/// it requires a rebuild, never a silent reuse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "openai", "custom:<base-url>", or "hash" (offline deterministic).
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
}

fn default_embedding_provider() -> String { "hash".into() }
fn default_embedding_model() -> String { "luatbot/hash-256".into() }
fn default_embedding_dimension() -> usize { 256 }

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            endpoint: String::new(),
            api_key: String::new(),
        }
    }
}

/// Generation capability settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "openai" or "custom:<base-url>".
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_llm_provider() -> String { "openai".into() }
fn default_llm_model() -> String { "gpt-4o-mini".into() }
fn default_temperature() -> f32 { 0.2 }
fn default_max_tokens() -> u32 { 1024 }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            model: default_llm_model(),
            endpoint: String::new(),
            api_key: String::new(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Retrieval knobs. `top_k` is kept small to bound prompt size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f32,
}

fn default_top_k() -> usize { 4 }
fn default_min_similarity() -> f32 { 0.30 }

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_similarity: default_min_similarity(),
        }
    }
}

/// Synthesizer retry budget for transient provider failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base backoff; attempt n sleeps `backoff_ms << (n - 1)`, capped.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_max_attempts() -> u32 { 3 }
fn default_backoff_ms() -> u64 { 500 }

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

/// Per-request limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Total pipeline latency budget per request, synthesis retries
    /// included.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Longest accepted question, in characters.
    #[serde(default = "default_max_question_chars")]
    pub max_question_chars: usize,
}

fn default_request_timeout_secs() -> u64 { 60 }
fn default_max_question_chars() -> usize { 1000 }

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            max_question_chars: default_max_question_chars(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = LuatbotConfig::default();
        assert_eq!(config.retrieval.top_k, 4);
        assert!(config.retrieval.min_similarity > 0.0);
        assert_eq!(config.synthesis.max_attempts, 3);
        assert_eq!(config.embedding.dimension, 256);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: LuatbotConfig = toml::from_str(
            r#"
            [retrieval]
            top_k = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.retrieval.top_k, 2);
        assert_eq!(config.retrieval.min_similarity, default_min_similarity());
        assert_eq!(config.llm.model, "gpt-4o-mini");
    }
}
