//! Error taxonomy for the whole pipeline.
//!
//! Each component reports the most specific kind it can determine; the
//! controller maps kinds to user-facing message categories without ever
//! downgrading them. `Config` is fatal at startup — the process must not
//! serve traffic with a missing rule table, lexicon, or index.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LuatbotError {
    /// Fatal startup-time misconfiguration (missing rule table, bad index
    /// metadata, unusable provider settings). Never produced per-request.
    #[error("configuration error: {0}")]
    Config(String),

    /// Rejected before the pipeline starts (e.g. empty question).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The segmentation capability could not be used (lexicon failed to
    /// load). Callers must not fall back to naive tokenization.
    #[error("preprocessing unavailable: {0}")]
    PreprocessingUnavailable(String),

    /// Query against an empty or uninitialized vector index.
    #[error("vector index is empty or not initialized")]
    IndexNotReady,

    /// Retrieval completed but nothing scored above the similarity
    /// threshold — distinguished from an empty-but-successful result.
    #[error("no indexed passage is relevant to the query")]
    NoRelevantContext,

    /// The generation provider failed transiently and the retry budget is
    /// exhausted.
    #[error("generation provider unavailable: {0}")]
    GenerationUnavailable(String),

    /// The generation provider answered, but the output is empty or
    /// malformed after all retries.
    #[error("generation produced unusable output: {0}")]
    GenerationFailed(String),

    /// Transport-level failure talking to an external capability.
    /// Treated as transient by components that retry.
    #[error("http error: {0}")]
    Http(String),

    /// Chunk store / sqlite failure.
    #[error("database error: {0}")]
    Database(String),

    /// The request exceeded its total latency budget.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl LuatbotError {
    /// Whether a retry of the same call can plausibly succeed.
    /// Only transport-level failures qualify; everything else is either
    /// deterministic or already the product of a retry loop.
    pub fn is_transient(&self) -> bool {
        matches!(self, LuatbotError::Http(_))
    }

    /// Short stable identifier for telemetry and terminal-state reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            LuatbotError::Config(_) => "config",
            LuatbotError::InvalidInput(_) => "invalid_input",
            LuatbotError::PreprocessingUnavailable(_) => "preprocessing_unavailable",
            LuatbotError::IndexNotReady => "index_not_ready",
            LuatbotError::NoRelevantContext => "no_relevant_context",
            LuatbotError::GenerationUnavailable(_) => "generation_unavailable",
            LuatbotError::GenerationFailed(_) => "generation_failed",
            LuatbotError::Http(_) => "http",
            LuatbotError::Database(_) => "database",
            LuatbotError::Timeout(_) => "timeout",
            LuatbotError::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, LuatbotError>;
