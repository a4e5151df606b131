//! # LuatBot Providers
//!
//! Concrete implementations of the embedding and generation capabilities.
//!
//! All OpenAI-compatible endpoints (OpenAI itself, or any self-hosted
//! server speaking the same wire format via `custom:<base-url>`) are
//! handled by single unified clients. The `hash` embedder is the local,
//! network-free option for development and offline indexing.

pub mod embedding;
pub mod generation;
pub mod hash;

use std::sync::Arc;

use luatbot_core::config::LuatbotConfig;
use luatbot_core::error::{LuatbotError, Result};
use luatbot_core::traits::{Embedder, Generator};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Create the embedding capability from configuration.
///
/// Provider names: `hash` (local deterministic), `openai`, or
/// `custom:<base-url>` for any OpenAI-compatible server.
pub fn create_embedder(config: &LuatbotConfig) -> Result<Arc<dyn Embedder>> {
    let cfg = &config.embedding;
    match cfg.provider.as_str() {
        "hash" => Ok(Arc::new(hash::HashEmbedder::new(
            &cfg.model,
            cfg.dimension,
        )?)),
        "openai" => {
            let base_url = resolve_base_url(&cfg.endpoint);
            let api_key = resolve_api_key(&cfg.api_key, "embedding")?;
            Ok(Arc::new(embedding::OpenAiCompatibleEmbedder::new(
                &base_url,
                &api_key,
                &cfg.model,
                cfg.dimension,
            )?))
        }
        other if other.starts_with("custom:") => {
            let base_url = other.trim_start_matches("custom:").trim_end_matches('/');
            let api_key = std::env::var("LUATBOT_API_KEY").unwrap_or_default();
            Ok(Arc::new(embedding::OpenAiCompatibleEmbedder::new(
                base_url,
                &api_key,
                &cfg.model,
                cfg.dimension,
            )?))
        }
        other => Err(LuatbotError::Config(format!(
            "unknown embedding provider '{other}'"
        ))),
    }
}

/// Create the generation capability from configuration.
pub fn create_generator(config: &LuatbotConfig) -> Result<Arc<dyn Generator>> {
    let cfg = &config.llm;
    match cfg.provider.as_str() {
        "openai" => {
            let base_url = resolve_base_url(&cfg.endpoint);
            let api_key = resolve_api_key(&cfg.api_key, "llm")?;
            Ok(Arc::new(generation::OpenAiCompatibleGenerator::new(
                &base_url,
                &api_key,
                &cfg.model,
                cfg.temperature,
                cfg.max_tokens,
            )?))
        }
        other if other.starts_with("custom:") => {
            let base_url = other.trim_start_matches("custom:").trim_end_matches('/');
            let api_key = std::env::var("LUATBOT_API_KEY").unwrap_or_default();
            Ok(Arc::new(generation::OpenAiCompatibleGenerator::new(
                base_url,
                &api_key,
                &cfg.model,
                cfg.temperature,
                cfg.max_tokens,
            )?))
        }
        other => Err(LuatbotError::Config(format!(
            "unknown llm provider '{other}'"
        ))),
    }
}

fn resolve_base_url(endpoint: &str) -> String {
    if endpoint.is_empty() {
        OPENAI_BASE_URL.to_string()
    } else {
        endpoint.trim_end_matches('/').to_string()
    }
}

/// Resolve an API key: config first, then OPENAI_API_KEY / LUATBOT_API_KEY.
/// A cloud provider with no key is a startup-time configuration error, not
/// a per-request surprise.
fn resolve_api_key(configured: &str, section: &str) -> Result<String> {
    if !configured.is_empty() {
        return Ok(configured.to_string());
    }
    std::env::var("OPENAI_API_KEY")
        .or_else(|_| std::env::var("LUATBOT_API_KEY"))
        .map_err(|_| {
            LuatbotError::Config(format!(
                "no API key for [{section}]: set it in the config or export OPENAI_API_KEY"
            ))
        })
}
