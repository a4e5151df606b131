//! Generation capability contract.

use async_trait::async_trait;

use crate::error::Result;

/// Produces a natural-language completion for a fully assembled prompt.
///
/// May be slow (seconds) and may fail transiently; callers own the retry
/// policy. One call per invocation — no multi-turn tool use.
#[async_trait]
pub trait Generator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String>;
}
