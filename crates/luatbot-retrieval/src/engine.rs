//! Retrieval engine: normalized query → ranked, thresholded chunk set.

use std::sync::Arc;

use luatbot_core::config::RetrievalConfig;
use luatbot_core::error::{LuatbotError, Result};
use luatbot_core::traits::Embedder;
use luatbot_core::types::{NormalizedQuery, RetrievalResult};
use luatbot_index::VectorIndex;

pub struct RetrievalEngine {
    embedder: Arc<dyn Embedder>,
    index: Arc<VectorIndex>,
    top_k: usize,
    min_similarity: f32,
}

impl std::fmt::Debug for RetrievalEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalEngine")
            .field("index", &self.index)
            .field("top_k", &self.top_k)
            .field("min_similarity", &self.min_similarity)
            .finish_non_exhaustive()
    }
}

impl RetrievalEngine {
    /// Wire the embedder to the index. The pairing is checked here: an
    /// index persisted under another model identity (or dimensionality)
    /// would silently return incomparable scores, so it is refused up
    /// front as a configuration error.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<VectorIndex>,
        config: &RetrievalConfig,
    ) -> Result<Self> {
        if embedder.model_id() != index.model_id() {
            return Err(LuatbotError::Config(format!(
                "embedder model '{}' does not match index model '{}'; rebuild the index",
                embedder.model_id(),
                index.model_id()
            )));
        }
        if embedder.dimension() != index.dimension() {
            return Err(LuatbotError::Config(format!(
                "embedder dimension {} does not match index dimension {}",
                embedder.dimension(),
                index.dimension()
            )));
        }
        if config.top_k == 0 {
            return Err(LuatbotError::Config("retrieval.top_k must be >= 1".into()));
        }
        Ok(Self {
            embedder,
            index,
            top_k: config.top_k,
            min_similarity: config.min_similarity,
        })
    }

    /// Retrieve context for a normalized query. Reproducible: same query
    /// against an unchanged index yields the same chunks in the same
    /// order — there is no randomness anywhere in ranking.
    ///
    /// Reports `NoRelevantContext` when every candidate falls below the
    /// similarity threshold, so the caller can distinguish "no answer
    /// possible" from "answer with zero sources".
    pub async fn retrieve(&self, query: &NormalizedQuery) -> Result<RetrievalResult> {
        let text = query.joined();
        if text.is_empty() {
            // Every token was stop-worded away; nothing to embed.
            tracing::debug!("normalized query is empty after filtering");
            return Err(LuatbotError::NoRelevantContext);
        }

        let embedding = self.embedder.embed(&text).await?;
        let candidates = self.index.search(&embedding, self.top_k)?;

        let kept: RetrievalResult = candidates
            .into_iter()
            .filter(|scored| scored.score >= self.min_similarity)
            .collect();
        if kept.is_empty() {
            tracing::debug!(
                threshold = self.min_similarity,
                "all candidates fell below the similarity threshold"
            );
            return Err(LuatbotError::NoRelevantContext);
        }

        tracing::debug!(
            chunks = kept.len(),
            top_score = kept[0].score,
            "retrieved context"
        );
        Ok(kept)
    }
}
