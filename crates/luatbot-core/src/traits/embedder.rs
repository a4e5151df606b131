//! Embedding capability contract.

use async_trait::async_trait;

use crate::error::Result;

/// Turns text into a fixed-dimension vector.
///
/// Deterministic for a fixed model identity: the same input must produce
/// the same vector, and every vector from one `model_id` has the same
/// `dimension`. The vector index is keyed by `model_id`; vectors from two
/// different identities are never comparable.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Stable model identity, e.g. "text-embedding-3-small".
    fn model_id(&self) -> &str;

    /// Output dimensionality for this model identity.
    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
