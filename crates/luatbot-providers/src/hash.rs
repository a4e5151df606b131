//! Deterministic local embedder.
//!
//! Hashes tokens into a fixed-size bag vector and L2-normalizes it. Not a
//! semantic model — it exists so the pipeline and index can run end to end
//! with no network and no model download, and so tests get reproducible
//! vectors. Fills the same role the cloud embedder does behind the same
//! trait, under its own model identity.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;

use luatbot_core::error::{LuatbotError, Result};
use luatbot_core::traits::Embedder;

pub struct HashEmbedder {
    model_id: String,
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(model_id: &str, dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(LuatbotError::Config(
                "embedding dimension must be greater than zero".into(),
            ));
        }
        Ok(Self {
            model_id: model_id.to_string(),
            dimension: dimension.clamp(8, 4096),
        })
    }

    fn embed_internal(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        let tokens = text
            .split(|c: char| c.is_whitespace() || (c.is_ascii_punctuation() && c != '_'))
            .filter(|t| !t.is_empty());

        let mut any = false;
        for token in tokens {
            any = true;
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let idx = (hasher.finish() as usize) % self.dimension;
            vector[idx] += 1.0;
        }
        if !any {
            return vector;
        }

        // L2 normalize so cosine scores land in [-1, 1].
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(LuatbotError::InvalidInput(
                "cannot embed empty text".into(),
            ));
        }
        Ok(self.embed_internal(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embed(text: &str) -> Vec<f32> {
        HashEmbedder::new("luatbot/hash-64", 64)
            .unwrap()
            .embed_internal(text)
    }

    #[test]
    fn deterministic_for_same_input() {
        assert_eq!(embed("xe_máy tốc_độ phạt"), embed("xe_máy tốc_độ phạt"));
    }

    #[test]
    fn different_inputs_differ() {
        assert_ne!(embed("xe_máy vượt đèn_đỏ"), embed("nồng_độ_cồn"));
    }

    #[test]
    fn vectors_are_unit_length() {
        let norm = embed("giấy_phép_lái_xe")
            .iter()
            .map(|v| v * v)
            .sum::<f32>()
            .sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn shared_tokens_raise_similarity() {
        let a = embed("xe_máy chạy quá tốc_độ");
        let b = embed("xe_máy tốc_độ tối_đa");
        let c = embed("diện_tích hình tròn");
        let dot = |x: &[f32], y: &[f32]| x.iter().zip(y).map(|(p, q)| p * q).sum::<f32>();
        assert!(dot(&a, &b) > dot(&a, &c));
    }

    #[test]
    fn compound_tokens_survive_underscores() {
        // '_' must not split tokens, or segmented compounds lose identity.
        assert_ne!(embed("xe_máy"), embed("xe máy"));
    }
}
