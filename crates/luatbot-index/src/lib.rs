//! # LuatBot Index
//!
//! The vector index over the legal corpus: a sqlite-backed chunk store
//! (durable across restarts, keyed by embedding-model identity) fronted
//! by an in-memory row set searched with cosine similarity.
//!
//! The query path only reads; `upsert` is the administrative path used by
//! the external indexing job and takes the write lock only for the
//! duration of one mutation.

pub mod store;
pub mod vector;

use std::path::Path;
use std::sync::RwLock;

use luatbot_core::error::{LuatbotError, Result};
use luatbot_core::types::{Chunk, RetrievalResult, ScoredChunk};

pub use store::SqliteChunkStore;
use vector::cosine_similarity;

#[derive(Debug)]
struct IndexRow {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// Persistent vector index with concurrent read access.
#[derive(Debug)]
pub struct VectorIndex {
    store: SqliteChunkStore,
    rows: RwLock<Vec<IndexRow>>,
    model_id: String,
    dimension: usize,
}

impl VectorIndex {
    /// Open (or create) an index at `path` for one embedding-model
    /// identity. Opening an index persisted under a different identity is
    /// a configuration error: its similarity scores would be meaningless,
    /// so the caller must rebuild instead.
    pub fn open(path: &Path, model_id: &str, dimension: usize) -> Result<Self> {
        let store = SqliteChunkStore::open(path)?;
        Self::from_store(store, model_id, dimension)
    }

    /// Volatile index for tests and offline experiments.
    pub fn in_memory(model_id: &str, dimension: usize) -> Result<Self> {
        let store = SqliteChunkStore::open_in_memory()?;
        Self::from_store(store, model_id, dimension)
    }

    fn from_store(store: SqliteChunkStore, model_id: &str, dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(LuatbotError::Config(
                "embedding dimension must be greater than zero".into(),
            ));
        }
        match store.model_identity()? {
            None => store.set_model_identity(model_id)?,
            Some(existing) if existing != model_id => {
                return Err(LuatbotError::Config(format!(
                    "index was built with embedding model '{existing}' but '{model_id}' is \
                     configured; rebuild the index instead of reusing it"
                )));
            }
            Some(_) => {}
        }

        let mut rows = Vec::new();
        for (chunk, embedding) in store.load_all()? {
            if embedding.len() != dimension {
                return Err(LuatbotError::Config(format!(
                    "chunk {} has embedding dimension {} but the index expects {dimension}; \
                     rebuild the index",
                    chunk.id,
                    embedding.len()
                )));
            }
            rows.push(IndexRow { chunk, embedding });
        }
        tracing::info!(chunks = rows.len(), model = model_id, "vector index ready");

        Ok(Self {
            store,
            rows: RwLock::new(rows),
            model_id: model_id.to_string(),
            dimension,
        })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Nearest-neighbor search: at most `k` chunks, cosine similarity
    /// descending, ties broken by chunk id for reproducibility.
    pub fn search(&self, query_embedding: &[f32], k: usize) -> Result<RetrievalResult> {
        if k == 0 {
            return Err(LuatbotError::InvalidInput("search requires k >= 1".into()));
        }
        if query_embedding.len() != self.dimension {
            return Err(LuatbotError::InvalidInput(format!(
                "query embedding has dimension {} but the index expects {}",
                query_embedding.len(),
                self.dimension
            )));
        }

        let rows = self
            .rows
            .read()
            .map_err(|e| LuatbotError::Database(e.to_string()))?;
        if rows.is_empty() {
            return Err(LuatbotError::IndexNotReady);
        }

        let mut scored: Vec<ScoredChunk> = rows
            .iter()
            .map(|row| ScoredChunk {
                chunk: row.chunk.clone(),
                score: cosine_similarity(query_embedding, &row.embedding),
            })
            .collect();
        scored.sort_unstable_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.chunk.id.cmp(&b.chunk.id))
        });
        scored.truncate(k);
        Ok(scored)
    }

    /// Insert or replace a chunk. Administrative path; readers are blocked
    /// only while the in-memory row is swapped.
    pub fn upsert(&self, chunk: Chunk, embedding: Vec<f32>) -> Result<()> {
        if embedding.len() != self.dimension {
            return Err(LuatbotError::InvalidInput(format!(
                "embedding has dimension {} but the index expects {}",
                embedding.len(),
                self.dimension
            )));
        }
        self.store.upsert(&chunk, &embedding)?;

        let mut rows = self
            .rows
            .write()
            .map_err(|e| LuatbotError::Database(e.to_string()))?;
        match rows.iter_mut().find(|row| row.chunk.id == chunk.id) {
            Some(row) => {
                row.chunk = chunk;
                row.embedding = embedding;
            }
            None => rows.push(IndexRow { chunk, embedding }),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use luatbot_core::types::SourceRef;

    fn chunk(id: &str) -> Chunk {
        Chunk {
            id: id.into(),
            content: format!("nội dung {id}"),
            source: SourceRef::new("Luật Giao thông đường bộ 2008"),
        }
    }

    fn index_with(rows: &[(&str, [f32; 3])]) -> VectorIndex {
        let index = VectorIndex::in_memory("test-model", 3).unwrap();
        for (id, emb) in rows {
            index.upsert(chunk(id), emb.to_vec()).unwrap();
        }
        index
    }

    #[test]
    fn search_orders_by_descending_similarity() {
        let index = index_with(&[
            ("a", [1.0, 0.0, 0.0]),
            ("b", [0.7, 0.7, 0.0]),
            ("c", [0.0, 0.0, 1.0]),
        ]);
        let result = index.search(&[1.0, 0.0, 0.0], 3).unwrap();
        let ids: Vec<&str> = result.iter().map(|s| s.chunk.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        for pair in result.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn search_caps_at_k() {
        let index = index_with(&[
            ("a", [1.0, 0.0, 0.0]),
            ("b", [0.9, 0.1, 0.0]),
            ("c", [0.8, 0.2, 0.0]),
        ]);
        assert_eq!(index.search(&[1.0, 0.0, 0.0], 2).unwrap().len(), 2);
    }

    #[test]
    fn equal_scores_tie_break_by_chunk_id() {
        let index = index_with(&[("b", [1.0, 0.0, 0.0]), ("a", [2.0, 0.0, 0.0])]);
        let result = index.search(&[1.0, 0.0, 0.0], 2).unwrap();
        // Cosine is scale-invariant: both score 1.0, so ids decide.
        assert_eq!(result[0].chunk.id, "a");
        assert_eq!(result[1].chunk.id, "b");
    }

    #[test]
    fn empty_index_is_not_ready() {
        let index = VectorIndex::in_memory("test-model", 3).unwrap();
        assert!(matches!(
            index.search(&[1.0, 0.0, 0.0], 3),
            Err(LuatbotError::IndexNotReady)
        ));
    }

    #[test]
    fn zero_k_is_input_validation_error() {
        let index = index_with(&[("a", [1.0, 0.0, 0.0])]);
        assert!(matches!(
            index.search(&[1.0, 0.0, 0.0], 0),
            Err(LuatbotError::InvalidInput(_))
        ));
    }

    #[test]
    fn dimension_mismatch_rejected() {
        let index = index_with(&[("a", [1.0, 0.0, 0.0])]);
        assert!(matches!(
            index.search(&[1.0, 0.0], 1),
            Err(LuatbotError::InvalidInput(_))
        ));
        assert!(matches!(
            index.upsert(chunk("x"), vec![1.0]),
            Err(LuatbotError::InvalidInput(_))
        ));
    }

    #[test]
    fn round_trip_nearest_neighbor() {
        let index = index_with(&[("far", [0.0, 1.0, 0.0])]);
        index.upsert(chunk("near"), vec![0.9, 0.1, 0.0]).unwrap();
        let result = index.search(&[1.0, 0.0, 0.0], 1).unwrap();
        assert_eq!(result[0].chunk.id, "near");
    }

    #[test]
    fn reopening_with_different_model_identity_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");
        {
            let index = VectorIndex::open(&path, "model-v1", 3).unwrap();
            index.upsert(chunk("a"), vec![1.0, 0.0, 0.0]).unwrap();
        }
        let err = VectorIndex::open(&path, "model-v2", 3).unwrap_err();
        assert!(matches!(err, LuatbotError::Config(_)));
        // Same identity reopens fine and rows survive.
        let index = VectorIndex::open(&path, "model-v1", 3).unwrap();
        assert_eq!(index.len(), 1);
    }
}
