//! Sqlite persistence for indexed chunks.
//!
//! The store survives process restarts and is keyed by embedding-model
//! identity in `index_meta`: an index built under one model must be
//! rebuilt, never reused, when the model changes.

use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;

use luatbot_core::error::{LuatbotError, Result};
use luatbot_core::types::{Chunk, SourceRef};

use crate::vector::{decode_embedding, encode_embedding};

const META_MODEL_ID: &str = "embedding_model";

#[derive(Debug)]
pub struct SqliteChunkStore {
    conn: Mutex<Connection>,
}

impl SqliteChunkStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn =
            Connection::open(path).map_err(|e| LuatbotError::Database(e.to_string()))?;
        Self::bootstrap(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| LuatbotError::Database(e.to_string()))?;
        Self::bootstrap(conn)
    }

    fn bootstrap(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS chunks (
                id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                document TEXT NOT NULL,
                article TEXT,
                clause TEXT,
                embedding BLOB NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS index_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
        .map_err(|e| LuatbotError::Database(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Model identity the persisted embeddings were produced under.
    pub fn model_identity(&self) -> Result<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| LuatbotError::Database(e.to_string()))?;
        let value = conn
            .query_row(
                "SELECT value FROM index_meta WHERE key = ?1",
                [META_MODEL_ID],
                |row| row.get::<_, String>(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(LuatbotError::Database(other.to_string())),
            })?;
        Ok(value)
    }

    pub fn set_model_identity(&self, model_id: &str) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| LuatbotError::Database(e.to_string()))?;
        conn.execute(
            "INSERT OR REPLACE INTO index_meta (key, value) VALUES (?1, ?2)",
            rusqlite::params![META_MODEL_ID, model_id],
        )
        .map_err(|e| LuatbotError::Database(e.to_string()))?;
        Ok(())
    }

    pub fn upsert(&self, chunk: &Chunk, embedding: &[f32]) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| LuatbotError::Database(e.to_string()))?;
        conn.execute(
            "INSERT OR REPLACE INTO chunks
                (id, content, document, article, clause, embedding, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                chunk.id,
                chunk.content,
                chunk.source.document,
                chunk.source.article,
                chunk.source.clause,
                encode_embedding(embedding),
                chrono::Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| LuatbotError::Database(e.to_string()))?;
        Ok(())
    }

    /// Load every chunk with its embedding, ordered by id for determinism.
    pub fn load_all(&self) -> Result<Vec<(Chunk, Vec<f32>)>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| LuatbotError::Database(e.to_string()))?;
        let mut stmt = conn
            .prepare(
                "SELECT id, content, document, article, clause, embedding
                 FROM chunks ORDER BY id",
            )
            .map_err(|e| LuatbotError::Database(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| {
                let blob: Vec<u8> = row.get(5)?;
                Ok((
                    Chunk {
                        id: row.get(0)?,
                        content: row.get(1)?,
                        source: SourceRef {
                            document: row.get(2)?,
                            article: row.get(3)?,
                            clause: row.get(4)?,
                        },
                    },
                    blob,
                ))
            })
            .map_err(|e| LuatbotError::Database(e.to_string()))?;

        let mut out = Vec::new();
        for row in rows {
            let (chunk, blob) = row.map_err(|e| LuatbotError::Database(e.to_string()))?;
            let embedding = decode_embedding(&blob).ok_or_else(|| {
                LuatbotError::Database(format!("corrupt embedding blob for chunk {}", chunk.id))
            })?;
            out.push((chunk, embedding));
        }
        Ok(out)
    }

    pub fn count(&self) -> Result<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| LuatbotError::Database(e.to_string()))?;
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))
            .map_err(|e| LuatbotError::Database(e.to_string()))?;
        Ok(n as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str) -> Chunk {
        Chunk {
            id: id.into(),
            content: format!("nội dung {id}"),
            source: SourceRef {
                document: "Nghị định 100/2019/NĐ-CP".into(),
                article: Some("5".into()),
                clause: Some("1".into()),
            },
        }
    }

    #[test]
    fn upsert_and_load_round_trip() {
        let store = SqliteChunkStore::open_in_memory().unwrap();
        store.upsert(&chunk("c1"), &[1.0, 0.0]).unwrap();
        store.upsert(&chunk("c2"), &[0.0, 1.0]).unwrap();

        let rows = store.load_all().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0.id, "c1");
        assert_eq!(rows[0].1, vec![1.0, 0.0]);
        assert_eq!(rows[1].0.source.article.as_deref(), Some("5"));
    }

    #[test]
    fn upsert_replaces_existing_chunk() {
        let store = SqliteChunkStore::open_in_memory().unwrap();
        store.upsert(&chunk("c1"), &[1.0, 0.0]).unwrap();
        let mut updated = chunk("c1");
        updated.content = "sửa đổi".into();
        store.upsert(&updated, &[0.5, 0.5]).unwrap();

        let rows = store.load_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0.content, "sửa đổi");
        assert_eq!(rows[0].1, vec![0.5, 0.5]);
    }

    #[test]
    fn model_identity_persists() {
        let store = SqliteChunkStore::open_in_memory().unwrap();
        assert_eq!(store.model_identity().unwrap(), None);
        store.set_model_identity("text-embedding-3-small").unwrap();
        assert_eq!(
            store.model_identity().unwrap().as_deref(),
            Some("text-embedding-3-small")
        );
    }
}
