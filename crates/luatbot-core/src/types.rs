//! Request-scoped data types flowing through the pipeline.
//!
//! Each request owns one `Question` and derives the rest stage by stage:
//! `Question` → `Classification` → `NormalizedQuery` → `RetrievalResult` →
//! `PromptContext` → `Answer`. Nothing here is shared across requests.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// A raw user question, immutable once received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub text: String,
    /// Optional short conversation history (earlier turns, oldest first).
    #[serde(default)]
    pub history: Vec<String>,
}

impl Question {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            history: Vec::new(),
        }
    }

    pub fn with_history(text: impl Into<String>, history: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            history,
        }
    }
}

/// Output of the normalizer: segmented tokens in order plus the
/// deduplicated keyword set that survived stop-word and noise filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedQuery {
    pub tokens: Vec<String>,
    pub keywords: BTreeSet<String>,
}

impl NormalizedQuery {
    /// The text handed to the embedding capability.
    pub fn joined(&self) -> String {
        self.tokens.join(" ")
    }
}

/// Admission decision for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Accepted,
    RejectedOutOfDomain,
}

/// Why a query was rejected — drives the user-facing decline wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    OutOfDomain,
    NonVietnamese,
}

/// Classification outcome, produced once per request and never mutated.
/// `matched_rules` carries the rule identifiers that fired (empty on
/// rejection) for observability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub decision: Decision,
    pub matched_rules: Vec<String>,
    pub reject_reason: Option<RejectReason>,
}

impl Classification {
    pub fn accepted(matched_rules: Vec<String>) -> Self {
        Self {
            decision: Decision::Accepted,
            matched_rules,
            reject_reason: None,
        }
    }

    pub fn rejected(reason: RejectReason) -> Self {
        Self {
            decision: Decision::RejectedOutOfDomain,
            matched_rules: Vec::new(),
            reject_reason: Some(reason),
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.decision == Decision::Accepted
    }
}

/// Legal citation for a chunk: document plus article/clause position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Document title, e.g. "Nghị định 100/2019/NĐ-CP".
    pub document: String,
    /// Article ("Điều") number, if known.
    #[serde(default)]
    pub article: Option<String>,
    /// Clause ("Khoản") number, if known.
    #[serde(default)]
    pub clause: Option<String>,
}

impl SourceRef {
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            article: None,
            clause: None,
        }
    }

    /// Human-readable citation string used in prompts and answers.
    pub fn citation(&self) -> String {
        let mut s = self.document.clone();
        if let Some(article) = &self.article {
            s.push_str(&format!(", Điều {article}"));
        }
        if let Some(clause) = &self.clause {
            s.push_str(&format!(", Khoản {clause}"));
        }
        s
    }
}

/// A unit of indexed legal text. Created during indexing, read-only at
/// query time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub content: String,
    pub source: SourceRef,
}

/// One retrieval hit. Scores are cosine similarities and comparable
/// across the whole index (single metric, single embedding model).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Ordered retrieval output: descending score, ties broken by chunk id.
pub type RetrievalResult = Vec<ScoredChunk>;

/// Whether retrieval actually contributed content to the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    /// Answer synthesized from retrieved context.
    Grounded,
    /// Query rejected by the classifier; canned decline.
    Declined,
    /// Accepted, but nothing relevant was indexed.
    InsufficientContext,
    /// A pipeline stage failed; canned apology.
    Unavailable,
}

/// Terminal artifact returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    /// Ids of the chunks actually included in the prompt — never invented.
    pub citations: Vec<String>,
    pub provenance: Provenance,
}

impl Answer {
    pub fn grounded(text: impl Into<String>, citations: Vec<String>) -> Self {
        Self {
            text: text.into(),
            citations,
            provenance: Provenance::Grounded,
        }
    }

    pub fn canned(text: impl Into<String>, provenance: Provenance) -> Self {
        Self {
            text: text.into(),
            citations: Vec::new(),
            provenance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn citation_renders_article_and_clause() {
        let mut src = SourceRef::new("Nghị định 100/2019/NĐ-CP");
        assert_eq!(src.citation(), "Nghị định 100/2019/NĐ-CP");
        src.article = Some("5".into());
        src.clause = Some("1".into());
        assert_eq!(src.citation(), "Nghị định 100/2019/NĐ-CP, Điều 5, Khoản 1");
    }

    #[test]
    fn normalized_query_join_preserves_order() {
        let q = NormalizedQuery {
            tokens: vec!["xe_máy".into(), "tốc_độ".into()],
            keywords: BTreeSet::new(),
        };
        assert_eq!(q.joined(), "xe_máy tốc_độ");
    }
}
