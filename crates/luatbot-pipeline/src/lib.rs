//! # LuatBot Pipeline
//!
//! The controller sequencing Classifier → Normalizer → Retrieval →
//! Synthesizer with failure containment.
//!
//! State machine per request:
//!
//! ```text
//! RECEIVED → CLASSIFIED → REJECTED
//!                       → NORMALIZED → RETRIEVED → ANSWERED
//! any stage error       → FAILED(kind)
//! ```
//!
//! Exactly one terminal outcome is produced per request. Rejection
//! short-circuits before any embedding or generation call; stage errors
//! are mapped to user-facing message categories without reinterpreting
//! their kind; retries stay local to the synthesizer.

pub mod messages;

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::time::timeout;
use uuid::Uuid;

use luatbot_core::config::LuatbotConfig;
use luatbot_core::error::{LuatbotError, Result};
use luatbot_core::types::{Answer, Classification, Provenance, Question, RejectReason};
use luatbot_index::VectorIndex;
use luatbot_nlp::{LexiconSegmenter, Normalizer, RuleClassifier, RuleTable, StopWords};
use luatbot_retrieval::{RetrievalEngine, Synthesizer};

/// Terminal outcome of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Answered,
    Rejected,
    Failed { kind: String },
}

/// The final response object handed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub request_id: Uuid,
    pub outcome: Outcome,
    pub answer: Answer,
    /// Absent only on answer-cache hits, where classification is skipped.
    pub classification: Option<Classification>,
}

/// Pipeline states, logged on every transition for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Received,
    Classified,
    Normalized,
    Retrieved,
}

const ANSWER_CACHE_CAP: usize = 256;

pub struct Pipeline {
    classifier: RuleClassifier,
    normalizer: Normalizer,
    engine: RetrievalEngine,
    synthesizer: Synthesizer,
    request_timeout: Duration,
    max_question_chars: usize,
    /// Grounded answers from earlier identical questions. Bounded;
    /// cleared wholesale when full.
    cache: Mutex<HashMap<String, Answer>>,
}

impl Pipeline {
    /// Assemble a pipeline from already-constructed components (tests
    /// inject fakes here).
    pub fn new(
        classifier: RuleClassifier,
        normalizer: Normalizer,
        engine: RetrievalEngine,
        synthesizer: Synthesizer,
        request_timeout: Duration,
        max_question_chars: usize,
    ) -> Self {
        Self {
            classifier,
            normalizer,
            engine,
            synthesizer,
            request_timeout,
            max_question_chars,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Load every shared resource and wire the full pipeline from
    /// configuration. Any missing resource — rule table, stop words,
    /// lexicon, index, provider credentials — fails here, before the
    /// process serves traffic.
    pub fn from_config(config: &LuatbotConfig) -> Result<Self> {
        let stopwords = Arc::new(StopWords::load_from(Path::new(
            &config.data.stopwords_path,
        ))?);
        let segmenter = Arc::new(LexiconSegmenter::new(config.data.lexicon_path.as_str()));
        segmenter.initialize()?;
        let rules = Arc::new(RuleTable::load_from(Path::new(&config.data.rules_path))?);

        let embedder = luatbot_providers::create_embedder(config)?;
        let generator = luatbot_providers::create_generator(config)?;
        let index = Arc::new(VectorIndex::open(
            Path::new(&config.data.index_path),
            embedder.model_id(),
            embedder.dimension(),
        )?);

        let engine = RetrievalEngine::new(embedder, index, &config.retrieval)?;
        Ok(Self::new(
            RuleClassifier::new(rules),
            Normalizer::new(segmenter, stopwords),
            engine,
            Synthesizer::new(generator, &config.synthesis),
            Duration::from_secs(config.runtime.request_timeout_secs),
            config.runtime.max_question_chars,
        ))
    }

    /// The single entry point: raw question in, terminal response out.
    ///
    /// Returns `Err` only for input rejected before the pipeline starts
    /// (empty or oversized question). Everything past that boundary is
    /// contained and reported as a terminal `Response`.
    pub async fn handle_question(&self, raw: &str, history: &[String]) -> Result<Response> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LuatbotError::InvalidInput("question is empty".into()));
        }
        if trimmed.chars().count() > self.max_question_chars {
            return Err(LuatbotError::InvalidInput(format!(
                "question exceeds {} characters",
                self.max_question_chars
            )));
        }

        let question = Question::with_history(trimmed, history.to_vec());
        let request_id = question.id;
        tracing::debug!(%request_id, state = ?State::Received, "question received");

        if let Some(answer) = self.cache_lookup(trimmed) {
            tracing::debug!(%request_id, "answer cache hit");
            return Ok(Response {
                request_id,
                outcome: Outcome::Answered,
                answer,
                classification: None,
            });
        }

        match timeout(self.request_timeout, self.run(&question)).await {
            Ok(response) => Ok(response),
            Err(_) => {
                let secs = self.request_timeout.as_secs();
                Ok(self.fail(request_id, None, LuatbotError::Timeout(secs)))
            }
        }
    }

    async fn run(&self, question: &Question) -> Response {
        let request_id = question.id;

        // Classification runs first and cannot fail: the cost gate must
        // hold even when the segmentation lexicon is broken.
        let classification = self.classifier.classify(&question.text, &BTreeSet::new());
        tracing::debug!(%request_id, state = ?State::Classified, decision = ?classification.decision);

        if !classification.is_accepted() {
            let text = match classification.reject_reason {
                Some(RejectReason::NonVietnamese) => messages::DECLINE_NON_VIETNAMESE,
                _ => messages::DECLINE_OUT_OF_DOMAIN,
            };
            tracing::info!(%request_id, "request rejected by classifier");
            return Response {
                request_id,
                outcome: Outcome::Rejected,
                answer: Answer::canned(text, Provenance::Declined),
                classification: Some(classification),
            };
        }

        let normalized = match self.normalizer.normalize(&question.text) {
            Ok(n) => n,
            Err(e) => return self.fail(request_id, Some(classification), e),
        };
        tracing::debug!(%request_id, state = ?State::Normalized, tokens = normalized.tokens.len());

        let retrieved = match self.engine.retrieve(&normalized).await {
            Ok(r) => r,
            Err(LuatbotError::NoRelevantContext) => {
                tracing::info!(%request_id, "no relevant context above threshold");
                return Response {
                    request_id,
                    outcome: Outcome::Answered,
                    answer: Answer::canned(
                        messages::INSUFFICIENT_CONTEXT,
                        Provenance::InsufficientContext,
                    ),
                    classification: Some(classification),
                };
            }
            Err(e) => return self.fail(request_id, Some(classification), e),
        };
        tracing::debug!(%request_id, state = ?State::Retrieved, chunks = retrieved.len());

        match self.synthesizer.synthesize(question, &retrieved).await {
            Ok(answer) => {
                self.cache_insert(&question.text, &answer);
                tracing::info!(%request_id, citations = answer.citations.len(), "request answered");
                Response {
                    request_id,
                    outcome: Outcome::Answered,
                    answer,
                    classification: Some(classification),
                }
            }
            Err(e) => self.fail(request_id, Some(classification), e),
        }
    }

    /// Terminal FAILED(kind): the originating component's error kind is
    /// preserved for telemetry, the user gets the apology message.
    fn fail(
        &self,
        request_id: Uuid,
        classification: Option<Classification>,
        error: LuatbotError,
    ) -> Response {
        tracing::error!(%request_id, kind = error.kind(), error = %error, "pipeline stage failed");
        Response {
            request_id,
            outcome: Outcome::Failed {
                kind: error.kind().to_string(),
            },
            answer: Answer::canned(messages::UNAVAILABLE, Provenance::Unavailable),
            classification,
        }
    }

    fn cache_lookup(&self, question: &str) -> Option<Answer> {
        self.cache
            .lock()
            .ok()
            .and_then(|cache| cache.get(question).cloned())
    }

    fn cache_insert(&self, question: &str, answer: &Answer) {
        if let Ok(mut cache) = self.cache.lock() {
            if cache.len() >= ANSWER_CACHE_CAP {
                cache.clear();
            }
            cache.insert(question.to_string(), answer.clone());
        }
    }
}
