//! Answer synthesis with bounded retry.
//!
//! One generation call per attempt. Only transient failures (transport,
//! throttling, 5xx) are retried, with capped exponential backoff; other
//! errors propagate immediately. Retries are local to this component —
//! the controller never re-runs earlier stages on a synthesis failure.

use std::sync::Arc;
use std::time::Duration;

use luatbot_core::config::SynthesisConfig;
use luatbot_core::error::{LuatbotError, Result};
use luatbot_core::traits::Generator;
use luatbot_core::types::{Answer, Question, RetrievalResult};

use crate::prompt::PromptContext;

pub struct Synthesizer {
    generator: Arc<dyn Generator>,
    max_attempts: u32,
    backoff_ms: u64,
}

impl Synthesizer {
    pub fn new(generator: Arc<dyn Generator>, config: &SynthesisConfig) -> Self {
        Self {
            generator,
            max_attempts: config.max_attempts.max(1),
            backoff_ms: config.backoff_ms,
        }
    }

    /// Synthesize a grounded answer. The citation list is exactly the set
    /// of chunk ids placed into the prompt.
    pub async fn synthesize(
        &self,
        question: &Question,
        retrieved: &RetrievalResult,
    ) -> Result<Answer> {
        let context = PromptContext::build(question, retrieved);
        let prompt = context.render();

        let mut last_error: Option<LuatbotError> = None;
        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                tokio::time::sleep(self.backoff(attempt)).await;
            }
            match self.generator.generate(&prompt).await {
                Ok(text) if !text.trim().is_empty() => {
                    if attempt > 1 {
                        tracing::info!(attempt, "generation succeeded after retry");
                    }
                    return Ok(Answer::grounded(text.trim(), context.cited_chunk_ids()));
                }
                Ok(_) => {
                    tracing::warn!(attempt, "generation returned empty output");
                    last_error = Some(LuatbotError::GenerationFailed(format!(
                        "empty output after {attempt} attempt(s)"
                    )));
                }
                Err(e) if e.is_transient() => {
                    tracing::warn!(attempt, error = %e, "transient generation failure");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        // Retry budget exhausted: transport trouble surfaces as
        // unavailable, unusable output as failed.
        Err(match last_error {
            Some(LuatbotError::Http(msg)) => LuatbotError::GenerationUnavailable(msg),
            Some(e) => e,
            None => LuatbotError::GenerationUnavailable("no attempt was made".into()),
        })
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let capped = (attempt - 1).min(5);
        Duration::from_millis(self.backoff_ms << capped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use luatbot_core::types::{Chunk, ScoredChunk, SourceRef};
    use std::sync::Mutex;

    /// Generator that plays back a scripted sequence of outcomes.
    struct ScriptedGenerator {
        script: Mutex<Vec<Result<String>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedGenerator {
        fn new(script: Vec<Result<String>>) -> Self {
            Self {
                script: Mutex::new(script),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Generator for ScriptedGenerator {
        fn name(&self) -> &str {
            "scripted"
        }
        async fn generate(&self, _prompt: &str) -> Result<String> {
            *self.calls.lock().unwrap() += 1;
            self.script.lock().unwrap().remove(0)
        }
    }

    fn retrieved() -> RetrievalResult {
        vec![ScoredChunk {
            chunk: Chunk {
                id: "d100-5-1".into(),
                content: "Phạt tiền từ 800.000 đồng...".into(),
                source: SourceRef::new("Nghị định 100/2019/NĐ-CP"),
            },
            score: 0.8,
        }]
    }

    fn synthesizer(generator: Arc<ScriptedGenerator>) -> Synthesizer {
        Synthesizer::new(
            generator,
            &SynthesisConfig {
                max_attempts: 3,
                backoff_ms: 1,
            },
        )
    }

    #[tokio::test]
    async fn success_carries_prompt_citations() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Ok(
            "Mức phạt là 800.000 đến 1.000.000 đồng.".into()
        )]));
        let answer = synthesizer(generator.clone())
            .synthesize(&Question::new("phạt bao nhiêu?"), &retrieved())
            .await
            .unwrap();
        assert_eq!(answer.citations, vec!["d100-5-1".to_string()]);
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn transient_failures_retry_then_succeed() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Err(LuatbotError::Http("429".into())),
            Err(LuatbotError::Http("timeout".into())),
            Ok("Trả lời.".into()),
        ]));
        let answer = synthesizer(generator.clone())
            .synthesize(&Question::new("phạt?"), &retrieved())
            .await
            .unwrap();
        assert_eq!(answer.text, "Trả lời.");
        assert_eq!(generator.calls(), 3);
    }

    #[tokio::test]
    async fn exhausted_transient_failures_become_unavailable() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Err(LuatbotError::Http("503".into())),
            Err(LuatbotError::Http("503".into())),
            Err(LuatbotError::Http("503".into())),
        ]));
        let err = synthesizer(generator.clone())
            .synthesize(&Question::new("phạt?"), &retrieved())
            .await
            .unwrap_err();
        assert!(matches!(err, LuatbotError::GenerationUnavailable(_)));
        assert_eq!(generator.calls(), 3);
    }

    #[tokio::test]
    async fn persistent_empty_output_becomes_generation_failed() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Ok("".into()),
            Ok("  ".into()),
            Ok("".into()),
        ]));
        let err = synthesizer(generator)
            .synthesize(&Question::new("phạt?"), &retrieved())
            .await
            .unwrap_err();
        assert!(matches!(err, LuatbotError::GenerationFailed(_)));
    }

    #[tokio::test]
    async fn non_transient_errors_do_not_retry() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Err(
            LuatbotError::GenerationUnavailable("model not found".into()),
        )]));
        let err = synthesizer(generator.clone())
            .synthesize(&Question::new("phạt?"), &retrieved())
            .await
            .unwrap_err();
        assert!(matches!(err, LuatbotError::GenerationUnavailable(_)));
        assert_eq!(generator.calls(), 1);
    }
}
