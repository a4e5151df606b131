//! OpenAI-compatible chat-completions generator.
//!
//! One request per `generate` call; the retry policy lives in the answer
//! synthesizer. Error mapping matters there: transport failures, 429 and
//! 5xx become `Http` (transient, retryable), other API rejections become
//! `GenerationUnavailable`, and an unparseable body is `GenerationFailed`.

use async_trait::async_trait;
use serde_json::{Value, json};

use luatbot_core::error::{LuatbotError, Result};
use luatbot_core::traits::Generator;

pub struct OpenAiCompatibleGenerator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiCompatibleGenerator {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<Self> {
        if model.trim().is_empty() {
            return Err(LuatbotError::Config("llm model name is empty".into()));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            model: model.to_string(),
            temperature,
            max_tokens,
        })
    }

    fn apply_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.is_empty() {
            req
        } else {
            req.header("Authorization", format!("Bearer {}", self.api_key))
        }
    }
}

#[async_trait]
impl Generator for OpenAiCompatibleGenerator {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let req = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&body);
        let resp = self
            .apply_auth(req)
            .send()
            .await
            .map_err(|e| LuatbotError::Http(format!("generation request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            // Throttling and server trouble are worth retrying; anything
            // else (bad model name, rejected request) is not.
            if status.as_u16() == 429 || status.is_server_error() {
                return Err(LuatbotError::Http(format!(
                    "generation endpoint returned {status}: {text}"
                )));
            }
            return Err(LuatbotError::GenerationUnavailable(format!(
                "generation endpoint rejected the request ({status}): {text}"
            )));
        }

        let parsed: Value = resp
            .json()
            .await
            .map_err(|e| LuatbotError::GenerationFailed(format!("malformed response: {e}")))?;
        let content = parsed["choices"]
            .get(0)
            .and_then(|choice| choice["message"]["content"].as_str())
            .ok_or_else(|| {
                LuatbotError::GenerationFailed("response carried no message content".into())
            })?;
        Ok(content.to_string())
    }
}
