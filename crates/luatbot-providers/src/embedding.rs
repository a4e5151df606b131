//! OpenAI-compatible embeddings client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use luatbot_core::error::{LuatbotError, Result};
use luatbot_core::traits::Embedder;

/// Async embeddings client for `POST {base}/embeddings`.
pub struct OpenAiCompatibleEmbedder {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    dimension: usize,
}

impl OpenAiCompatibleEmbedder {
    pub fn new(base_url: &str, api_key: &str, model: &str, dimension: usize) -> Result<Self> {
        if model.trim().is_empty() {
            return Err(LuatbotError::Config("embedding model name is empty".into()));
        }
        if dimension == 0 {
            return Err(LuatbotError::Config(
                "embedding dimension must be greater than zero".into(),
            ));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            model: model.to_string(),
            dimension,
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
impl Embedder for OpenAiCompatibleEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: [text],
            dimensions: Some(self.dimension),
        };
        let req = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&body);
        let resp = self
            .apply_auth(req)
            .send()
            .await
            .map_err(|e| LuatbotError::Http(format!("embedding request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(LuatbotError::Http(format!(
                "embedding endpoint returned {status}: {text}"
            )));
        }

        let parsed: EmbeddingResponse = resp
            .json()
            .await
            .map_err(|e| LuatbotError::Http(format!("malformed embedding response: {e}")))?;
        let entry = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| LuatbotError::Http("embedding response carried no vectors".into()))?;

        if entry.embedding.len() != self.dimension {
            return Err(LuatbotError::Config(format!(
                "model '{}' returned dimension {} but {} is configured; fix the config and \
                 rebuild the index",
                self.model,
                entry.embedding.len(),
                self.dimension
            )));
        }
        Ok(entry.embedding)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_is_normalized() {
        let e =
            OpenAiCompatibleEmbedder::new("https://api.openai.com/v1/", "k", "text-embedding-3-small", 1536)
                .unwrap();
        assert_eq!(e.endpoint, "https://api.openai.com/v1/embeddings");
        assert_eq!(e.model_id(), "text-embedding-3-small");
    }

    #[test]
    fn rejects_empty_model_and_zero_dimension() {
        assert!(OpenAiCompatibleEmbedder::new("http://x", "k", " ", 8).is_err());
        assert!(OpenAiCompatibleEmbedder::new("http://x", "k", "m", 0).is_err());
    }
}
