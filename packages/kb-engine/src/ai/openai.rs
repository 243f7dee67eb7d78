//! OpenAI-compatible chat and embeddings backend.
//!
//! Works against OpenRouter (the default), OpenAI, or any server exposing
//! `/chat/completions` and `/embeddings`.
//!
//! # Example
//!
//! ```rust,ignore
//! use kb_engine::ai::OpenAiCompat;
//! use kb_engine::security::LlmCredentials;
//!
//! let creds = LlmCredentials::new(key, "arcee-ai/trinity-mini:free", "https://openrouter.ai/api/v1")?;
//! let llm = OpenAiCompat::new(creds)?.with_embedding_model("openai/text-embedding-3-small");
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::security::{ExposeSecret, LlmCredentials};
use crate::traits::{
    embedder::Embedder,
    llm::{Llm, Prompt},
};

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_CHAT_MODEL: &str = "arcee-ai/trinity-mini:free";
pub const DEFAULT_EMBEDDING_MODEL: &str = "openai/text-embedding-3-small";

/// Fixed budget for a single backend call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Remote backend over an OpenAI-compatible REST API.
#[derive(Clone)]
pub struct OpenAiCompat {
    client: Client,
    credentials: LlmCredentials,
    embedding_model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiCompat {
    pub fn new(credentials: LlmCredentials) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| EngineError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            credentials,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            temperature: 0.3,
            max_tokens: 1024,
        })
    }

    /// Set the embedding model.
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the completion token cap.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.credentials.model
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.credentials.base_url, path)
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> reqwest::Result<reqwest::Response> {
        self.client
            .post(self.url(path))
            .bearer_auth(self.credentials.api_key.expose_secret())
            .json(body)
            .send()
            .await
    }
}

#[async_trait]
impl Llm for OpenAiCompat {
    async fn generate(&self, prompt: &Prompt) -> Result<String> {
        let request = ChatRequest {
            model: &self.credentials.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt.text,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self.post("chat/completions", &request).await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EngineError::Transport(format!(
                "chat completion returned {}: {}",
                status, error_text
            )));
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| EngineError::Transport("no completion in response".into()))?;

        debug!(kind = %prompt.kind, chars = content.len(), "LLM completion");
        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl Embedder for OpenAiCompat {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.embedding_model,
            input: texts,
        };

        let response = self
            .post("embeddings", &request)
            .await
            .map_err(|e| EngineError::Embedding(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EngineError::Embedding(format!(
                "embeddings returned {}: {}",
                status, error_text
            )));
        }

        let mut body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EngineError::Embedding(e.to_string()))?;

        if body.data.len() != texts.len() {
            return Err(EngineError::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                body.data.len()
            )));
        }

        body.data.sort_by_key(|d| d.index);
        Ok(body.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::llm::PromptKind;

    fn backend(base_url: &str) -> OpenAiCompat {
        OpenAiCompat::new(LlmCredentials::new("sk-test", DEFAULT_CHAT_MODEL, base_url).unwrap()).unwrap()
    }

    #[test]
    fn test_chat_response_with_null_content() {
        let parsed: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }

    #[test]
    fn test_url_joins_base_and_path() {
        let llm = backend("https://openrouter.ai/api/v1/");
        assert_eq!(llm.url("chat/completions"), "https://openrouter.ai/api/v1/chat/completions");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let llm = backend("http://127.0.0.1:9/v1");
        let err = llm
            .generate(&Prompt::new(PromptKind::Answer, "hello"))
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_empty_batch_skips_request() {
        let llm = backend("http://127.0.0.1:9/v1");
        assert!(llm.embed(&[]).await.unwrap().is_empty());
    }
}
