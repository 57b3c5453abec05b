use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::EmbeddingProvider;
use crate::error::{VectorError, VectorResult};
use crate::models::EmbeddingModel;

/// Configuration for an OpenAI-compatible embeddings endpoint
///
/// Works against api.openai.com as well as local inference servers that
/// expose the same `/embeddings` contract (the usual way to host
/// sentence-transformers models such as all-MiniLM-L6-v2).
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: EmbeddingModel,
    /// Model identifier sent on the wire; defaults to the model's name
    pub model_name: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl OpenAIConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let model = EmbeddingModel::default();
        Self {
            base_url: base_url.into(),
            api_key: None,
            model_name: model.model_name().to_string(),
            model,
            timeout_secs: 30,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: EmbeddingModel, model_name: impl Into<String>) -> Self {
        self.model = model;
        self.model_name = model_name.into();
        self
    }

    /// Load from environment variables
    ///
    /// - `EMBEDDINGS_BASE_URL` (default: `http://localhost:8000/v1`)
    /// - `EMBEDDINGS_API_KEY` (optional)
    /// - `EMBEDDINGS_MODEL` (optional, overrides the wire model name)
    /// - `EMBEDDINGS_DIMENSION` (optional, switches to a custom model)
    /// - `EMBEDDINGS_TIMEOUT_SECS` (optional, default: 30)
    pub fn from_env() -> VectorResult<Self> {
        let base_url = std::env::var("EMBEDDINGS_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8000/v1".to_string());

        let mut config = Self::new(base_url);
        config.api_key = std::env::var("EMBEDDINGS_API_KEY").ok();

        if let Ok(raw) = std::env::var("EMBEDDINGS_DIMENSION") {
            let dimension = raw.parse().map_err(|e| {
                VectorError::Config(format!("Invalid EMBEDDINGS_DIMENSION: {}", e))
            })?;
            config.model = EmbeddingModel::Custom(dimension);
        }

        if let Ok(name) = std::env::var("EMBEDDINGS_MODEL") {
            config.model_name = name;
        }

        if let Some(timeout) = std::env::var("EMBEDDINGS_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.timeout_secs = timeout;
        }

        Ok(config)
    }
}

/// Embedding provider speaking the OpenAI `/embeddings` protocol
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn from_env() -> VectorResult<Self> {
        Ok(Self::new(OpenAIConfig::from_env()?))
    }

    fn validate_input(texts: &[String]) -> VectorResult<()> {
        if let Some(position) = texts.iter().position(|t| t.trim().is_empty()) {
            return Err(VectorError::Validation(format!(
                "Cannot embed empty text (input {})",
                position
            )));
        }
        Ok(())
    }

    /// Trim surrounding whitespace so padding never changes the embedding
    fn normalized_inputs(texts: &[String]) -> Vec<String> {
        texts.iter().map(|t| t.trim().to_string()).collect()
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn dimension(&self) -> u32 {
        self.config.model.dimension()
    }

    async fn embed(&self, text: &str) -> VectorResult<Vec<f32>> {
        let results = self.embed_batch(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| VectorError::Embedding("No embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> VectorResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        Self::validate_input(texts)?;

        let request = EmbeddingRequest {
            model: self.config.model_name.clone(),
            input: Self::normalized_inputs(texts),
        };

        let mut builder = self
            .client
            .post(format!("{}/embeddings", self.config.base_url))
            .timeout(std::time::Duration::from_secs(self.config.timeout_secs))
            .json(&request);

        if let Some(ref api_key) = self.config.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(VectorError::Embedding(format!(
                "Embeddings API error ({}): {}",
                status, error_text
            )));
        }

        let embedding_response: EmbeddingResponse = response.json().await?;

        if embedding_response.data.len() != texts.len() {
            return Err(VectorError::Embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                embedding_response.data.len()
            )));
        }

        // Sort by index to preserve input order
        let mut data = embedding_response.data;
        data.sort_by_key(|d| d.index);

        let expected = self.dimension() as usize;
        data.into_iter()
            .map(|d| {
                if d.embedding.len() != expected {
                    return Err(VectorError::Embedding(format!(
                        "Model returned {}-dimension vector, expected {}",
                        d.embedding.len(),
                        expected
                    )));
                }
                Ok(d.embedding)
            })
            .collect()
    }
}
