//! Grounded chat answering with cache-aside responses
//!
//! The chat engine takes an already-validated caller identity, grounds the
//! LLM in the tenant's profile and knowledge base, and caches answers in
//! Redis. Cache keys embed the tenant's knowledge version, so a knowledge
//! mutation strands every older cached answer; a 1-hour TTL reclaims them.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{instrument, warn};

use crate::cache::{CHAT_RESPONSE_TTL_SECS, ResponseCache, chat_response_key};
use crate::error::{KnowledgeError, KnowledgeResult};
use crate::models::{CallerIdentity, KnowledgePair, TenantProfile};
use crate::repository::KnowledgeRepository;
use crate::service::load_chat_config;

/// Trait for chat completion backends
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Run one completion with a system prompt and a user message
    async fn complete(&self, system: &str, user: &str) -> KnowledgeResult<String>;
}

/// Configuration for an OpenAI-style local chat endpoint
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Per-request timeout in seconds; completions can be slow on CPU
    pub timeout_secs: u64,
}

impl OllamaConfig {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            api_key: None,
            timeout_secs: 120,
        }
    }

    /// Load from environment variables
    ///
    /// - `OLLAMA_BASE_URL` (default: `http://localhost:11434/v1`)
    /// - `OLLAMA_MODEL` (default: `llama3`)
    /// - `OLLAMA_API_KEY` (optional)
    /// - `OLLAMA_TIMEOUT_SECS` (optional, default: 120)
    pub fn from_env() -> Self {
        let base_url = std::env::var("OLLAMA_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:11434/v1".to_string());
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3".to_string());

        let mut config = Self::new(base_url, model);
        config.api_key = std::env::var("OLLAMA_API_KEY").ok();
        if let Some(timeout) = std::env::var("OLLAMA_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.timeout_secs = timeout;
        }
        config
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self::new("http://localhost:11434/v1", "llama3")
    }
}

/// Completion client speaking the OpenAI `/chat/completions` protocol
/// (Ollama, vLLM and similar local servers expose the same contract)
pub struct OllamaClient {
    client: Client,
    config: OllamaConfig,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn from_env() -> Self {
        Self::new(OllamaConfig::from_env())
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[async_trait]
impl CompletionClient for OllamaClient {
    #[instrument(skip(self, system, user))]
    async fn complete(&self, system: &str, user: &str) -> KnowledgeResult<String> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user.to_string(),
                },
            ],
        };

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .timeout(std::time::Duration::from_secs(self.config.timeout_secs))
            .json(&request);

        if let Some(ref api_key) = self.config.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| KnowledgeError::Completion(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(KnowledgeError::Completion(format!(
                "Chat API error ({}): {}",
                status, error_text
            )));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| KnowledgeError::Completion(e.to_string()))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| KnowledgeError::Completion("No completion returned".to_string()))
    }
}

/// Chat engine answering customer messages grounded in tenant knowledge
pub struct ChatEngine<R: KnowledgeRepository, C: CompletionClient> {
    repository: Arc<R>,
    completion: Arc<C>,
    cache: Arc<dyn ResponseCache>,
}

impl<R: KnowledgeRepository, C: CompletionClient> ChatEngine<R, C> {
    pub fn new(repository: Arc<R>, completion: Arc<C>, cache: Arc<dyn ResponseCache>) -> Self {
        Self {
            repository,
            completion,
            cache,
        }
    }

    /// Answer a chat message for the given caller
    ///
    /// Cache-aside: hit returns the cached answer untouched; miss gathers
    /// the tenant profile and chat config, runs the LLM, and writes the
    /// answer back with a TTL. Cache failures never fail the request.
    #[instrument(skip(self, identity, message), fields(tenant_id = %identity.tenant_id))]
    pub async fn answer(&self, identity: &CallerIdentity, message: &str) -> KnowledgeResult<String> {
        let message = message.trim();
        if message.is_empty() {
            return Err(KnowledgeError::Validation(
                "Message cannot be empty".to_string(),
            ));
        }

        let version = match self.cache.knowledge_version(&identity.tenant_id).await {
            Ok(version) => version,
            Err(err) => {
                warn!(error = %err, "Knowledge version unavailable; using 0");
                0
            }
        };

        let key = chat_response_key(&identity.api_key, version, &message_digest(message));

        match self.cache.get(&key).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(err) => {
                warn!(error = %err, "Chat response cache read failed");
            }
        }

        let profile = self
            .repository
            .get_tenant_profile(&identity.tenant_id)
            .await?;
        let pairs = load_chat_config(&*self.repository, &*self.cache, &identity.tenant_id).await?;

        let system = build_system_prompt(profile.as_ref(), &pairs);
        let answer = self.completion.complete(&system, message).await?;

        if let Err(err) = self
            .cache
            .set(&key, &answer, Some(CHAT_RESPONSE_TTL_SECS))
            .await
        {
            warn!(error = %err, "Chat response cache write failed");
        }

        Ok(answer)
    }
}

/// Hex SHA-256 of the message text, used in the cache key
pub(crate) fn message_digest(message: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(message.as_bytes());
    const_hex::encode(hasher.finalize())
}

fn format_company_info(profile: &TenantProfile) -> String {
    let mut info = format!("Company: {}", profile.company_name);
    if let Some(ref description) = profile.description {
        info.push_str(&format!("\nAbout: {}", description));
    }
    if let Some(ref website) = profile.website {
        info.push_str(&format!("\nWebsite: {}", website));
    }
    info
}

fn knowledge_base_string(pairs: &[KnowledgePair]) -> String {
    pairs
        .iter()
        .map(|pair| format!("Q: {}\nA: {}", pair.question, pair.answer))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn build_system_prompt(profile: Option<&TenantProfile>, pairs: &[KnowledgePair]) -> String {
    let mut prompt = String::from(
        "You are a helpful customer support assistant. \
         Answer using the company information and knowledge base below. \
         If the knowledge base does not cover a question, say so honestly.",
    );

    if let Some(profile) = profile {
        prompt.push_str("\n\n");
        prompt.push_str(&format_company_info(profile));
    }

    if !pairs.is_empty() {
        prompt.push_str("\n\nKnowledge base:\n");
        prompt.push_str(&knowledge_base_string(pairs));
    }

    prompt.push_str(
        "\n\nA single message may ask about several topics; address each one in your reply.",
    );

    prompt
}
