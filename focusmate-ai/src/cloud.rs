// OpenRouter cloud provider
//
// Exposes a summarizer and a prompt model backed by an OpenAI-compatible
// chat-completions endpoint. Translator and writer are absent.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::CloudConfig;
use crate::error::HostError;
use crate::runtime::{
    ApiShape, CapabilityProvider, HostRuntime, ModelAvailability, PageContext, PromptModelFactory,
    PromptOptions, PromptSession, Summarizer, SummarizerFactory, SummarizerOptions, SummaryType,
    TranslatorFactory, WriterFactory,
};

pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";
const API_KEY_PLACEHOLDER: &str = "your_openrouter_api_key_here";
const APP_TITLE: &str = "FocusMate - AI Text Processing";
const DEFAULT_PROMPT_SYSTEM: &str = "You are a helpful assistant. Answer briefly and precisely.";

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Deserialize, Debug)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    pub error: Option<ApiErrorBody>,
}

#[derive(Deserialize, Debug)]
pub struct Choice {
    pub message: Option<MessageContent>,
    /// Older completion-style payloads put the text here
    pub text: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct MessageContent {
    pub content: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ApiErrorBody {
    pub message: Option<String>,
}

/// Pick the usable key: configured value first, then the environment.
/// Blank values and the sample placeholder count as missing.
pub fn resolve_api_key(configured: Option<&str>, from_env: Option<String>) -> Option<String> {
    configured
        .map(str::to_string)
        .into_iter()
        .chain(from_env)
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty() && key != API_KEY_PLACEHOLDER)
}

/// Extract the reply text from a chat-completions body. Missing content
/// yields an empty string.
pub fn parse_completion(body: &str) -> Result<String, HostError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| HostError::Remote(format!("failed to parse LLM response: {}", e)))?;

    if let Some(error) = response.error {
        return Err(HostError::Remote(
            error.message.unwrap_or_else(|| "unknown error occurred".to_string()),
        ));
    }

    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.and_then(|m| m.content).or(choice.text))
        .unwrap_or_default();

    Ok(content.trim().to_string())
}

fn status_error(status: StatusCode, body: &str) -> HostError {
    match status {
        StatusCode::UNAUTHORIZED => HostError::Unauthorized,
        StatusCode::TOO_MANY_REQUESTS => HostError::RateLimited,
        _ => HostError::Remote(format!("{}: {}", status, body.trim())),
    }
}

/// Thin chat-completions client
#[derive(Clone)]
pub struct OpenRouterClient {
    http: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl OpenRouterClient {
    pub fn new(config: &CloudConfig) -> Self {
        let api_key = resolve_api_key(config.api_key.as_deref(), std::env::var(API_KEY_ENV).ok());
        if api_key.is_none() {
            warn!("OpenRouter API key is not configured; cloud provider will report unavailable");
        }

        Self {
            http: Client::new(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: config.request_timeout(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn availability(&self) -> ModelAvailability {
        if self.is_configured() {
            ModelAvailability::Readily
        } else {
            ModelAvailability::No
        }
    }

    pub async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, HostError> {
        let api_key = self.api_key.as_deref().ok_or(HostError::Unauthorized)?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            format!("Bearer {}", api_key)
                .parse()
                .map_err(|_| HostError::Remote("invalid authorization header".to_string()))?,
        );
        headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));
        headers.insert("X-Title", header::HeaderValue::from_static(APP_TITLE));

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        info!("🐞 LLM Request to OpenRouter: model={}", self.model);

        let response = self
            .http
            .post(&self.endpoint)
            .headers(headers)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    HostError::Timeout(self.timeout)
                } else {
                    HostError::Remote(format!("failed to send request to LLM: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| HostError::Remote(format!("failed to read LLM response: {}", e)))?;

        if !status.is_success() {
            warn!("OpenRouter request failed with {}", status);
            return Err(status_error(status, &body));
        }

        info!("🐞 LLM Response received from OpenRouter");
        parse_completion(&body)
    }
}

fn summary_system_prompt(options: &SummarizerOptions) -> String {
    let shape = match options.kind {
        SummaryType::KeyPoints => "as a short list of key points",
        SummaryType::TlDr => "as a one-paragraph tl;dr",
        SummaryType::Teaser => "as an engaging teaser",
        SummaryType::Headline => "as a single headline",
    };
    format!(
        "You are a summarization assistant. Follow the instruction at the start of the user message and summarize the text {}. Keep it SHORT.",
        shape
    )
}

struct CloudSummarizerFactory {
    client: Arc<OpenRouterClient>,
}

struct CloudSummarizer {
    client: Arc<OpenRouterClient>,
    system_prompt: String,
}

#[async_trait]
impl SummarizerFactory for CloudSummarizerFactory {
    async fn availability(&self) -> Result<ModelAvailability, HostError> {
        Ok(self.client.availability())
    }

    async fn create(&self, options: SummarizerOptions) -> Result<Box<dyn Summarizer>, HostError> {
        if !self.client.is_configured() {
            return Err(HostError::create("summarizer", "OpenRouter API key is not configured"));
        }
        Ok(Box::new(CloudSummarizer {
            client: self.client.clone(),
            system_prompt: summary_system_prompt(&options),
        }))
    }
}

#[async_trait]
impl Summarizer for CloudSummarizer {
    async fn summarize(&self, text: &str) -> Result<String, HostError> {
        self.client.complete(&self.system_prompt, text).await
    }
}

struct CloudPromptFactory {
    client: Arc<OpenRouterClient>,
}

struct CloudPromptSession {
    client: Arc<OpenRouterClient>,
    system_prompt: String,
}

#[async_trait]
impl PromptModelFactory for CloudPromptFactory {
    async fn availability(&self) -> Result<ModelAvailability, HostError> {
        Ok(self.client.availability())
    }

    async fn create(&self, options: PromptOptions) -> Result<Box<dyn PromptSession>, HostError> {
        if !self.client.is_configured() {
            return Err(HostError::create("prompt model", "OpenRouter API key is not configured"));
        }
        Ok(Box::new(CloudPromptSession {
            client: self.client.clone(),
            system_prompt: options
                .system_prompt
                .unwrap_or_else(|| DEFAULT_PROMPT_SYSTEM.to_string()),
        }))
    }
}

#[async_trait]
impl PromptSession for CloudPromptSession {
    async fn prompt(&self, text: &str) -> Result<String, HostError> {
        self.client.complete(&self.system_prompt, text).await
    }
}

/// `CapabilityProvider` backed by OpenRouter
pub struct OpenRouterProvider {
    client: Arc<OpenRouterClient>,
}

impl OpenRouterProvider {
    pub fn new(config: &CloudConfig) -> Self {
        Self {
            client: Arc::new(OpenRouterClient::new(config)),
        }
    }

    pub fn client(&self) -> &OpenRouterClient {
        &self.client
    }
}

impl CapabilityProvider for OpenRouterProvider {
    fn summarizer(&self) -> Option<Arc<dyn SummarizerFactory>> {
        Some(Arc::new(CloudSummarizerFactory {
            client: self.client.clone(),
        }))
    }

    fn translator(&self) -> Option<Arc<dyn TranslatorFactory>> {
        None
    }

    fn writer(&self) -> Option<Arc<dyn WriterFactory>> {
        None
    }

    fn prompt_model(&self) -> Option<Arc<dyn PromptModelFactory>> {
        Some(Arc::new(CloudPromptFactory {
            client: self.client.clone(),
        }))
    }
}

/// Host runtime that exposes only the cloud provider, under the global
/// constructor shape
pub struct CloudRuntime {
    provider: Arc<OpenRouterProvider>,
}

impl CloudRuntime {
    pub fn new(config: &CloudConfig) -> Self {
        Self {
            provider: Arc::new(OpenRouterProvider::new(config)),
        }
    }

    pub fn provider(&self) -> &OpenRouterProvider {
        &self.provider
    }
}

impl HostRuntime for CloudRuntime {
    fn user_agent(&self) -> String {
        format!("focusmate-ai/{}", env!("CARGO_PKG_VERSION"))
    }

    fn provider(&self, shape: ApiShape) -> Result<Option<Arc<dyn CapabilityProvider>>, HostError> {
        match shape {
            ApiShape::GlobalConstructors => {
                let provider: Arc<dyn CapabilityProvider> = self.provider.clone();
                Ok(Some(provider))
            }
            _ => Ok(None),
        }
    }

    fn page(&self) -> PageContext {
        PageContext::default()
    }
}
