// Host runtime surface
//
// The browser's built-in AI subsystem is consumed through these traits. A
// wasm bridge, a webview bridge, the cloud provider or the simulated runtime
// implement them; the rest of the crate never touches a concrete host.

pub mod simulated;
pub mod user_agent;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::HostError;

pub use simulated::{CallRecord, CreationRecord, ProviderFixture, RuntimeFixture, SessionBehavior, SessionFixture, SimulatedRuntime};
pub use user_agent::BrowserFamily;

// ============================================================================
// API shapes
// ============================================================================

/// Known shapes under which a runtime has exposed the capability provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApiShape {
    /// Global `Summarizer` / `Translator` / `Writer` / `LanguageModel` constructors
    GlobalConstructors,
    /// `self.ai.summarizer`, `self.ai.languageModel`, ...
    Namespaced,
    /// Deprecated `window.ai.*`
    LegacyWindow,
}

impl ApiShape {
    /// Detection order, newest shape first
    pub const PRIORITY: [ApiShape; 3] = [
        ApiShape::GlobalConstructors,
        ApiShape::Namespaced,
        ApiShape::LegacyWindow,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ApiShape::GlobalConstructors => "global constructors",
            ApiShape::Namespaced => "self.ai",
            ApiShape::LegacyWindow => "window.ai (deprecated)",
        }
    }
}

// ============================================================================
// Session options
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryType {
    #[serde(rename = "tl;dr")]
    TlDr,
    KeyPoints,
    Teaser,
    Headline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextFormat {
    PlainText,
    Markdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputLength {
    Short,
    Medium,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriterTone {
    Formal,
    Neutral,
    Casual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizerOptions {
    #[serde(rename = "type")]
    pub kind: SummaryType,
    pub format: TextFormat,
    pub length: OutputLength,
}

impl Default for SummarizerOptions {
    fn default() -> Self {
        Self {
            kind: SummaryType::KeyPoints,
            format: TextFormat::PlainText,
            length: OutputLength::Medium,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatorOptions {
    pub source_language: String,
    pub target_language: String,
}

impl Default for TranslatorOptions {
    fn default() -> Self {
        Self {
            source_language: "en".to_string(),
            target_language: "es".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriterOptions {
    pub tone: WriterTone,
    pub format: TextFormat,
    pub length: OutputLength,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            tone: WriterTone::Neutral,
            format: TextFormat::PlainText,
            length: OutputLength::Medium,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptOptions {
    pub system_prompt: Option<String>,
}

/// Whether the model behind a capability can be used right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelAvailability {
    Readily,
    AfterDownload,
    No,
}

// ============================================================================
// Capability traits
// ============================================================================

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<String, HostError>;
}

#[async_trait]
pub trait SummarizerFactory: Send + Sync {
    async fn availability(&self) -> Result<ModelAvailability, HostError>;
    async fn create(&self, options: SummarizerOptions) -> Result<Box<dyn Summarizer>, HostError>;
}

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String, HostError>;
}

#[async_trait]
pub trait TranslatorFactory: Send + Sync {
    async fn availability(&self, options: &TranslatorOptions) -> Result<ModelAvailability, HostError>;
    async fn create(&self, options: TranslatorOptions) -> Result<Box<dyn Translator>, HostError>;
}

#[async_trait]
pub trait Writer: Send + Sync {
    async fn write(&self, text: &str, context: Option<&str>) -> Result<String, HostError>;
}

#[async_trait]
pub trait WriterFactory: Send + Sync {
    async fn availability(&self) -> Result<ModelAvailability, HostError>;
    async fn create(&self, options: WriterOptions) -> Result<Box<dyn Writer>, HostError>;
}

#[async_trait]
pub trait PromptSession: Send + Sync {
    async fn prompt(&self, text: &str) -> Result<String, HostError>;
}

#[async_trait]
pub trait PromptModelFactory: Send + Sync {
    async fn availability(&self) -> Result<ModelAvailability, HostError>;
    async fn create(&self, options: PromptOptions) -> Result<Box<dyn PromptSession>, HostError>;
}

/// The capability provider object of one API shape.
///
/// Accessors report presence only (`Some` = present and truthy); they must
/// not invoke anything.
pub trait CapabilityProvider: Send + Sync {
    fn summarizer(&self) -> Option<Arc<dyn SummarizerFactory>>;
    fn translator(&self) -> Option<Arc<dyn TranslatorFactory>>;
    fn writer(&self) -> Option<Arc<dyn WriterFactory>>;
    fn prompt_model(&self) -> Option<Arc<dyn PromptModelFactory>>;
}

// ============================================================================
// Host runtime
// ============================================================================

/// What the core needs to know about the page it runs in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContext {
    /// Full page URL, e.g. `https://focusmate.vercel.app/dashboard`
    pub url: Option<String>,
    /// Contents of every `<meta http-equiv="origin-trial">` tag
    #[serde(default)]
    pub origin_trial_tokens: Vec<String>,
}

impl PageContext {
    pub fn parsed_url(&self) -> Option<Url> {
        self.url.as_deref().and_then(|u| Url::parse(u).ok())
    }
}

/// The global scope of the host (browser window, worker, webview, ...)
pub trait HostRuntime: Send + Sync {
    fn user_agent(&self) -> String;

    /// Looks up the provider object for one API shape.
    ///
    /// `Ok(None)` means the shape is absent. `Err` means the lookup itself
    /// blew up (a throwing getter, a torn-down bridge).
    fn provider(&self, shape: ApiShape) -> Result<Option<Arc<dyn CapabilityProvider>>, HostError>;

    fn page(&self) -> PageContext;
}
