// In-memory host runtime described by a serde fixture.
//
// Drives the ai-doctor helper (`--runtime fixture.json`) and the test
// suites. Every session creation and capability call is recorded so callers
// can assert on the exact options and text that reached the capability.
// Both logs keep only the most recent `MAX_RECORDS` entries.

use std::collections::{BTreeMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    ApiShape, CapabilityProvider, HostRuntime, ModelAvailability, PageContext, PromptModelFactory,
    PromptOptions, PromptSession, Summarizer, SummarizerFactory, SummarizerOptions, Translator,
    TranslatorFactory, TranslatorOptions, Writer, WriterFactory, WriterOptions,
};
use crate::error::{ConfigError, HostError};

// ============================================================================
// Fixture types
// ============================================================================

/// How a simulated session answers a call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SessionBehavior {
    /// Returns the input unchanged
    #[default]
    Echo,
    /// Returns a fixed text
    Reply { text: String },
    /// Always fails
    Fail { message: String },
    /// Fails when the input contains `needle`, echoes otherwise
    FailOn { needle: String, message: String },
    /// Never resolves
    Hang,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFixture {
    #[serde(default = "default_availability")]
    pub availability: ModelAvailability,
    #[serde(default)]
    pub behavior: SessionBehavior,
    /// When set, `create` fails with this message
    #[serde(default)]
    pub create_error: Option<String>,
}

fn default_availability() -> ModelAvailability {
    ModelAvailability::Readily
}

impl Default for SessionFixture {
    fn default() -> Self {
        Self {
            availability: ModelAvailability::Readily,
            behavior: SessionBehavior::Echo,
            create_error: None,
        }
    }
}

impl SessionFixture {
    pub fn with_behavior(behavior: SessionBehavior) -> Self {
        Self {
            behavior,
            ..Self::default()
        }
    }
}

/// Sub-capabilities exposed under one API shape
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderFixture {
    #[serde(default)]
    pub summarizer: Option<SessionFixture>,
    #[serde(default)]
    pub translator: Option<SessionFixture>,
    #[serde(default)]
    pub writer: Option<SessionFixture>,
    #[serde(default)]
    pub prompt_model: Option<SessionFixture>,
}

/// Complete description of a simulated runtime
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeFixture {
    pub user_agent: String,
    #[serde(default)]
    pub page: PageContext,
    #[serde(default)]
    pub providers: BTreeMap<ApiShape, ProviderFixture>,
    /// When set, every provider lookup fails with this message
    #[serde(default)]
    pub probe_error: Option<String>,
}

/// Oldest entries are dropped past this many records per log
pub const MAX_RECORDS: usize = 1_000;

/// One session creation, with the options it was created with
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreationRecord {
    pub capability: &'static str,
    pub options: Value,
}

/// One call that reached a simulated session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    pub capability: &'static str,
    pub input: String,
    pub context: Option<String>,
}

// ============================================================================
// Runtime
// ============================================================================

struct SimState {
    fixture: RwLock<RuntimeFixture>,
    calls: Mutex<VecDeque<CallRecord>>,
    creations: Mutex<VecDeque<CreationRecord>>,
}

fn push_capped<T>(log: &Mutex<VecDeque<T>>, record: T) {
    let mut log = log.lock().unwrap_or_else(PoisonError::into_inner);
    if log.len() == MAX_RECORDS {
        log.pop_front();
    }
    log.push_back(record);
}

impl SimState {
    fn record(&self, capability: &'static str, input: &str, context: Option<&str>) {
        push_capped(
            &self.calls,
            CallRecord {
                capability,
                input: input.to_string(),
                context: context.map(str::to_string),
            },
        );
    }

    fn record_creation(&self, capability: &'static str, options: &impl Serialize) {
        push_capped(
            &self.creations,
            CreationRecord {
                capability,
                options: serde_json::to_value(options).unwrap_or(Value::Null),
            },
        );
    }
}

/// Host runtime backed by a `RuntimeFixture`
#[derive(Clone)]
pub struct SimulatedRuntime {
    state: Arc<SimState>,
}

impl SimulatedRuntime {
    pub fn new(fixture: RuntimeFixture) -> Self {
        Self {
            state: Arc::new(SimState {
                fixture: RwLock::new(fixture),
                calls: Mutex::new(VecDeque::new()),
                creations: Mutex::new(VecDeque::new()),
            }),
        }
    }

    /// Load a fixture from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let fixture: RuntimeFixture = serde_json::from_str(&content)?;
        Ok(Self::new(fixture))
    }

    /// Swap the described runtime (e.g. a flag gets disabled mid-session)
    pub fn set_fixture(&self, fixture: RuntimeFixture) {
        let mut current = self.state.fixture.write().unwrap_or_else(PoisonError::into_inner);
        *current = fixture;
    }

    pub fn fixture(&self) -> RuntimeFixture {
        self.state
            .fixture
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn calls(&self) -> Vec<CallRecord> {
        self.state
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn creations(&self) -> Vec<CreationRecord> {
        self.state
            .creations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn call_count(&self, capability: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.capability == capability)
            .count()
    }

    /// Forget every recorded call and creation
    pub fn clear_calls(&self) {
        self.state
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.state
            .creations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl HostRuntime for SimulatedRuntime {
    fn user_agent(&self) -> String {
        self.fixture().user_agent
    }

    fn provider(&self, shape: ApiShape) -> Result<Option<Arc<dyn CapabilityProvider>>, HostError> {
        let fixture = self.fixture();
        if let Some(message) = fixture.probe_error {
            return Err(HostError::Access(message));
        }

        Ok(fixture.providers.get(&shape).map(|provider| {
            Arc::new(SimProvider {
                fixture: provider.clone(),
                state: self.state.clone(),
            }) as Arc<dyn CapabilityProvider>
        }))
    }

    fn page(&self) -> PageContext {
        self.fixture().page
    }
}

// ============================================================================
// Provider, factories and sessions
// ============================================================================

struct SimProvider {
    fixture: ProviderFixture,
    state: Arc<SimState>,
}

impl SimProvider {
    fn factory(&self, capability: &'static str, fixture: &Option<SessionFixture>) -> Option<Arc<SimFactory>> {
        fixture.as_ref().map(|f| {
            Arc::new(SimFactory {
                capability,
                fixture: f.clone(),
                state: self.state.clone(),
            })
        })
    }
}

impl CapabilityProvider for SimProvider {
    fn summarizer(&self) -> Option<Arc<dyn SummarizerFactory>> {
        self.factory("summarizer", &self.fixture.summarizer)
            .map(|f| f as Arc<dyn SummarizerFactory>)
    }

    fn translator(&self) -> Option<Arc<dyn TranslatorFactory>> {
        self.factory("translator", &self.fixture.translator)
            .map(|f| f as Arc<dyn TranslatorFactory>)
    }

    fn writer(&self) -> Option<Arc<dyn WriterFactory>> {
        self.factory("writer", &self.fixture.writer)
            .map(|f| f as Arc<dyn WriterFactory>)
    }

    fn prompt_model(&self) -> Option<Arc<dyn PromptModelFactory>> {
        self.factory("promptModel", &self.fixture.prompt_model)
            .map(|f| f as Arc<dyn PromptModelFactory>)
    }
}

struct SimFactory {
    capability: &'static str,
    fixture: SessionFixture,
    state: Arc<SimState>,
}

impl SimFactory {
    fn session(&self, options: &impl Serialize) -> Result<SimSession, HostError> {
        self.state.record_creation(self.capability, options);
        if let Some(message) = &self.fixture.create_error {
            return Err(HostError::create(self.capability, message.clone()));
        }
        Ok(SimSession {
            capability: self.capability,
            behavior: self.fixture.behavior.clone(),
            state: self.state.clone(),
        })
    }
}

#[async_trait]
impl SummarizerFactory for SimFactory {
    async fn availability(&self) -> Result<ModelAvailability, HostError> {
        Ok(self.fixture.availability)
    }

    async fn create(&self, options: SummarizerOptions) -> Result<Box<dyn Summarizer>, HostError> {
        Ok(Box::new(self.session(&options)?))
    }
}

#[async_trait]
impl TranslatorFactory for SimFactory {
    async fn availability(&self, _options: &TranslatorOptions) -> Result<ModelAvailability, HostError> {
        Ok(self.fixture.availability)
    }

    async fn create(&self, options: TranslatorOptions) -> Result<Box<dyn Translator>, HostError> {
        Ok(Box::new(self.session(&options)?))
    }
}

#[async_trait]
impl WriterFactory for SimFactory {
    async fn availability(&self) -> Result<ModelAvailability, HostError> {
        Ok(self.fixture.availability)
    }

    async fn create(&self, options: WriterOptions) -> Result<Box<dyn Writer>, HostError> {
        Ok(Box::new(self.session(&options)?))
    }
}

#[async_trait]
impl PromptModelFactory for SimFactory {
    async fn availability(&self) -> Result<ModelAvailability, HostError> {
        Ok(self.fixture.availability)
    }

    async fn create(&self, options: PromptOptions) -> Result<Box<dyn PromptSession>, HostError> {
        Ok(Box::new(self.session(&options)?))
    }
}

struct SimSession {
    capability: &'static str,
    behavior: SessionBehavior,
    state: Arc<SimState>,
}

impl SimSession {
    async fn run(&self, input: &str, context: Option<&str>) -> Result<String, HostError> {
        self.state.record(self.capability, input, context);

        match &self.behavior {
            SessionBehavior::Echo => Ok(input.to_string()),
            SessionBehavior::Reply { text } => Ok(text.clone()),
            SessionBehavior::Fail { message } => Err(HostError::call(self.capability, message.clone())),
            SessionBehavior::FailOn { needle, message } => {
                if input.contains(needle.as_str()) {
                    Err(HostError::call(self.capability, message.clone()))
                } else {
                    Ok(input.to_string())
                }
            }
            SessionBehavior::Hang => std::future::pending().await,
        }
    }
}

#[async_trait]
impl Summarizer for SimSession {
    async fn summarize(&self, text: &str) -> Result<String, HostError> {
        self.run(text, None).await
    }
}

#[async_trait]
impl Translator for SimSession {
    async fn translate(&self, text: &str) -> Result<String, HostError> {
        self.run(text, None).await
    }
}

#[async_trait]
impl Writer for SimSession {
    async fn write(&self, text: &str, context: Option<&str>) -> Result<String, HostError> {
        self.run(text, context).await
    }
}

#[async_trait]
impl PromptSession for SimSession {
    async fn prompt(&self, text: &str) -> Result<String, HostError> {
        self.run(text, None).await
    }
}
