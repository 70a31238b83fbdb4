// Capability invoker
// Single entry point for the UI: health gate, re-probe, call, classify

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::modes::{OperationKind, ProcessingMode};
use super::policy::MissingCapabilityPolicy;
use super::result::{InvocationErrorKind, InvocationResult};
use super::tasks::{extract_tasks, format_numbered};
use crate::config::CoreConfig;
use crate::error::HostError;
use crate::health::status::NETWORK_FAILURE_MESSAGE;
use crate::health::{HealthErrorKind, HealthSource};
use crate::probe::{self, ResolvedCapabilities};
use crate::runtime::{
    HostRuntime, PromptModelFactory, PromptOptions, SummarizerFactory, SummarizerOptions,
    TranslatorFactory, TranslatorOptions, WriterFactory, WriterOptions, WriterTone,
};

pub const EMPTY_INPUT_MESSAGE: &str = "Please provide text to process.";
pub const PER_REQUEST_FAILURE_MESSAGE: &str =
    "Sorry, I couldn't process that text. Please try again with different content.";
pub const NO_TASKS_MESSAGE: &str =
    "No obvious tasks found. Try writing tasks as a list, or start lines with \"todo:\".";

const TASK_SYSTEM_PROMPT: &str =
    "You extract actionable tasks from text. Reply with a numbered list, one task per line, and nothing else.";

pub struct CapabilityInvoker {
    runtime: Arc<dyn HostRuntime>,
    health: Arc<dyn HealthSource>,
    summary: SummarizerOptions,
    translation: TranslatorOptions,
}

impl CapabilityInvoker {
    pub fn new(runtime: Arc<dyn HostRuntime>, health: Arc<dyn HealthSource>, config: &CoreConfig) -> Self {
        Self {
            runtime,
            health,
            summary: config.summary.clone(),
            translation: config.translation.clone(),
        }
    }

    /// Run `operation` on `text`. Every outcome, including failures, comes
    /// back as an `InvocationResult`.
    pub async fn invoke(&self, operation: OperationKind, text: &str, mode: ProcessingMode) -> InvocationResult {
        if text.trim().is_empty() {
            return InvocationResult::failed(InvocationErrorKind::InvalidInput, EMPTY_INPUT_MESSAGE);
        }

        let policy = operation.policy();
        let local_fallback = policy.when_missing == MissingCapabilityPolicy::LocalFallback;

        let health = self.health.refresh().await;
        if !health.is_ready_for_use() {
            if local_fallback {
                debug!("AI not ready, answering {} locally", operation.label());
                return local_tasks(text);
            }
            info!(
                "Skipping {}: AI not ready ({:?})",
                operation.label(),
                health.error_kind
            );
            return InvocationResult::failed(InvocationErrorKind::Unavailable, health.user_friendly_message());
        }

        let resolved = match probe::resolve(self.runtime.as_ref()) {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!("Capability re-probe failed before {}: {}", operation.label(), e);
                if local_fallback {
                    return local_tasks(text);
                }
                return InvocationResult::failed(InvocationErrorKind::NetworkOrTimeout, NETWORK_FAILURE_MESSAGE);
            }
        };

        let Some(call) = self.call(operation, &resolved, text, mode).await else {
            return match policy.when_missing {
                MissingCapabilityPolicy::Require => {
                    InvocationResult::failed(InvocationErrorKind::Unavailable, policy.missing_message)
                }
                MissingCapabilityPolicy::LocalFallback => local_tasks(text),
                MissingCapabilityPolicy::Explain => InvocationResult::degraded(
                    policy.missing_message,
                    format!("{} capability unavailable", policy.capability),
                ),
            };
        };

        match call {
            Ok(output) if output.trim().is_empty() => {
                warn!("{} returned an empty result", policy.capability);
                if local_fallback {
                    return local_tasks(text);
                }
                InvocationResult::degraded(policy.empty_message, "The AI returned an empty result")
            }
            Ok(output) => {
                info!("✅ {} completed ({} chars)", operation.label(), output.len());
                InvocationResult::success(output)
            }
            Err(e) => {
                warn!("{} failed: {}", operation.label(), e);
                if local_fallback {
                    return local_tasks(text);
                }
                self.classify_failure()
            }
        }
    }

    /// Create a fresh session for `operation` and call it once.
    /// `None` when the needed capability is absent.
    async fn call(
        &self,
        operation: OperationKind,
        resolved: &ResolvedCapabilities,
        text: &str,
        mode: ProcessingMode,
    ) -> Option<Result<String, HostError>> {
        let instruction = mode.instruction(operation);

        match operation {
            OperationKind::Summarize => {
                let factory = resolved.summarizer.as_ref()?;
                let input = with_instruction(&instruction, text);
                Some(run_summarizer(factory.as_ref(), self.summary.clone(), &input).await)
            }
            OperationKind::Translate => {
                let factory = resolved.translator.as_ref()?;
                Some(run_translator(factory.as_ref(), self.translation.clone(), text).await)
            }
            OperationKind::Rewrite => {
                let factory = resolved.writer.as_ref()?;
                let options = WriterOptions {
                    tone: writer_tone(mode),
                    ..WriterOptions::default()
                };
                Some(run_writer(factory.as_ref(), options, text, &instruction).await)
            }
            OperationKind::ExtractTasks => {
                let factory = resolved.prompt_model.as_ref()?;
                let input = with_instruction(&instruction, text);
                let options = PromptOptions {
                    system_prompt: Some(TASK_SYSTEM_PROMPT.to_string()),
                };
                Some(run_prompt(factory.as_ref(), options, &input).await)
            }
        }
    }

    /// A call threw: blame this request if the monitor still says healthy
    fn classify_failure(&self) -> InvocationResult {
        let status = self.health.status();
        if status.is_ready_for_use() {
            return InvocationResult::failed(InvocationErrorKind::PerRequestFailure, PER_REQUEST_FAILURE_MESSAGE);
        }

        let kind = match status.error_kind {
            HealthErrorKind::Unavailable => InvocationErrorKind::Unavailable,
            HealthErrorKind::OperationalFailure => InvocationErrorKind::OperationalFailure,
            HealthErrorKind::NetworkOrTimeout => InvocationErrorKind::NetworkOrTimeout,
            HealthErrorKind::None => InvocationErrorKind::PerRequestFailure,
        };
        InvocationResult::failed(kind, status.user_friendly_message())
    }
}

async fn run_summarizer(
    factory: &dyn SummarizerFactory,
    options: SummarizerOptions,
    input: &str,
) -> Result<String, HostError> {
    let session = factory.create(options).await?;
    session.summarize(input).await
}

async fn run_translator(
    factory: &dyn TranslatorFactory,
    options: TranslatorOptions,
    input: &str,
) -> Result<String, HostError> {
    let session = factory.create(options).await?;
    session.translate(input).await
}

async fn run_writer(
    factory: &dyn WriterFactory,
    options: WriterOptions,
    input: &str,
    context: &str,
) -> Result<String, HostError> {
    let session = factory.create(options).await?;
    session.write(input, Some(context)).await
}

async fn run_prompt(
    factory: &dyn PromptModelFactory,
    options: PromptOptions,
    input: &str,
) -> Result<String, HostError> {
    let session = factory.create(options).await?;
    session.prompt(input).await
}

fn with_instruction(instruction: &str, text: &str) -> String {
    format!("{}\n\n{}", instruction, text)
}

fn writer_tone(mode: ProcessingMode) -> WriterTone {
    match mode {
        ProcessingMode::Academic => WriterTone::Formal,
        ProcessingMode::Conversational => WriterTone::Casual,
        ProcessingMode::Concise | ProcessingMode::Creative => WriterTone::Neutral,
    }
}

fn local_tasks(text: &str) -> InvocationResult {
    let items = extract_tasks(text);
    if items.is_empty() {
        return InvocationResult::degraded(NO_TASKS_MESSAGE, "No task-like lines matched");
    }

    debug!("Local task extraction found {} items", items.len());
    InvocationResult::degraded(
        format_numbered(&items),
        OperationKind::ExtractTasks.policy().missing_message,
    )
}
