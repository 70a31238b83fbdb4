// Health monitor
// Owns the status snapshot, runs liveness tests and the periodic check loop

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::status::HealthStatus;
use super::HealthSource;
use crate::config::CoreConfig;
use crate::error::HostError;
use crate::probe::{self, ResolvedCapabilities};
use crate::runtime::{
    HostRuntime, OutputLength, PromptOptions, SummarizerOptions, SummaryType, TextFormat,
    TranslatorOptions, WriterOptions,
};

/// Input used for the liveness call
const LIVENESS_INPUT: &str = "Test";

pub type StatusListener = Arc<dyn Fn(&HealthStatus) + Send + Sync>;

/// The subset of `CoreConfig` the monitor needs
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub min_runtime_version: u32,
    pub liveness_timeout: Duration,
    pub translation: TranslatorOptions,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self::from(&CoreConfig::default())
    }
}

impl From<&CoreConfig> for MonitorSettings {
    fn from(config: &CoreConfig) -> Self {
        Self {
            min_runtime_version: config.min_runtime_version,
            liveness_timeout: config.liveness_timeout(),
            translation: config.translation.clone(),
        }
    }
}

struct Inner {
    runtime: Arc<dyn HostRuntime>,
    settings: MonitorSettings,
    status: RwLock<Arc<HealthStatus>>,
    listeners: Mutex<HashMap<Uuid, StatusListener>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let timer = self.timer.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = timer.take() {
            handle.abort();
        }
    }
}

/// Cheap to clone; all clones share one status and one timer.
#[derive(Clone)]
pub struct HealthMonitor {
    inner: Arc<Inner>,
}

/// Handle returned by `on_status_change`
pub struct Subscription {
    id: Uuid,
    monitor: Weak<Inner>,
}

impl Subscription {
    /// Remove the listener. Dropping the handle without calling this keeps it registered.
    pub fn unsubscribe(self) {
        if let Some(inner) = self.monitor.upgrade() {
            inner
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&self.id);
        }
    }
}

impl HealthMonitor {
    /// Create a monitor seeded with a synchronous probe
    pub fn new(runtime: Arc<dyn HostRuntime>, settings: MonitorSettings) -> Self {
        let capabilities = probe::probe(runtime.as_ref());
        let initial = HealthStatus::initial(capabilities, settings.min_runtime_version);

        Self {
            inner: Arc::new(Inner {
                runtime,
                settings,
                status: RwLock::new(Arc::new(initial)),
                listeners: Mutex::new(HashMap::new()),
                timer: Mutex::new(None),
            }),
        }
    }

    /// Last known status
    pub fn status(&self) -> Arc<HealthStatus> {
        self.inner
            .status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Re-probe the runtime and, when something is present, run a bounded
    /// liveness call. Never fails; every problem becomes part of the status.
    pub async fn perform_health_check(&self) -> Arc<HealthStatus> {
        let settings = &self.inner.settings;

        let status = match probe::resolve(self.inner.runtime.as_ref()) {
            Err(e) => {
                warn!("AI health check could not inspect the runtime: {}", e);
                HealthStatus::machinery_failure(&self.status())
            }
            Ok(resolved) => {
                let capabilities = resolved.capabilities();
                if !capabilities.any() {
                    debug!("AI health check: no capabilities present");
                    HealthStatus::unavailable(capabilities, settings.min_runtime_version)
                } else {
                    let operational = self.liveness_test(&resolved).await;
                    HealthStatus::checked(capabilities, operational)
                }
            }
        };

        self.publish(status)
    }

    async fn liveness_test(&self, resolved: &ResolvedCapabilities) -> bool {
        let timeout = self.inner.settings.liveness_timeout;

        match tokio::time::timeout(timeout, liveness_call(resolved, &self.inner.settings.translation)).await {
            Ok(Ok(capability)) => {
                debug!("AI liveness test passed via {}", capability);
                true
            }
            Ok(Err(e)) => {
                warn!("AI operational test failed: {}", e);
                false
            }
            Err(_) => {
                warn!("AI operational test timed out after {:?}", timeout);
                false
            }
        }
    }

    /// Swap in the new snapshot, then notify listeners outside any lock
    fn publish(&self, status: HealthStatus) -> Arc<HealthStatus> {
        let status = Arc::new(status);
        {
            let mut current = self.inner.status.write().unwrap_or_else(PoisonError::into_inner);
            *current = status.clone();
        }

        let listeners: Vec<StatusListener> = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        for listener in listeners {
            listener(&status);
        }

        status
    }

    /// Register a listener called after every completed health check
    pub fn on_status_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&HealthStatus) + Send + Sync + 'static,
    {
        let id = Uuid::new_v4();
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(listener));

        Subscription {
            id,
            monitor: Arc::downgrade(&self.inner),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Start checking every `period`, replacing any loop already running.
    ///
    /// Outside a tokio runtime this logs a warning and does nothing. The loop
    /// holds only a weak reference, so it ends when the last monitor handle
    /// is dropped.
    pub fn start_periodic_checks(&self, period: Duration) {
        if period.is_zero() {
            warn!("Ignoring periodic health checks with a zero interval");
            return;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!("Cannot start periodic health checks without a tokio runtime: {}", e);
                return;
            }
        };

        let monitor = Arc::downgrade(&self.inner);
        let handle = runtime.spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;

                let Some(inner) = monitor.upgrade() else {
                    debug!("Health check loop: monitor dropped, exiting");
                    break;
                };

                let status = HealthMonitor { inner }.perform_health_check().await;
                debug!(
                    "Periodic health check: available={}, operational={}",
                    status.available, status.operational
                );
            }
        });

        let previous = self
            .inner
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);

        if let Some(previous) = previous {
            previous.abort();
            debug!("Replaced running health check loop");
        }

        info!("🩺 Periodic AI health checks started (every {:?})", period);
    }

    pub fn stop_periodic_checks(&self) {
        let handle = self
            .inner
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = handle {
            handle.abort();
            info!("Periodic AI health checks stopped");
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.inner
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

#[async_trait]
impl HealthSource for HealthMonitor {
    fn status(&self) -> Arc<HealthStatus> {
        HealthMonitor::status(self)
    }

    async fn refresh(&self) -> Arc<HealthStatus> {
        self.perform_health_check().await
    }
}

/// Create and call the first present capability once.
/// Order: summarizer, translator, writer, prompt model.
async fn liveness_call(
    resolved: &ResolvedCapabilities,
    translation: &TranslatorOptions,
) -> Result<&'static str, HostError> {
    if let Some(factory) = &resolved.summarizer {
        let session = factory
            .create(SummarizerOptions {
                kind: SummaryType::KeyPoints,
                format: TextFormat::PlainText,
                length: OutputLength::Short,
            })
            .await?;
        session.summarize(LIVENESS_INPUT).await?;
        return Ok("summarizer");
    }

    if let Some(factory) = &resolved.translator {
        let session = factory.create(translation.clone()).await?;
        session.translate(LIVENESS_INPUT).await?;
        return Ok("translator");
    }

    if let Some(factory) = &resolved.writer {
        let session = factory
            .create(WriterOptions {
                length: OutputLength::Short,
                ..WriterOptions::default()
            })
            .await?;
        session.write(LIVENESS_INPUT, None).await?;
        return Ok("writer");
    }

    if let Some(factory) = &resolved.prompt_model {
        let session = factory.create(PromptOptions::default()).await?;
        session.prompt(LIVENESS_INPUT).await?;
        return Ok("promptModel");
    }

    Err(HostError::call("liveness", "no capability to test"))
}
