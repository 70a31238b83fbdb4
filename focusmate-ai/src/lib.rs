//! On-device AI core for FocusMate.
//!
//! Detects which built-in AI capabilities the host runtime exposes, keeps a
//! cached health status, runs text operations with graceful degradation and
//! produces diagnostics reports. [`AiCore`] bundles all of it behind the
//! surface the UI consumes.

pub mod cloud;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod health;
pub mod invoke;
pub mod probe;
pub mod runtime;

use std::sync::Arc;

use tracing::info;

pub use config::CoreConfig;
pub use diagnostics::{DiagnosticReport, OverallStatus};
pub use error::{ConfigError, DiagnosticsError, HostError, TokenError};
pub use health::{HealthErrorKind, HealthMonitor, HealthSource, HealthStatus, MonitorSettings, Subscription};
pub use invoke::{CapabilityInvoker, InvocationErrorKind, InvocationResult, OperationKind, ProcessingMode};
pub use probe::{CapabilitySet, NoticeLatch, RuntimeKind};
pub use runtime::HostRuntime;

/// Runtime, health monitor, invoker and configuration wired together
pub struct AiCore {
    runtime: Arc<dyn HostRuntime>,
    monitor: HealthMonitor,
    invoker: CapabilityInvoker,
    config: CoreConfig,
}

impl AiCore {
    pub fn new(runtime: Arc<dyn HostRuntime>, config: CoreConfig) -> Self {
        let monitor = HealthMonitor::new(runtime.clone(), MonitorSettings::from(&config));
        let health: Arc<dyn HealthSource> = Arc::new(monitor.clone());
        let invoker = CapabilityInvoker::new(runtime.clone(), health, &config);

        info!("AI core ready (minimum runtime version {})", config.min_runtime_version);

        Self {
            runtime,
            monitor,
            invoker,
            config,
        }
    }

    pub async fn invoke(&self, operation: OperationKind, text: &str, mode: ProcessingMode) -> InvocationResult {
        self.invoker.invoke(operation, text, mode).await
    }

    /// Last cached status, without running a check
    pub fn status(&self) -> Arc<HealthStatus> {
        self.monitor.status()
    }

    pub fn on_status_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&HealthStatus) + Send + Sync + 'static,
    {
        self.monitor.on_status_change(listener)
    }

    pub async fn run_diagnostics(&self) -> Result<DiagnosticReport, DiagnosticsError> {
        diagnostics::run_diagnostics(self.runtime.clone(), &self.config).await
    }

    /// Start periodic checks at the configured interval. Outside a tokio
    /// runtime this only logs a warning.
    pub fn start_monitoring(&self) {
        self.monitor
            .start_periodic_checks(self.config.health_check_interval());
    }

    pub fn stop_monitoring(&self) {
        self.monitor.stop_periodic_checks();
    }

    pub fn monitor(&self) -> &HealthMonitor {
        &self.monitor
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{
        ApiShape, PageContext, ProviderFixture, RuntimeFixture, SessionBehavior, SessionFixture,
        SimulatedRuntime,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    const CHROME_140: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/140.0.0.0 Safari/537.36";

    fn runtime(summarizer: Option<SessionFixture>) -> Arc<SimulatedRuntime> {
        Arc::new(SimulatedRuntime::new(RuntimeFixture {
            user_agent: CHROME_140.to_string(),
            page: PageContext::default(),
            providers: [(
                ApiShape::GlobalConstructors,
                ProviderFixture {
                    summarizer,
                    ..ProviderFixture::default()
                },
            )]
            .into_iter()
            .collect(),
            probe_error: None,
        }))
    }

    #[tokio::test]
    async fn test_invoke_notifies_listeners() {
        let core = AiCore::new(
            runtime(Some(SessionFixture::with_behavior(SessionBehavior::Reply {
                text: "- key point".to_string(),
            }))),
            CoreConfig::default(),
        );
        assert!(core.status().available);

        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let _subscription = core.on_status_change(move |status| {
            assert!(status.operational);
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let result = core
            .invoke(OperationKind::Summarize, "Some lecture notes.", ProcessingMode::Academic)
            .await;
        assert_eq!(result, InvocationResult::success("- key point"));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert!(core.status().is_ready_for_use());
    }

    #[tokio::test]
    async fn test_core_without_capabilities() {
        let core = AiCore::new(runtime(None), CoreConfig::default());

        assert!(!core.status().available);
        let result = core
            .invoke(OperationKind::Summarize, "Some lecture notes.", ProcessingMode::Concise)
            .await;
        assert_eq!(result.error_kind(), Some(InvocationErrorKind::Unavailable));

        let report = core.run_diagnostics().await.unwrap();
        assert_eq!(report.overall_status, OverallStatus::Fail);
    }

    #[test]
    fn test_start_monitoring_without_runtime() {
        let core = AiCore::new(runtime(None), CoreConfig::default());
        core.start_monitoring();
        assert!(!core.monitor().is_monitoring());
    }

    #[tokio::test]
    async fn test_monitoring_lifecycle() {
        let core = AiCore::new(runtime(None), CoreConfig::default());

        core.start_monitoring();
        assert!(core.monitor().is_monitoring());
        core.stop_monitoring();
        assert!(!core.monitor().is_monitoring());
    }
}
