// AI Diagnostics
//
// Runs every check plus two functional smoke tests and aggregates them into
// a report. Capability problems are data; only a broken diagnostics task
// produces an error.

pub mod checks;
pub mod origin_trial;
pub mod report;

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};

pub use checks::{CheckResult, CheckStatus};
pub use origin_trial::{
    decode_token, extract_tokens_from_html, validate_tokens, OriginTrialToken, TokenReport, TokenState,
    REQUIRED_FEATURES,
};
pub use report::{log_report, DiagnosticChecks, DiagnosticReport, FunctionalTests, OverallStatus, TestResult};

use crate::config::CoreConfig;
use crate::error::{DiagnosticsError, HostError};
use crate::probe::{self, CapabilitySet};
use crate::runtime::{
    HostRuntime, OutputLength, SummarizerFactory, SummarizerOptions, SummaryType, TextFormat,
    TranslatorFactory, TranslatorOptions,
};

const SUMMARIZER_TEST_INPUT: &str = "This is a test sentence for AI summarization.";
const TRANSLATOR_TEST_INPUT: &str = "Hello world";

/// Run every check and both functional tests against `runtime`
pub async fn run_diagnostics(
    runtime: Arc<dyn HostRuntime>,
    config: &CoreConfig,
) -> Result<DiagnosticReport, DiagnosticsError> {
    info!("🔍 Running AI diagnostics");

    let user_agent = runtime.user_agent();
    let page = runtime.page();
    let min_version = config.min_runtime_version;

    let (resolved, lookup_error) = match probe::resolve(runtime.as_ref()) {
        Ok(resolved) => (Some(resolved), None),
        Err(e) => {
            warn!("Diagnostics could not inspect the runtime: {}", e);
            (None, Some(e.to_string()))
        }
    };
    let caps: CapabilitySet = match &resolved {
        Some(resolved) => resolved.capabilities(),
        None => probe::probe(runtime.as_ref()),
    };

    let checks = DiagnosticChecks {
        runtime_version: checks::runtime_version(&caps, &user_agent, min_version),
        runtime_family: checks::runtime_family(&caps),
        provider_object: checks::provider_object(&caps, lookup_error.as_deref()),
        summarizer: checks::summarizer(&caps),
        translator: checks::translator(&caps),
        writer: checks::writer(&caps),
        prompt_model: checks::prompt_model(&caps),
        model_readiness: checks::model_readiness(resolved.as_ref()).await,
        origin_tokens: checks::origin_tokens(&page, Utc::now()),
        page_origin: checks::page_origin(&page),
    };

    let summarizer = resolved.as_ref().and_then(|r| r.summarizer.clone());
    let translator = resolved.as_ref().and_then(|r| r.translator.clone());

    let test_results = FunctionalTests {
        summarizer: run_isolated("summarizer test", test_summarizer(summarizer)).await?,
        translator: run_isolated("translator test", test_translator(translator, config.translation.clone()))
            .await?,
    };

    let report = DiagnosticReport::new(checks, test_results, min_version);
    info!("AI diagnostics finished: {:?}", report.overall_status);
    Ok(report)
}

/// Run a functional test on its own task so a panicking capability
/// becomes a failed result instead of tearing down the caller
async fn run_isolated<F>(task: &'static str, test: F) -> Result<TestResult, DiagnosticsError>
where
    F: Future<Output = TestResult> + Send + 'static,
{
    match tokio::spawn(test).await {
        Ok(result) => Ok(result),
        Err(e) if e.is_panic() => {
            warn!("Diagnostic {} panicked", task);
            Ok(TestResult {
                success: false,
                message: format!("{} crashed", task),
                duration_ms: None,
                error: Some("capability panicked during the call".to_string()),
            })
        }
        Err(_) => Err(DiagnosticsError::Cancelled { task }),
    }
}

fn timed_result(name: &str, started: Instant, outcome: Result<String, HostError>) -> TestResult {
    let duration_ms = Some(started.elapsed().as_millis() as u64);
    match outcome {
        Ok(text) if !text.is_empty() => TestResult {
            success: true,
            message: format!("{} test passed", name),
            duration_ms,
            error: None,
        },
        Ok(_) => TestResult {
            success: false,
            message: format!("{} returned empty result", name),
            duration_ms,
            error: None,
        },
        Err(e) => TestResult {
            success: false,
            message: format!("{} test failed", name),
            duration_ms,
            error: Some(e.to_string()),
        },
    }
}

fn not_available(name: &str, capability: &str) -> TestResult {
    TestResult {
        success: false,
        message: format!("{} API not available", name),
        duration_ms: None,
        error: Some(format!("{} is undefined", capability)),
    }
}

async fn test_summarizer(factory: Option<Arc<dyn SummarizerFactory>>) -> TestResult {
    let Some(factory) = factory else {
        return not_available("Summarizer", "summarizer");
    };

    let started = Instant::now();
    let outcome: Result<String, HostError> = async {
        let session = factory
            .create(SummarizerOptions {
                kind: SummaryType::KeyPoints,
                format: TextFormat::PlainText,
                length: OutputLength::Short,
            })
            .await?;
        session.summarize(SUMMARIZER_TEST_INPUT).await
    }
    .await;
    timed_result("Summarizer", started, outcome)
}

async fn test_translator(factory: Option<Arc<dyn TranslatorFactory>>, options: TranslatorOptions) -> TestResult {
    let Some(factory) = factory else {
        return not_available("Translator", "translator");
    };

    let started = Instant::now();
    let outcome: Result<String, HostError> = async {
        let session = factory.create(options).await?;
        session.translate(TRANSLATOR_TEST_INPUT).await
    }
    .await;
    timed_result("Translator", started, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{
        ApiShape, ModelAvailability, PageContext, ProviderFixture, RuntimeFixture, SessionBehavior,
        SessionFixture, SimulatedRuntime, Summarizer,
    };
    use async_trait::async_trait;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;

    const CHROME_140: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/140.0.0.0 Safari/537.36";

    fn token(feature: &str) -> String {
        STANDARD.encode(format!(
            r#"{{"origin":"https://focusmate.vercel.app:443","feature":"{}","expiry":4102444800}}"#,
            feature
        ))
    }

    fn healthy_fixture() -> RuntimeFixture {
        RuntimeFixture {
            user_agent: CHROME_140.to_string(),
            page: PageContext {
                url: Some("https://focusmate.vercel.app/".to_string()),
                origin_trial_tokens: REQUIRED_FEATURES.iter().map(|f| token(f)).collect(),
            },
            providers: [(
                ApiShape::Namespaced,
                ProviderFixture {
                    summarizer: Some(SessionFixture::with_behavior(SessionBehavior::Reply {
                        text: "- a test".to_string(),
                    })),
                    translator: Some(SessionFixture::with_behavior(SessionBehavior::Reply {
                        text: "Hola mundo".to_string(),
                    })),
                    ..ProviderFixture::default()
                },
            )]
            .into_iter()
            .collect(),
            probe_error: None,
        }
    }

    async fn diagnose(fixture: RuntimeFixture) -> DiagnosticReport {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        run_diagnostics(Arc::new(SimulatedRuntime::new(fixture)), &CoreConfig::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_healthy_runtime_passes() {
        let report = diagnose(healthy_fixture()).await;

        assert_eq!(report.overall_status, OverallStatus::Pass, "{:#?}", report.checks);
        log_report(&report);
        assert!(report.test_results.summarizer.success);
        assert!(report.test_results.translator.success);
        assert!(report.recommendations.is_empty());
    }

    #[tokio::test]
    async fn test_every_check_runs_without_provider() {
        let mut fixture = healthy_fixture();
        fixture.providers.clear();
        fixture.page = PageContext::default();

        let report = diagnose(fixture).await;
        assert_eq!(report.overall_status, OverallStatus::Fail);
        assert!(report.checks.provider_object.is_fail());
        assert!(report.checks.summarizer.is_fail());
        assert!(report.checks.origin_tokens.is_fail());
        assert!(report.checks.page_origin.is_warning());
        assert!(!report.test_results.summarizer.success);
        assert!(report
            .recommendations
            .contains(&"Enable AI features in chrome://flags and restart Chrome".to_string()));
    }

    #[tokio::test]
    async fn test_missing_tokens_alone_still_passes() {
        let mut fixture = healthy_fixture();
        fixture.page.origin_trial_tokens.clear();

        let report = diagnose(fixture).await;
        assert!(report.checks.origin_tokens.is_fail());
        assert_eq!(report.overall_status, OverallStatus::Pass);
        assert_eq!(
            report.recommendations,
            vec!["Add origin trial tokens to HTML head".to_string()]
        );
    }

    #[tokio::test]
    async fn test_model_download_and_missing_translator_is_partial() {
        let mut fixture = healthy_fixture();
        let provider = fixture.providers.get_mut(&ApiShape::Namespaced).unwrap();
        provider.translator = None;
        provider.summarizer.as_mut().unwrap().availability = ModelAvailability::AfterDownload;

        let report = diagnose(fixture).await;
        assert_eq!(report.overall_status, OverallStatus::Partial);
        assert!(report.checks.model_readiness.is_warning());
        assert!(!report.test_results.translator.success);
        assert!(report.test_results.summarizer.success);
    }

    #[tokio::test]
    async fn test_failing_summarizer_call_is_captured() {
        let mut fixture = healthy_fixture();
        let provider = fixture.providers.get_mut(&ApiShape::Namespaced).unwrap();
        provider.summarizer = Some(SessionFixture::with_behavior(SessionBehavior::Fail {
            message: "model crashed".to_string(),
        }));

        let report = diagnose(fixture).await;
        let test = &report.test_results.summarizer;
        assert!(!test.success);
        assert_eq!(test.message, "Summarizer test failed");
        assert!(test.error.as_deref().unwrap().contains("model crashed"));
        assert!(test.duration_ms.is_some());
    }

    #[tokio::test]
    async fn test_probe_error_is_reported_not_raised() {
        let mut fixture = healthy_fixture();
        fixture.probe_error = Some("bridge torn down".to_string());

        let report = diagnose(fixture).await;
        assert_eq!(report.overall_status, OverallStatus::Fail);
        assert!(report
            .checks
            .provider_object
            .details
            .as_deref()
            .unwrap()
            .contains("bridge torn down"));
    }

    struct PanickingFactory;

    #[async_trait]
    impl SummarizerFactory for PanickingFactory {
        async fn availability(&self) -> Result<ModelAvailability, HostError> {
            Ok(ModelAvailability::Readily)
        }

        async fn create(&self, _options: SummarizerOptions) -> Result<Box<dyn Summarizer>, HostError> {
            panic!("native bridge crashed");
        }
    }

    #[tokio::test]
    async fn test_panicking_capability_becomes_failed_test() {
        let factory: Arc<dyn SummarizerFactory> = Arc::new(PanickingFactory);
        let result = run_isolated("summarizer test", test_summarizer(Some(factory)))
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.message, "summarizer test crashed");
    }
}
