use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::checks::{CheckResult, CheckStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OverallStatus {
    Pass,
    Partial,
    Fail,
}

/// Timed outcome of one real capability call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticChecks {
    pub runtime_version: CheckResult,
    pub runtime_family: CheckResult,
    pub provider_object: CheckResult,
    pub summarizer: CheckResult,
    pub translator: CheckResult,
    pub writer: CheckResult,
    pub prompt_model: CheckResult,
    pub model_readiness: CheckResult,
    pub origin_tokens: CheckResult,
    pub page_origin: CheckResult,
}

impl DiagnosticChecks {
    /// Checks whose failure makes the whole report fail
    pub fn critical(&self) -> [&CheckResult; 4] {
        [
            &self.runtime_version,
            &self.runtime_family,
            &self.provider_object,
            &self.summarizer,
        ]
    }

    pub fn all(&self) -> [(&'static str, &CheckResult); 10] {
        [
            ("Runtime version", &self.runtime_version),
            ("Runtime family", &self.runtime_family),
            ("AI object", &self.provider_object),
            ("Summarizer API", &self.summarizer),
            ("Translator API", &self.translator),
            ("Writer API", &self.writer),
            ("Prompt API", &self.prompt_model),
            ("Model status", &self.model_readiness),
            ("Origin tokens", &self.origin_tokens),
            ("Page origin", &self.page_origin),
        ]
    }

    pub fn overall_status(&self) -> OverallStatus {
        if self.critical().iter().any(|c| c.is_fail()) {
            return OverallStatus::Fail;
        }
        // only warnings degrade the rollup; non-critical failures feed recommendations
        if self.all().iter().any(|(_, c)| c.is_warning()) {
            return OverallStatus::Partial;
        }
        OverallStatus::Pass
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionalTests {
    pub summarizer: TestResult,
    pub translator: TestResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticReport {
    pub overall_status: OverallStatus,
    pub checks: DiagnosticChecks,
    pub test_results: FunctionalTests,
    pub recommendations: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl DiagnosticReport {
    pub fn new(checks: DiagnosticChecks, test_results: FunctionalTests, min_version: u32) -> Self {
        Self {
            overall_status: checks.overall_status(),
            recommendations: recommendations(&checks, &test_results, min_version),
            checks,
            test_results,
            generated_at: Utc::now(),
        }
    }
}

fn recommendations(checks: &DiagnosticChecks, tests: &FunctionalTests, min_version: u32) -> Vec<String> {
    let mut out = Vec::new();

    if checks.runtime_version.is_fail() {
        out.push(format!("Update Chrome to version {} or later", min_version));
    }
    if checks.runtime_family.is_fail() {
        out.push("Switch to Google Chrome browser".to_string());
    }
    if checks.provider_object.is_fail() {
        out.push("Enable AI features in chrome://flags and restart Chrome".to_string());
    }
    if checks.summarizer.is_fail() {
        out.push("Enable #summarization-api-for-gemini-nano flag".to_string());
    }
    if checks.model_readiness.status != CheckStatus::Pass {
        out.push("Download AI model in chrome://components (2GB download)".to_string());
    }
    if checks.origin_tokens.is_fail() {
        out.push("Add origin trial tokens to HTML head".to_string());
    } else if checks.origin_tokens.is_warning() {
        out.push("Replace expired or invalid origin trial tokens".to_string());
    }
    if !tests.summarizer.success {
        out.push("Test summarizer functionality - may need model download".to_string());
    }
    if !tests.translator.success {
        out.push("Test translator functionality - may need additional setup".to_string());
    }

    out
}

fn status_icon(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "✅",
        CheckStatus::Warning => "⚠️",
        CheckStatus::Fail => "❌",
    }
}

fn test_line(name: &str, test: &TestResult) -> String {
    let icon = if test.success { "✅" } else { "❌" };
    match test.duration_ms {
        Some(ms) => format!("  {} {:<16} {} ({}ms)", icon, name, test.message, ms),
        None => format!("  {} {:<16} {}", icon, name, test.message),
    }
}

/// Log the report as a box, followed by recommendations
pub fn log_report(report: &DiagnosticReport) {
    info!("╔═══════════════════════════════════════════════════════════╗");
    info!("║ AI Diagnostics                                            ║");
    info!("╠═══════════════════════════════════════════════════════════╣");
    info!("  Overall Status:    {:?}", report.overall_status);
    info!("  Generated At:      {}", report.generated_at.to_rfc3339());
    info!("  ───────────────────────────────────────────────────────────");
    for (name, check) in report.checks.all() {
        info!("  {} {:<16} {}", status_icon(check.status), name, check.message);
        if check.status != CheckStatus::Pass {
            if let Some(details) = &check.details {
                info!("       {}", details);
            }
        }
    }
    info!("  ───────────────────────────────────────────────────────────");
    info!("{}", test_line("Summarizer test", &report.test_results.summarizer));
    info!("{}", test_line("Translator test", &report.test_results.translator));
    info!("╚═══════════════════════════════════════════════════════════╝");

    for recommendation in &report.recommendations {
        warn!("💡 {}", recommendation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passing() -> DiagnosticChecks {
        let ok = CheckResult::pass("ok", "fine");
        DiagnosticChecks {
            runtime_version: ok.clone(),
            runtime_family: ok.clone(),
            provider_object: ok.clone(),
            summarizer: ok.clone(),
            translator: ok.clone(),
            writer: ok.clone(),
            prompt_model: ok.clone(),
            model_readiness: ok.clone(),
            origin_tokens: ok.clone(),
            page_origin: ok,
        }
    }

    fn test_ok() -> TestResult {
        TestResult {
            success: true,
            message: "passed".to_string(),
            duration_ms: Some(3),
            error: None,
        }
    }

    #[test]
    fn test_overall_status() {
        assert_eq!(passing().overall_status(), OverallStatus::Pass);

        let mut checks = passing();
        checks.translator = CheckResult::warning("missing", "optional");
        assert_eq!(checks.overall_status(), OverallStatus::Partial);

        let mut checks = passing();
        checks.origin_tokens = CheckResult::fail("none", "no tokens");
        assert_eq!(checks.overall_status(), OverallStatus::Pass);

        let mut checks = passing();
        checks.translator = CheckResult::warning("missing", "optional");
        checks.summarizer = CheckResult::fail("missing", "undefined");
        assert_eq!(checks.overall_status(), OverallStatus::Fail);
    }

    #[test]
    fn test_missing_tokens_still_pass_with_recommendation() {
        let mut checks = passing();
        checks.origin_tokens = CheckResult::fail("No origin trial tokens", "no tokens");
        let tests = FunctionalTests {
            summarizer: test_ok(),
            translator: test_ok(),
        };

        let report = DiagnosticReport::new(checks, tests, 138);
        assert_eq!(report.overall_status, OverallStatus::Pass);
        assert_eq!(
            report.recommendations,
            vec!["Add origin trial tokens to HTML head".to_string()]
        );
    }

    #[test]
    fn test_recommendations_follow_failures() {
        let mut checks = passing();
        checks.runtime_version = CheckResult::fail("old", "too old");
        let tests = FunctionalTests {
            summarizer: test_ok(),
            translator: TestResult {
                success: false,
                ..test_ok()
            },
        };

        let report = DiagnosticReport::new(checks, tests, 138);
        assert_eq!(
            report.recommendations,
            vec![
                "Update Chrome to version 138 or later".to_string(),
                "Test translator functionality - may need additional setup".to_string(),
            ]
        );
        log_report(&report);
    }
}
