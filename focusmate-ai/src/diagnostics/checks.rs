// Individual diagnostic checks. Each one returns data and never fails.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::origin_trial::{self, TokenState};
use crate::probe::{CapabilitySet, ResolvedCapabilities};
use crate::runtime::{ModelAvailability, PageContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CheckStatus {
    Pass,
    Warning,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub status: CheckStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fix_instructions: Vec<String>,
}

impl CheckResult {
    pub fn pass(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Pass,
            message: message.into(),
            details: Some(details.into()),
            fix_instructions: Vec::new(),
        }
    }

    pub fn warning(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Warning,
            ..Self::pass(message, details)
        }
    }

    pub fn fail(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Fail,
            ..Self::pass(message, details)
        }
    }

    pub fn with_fixes(mut self, fixes: &[&str]) -> Self {
        self.fix_instructions = fixes.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn is_fail(&self) -> bool {
        self.status == CheckStatus::Fail
    }

    pub fn is_warning(&self) -> bool {
        self.status == CheckStatus::Warning
    }
}

pub fn runtime_version(caps: &CapabilitySet, user_agent: &str, min_version: u32) -> CheckResult {
    match caps.runtime_version {
        None => CheckResult::fail("Chrome version not detected", format!("User agent: {}", user_agent))
            .with_fixes(&["Install Google Chrome browser"]),
        Some(version) if version < min_version => CheckResult::fail(
            format!("Chrome version {} is too old", version),
            format!("Chrome AI requires version {} or later", min_version),
        )
        .with_fixes(&[
            "Go to chrome://settings/help",
            "Click \"Update Google Chrome\" if available",
            "Or download from https://www.google.com/chrome/",
            "Restart Chrome after updating",
        ]),
        Some(version) => CheckResult::pass(
            format!("Chrome version {} is supported", version),
            format!("Meets minimum requirement of Chrome {}+", min_version),
        ),
    }
}

pub fn runtime_family(caps: &CapabilitySet) -> CheckResult {
    if caps.browser.is_supported() {
        return CheckResult::pass("Chrome browser detected", "Chrome AI features are supported");
    }

    CheckResult::fail(
        format!("{} browser detected", caps.browser.display_name()),
        "Chrome AI features require Google Chrome",
    )
    .with_fixes(&[
        "Install Google Chrome browser",
        "Or configure the OpenRouter cloud provider for universal browser support",
    ])
}

/// `lookup_error` carries the raw error when the runtime could not be inspected
pub fn provider_object(caps: &CapabilitySet, lookup_error: Option<&str>) -> CheckResult {
    if let Some(error) = lookup_error {
        return CheckResult::fail("AI object could not be inspected", error.to_string()).with_fixes(&[
            "Reload the page",
            "Restart Chrome",
        ]);
    }

    match caps.shape {
        Some(shape) => CheckResult::pass("AI object is available", format!("Exposed as {}", shape.label())),
        None => CheckResult::fail("AI object not available", "No AI provider object on the global scope")
            .with_fixes(&[
                "Ensure Chrome 138+ is installed",
                "Enable AI features in chrome://flags",
                "Restart Chrome after enabling flags",
            ]),
    }
}

pub fn summarizer(caps: &CapabilitySet) -> CheckResult {
    if !caps.has_provider() {
        return CheckResult::fail("AI object not available", "Cannot check Summarizer API without AI object");
    }
    if caps.summarizer {
        return CheckResult::pass("Summarizer API is available", "summarizer is accessible");
    }
    CheckResult::fail("Summarizer API not available", "summarizer is undefined").with_fixes(&[
        "Enable #summarization-api-for-gemini-nano in chrome://flags",
        "Download AI model in chrome://components",
        "Restart Chrome",
    ])
}

pub fn translator(caps: &CapabilitySet) -> CheckResult {
    if !caps.has_provider() {
        return CheckResult::fail("AI object not available", "Cannot check Translator API without AI object");
    }
    if caps.translator {
        return CheckResult::pass("Translator API is available", "translator is accessible");
    }
    CheckResult::warning("Translator API not available", "translator is undefined (optional)").with_fixes(&[
        "Enable #translation-api in chrome://flags",
        "Download AI model in chrome://components",
    ])
}

/// Writer is unreleased for web pages, so absence is informational
pub fn writer(caps: &CapabilitySet) -> CheckResult {
    if caps.writer {
        CheckResult::pass("Writer API is available", "writer is accessible")
    } else {
        CheckResult::pass(
            "Writer API not exposed (optional)",
            "The Writer API is not yet released for web pages; Rewrite suggests Summarize instead",
        )
    }
}

/// The prompt model is usually extension-only; task extraction falls back to patterns
pub fn prompt_model(caps: &CapabilitySet) -> CheckResult {
    if caps.prompt_model {
        CheckResult::pass("Prompt API is available", "languageModel is accessible")
    } else {
        CheckResult::pass(
            "Prompt API not exposed (optional)",
            "The Prompt API only works in Chrome Extensions; task extraction uses pattern matching",
        )
    }
}

pub async fn model_readiness(resolved: Option<&ResolvedCapabilities>) -> CheckResult {
    let Some(factory) = resolved.and_then(|r| r.summarizer.as_ref()) else {
        return CheckResult::fail("Cannot check model status", "Summarizer API not available");
    };

    match factory.availability().await {
        Ok(ModelAvailability::Readily) => {
            CheckResult::pass("AI model is downloaded and ready", "Model is available for immediate use")
        }
        Ok(ModelAvailability::AfterDownload) => CheckResult::warning(
            "AI model needs to be downloaded",
            "Model will be downloaded on first use (2GB)",
        )
        .with_fixes(&[
            "Go to chrome://components",
            "Find \"Optimization Guide On Device Model\"",
            "Click \"Check for update\"",
            "Wait for download to complete (5-30 minutes)",
        ]),
        Ok(ModelAvailability::No) => {
            CheckResult::fail("AI model is not available", "Model download failed or not supported").with_fixes(&[
                "Check system requirements (22GB storage, 4GB+ VRAM)",
                "Go to chrome://components to retry download",
                "Ensure stable internet connection",
            ])
        }
        Err(e) => CheckResult::fail("Error checking model status", e.to_string()).with_fixes(&[
            "Check if AI model is downloaded in chrome://components",
            "Verify model status in chrome://on-device-internals",
        ]),
    }
}

pub fn origin_tokens(page: &PageContext, now: DateTime<Utc>) -> CheckResult {
    if page.origin_trial_tokens.is_empty() {
        return CheckResult::fail("No origin trial tokens found", "Missing origin trial tokens in HTML head")
            .with_fixes(&[
                "Add origin trial tokens to HTML head",
                "Generate tokens at https://developer.chrome.com/origintrials",
                "Include tokens for your domain",
            ]);
    }

    let non_empty: Vec<String> = page
        .origin_trial_tokens
        .iter()
        .filter(|t| !t.trim().is_empty())
        .cloned()
        .collect();
    if non_empty.is_empty() {
        return CheckResult::fail("Origin trial tokens are empty", "Tokens exist but are empty or invalid");
    }

    let report = origin_trial::validate_tokens(&non_empty, page.parsed_url().as_ref(), now);
    if report.active() == 0 {
        return CheckResult::fail(
            "No active origin trial tokens",
            format!("{} expired, {} invalid", report.expired(), report.invalid()),
        )
        .with_fixes(&["Generate fresh tokens at https://developer.chrome.com/origintrials"]);
    }

    let mut problems = Vec::new();
    if report.expired() > 0 {
        problems.push(format!("{} expired", report.expired()));
    }
    if report.invalid() > 0 {
        problems.push(format!("{} invalid", report.invalid()));
    }
    if report.origin_mismatches() > 0 {
        problems.push(format!("{} for another origin", report.origin_mismatches()));
    }
    if !report.missing_features.is_empty() {
        problems.push(format!("missing {}", report.missing_features.join(", ")));
    }

    if problems.is_empty() {
        return CheckResult::pass(
            format!("{} origin trial token(s) found", report.total()),
            "Origin trial tokens are configured",
        );
    }

    let invalid: Vec<String> = report
        .results
        .iter()
        .filter_map(|r| match &r.state {
            TokenState::Invalid { error } => Some(format!("token {}: {}", r.index, error)),
            _ => None,
        })
        .collect();
    let mut details = problems.join("; ");
    if !invalid.is_empty() {
        details = format!("{} ({})", details, invalid.join("; "));
    }

    CheckResult::warning(
        format!("{} of {} origin trial token(s) active", report.active(), report.total()),
        details,
    )
    .with_fixes(&[
        "Replace expired or invalid tokens",
        "Generate tokens at https://developer.chrome.com/origintrials",
    ])
}

pub fn page_origin(page: &PageContext) -> CheckResult {
    let Some(url) = page.parsed_url() else {
        return CheckResult::warning("Page URL unknown", "The runtime did not report a page URL");
    };
    let hostname = url.host_str().unwrap_or_default();
    let is_https = url.scheme() == "https";

    if hostname == "localhost" || hostname == "127.0.0.1" {
        return CheckResult::pass("Localhost development environment", format!("Domain: {} (development)", hostname));
    }

    if hostname.ends_with("vercel.app") && is_https {
        return CheckResult::pass("Vercel production environment", format!("Domain: {} (HTTPS)", hostname));
    }

    if !is_https {
        return CheckResult::warning("Non-HTTPS domain detected", format!("Domain: {} (HTTP)", hostname)).with_fixes(&[
            "Chrome AI features work best on HTTPS domains",
            "Consider deploying to HTTPS",
        ]);
    }

    CheckResult::pass("Custom domain detected", format!("Domain: {}", hostname))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::RuntimeKind;
    use crate::runtime::{ApiShape, BrowserFamily};

    fn caps(summarizer: bool, version: Option<u32>) -> CapabilitySet {
        CapabilitySet {
            summarizer,
            translator: false,
            writer: false,
            prompt_model: false,
            runtime_kind: RuntimeKind::SupportedBrowser,
            runtime_version: version,
            browser: BrowserFamily::Chrome,
            shape: Some(ApiShape::Namespaced),
        }
    }

    fn page(url: &str) -> PageContext {
        PageContext {
            url: Some(url.to_string()),
            origin_trial_tokens: Vec::new(),
        }
    }

    #[test]
    fn test_runtime_version() {
        assert!(runtime_version(&caps(true, None), "curl", 138).is_fail());
        assert!(runtime_version(&caps(true, Some(120)), "", 138).is_fail());
        assert_eq!(runtime_version(&caps(true, Some(140)), "", 138).status, CheckStatus::Pass);
    }

    #[test]
    fn test_translator_missing_is_warning() {
        assert!(translator(&caps(true, Some(140))).is_warning());
        assert_eq!(writer(&caps(true, Some(140))).status, CheckStatus::Pass);
    }

    #[test]
    fn test_provider_lookup_error_is_detailed() {
        let result = provider_object(&caps(false, Some(140)), Some("getter threw"));
        assert!(result.is_fail());
        assert_eq!(result.details.as_deref(), Some("getter threw"));
    }

    #[test]
    fn test_page_origin() {
        assert_eq!(page_origin(&page("http://localhost:5173/")).status, CheckStatus::Pass);
        assert_eq!(page_origin(&page("https://focusmate.vercel.app/")).status, CheckStatus::Pass);
        assert!(page_origin(&page("http://example.com/")).is_warning());
        assert!(page_origin(&PageContext::default()).is_warning());
    }

    #[test]
    fn test_origin_tokens_missing_and_blank() {
        let now = Utc::now();
        assert!(origin_tokens(&page("https://focusmate.vercel.app/"), now).is_fail());

        let mut blank = page("https://focusmate.vercel.app/");
        blank.origin_trial_tokens = vec!["   ".to_string()];
        let result = origin_tokens(&blank, now);
        assert!(result.is_fail());
        assert_eq!(result.message, "Origin trial tokens are empty");
    }
}
