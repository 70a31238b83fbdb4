// Capability detection across the known runtime API shapes
//
// Inspection only: provider accessors are read, nothing is created or
// invoked. Each sub-capability is taken from the first shape (in
// `ApiShape::PRIORITY` order) that exposes it.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::HostError;
use crate::invoke::OperationKind;
use crate::runtime::user_agent::{self, BrowserFamily};
use crate::runtime::{
    ApiShape, HostRuntime, PromptModelFactory, SummarizerFactory, TranslatorFactory, WriterFactory,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuntimeKind {
    SupportedBrowser,
    UnsupportedBrowser,
}

/// Which sub-capabilities the runtime exposes right now
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilitySet {
    pub summarizer: bool,
    pub translator: bool,
    pub writer: bool,
    pub prompt_model: bool,
    pub runtime_kind: RuntimeKind,
    pub runtime_version: Option<u32>,
    pub browser: BrowserFamily,
    /// Highest-priority shape that exposed a provider object
    pub shape: Option<ApiShape>,
}

impl CapabilitySet {
    /// At least one sub-capability is present
    pub fn any(&self) -> bool {
        self.summarizer || self.translator || self.writer || self.prompt_model
    }

    /// Summarizer and translator are the capabilities ordinary web pages can use
    pub fn web_usable(&self) -> bool {
        self.summarizer || self.translator
    }

    pub fn has_provider(&self) -> bool {
        self.shape.is_some()
    }

    /// Operations whose backing capability is present
    pub fn available_operations(&self) -> BTreeSet<OperationKind> {
        OperationKind::ALL
            .into_iter()
            .filter(|op| self.supports(*op))
            .collect()
    }

    pub fn supports(&self, operation: OperationKind) -> bool {
        match operation {
            OperationKind::Summarize => self.summarizer,
            OperationKind::Translate => self.translator,
            OperationKind::Rewrite => self.writer,
            OperationKind::ExtractTasks => self.prompt_model,
        }
    }

    /// Remediation text for a runtime with no usable capability.
    ///
    /// Distinguishes wrong browser, version too old, and flags disabled.
    pub fn unavailable_message(&self, min_version: u32) -> String {
        if self.runtime_kind == RuntimeKind::UnsupportedBrowser {
            return format!(
                "Chrome AI features require Chrome browser. You're currently using {}.",
                self.browser.display_name()
            );
        }

        if let Some(version) = self.runtime_version {
            if version < min_version {
                return format!(
                    "Chrome AI requires version {}+. You're running version {}. Please update Chrome.",
                    min_version, version
                );
            }
        }

        "Chrome AI features are not available. Please enable AI features in chrome://flags and restart Chrome."
            .to_string()
    }
}

/// Factory handles for the detected sub-capabilities
#[derive(Clone)]
pub struct ResolvedCapabilities {
    pub summarizer: Option<Arc<dyn SummarizerFactory>>,
    pub translator: Option<Arc<dyn TranslatorFactory>>,
    pub writer: Option<Arc<dyn WriterFactory>>,
    pub prompt_model: Option<Arc<dyn PromptModelFactory>>,
    browser: BrowserFamily,
    runtime_version: Option<u32>,
    shape: Option<ApiShape>,
}

impl fmt::Debug for ResolvedCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedCapabilities")
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

impl ResolvedCapabilities {
    fn empty(user_agent: &str) -> Self {
        Self {
            summarizer: None,
            translator: None,
            writer: None,
            prompt_model: None,
            browser: BrowserFamily::detect(user_agent),
            runtime_version: user_agent::chrome_version(user_agent),
            shape: None,
        }
    }

    /// Presence view of the resolved handles
    pub fn capabilities(&self) -> CapabilitySet {
        let runtime_kind = if self.shape.is_some() || self.browser.is_supported() {
            RuntimeKind::SupportedBrowser
        } else {
            RuntimeKind::UnsupportedBrowser
        };

        CapabilitySet {
            summarizer: self.summarizer.is_some(),
            translator: self.translator.is_some(),
            writer: self.writer.is_some(),
            prompt_model: self.prompt_model.is_some(),
            runtime_kind,
            runtime_version: self.runtime_version,
            browser: self.browser,
            shape: self.shape,
        }
    }
}

/// Detect every sub-capability, keeping the factory handles.
///
/// Fails only when the runtime's own lookup machinery fails.
pub fn resolve(runtime: &dyn HostRuntime) -> Result<ResolvedCapabilities, HostError> {
    let mut resolved = ResolvedCapabilities::empty(&runtime.user_agent());

    for shape in ApiShape::PRIORITY {
        let Some(provider) = runtime.provider(shape)? else {
            continue;
        };

        if resolved.shape.is_none() {
            resolved.shape = Some(shape);
        }
        if resolved.summarizer.is_none() {
            resolved.summarizer = provider.summarizer();
        }
        if resolved.translator.is_none() {
            resolved.translator = provider.translator();
        }
        if resolved.writer.is_none() {
            resolved.writer = provider.writer();
        }
        if resolved.prompt_model.is_none() {
            resolved.prompt_model = provider.prompt_model();
        }
    }

    Ok(resolved)
}

/// Presence-only probe. Never fails: a broken lookup reads as "nothing present".
pub fn probe(runtime: &dyn HostRuntime) -> CapabilitySet {
    match resolve(runtime) {
        Ok(resolved) => {
            let caps = resolved.capabilities();
            debug!(
                "AI capability probe: summarizer={}, translator={}, writer={}, promptModel={}, shape={:?}",
                caps.summarizer, caps.translator, caps.writer, caps.prompt_model, caps.shape
            );
            caps
        }
        Err(e) => {
            warn!("AI capability probe failed, treating runtime as empty: {}", e);
            ResolvedCapabilities::empty(&runtime.user_agent()).capabilities()
        }
    }
}

// ============================================================================
// One-time "not supported" notice
// ============================================================================

/// Session-scoped "has the unavailable notice been shown" flag.
///
/// Owned by the UI layer; create one per session.
#[derive(Debug, Default)]
pub struct NoticeLatch {
    shown: AtomicBool,
}

impl NoticeLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_fired(&self) -> bool {
        self.shown.load(Ordering::SeqCst)
    }

    /// Returns true only for the first caller
    fn fire(&self) -> bool {
        !self.shown.swap(true, Ordering::SeqCst)
    }
}

pub fn not_supported_notice(min_version: u32) -> String {
    format!(
        "Chrome AI API not available.\n\n\
         To use AI features:\n\
         • Update to Chrome {}+ (stable version)\n\
         • Enable required flags in chrome://flags:\n  \
         - #optimization-guide-on-device-model (set to \"Enabled BypassPerfRequirement\")\n  \
         - #prompt-api-for-gemini-nano\n  \
         - #summarization-api-for-gemini-nano\n\
         • Download AI model in chrome://components (2GB, takes 5-30 minutes)\n\
         • Note: Only Summarizer & Translator APIs work in web pages",
        min_version
    )
}

/// Probe, and hand back the "not supported" notice the first time a
/// runtime without web-usable capabilities is seen through `latch`.
pub fn probe_with_notice(
    runtime: &dyn HostRuntime,
    latch: &NoticeLatch,
    min_version: u32,
) -> (CapabilitySet, Option<String>) {
    let caps = probe(runtime);
    let notice = if !caps.web_usable() && latch.fire() {
        Some(not_supported_notice(min_version))
    } else {
        None
    };
    (caps, notice)
}

// ============================================================================
// Human-readable summaries
// ============================================================================

/// Multi-line compatibility summary for a settings or help panel
pub fn compatibility_summary(runtime: &dyn HostRuntime, min_version: u32) -> String {
    let caps = probe(runtime);
    let version = caps.runtime_version.unwrap_or(0);

    if caps.web_usable() {
        let mut lines = vec!["✅ Chrome Built-in AI features detected!".to_string(), String::new()];
        lines.push("🎯 Available AI functions:".to_string());
        if caps.summarizer {
            lines.push("• ✅ Text summarization (Summarizer API)".to_string());
        }
        if caps.translator {
            lines.push("• ✅ Translation (Translator API)".to_string());
        }
        if caps.writer {
            lines.push("• ✅ Rewriting (Writer API)".to_string());
        }
        if caps.prompt_model {
            lines.push("• ✅ Task extraction (Prompt API)".to_string());
        }
        lines.push(String::new());
        lines.push(format!("💡 Chrome version: {}", version));
        return lines.join("\n");
    }

    if caps.browser.is_supported() {
        if version < min_version {
            return format!(
                "⚠️ Chrome version {} detected.\n\n\
                 🔧 Chrome Built-in AI requires Chrome {}+:\n\
                 • Update to Chrome {} or later (stable)\n\
                 • Or use Chrome Dev/Canary for latest features\n\
                 • Then refresh the page",
                version, min_version, min_version
            );
        }
        return format!(
            "⚠️ Chrome {} detected but Built-in AI not available.\n\n\
             🔧 To enable Chrome Built-in AI:\n\
             • Go to chrome://flags\n\
             • Enable: #optimization-guide-on-device-model (set to 'Enabled BypassPerfRequirement')\n\
             • Enable: #prompt-api-for-gemini-nano\n\
             • Enable: #summarization-api-for-gemini-nano\n\
             • Click 'Relaunch' button\n\
             • Download AI model in chrome://components (2GB, takes 5-30 minutes)",
            version
        );
    }

    format!(
        "🌐 Chrome Built-in AI features require Chrome browser.\n\n\
         📋 Current browser: {}\n\n\
         💡 Please use Google Chrome {}+ for AI features",
        caps.browser.display_name(),
        min_version
    )
}

/// One-line readiness indicator
pub fn quick_status(runtime: &dyn HostRuntime, min_version: u32) -> String {
    let caps = probe(runtime);
    let version = caps.runtime_version.unwrap_or(0);

    if !caps.browser.is_supported() {
        return "❌ Not Chrome browser".to_string();
    }
    if version < min_version {
        return format!("❌ Chrome {} (need {}+)", version, min_version);
    }
    if !caps.summarizer {
        return "⚠️ Chrome AI not available".to_string();
    }
    "✅ Chrome AI ready".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{ProviderFixture, RuntimeFixture, SessionFixture, SimulatedRuntime};
    use std::collections::BTreeMap;

    const CHROME_140: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/140.0.0.0 Safari/537.36";
    const CHROME_120: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const FIREFOX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

    fn runtime(user_agent: &str, providers: Vec<(ApiShape, ProviderFixture)>) -> SimulatedRuntime {
        SimulatedRuntime::new(RuntimeFixture {
            user_agent: user_agent.to_string(),
            providers: providers.into_iter().collect::<BTreeMap<_, _>>(),
            ..RuntimeFixture::default()
        })
    }

    fn summarizer_only() -> ProviderFixture {
        ProviderFixture {
            summarizer: Some(SessionFixture::default()),
            ..ProviderFixture::default()
        }
    }

    #[test]
    fn test_probe_is_idempotent() {
        let rt = runtime(CHROME_140, vec![(ApiShape::Namespaced, summarizer_only())]);
        assert_eq!(probe(&rt), probe(&rt));
    }

    #[test]
    fn test_first_match_per_capability() {
        let legacy = ProviderFixture {
            summarizer: Some(SessionFixture::default()),
            prompt_model: Some(SessionFixture::default()),
            ..ProviderFixture::default()
        };
        let global = ProviderFixture {
            translator: Some(SessionFixture::default()),
            ..ProviderFixture::default()
        };
        let rt = runtime(
            CHROME_140,
            vec![(ApiShape::LegacyWindow, legacy), (ApiShape::GlobalConstructors, global)],
        );

        let caps = probe(&rt);
        assert!(caps.summarizer);
        assert!(caps.translator);
        assert!(caps.prompt_model);
        assert!(!caps.writer);
        assert_eq!(caps.shape, Some(ApiShape::GlobalConstructors));
        assert_eq!(caps.runtime_version, Some(140));
    }

    #[test]
    fn test_supported_browser_with_feature_disabled() {
        let caps = probe(&runtime(CHROME_140, vec![]));
        assert!(!caps.any());
        assert_eq!(caps.runtime_kind, RuntimeKind::SupportedBrowser);
        assert!(caps.unavailable_message(138).contains("chrome://flags"));
    }

    #[test]
    fn test_wrong_browser_and_old_version_messages() {
        let caps = probe(&runtime(FIREFOX, vec![]));
        assert_eq!(caps.runtime_kind, RuntimeKind::UnsupportedBrowser);
        assert_eq!(
            caps.unavailable_message(138),
            "Chrome AI features require Chrome browser. You're currently using Mozilla Firefox."
        );

        let caps = probe(&runtime(CHROME_120, vec![]));
        assert_eq!(
            caps.unavailable_message(138),
            "Chrome AI requires version 138+. You're running version 120. Please update Chrome."
        );
    }

    #[test]
    fn test_probe_error_reads_as_absent() {
        let rt = SimulatedRuntime::new(RuntimeFixture {
            user_agent: CHROME_140.to_string(),
            providers: [(ApiShape::Namespaced, summarizer_only())].into_iter().collect(),
            probe_error: Some("getter threw".to_string()),
            ..RuntimeFixture::default()
        });

        assert!(resolve(&rt).is_err());
        let caps = probe(&rt);
        assert!(!caps.any());
        assert_eq!(caps.runtime_kind, RuntimeKind::SupportedBrowser);
    }

    #[test]
    fn test_notice_fires_once_per_latch() {
        let rt = runtime(FIREFOX, vec![]);
        let latch = NoticeLatch::new();

        let (_, first) = probe_with_notice(&rt, &latch, 138);
        let (_, second) = probe_with_notice(&rt, &latch, 138);
        assert!(first.is_some());
        assert!(second.is_none());
        assert!(latch.has_fired());

        let fresh = NoticeLatch::new();
        assert!(probe_with_notice(&rt, &fresh, 138).1.is_some());
    }

    #[test]
    fn test_notice_names_configured_version() {
        let rt = runtime(FIREFOX, vec![]);
        let (_, notice) = probe_with_notice(&rt, &NoticeLatch::new(), 140);
        let notice = notice.unwrap();
        assert!(notice.contains("Update to Chrome 140+"));
        assert!(!notice.contains("138"));
    }

    #[test]
    fn test_no_notice_when_web_usable() {
        let rt = runtime(CHROME_140, vec![(ApiShape::Namespaced, summarizer_only())]);
        let latch = NoticeLatch::new();
        assert!(probe_with_notice(&rt, &latch, 138).1.is_none());
        assert!(!latch.has_fired());
    }

    #[test]
    fn test_available_operations() {
        let rt = runtime(CHROME_140, vec![(ApiShape::Namespaced, summarizer_only())]);
        let ops = probe(&rt).available_operations();
        assert_eq!(ops.into_iter().collect::<Vec<_>>(), vec![OperationKind::Summarize]);
    }

    #[test]
    fn test_quick_status_and_summary() {
        assert_eq!(quick_status(&runtime(FIREFOX, vec![]), 138), "❌ Not Chrome browser");
        assert_eq!(quick_status(&runtime(CHROME_120, vec![]), 138), "❌ Chrome 120 (need 138+)");
        assert_eq!(quick_status(&runtime(CHROME_140, vec![]), 138), "⚠️ Chrome AI not available");

        let ready = runtime(CHROME_140, vec![(ApiShape::Namespaced, summarizer_only())]);
        assert_eq!(quick_status(&ready, 138), "✅ Chrome AI ready");
        assert!(compatibility_summary(&ready, 138).contains("Text summarization"));
        assert!(compatibility_summary(&runtime(CHROME_120, vec![]), 138).contains("requires Chrome 138+"));
    }
}
