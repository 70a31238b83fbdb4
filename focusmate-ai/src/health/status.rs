use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::invoke::OperationKind;
use crate::probe::CapabilitySet;

pub const OPERATIONAL_FAILURE_MESSAGE: &str =
    "AI system is available but not responding properly. Please try again.";
pub const NETWORK_FAILURE_MESSAGE: &str =
    "AI system is temporarily unavailable. Please try again in a moment.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HealthErrorKind {
    None,
    /// Nothing usable is exposed by the runtime
    Unavailable,
    /// Present, but the liveness call failed or timed out
    OperationalFailure,
    /// The health-check machinery itself failed
    NetworkOrTimeout,
}

/// Time-stamped snapshot of the runtime's AI health.
///
/// Snapshots are never edited; every check builds a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub available: bool,
    pub operational: bool,
    pub last_checked: DateTime<Utc>,
    pub error_kind: HealthErrorKind,
    pub error_message: String,
    pub available_operations: BTreeSet<OperationKind>,
    pub capabilities: CapabilitySet,
}

impl HealthStatus {
    /// Status before any liveness test has run: presence is trusted
    pub(crate) fn initial(capabilities: CapabilitySet, min_version: u32) -> Self {
        if capabilities.any() {
            Self::checked(capabilities, true)
        } else {
            Self::unavailable(capabilities, min_version)
        }
    }

    pub(crate) fn unavailable(capabilities: CapabilitySet, min_version: u32) -> Self {
        Self {
            available: false,
            operational: false,
            last_checked: Utc::now(),
            error_kind: HealthErrorKind::Unavailable,
            error_message: capabilities.unavailable_message(min_version),
            available_operations: BTreeSet::new(),
            capabilities,
        }
    }

    /// At least one capability present; `operational` is the liveness outcome
    pub(crate) fn checked(capabilities: CapabilitySet, operational: bool) -> Self {
        let (error_kind, error_message) = if operational {
            (HealthErrorKind::None, String::new())
        } else {
            (
                HealthErrorKind::OperationalFailure,
                OPERATIONAL_FAILURE_MESSAGE.to_string(),
            )
        };

        Self {
            available: true,
            operational,
            last_checked: Utc::now(),
            error_kind,
            error_message,
            available_operations: capabilities.available_operations(),
            capabilities,
        }
    }

    /// The probe itself blew up; presence data is carried over from `previous`
    pub(crate) fn machinery_failure(previous: &HealthStatus) -> Self {
        Self {
            available: previous.available,
            operational: false,
            last_checked: Utc::now(),
            error_kind: HealthErrorKind::NetworkOrTimeout,
            error_message: NETWORK_FAILURE_MESSAGE.to_string(),
            available_operations: previous.available_operations.clone(),
            capabilities: previous.capabilities.clone(),
        }
    }

    pub fn is_ready_for_use(&self) -> bool {
        self.available && self.operational
    }

    pub fn should_show_fallback_error(&self) -> bool {
        !self.is_ready_for_use()
    }

    /// Message suitable for a banner or toast; empty when healthy
    pub fn user_friendly_message(&self) -> String {
        match self.error_kind {
            HealthErrorKind::None => String::new(),
            HealthErrorKind::Unavailable => self.error_message.clone(),
            HealthErrorKind::OperationalFailure => {
                "AI system is available but not responding properly. This might be temporary - please try again."
                    .to_string()
            }
            HealthErrorKind::NetworkOrTimeout => {
                "AI system is temporarily unavailable. Please check your connection and try again."
                    .to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::RuntimeKind;
    use crate::runtime::{ApiShape, BrowserFamily};

    fn caps(summarizer: bool) -> CapabilitySet {
        CapabilitySet {
            summarizer,
            translator: false,
            writer: false,
            prompt_model: false,
            runtime_kind: RuntimeKind::SupportedBrowser,
            runtime_version: Some(140),
            browser: BrowserFamily::Chrome,
            shape: summarizer.then_some(ApiShape::Namespaced),
        }
    }

    fn holds_invariants(status: &HealthStatus) -> bool {
        (!status.operational || status.available)
            && ((status.error_kind == HealthErrorKind::None) == status.is_ready_for_use())
    }

    #[test]
    fn test_constructors_hold_invariants() {
        let healthy = HealthStatus::checked(caps(true), true);
        let failing = HealthStatus::checked(caps(true), false);
        let missing = HealthStatus::unavailable(caps(false), 138);
        let broken = HealthStatus::machinery_failure(&healthy);

        for status in [&healthy, &failing, &missing, &broken] {
            assert!(holds_invariants(status), "{:?}", status);
        }
        assert!(broken.available);
        assert_eq!(broken.error_kind, HealthErrorKind::NetworkOrTimeout);
    }

    #[test]
    fn test_initial_status_is_optimistic() {
        let status = HealthStatus::initial(caps(true), 138);
        assert!(status.is_ready_for_use());
        assert!(status.available_operations.contains(&OperationKind::Summarize));

        let status = HealthStatus::initial(caps(false), 138);
        assert_eq!(status.error_kind, HealthErrorKind::Unavailable);
        assert!(status.should_show_fallback_error());
    }

    #[test]
    fn test_user_friendly_messages() {
        assert_eq!(HealthStatus::checked(caps(true), true).user_friendly_message(), "");
        assert!(HealthStatus::checked(caps(true), false)
            .user_friendly_message()
            .contains("This might be temporary"));

        let missing = HealthStatus::unavailable(caps(false), 138);
        assert_eq!(missing.user_friendly_message(), missing.error_message);
    }
}
