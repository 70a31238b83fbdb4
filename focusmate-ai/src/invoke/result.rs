use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InvocationErrorKind {
    InvalidInput,
    Unavailable,
    OperationalFailure,
    NetworkOrTimeout,
    /// The capability works in general but failed on this input
    PerRequestFailure,
}

/// Outcome of one `invoke` call, always returned as a value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum InvocationResult {
    Success {
        text: String,
    },
    /// A usable answer of reduced quality; `reason` says why
    Degraded {
        text: String,
        reason: String,
    },
    Failed {
        kind: InvocationErrorKind,
        message: String,
    },
}

impl InvocationResult {
    pub(crate) fn success(text: impl Into<String>) -> Self {
        Self::Success { text: text.into() }
    }

    pub(crate) fn degraded(text: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Degraded {
            text: text.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn failed(kind: InvocationErrorKind, message: impl Into<String>) -> Self {
        Self::Failed {
            kind,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn error_kind(&self) -> Option<InvocationErrorKind> {
        match self {
            Self::Failed { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Text to show the user: the output, or the failure message
    pub fn display_text(&self) -> &str {
        match self {
            Self::Success { text } | Self::Degraded { text, .. } => text,
            Self::Failed { message, .. } => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(InvocationResult::failed(
            InvocationErrorKind::PerRequestFailure,
            "nope",
        ))
        .unwrap();
        assert_eq!(json["outcome"], "failed");
        assert_eq!(json["kind"], "perRequestFailure");

        let json = serde_json::to_value(InvocationResult::degraded("1. a", "pattern-based")).unwrap();
        assert_eq!(json["outcome"], "degraded");
        assert_eq!(json["reason"], "pattern-based");
    }
}
