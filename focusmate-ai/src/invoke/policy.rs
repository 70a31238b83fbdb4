use serde::{Deserialize, Serialize};

use super::modes::OperationKind;

/// What to do when an operation's capability is missing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MissingCapabilityPolicy {
    /// Fail with `Unavailable`
    Require,
    /// Answer with the local pattern heuristic
    LocalFallback,
    /// Explain the gap and point at an alternative operation
    Explain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationPolicy {
    /// Sub-capability name as it appears in the runtime
    pub capability: &'static str,
    pub when_missing: MissingCapabilityPolicy,
    /// User-facing text when the capability is missing
    pub missing_message: &'static str,
    /// User-facing text when the capability returned nothing
    pub empty_message: &'static str,
}

impl OperationKind {
    /// Degradation table, one row per operation
    pub fn policy(&self) -> OperationPolicy {
        match self {
            OperationKind::Summarize => OperationPolicy {
                capability: "summarizer",
                when_missing: MissingCapabilityPolicy::Require,
                missing_message: "Text summarization is not available in this browser. Enable #summarization-api-for-gemini-nano in chrome://flags and restart Chrome.",
                empty_message: "No summary generated. Please try again with different text.",
            },
            OperationKind::Translate => OperationPolicy {
                capability: "translator",
                when_missing: MissingCapabilityPolicy::Require,
                missing_message: "Translation is not available in this browser. Enable the Translator API in chrome://flags and restart Chrome.",
                empty_message: "No translation generated. Please try again with different text.",
            },
            OperationKind::ExtractTasks => OperationPolicy {
                capability: "promptModel",
                when_missing: MissingCapabilityPolicy::LocalFallback,
                missing_message: "Tasks were found with pattern matching, not AI. Some tasks may be missed.",
                empty_message: "No tasks generated. Please try again with different text.",
            },
            OperationKind::Rewrite => OperationPolicy {
                capability: "writer",
                when_missing: MissingCapabilityPolicy::Explain,
                missing_message: "Rewriting needs the Writer API, which is not yet released or enabled in this browser. Try Summarize instead to condense and clarify your text.",
                empty_message: "No rewrite generated. Please try again with different text.",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_table() {
        assert_eq!(OperationKind::Summarize.policy().when_missing, MissingCapabilityPolicy::Require);
        assert_eq!(OperationKind::Translate.policy().when_missing, MissingCapabilityPolicy::Require);
        assert_eq!(
            OperationKind::ExtractTasks.policy().when_missing,
            MissingCapabilityPolicy::LocalFallback
        );
        assert_eq!(OperationKind::Rewrite.policy().when_missing, MissingCapabilityPolicy::Explain);
        assert!(OperationKind::Rewrite.policy().missing_message.contains("Summarize"));
    }
}
