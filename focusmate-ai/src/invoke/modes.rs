use serde::{Deserialize, Serialize};

/// The four user-facing text operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationKind {
    Summarize,
    Rewrite,
    ExtractTasks,
    Translate,
}

impl OperationKind {
    pub const ALL: [OperationKind; 4] = [
        OperationKind::Summarize,
        OperationKind::Rewrite,
        OperationKind::ExtractTasks,
        OperationKind::Translate,
    ];

    /// Verb used at the start of the mode instruction
    fn verb(&self) -> &'static str {
        match self {
            OperationKind::Summarize => "Summarize",
            OperationKind::Rewrite => "Rewrite",
            OperationKind::ExtractTasks => "Extract the actionable tasks from",
            OperationKind::Translate => "Translate",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OperationKind::Summarize => "summarize",
            OperationKind::Rewrite => "rewrite",
            OperationKind::ExtractTasks => "extract-tasks",
            OperationKind::Translate => "translate",
        }
    }
}

impl std::str::FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "summarize" => Ok(OperationKind::Summarize),
            "rewrite" => Ok(OperationKind::Rewrite),
            "extract-tasks" | "extracttasks" | "tasks" => Ok(OperationKind::ExtractTasks),
            "translate" => Ok(OperationKind::Translate),
            other => Err(format!("Unknown operation: {}", other)),
        }
    }
}

/// Stylistic profile prefixed onto every AI request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProcessingMode {
    #[default]
    Academic,
    Concise,
    Creative,
    Conversational,
}

impl ProcessingMode {
    pub const ALL: [ProcessingMode; 4] = [
        ProcessingMode::Academic,
        ProcessingMode::Concise,
        ProcessingMode::Creative,
        ProcessingMode::Conversational,
    ];

    /// Fixed style phrase appended after "<Verb> this text"
    pub fn style(&self) -> &'static str {
        match self {
            ProcessingMode::Academic => "in an academic, formal style suitable for scholarly writing.",
            ProcessingMode::Concise => "in a concise, clear manner while preserving key information.",
            ProcessingMode::Creative => "with creative flair, maintaining the original's artistic expression.",
            ProcessingMode::Conversational => {
                "in a natural, conversational tone as if speaking to a friend."
            }
        }
    }

    /// Instruction sent ahead of the user's text for `operation`
    pub fn instruction(&self, operation: OperationKind) -> String {
        format!("{} this text {}", operation.verb(), self.style())
    }
}

impl std::str::FromStr for ProcessingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "academic" => Ok(ProcessingMode::Academic),
            "concise" => Ok(ProcessingMode::Concise),
            "creative" => Ok(ProcessingMode::Creative),
            "conversational" => Ok(ProcessingMode::Conversational),
            other => Err(format!("Unknown processing mode: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_instructions_match_table() {
        assert_eq!(
            ProcessingMode::Academic.instruction(OperationKind::Summarize),
            "Summarize this text in an academic, formal style suitable for scholarly writing."
        );
        assert_eq!(
            ProcessingMode::Concise.instruction(OperationKind::Summarize),
            "Summarize this text in a concise, clear manner while preserving key information."
        );
        assert_eq!(
            ProcessingMode::Creative.instruction(OperationKind::Summarize),
            "Summarize this text with creative flair, maintaining the original's artistic expression."
        );
        assert_eq!(
            ProcessingMode::Conversational.instruction(OperationKind::Summarize),
            "Summarize this text in a natural, conversational tone as if speaking to a friend."
        );
    }

    #[test]
    fn test_instruction_verb_follows_operation() {
        let rewrite = ProcessingMode::Concise.instruction(OperationKind::Rewrite);
        assert!(rewrite.starts_with("Rewrite this text in a concise"));
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("Extract-Tasks".parse::<OperationKind>().unwrap(), OperationKind::ExtractTasks);
        assert_eq!("creative".parse::<ProcessingMode>().unwrap(), ProcessingMode::Creative);
        assert!("poetic".parse::<ProcessingMode>().is_err());
    }
}
