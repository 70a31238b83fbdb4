// Pattern-based task extraction used when no prompt model can do it

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static BULLET_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[-*•]\s+(.+?)\s*$").expect("Invalid regex pattern"));

static NUMBERED_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d+[.)]\s+(.+?)\s*$").expect("Invalid regex pattern"));

static MARKER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:todo|task|action item)\s*:\s*(.+?)\s*$").expect("Invalid regex pattern")
});

static MODAL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:need to|needs to|have to|has to|should|must)\b").expect("Invalid regex pattern")
});

/// Which pattern matched a line, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskPattern {
    Bullet,
    Numbered,
    Marker,
    Modal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskItem {
    pub text: String,
    pub pattern: TaskPattern,
}

fn match_line(line: &str) -> Option<TaskItem> {
    let stripped = [
        (&*BULLET_REGEX, TaskPattern::Bullet),
        (&*NUMBERED_REGEX, TaskPattern::Numbered),
        (&*MARKER_REGEX, TaskPattern::Marker),
    ]
    .into_iter()
    .find_map(|(regex, pattern)| {
        regex
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| TaskItem {
                text: m.as_str().to_string(),
                pattern,
            })
    });

    stripped.or_else(|| {
        MODAL_REGEX.is_match(line).then(|| TaskItem {
            text: line.trim().to_string(),
            pattern: TaskPattern::Modal,
        })
    })
}

/// Task-like lines in input order; each line yields at most one item
pub fn extract_tasks(text: &str) -> Vec<TaskItem> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(match_line)
        .collect()
}

/// "1. first\n2. second"
pub fn format_numbered(items: &[TaskItem]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item.text))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_list() {
        let items = extract_tasks("- buy milk\n2. call mom\ntodo: water plants\njust a note");

        let texts: Vec<&str> = items.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["buy milk", "call mom", "water plants"]);
        assert_eq!(
            items.iter().map(|i| i.pattern).collect::<Vec<_>>(),
            vec![TaskPattern::Bullet, TaskPattern::Numbered, TaskPattern::Marker]
        );
        assert_eq!(format_numbered(&items), "1. buy milk\n2. call mom\n3. water plants");
    }

    #[test]
    fn test_first_pattern_wins() {
        // bullet and modal both match; recorded once, as a bullet
        let items = extract_tasks("* we should ship friday");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].pattern, TaskPattern::Bullet);
        assert_eq!(items[0].text, "we should ship friday");

        let items = extract_tasks("1) TODO: not stripped twice");
        assert_eq!(items[0].pattern, TaskPattern::Numbered);
        assert_eq!(items[0].text, "TODO: not stripped twice");
    }

    #[test]
    fn test_modal_lines_keep_full_text() {
        let items = extract_tasks("  I need to renew my passport  \nThe weather was nice.\nAction Item: book flights");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].text, "I need to renew my passport");
        assert_eq!(items[0].pattern, TaskPattern::Modal);
        assert_eq!(items[1].text, "book flights");
    }

    #[test]
    fn test_modal_needs_word_boundary() {
        assert!(extract_tasks("The mustard was great").is_empty());
        assert!(extract_tasks("Shoulder pain is gone").is_empty());
    }

    #[test]
    fn test_nothing_matches() {
        assert!(extract_tasks("A quiet afternoon.\n\nNothing planned.").is_empty());
        assert!(extract_tasks("-dash without space").is_empty());
    }
}
