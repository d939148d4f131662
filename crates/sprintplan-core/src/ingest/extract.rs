//! Field extraction from free-text item detail.
//!
//! Trackers that answer with rendered text instead of structured records
//! still carry the fields we need. Each field has a chain of extractors
//! tried in order: `**Field**: value` markdown, `Field: value` plain text,
//! then an embedded JSON fragment. The first non-empty capture wins.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::item::{normalize_assignee_name, points};

/// A single extraction strategy: one pattern whose first group is the value.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    name: &'static str,
    pattern: Regex,
}

impl FieldExtractor {
    fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("extractor pattern is valid"),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Trimmed first capture, or `None` when absent or blank.
    pub fn extract(&self, text: &str) -> Option<String> {
        let caps = self.pattern.captures(text)?;
        let value = caps.get(1)?.as_str().trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }
}

/// Prioritized extractors for one field.
#[derive(Debug, Clone)]
pub struct ExtractorChain {
    extractors: Vec<FieldExtractor>,
}

impl ExtractorChain {
    fn of(extractors: Vec<FieldExtractor>) -> Self {
        Self { extractors }
    }

    pub fn extractors(&self) -> &[FieldExtractor] {
        &self.extractors
    }

    /// First extractor that yields a value.
    pub fn extract(&self, text: &str) -> Option<String> {
        self.extractors.iter().find_map(|e| e.extract(text))
    }
}

static ASSIGNEE: Lazy<ExtractorChain> = Lazy::new(|| {
    ExtractorChain::of(vec![
        FieldExtractor::new("markdown", r"(?i)\*\*Assignee\*\*[:\s]+([^\n*|]+)"),
        FieldExtractor::new("plain", r"(?i)Assignee[:\s]+([^\n,|]+)"),
        FieldExtractor::new(
            "json",
            r#""assignee"\s*:\s*\{[^}]*"displayName"\s*:\s*"([^"]+)""#,
        ),
    ])
});

static SUMMARY: Lazy<ExtractorChain> = Lazy::new(|| {
    ExtractorChain::of(vec![
        FieldExtractor::new("markdown", r"(?i)\*\*Summary\*\*[:\s]+([^\n]+)"),
        FieldExtractor::new("plain", r"(?i)Summary[:\s]+([^\n]+)"),
        FieldExtractor::new("json", r#""summary"\s*:\s*"([^"]+)""#),
    ])
});

static STATUS: Lazy<ExtractorChain> = Lazy::new(|| {
    ExtractorChain::of(vec![
        FieldExtractor::new("markdown", r"(?i)\*\*Status\*\*[:\s]+([^\n*|]+)"),
        FieldExtractor::new("plain", r"(?i)Status[:\s]+([^\n,|]+)"),
        FieldExtractor::new("json", r#""status"\s*:\s*\{[^}]*"name"\s*:\s*"([^"]+)""#),
    ])
});

static PRIORITY: Lazy<ExtractorChain> = Lazy::new(|| {
    ExtractorChain::of(vec![
        FieldExtractor::new("markdown", r"(?i)\*\*Priority\*\*[:\s]+([^\n*|]+)"),
        FieldExtractor::new("plain", r"(?i)Priority[:\s]+([^\n,|]+)"),
        FieldExtractor::new("json", r#""priority"\s*:\s*\{[^}]*"name"\s*:\s*"([^"]+)""#),
    ])
});

static ITEM_TYPE: Lazy<ExtractorChain> = Lazy::new(|| {
    ExtractorChain::of(vec![
        FieldExtractor::new("markdown", r"(?i)\*\*(?:Issue\s*)?Type\*\*[:\s]+([^\n*|]+)"),
        FieldExtractor::new("plain", r"(?i)(?:Issue\s*)?Type[:\s]+([^\n,|]+)"),
        FieldExtractor::new("json", r#""issuetype"\s*:\s*\{[^}]*"name"\s*:\s*"([^"]+)""#),
    ])
});

static STORY_POINTS: Lazy<ExtractorChain> = Lazy::new(|| {
    ExtractorChain::of(vec![
        FieldExtractor::new("markdown", r"(?i)\*\*Story\s*Points?\*\*[:\s]+(\d+)"),
        FieldExtractor::new("plain", r"(?i)Story\s*Points?[:\s]+(\d+)"),
        FieldExtractor::new("json", r#""customfield_10016"\s*:\s*(\d+)"#),
    ])
});

/// Fields recoverable from detail text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailField {
    Assignee,
    Summary,
    Status,
    Priority,
    ItemType,
    StoryPoints,
}

impl DetailField {
    pub fn chain(&self) -> &'static ExtractorChain {
        match self {
            DetailField::Assignee => &ASSIGNEE,
            DetailField::Summary => &SUMMARY,
            DetailField::Status => &STATUS,
            DetailField::Priority => &PRIORITY,
            DetailField::ItemType => &ITEM_TYPE,
            DetailField::StoryPoints => &STORY_POINTS,
        }
    }
}

/// Everything the chains found in one detail text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailFields {
    pub assignee: Option<String>,
    pub summary: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub item_type: Option<String>,
    pub story_points: Option<f64>,
}

/// Run every field chain over `text`.
pub fn extract_detail(text: &str) -> DetailFields {
    DetailFields {
        assignee: DetailField::Assignee
            .chain()
            .extract(text)
            .and_then(|name| normalize_assignee_name(&name)),
        summary: DetailField::Summary.chain().extract(text),
        status: DetailField::Status.chain().extract(text),
        priority: DetailField::Priority.chain().extract(text),
        item_type: DetailField::ItemType.chain().extract(text),
        story_points: DetailField::StoryPoints
            .chain()
            .extract(text)
            .and_then(|raw| points::parse_leading_float(&raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_markdown_detail() {
        let text = indoc! {"
            # DATAG-12
            **Summary**: Rebuild the nightly export
            **Assignee**: Dana Scully
            **Status**: In Progress
            **Priority**: High
            **Issue Type**: Bug
            **Story Points**: 5
        "};
        let fields = extract_detail(text);
        assert_eq!(fields.summary.as_deref(), Some("Rebuild the nightly export"));
        assert_eq!(fields.assignee.as_deref(), Some("Dana Scully"));
        assert_eq!(fields.status.as_deref(), Some("In Progress"));
        assert_eq!(fields.priority.as_deref(), Some("High"));
        assert_eq!(fields.item_type.as_deref(), Some("Bug"));
        assert_eq!(fields.story_points, Some(5.0));
    }

    #[test]
    fn test_plain_text_detail() {
        let text = indoc! {"
            Assignee: Fox Mulder, reporter: Skinner
            Status: To Do
            Story Points: 8
        "};
        let fields = extract_detail(text);
        assert_eq!(fields.assignee.as_deref(), Some("Fox Mulder"));
        assert_eq!(fields.status.as_deref(), Some("To Do"));
        assert_eq!(fields.story_points, Some(8.0));
        assert_eq!(fields.summary, None);
    }

    #[test]
    fn test_json_fragment_detail() {
        let text = r#"{"fields": {"assignee": {"displayName": "Walter Skinner"}, "issuetype": {"name": "Story"}, "customfield_10016": 3}}"#;
        let fields = extract_detail(text);
        assert_eq!(fields.assignee.as_deref(), Some("Walter Skinner"));
        assert_eq!(fields.item_type.as_deref(), Some("Story"));
        assert_eq!(fields.story_points, Some(3.0));
    }

    #[test]
    fn test_markdown_wins_over_plain() {
        let text = "Priority: Low\n**Priority**: Highest\n";
        assert_eq!(
            DetailField::Priority.chain().extract(text).as_deref(),
            Some("Highest")
        );
    }

    #[test]
    fn test_unassigned_sentinel_is_dropped() {
        let fields = extract_detail("**Assignee**: Unassigned\n");
        assert_eq!(fields.assignee, None);
    }

    #[test]
    fn test_chains_are_ordered() {
        let names: Vec<_> = DetailField::Status
            .chain()
            .extractors()
            .iter()
            .map(FieldExtractor::name)
            .collect();
        assert_eq!(names, vec!["markdown", "plain", "json"]);
    }
}
