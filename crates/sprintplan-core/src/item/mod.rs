//! Work item data model.
//!
//! A [`WorkItem`] is built once per fetch cycle from tracker data and never
//! mutated afterwards. Scoring produces a new [`crate::scoring::ScoredItem`]
//! wrapping a copy of the item rather than annotating it in place.

pub mod points;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Assignee sentinel used by trackers for "nobody".
pub const UNASSIGNED: &str = "Unassigned";

/// A candidate piece of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Tracker key; `None` for items not yet created in the tracker.
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub summary: String,
    /// Tracker issue type ("Bug", "Story", "Task", ...).
    #[serde(default, rename = "type")]
    pub item_type: String,
    /// Ordinal priority label ("Highest" .. "Lowest").
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "points::deserialize")]
    pub story_points: f64,
    #[serde(default, deserialize_with = "deserialize_assignee")]
    pub assignee: Option<String>,
    #[serde(default)]
    pub project: String,
}

impl WorkItem {
    /// Create an item with the given key and summary; other fields empty.
    pub fn new(key: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            summary: summary.into(),
            item_type: String::new(),
            priority: String::new(),
            status: String::new(),
            story_points: 0.0,
            assignee: None,
            project: String::new(),
        }
    }

    pub fn with_type(mut self, item_type: impl Into<String>) -> Self {
        self.item_type = item_type.into();
        self
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = priority.into();
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_points(mut self, points: f64) -> Self {
        self.story_points = if points.is_finite() && points > 0.0 { points } else { 0.0 };
        self
    }

    pub fn with_assignee(mut self, assignee: impl AsRef<str>) -> Self {
        self.assignee = normalize_assignee_name(assignee.as_ref());
        self
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = project.into();
        self
    }

    /// Whether the item type denotes a defect.
    pub fn is_defect(&self) -> bool {
        let t = self.item_type.trim();
        t.eq_ignore_ascii_case("bug") || t.eq_ignore_ascii_case("defect")
    }

    /// Parsed priority label, if recognised.
    pub fn priority_level(&self) -> Option<Priority> {
        Priority::parse(&self.priority)
    }

    /// Parsed status label, if recognised.
    pub fn status_stage(&self) -> Option<Status> {
        Status::parse(&self.status)
    }

    /// Key or "-" for display.
    pub fn display_key(&self) -> &str {
        self.key.as_deref().unwrap_or("-")
    }
}

/// Ordinal priority labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Lowest,
    Low,
    Medium,
    High,
    Highest,
}

impl Priority {
    pub const ALL: [Priority; 5] = [
        Priority::Highest,
        Priority::High,
        Priority::Medium,
        Priority::Low,
        Priority::Lowest,
    ];

    /// Case-insensitive label lookup.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "highest" => Some(Priority::Highest),
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            "lowest" => Some(Priority::Lowest),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Priority::Highest => "Highest",
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
            Priority::Lowest => "Lowest",
        }
    }
}

/// Workflow stage of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    InProgress,
    InReview,
    ToDo,
    Backlog,
}

impl Status {
    /// Case-insensitive label lookup; whitespace and dashes are ignored so
    /// "In Progress", "in-progress" and "INPROGRESS" agree.
    pub fn parse(label: &str) -> Option<Self> {
        let folded: String = label
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        match folded.as_str() {
            "inprogress" => Some(Status::InProgress),
            "inreview" => Some(Status::InReview),
            "todo" => Some(Status::ToDo),
            "backlog" => Some(Status::Backlog),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Status::InProgress => "In Progress",
            Status::InReview => "In Review",
            Status::ToDo => "To Do",
            Status::Backlog => "Backlog",
        }
    }
}

/// Map an assignee name to `None` when it is empty or the sentinel.
pub fn normalize_assignee_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(UNASSIGNED) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Assignee from any tracker shape: a plain name, or an object carrying
/// `displayName`, `emailAddress` or `name`.
pub fn normalize_assignee(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) => normalize_assignee_name(s),
        Value::Object(map) => ["displayName", "emailAddress", "name"]
            .iter()
            .filter_map(|field| map.get(*field).and_then(Value::as_str))
            .find_map(normalize_assignee_name),
        _ => None,
    }
}

fn deserialize_assignee<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(normalize_assignee(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_coerces_points_and_assignee() {
        let item: WorkItem = serde_json::from_value(json!({
            "key": "DATAG-1",
            "summary": "Fix ingestion",
            "type": "Bug",
            "story_points": {"value": "3"},
            "assignee": {"displayName": "Dana Scully"}
        }))
        .unwrap();

        assert_eq!(item.story_points, 3.0);
        assert_eq!(item.assignee.as_deref(), Some("Dana Scully"));
        assert!(item.is_defect());
    }

    #[test]
    fn test_unassigned_sentinel_maps_to_none() {
        let item: WorkItem =
            serde_json::from_value(json!({"key": "A-1", "assignee": "Unassigned"})).unwrap();
        assert_eq!(item.assignee, None);

        let item = WorkItem::new("A-2", "x").with_assignee("  ");
        assert_eq!(item.assignee, None);
    }

    #[test]
    fn test_missing_fields_default() {
        let item: WorkItem = serde_json::from_value(json!({})).unwrap();
        assert_eq!(item.key, None);
        assert_eq!(item.story_points, 0.0);
        assert_eq!(item.display_key(), "-");
    }

    #[test]
    fn test_priority_parse_is_case_insensitive() {
        assert_eq!(Priority::parse("HIGHEST"), Some(Priority::Highest));
        assert_eq!(Priority::parse(" low "), Some(Priority::Low));
        assert_eq!(Priority::parse("P1"), None);
        assert!(Priority::Highest > Priority::High);
    }

    #[test]
    fn test_status_parse_folds_separators() {
        assert_eq!(Status::parse("In Progress"), Some(Status::InProgress));
        assert_eq!(Status::parse("in-review"), Some(Status::InReview));
        assert_eq!(Status::parse("TO DO"), Some(Status::ToDo));
        assert_eq!(Status::parse("Done"), None);
    }
}
