//! Planning snapshot ingestion.
//!
//! A [`PlanningSnapshot`] is what the fetch layer saw in the tracker and the
//! wiki: per-project item lists, completed periods, the roster and free-text
//! pages. [`Ingestor`] turns it into [`PlanningInputs`], the typed inputs of
//! the allocation engine. Items whose structured fields are missing are
//! completed from their `detail` text by the extractor chains in
//! [`extract`].

pub mod extract;

use std::collections::HashSet;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::capacity::{AvailabilitySignal, CapacityPolicy, Member};
use crate::commitment::{parse_commitments, Commitment};
use crate::error::IngestError;
use crate::item::{normalize_assignee, points, WorkItem};
use crate::velocity::PeriodRecord;

use extract::extract_detail;

/// An item as the tracker returned it. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Any JSON shape; coerced on conversion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_points: Option<Value>,
    /// A name, or an object with `displayName`/`emailAddress`/`name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Rendered issue detail, used to fill missing fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl RawItem {
    /// Build a [`WorkItem`], falling back to `detail` for missing fields and
    /// to `project` when the item names none.
    pub fn to_work_item(&self, project: &str) -> WorkItem {
        let detail = self
            .detail
            .as_deref()
            .map(extract_detail)
            .unwrap_or_default();

        let story_points = match &self.story_points {
            Some(raw) if !raw.is_null() => points::coerce(raw),
            _ => detail.story_points.unwrap_or(0.0),
        };
        let assignee = self
            .assignee
            .as_ref()
            .and_then(normalize_assignee)
            .or(detail.assignee);

        let mut item = WorkItem::new("", non_empty(self.summary.as_deref()).or(detail.summary).unwrap_or_default())
            .with_type(non_empty(self.item_type.as_deref()).or(detail.item_type).unwrap_or_default())
            .with_priority(non_empty(self.priority.as_deref()).or(detail.priority).unwrap_or_default())
            .with_status(non_empty(self.status.as_deref()).or(detail.status).unwrap_or_default())
            .with_points(story_points)
            .with_project(non_empty(self.project.as_deref()).unwrap_or_else(|| project.to_string()));
        item.key = non_empty(self.key.as_deref());
        item.assignee = assignee;
        item
    }
}

/// One completed period of a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodSnapshot {
    /// Defaults to the number of listed items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items_completed: Option<u32>,
    #[serde(default)]
    pub items: Vec<RawItem>,
}

impl PeriodSnapshot {
    pub fn to_record(&self) -> PeriodRecord {
        let count = self
            .items_completed
            .unwrap_or_else(|| u32::try_from(self.items.len()).unwrap_or(u32::MAX));
        let item_points = self
            .items
            .iter()
            .map(|i| i.story_points.as_ref().map(points::coerce).unwrap_or(0.0))
            .collect();
        PeriodRecord::new(count, item_points)
    }
}

/// A free-text wiki page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub content: String,
}

/// Everything the fetch layer collected for one planning run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanningSnapshot {
    /// Project keys in display order
    #[serde(default)]
    pub projects: Vec<String>,
    /// Completed periods per project, most recent first
    #[serde(default)]
    pub completed_periods: IndexMap<String, Vec<PeriodSnapshot>>,
    #[serde(default)]
    pub active_items: IndexMap<String, Vec<RawItem>>,
    #[serde(default)]
    pub backlog: IndexMap<String, Vec<RawItem>>,
    /// Items that rolled over from the previous period
    #[serde(default)]
    pub carry_over: IndexMap<String, Vec<RawItem>>,
    #[serde(default)]
    pub roster: Vec<Member>,
    #[serde(default)]
    pub availability: Vec<Page>,
    #[serde(default)]
    pub commitment_pages: Vec<Page>,
}

impl PlanningSnapshot {
    /// Parse a snapshot from JSON text.
    pub fn from_json(text: &str, path: &Path) -> Result<Self, IngestError> {
        serde_json::from_str(text).map_err(|source| IngestError::ParseFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read a snapshot file.
    pub fn load(path: &Path) -> Result<Self, IngestError> {
        let text = std::fs::read_to_string(path).map_err(|source| IngestError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text, path)
    }

    /// Write the snapshot back as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), IngestError> {
        let write_failed = |message: String| IngestError::WriteFailed {
            path: path.to_path_buf(),
            message,
        };
        let text = serde_json::to_string_pretty(self).map_err(|e| write_failed(e.to_string()))?;
        std::fs::write(path, text).map_err(|e| write_failed(e.to_string()))
    }

    /// Declared projects, or every project key seen in the item maps.
    pub fn project_keys(&self) -> Vec<String> {
        if !self.projects.is_empty() {
            return self.projects.clone();
        }
        let mut keys: Vec<String> = Vec::new();
        let maps = [&self.active_items, &self.backlog, &self.carry_over];
        let seen = self
            .completed_periods
            .keys()
            .chain(maps.iter().flat_map(|m| m.keys()));
        for key in seen {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
        keys
    }

    /// Every active, backlog and carry-over item, with its project key.
    pub fn items_mut(&mut self) -> impl Iterator<Item = (&String, &mut RawItem)> {
        self.active_items
            .iter_mut()
            .chain(self.backlog.iter_mut())
            .chain(self.carry_over.iter_mut())
            .flat_map(|(project, items)| items.iter_mut().map(move |item| (project, item)))
    }
}

/// Caps on the number of items read from a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestLimits {
    #[serde(default = "default_active_per_project")]
    pub active_per_project: usize,
    #[serde(default = "default_backlog_per_project")]
    pub backlog_per_project: usize,
    #[serde(default = "default_active_total")]
    pub active_total: usize,
    #[serde(default = "default_backlog_total")]
    pub backlog_total: usize,
}

fn default_active_per_project() -> usize {
    30
}
fn default_backlog_per_project() -> usize {
    15
}
fn default_active_total() -> usize {
    50
}
fn default_backlog_total() -> usize {
    30
}

impl Default for IngestLimits {
    fn default() -> Self {
        Self {
            active_per_project: default_active_per_project(),
            backlog_per_project: default_backlog_per_project(),
            active_total: default_active_total(),
            backlog_total: default_backlog_total(),
        }
    }
}

/// Typed inputs of the allocation engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanningInputs {
    /// Project key to completed periods, most recent first
    pub velocity_history: IndexMap<String, Vec<PeriodRecord>>,
    /// Active items then backlog, de-duplicated by key
    pub candidates: Vec<WorkItem>,
    pub carry_over: Vec<WorkItem>,
    pub roster: Vec<Member>,
    pub availability: Vec<AvailabilitySignal>,
    pub commitments: Vec<Commitment>,
}

/// Converts a snapshot into engine inputs.
#[derive(Debug, Clone, Default)]
pub struct Ingestor {
    limits: IngestLimits,
    policy: CapacityPolicy,
}

impl Ingestor {
    pub fn new(limits: IngestLimits, policy: CapacityPolicy) -> Self {
        Self { limits, policy }
    }

    pub fn ingest(&self, snapshot: &PlanningSnapshot) -> PlanningInputs {
        let velocity_history = snapshot
            .completed_periods
            .iter()
            .map(|(project, periods)| {
                (
                    project.clone(),
                    periods.iter().map(PeriodSnapshot::to_record).collect(),
                )
            })
            .collect();

        let active = collect_limited(
            &snapshot.active_items,
            self.limits.active_per_project,
            self.limits.active_total,
        );
        let backlog = collect_limited(
            &snapshot.backlog,
            self.limits.backlog_per_project,
            self.limits.backlog_total,
        );

        let roster = if snapshot.roster.is_empty() {
            derive_roster(&active)
        } else {
            snapshot.roster.clone()
        };

        let mut seen: HashSet<String> = HashSet::new();
        let candidates: Vec<WorkItem> = active
            .into_iter()
            .chain(backlog)
            .filter(|item| match &item.key {
                Some(key) => seen.insert(key.clone()),
                None => true,
            })
            .collect();

        let carry_over: Vec<WorkItem> = snapshot
            .carry_over
            .iter()
            .flat_map(|(project, items)| items.iter().map(move |i| i.to_work_item(project)))
            .collect();

        let availability: Vec<AvailabilitySignal> = snapshot
            .availability
            .iter()
            .filter(|page| self.policy.mentions_absence(&page.content))
            .map(|page| AvailabilitySignal {
                source: page.source.clone(),
                content: page.content.clone(),
            })
            .collect();

        let commitments: Vec<Commitment> = snapshot
            .commitment_pages
            .iter()
            .flat_map(|page| parse_commitments(&page.content))
            .collect();

        info!(
            candidates = candidates.len(),
            carry_over = carry_over.len(),
            members = roster.len(),
            availability_pages = availability.len(),
            commitments = commitments.len(),
            "snapshot ingested"
        );

        PlanningInputs {
            velocity_history,
            candidates,
            carry_over,
            roster,
            availability,
            commitments,
        }
    }
}

fn collect_limited(
    by_project: &IndexMap<String, Vec<RawItem>>,
    per_project: usize,
    total: usize,
) -> Vec<WorkItem> {
    let items: Vec<WorkItem> = by_project
        .iter()
        .flat_map(|(project, items)| {
            items
                .iter()
                .take(per_project)
                .map(move |i| i.to_work_item(project))
        })
        .take(total)
        .collect();
    debug!(kept = items.len(), per_project, total, "item limits applied");
    items
}

/// Members holding active items, in first-seen order.
pub fn derive_roster(active: &[WorkItem]) -> Vec<Member> {
    let mut members: IndexMap<String, Member> = IndexMap::new();
    for item in active {
        let Some(name) = &item.assignee else {
            continue;
        };
        let member = members
            .entry(name.clone())
            .or_insert_with(|| Member::new(name.clone()));
        if !item.project.is_empty() && !member.projects.contains(&item.project) {
            member.projects.push(item.project.clone());
        }
        member.ticket_count += 1;
    }
    members.into_values().collect()
}
