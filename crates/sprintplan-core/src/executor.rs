//! Plan execution against a tracker.
//!
//! [`SprintExecutor`] turns a [`Plan`] into tracker mutations: assigning
//! bucket items to their member, moving backlog items to the initial active
//! status and creating tracker entries for new unassigned work. Every action
//! is recorded in an [`ExecutionReport`]; a failing action is logged and the
//! run continues, except when the tracker is unreachable altogether.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::TrackerError;
use crate::ingest::{PlanningSnapshot, RawItem};
use crate::item::Status;
use crate::planner::Plan;
use crate::scoring::ScoredItem;

/// Status label items are moved to by a transition.
pub const INITIAL_STATUS: &str = "To Do";

/// Mutations the executor needs from an issue tracker.
pub trait Tracker {
    /// Resolve a display name to the tracker's account id.
    fn resolve_account(&mut self, name: &str) -> Result<String, TrackerError>;

    /// Set the assignee of an existing item.
    fn assign(&mut self, key: &str, account: &str) -> Result<(), TrackerError>;

    /// Move an item to the initial active status.
    fn transition_to_initial(&mut self, key: &str) -> Result<(), TrackerError>;

    /// Create an item. Returns the new key when the tracker reports one.
    fn create(
        &mut self,
        project: &str,
        summary: &str,
        item_type: &str,
    ) -> Result<Option<String>, TrackerError>;
}

/// Which steps to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteOptions {
    pub assign: bool,
    pub create_new: bool,
    pub transition: bool,
    /// Log every action without mutating the tracker
    pub dry_run: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            assign: true,
            create_new: false,
            transition: false,
            dry_run: false,
        }
    }
}

/// Kind of tracker action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Resolve,
    Assign,
    Transition,
    Create,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ActionKind::Resolve => "resolve",
            ActionKind::Assign => "assign",
            ActionKind::Transition => "transition",
            ActionKind::Create => "create",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedRecord {
    pub key: String,
    pub assignee: String,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub key: String,
    pub from: String,
    pub to: String,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedRecord {
    pub key: Option<String>,
    pub project: String,
    pub summary: String,
    pub dry_run: bool,
}

/// An action that did not run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedAction {
    pub action: ActionKind,
    pub target: String,
    pub reason: String,
}

/// An action the tracker refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionError {
    pub action: ActionKind,
    /// Item key, member name or summary
    pub target: String,
    pub message: String,
}

/// Outcome of one execution run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub executed_at: DateTime<Utc>,
    pub dry_run: bool,
    pub assigned: Vec<AssignedRecord>,
    pub transitioned: Vec<TransitionRecord>,
    pub created: Vec<CreatedRecord>,
    pub skipped: Vec<SkippedAction>,
    pub errors: Vec<ActionError>,
}

impl ExecutionReport {
    fn new(dry_run: bool) -> Self {
        Self {
            executed_at: Utc::now(),
            dry_run,
            assigned: Vec::new(),
            transitioned: Vec::new(),
            created: Vec::new(),
            skipped: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Number of actions performed or previewed.
    pub fn success_count(&self) -> usize {
        self.assigned.len() + self.transitioned.len() + self.created.len()
    }

    pub fn failure_count(&self) -> usize {
        self.errors.len()
    }

    fn skip(&mut self, action: ActionKind, target: impl Into<String>, reason: impl Into<String>) {
        let skipped = SkippedAction {
            action,
            target: target.into(),
            reason: reason.into(),
        };
        info!(action = %skipped.action, target = %skipped.target, reason = %skipped.reason, "skipped");
        self.skipped.push(skipped);
    }

    /// Record a failure, or hand it back when it must abort the run.
    fn fail(
        &mut self,
        action: ActionKind,
        target: impl Into<String>,
        err: TrackerError,
    ) -> Result<(), TrackerError> {
        if matches!(err, TrackerError::Unavailable(_)) {
            return Err(err);
        }
        let target = target.into();
        warn!(%action, target = %target, error = %err, "tracker action failed");
        self.errors.push(ActionError {
            action,
            target,
            message: err.to_string(),
        });
        Ok(())
    }
}

/// Applies a plan to a [`Tracker`].
#[derive(Debug, Clone, Default)]
pub struct SprintExecutor {
    options: ExecuteOptions,
    default_project: Option<String>,
}

impl SprintExecutor {
    pub fn new(options: ExecuteOptions) -> Self {
        Self {
            options,
            default_project: None,
        }
    }

    /// Project used when creating items, ahead of the item's own project.
    pub fn with_default_project(mut self, project: Option<String>) -> Self {
        self.default_project = project.filter(|p| !p.trim().is_empty());
        self
    }

    pub fn options(&self) -> &ExecuteOptions {
        &self.options
    }

    /// Run the enabled steps in order: resolve, assign, transition, create.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Unavailable`] as soon as the tracker reports
    /// it; every other failure is recorded in the report.
    pub fn execute<T: Tracker + ?Sized>(
        &self,
        plan: &Plan,
        tracker: &mut T,
    ) -> Result<ExecutionReport, TrackerError> {
        let mut report = ExecutionReport::new(self.options.dry_run);
        info!(dry_run = self.options.dry_run, "starting plan execution");

        if self.options.assign {
            let accounts = self.resolve_accounts(plan, tracker, &mut report)?;
            self.assign_items(plan, tracker, &accounts, &mut report)?;
        }
        if self.options.transition {
            self.transition_items(plan, tracker, &mut report)?;
        }
        if self.options.create_new {
            self.create_items(plan, tracker, &mut report)?;
        }

        info!(
            assigned = report.assigned.len(),
            transitioned = report.transitioned.len(),
            created = report.created.len(),
            skipped = report.skipped.len(),
            errors = report.errors.len(),
            "plan execution finished"
        );
        Ok(report)
    }

    fn resolve_accounts<T: Tracker + ?Sized>(
        &self,
        plan: &Plan,
        tracker: &mut T,
        report: &mut ExecutionReport,
    ) -> Result<HashMap<String, String>, TrackerError> {
        let mut accounts = HashMap::new();
        for name in plan.assignments.keys() {
            match tracker.resolve_account(name) {
                Ok(account) => {
                    info!(member = %name, %account, "account resolved");
                    accounts.insert(name.clone(), account);
                }
                Err(err) => report.fail(ActionKind::Resolve, name.as_str(), err)?,
            }
        }
        Ok(accounts)
    }

    fn assign_items<T: Tracker + ?Sized>(
        &self,
        plan: &Plan,
        tracker: &mut T,
        accounts: &HashMap<String, String>,
        report: &mut ExecutionReport,
    ) -> Result<(), TrackerError> {
        for (member, assignment) in &plan.assignments {
            let Some(account) = accounts.get(member) else {
                report.skip(ActionKind::Assign, member.as_str(), "no account id");
                continue;
            };

            for item in &assignment.items {
                let Some(key) = item.key() else {
                    report.skip(ActionKind::Assign, item.item.summary.as_str(), "item has no key");
                    continue;
                };
                if item.item.assignee.as_deref() == Some(member.as_str()) {
                    report.skip(ActionKind::Assign, key, format!("already assigned to {member}"));
                    continue;
                }

                if !self.options.dry_run {
                    if let Err(err) = tracker.assign(key, account) {
                        report.fail(ActionKind::Assign, key, err)?;
                        continue;
                    }
                }
                info!(%key, %member, dry_run = self.options.dry_run, "assigned");
                report.assigned.push(AssignedRecord {
                    key: key.to_string(),
                    assignee: member.clone(),
                    dry_run: self.options.dry_run,
                });
            }
        }
        Ok(())
    }

    fn transition_items<T: Tracker + ?Sized>(
        &self,
        plan: &Plan,
        tracker: &mut T,
        report: &mut ExecutionReport,
    ) -> Result<(), TrackerError> {
        let backlog = plan
            .sections
            .categorized()
            .filter(|item| item.item.status_stage() == Some(Status::Backlog));

        for item in backlog {
            let Some(key) = item.key() else {
                continue;
            };
            if !self.options.dry_run {
                if let Err(err) = tracker.transition_to_initial(key) {
                    report.fail(ActionKind::Transition, key, err)?;
                    continue;
                }
            }
            info!(%key, dry_run = self.options.dry_run, "transitioned");
            report.transitioned.push(TransitionRecord {
                key: key.to_string(),
                from: Status::Backlog.label().to_string(),
                to: INITIAL_STATUS.to_string(),
                dry_run: self.options.dry_run,
            });
        }
        Ok(())
    }

    fn create_items<T: Tracker + ?Sized>(
        &self,
        plan: &Plan,
        tracker: &mut T,
        report: &mut ExecutionReport,
    ) -> Result<(), TrackerError> {
        for item in &plan.unassigned {
            if let Some(key) = item.key() {
                report.skip(ActionKind::Create, key, "already exists in tracker");
                continue;
            }
            let summary = item.item.summary.trim();
            if summary.is_empty() {
                report.skip(ActionKind::Create, "-", "no summary");
                continue;
            }
            let Some(project) = self.project_for(item) else {
                report.skip(ActionKind::Create, summary, "no project");
                continue;
            };
            let item_type = if item.item.item_type.trim().is_empty() {
                "Story"
            } else {
                item.item.item_type.as_str()
            };

            let key = if self.options.dry_run {
                None
            } else {
                match tracker.create(&project, summary, item_type) {
                    Ok(key) => key,
                    Err(err) => {
                        report.fail(ActionKind::Create, summary, err)?;
                        continue;
                    }
                }
            };
            info!(%project, ?key, dry_run = self.options.dry_run, "created");
            report.created.push(CreatedRecord {
                key,
                project,
                summary: summary.to_string(),
                dry_run: self.options.dry_run,
            });
        }
        Ok(())
    }

    /// The item's own project, else the configured default.
    fn project_for(&self, item: &ScoredItem) -> Option<String> {
        let project = item.item.project.trim();
        if project.is_empty() {
            self.default_project.clone()
        } else {
            Some(project.to_string())
        }
    }
}

/// [`Tracker`] over a planning snapshot held in memory.
///
/// Account ids are member names. Mutations edit the snapshot, which the
/// caller may save back to disk.
#[derive(Debug)]
pub struct SnapshotTracker<'a> {
    snapshot: &'a mut PlanningSnapshot,
}

impl<'a> SnapshotTracker<'a> {
    pub fn new(snapshot: &'a mut PlanningSnapshot) -> Self {
        Self { snapshot }
    }

    fn find(&mut self, key: &str) -> Option<&mut RawItem> {
        self.snapshot
            .items_mut()
            .map(|(_, item)| item)
            .find(|item| item.key.as_deref() == Some(key))
    }

    fn knows_member(&self, name: &str) -> bool {
        if self.snapshot.roster.iter().any(|m| m.name == name) {
            return true;
        }
        self.snapshot
            .active_items
            .iter()
            .chain(self.snapshot.backlog.iter())
            .flat_map(|(project, items)| items.iter().map(move |i| i.to_work_item(project)))
            .filter_map(|item| item.assignee)
            .any(|assignee| assignee == name)
    }

    /// Next free `PROJECT-N` key.
    fn next_key(&self, project: &str) -> String {
        let prefix = format!("{project}-");
        let highest = self
            .snapshot
            .active_items
            .values()
            .chain(self.snapshot.backlog.values())
            .chain(self.snapshot.carry_over.values())
            .flatten()
            .filter_map(|item| item.key.as_deref())
            .filter_map(|key| key.strip_prefix(&prefix))
            .filter_map(|n| n.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        format!("{prefix}{}", highest + 1)
    }
}

impl Tracker for SnapshotTracker<'_> {
    fn resolve_account(&mut self, name: &str) -> Result<String, TrackerError> {
        if self.knows_member(name) {
            Ok(name.to_string())
        } else {
            Err(TrackerError::NotFound(format!("no account for {name}")))
        }
    }

    fn assign(&mut self, key: &str, account: &str) -> Result<(), TrackerError> {
        let item = self
            .find(key)
            .ok_or_else(|| TrackerError::NotFound(key.to_string()))?;
        item.assignee = Some(Value::String(account.to_string()));
        Ok(())
    }

    fn transition_to_initial(&mut self, key: &str) -> Result<(), TrackerError> {
        let item = self
            .find(key)
            .ok_or_else(|| TrackerError::NotFound(key.to_string()))?;
        let is_backlog = item
            .status
            .as_deref()
            .and_then(Status::parse)
            .is_some_and(|s| s == Status::Backlog);
        if !is_backlog {
            return Err(TrackerError::NoTransition(key.to_string()));
        }
        item.status = Some(INITIAL_STATUS.to_string());
        Ok(())
    }

    fn create(
        &mut self,
        project: &str,
        summary: &str,
        item_type: &str,
    ) -> Result<Option<String>, TrackerError> {
        let key = self.next_key(project);
        self.snapshot
            .backlog
            .entry(project.to_string())
            .or_default()
            .push(RawItem {
                key: Some(key.clone()),
                summary: Some(summary.to_string()),
                item_type: Some(item_type.to_string()),
                status: Some(INITIAL_STATUS.to_string()),
                project: Some(project.to_string()),
                ..RawItem::default()
            });
        Ok(Some(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capacity::{CapacityModel, Member};
    use crate::item::WorkItem;
    use crate::planner::AllocationPlanner;
    use crate::scoring::ItemScorer;
    use serde_json::json;

    fn plan_for(items: &[WorkItem], roster: &[Member]) -> Plan {
        let capacity = CapacityModel::new().assess(roster, &[]);
        let scored = ItemScorer::new().rank(items, &[], &[]);
        let mut velocity = indexmap::IndexMap::new();
        velocity.insert(
            "A".to_string(),
            crate::velocity::VelocityModel::new().calculate_project(&[
                crate::velocity::PeriodRecord::new(20, vec![]),
            ]),
        );
        AllocationPlanner::new().generate(&scored, &capacity, &velocity)
    }

    /// Records calls and fails on chosen keys.
    #[derive(Default)]
    struct MockTracker {
        calls: Vec<String>,
        reject: Vec<String>,
        offline: bool,
    }

    impl MockTracker {
        fn check(&mut self, call: String, target: &str) -> Result<(), TrackerError> {
            self.calls.push(call);
            if self.offline {
                return Err(TrackerError::Unavailable("connection refused".into()));
            }
            if self.reject.iter().any(|r| r == target) {
                return Err(TrackerError::Rejected(format!("{target} is locked")));
            }
            Ok(())
        }
    }

    impl Tracker for MockTracker {
        fn resolve_account(&mut self, name: &str) -> Result<String, TrackerError> {
            self.check(format!("resolve {name}"), name)?;
            Ok(format!("acct-{}", name.to_lowercase()))
        }

        fn assign(&mut self, key: &str, account: &str) -> Result<(), TrackerError> {
            self.check(format!("assign {key} {account}"), key)
        }

        fn transition_to_initial(&mut self, key: &str) -> Result<(), TrackerError> {
            self.check(format!("transition {key}"), key)
        }

        fn create(
            &mut self,
            project: &str,
            summary: &str,
            _item_type: &str,
        ) -> Result<Option<String>, TrackerError> {
            self.check(format!("create {project} {summary}"), summary)?;
            Ok(Some(format!("{project}-100")))
        }
    }

    #[test]
    fn test_assigns_bucket_items_with_resolved_accounts() {
        let items = vec![
            WorkItem::new("A-1", "one").with_priority("Highest"),
            WorkItem::new("A-2", "two").with_priority("High"),
        ];
        let plan = plan_for(&items, &[Member::new("Dana"), Member::new("Fox")]);
        let mut tracker = MockTracker::default();

        let report = SprintExecutor::new(ExecuteOptions::default())
            .execute(&plan, &mut tracker)
            .unwrap();

        assert_eq!(report.assigned.len(), 2);
        assert!(tracker.calls.contains(&"assign A-1 acct-dana".to_string()));
        assert!(tracker.calls.contains(&"assign A-2 acct-fox".to_string()));
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_dry_run_makes_no_mutations() {
        let items = vec![
            WorkItem::new("A-1", "one").with_status("Backlog"),
            WorkItem {
                key: None,
                ..WorkItem::new("", "brand new").with_project("A")
            },
        ];
        let plan = plan_for(&items, &[Member::new("Dana")]);
        let mut tracker = MockTracker::default();
        let options = ExecuteOptions {
            assign: true,
            create_new: true,
            transition: true,
            dry_run: true,
        };

        let report = SprintExecutor::new(options)
            .execute(&plan, &mut tracker)
            .unwrap();

        assert!(report.dry_run);
        assert!(tracker.calls.iter().all(|c| c.starts_with("resolve")));
        assert!(report.assigned.iter().all(|r| r.dry_run));
        assert_eq!(report.transitioned.len(), 1);
    }

    #[test]
    fn test_item_failure_is_recorded_and_run_continues() {
        let items = vec![
            WorkItem::new("A-1", "one").with_priority("Highest"),
            WorkItem::new("A-2", "two").with_priority("High"),
        ];
        let plan = plan_for(&items, &[Member::new("Dana")]);
        let mut tracker = MockTracker {
            reject: vec!["A-1".into()],
            ..MockTracker::default()
        };

        let report = SprintExecutor::new(ExecuteOptions::default())
            .execute(&plan, &mut tracker)
            .unwrap();

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].action, ActionKind::Assign);
        assert_eq!(report.errors[0].target, "A-1");
        assert_eq!(report.assigned.len(), 1);
        assert_eq!(report.assigned[0].key, "A-2");
    }

    #[test]
    fn test_unavailable_tracker_aborts() {
        let plan = plan_for(&[WorkItem::new("A-1", "one")], &[Member::new("Dana")]);
        let mut tracker = MockTracker {
            offline: true,
            ..MockTracker::default()
        };
        let result = SprintExecutor::new(ExecuteOptions::default()).execute(&plan, &mut tracker);
        assert!(matches!(result, Err(TrackerError::Unavailable(_))));
        assert_eq!(tracker.calls.len(), 1);
    }

    #[test]
    fn test_already_assigned_items_are_skipped() {
        let items = vec![WorkItem::new("A-1", "one").with_assignee("Dana")];
        let plan = plan_for(&items, &[Member::new("Dana")]);
        let mut tracker = MockTracker::default();

        let report = SprintExecutor::new(ExecuteOptions::default())
            .execute(&plan, &mut tracker)
            .unwrap();

        assert!(report.assigned.is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert!(!tracker.calls.iter().any(|c| c.starts_with("assign")));
    }

    #[test]
    fn test_create_uses_item_project_then_default_project() {
        let keyless = |summary: &str, project: &str| WorkItem {
            key: None,
            ..WorkItem::new("", summary).with_project(project)
        };
        let items = vec![keyless("first", "OPS"), keyless("", "OPS"), keyless("orphan", "")];
        let plan = plan_for(&items, &[]);
        let options = ExecuteOptions {
            assign: false,
            create_new: true,
            ..ExecuteOptions::default()
        };

        let mut tracker = MockTracker::default();
        let report = SprintExecutor::new(options)
            .execute(&plan, &mut tracker)
            .unwrap();
        assert_eq!(report.created.len(), 1);
        assert_eq!(report.created[0].project, "OPS");
        assert_eq!(report.skipped.len(), 2);

        let mut tracker = MockTracker::default();
        let report = SprintExecutor::new(options)
            .with_default_project(Some("DATAG".into()))
            .execute(&plan, &mut tracker)
            .unwrap();
        let projects: Vec<_> = report.created.iter().map(|c| c.project.as_str()).collect();
        assert_eq!(projects, vec!["OPS", "DATAG"]);
        assert_eq!(report.created[1].key.as_deref(), Some("DATAG-100"));
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn test_snapshot_tracker_mutates_snapshot() {
        let mut snapshot: PlanningSnapshot = serde_json::from_value(json!({
            "roster": [{"name": "Dana"}],
            "active_items": {"OPS": [{"key": "OPS-7", "status": "Backlog"}]},
            "backlog": {"OPS": [{"key": "OPS-12", "status": "To Do"}]}
        }))
        .unwrap();

        let mut tracker = SnapshotTracker::new(&mut snapshot);
        assert_eq!(tracker.resolve_account("Dana").unwrap(), "Dana");
        assert!(matches!(
            tracker.resolve_account("Nobody"),
            Err(TrackerError::NotFound(_))
        ));
        tracker.assign("OPS-7", "Dana").unwrap();
        tracker.transition_to_initial("OPS-7").unwrap();
        assert_eq!(
            tracker.transition_to_initial("OPS-12"),
            Err(TrackerError::NoTransition("OPS-12".into()))
        );
        assert_eq!(
            tracker.create("OPS", "Write runbook", "Task").unwrap().as_deref(),
            Some("OPS-13")
        );

        let item = &snapshot.active_items["OPS"][0];
        assert_eq!(item.assignee, Some(json!("Dana")));
        assert_eq!(item.status.as_deref(), Some("To Do"));
        assert_eq!(snapshot.backlog["OPS"].len(), 2);
        assert_eq!(snapshot.backlog["OPS"][1].summary.as_deref(), Some("Write runbook"));
    }
}
