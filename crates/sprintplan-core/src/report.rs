//! Markdown rendering of plans and execution reports.
//!
//! Both renderers are pure: the reference date is passed in so the same
//! inputs always give the same document.

use chrono::{Datelike, Duration, NaiveDate};

use crate::engine::PlanOutcome;
use crate::executor::ExecutionReport;
use crate::scoring::ScoredItem;
use crate::storage::ReportConfig;
use crate::velocity::{round1, Trend};

const ITEM_SUMMARY_WIDTH: usize = 55;
const ASSIGNMENT_SUMMARY_WIDTH: usize = 60;
const CREATED_SUMMARY_WIDTH: usize = 50;
const ERROR_MESSAGE_WIDTH: usize = 60;
const HIGH_CARRY_OVER: usize = 3;

/// First `max` characters of `text`.
pub fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Sprint start (the Monday after `today`) and end (`length_days - 1` later).
pub fn sprint_period(today: NaiveDate, length_days: u32) -> (NaiveDate, NaiveDate) {
    let days_to_monday = 7 - i64::from(today.weekday().num_days_from_monday());
    let start = today + Duration::days(days_to_monday);
    let end = start + Duration::days(i64::from(length_days.max(1)) - 1);
    (start, end)
}

fn points_cell(points: f64) -> String {
    if points > 0.0 {
        round1(points).to_string()
    } else {
        "-".to_string()
    }
}

fn or_dash(text: &str) -> &str {
    if text.trim().is_empty() {
        "-"
    } else {
        text
    }
}

fn item_table(out: &mut String, items: &[ScoredItem]) {
    out.push_str("| # | Item | Summary | Type | Priority | Points | Score | Reason |\n");
    out.push_str("|---|------|---------|------|----------|--------|-------|--------|\n");
    for (i, scored) in items.iter().enumerate() {
        let item = &scored.item;
        let reason = scored.top_term().map_or("-", |t| t.name.as_str());
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} |\n",
            i + 1,
            item.display_key(),
            truncate(&item.summary, ITEM_SUMMARY_WIDTH),
            or_dash(&item.item_type),
            or_dash(&item.priority),
            points_cell(item.story_points),
            scored.score,
            reason
        ));
    }
}

/// Render a planning run as a markdown document.
pub fn render_plan(outcome: &PlanOutcome, settings: &ReportConfig, today: NaiveDate) -> String {
    let PlanOutcome {
        velocity,
        capacity,
        plan,
        ..
    } = outcome;
    let sections = &plan.sections;
    let (start, end) = sprint_period(today, settings.sprint_length_days);
    let mut out = String::new();

    out.push_str("# Sprint Plan\n");
    out.push_str(&format!("**Generated:** {}\n", today.format("%A, %B %-d, %Y")));
    out.push_str(&format!(
        "**Sprint Period:** {} - {}\n\n",
        start.format("%b %-d, %Y"),
        end.format("%b %-d, %Y")
    ));

    out.push_str("## Sprint Goal\n");
    out.push_str(&format!("{}\n\n", plan.goal));

    out.push_str("## Executive Summary\n");
    out.push_str("| Metric | Value |\n|--------|-------|\n");
    out.push_str(&format!("| Total Items | {} |\n", plan.total_items));
    out.push_str(&format!("| Total Story Points | {} |\n", round1(plan.total_points)));
    out.push_str(&format!(
        "| Team Members Available | {} / {} |\n",
        capacity.available_count(),
        capacity.total_members
    ));
    out.push_str(&format!("| Item Budget | {} |\n", plan.item_budget));
    out.push_str(&format!("| Carry-Over Items | {} |\n", sections.carry_over.len()));
    out.push_str(&format!("| Committed Items | {} |\n", sections.committed.len()));
    out.push_str(&format!("| New Work | {} |\n", sections.new_work.len()));
    out.push_str(&format!("| Stretch Goals | {} |\n\n", sections.stretch.len()));

    out.push_str("## Team Velocity\n");
    out.push_str("| Project | Avg Items/Period | Avg Points/Period | Trend |\n");
    out.push_str("|---------|------------------|-------------------|-------|\n");
    for (project, v) in velocity {
        out.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            project,
            v.avg_items_per_period,
            v.avg_points_per_period,
            v.trend.marker()
        ));
    }
    out.push('\n');

    out.push_str("## Team Capacity\n");
    if !capacity.unavailable_members.is_empty() {
        out.push_str(&format!(
            "**Unavailable Members:** {}\n\n",
            capacity.unavailable_members.join(", ")
        ));
    }
    out.push_str("| Member | Projects | Current Load | Capacity | Status |\n");
    out.push_str("|--------|----------|--------------|----------|--------|\n");
    for m in &capacity.members {
        let status = if m.is_unavailable { "Unavailable" } else { "Available" };
        out.push_str(&format!(
            "| {} | {} | {} items | {} pts | {} |\n",
            m.name,
            m.projects.join(", "),
            m.current_tickets,
            m.estimated_capacity,
            status
        ));
    }
    out.push('\n');

    let blocks = [
        (
            &sections.carry_over,
            "## Carry-Over Items (Must Complete)",
            "These items are rolling over from the previous sprint and should be prioritized.",
        ),
        (
            &sections.committed,
            "## Committed Items",
            "These items match documented team commitments.",
        ),
        (
            &sections.new_work,
            "## New Work",
            "New items prioritized for this sprint based on score.",
        ),
    ];
    for (items, heading, blurb) in blocks {
        if items.is_empty() {
            continue;
        }
        out.push_str(&format!("{heading}\n{blurb}\n\n"));
        item_table(&mut out, items);
        out.push('\n');
    }

    out.push_str("## Sprint Assignments\n");
    for (name, assignment) in &plan.assignments {
        out.push_str(&format!("### {name}\n"));
        out.push_str(&format!(
            "**Assigned:** {} items | **Points:** {} / {}\n",
            assignment.load(),
            round1(assignment.total_points),
            assignment.capacity
        ));
        if assignment.items.is_empty() {
            out.push_str("*No items assigned yet*\n");
        } else {
            out.push_str("\n| Item | Summary | Priority | Points | Score |\n");
            out.push_str("|------|---------|----------|--------|-------|\n");
            for scored in &assignment.items {
                let item = &scored.item;
                out.push_str(&format!(
                    "| {} | {} | {} | {} | {} |\n",
                    item.display_key(),
                    truncate(&item.summary, ASSIGNMENT_SUMMARY_WIDTH),
                    or_dash(&item.priority),
                    points_cell(item.story_points),
                    scored.score
                ));
            }
        }
        out.push('\n');
    }

    if !sections.stretch.is_empty() {
        out.push_str("## Stretch Goals (If Capacity Allows)\n");
        let shown = sections.stretch.len().min(settings.stretch_display_limit);
        item_table(&mut out, &sections.stretch[..shown]);
        out.push('\n');
    }

    if !plan.unassigned.is_empty() || !plan.overflow.is_empty() {
        out.push_str("## Unassigned / Overflow\n");
        out.push_str("These items need manual assignment or should be moved to the next sprint.\n\n");
        let leftover: Vec<ScoredItem> = plan
            .unassigned
            .iter()
            .chain(plan.overflow.iter())
            .cloned()
            .collect();
        item_table(&mut out, &leftover);
        out.push('\n');
    }

    out.push_str("## Risks & Notes\n");
    if !capacity.unavailable_members.is_empty() {
        out.push_str(&format!(
            "- **Reduced Capacity:** {} team member(s) unavailable\n",
            capacity.unavailable_members.len()
        ));
    }
    if sections.carry_over.len() > HIGH_CARRY_OVER {
        out.push_str(&format!(
            "- **High Carry-Over:** {} items rolling over indicates possible under-estimation\n",
            sections.carry_over.len()
        ));
    }
    for (project, v) in velocity {
        if v.trend == Trend::Declining {
            out.push_str(&format!(
                "- **Declining Velocity in {project}:** Investigate blockers or scope creep\n"
            ));
        }
    }
    if !plan.overflow.is_empty() {
        out.push_str(&format!(
            "- **Overflow:** {} items could not be assigned due to capacity limits\n",
            plan.overflow.len()
        ));
    }

    out.push_str("\n---\n*Generated by sprintplan*\n");
    out
}

fn status_cell(dry_run: bool, done: &'static str) -> &'static str {
    if dry_run {
        "DRY RUN"
    } else {
        done
    }
}

/// Render an execution report as a markdown document.
pub fn render_execution(report: &ExecutionReport) -> String {
    let mut out = String::new();
    out.push_str("# Sprint Execution Report\n");
    out.push_str(&format!(
        "**Executed:** {}\n",
        report.executed_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if report.dry_run {
        out.push_str("**Mode:** DRY RUN (no changes made)\n");
    }
    out.push('\n');

    if !report.assigned.is_empty() {
        out.push_str("## Item Assignments\n");
        out.push_str("| Item | Assigned To | Status |\n|------|-------------|--------|\n");
        for r in &report.assigned {
            out.push_str(&format!(
                "| {} | {} | {} |\n",
                r.key,
                r.assignee,
                status_cell(r.dry_run, "Done")
            ));
        }
        out.push('\n');
    }

    if !report.transitioned.is_empty() {
        out.push_str("## Status Transitions\n");
        out.push_str("| Item | From | To | Status |\n|------|------|----|--------|\n");
        for r in &report.transitioned {
            out.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                r.key,
                r.from,
                r.to,
                status_cell(r.dry_run, "Done")
            ));
        }
        out.push('\n');
    }

    if !report.created.is_empty() {
        out.push_str("## Items Created\n");
        out.push_str("| Key | Project | Summary | Status |\n|-----|---------|---------|--------|\n");
        for r in &report.created {
            out.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                r.key.as_deref().unwrap_or("-"),
                r.project,
                truncate(&r.summary, CREATED_SUMMARY_WIDTH),
                status_cell(r.dry_run, "Created")
            ));
        }
        out.push('\n');
    }

    if !report.skipped.is_empty() {
        out.push_str("## Skipped\n");
        out.push_str("| Action | Target | Reason |\n|--------|--------|--------|\n");
        for s in &report.skipped {
            out.push_str(&format!("| {} | {} | {} |\n", s.action, s.target, s.reason));
        }
        out.push('\n');
    }

    if !report.errors.is_empty() {
        out.push_str("## Errors\n");
        out.push_str("| Action | Target | Error |\n|--------|--------|-------|\n");
        for e in &report.errors {
            out.push_str(&format!(
                "| {} | {} | {} |\n",
                e.action,
                e.target,
                truncate(&e.message, ERROR_MESSAGE_WIDTH)
            ));
        }
        out.push('\n');
    }

    out.push_str("---\n*Generated by sprintplan*\n");
    out
}
