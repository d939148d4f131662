//! Multi-factor item scoring.
//!
//! Each candidate item gets an additive score built from independent
//! terms. Every term is recorded in a breakdown so a ranking can be
//! explained after the fact.
//!
//! | Term | Contribution |
//! |------|--------------|
//! | priority | Highest 5, High 4, Medium 3, Low 2, Lowest 1, unknown 2 |
//! | status | In Progress 3, In Review 2.5, To Do 1, Backlog 0.5, unknown 1 |
//! | carry_over | +3 when the item rolled over from the previous sprint |
//! | commitment | +2 when the summary mentions a commitment keyword |
//! | defect | +1.5 for bugs |
//! | size | `min(points / 3, 2)` when points > 0 |

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::commitment::Commitment;
use crate::item::{Priority, Status, WorkItem};
use crate::velocity::round1;

/// One named contribution to an item score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreTerm {
    pub name: String,
    pub value: f64,
}

impl ScoreTerm {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// A work item annotated with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    #[serde(flatten)]
    pub item: WorkItem,
    /// Composite score, one decimal
    pub score: f64,
    pub is_carry_over: bool,
    pub matches_commitment: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub breakdown: Vec<ScoreTerm>,
}

impl ScoredItem {
    pub fn key(&self) -> Option<&str> {
        self.item.key.as_deref()
    }

    pub fn story_points(&self) -> f64 {
        self.item.story_points
    }

    /// Get the top contributing term
    pub fn top_term(&self) -> Option<&ScoreTerm> {
        self.breakdown
            .iter()
            .max_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal))
    }
}

/// Term values of the scoring function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub priority_highest: f64,
    pub priority_high: f64,
    pub priority_medium: f64,
    pub priority_low: f64,
    pub priority_lowest: f64,
    pub priority_unknown: f64,
    pub status_in_progress: f64,
    pub status_in_review: f64,
    pub status_to_do: f64,
    pub status_backlog: f64,
    pub status_unknown: f64,
    pub carry_over_bonus: f64,
    pub commitment_bonus: f64,
    pub defect_bonus: f64,
    /// Points per unit of size bonus
    pub size_divisor: f64,
    pub size_cap: f64,
    /// Commitment words this short or shorter are ignored
    pub min_keyword_len: usize,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            priority_highest: 5.0,
            priority_high: 4.0,
            priority_medium: 3.0,
            priority_low: 2.0,
            priority_lowest: 1.0,
            priority_unknown: 2.0,
            status_in_progress: 3.0,
            status_in_review: 2.5,
            status_to_do: 1.0,
            status_backlog: 0.5,
            status_unknown: 1.0,
            carry_over_bonus: 3.0,
            commitment_bonus: 2.0,
            defect_bonus: 1.5,
            size_divisor: 3.0,
            size_cap: 2.0,
            min_keyword_len: 3,
        }
    }
}

impl ScoringWeights {
    pub fn priority(&self, priority: Option<Priority>) -> f64 {
        match priority {
            Some(Priority::Highest) => self.priority_highest,
            Some(Priority::High) => self.priority_high,
            Some(Priority::Medium) => self.priority_medium,
            Some(Priority::Low) => self.priority_low,
            Some(Priority::Lowest) => self.priority_lowest,
            None => self.priority_unknown,
        }
    }

    pub fn status(&self, status: Option<Status>) -> f64 {
        match status {
            Some(Status::InProgress) => self.status_in_progress,
            Some(Status::InReview) => self.status_in_review,
            Some(Status::ToDo) => self.status_to_do,
            Some(Status::Backlog) => self.status_backlog,
            None => self.status_unknown,
        }
    }

    /// Diminishing-returns bonus for larger items.
    pub fn size(&self, points: f64) -> f64 {
        if points > 0.0 && self.size_divisor > 0.0 {
            (points / self.size_divisor).min(self.size_cap)
        } else {
            0.0
        }
    }
}

/// Scores and ranks candidate items.
#[derive(Debug, Clone, Default)]
pub struct ItemScorer {
    weights: ScoringWeights,
}

impl ItemScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score every item and return them sorted by descending score.
    ///
    /// The sort is stable: items with equal scores keep their input order.
    pub fn rank(
        &self,
        items: &[WorkItem],
        carry_over: &[WorkItem],
        commitments: &[Commitment],
    ) -> Vec<ScoredItem> {
        let carry_keys: HashSet<&str> = carry_over.iter().filter_map(|i| i.key.as_deref()).collect();
        let keywords = self.commitment_keywords(commitments);

        let mut scored: Vec<ScoredItem> = items
            .iter()
            .map(|item| self.score_item(item, &carry_keys, &keywords))
            .collect();
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        debug!(items = scored.len(), "items scored and ranked");
        scored
    }

    /// Lower-cased keywords drawn from all commitments.
    pub fn commitment_keywords(&self, commitments: &[Commitment]) -> Vec<String> {
        commitments
            .iter()
            .flat_map(|c| c.keywords(self.weights.min_keyword_len))
            .collect()
    }

    /// Score one item against a carry-over key set and commitment keywords.
    pub fn score_item(
        &self,
        item: &WorkItem,
        carry_keys: &HashSet<&str>,
        keywords: &[String],
    ) -> ScoredItem {
        let w = &self.weights;
        let mut breakdown = vec![
            ScoreTerm::new("priority", w.priority(item.priority_level())),
            ScoreTerm::new("status", w.status(item.status_stage())),
        ];

        let is_carry_over = item
            .key
            .as_deref()
            .is_some_and(|key| carry_keys.contains(key));
        if is_carry_over {
            breakdown.push(ScoreTerm::new("carry_over", w.carry_over_bonus));
        }

        let summary = item.summary.to_lowercase();
        let matches_commitment = keywords.iter().any(|kw| summary.contains(kw.as_str()));
        if matches_commitment {
            breakdown.push(ScoreTerm::new("commitment", w.commitment_bonus));
        }

        if item.is_defect() {
            breakdown.push(ScoreTerm::new("defect", w.defect_bonus));
        }

        let size = w.size(item.story_points);
        if size > 0.0 {
            breakdown.push(ScoreTerm::new("size", size));
        }

        let total: f64 = breakdown.iter().map(|t| t.value).sum();

        ScoredItem {
            item: item.clone(),
            score: round1(total),
            is_carry_over,
            matches_commitment,
            breakdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn score_one(item: WorkItem) -> ScoredItem {
        ItemScorer::new().rank(&[item], &[], &[]).remove(0)
    }

    #[test]
    fn test_priority_term() {
        assert_eq!(score_one(WorkItem::new("A-1", "x").with_priority("Highest")).score, 6.0);
        assert_eq!(score_one(WorkItem::new("A-1", "x").with_priority("Lowest")).score, 2.0);
        // Unknown priority and unknown status fall back to 2 and 1
        assert_eq!(score_one(WorkItem::new("A-1", "x").with_priority("P0")).score, 3.0);
    }

    #[test]
    fn test_status_term() {
        let base = || WorkItem::new("A-1", "x").with_priority("Medium");
        assert_eq!(score_one(base().with_status("In Progress")).score, 6.0);
        assert_eq!(score_one(base().with_status("In Review")).score, 5.5);
        assert_eq!(score_one(base().with_status("To Do")).score, 4.0);
        assert_eq!(score_one(base().with_status("Backlog")).score, 3.5);
    }

    #[test]
    fn test_carry_over_bonus() {
        let item = WorkItem::new("A-1", "x").with_priority("Medium").with_status("To Do");
        let carry = vec![WorkItem::new("A-1", "")];
        let scored = ItemScorer::new().rank(&[item], &carry, &[]);
        assert!(scored[0].is_carry_over);
        assert_eq!(scored[0].score, 7.0);
    }

    #[test]
    fn test_keyless_item_is_never_carry_over() {
        let mut item = WorkItem::new("A-1", "x");
        item.key = None;
        let mut carry = WorkItem::new("A-1", "");
        carry.key = None;
        let scored = ItemScorer::new().rank(&[item], &[carry], &[]);
        assert!(!scored[0].is_carry_over);
    }

    #[test]
    fn test_commitment_bonus_uses_long_words_only() {
        let commitments = vec![Commitment::new("Ship the billing export")];
        let scorer = ItemScorer::new();

        let hit = WorkItem::new("A-1", "Billing: retry failed invoices");
        let miss = WorkItem::new("A-2", "Update the docs");
        let scored = scorer.rank(&[miss, hit], &[], &commitments);

        assert_eq!(scored[0].key(), Some("A-1"));
        assert!(scored[0].matches_commitment);
        assert_eq!(scored[0].score, 5.0);
        assert!(!scored[1].matches_commitment);
    }

    #[test]
    fn test_defect_and_size_terms() {
        let item = WorkItem::new("A-1", "x")
            .with_type("Bug")
            .with_priority("High")
            .with_status("To Do")
            .with_points(3.0);
        // 4 + 1 + 1.5 + 1
        assert_eq!(score_one(item).score, 7.5);

        let big = WorkItem::new("A-2", "x").with_priority("High").with_points(13.0);
        // 4 + 1 + capped 2
        assert_eq!(score_one(big).score, 7.0);
    }

    #[test]
    fn test_score_rounds_to_one_decimal() {
        let item = WorkItem::new("A-1", "x").with_priority("Medium").with_points(1.0);
        // 3 + 1 + 0.333..
        assert_eq!(score_one(item).score, 4.3);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let items: Vec<_> = ["A-1", "A-2", "A-3"]
            .iter()
            .map(|k| WorkItem::new(*k, "same").with_priority("High"))
            .collect();
        let scored = ItemScorer::new().rank(&items, &[], &[]);
        let keys: Vec<_> = scored.iter().filter_map(|s| s.key()).collect();
        assert_eq!(keys, vec!["A-1", "A-2", "A-3"]);
    }

    #[test]
    fn test_string_points_score_like_numbers() {
        let from_string: WorkItem =
            serde_json::from_value(json!({"key": "A-1", "summary": "x", "story_points": "5"}))
                .unwrap();
        let from_number: WorkItem =
            serde_json::from_value(json!({"key": "A-1", "summary": "x", "story_points": 5}))
                .unwrap();
        assert_eq!(score_one(from_string).score, score_one(from_number).score);
    }

    #[test]
    fn test_breakdown_explains_score() {
        let item = WorkItem::new("A-1", "x").with_type("Bug").with_priority("Highest");
        let scored = score_one(item);
        let names: Vec<_> = scored.breakdown.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["priority", "status", "defect"]);
        assert_eq!(scored.top_term().map(|t| t.name.as_str()), Some("priority"));
    }

    #[test]
    fn test_scoring_is_pure() {
        let items = vec![
            WorkItem::new("A-1", "billing").with_priority("High").with_points(2.0),
            WorkItem::new("A-2", "docs").with_type("Bug"),
        ];
        let commitments = vec![Commitment::new("billing revamp")];
        let scorer = ItemScorer::new();
        let first = scorer.rank(&items, &items[1..], &commitments);
        let second = scorer.rank(&items, &items[1..], &commitments);
        assert_eq!(first, second);
    }

    proptest! {
        #[test]
        fn prop_score_monotonic_in_priority(
            status in prop::sample::select(vec!["In Progress", "In Review", "To Do", "Backlog", "Done"]),
            item_type in prop::sample::select(vec!["Bug", "Story", "Task"]),
            points in 0.0f64..20.0,
        ) {
            let scores: Vec<f64> = Priority::ALL
                .iter()
                .map(|p| {
                    score_one(
                        WorkItem::new("A-1", "x")
                            .with_priority(p.label())
                            .with_status(status)
                            .with_type(item_type)
                            .with_points(points),
                    )
                    .score
                })
                .collect();
            for pair in scores.windows(2) {
                prop_assert!(pair[0] >= pair[1]);
            }
        }
    }
}
