//! Capacity-aware allocation planner.
//!
//! Turns ranked items into a [`Plan`]:
//!
//! 1. derive an item budget from velocity (`round(Σ avg items × 1.1)`,
//!    capped at the candidate count),
//! 2. open one bucket per available member,
//! 3. walk the ranked items once, categorizing each as carry-over,
//!    committed, new work or stretch and placing every non-stretch item
//!    with its assignee, the least-loaded member, or in overflow/unassigned,
//! 4. synthesize a goal sentence from the section sizes.
//!
//! The walk is a fold over [`PassState`], which each step consumes and
//! returns, so a pass can be replayed from any prefix of the input.

mod plan;

pub use plan::{Assignment, Category, Plan, Sections};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::capacity::CapacityAssessment;
use crate::scoring::ScoredItem;
use crate::velocity::{total_avg_items, VelocityRecord};

/// Tunables of the planner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlannerPolicy {
    /// Maximum items one member can hold
    #[serde(default = "default_max_items_per_person")]
    pub max_items_per_person: usize,
    /// Margin above average throughput used for the item budget
    #[serde(default = "default_budget_stretch_factor")]
    pub budget_stretch_factor: f64,
}

fn default_max_items_per_person() -> usize {
    6
}
fn default_budget_stretch_factor() -> f64 {
    1.1
}

impl Default for PlannerPolicy {
    fn default() -> Self {
        Self {
            max_items_per_person: default_max_items_per_person(),
            budget_stretch_factor: default_budget_stretch_factor(),
        }
    }
}

/// Where a categorized item ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    Member(String),
    Overflow,
    Unassigned,
}

/// Running state of a planning pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassState {
    /// Non-stretch items seen so far
    pub categorized: usize,
    pub total_points: f64,
    pub sections: Sections,
    pub assignments: IndexMap<String, Assignment>,
    pub unassigned: Vec<ScoredItem>,
    pub overflow: Vec<ScoredItem>,
}

impl PassState {
    /// Open one empty bucket per available member, in roster order.
    pub fn open(capacity: &CapacityAssessment) -> Self {
        let assignments = capacity
            .available()
            .map(|m| (m.name.clone(), Assignment::new(m.estimated_capacity)))
            .collect();
        Self {
            assignments,
            ..Self::default()
        }
    }

    /// Consume the state and return it advanced by one item.
    pub fn step(self, item: &ScoredItem, budget: usize, cap: usize) -> Self {
        let PassState {
            categorized,
            total_points,
            sections,
            mut assignments,
            mut unassigned,
            mut overflow,
        } = self;

        let category = categorize(item, categorized, budget);
        let sections = sections.push(category, item.clone());
        if category == Category::Stretch {
            return PassState {
                categorized,
                total_points,
                sections,
                assignments,
                unassigned,
                overflow,
            };
        }

        let placement = place(&assignments, item, cap);
        debug!(key = item.key().unwrap_or("-"), ?category, ?placement, "item placed");
        match placement {
            Placement::Member(name) => {
                if let Some(bucket) = assignments.get_mut(&name) {
                    bucket.push(item.clone());
                }
            }
            Placement::Overflow => overflow.push(item.clone()),
            Placement::Unassigned => unassigned.push(item.clone()),
        }

        PassState {
            categorized: categorized + 1,
            total_points: total_points + item.story_points(),
            sections,
            assignments,
            unassigned,
            overflow,
        }
    }

    /// Close the pass into a plan.
    pub fn finish(self, item_budget: usize) -> Plan {
        Plan {
            goal: synthesize_goal(&self.sections),
            total_items: self.categorized,
            total_points: self.total_points,
            item_budget,
            assignments: self.assignments,
            unassigned: self.unassigned,
            overflow: self.overflow,
            sections: self.sections,
        }
    }
}

/// First matching category: carry-over, committed, new work while under
/// budget, otherwise stretch.
pub fn categorize(item: &ScoredItem, categorized: usize, budget: usize) -> Category {
    if item.is_carry_over {
        Category::CarryOver
    } else if item.matches_commitment {
        Category::Committed
    } else if categorized < budget {
        Category::NewWork
    } else {
        Category::Stretch
    }
}

/// Choose a bucket for a categorized item.
///
/// An assignee who owns a bucket keeps the item unless the bucket is at the
/// cap, in which case it overflows. Anyone else's item goes to the
/// least-loaded bucket below the cap; equal loads resolve to the member
/// registered first.
pub fn place(assignments: &IndexMap<String, Assignment>, item: &ScoredItem, cap: usize) -> Placement {
    if let Some(name) = item.item.assignee.as_deref() {
        if let Some(bucket) = assignments.get(name) {
            return if bucket.load() < cap {
                Placement::Member(name.to_string())
            } else {
                Placement::Overflow
            };
        }
    }

    assignments
        .iter()
        .filter(|(_, bucket)| bucket.load() < cap)
        .min_by_key(|(_, bucket)| bucket.load())
        .map(|(name, _)| Placement::Member(name.clone()))
        .unwrap_or(Placement::Unassigned)
}

/// Goal sentence from the non-empty sections.
pub fn synthesize_goal(sections: &Sections) -> String {
    let mut goals = Vec::new();
    if !sections.carry_over.is_empty() {
        goals.push(format!("Complete {} carry-over items", sections.carry_over.len()));
    }
    if !sections.committed.is_empty() {
        goals.push(format!("Deliver {} committed items", sections.committed.len()));
    }
    goals.push(format!("Execute {} new tasks", sections.new_work.len()));
    goals.join("; ")
}

/// Greedy allocation of ranked items to members.
#[derive(Debug, Clone, Default)]
pub struct AllocationPlanner {
    policy: PlannerPolicy,
}

impl AllocationPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: PlannerPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PlannerPolicy {
        &self.policy
    }

    /// `round(Σ avg items × stretch factor)`, capped at `candidates`.
    pub fn item_budget(&self, candidates: usize, velocity: &IndexMap<String, VelocityRecord>) -> usize {
        let target = (total_avg_items(velocity) * self.policy.budget_stretch_factor).round();
        (target.max(0.0) as usize).min(candidates)
    }

    /// Build the plan from items already ranked by [`crate::scoring::ItemScorer`].
    pub fn generate(
        &self,
        scored: &[ScoredItem],
        capacity: &CapacityAssessment,
        velocity: &IndexMap<String, VelocityRecord>,
    ) -> Plan {
        let budget = self.item_budget(scored.len(), velocity);
        let cap = self.policy.max_items_per_person;

        let plan = scored
            .iter()
            .fold(PassState::open(capacity), |state, item| state.step(item, budget, cap))
            .finish(budget);

        info!(
            budget,
            total_items = plan.total_items,
            total_points = plan.total_points,
            stretch = plan.sections.stretch.len(),
            unassigned = plan.unassigned.len(),
            overflow = plan.overflow.len(),
            "plan generated"
        );
        plan
    }
}
