//! Plan structure produced by the allocation planner.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::scoring::ScoredItem;

/// Items given to one member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub items: Vec<ScoredItem>,
    pub total_points: f64,
    /// Estimated capacity of the member, in points
    pub capacity: u32,
}

impl Assignment {
    pub fn new(capacity: u32) -> Self {
        Self {
            items: Vec::new(),
            total_points: 0.0,
            capacity,
        }
    }

    pub fn load(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn push(&mut self, item: ScoredItem) {
        self.total_points += item.story_points();
        self.items.push(item);
    }
}

/// Why an item is in the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    CarryOver,
    Committed,
    NewWork,
    Stretch,
}

/// Items grouped by category. Every considered item is in exactly one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sections {
    pub carry_over: Vec<ScoredItem>,
    pub committed: Vec<ScoredItem>,
    pub new_work: Vec<ScoredItem>,
    pub stretch: Vec<ScoredItem>,
}

impl Sections {
    pub(crate) fn push(mut self, category: Category, item: ScoredItem) -> Self {
        match category {
            Category::CarryOver => self.carry_over.push(item),
            Category::Committed => self.committed.push(item),
            Category::NewWork => self.new_work.push(item),
            Category::Stretch => self.stretch.push(item),
        }
        self
    }

    pub fn get(&self, category: Category) -> &[ScoredItem] {
        match category {
            Category::CarryOver => &self.carry_over,
            Category::Committed => &self.committed,
            Category::NewWork => &self.new_work,
            Category::Stretch => &self.stretch,
        }
    }

    /// Carry-over, committed and new work, in that order.
    pub fn categorized(&self) -> impl Iterator<Item = &ScoredItem> {
        self.carry_over
            .iter()
            .chain(self.committed.iter())
            .chain(self.new_work.iter())
    }

    pub fn categorized_len(&self) -> usize {
        self.carry_over.len() + self.committed.len() + self.new_work.len()
    }
}

/// The allocation plan for the upcoming sprint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub goal: String,
    /// Categorized (non-stretch) items counted during the pass
    pub total_items: usize,
    pub total_points: f64,
    /// Item budget derived from velocity
    pub item_budget: usize,
    /// Member name to assigned items, in member registration order
    pub assignments: IndexMap<String, Assignment>,
    /// Categorized items no member could take
    pub unassigned: Vec<ScoredItem>,
    /// Categorized items whose assignee was already at the cap
    pub overflow: Vec<ScoredItem>,
    pub sections: Sections,
}

impl Plan {
    /// Number of items sitting in member buckets.
    pub fn assigned_count(&self) -> usize {
        self.assignments.values().map(Assignment::load).sum()
    }

    /// Items in member buckets, unassigned or overflow.
    pub fn placed_count(&self) -> usize {
        self.assigned_count() + self.unassigned.len() + self.overflow.len()
    }

    /// Items in member buckets, unassigned, then overflow.
    pub fn placed_items(&self) -> impl Iterator<Item = &ScoredItem> {
        self.assignments
            .values()
            .flat_map(|a| a.items.iter())
            .chain(self.unassigned.iter())
            .chain(self.overflow.iter())
    }
}
