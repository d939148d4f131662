//! Allocation engine facade.
//!
//! Runs velocity estimation, capacity assessment, scoring and planning in
//! order over one set of [`PlanningInputs`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::capacity::{CapacityAssessment, CapacityModel, CapacitySummary};
use crate::ingest::PlanningInputs;
use crate::planner::{AllocationPlanner, Plan};
use crate::scoring::{ItemScorer, ScoredItem};
use crate::storage::Config;
use crate::velocity::{VelocityModel, VelocityRecord};

/// Everything one planning run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanOutcome {
    pub velocity: IndexMap<String, VelocityRecord>,
    pub capacity: CapacityAssessment,
    pub summary: CapacitySummary,
    /// Candidates in ranked order
    pub scored: Vec<ScoredItem>,
    pub plan: Plan,
}

/// The four engine stages wired together.
#[derive(Debug, Clone, Default)]
pub struct SprintEngine {
    velocity: VelocityModel,
    capacity: CapacityModel,
    scorer: ItemScorer,
    planner: AllocationPlanner,
}

impl SprintEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an engine from the tunables in `config`.
    pub fn from_config(config: &Config) -> Self {
        Self {
            velocity: VelocityModel::with_thresholds(config.velocity),
            capacity: CapacityModel::with_policy(config.capacity.clone()),
            scorer: ItemScorer::with_weights(config.scoring),
            planner: AllocationPlanner::with_policy(config.planner),
        }
    }

    pub fn run(&self, inputs: &PlanningInputs) -> PlanOutcome {
        let velocity = self.velocity.calculate(&inputs.velocity_history);
        for (project, v) in &velocity {
            info!(
                project = %project,
                avg_items = v.avg_items_per_period,
                trend = ?v.trend,
                "velocity"
            );
        }

        let capacity = self.capacity.assess(&inputs.roster, &inputs.availability);
        let summary = self.capacity.summarize(&velocity, &capacity);
        info!(recommendation = %summary.recommendation, "capacity summarized");

        let scored = self
            .scorer
            .rank(&inputs.candidates, &inputs.carry_over, &inputs.commitments);
        info!(scored = scored.len(), "candidates ranked");

        let plan = self.planner.generate(&scored, &capacity, &velocity);
        info!(goal = %plan.goal, "planning run finished");

        PlanOutcome {
            velocity,
            capacity,
            summary,
            scored,
            plan,
        }
    }
}
