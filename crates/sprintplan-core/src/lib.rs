//! # Sprintplan Core Library
//!
//! This library turns raw work-item and team-state data into an allocation
//! plan for a fixed-length work period: which items are in scope, why, and
//! who should do them. The `sprintplan` CLI is a thin layer over it.
//!
//! ## Architecture
//!
//! - **Velocity**: average throughput and trend per project from completed periods
//! - **Capacity**: roster assessment against free-text availability notices
//! - **Scoring**: additive multi-factor score for every candidate item
//! - **Planner**: deterministic greedy allocation under a per-member cap
//! - **Ingest**: planning snapshot files into typed engine inputs
//! - **Executor**: plan application through the [`Tracker`] trait
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`SprintEngine`]: runs the four stages in order
//! - [`Plan`]: sections, member buckets, unassigned and overflow items
//! - [`PlanningSnapshot`]: inbound data contract
//! - [`Config`]: application configuration management

pub mod capacity;
pub mod commitment;
pub mod engine;
pub mod error;
pub mod executor;
pub mod ingest;
pub mod item;
pub mod planner;
pub mod report;
pub mod scoring;
pub mod storage;
pub mod velocity;

pub use capacity::{
    AvailabilitySignal, CapacityAssessment, CapacityModel, CapacityPolicy, CapacitySummary, Member,
    MemberCapacity, Recommendation,
};
pub use commitment::{parse_commitments, Commitment, CommitmentPriority};
pub use engine::{PlanOutcome, SprintEngine};
pub use error::{ConfigError, CoreError, IngestError, TrackerError};
pub use executor::{ExecuteOptions, ExecutionReport, SnapshotTracker, SprintExecutor, Tracker};
pub use ingest::{IngestLimits, Ingestor, PlanningInputs, PlanningSnapshot, RawItem};
pub use item::{Priority, Status, WorkItem};
pub use planner::{AllocationPlanner, Assignment, Category, Plan, PlannerPolicy, Sections};
pub use scoring::{ItemScorer, ScoredItem, ScoringWeights};
pub use storage::Config;
pub use velocity::{PeriodRecord, Trend, TrendThresholds, VelocityModel, VelocityRecord};
