//! Team capacity assessment.
//!
//! Capacity is binary per member: a member named in an availability signal
//! next to an out-of-office keyword contributes nothing, everyone else
//! contributes the default per-person capacity. Partial availability is not
//! modelled.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::velocity::{total_avg_items, Trend, VelocityRecord};

/// A team member as observed in the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    #[serde(default)]
    pub projects: Vec<String>,
    /// Items currently held by the member
    #[serde(default)]
    pub ticket_count: u32,
}

impl Member {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            projects: Vec::new(),
            ticket_count: 0,
        }
    }

    pub fn with_projects<I, S>(mut self, projects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projects = projects.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_ticket_count(mut self, count: u32) -> Self {
        self.ticket_count = count;
        self
    }
}

/// A free-text page that may announce absences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySignal {
    #[serde(default)]
    pub source: String,
    pub content: String,
}

impl AvailabilitySignal {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            source: String::new(),
            content: content.into(),
        }
    }
}

/// Tunables of the capacity model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityPolicy {
    /// Story points one available person absorbs per period
    #[serde(default = "default_points_per_person")]
    pub default_points_per_person: u32,
    /// Phrases that mark a signal as an absence notice (lower case)
    #[serde(default = "default_keywords")]
    pub unavailability_keywords: Vec<String>,
    /// Name tokens shorter than this never match
    #[serde(default = "default_min_name_token_len")]
    pub min_name_token_len: usize,
}

fn default_points_per_person() -> u32 {
    10
}
fn default_keywords() -> Vec<String> {
    ["ooo", "out of office", "vacation", "holiday"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_min_name_token_len() -> usize {
    3
}

impl Default for CapacityPolicy {
    fn default() -> Self {
        Self {
            default_points_per_person: default_points_per_person(),
            unavailability_keywords: default_keywords(),
            min_name_token_len: default_min_name_token_len(),
        }
    }
}

impl CapacityPolicy {
    /// Whether lower-cased `content` mentions any unavailability keyword.
    pub fn mentions_absence(&self, content: &str) -> bool {
        let lower = content.to_lowercase();
        self.unavailability_keywords
            .iter()
            .any(|kw| lower.contains(&kw.to_lowercase()))
    }
}

/// Assessed capacity of one member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberCapacity {
    pub name: String,
    pub projects: Vec<String>,
    pub current_tickets: u32,
    pub is_unavailable: bool,
    pub availability_factor: f64,
    pub estimated_capacity: u32,
}

/// Capacity of the whole team for the upcoming period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityAssessment {
    pub total_members: usize,
    /// Members in roster order
    pub members: Vec<MemberCapacity>,
    pub total_capacity: u32,
    pub unavailable_members: Vec<String>,
    pub reduced_capacity: bool,
}

impl CapacityAssessment {
    /// Members who can take work, in roster order.
    pub fn available(&self) -> impl Iterator<Item = &MemberCapacity> {
        self.members.iter().filter(|m| !m.is_unavailable)
    }

    pub fn available_count(&self) -> usize {
        self.total_members - self.unavailable_members.len()
    }
}

/// Capacity model over a roster and availability signals.
#[derive(Debug, Clone, Default)]
pub struct CapacityModel {
    policy: CapacityPolicy,
}

impl CapacityModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: CapacityPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &CapacityPolicy {
        &self.policy
    }

    /// Assess every roster member against the availability signals.
    pub fn assess(&self, roster: &[Member], signals: &[AvailabilitySignal]) -> CapacityAssessment {
        let members: Vec<MemberCapacity> = roster
            .iter()
            .map(|member| {
                let is_unavailable = self.is_unavailable(member, signals);
                let availability_factor = if is_unavailable { 0.0 } else { 1.0 };
                let estimated_capacity =
                    (f64::from(self.policy.default_points_per_person) * availability_factor).round()
                        as u32;
                if is_unavailable {
                    debug!(member = %member.name, "member marked unavailable");
                }
                MemberCapacity {
                    name: member.name.clone(),
                    projects: member.projects.clone(),
                    current_tickets: member.ticket_count,
                    is_unavailable,
                    availability_factor,
                    estimated_capacity,
                }
            })
            .collect();

        let unavailable_members: Vec<String> = members
            .iter()
            .filter(|m| m.is_unavailable)
            .map(|m| m.name.clone())
            .collect();
        let total_capacity = members.iter().map(|m| m.estimated_capacity).sum();

        info!(
            members = members.len(),
            unavailable = unavailable_members.len(),
            total_capacity,
            "capacity assessed"
        );

        CapacityAssessment {
            total_members: members.len(),
            reduced_capacity: !unavailable_members.is_empty(),
            members,
            total_capacity,
            unavailable_members,
        }
    }

    /// A member is unavailable when one signal contains both a long enough
    /// token of their name and an unavailability keyword.
    pub fn is_unavailable(&self, member: &Member, signals: &[AvailabilitySignal]) -> bool {
        let tokens: Vec<String> = member
            .name
            .split_whitespace()
            .map(str::to_lowercase)
            .filter(|t| t.chars().count() >= self.policy.min_name_token_len)
            .collect();
        if tokens.is_empty() {
            return false;
        }

        signals.iter().any(|signal| {
            let content = signal.content.to_lowercase();
            tokens.iter().any(|t| content.contains(t.as_str()))
                && self.policy.mentions_absence(&content)
        })
    }

    /// Summarize capacity against velocity and recommend an item count.
    pub fn summarize(
        &self,
        velocity: &IndexMap<String, VelocityRecord>,
        capacity: &CapacityAssessment,
    ) -> CapacitySummary {
        let project_velocity = velocity
            .iter()
            .map(|(project, v)| {
                (
                    project.clone(),
                    ProjectVelocity {
                        avg_items: v.avg_items_per_period,
                        avg_points: v.avg_points_per_period,
                        trend: v.trend,
                    },
                )
            })
            .collect();
        let total_avg = total_avg_items(velocity);

        let nominal = f64::from(self.policy.default_points_per_person) * capacity.total_members as f64;
        let denominator = if nominal == 0.0 { 1.0 } else { nominal };
        let ratio = f64::from(capacity.total_capacity) / denominator;
        let percent = (ratio * 100.0).round() as u32;

        let recommendation = if ratio < 0.7 {
            Recommendation::Reduced {
                percent,
                suggested_items: (total_avg * ratio).round() as u32,
            }
        } else if ratio <= 1.0 {
            Recommendation::Normal {
                percent,
                target_items: total_avg.round() as u32,
            }
        } else {
            Recommendation::Full {
                target_items: total_avg.round() as u32,
            }
        };

        CapacitySummary {
            team_size: capacity.total_members,
            available_members: capacity.available_count(),
            total_capacity: capacity.total_capacity,
            unavailable_members: capacity.unavailable_members.clone(),
            project_velocity,
            recommendation,
        }
    }
}

/// Per-project velocity figures carried in the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectVelocity {
    pub avg_items: f64,
    pub avg_points: f64,
    pub trend: Trend,
}

/// Planning recommendation derived from the capacity ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Recommendation {
    /// Under 70% of nominal capacity
    Reduced { percent: u32, suggested_items: u32 },
    /// Between 70% and 100%
    Normal { percent: u32, target_items: u32 },
    Full { target_items: u32 },
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::Reduced {
                percent,
                suggested_items,
            } => write!(
                f,
                "Reduced capacity ({percent}%). Plan fewer tickets than average velocity. Suggest {suggested_items} tickets max."
            ),
            Recommendation::Normal {
                percent,
                target_items,
            } => write!(
                f,
                "Normal capacity ({percent}%). Plan close to average velocity: ~{target_items} tickets."
            ),
            Recommendation::Full { target_items } => write!(
                f,
                "Full capacity available. Target average velocity: ~{target_items} tickets."
            ),
        }
    }
}

/// Capacity summary with recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacitySummary {
    pub team_size: usize,
    pub available_members: usize,
    pub total_capacity: u32,
    pub unavailable_members: Vec<String>,
    pub project_velocity: IndexMap<String, ProjectVelocity>,
    pub recommendation: Recommendation,
}
