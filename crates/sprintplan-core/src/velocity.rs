//! Velocity estimation from completed sprint history.
//!
//! For each project the model takes the most recent completed periods
//! (most-recent-first) and derives average throughput in items and story
//! points, plus a coarse trend obtained by comparing the newest period
//! against the oldest one in the window.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One completed period for a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodRecord {
    /// Number of items completed in the period
    pub items_completed: u32,
    /// Story points of each completed item (already coerced)
    #[serde(default)]
    pub item_points: Vec<f64>,
}

impl PeriodRecord {
    pub fn new(items_completed: u32, item_points: Vec<f64>) -> Self {
        Self {
            items_completed,
            item_points,
        }
    }

    /// Sum of the story points completed in this period.
    pub fn total_points(&self) -> f64 {
        self.item_points.iter().sum()
    }
}

/// Direction of throughput over the analysed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Stable,
    Declining,
}

impl Trend {
    /// Short marker used in reports.
    pub fn marker(&self) -> &'static str {
        match self {
            Trend::Improving => "UP",
            Trend::Stable => "STABLE",
            Trend::Declining => "DOWN",
        }
    }
}

/// Throughput statistics for one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityRecord {
    pub avg_items_per_period: f64,
    pub avg_points_per_period: f64,
    pub trend: Trend,
    /// Completed counts per period, most recent first
    pub history: Vec<u32>,
    pub periods_analyzed: usize,
}

/// Trend thresholds relative to the oldest period in the window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendThresholds {
    /// `recent > older * improving` means improving
    #[serde(default = "default_improving")]
    pub improving: f64,
    /// `recent < older * declining` means declining
    #[serde(default = "default_declining")]
    pub declining: f64,
}

fn default_improving() -> f64 {
    1.15
}
fn default_declining() -> f64 {
    0.85
}

impl Default for TrendThresholds {
    fn default() -> Self {
        Self {
            improving: default_improving(),
            declining: default_declining(),
        }
    }
}

/// Velocity model over a window of completed periods.
#[derive(Debug, Clone, Default)]
pub struct VelocityModel {
    thresholds: TrendThresholds,
}

impl VelocityModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: TrendThresholds) -> Self {
        Self { thresholds }
    }

    /// Compute a velocity record per project, preserving project order.
    pub fn calculate(
        &self,
        history: &IndexMap<String, Vec<PeriodRecord>>,
    ) -> IndexMap<String, VelocityRecord> {
        history
            .iter()
            .map(|(project, periods)| {
                let record = self.calculate_project(periods);
                debug!(
                    project = %project,
                    avg_items = record.avg_items_per_period,
                    trend = ?record.trend,
                    "velocity computed"
                );
                (project.clone(), record)
            })
            .collect()
    }

    /// Compute the record for one project's periods.
    pub fn calculate_project(&self, periods: &[PeriodRecord]) -> VelocityRecord {
        let counts: Vec<u32> = periods.iter().map(|p| p.items_completed).collect();

        let avg_items = if counts.is_empty() {
            0.0
        } else {
            counts.iter().map(|&c| f64::from(c)).sum::<f64>() / counts.len() as f64
        };

        // Periods with no measured points are left out of the denominator.
        let measured: Vec<f64> = periods
            .iter()
            .map(PeriodRecord::total_points)
            .filter(|&p| p > 0.0)
            .collect();
        let avg_points = if measured.is_empty() {
            0.0
        } else {
            measured.iter().sum::<f64>() / measured.len() as f64
        };

        VelocityRecord {
            avg_items_per_period: round1(avg_items),
            avg_points_per_period: round1(avg_points),
            trend: self.trend(&counts),
            history: counts,
            periods_analyzed: periods.len(),
        }
    }

    /// Compare the newest count with the oldest in the window.
    pub fn trend(&self, counts: &[u32]) -> Trend {
        if counts.len() < 2 {
            return Trend::Stable;
        }
        let recent = f64::from(counts[0]);
        let older = f64::from(counts[counts.len() - 1]);
        if recent > older * self.thresholds.improving {
            Trend::Improving
        } else if recent < older * self.thresholds.declining {
            Trend::Declining
        } else {
            Trend::Stable
        }
    }
}

/// Sum of average items per period across all projects.
pub fn total_avg_items(velocity: &IndexMap<String, VelocityRecord>) -> f64 {
    velocity.values().map(|v| v.avg_items_per_period).sum()
}

/// Round to one decimal place.
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
