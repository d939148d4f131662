//! TOML-based application configuration.
//!
//! Stores the tunables of every engine stage:
//! - Capacity model (points per person, absence keywords)
//! - Velocity trend thresholds
//! - Scoring term values
//! - Planner cap and budget stretch factor
//! - Snapshot ingestion limits
//! - Execution and report defaults
//!
//! Configuration is stored at `~/.config/sprintplan/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::capacity::CapacityPolicy;
use crate::error::ConfigError;
use crate::ingest::IngestLimits;
use crate::planner::PlannerPolicy;
use crate::scoring::ScoringWeights;
use crate::velocity::TrendThresholds;

/// Execution defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Project used when creating items that carry none.
    #[serde(default)]
    pub default_project: Option<String>,
}

/// Report rendering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_sprint_length_days")]
    pub sprint_length_days: u32,
    /// Stretch items listed in the report
    #[serde(default = "default_stretch_display_limit")]
    pub stretch_display_limit: usize,
}

fn default_sprint_length_days() -> u32 {
    14
}
fn default_stretch_display_limit() -> usize {
    10
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            sprint_length_days: default_sprint_length_days(),
            stretch_display_limit: default_stretch_display_limit(),
        }
    }
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/sprintplan/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub capacity: CapacityPolicy,
    #[serde(default)]
    pub velocity: TrendThresholds,
    #[serde(default)]
    pub scoring: ScoringWeights,
    #[serde(default)]
    pub planner: PlannerPolicy,
    #[serde(default)]
    pub ingest: IngestLimits,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default location of the config file.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if absent.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from `path`, writing defaults there if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed,
    /// or if the default config cannot be written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Load from `path`, returning defaults on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load_from(path).unwrap_or_default()
    }

    /// Persist to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key. The caller persists.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// into the field's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.planner.max_items_per_person, 6);
        assert_eq!(parsed.capacity.default_points_per_person, 10);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[planner]\nmax_items_per_person = 4\n").unwrap();
        assert_eq!(parsed.planner.max_items_per_person, 4);
        assert_eq!(parsed.planner.budget_stretch_factor, 1.1);
        assert_eq!(parsed.scoring.defect_bonus, 1.5);
        assert_eq!(parsed.report.sprint_length_days, 14);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("planner.max_items_per_person").as_deref(), Some("6"));
        assert_eq!(cfg.get("velocity.improving").as_deref(), Some("1.15"));
        assert!(cfg.get("planner.missing_key").is_none());
    }

    #[test]
    fn set_updates_numbers() {
        let mut cfg = Config::default();
        cfg.set("planner.max_items_per_person", "8").unwrap();
        cfg.set("planner.budget_stretch_factor", "1.25").unwrap();
        assert_eq!(cfg.planner.max_items_per_person, 8);
        assert_eq!(cfg.planner.budget_stretch_factor, 1.25);
    }

    #[test]
    fn set_updates_optional_string_and_list() {
        let mut cfg = Config::default();
        cfg.set("execution.default_project", "DATAG").unwrap();
        assert_eq!(cfg.execution.default_project.as_deref(), Some("DATAG"));

        cfg.set("capacity.unavailability_keywords", r#"["pto", "leave"]"#)
            .unwrap();
        assert_eq!(cfg.capacity.unavailability_keywords, vec!["pto", "leave"]);
    }

    #[test]
    fn set_rejects_unknown_key_and_bad_value() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("planner.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            cfg.set("planner.max_items_per_person", "many"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn load_from_writes_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.report.stretch_display_limit = 3;
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().report.stretch_display_limit, 3);
    }
}
