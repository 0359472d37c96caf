//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Streak grace for today
//! - Calendar time zone and week start
//! - Achievement milestones
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::achievement::{AchievementEvaluator, DEFAULT_STREAK_MILESTONES};
use crate::calendar::{CalendarZone, WeekStart};
use crate::error::ConfigError;
use crate::streak::StreakConfig;

/// Streak configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreaksConfig {
    /// An unfinished today does not break the current streak
    #[serde(default = "default_true")]
    pub grace_today: bool,
}

/// Calendar configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// `local` or a fixed `±HH:MM` offset
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    #[serde(default)]
    pub week_start: WeekStart,
}

/// Achievement configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_streak_milestones")]
    pub streak_milestones: Vec<u32>,
}

/// Main application configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub streaks: StreaksConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub achievements: AchievementsConfig,
}

fn default_true() -> bool {
    true
}
fn default_time_zone() -> String {
    "local".to_string()
}
fn default_streak_milestones() -> Vec<u32> {
    DEFAULT_STREAK_MILESTONES.to_vec()
}

impl Default for StreaksConfig {
    fn default() -> Self {
        Self { grace_today: true }
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            time_zone: default_time_zone(),
            week_start: WeekStart::default(),
        }
    }
}

impl Default for AchievementsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            streak_milestones: default_streak_milestones(),
        }
    }
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

        if key.is_empty() {
            return Err(unknown());
        }

        let mut parts = key.split('.').peekable();
        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => value
                        .parse::<bool>()
                        .map(serde_json::Value::Bool)
                        .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                    serde_json::Value::Number(_) => value
                        .parse::<u64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
                    serde_json::Value::Array(_) => Self::parse_list(value).map_err(invalid)?,
                    serde_json::Value::Object(_) => return Err(unknown()),
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Accepts JSON (`[3, 7]`) or a bare comma list (`3,7`).
    fn parse_list(value: &str) -> Result<serde_json::Value, String> {
        if let Ok(json @ serde_json::Value::Array(_)) = serde_json::from_str(value) {
            return Ok(json);
        }
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<u64>()
                    .map(|n| serde_json::Value::Number(n.into()))
                    .map_err(|_| format!("cannot parse '{s}' as number"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(serde_json::Value::Array)
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the defaults on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "writing default configuration");
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value by dot-path key, e.g. `streaks.grace_today`.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key. The caller persists with [`Config::save`].
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not parse
    /// or validate. `self` is unchanged on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// All leaf keys with their current values, in declaration order.
    pub fn entries(&self) -> Vec<(String, String)> {
        [
            "streaks.grace_today",
            "calendar.time_zone",
            "calendar.week_start",
            "achievements.enabled",
            "achievements.streak_milestones",
        ]
        .into_iter()
        .filter_map(|key| self.get(key).map(|value| (key.to_string(), value)))
        .collect()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.zone()?;
        Ok(())
    }

    /// Calendar zone used to turn instants into days.
    pub fn zone(&self) -> Result<CalendarZone, ConfigError> {
        self.calendar
            .time_zone
            .parse()
            .map_err(|e: crate::error::ValidationError| ConfigError::InvalidValue {
                key: "calendar.time_zone".into(),
                message: e.to_string(),
            })
    }

    pub fn streak_config(&self) -> StreakConfig {
        StreakConfig {
            grace_today: self.streaks.grace_today,
        }
    }

    pub fn evaluator(&self) -> AchievementEvaluator {
        AchievementEvaluator::new(self.achievements.streak_milestones.clone())
    }
}
