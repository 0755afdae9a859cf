//! TOML-based application configuration.
//!
//! Stores the defaults the chat front end hands to the core:
//! - Pomodoro phase lengths and the long-break cadence
//! - Tick driver interval
//! - The user identity the local chat loop runs as, and the time zone its
//!   calendar dates are read in
//!
//! Configuration is stored at `<data dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::data_dir;
use crate::clock::Calendar;
use crate::error::ConfigError;
use crate::ids::UserId;
use crate::timer::SessionConfig;

/// Default session lengths, in minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroConfig {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u32,
    #[serde(default = "default_cycles_before_long_break")]
    pub cycles_before_long_break: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_user_id")]
    pub user_id: String,
    /// `local`, `utc` or a fixed offset such as `+05:30`.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data dir>/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pomodoro: PomodoroConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

fn default_work_minutes() -> u32 {
    25
}
fn default_short_break_minutes() -> u32 {
    5
}
fn default_long_break_minutes() -> u32 {
    15
}
fn default_cycles_before_long_break() -> u32 {
    4
}
fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_user_id() -> String {
    "local".into()
}
fn default_timezone() -> String {
    "local".into()
}

impl Default for PomodoroConfig {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            cycles_before_long_break: default_cycles_before_long_break(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            timezone: default_timezone(),
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
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        if key.is_empty() {
            return Err(invalid("config key is empty".into()));
        }

        let mut parts = key.split('.').peekable();
        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current
                    .get_mut(part)
                    .ok_or_else(|| invalid("unknown config key".into()))?;
                continue;
            }

            let obj = current
                .as_object_mut()
                .ok_or_else(|| invalid("unknown config key".into()))?;
            let existing = obj
                .get(part)
                .ok_or_else(|| invalid("unknown config key".into()))?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => {
                    let n = value
                        .parse::<u64>()
                        .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                    serde_json::Value::Number(n.into())
                }
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    return Err(invalid("not a leaf key".into()));
                }
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(invalid("unknown config key".into()))
    }

    /// Default location of the config file.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be created.
    pub fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from the default location, writing defaults if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file is absent.
    ///
    /// # Errors
    /// Same as [`Config::load`].
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
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

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key without touching disk.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the key is unknown, the
    /// value does not parse, or the result is not a usable configuration.
    /// `self` is unchanged on error.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// [`Config::apply`] followed by [`Config::save`].
    ///
    /// # Errors
    /// Returns an error if the value is rejected or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Default phase lengths for new sessions.
    ///
    /// # Errors
    /// Returns an error if a length or the cycle count is zero.
    pub fn session_config(&self) -> Result<SessionConfig, ConfigError> {
        let p = &self.pomodoro;
        SessionConfig::from_minutes(
            p.work_minutes,
            p.short_break_minutes,
            p.long_break_minutes,
            p.cycles_before_long_break,
        )
        .map_err(|e| match e {
            ConfigError::InvalidValue { key, message } => ConfigError::InvalidValue {
                key: format!("pomodoro.{}", pomodoro_key(&key)),
                message,
            },
            other => other,
        })
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.scheduler.tick_interval_ms)
    }

    pub fn chat_user(&self) -> UserId {
        UserId::new(self.chat.user_id.clone())
    }

    /// Calendar that "today" is read in.
    ///
    /// # Errors
    /// Returns an error if `chat.timezone` is not a recognized zone.
    pub fn calendar(&self) -> Result<Calendar, ConfigError> {
        self.chat.timezone.parse().map_err(|e| match e {
            ConfigError::InvalidValue { message, .. } => ConfigError::InvalidValue {
                key: "chat.timezone".into(),
                message,
            },
            other => other,
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.session_config()?;
        if self.scheduler.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "scheduler.tick_interval_ms".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.chat.user_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "chat.user_id".into(),
                message: "must not be empty".into(),
            });
        }
        self.calendar()?;
        Ok(())
    }
}

/// Maps a [`SessionConfig`] field name to its `[pomodoro]` key.
fn pomodoro_key(field: &str) -> &str {
    match field {
        "work" => "work_minutes",
        "short_break" => "short_break_minutes",
        "long_break" => "long_break_minutes",
        other => other,
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
        assert_eq!(parsed.pomodoro.work_minutes, 25);
        assert_eq!(parsed.chat.user_id, "local");
    }

    #[test]
    fn missing_sections_take_defaults() {
        let parsed: Config = toml::from_str("[pomodoro]\nwork_minutes = 50\n").unwrap();
        assert_eq!(parsed.pomodoro.work_minutes, 50);
        assert_eq!(parsed.pomodoro.short_break_minutes, 5);
        assert_eq!(parsed.scheduler.tick_interval_ms, 1000);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("pomodoro.work_minutes").as_deref(), Some("25"));
        assert_eq!(cfg.get("chat.user_id").as_deref(), Some("local"));
        assert!(cfg.get("pomodoro.missing_key").is_none());
        assert!(cfg.get("pomodoro").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn apply_updates_nested_number() {
        let mut cfg = Config::default();
        cfg.apply("pomodoro.long_break_minutes", "20").unwrap();
        assert_eq!(cfg.pomodoro.long_break_minutes, 20);
        assert_eq!(cfg.session_config().unwrap().long_break(), chrono::Duration::minutes(20));
    }

    #[test]
    fn apply_updates_nested_string() {
        let mut cfg = Config::default();
        cfg.apply("chat.user_id", "alice").unwrap();
        assert_eq!(cfg.chat_user(), UserId::new("alice"));
    }

    #[test]
    fn timezone_selects_the_calendar() {
        let mut cfg = Config::default();
        assert_eq!(cfg.get("chat.timezone").as_deref(), Some("local"));
        assert_eq!(cfg.calendar().unwrap(), Calendar::Local);

        cfg.apply("chat.timezone", "-08:00").unwrap();
        assert_eq!(cfg.calendar().unwrap().to_string(), "-08:00");

        match cfg.apply("chat.timezone", "Mars/Olympus") {
            Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, "chat.timezone"),
            other => panic!("expected InvalidValue, got {other:?}"),
        }
        assert_eq!(cfg.chat.timezone, "-08:00");
    }

    #[test]
    fn apply_rejects_unknown_key() {
        let mut cfg = Config::default();
        let err = cfg.apply("pomodoro.nonexistent", "1").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert!(cfg.apply("nope", "1").is_err());
        assert!(cfg.apply("pomodoro", "1").is_err());
    }

    #[test]
    fn apply_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.apply("pomodoro.work_minutes", "soon").is_err());
        assert!(cfg.apply("pomodoro.work_minutes", "-5").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn apply_rejects_unusable_values() {
        let mut cfg = Config::default();
        match cfg.apply("pomodoro.work_minutes", "0") {
            Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, "pomodoro.work_minutes"),
            other => panic!("expected InvalidValue, got {other:?}"),
        }
        assert!(cfg.apply("pomodoro.cycles_before_long_break", "0").is_err());
        assert!(cfg.apply("scheduler.tick_interval_ms", "0").is_err());
        assert!(cfg.apply("chat.user_id", "  ").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_from_writes_defaults_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.apply("scheduler.tick_interval_ms", "250").unwrap();
        changed.save_to(&path).unwrap();
        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.tick_interval(), Duration::from_millis(250));
    }

    #[test]
    fn load_from_reports_parse_failures() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[pomodoro\nwork_minutes = ").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ParseFailed(_))
        ));
    }
}
