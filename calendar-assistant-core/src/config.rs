//! User settings.
//!
//! Read from a TOML file at `$CALENDAR_ASSISTANT_CONFIG`, or
//! `~/.calendar-assistant.toml` when unset:
//!
//! ```toml
//! [settings]
//! profile = "work"
//! meeting-length = "30m"
//! start-of-day = "9am"
//! end-of-day = "6pm"
//! calendars = ["primary", "team@example.com"]
//! ```
//!
//! Values given per invocation win over the file, which wins over the
//! defaults.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    client::google::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS},
    date::{parse_duration, parse_time_of_day},
    scheduler::SchedulerSettings,
};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "CALENDAR_ASSISTANT_CONFIG";

/// Calendar used when none is configured.
pub const DEFAULT_CALENDAR_ID: &str = "primary";

pub const DEFAULT_PROFILE: &str = "default";
pub const DEFAULT_MEETING_LENGTH: &str = "30m";
pub const DEFAULT_START_OF_DAY: &str = "9am";
pub const DEFAULT_END_OF_DAY: &str = "6pm";

/// One layer of settings. Unset fields fall through to the next layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_length: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_of_day: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_of_day: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendars: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Settings {
    /// Built-in values for every field.
    pub fn defaults() -> Self {
        Self {
            profile: Some(DEFAULT_PROFILE.to_string()),
            meeting_length: Some(DEFAULT_MEETING_LENGTH.to_string()),
            start_of_day: Some(DEFAULT_START_OF_DAY.to_string()),
            end_of_day: Some(DEFAULT_END_OF_DAY.to_string()),
            calendars: Some(vec![DEFAULT_CALENDAR_ID.to_string()]),
            endpoint: Some(DEFAULT_ENDPOINT.to_string()),
            timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Fields set on `self` win; the rest come from `fallback`. An empty
    /// calendar list counts as unset.
    #[must_use]
    pub fn or(self, fallback: Self) -> Self {
        Self {
            profile: self.profile.or(fallback.profile),
            meeting_length: self.meeting_length.or(fallback.meeting_length),
            start_of_day: self.start_of_day.or(fallback.start_of_day),
            end_of_day: self.end_of_day.or(fallback.end_of_day),
            calendars: self
                .calendars
                .filter(|calendars| !calendars.is_empty())
                .or(fallback.calendars),
            endpoint: self.endpoint.or(fallback.endpoint),
            timeout_secs: self.timeout_secs.or(fallback.timeout_secs),
        }
    }
}

/// The on-disk layout of the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub settings: Settings,
}

impl ConfigFile {
    /// `$CALENDAR_ASSISTANT_CONFIG`, else `~/.calendar-assistant.toml`.
    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        let home = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE"))?;
        Some(PathBuf::from(home).join(".calendar-assistant.toml"))
    }

    /// Load the default file; a missing file yields empty settings.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let file = Self::from_toml_str(&content).map_err(|e| match e {
            Error::Toml(e) => Error::Config(format!("{}: {e}", path.display())),
            other => other,
        })?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(file)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Effective settings after layering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    settings: Settings,
}

impl Config {
    pub fn new(file: ConfigFile, overrides: Settings) -> Self {
        Self {
            settings: overrides.or(file.settings).or(Settings::defaults()),
        }
    }

    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn profile(&self) -> &str {
        self.settings.profile.as_deref().unwrap_or(DEFAULT_PROFILE)
    }

    /// Calendars intersected for availability, in order.
    pub fn calendars(&self) -> Vec<String> {
        self.settings
            .calendars
            .clone()
            .unwrap_or_else(|| vec![DEFAULT_CALENDAR_ID.to_string()])
    }

    pub fn endpoint(&self) -> &str {
        self.settings.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.settings.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Parse and check the working-hours settings.
    pub fn scheduler_settings(&self) -> Result<SchedulerSettings> {
        let meeting_length =
            parse_duration(self.settings.meeting_length.as_deref().unwrap_or(DEFAULT_MEETING_LENGTH))?;
        let start_of_day =
            parse_time_of_day(self.settings.start_of_day.as_deref().unwrap_or(DEFAULT_START_OF_DAY))?;
        let end_of_day =
            parse_time_of_day(self.settings.end_of_day.as_deref().unwrap_or(DEFAULT_END_OF_DAY))?;
        Ok(SchedulerSettings {
            meeting_length,
            start_of_day,
            end_of_day,
        })
    }

    /// The effective settings in config file form.
    pub fn to_toml(&self) -> Result<String> {
        let file = ConfigFile {
            settings: self.settings.clone(),
        };
        toml::to_string_pretty(&file).map_err(|e| Error::Config(e.to_string()))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(ConfigFile::default(), Settings::default())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.profile(), DEFAULT_PROFILE);
        assert_eq!(config.calendars(), vec!["primary".to_string()]);
        assert_eq!(config.endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(config.timeout(), Duration::from_secs(30));

        let settings = config.scheduler_settings().unwrap();
        assert_eq!(settings.meeting_length, chrono::Duration::minutes(30));
        assert_eq!(settings.start_of_day, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(settings.end_of_day, NaiveTime::from_hms_opt(18, 0, 0).unwrap());
    }

    #[test]
    fn test_overrides_beat_file_beat_defaults() {
        let file = ConfigFile::from_toml_str(
            r#"
            [settings]
            profile = "work"
            meeting-length = "1h"
            start-of-day = "8am"
            calendars = ["primary", "team@example.com"]
            "#,
        )
        .unwrap();
        let overrides = Settings {
            meeting_length: Some("45m".to_string()),
            calendars: Some(Vec::new()),
            ..Settings::default()
        };
        let config = Config::new(file, overrides);

        assert_eq!(config.profile(), "work");
        assert_eq!(config.calendars(), vec!["primary", "team@example.com"]);
        let settings = config.scheduler_settings().unwrap();
        assert_eq!(settings.meeting_length, chrono::Duration::minutes(45));
        assert_eq!(settings.start_of_day, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(settings.end_of_day, NaiveTime::from_hms_opt(18, 0, 0).unwrap());
    }

    #[test]
    fn test_bad_values_are_configuration_errors() {
        let config = Config::new(
            ConfigFile::default(),
            Settings {
                meeting_length: Some("soon".to_string()),
                ..Settings::default()
            },
        );
        assert!(matches!(config.scheduler_settings(), Err(Error::Config(_))));

        assert!(matches!(
            ConfigFile::from_toml_str("[settings]\nmeeting-length = 30"),
            Err(Error::Toml(_))
        ));
        assert!(ConfigFile::from_toml_str("[settings]\ncolour = \"blue\"").is_err());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let file = ConfigFile::load_from(Path::new("/nonexistent/calendar-assistant.toml")).unwrap();
        assert_eq!(file, ConfigFile::default());
    }

    #[test]
    fn test_to_toml_round_trips() {
        let config = Config::default();
        let dumped = config.to_toml().unwrap();
        assert!(dumped.contains("[settings]"));
        assert!(dumped.contains("meeting-length = \"30m\""));

        let reloaded = Config::new(ConfigFile::from_toml_str(&dumped).unwrap(), Settings::default());
        assert_eq!(reloaded, config);
    }
}
