use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use calendar_assistant_core::{
    CalendarAssistant, TimeRange,
    auth::resolve_access_token,
    client::GoogleCalendarClient,
    config::{Config, ConfigFile, Settings},
    date::{NaturalDateResolver, parse_datespec, parse_instant},
};

use crate::token_store::FileTokenStore;

pub const APP_NAME: &str = "calendar-assistant";

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalArgs {
    pub profile: Option<String>,
    pub calendars: Vec<String>,
}

impl GlobalArgs {
    /// The config file layered under these options and `overrides`.
    pub fn config(&self, overrides: Settings) -> Result<Config> {
        let file = ConfigFile::load().context("Failed to load config file")?;
        Ok(Config::new(file, self.overrides(overrides)))
    }

    fn overrides(&self, overrides: Settings) -> Settings {
        Settings {
            profile: self.profile.clone(),
            calendars: (!self.calendars.is_empty()).then(|| self.calendars.clone()),
            ..Settings::default()
        }
        .or(overrides)
    }
}

pub fn token_store() -> Result<FileTokenStore> {
    FileTokenStore::with_default_dir(APP_NAME).context("Failed to open token store")
}

/// An authenticated assistant plus what is needed to read dates typed by
/// the user.
pub struct Session {
    pub assistant: CalendarAssistant,
    pub now: DateTime<Tz>,
    resolver: NaturalDateResolver,
}

impl Session {
    pub async fn open(config: Config) -> Result<Self> {
        let settings = config
            .scheduler_settings()
            .context("Invalid working-hours settings")?;
        tracing::debug!(
            profile = config.profile(),
            meeting_length = %settings.meeting_length,
            start_of_day = %settings.start_of_day,
            end_of_day = %settings.end_of_day,
            "configuration loaded"
        );

        let store = token_store()?;
        let token = resolve_access_token(&store, config.profile()).await?;
        let client = GoogleCalendarClient::builder(token.token)
            .endpoint(config.endpoint())
            .timeout(config.timeout().as_secs())
            .build()?;

        let assistant = CalendarAssistant::new(Arc::new(client), config)?;
        let now = assistant
            .now()
            .await
            .context("Failed to read the calendar's timezone")?;

        Ok(Self {
            assistant,
            now,
            resolver: NaturalDateResolver::new(),
        })
    }

    pub fn time_zone(&self) -> Tz {
        self.now.timezone()
    }

    pub fn datespec(&self, text: &str) -> Result<TimeRange> {
        parse_datespec(&self.resolver, text, self.now)
            .with_context(|| format!("Invalid date range: {text}"))
    }

    pub fn instant(&self, text: &str) -> Result<DateTime<Utc>> {
        parse_instant(&self.resolver, text, self.now)
            .with_context(|| format!("Invalid time: {text}"))
    }
}
