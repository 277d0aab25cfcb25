use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::{
    Result,
    client::CalendarClient,
    config::{Config, DEFAULT_CALENDAR_ID},
    event_set::{EventSet, Predicates},
    factory::{EventRepositoryFactory, RepositoryOptions},
    meeting::{MeetingLink, search_window, select_meeting_link},
    repository::{EventRepository, RepositoryKind},
    scheduler::{Scheduler, SchedulerSettings},
    time::TimeRange,
};

/// Entry point for callers: every query goes through the repository
/// factory, so repositories are shared across calls.
pub struct CalendarAssistant {
    client: Arc<dyn CalendarClient>,
    factory: EventRepositoryFactory,
    config: Config,
    settings: SchedulerSettings,
}

impl CalendarAssistant {
    /// Fails with a configuration error, before any request is made, when
    /// the working-hours settings do not parse.
    pub fn new(client: Arc<dyn CalendarClient>, config: Config) -> Result<Self> {
        let settings = config.scheduler_settings()?;
        Ok(Self {
            client,
            factory: EventRepositoryFactory::new(),
            config,
            settings,
        })
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub const fn scheduler_settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    pub fn event_repository(
        &self,
        calendar_id: &str,
        kind: RepositoryKind,
    ) -> Arc<dyn EventRepository> {
        self.factory
            .new_event_repository(&self.client, calendar_id, RepositoryOptions::kind(kind))
    }

    fn default_repository(&self, kind: RepositoryKind) -> Arc<dyn EventRepository> {
        self.event_repository(DEFAULT_CALENDAR_ID, kind)
    }

    /// The timezone of the user's default calendar.
    pub async fn time_zone(&self) -> Result<Tz> {
        self.default_repository(RepositoryKind::Default)
            .time_zone()
            .await
    }

    /// The current instant in the default calendar's timezone.
    pub async fn now(&self) -> Result<DateTime<Tz>> {
        let tz = self.time_zone().await?;
        Ok(Utc::now().with_timezone(&tz))
    }

    pub async fn find_events(&self, range: &TimeRange) -> Result<EventSet> {
        self.find_events_matching(range, &Predicates::new()).await
    }

    pub async fn find_events_matching(
        &self,
        range: &TimeRange,
        predicates: &Predicates,
    ) -> Result<EventSet> {
        self.default_repository(RepositoryKind::Default)
            .find(range, predicates)
            .await
    }

    pub async fn lint_events(&self, range: &TimeRange) -> Result<EventSet> {
        self.default_repository(RepositoryKind::Lint)
            .find(range, &Predicates::new())
            .await
    }

    pub async fn find_location_events(&self, range: &TimeRange) -> Result<EventSet> {
        self.default_repository(RepositoryKind::Location)
            .find(range, &Predicates::new())
            .await
    }

    pub async fn create_location_event(&self, range: &TimeRange, text: &str) -> Result<EventSet> {
        self.default_repository(RepositoryKind::Location)
            .create(range, text, &Predicates::new())
            .await
    }

    /// Free blocks across every configured calendar. Day boundaries follow
    /// the default calendar's timezone.
    pub async fn availability(&self, range: &TimeRange) -> Result<EventSet> {
        let repositories: Vec<_> = self
            .config
            .calendars()
            .iter()
            .map(|calendar_id| self.event_repository(calendar_id, RepositoryKind::Default))
            .collect();
        let tz = self.time_zone().await?;
        Scheduler::new(repositories, self.settings, tz)
            .available_blocks(range, &Predicates::new())
            .await
    }

    /// The meeting to join at `target`, if any.
    pub async fn find_meeting_link(&self, target: DateTime<Utc>) -> Result<Option<MeetingLink>> {
        let events = self
            .default_repository(RepositoryKind::Default)
            .find(&search_window(target), &Predicates::new())
            .await?;
        Ok(select_meeting_link(&events))
    }
}
