pub mod google;

use async_trait::async_trait;
use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::{Result, event::Event, time::TimeRange};

pub use google::{GoogleCalendarClient, GoogleCalendarClientBuilder};

/// When a new event takes place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTiming {
    Timed(TimeRange),
    /// Date span with an exclusive end, as calendar providers store them.
    AllDay { start: NaiveDate, end: NaiveDate },
}

/// An event to be written to a calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub summary: String,
    pub description: Option<String>,
    pub timing: EventTiming,
    /// Transparent events do not block the owner's availability.
    pub transparent: bool,
    /// Timezone used to read back the created event's dates.
    pub time_zone: Tz,
}

/// Access to a calendar provider.
#[async_trait]
pub trait CalendarClient: Send + Sync {
    /// Provider name
    fn name(&self) -> &str;

    /// The timezone a calendar is configured with.
    async fn time_zone(&self, calendar_id: &str) -> Result<Tz>;

    /// Every event overlapping `range`, with recurring events expanded by
    /// the provider, ordered by start time.
    async fn list_events(&self, calendar_id: &str, range: &TimeRange) -> Result<Vec<Event>>;

    /// Write an event and return it as stored by the provider.
    async fn insert_event(&self, calendar_id: &str, event: &NewEvent) -> Result<Event>;
}
