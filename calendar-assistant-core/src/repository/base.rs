use std::sync::Arc;

use chrono_tz::Tz;
use tokio::sync::OnceCell;

use crate::{
    Result,
    client::{CalendarClient, NewEvent},
    event::Event,
    time::TimeRange,
};

/// State shared by every repository flavour: the client and the calendar it
/// is bound to.
pub struct RepositoryBase {
    pub client: Arc<dyn CalendarClient>,
    pub calendar_id: String,
    time_zone: OnceCell<Tz>,
}

impl RepositoryBase {
    pub fn new(client: Arc<dyn CalendarClient>, calendar_id: impl Into<String>) -> Self {
        Self {
            client,
            calendar_id: calendar_id.into(),
            time_zone: OnceCell::new(),
        }
    }

    /// The calendar's timezone, fetched once and reused.
    pub async fn time_zone(&self) -> Result<Tz> {
        self.time_zone
            .get_or_try_init(|| self.client.time_zone(&self.calendar_id))
            .await
            .copied()
    }

    pub async fn list(&self, range: &TimeRange) -> Result<Vec<Event>> {
        tracing::debug!(
            calendar_id = %self.calendar_id,
            client = self.client.name(),
            start = %range.start,
            end = %range.end,
            "querying events"
        );
        self.client.list_events(&self.calendar_id, range).await
    }

    pub async fn insert(&self, event: &NewEvent) -> Result<Event> {
        self.client.insert_event(&self.calendar_id, event).await
    }
}
