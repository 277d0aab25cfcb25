use std::sync::Arc;

use async_trait::async_trait;
use chrono_tz::Tz;

use crate::{
    Error, Result,
    client::{CalendarClient, EventTiming, NewEvent},
    event_set::{EventSet, Predicates},
    repository::{EventRepository, RepositoryBase, RepositoryKind},
    time::TimeRange,
};

/// Plain access to a calendar, no extra filtering.
pub struct StandardEventRepository {
    base: RepositoryBase,
}

impl StandardEventRepository {
    pub fn new(client: Arc<dyn CalendarClient>, calendar_id: impl Into<String>) -> Self {
        Self {
            base: RepositoryBase::new(client, calendar_id),
        }
    }
}

#[async_trait]
impl EventRepository for StandardEventRepository {
    fn calendar_id(&self) -> &str {
        &self.base.calendar_id
    }

    fn kind(&self) -> RepositoryKind {
        RepositoryKind::Default
    }

    async fn time_zone(&self) -> Result<Tz> {
        self.base.time_zone().await
    }

    async fn find(&self, range: &TimeRange, predicates: &Predicates) -> Result<EventSet> {
        let events = self.base.list(range).await?;
        Ok(EventSet::new(self.source(), events).filter_by(predicates))
    }

    /// Writes one busy event spanning `range` titled `payload`.
    async fn create(
        &self,
        range: &TimeRange,
        payload: &str,
        predicates: &Predicates,
    ) -> Result<EventSet> {
        let summary = payload.trim();
        if summary.is_empty() {
            return Err(Error::Validation("event summary must not be empty".to_string()));
        }
        let event = NewEvent {
            summary: summary.to_string(),
            description: None,
            timing: EventTiming::Timed(*range),
            transparent: false,
            time_zone: self.time_zone().await?,
        };
        let created = self.base.insert(&event).await?;
        Ok(EventSet::new(self.source(), vec![created]).filter_by(predicates))
    }
}
