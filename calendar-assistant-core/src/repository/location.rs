use std::sync::Arc;

use async_trait::async_trait;
use chrono_tz::Tz;

use crate::{
    Result,
    client::{CalendarClient, EventTiming, NewEvent},
    event::{Event, Location},
    event_set::{EventSet, Predicates},
    repository::{EventRepository, RepositoryBase, RepositoryKind},
    time::{TimeRange, next_day},
};

/// Records where the user is, as one transparent all-day event per day whose
/// summary carries the location marker.
pub struct LocationEventRepository {
    base: RepositoryBase,
}

impl LocationEventRepository {
    pub fn new(client: Arc<dyn CalendarClient>, calendar_id: impl Into<String>) -> Self {
        Self {
            base: RepositoryBase::new(client, calendar_id),
        }
    }

    fn decode(mut event: Event) -> Option<Event> {
        if !event.all_day {
            return None;
        }
        let location = Location::decode(event.summary.as_deref()?)?;
        event.location_payload = Some(location);
        Some(event)
    }
}

#[async_trait]
impl EventRepository for LocationEventRepository {
    fn calendar_id(&self) -> &str {
        &self.base.calendar_id
    }

    fn kind(&self) -> RepositoryKind {
        RepositoryKind::Location
    }

    async fn time_zone(&self) -> Result<Tz> {
        self.base.time_zone().await
    }

    async fn find(&self, range: &TimeRange, predicates: &Predicates) -> Result<EventSet> {
        let events = self
            .base
            .list(range)
            .await?
            .into_iter()
            .filter_map(Self::decode)
            .collect();
        Ok(EventSet::new(self.source(), events).filter_by(predicates))
    }

    /// Writes one event for every local day `range` touches. The location is
    /// validated before anything is sent to the provider.
    async fn create(
        &self,
        range: &TimeRange,
        payload: &str,
        predicates: &Predicates,
    ) -> Result<EventSet> {
        let location = Location::new(payload)?;
        let tz = self.time_zone().await?;
        let summary = location.encode();

        let mut created = Vec::new();
        for day in range.days(&tz) {
            let event = NewEvent {
                summary: summary.clone(),
                description: None,
                timing: EventTiming::AllDay {
                    start: day,
                    end: next_day(day),
                },
                transparent: true,
                time_zone: tz,
            };
            let mut stored = self.base.insert(&event).await?;
            stored.location_payload = Some(location.clone());
            created.push(stored);
        }
        tracing::info!(
            calendar_id = %self.base.calendar_id,
            location = %location,
            days = created.len(),
            "location events created"
        );

        Ok(EventSet::new(self.source(), created).filter_by(predicates))
    }
}
