//! In-memory calendar provider used by unit tests.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

use crate::{
    Error, Result,
    client::{CalendarClient, EventTiming, NewEvent},
    event::Event,
    time::TimeRange,
};

pub fn utc(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

pub fn range(start: &str, end: &str) -> TimeRange {
    TimeRange::new(utc(start), utc(end)).unwrap()
}

#[derive(Default)]
pub struct MemoryCalendarClient {
    time_zones: HashMap<String, Tz>,
    failing: HashSet<String>,
    events: Mutex<HashMap<String, Vec<Event>>>,
    inserted: Mutex<Vec<NewEvent>>,
    list_calls: AtomicUsize,
    time_zone_calls: AtomicUsize,
}

impl MemoryCalendarClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_time_zone(mut self, calendar_id: &str, tz: Tz) -> Self {
        self.time_zones.insert(calendar_id.to_string(), tz);
        self
    }

    /// Every call against `calendar_id` fails with a repository error.
    pub fn failing(mut self, calendar_id: &str) -> Self {
        self.failing.insert(calendar_id.to_string());
        self
    }

    pub fn with_event(self, calendar_id: &str, event: Event) -> Self {
        self.events
            .lock()
            .unwrap()
            .entry(calendar_id.to_string())
            .or_default()
            .push(Event {
                source_calendar_id: calendar_id.to_string(),
                ..event
            });
        self
    }

    pub fn inserted(&self) -> Vec<NewEvent> {
        self.inserted.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn time_zone_calls(&self) -> usize {
        self.time_zone_calls.load(Ordering::SeqCst)
    }

    fn check(&self, calendar_id: &str) -> Result<()> {
        if self.failing.contains(calendar_id) {
            return Err(Error::Repository {
                calendar_id: calendar_id.to_string(),
                message: "provider unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CalendarClient for MemoryCalendarClient {
    fn name(&self) -> &str {
        "memory"
    }

    async fn time_zone(&self, calendar_id: &str) -> Result<Tz> {
        self.time_zone_calls.fetch_add(1, Ordering::SeqCst);
        self.check(calendar_id)?;
        Ok(self.time_zones.get(calendar_id).copied().unwrap_or(Tz::UTC))
    }

    async fn list_events(&self, calendar_id: &str, range: &TimeRange) -> Result<Vec<Event>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check(calendar_id)?;
        let events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        let mut found: Vec<Event> = events
            .get(calendar_id)
            .into_iter()
            .flatten()
            .filter(|event| range.overlaps(&event.range()))
            .cloned()
            .collect();
        found.sort_by_key(|event| event.start);
        Ok(found)
    }

    async fn insert_event(&self, calendar_id: &str, new_event: &NewEvent) -> Result<Event> {
        self.check(calendar_id)?;
        let mut event = match new_event.timing {
            EventTiming::Timed(range) => Event::new(calendar_id, range.start, range.end),
            EventTiming::AllDay { start, end } => {
                let range = TimeRange::from_all_day(start, end, &new_event.time_zone);
                Event::new(calendar_id, range.start, range.end).all_day()
            }
        }
        .with_id(Uuid::new_v4().to_string())
        .with_summary(new_event.summary.clone());
        event.description.clone_from(&new_event.description);
        if new_event.transparent {
            event = event.transparent();
        }

        self.inserted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(new_event.clone());
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(calendar_id.to_string())
            .or_default()
            .push(event.clone());
        Ok(event)
    }
}
