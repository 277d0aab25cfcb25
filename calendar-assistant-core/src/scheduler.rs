//! Free time across several calendars.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use futures::future::try_join_all;

use crate::{
    Result,
    event::Event,
    event_set::{EventSet, Predicates},
    interval,
    repository::EventRepository,
    time::{TimeRange, local_instant},
};

/// Working hours and the shortest gap worth offering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    pub meeting_length: Duration,
    pub start_of_day: NaiveTime,
    pub end_of_day: NaiveTime,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            meeting_length: Duration::minutes(30),
            start_of_day: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            end_of_day: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

/// Computes available blocks; time is busy when any repository is busy.
pub struct Scheduler {
    repositories: Vec<Arc<dyn EventRepository>>,
    settings: SchedulerSettings,
    time_zone: Tz,
}

impl Scheduler {
    pub fn new(
        repositories: Vec<Arc<dyn EventRepository>>,
        settings: SchedulerSettings,
        time_zone: Tz,
    ) -> Self {
        Self {
            repositories,
            settings,
            time_zone,
        }
    }

    /// Free gaps inside the working window of every day `range` touches,
    /// each at least the meeting length, as a synthetic set.
    ///
    /// Repositories are queried concurrently and the first failure aborts
    /// the call.
    pub async fn available_blocks(
        &self,
        range: &TimeRange,
        predicates: &Predicates,
    ) -> Result<EventSet> {
        let blocks = self
            .free_blocks(range, predicates)
            .await?
            .into_iter()
            .map(Event::available_block)
            .collect();
        Ok(EventSet::synthetic(blocks))
    }

    /// The gaps themselves, without wrapping them as events.
    pub async fn free_blocks(
        &self,
        range: &TimeRange,
        predicates: &Predicates,
    ) -> Result<Vec<TimeRange>> {
        let sets = try_join_all(
            self.repositories
                .iter()
                .map(|repository| repository.find(range, predicates)),
        )
        .await?;

        let busy = interval::merge(
            sets.iter()
                .flat_map(EventSet::iter)
                .filter(|event| event.blocks_availability())
                .map(Event::range)
                .collect(),
        );

        let free: Vec<TimeRange> = range
            .days(&self.time_zone)
            .into_iter()
            .filter_map(|day| self.working_window(day, range))
            .flat_map(|window| interval::subtract(&window, &busy))
            .filter(|gap| gap.duration() >= self.settings.meeting_length)
            .collect();

        tracing::debug!(
            repositories = self.repositories.len(),
            busy = busy.len(),
            free = free.len(),
            "computed availability"
        );
        Ok(free)
    }

    /// The working hours of `day`, cut to `range`. `None` when the window
    /// is empty or inverted, or lies outside `range`.
    pub fn working_window(&self, day: NaiveDate, range: &TimeRange) -> Option<TimeRange> {
        let start = local_instant(day, self.settings.start_of_day, &self.time_zone);
        let end = local_instant(day, self.settings.end_of_day, &self.time_zone);
        if start >= end {
            return None;
        }
        TimeRange { start, end }.intersect(range)
    }
}
