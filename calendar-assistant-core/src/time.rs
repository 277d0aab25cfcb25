//! Instant ranges and the timezone-aware day arithmetic built on them.
//!
//! Every function that needs a day boundary takes the timezone explicitly;
//! nothing here reads or changes a process-wide timezone.

use chrono::{DateTime, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A span between two instants, `start <= end`.
///
/// Overlap tests treat the range as half-open, so two ranges that merely
/// touch do not overlap but do merge (see [`crate::interval::merge`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Build a range, rejecting an end that precedes the start.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(Error::Validation(format!(
                "range end {end} is before its start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Midnight to the following midnight of `date` in `tz`.
    pub fn for_day(date: NaiveDate, tz: &Tz) -> Self {
        Self::for_days(date, date, tz)
    }

    /// Start of `first` through the end of `last` (inclusive dates) in `tz`.
    pub fn for_days(first: NaiveDate, last: NaiveDate, tz: &Tz) -> Self {
        let (first, last) = if first <= last {
            (first, last)
        } else {
            (last, first)
        };
        Self {
            start: start_of_day(first, tz),
            end: start_of_day(next_day(last), tz),
        }
    }

    /// Convert a provider all-day date span (`end` exclusive) into instants.
    pub fn from_all_day(start: NaiveDate, end_exclusive: NaiveDate, tz: &Tz) -> Self {
        let end_exclusive = end_exclusive.max(start);
        Self {
            start: start_of_day(start, tz),
            end: start_of_day(end_exclusive, tz),
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `other` shares any time with this range. A zero-length range
    /// overlaps when its instant falls inside `[start, end)`.
    pub fn overlaps(&self, other: &Self) -> bool {
        if other.is_empty() {
            return self.start <= other.start && other.start < self.end;
        }
        if self.is_empty() {
            return other.start <= self.start && self.start < other.end;
        }
        self.start < other.end && other.start < self.end
    }

    /// The non-empty common part of both ranges, if any.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then_some(Self { start, end })
    }

    /// The date of `end` in `tz`, treating an end that falls exactly on
    /// local midnight as the end of the previous day.
    pub fn last_date(&self, tz: &Tz) -> NaiveDate {
        let local_end = self.end.with_timezone(tz);
        let date = local_end.date_naive();
        if self.end > self.start && local_end.time() == NaiveTime::MIN {
            date.pred_opt().unwrap_or(date)
        } else {
            date
        }
    }

    pub fn first_date(&self, tz: &Tz) -> NaiveDate {
        self.start.with_timezone(tz).date_naive()
    }

    /// Every calendar date the range touches in `tz`.
    pub fn days(&self, tz: &Tz) -> Vec<NaiveDate> {
        let first = self.first_date(tz);
        let last = self.last_date(tz);
        first.iter_days().take_while(|date| *date <= last).collect()
    }
}

/// Resolve a wall-clock time on `date` in `tz` to an instant.
///
/// Ambiguous times (DST fall-back) take the earlier instant; times inside a
/// DST gap move forward by an hour.
pub fn local_instant(date: NaiveDate, time: NaiveTime, tz: &Tz) -> DateTime<Utc> {
    resolve_local(date.and_time(time), tz)
}

pub fn start_of_day(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    local_instant(date, NaiveTime::MIN, tz)
}

pub(crate) fn resolve_local(naive: NaiveDateTime, tz: &Tz) -> DateTime<Utc> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map_or_else(
            || Utc.from_utc_datetime(&naive),
            |local| local.with_timezone(&Utc),
        )
}

pub(crate) fn next_day(date: NaiveDate) -> NaiveDate {
    date.checked_add_days(Days::new(1)).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use chrono_tz::{America::New_York, Europe::London};

    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_new_rejects_inverted_range() {
        let err = TimeRange::new(utc("2024-07-13T10:00:00Z"), utc("2024-07-13T09:00:00Z"));
        assert!(matches!(err, Err(Error::Validation(_))));
    }

    #[test]
    fn test_all_day_range_is_local_midnight_to_midnight() {
        let range = TimeRange::from_all_day(date("2024-07-13"), date("2024-07-14"), &New_York);
        assert_eq!(range.start, utc("2024-07-13T04:00:00Z"));
        assert_eq!(range.end, utc("2024-07-14T04:00:00Z"));
    }

    #[test]
    fn test_midnight_end_belongs_to_previous_day() {
        let range = TimeRange::from_all_day(date("2024-07-13"), date("2024-07-15"), &London);
        assert_eq!(range.last_date(&London), date("2024-07-14"));
        assert_eq!(range.days(&London), vec![date("2024-07-13"), date("2024-07-14")]);
    }

    #[test]
    fn test_zero_length_range_at_midnight_keeps_its_day() {
        let at = start_of_day(date("2024-07-13"), &London);
        let range = TimeRange::new(at, at).unwrap();
        assert_eq!(range.days(&London), vec![date("2024-07-13")]);
    }

    #[test]
    fn test_overlap_is_half_open() {
        let a = TimeRange::new(utc("2024-07-13T09:00:00Z"), utc("2024-07-13T10:00:00Z")).unwrap();
        let b = TimeRange::new(utc("2024-07-13T10:00:00Z"), utc("2024-07-13T11:00:00Z")).unwrap();
        let c = TimeRange::new(utc("2024-07-13T09:30:00Z"), utc("2024-07-13T09:30:00Z")).unwrap();
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(!b.overlaps(&c));
        assert_eq!(a.intersect(&b), None);
    }

    #[test]
    fn test_local_instant_skips_dst_gap() {
        // 02:30 does not exist in New York on 2024-03-10.
        let instant = local_instant(
            date("2024-03-10"),
            NaiveTime::from_hms_opt(2, 30, 0).unwrap(),
            &New_York,
        );
        assert_eq!(instant, utc("2024-03-10T07:30:00Z"));
    }
}
