use std::{collections::BTreeMap, fmt, slice, vec};

use crate::{
    event::{Event, ResponseStatus},
    repository::RepositoryKind,
};

/// Named criteria an event can be tested against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Predicate {
    Accepted,
    Tentative,
    NeedsAction,
    Declined,
    Busy,
    AllDay,
    /// Accepted and shared with someone else.
    Commitment,
    /// No attendees besides the user.
    SelfOnly,
    /// Has at least one lint issue.
    Suspect,
}

impl Predicate {
    pub fn evaluate(self, event: &Event) -> bool {
        match self {
            Self::Accepted => event.response_status == ResponseStatus::Accepted,
            Self::Tentative => event.response_status == ResponseStatus::Tentative,
            Self::NeedsAction => event.response_status == ResponseStatus::NeedsAction,
            Self::Declined => event.response_status == ResponseStatus::Declined,
            Self::Busy => event.busy,
            Self::AllDay => event.all_day,
            Self::Commitment => event.is_commitment(),
            Self::SelfOnly => event.is_self_only(),
            Self::Suspect => !event.lint_issues().is_empty(),
        }
    }
}

/// A mapping from criterion to the value an event must produce for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicates(BTreeMap<Predicate, bool>);

impl Predicates {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, predicate: Predicate, expected: bool) -> Self {
        self.0.insert(predicate, expected);
        self
    }

    pub fn insert(&mut self, predicate: Predicate, expected: bool) {
        self.0.insert(predicate, expected);
    }

    pub fn get(&self, predicate: Predicate) -> Option<bool> {
        self.0.get(&predicate).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries of `overrides` replace entries of `self`.
    #[must_use]
    pub fn merged(&self, overrides: &Self) -> Self {
        let mut merged = self.clone();
        merged.0.extend(overrides.0.iter().map(|(k, v)| (*k, *v)));
        merged
    }

    pub fn matches(&self, event: &Event) -> bool {
        self.0
            .iter()
            .all(|(predicate, expected)| predicate.evaluate(event) == *expected)
    }
}

impl FromIterator<(Predicate, bool)> for Predicates {
    fn from_iter<I: IntoIterator<Item = (Predicate, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Where the events of an [`EventSet`] came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventSource {
    Repository {
        calendar_id: String,
        kind: RepositoryKind,
    },
    /// Computed locally, e.g. available blocks. Not writable.
    Synthetic,
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Repository { calendar_id, kind } => write!(f, "{calendar_id} ({kind})"),
            Self::Synthetic => f.write_str("synthetic"),
        }
    }
}

/// Events ordered by start time, tagged with their source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSet {
    source: EventSource,
    events: Vec<Event>,
}

impl EventSet {
    /// Sorts `events` by start; events with equal starts keep their order.
    pub fn new(source: EventSource, mut events: Vec<Event>) -> Self {
        events.sort_by_key(|event| event.start);
        Self { source, events }
    }

    pub fn synthetic(events: Vec<Event>) -> Self {
        Self::new(EventSource::Synthetic, events)
    }

    pub const fn source(&self) -> &EventSource {
        &self.source
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn iter(&self) -> slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// A new set with the same source holding only matching events.
    #[must_use]
    pub fn filter<F>(&self, predicate: F) -> Self
    where
        F: Fn(&Event) -> bool,
    {
        Self {
            source: self.source.clone(),
            events: self
                .events
                .iter()
                .filter(|event| predicate(event))
                .cloned()
                .collect(),
        }
    }

    #[must_use]
    pub fn filter_by(&self, predicates: &Predicates) -> Self {
        self.filter(|event| predicates.matches(event))
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}

impl IntoIterator for EventSet {
    type Item = Event;
    type IntoIter = vec::IntoIter<Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<'a> IntoIterator for &'a EventSet {
    type Item = &'a Event;
    type IntoIter = slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn source() -> EventSource {
        EventSource::Repository {
            calendar_id: "primary".to_string(),
            kind: RepositoryKind::Default,
        }
    }

    #[test]
    fn test_events_are_sorted_by_start() {
        let late = Event::new("primary", utc("2024-07-13T11:00:00Z"), utc("2024-07-13T12:00:00Z"))
            .with_summary("late");
        let early = Event::new("primary", utc("2024-07-13T09:00:00Z"), utc("2024-07-13T10:00:00Z"))
            .with_summary("early");
        let set = EventSet::new(source(), vec![late, early]);
        let titles: Vec<_> = set.iter().map(Event::title).collect();
        assert_eq!(titles, vec!["early", "late"]);
    }

    #[test]
    fn test_filter_keeps_source() {
        let accepted = Event::new("primary", utc("2024-07-13T09:00:00Z"), utc("2024-07-13T10:00:00Z"))
            .with_attendees(2);
        let declined = Event::new("primary", utc("2024-07-13T10:00:00Z"), utc("2024-07-13T11:00:00Z"))
            .with_response_status(ResponseStatus::Declined);
        let set = EventSet::new(source(), vec![accepted.clone(), declined]);

        let commitments = set.filter_by(&Predicates::new().with(Predicate::Commitment, true));
        assert_eq!(commitments.source(), set.source());
        assert_eq!(commitments.events(), &[accepted]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_predicates_require_every_entry() {
        let event = Event::new("primary", utc("2024-07-13T09:00:00Z"), utc("2024-07-13T10:00:00Z"))
            .transparent();
        let predicates = Predicates::new()
            .with(Predicate::Accepted, true)
            .with(Predicate::Busy, false);
        assert!(predicates.matches(&event));
        assert!(!predicates.with(Predicate::AllDay, true).matches(&event));
        assert!(Predicates::new().matches(&event));
    }

    #[test]
    fn test_merged_predicates_prefer_overrides() {
        let base = Predicates::new().with(Predicate::Suspect, true);
        let merged = base.merged(&Predicates::new().with(Predicate::Suspect, false));
        assert_eq!(merged.get(Predicate::Suspect), Some(false));
    }
}
