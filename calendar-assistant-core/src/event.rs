use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, time::TimeRange};

/// Summary prefix that marks an all-day event as a location record.
pub const LOCATION_MARKER: &str = "🗺  ";

/// Longest location text accepted for a location event.
pub const MAX_LOCATION_LEN: usize = 256;

/// Summary given to synthetic free-time events.
pub const AVAILABLE_SUMMARY: &str = "available";

/// The user's own answer to an invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseStatus {
    #[default]
    Accepted,
    Tentative,
    NeedsAction,
    Declined,
}

impl ResponseStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Tentative => "tentative",
            Self::NeedsAction => "needsAction",
            Self::Declined => "declined",
        }
    }

    /// Preference when several meetings compete for the same moment.
    /// Declined meetings never qualify.
    pub const fn preference(self) -> Option<u8> {
        match self {
            Self::Accepted => Some(3),
            Self::Tentative => Some(2),
            Self::NeedsAction => Some(1),
            Self::Declined => None,
        }
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "accepted" => Ok(Self::Accepted),
            "tentative" => Ok(Self::Tentative),
            "needsAction" => Ok(Self::NeedsAction),
            "declined" => Ok(Self::Declined),
            other => Err(Error::Validation(format!("unknown response status: {other}"))),
        }
    }
}

/// A place the user will be, stored as the summary of an all-day event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location(String);

impl Location {
    /// Validate user-supplied location text.
    pub fn new(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::Validation("location must not be empty".to_string()));
        }
        if text.chars().any(char::is_control) {
            return Err(Error::Validation(
                "location must not contain control characters".to_string(),
            ));
        }
        let len = text.chars().count();
        if len > MAX_LOCATION_LEN {
            return Err(Error::Validation(format!(
                "location is {len} characters long, the limit is {MAX_LOCATION_LEN}"
            )));
        }
        Ok(Self(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Event summary carrying this location.
    pub fn encode(&self) -> String {
        format!("{LOCATION_MARKER}{}", self.0)
    }

    /// Read a location back out of an event summary.
    pub fn decode(summary: &str) -> Option<Self> {
        let rest = summary.strip_prefix(LOCATION_MARKER.trim_end())?;
        Self::new(rest).ok()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Structural problems reported by the lint repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LintIssue {
    ZeroDuration,
    AwaitingResponse,
}

impl fmt::Display for LintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroDuration => f.write_str("zero duration"),
            Self::AwaitingResponse => f.write_str("awaiting your response"),
        }
    }
}

/// One calendar occurrence, normalized from the provider's representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub all_day: bool,
    /// False when the provider marks the event transparent.
    pub busy: bool,
    pub response_status: ResponseStatus,
    /// Attendees other than the user.
    pub attendee_count: usize,
    pub video_conference_uri: Option<String>,
    pub location_payload: Option<Location>,
    pub source_calendar_id: String,
}

impl Event {
    /// A busy, accepted, timed event. An `end` before `start` is clamped.
    pub fn new(
        source_calendar_id: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            summary: None,
            description: None,
            start,
            end: end.max(start),
            all_day: false,
            busy: true,
            response_status: ResponseStatus::Accepted,
            attendee_count: 0,
            video_conference_uri: None,
            location_payload: None,
            source_calendar_id: source_calendar_id.into(),
        }
    }

    /// A synthetic free block; never written to a calendar.
    pub fn available_block(range: TimeRange) -> Self {
        let mut event = Self::new(String::new(), range.start, range.end)
            .with_summary(AVAILABLE_SUMMARY)
            .transparent();
        event.id = Some(Uuid::new_v4().to_string());
        event
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub const fn with_response_status(mut self, status: ResponseStatus) -> Self {
        self.response_status = status;
        self
    }

    #[must_use]
    pub const fn with_attendees(mut self, count: usize) -> Self {
        self.attendee_count = count;
        self
    }

    #[must_use]
    pub fn with_video_conference_uri(mut self, uri: impl Into<String>) -> Self {
        self.video_conference_uri = Some(uri.into());
        self
    }

    #[must_use]
    pub const fn transparent(mut self) -> Self {
        self.busy = false;
        self
    }

    #[must_use]
    pub const fn all_day(mut self) -> Self {
        self.all_day = true;
        self
    }

    pub const fn range(&self) -> TimeRange {
        TimeRange {
            start: self.start,
            end: self.end,
        }
    }

    /// Whether this event removes time from the user's availability.
    pub fn blocks_availability(&self) -> bool {
        self.busy && self.response_status != ResponseStatus::Declined
    }

    /// Accepted, and shared with at least one other person.
    pub fn is_commitment(&self) -> bool {
        self.response_status == ResponseStatus::Accepted && self.attendee_count > 0
    }

    pub const fn is_self_only(&self) -> bool {
        self.attendee_count == 0
    }

    pub fn lint_issues(&self) -> Vec<LintIssue> {
        let mut issues = Vec::new();
        if !self.all_day && self.start == self.end {
            issues.push(LintIssue::ZeroDuration);
        }
        if self.response_status == ResponseStatus::NeedsAction {
            issues.push(LintIssue::AwaitingResponse);
        }
        issues
    }

    pub fn title(&self) -> &str {
        self.summary.as_deref().unwrap_or("(no title)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_response_status_round_trips_provider_names() {
        for status in [
            ResponseStatus::Accepted,
            ResponseStatus::Tentative,
            ResponseStatus::NeedsAction,
            ResponseStatus::Declined,
        ] {
            assert_eq!(status.as_str().parse::<ResponseStatus>().unwrap(), status);
        }
        assert!("maybe".parse::<ResponseStatus>().is_err());
    }

    #[test]
    fn test_location_validation() {
        assert!(Location::new("Hogwarts").is_ok());
        assert!(Location::new("   ").is_err());
        assert!(Location::new("Hog\nwarts").is_err());
        assert!(Location::new(&"x".repeat(MAX_LOCATION_LEN + 1)).is_err());
        assert!(Location::new(&"x".repeat(MAX_LOCATION_LEN)).is_ok());
    }

    #[test]
    fn test_location_summary_encoding() {
        let location = Location::new("Hogwarts").unwrap();
        let summary = location.encode();
        assert_eq!(summary, "🗺  Hogwarts");
        assert_eq!(Location::decode(&summary), Some(location));
        assert_eq!(Location::decode("Lunch"), None);
    }

    #[test]
    fn test_declined_events_never_block_availability() {
        let event = Event::new("primary", utc("2024-07-13T09:00:00Z"), utc("2024-07-13T10:00:00Z"))
            .with_response_status(ResponseStatus::Declined);
        assert!(event.busy);
        assert!(!event.blocks_availability());
    }

    #[test]
    fn test_lint_issues() {
        let at = utc("2024-07-13T09:00:00Z");
        let event = Event::new("primary", at, at).with_response_status(ResponseStatus::NeedsAction);
        assert_eq!(
            event.lint_issues(),
            vec![LintIssue::ZeroDuration, LintIssue::AwaitingResponse]
        );

        let fine = Event::new("primary", at, at + chrono::Duration::minutes(30));
        assert!(fine.lint_issues().is_empty());
    }

    #[test]
    fn test_available_block_is_transparent() {
        let range = TimeRange::new(utc("2024-07-13T09:00:00Z"), utc("2024-07-13T10:00:00Z")).unwrap();
        let block = Event::available_block(range);
        assert!(!block.busy);
        assert_eq!(block.summary.as_deref(), Some(AVAILABLE_SUMMARY));
        assert_eq!(block.range(), range);
    }
}
