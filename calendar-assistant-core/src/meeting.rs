//! Picking the video call to join at a given moment.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;

use crate::{event::Event, time::TimeRange};

static MEETING_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"https://(?:[\w-]+\.)*(?:zoom\.us/(?:j|my|w)/|meet\.google\.com/|teams\.microsoft\.com/l/meetup-join/|webex\.com/(?:meet|join)/)[^\s<>"']+"#,
    )
    .expect("meeting url pattern is valid")
});

/// The first recognizable video-call URL in free text.
pub fn find_video_uri(text: &str) -> Option<String> {
    MEETING_URL.find(text).map(|m| m.as_str().to_string())
}

/// The window searched for a meeting at `target`: from the instant to one
/// minute after it, so meetings starting right at the instant are found.
pub fn search_window(target: DateTime<Utc>) -> TimeRange {
    TimeRange {
        start: target,
        end: target + Duration::minutes(1),
    }
}

/// A meeting and the URL used to join it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingLink {
    pub event: Event,
    pub uri: String,
}

/// Choose the best meeting among `events`, which must be ordered by start.
///
/// Accepted beats tentative beats needs-action; declined events and events
/// without a URI never qualify. Among equally ranked events the later one
/// wins.
pub fn select_meeting_link<'a, I>(events: I) -> Option<MeetingLink>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut best: Option<(u8, &Event, &str)> = None;
    for event in events {
        let Some(uri) = event.video_conference_uri.as_deref() else {
            continue;
        };
        let Some(rank) = event.response_status.preference() else {
            continue;
        };
        if best.is_none_or(|(best_rank, _, _)| rank >= best_rank) {
            best = Some((rank, event, uri));
        }
    }

    best.map(|(_, event, uri)| MeetingLink {
        event: event.clone(),
        uri: uri.to_string(),
    })
}
