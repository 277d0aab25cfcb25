//! Google Calendar v3 REST client.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use reqwest::{Client, ClientBuilder, RequestBuilder, Url};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    Error, Result,
    client::{CalendarClient, EventTiming, NewEvent},
    event::{Event, ResponseStatus},
    meeting::find_video_uri,
    time::{TimeRange, start_of_day},
};

pub const DEFAULT_ENDPOINT: &str = "https://www.googleapis.com/calendar/v3";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
const PAGE_SIZE: &str = "2500";

pub struct GoogleCalendarClientBuilder {
    client_builder: ClientBuilder,
    endpoint: String,
    access_token: String,
}

impl GoogleCalendarClientBuilder {
    pub fn new(access_token: impl Into<String>) -> Self {
        let client_builder = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent(concat!("calendar-assistant/", env!("CARGO_PKG_VERSION")));

        Self {
            client_builder,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            access_token: access_token.into(),
        }
    }

    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout_secs: u64) -> Self {
        self.client_builder = self
            .client_builder
            .timeout(Duration::from_secs(timeout_secs));
        self
    }

    pub fn build(self) -> Result<GoogleCalendarClient> {
        if self.access_token.trim().is_empty() {
            return Err(Error::Config("access token must not be empty".to_string()));
        }
        let endpoint = Url::parse(&self.endpoint).map_err(|e| {
            Error::Config(format!("invalid calendar endpoint '{}': {e}", self.endpoint))
        })?;
        if endpoint.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "calendar endpoint '{endpoint}' must be a base URL"
            )));
        }

        Ok(GoogleCalendarClient {
            http: self.client_builder.build()?,
            endpoint,
            access_token: self.access_token,
        })
    }
}

pub struct GoogleCalendarClient {
    http: Client,
    endpoint: Url,
    access_token: String,
}

impl GoogleCalendarClient {
    pub fn builder(access_token: impl Into<String>) -> GoogleCalendarClientBuilder {
        GoogleCalendarClientBuilder::new(access_token)
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.endpoint.clone();
        // `build` rejects endpoints that cannot carry path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn handle_error_req(calendar_id: &str, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::Timeout
        } else if error.is_request() || error.is_connect() {
            Error::Repository {
                calendar_id: calendar_id.to_string(),
                message: format!("Request failed: {error}"),
            }
        } else {
            Error::Http(error)
        }
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        calendar_id: &str,
        request: RequestBuilder,
        operation: &str,
    ) -> Result<T> {
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| Self::handle_error_req(calendar_id, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Repository {
                calendar_id: calendar_id.to_string(),
                message: format!("{operation} failed with status {status}: {body}"),
            });
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl CalendarClient for GoogleCalendarClient {
    fn name(&self) -> &str {
        "google"
    }

    async fn time_zone(&self, calendar_id: &str) -> Result<Tz> {
        let url = self.url(&["calendars", calendar_id]);
        let calendar: ApiCalendar = self
            .send_json(calendar_id, self.http.get(url), "get calendar")
            .await?;
        let name = calendar.time_zone.ok_or_else(|| Error::Repository {
            calendar_id: calendar_id.to_string(),
            message: "calendar has no time zone".to_string(),
        })?;
        parse_time_zone(calendar_id, &name)
    }

    async fn list_events(&self, calendar_id: &str, range: &TimeRange) -> Result<Vec<Event>> {
        let url = self.url(&["calendars", calendar_id, "events"]);
        let params: [(&str, String); 5] = [
            ("timeMin", range.start.to_rfc3339()),
            ("timeMax", range.end.to_rfc3339()),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
            ("maxResults", PAGE_SIZE.to_string()),
        ];

        let mut events = Vec::new();
        let mut time_zone: Option<Tz> = None;
        let mut page_token: Option<String> = None;
        loop {
            let mut request = self.http.get(url.clone()).query(&params);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }
            let page: ApiEventList = self.send_json(calendar_id, request, "list events").await?;

            let tz = match (time_zone, page.time_zone.as_deref()) {
                (Some(tz), _) => tz,
                (None, Some(name)) => parse_time_zone(calendar_id, name)?,
                (None, None) => self.time_zone(calendar_id).await?,
            };
            time_zone = Some(tz);

            events.extend(
                page.items
                    .into_iter()
                    .filter_map(|item| item.into_event(calendar_id, &tz)),
            );

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!(
            calendar_id,
            start = %range.start,
            end = %range.end,
            count = events.len(),
            "listed events"
        );
        Ok(events)
    }

    async fn insert_event(&self, calendar_id: &str, event: &NewEvent) -> Result<Event> {
        let url = self.url(&["calendars", calendar_id, "events"]);
        let (start, end) = match event.timing {
            EventTiming::Timed(range) => (
                ApiEventDateTime::instant(range.start, &event.time_zone),
                ApiEventDateTime::instant(range.end, &event.time_zone),
            ),
            EventTiming::AllDay { start, end } => {
                (ApiEventDateTime::date(start), ApiEventDateTime::date(end))
            }
        };
        let body = ApiEventWrite {
            summary: &event.summary,
            description: event.description.as_deref(),
            start,
            end,
            transparency: if event.transparent {
                "transparent"
            } else {
                "opaque"
            },
        };

        let created: ApiEvent = self
            .send_json(
                calendar_id,
                self.http.post(url).json(&body),
                "insert event",
            )
            .await?;
        tracing::info!(calendar_id, summary = %event.summary, "created event");

        created
            .into_event(calendar_id, &event.time_zone)
            .ok_or_else(|| Error::Repository {
                calendar_id: calendar_id.to_string(),
                message: "provider returned an event without start or end".to_string(),
            })
    }
}

fn parse_time_zone(calendar_id: &str, name: &str) -> Result<Tz> {
    name.parse::<Tz>().map_err(|_| Error::Repository {
        calendar_id: calendar_id.to_string(),
        message: format!("unknown time zone: {name}"),
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCalendar {
    time_zone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventList {
    #[serde(default)]
    items: Vec<ApiEvent>,
    time_zone: Option<String>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    id: Option<String>,
    status: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    location: Option<String>,
    transparency: Option<String>,
    start: Option<ApiEventDateTime>,
    end: Option<ApiEventDateTime>,
    attendees: Option<Vec<ApiAttendee>>,
    organizer: Option<ApiOrganizer>,
    hangout_link: Option<String>,
    conference_data: Option<ApiConferenceData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiAttendee {
    #[serde(rename = "self", default)]
    is_self: bool,
    #[serde(default)]
    resource: bool,
    response_status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiOrganizer {
    #[serde(rename = "self", default)]
    is_self: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiConferenceData {
    #[serde(default)]
    entry_points: Vec<ApiEntryPoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEntryPoint {
    entry_point_type: Option<String>,
    uri: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventDateTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_zone: Option<String>,
}

#[derive(Debug, Serialize)]
struct ApiEventWrite<'a> {
    summary: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    start: ApiEventDateTime,
    end: ApiEventDateTime,
    transparency: &'static str,
}

enum Bound {
    Instant(DateTime<Utc>),
    Date(NaiveDate),
}

impl ApiEventDateTime {
    fn instant(at: DateTime<Utc>, tz: &Tz) -> Self {
        Self {
            date_time: Some(at.with_timezone(tz).to_rfc3339()),
            date: None,
            time_zone: Some(tz.name().to_string()),
        }
    }

    fn date(date: NaiveDate) -> Self {
        Self {
            date_time: None,
            date: Some(date.format("%Y-%m-%d").to_string()),
            time_zone: None,
        }
    }

    fn bound(&self) -> Option<Bound> {
        if let Some(date_time) = &self.date_time {
            return DateTime::parse_from_rfc3339(date_time)
                .ok()
                .map(|dt| Bound::Instant(dt.with_timezone(&Utc)));
        }
        self.date
            .as_deref()
            .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
            .map(Bound::Date)
    }
}

impl Bound {
    fn instant(&self, tz: &Tz) -> DateTime<Utc> {
        match self {
            Self::Instant(at) => *at,
            Self::Date(date) => start_of_day(*date, tz),
        }
    }
}

impl ApiEvent {
    fn into_event(self, calendar_id: &str, tz: &Tz) -> Option<Event> {
        if self.status.as_deref() == Some("cancelled") {
            return None;
        }
        let bounds = self
            .start
            .as_ref()
            .and_then(ApiEventDateTime::bound)
            .zip(self.end.as_ref().and_then(ApiEventDateTime::bound));
        let Some((start, end)) = bounds else {
            tracing::warn!(calendar_id, id = ?self.id, "skipping event without usable start/end");
            return None;
        };

        let mut event = match (&start, &end) {
            (Bound::Date(start), Bound::Date(end)) => {
                let range = TimeRange::from_all_day(*start, *end, tz);
                Event::new(calendar_id, range.start, range.end).all_day()
            }
            _ => Event::new(calendar_id, start.instant(tz), end.instant(tz)),
        };

        event.busy = self.transparency.as_deref() != Some("transparent");
        event.response_status = self.response_status();
        event.attendee_count = self
            .attendees
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(|attendee| !attendee.is_self && !attendee.resource)
            .count();
        event.video_conference_uri = self.video_conference_uri();
        event.id = self.id;
        event.summary = self.summary;
        event.description = self.description;
        Some(event)
    }

    fn response_status(&self) -> ResponseStatus {
        if self.organizer.as_ref().is_some_and(|o| o.is_self) {
            return ResponseStatus::Accepted;
        }
        self.attendees
            .as_deref()
            .unwrap_or_default()
            .iter()
            .find(|attendee| attendee.is_self)
            .and_then(|attendee| attendee.response_status.as_deref())
            .map_or(ResponseStatus::Accepted, |status| {
                status.parse().unwrap_or(ResponseStatus::NeedsAction)
            })
    }

    fn video_conference_uri(&self) -> Option<String> {
        let entry_point = self.conference_data.as_ref().and_then(|data| {
            data.entry_points
                .iter()
                .find(|entry| entry.entry_point_type.as_deref() == Some("video"))
                .and_then(|entry| entry.uri.clone())
        });
        entry_point
            .or_else(|| self.hangout_link.clone())
            .or_else(|| self.location.as_deref().and_then(find_video_uri))
            .or_else(|| self.description.as_deref().and_then(find_video_uri))
    }
}
