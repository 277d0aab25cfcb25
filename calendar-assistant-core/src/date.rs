//! Free-text dates and times.
//!
//! The rest of the crate only needs [`TimeRange`]s and instants; how text
//! becomes a date is hidden behind [`DateResolver`].

use std::sync::LazyLock;

use chrono::{
    DateTime, Datelike, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday,
};
use chrono_tz::Tz;
use regex::Regex;

use crate::{
    Error, Result,
    time::{TimeRange, resolve_local, start_of_day},
};

static RANGE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\.{2,3}\s*").expect("range separator pattern is valid"));

static TIME_OF_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})(?::(\d{2}))?(?::(\d{2}))?\s*(am|pm)?$")
        .expect("time of day pattern is valid")
});

static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\s*\d+\s*[a-z]*)+\s*$").expect("duration pattern is valid")
});

static DURATION_PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*([a-z]*)").expect("duration part pattern is valid"));

static WEEKDAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(next|last|this)\s+)?([a-z]+)$").expect("weekday pattern is valid")
});

static RELATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(in\s+)?(\d+|an?|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve)\s+(seconds?|secs?|minutes?|mins?|hours?|hrs?|days?|weeks?)(?:\s+(ago|from\s+now|later))?$",
    )
    .expect("relative expression pattern is valid")
});

/// What a date expression names: a whole day or a precise instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    Date(NaiveDate),
    Instant(DateTime<Utc>),
}

impl Resolved {
    /// The first instant this value covers.
    pub fn start(self, tz: &Tz) -> DateTime<Utc> {
        match self {
            Self::Date(date) => start_of_day(date, tz),
            Self::Instant(instant) => instant,
        }
    }

    /// The local date this value falls on.
    pub fn date(self, tz: &Tz) -> NaiveDate {
        match self {
            Self::Date(date) => date,
            Self::Instant(instant) => instant.with_timezone(tz).date_naive(),
        }
    }
}

/// Turns one free-text expression into a date or an instant, relative to
/// `now` and in `now`'s timezone.
pub trait DateResolver: Send + Sync {
    fn resolve(&self, text: &str, now: DateTime<Tz>) -> Result<Resolved>;
}

/// The bundled English resolver.
///
/// Understands `now`, `today`, `tomorrow`, `yesterday`, weekday names with an
/// optional `next`/`last`/`this`, ISO dates and date-times, RFC 3339, bare
/// times such as `9am` or `14:30`, and relative expressions such as
/// `5 minutes ago`, `in 2 hours` or `3 days from now`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaturalDateResolver;

impl NaturalDateResolver {
    pub const fn new() -> Self {
        Self
    }

    fn weekday(text: &str, today: NaiveDate) -> Option<NaiveDate> {
        let captures = WEEKDAY.captures(text)?;
        let weekday: Weekday = captures.get(2)?.as_str().parse().ok()?;
        let ahead = i64::from(
            (weekday.num_days_from_monday() + 7 - today.weekday().num_days_from_monday()) % 7,
        );
        let offset = match captures.get(1).map(|m| m.as_str()) {
            None | Some("this") => ahead,
            Some("next") if ahead == 0 => 7,
            Some("next") => ahead,
            _ if ahead == 0 => -7,
            _ => ahead - 7,
        };
        today.checked_add_signed(Duration::days(offset))
    }

    fn relative(text: &str, now: DateTime<Tz>) -> Option<DateTime<Utc>> {
        let captures = RELATIVE.captures(text)?;
        let prefixed = captures.get(1).is_some();
        let direction = captures.get(4).map(|m| m.as_str());
        let sign = match (prefixed, direction) {
            (true, None) => 1,
            (false, Some("ago")) => -1,
            (false, Some(_)) => 1,
            _ => return None,
        };
        let amount = number(captures.get(2)?.as_str())?.checked_mul(sign)?;
        let unit = captures.get(3)?.as_str();
        let delta = match unit.trim_end_matches('s') {
            "sec" | "second" => Duration::try_seconds(amount),
            "min" | "minute" => Duration::try_minutes(amount),
            "hr" | "hour" => Duration::try_hours(amount),
            "day" => Duration::try_days(amount),
            "week" => Duration::try_weeks(amount),
            _ => None,
        }?;
        now.with_timezone(&Utc).checked_add_signed(delta)
    }

    fn date_time(text: &str, tz: &Tz) -> Option<DateTime<Utc>> {
        if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
            return Some(instant.with_timezone(&Utc));
        }
        ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
            .map(|naive| resolve_local(naive, tz))
    }
}

impl DateResolver for NaturalDateResolver {
    fn resolve(&self, text: &str, now: DateTime<Tz>) -> Result<Resolved> {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let normalized = collapsed.to_lowercase();
        let tz = now.timezone();
        let today = now.date_naive();

        let resolved = match normalized.as_str() {
            "" => None,
            "now" => Some(Resolved::Instant(now.with_timezone(&Utc))),
            "today" => Some(Resolved::Date(today)),
            "tomorrow" => today.checked_add_days(Days::new(1)).map(Resolved::Date),
            "yesterday" => today.checked_sub_days(Days::new(1)).map(Resolved::Date),
            other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
                .ok()
                .map(Resolved::Date)
                .or_else(|| Self::date_time(&collapsed, &tz).map(Resolved::Instant))
                .or_else(|| Self::weekday(other, today).map(Resolved::Date))
                .or_else(|| Self::relative(other, now).map(Resolved::Instant))
                .or_else(|| {
                    time_of_day(other)
                        .map(|time| Resolved::Instant(resolve_local(today.and_time(time), &tz)))
                }),
        };

        resolved.ok_or_else(|| Error::Validation(format!("could not understand date: {text:?}")))
    }
}

/// Resolve a date expression, or a range of two joined by `..` or `...`,
/// into a [`TimeRange`].
///
/// A single expression covers its whole local day. A range of two instants
/// is taken exactly; any other range covers the first day through the end of
/// the last.
pub fn parse_datespec(
    resolver: &dyn DateResolver,
    text: &str,
    now: DateTime<Tz>,
) -> Result<TimeRange> {
    let tz = now.timezone();
    let parts: Vec<&str> = RANGE_SEPARATOR.splitn(text.trim(), 2).collect();

    match parts.as_slice() {
        [single] => {
            let resolved = resolver.resolve(single, now)?;
            Ok(TimeRange::for_day(resolved.date(&tz), &tz))
        }
        [first, last] => {
            let first = resolver.resolve(first, now)?;
            let last = resolver.resolve(last, now)?;
            match (first, last) {
                (Resolved::Instant(start), Resolved::Instant(end)) => TimeRange::new(start, end),
                _ => {
                    let (first, last) = (first.date(&tz), last.date(&tz));
                    if first > last {
                        return Err(Error::Validation(format!(
                            "range ends on {last}, before it starts on {first}"
                        )));
                    }
                    Ok(TimeRange::for_days(first, last, &tz))
                }
            }
        }
        _ => Err(Error::Validation(format!("could not understand date: {text:?}"))),
    }
}

/// Resolve a single expression to an instant; a bare date means its local
/// midnight.
pub fn parse_instant(
    resolver: &dyn DateResolver,
    text: &str,
    now: DateTime<Tz>,
) -> Result<DateTime<Utc>> {
    let tz = now.timezone();
    Ok(resolver.resolve(text, now)?.start(&tz))
}

/// Parse a configured time of day such as `9am`, `6:30pm`, `14:30` or
/// `noon`.
pub fn parse_time_of_day(text: &str) -> Result<NaiveTime> {
    time_of_day(&text.trim().to_lowercase())
        .ok_or_else(|| Error::Config(format!("invalid time of day: {text:?}")))
}

/// Parse a configured duration such as `30m`, `1h30m`, `90 minutes` or a
/// bare number of minutes.
pub fn parse_duration(text: &str) -> Result<Duration> {
    let invalid = || Error::Config(format!("invalid duration: {text:?}"));
    let normalized = text.trim().to_lowercase();
    if normalized.is_empty() || !DURATION.is_match(&normalized) {
        return Err(invalid());
    }

    let parts: Vec<_> = DURATION_PART.captures_iter(&normalized).collect();
    let mut total = Duration::zero();
    for captures in &parts {
        let amount: i64 = captures[1].parse().map_err(|_| invalid())?;
        let unit = match &captures[2] {
            "" if parts.len() == 1 => Duration::minutes(1),
            "w" | "week" | "weeks" => Duration::weeks(1),
            "d" | "day" | "days" => Duration::days(1),
            "h" | "hr" | "hrs" | "hour" | "hours" => Duration::hours(1),
            "m" | "min" | "mins" | "minute" | "minutes" => Duration::minutes(1),
            "s" | "sec" | "secs" | "second" | "seconds" => Duration::seconds(1),
            _ => return Err(invalid()),
        };
        let part = i32::try_from(amount)
            .ok()
            .and_then(|amount| unit.checked_mul(amount))
            .ok_or_else(invalid)?;
        total = total.checked_add(&part).ok_or_else(invalid)?;
    }

    if total <= Duration::zero() {
        return Err(Error::Config(format!("duration must be positive: {text:?}")));
    }
    Ok(total)
}

fn time_of_day(text: &str) -> Option<NaiveTime> {
    match text {
        "noon" | "midday" => return NaiveTime::from_hms_opt(12, 0, 0),
        "midnight" => return Some(NaiveTime::MIN),
        _ => {}
    }

    let captures = TIME_OF_DAY.captures(text)?;
    let hour: u32 = captures[1].parse().ok()?;
    let minute: u32 = captures.get(2).map_or(Some(0), |m| m.as_str().parse().ok())?;
    let second: u32 = captures.get(3).map_or(Some(0), |m| m.as_str().parse().ok())?;
    let hour = match captures.get(4).map(|m| m.as_str()) {
        Some(_) if !(1..=12).contains(&hour) => return None,
        Some("am") => hour % 12,
        Some(_) => hour % 12 + 12,
        // A lone number is too ambiguous to be a time.
        None if captures.get(2).is_none() => return None,
        None => hour,
    };
    NaiveTime::from_hms_opt(hour, minute, second)
}

fn number(text: &str) -> Option<i64> {
    let value = match text {
        "a" | "an" | "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        digits => return digits.parse().ok(),
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono_tz::Europe::London;

    use super::*;

    // Saturday
    fn now() -> DateTime<Tz> {
        London.with_ymd_and_hms(2024, 7, 13, 12, 1, 1).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn resolve(text: &str) -> Resolved {
        NaturalDateResolver.resolve(text, now()).unwrap()
    }

    fn datespec(text: &str) -> Result<TimeRange> {
        parse_datespec(&NaturalDateResolver, text, now())
    }

    #[test]
    fn test_named_days() {
        assert_eq!(resolve("today"), Resolved::Date(date("2024-07-13")));
        assert_eq!(resolve(" Tomorrow "), Resolved::Date(date("2024-07-14")));
        assert_eq!(resolve("yesterday"), Resolved::Date(date("2024-07-12")));
        assert_eq!(resolve("now"), Resolved::Instant(utc("2024-07-13T11:01:01Z")));
    }

    #[test]
    fn test_weekdays() {
        assert_eq!(resolve("monday"), Resolved::Date(date("2024-07-15")));
        assert_eq!(resolve("sat"), Resolved::Date(date("2024-07-13")));
        assert_eq!(resolve("next saturday"), Resolved::Date(date("2024-07-20")));
        assert_eq!(resolve("next friday"), Resolved::Date(date("2024-07-19")));
        assert_eq!(resolve("last friday"), Resolved::Date(date("2024-07-12")));
        assert_eq!(resolve("last saturday"), Resolved::Date(date("2024-07-06")));
    }

    #[test]
    fn test_absolute_dates_and_times() {
        assert_eq!(resolve("2024-08-01"), Resolved::Date(date("2024-08-01")));
        assert_eq!(
            resolve("2024-08-01T09:30"),
            Resolved::Instant(utc("2024-08-01T08:30:00Z"))
        );
        assert_eq!(
            resolve("2024-08-01 09:30:00"),
            Resolved::Instant(utc("2024-08-01T08:30:00Z"))
        );
        assert_eq!(
            resolve("2024-08-01T09:30:00-04:00"),
            Resolved::Instant(utc("2024-08-01T13:30:00Z"))
        );
        assert_eq!(resolve("9am"), Resolved::Instant(utc("2024-07-13T08:00:00Z")));
        assert_eq!(resolve("14:30"), Resolved::Instant(utc("2024-07-13T13:30:00Z")));
    }

    #[test]
    fn test_relative_expressions() {
        assert_eq!(
            resolve("5 minutes ago"),
            Resolved::Instant(utc("2024-07-13T10:56:01Z"))
        );
        assert_eq!(resolve("in 2 hours"), Resolved::Instant(utc("2024-07-13T13:01:01Z")));
        assert_eq!(
            resolve("three days from now"),
            Resolved::Instant(utc("2024-07-16T11:01:01Z"))
        );
        assert_eq!(resolve("an hour later"), Resolved::Instant(utc("2024-07-13T12:01:01Z")));
    }

    #[test]
    fn test_unknown_text_is_rejected() {
        for text in ["", "soonish", "5 minutes", "in 5 minutes ago", "25:00", "13pm"] {
            assert!(
                matches!(NaturalDateResolver.resolve(text, now()), Err(Error::Validation(_))),
                "{text:?} should not resolve"
            );
        }
    }

    #[test]
    fn test_out_of_range_relative_expressions_are_rejected() {
        for text in [
            "in 999999999999999 days",
            "999999999999999 weeks ago",
            "in 99999999999999999999 seconds",
            "in 9999999999 weeks",
        ] {
            assert!(
                matches!(NaturalDateResolver.resolve(text, now()), Err(Error::Validation(_))),
                "{text:?} should not resolve"
            );
        }
        assert!(matches!(
            datespec("in 999999999999999 days"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_single_date_is_whole_day() {
        let range = datespec("today").unwrap();
        assert_eq!(range.start, utc("2024-07-12T23:00:00Z"));
        assert_eq!(range.end, utc("2024-07-13T23:00:00Z"));
        assert_eq!(datespec("now").unwrap(), range);
    }

    #[test]
    fn test_range_separators_tolerate_spacing() {
        let expected = TimeRange::for_days(date("2024-07-13"), date("2024-07-15"), &London);
        for text in [
            "today..monday",
            "today...monday",
            "today .. monday",
            "today ... monday",
            "today  ..monday",
        ] {
            assert_eq!(datespec(text).unwrap(), expected, "{text:?}");
        }
    }

    #[test]
    fn test_instant_ranges_are_exact() {
        let range = datespec("9am..14:30").unwrap();
        assert_eq!(range.start, utc("2024-07-13T08:00:00Z"));
        assert_eq!(range.end, utc("2024-07-13T13:30:00Z"));
    }

    #[test]
    fn test_mixed_range_covers_whole_days() {
        let range = datespec("now..tomorrow").unwrap();
        assert_eq!(
            range,
            TimeRange::for_days(date("2024-07-13"), date("2024-07-14"), &London)
        );
    }

    #[test]
    fn test_inverted_ranges_are_rejected() {
        assert!(matches!(datespec("tomorrow..today"), Err(Error::Validation(_))));
        assert!(matches!(datespec("14:30..9am"), Err(Error::Validation(_))));
        assert!(datespec("today..").is_err());
    }

    #[test]
    fn test_parse_instant_of_date_is_midnight() {
        let instant = parse_instant(&NaturalDateResolver, "tomorrow", now()).unwrap();
        assert_eq!(instant, utc("2024-07-13T23:00:00Z"));
    }

    #[test]
    fn test_parse_time_of_day() {
        let time = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        assert_eq!(parse_time_of_day("9am").unwrap(), time(9, 0));
        assert_eq!(parse_time_of_day("6:30 PM").unwrap(), time(18, 30));
        assert_eq!(parse_time_of_day("12am").unwrap(), time(0, 0));
        assert_eq!(parse_time_of_day("12pm").unwrap(), time(12, 0));
        assert_eq!(parse_time_of_day("14:30").unwrap(), time(14, 30));
        assert_eq!(parse_time_of_day("noon").unwrap(), time(12, 0));
        for bad in ["", "9", "25:00", "13pm", "9:75", "teatime"] {
            assert!(
                matches!(parse_time_of_day(bad), Err(Error::Config(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("30m").unwrap(), Duration::minutes(30));
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::minutes(90));
        assert_eq!(parse_duration("1 hour 15 minutes").unwrap(), Duration::minutes(75));
        assert_eq!(parse_duration("45").unwrap(), Duration::minutes(45));
        assert_eq!(parse_duration("2H").unwrap(), Duration::hours(2));
        for bad in ["", "0m", "thirty minutes", "30x", "1h 30", "-5m"] {
            assert!(
                matches!(parse_duration(bad), Err(Error::Config(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
