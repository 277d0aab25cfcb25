use calendar_assistant_core::{
    event::{Event, ResponseStatus},
    event_set::EventSet,
    time::TimeRange,
};
use chrono_tz::Tz;

/// `Mon 15 Jul 09:00-10:30`, or the dates alone for all-day events.
pub fn format_span(range: &TimeRange, all_day: bool, tz: &Tz) -> String {
    let start = range.start.with_timezone(tz);
    let end = range.end.with_timezone(tz);

    if all_day {
        let first = range.first_date(tz);
        let last = range.last_date(tz);
        return if first == last {
            format!("{} all day", first.format("%a %d %b"))
        } else {
            format!("{} - {}", first.format("%a %d %b"), last.format("%a %d %b"))
        };
    }

    if start.date_naive() == end.date_naive() {
        format!("{}-{}", start.format("%a %d %b %H:%M"), end.format("%H:%M"))
    } else {
        format!(
            "{} - {}",
            start.format("%a %d %b %H:%M"),
            end.format("%a %d %b %H:%M")
        )
    }
}

pub fn format_event(event: &Event, tz: &Tz) -> String {
    let mut line = format!(
        "{}  {}",
        format_span(&event.range(), event.all_day, tz),
        event.title()
    );
    if event.response_status != ResponseStatus::Accepted {
        line.push_str(&format!("  [{}]", event.response_status));
    }
    line
}

pub fn print_events(events: &EventSet, tz: &Tz, empty: &str) {
    if events.is_empty() {
        println!("{empty}");
        return;
    }
    for event in events {
        println!("{}", format_event(event, tz));
    }
}

/// Each suspect event followed by what is wrong with it.
pub fn print_lint(events: &EventSet, tz: &Tz) {
    if events.is_empty() {
        println!("✓ No problems found");
        return;
    }
    for event in events {
        println!("{}", format_event(event, tz));
        let issues: Vec<String> = event.lint_issues().iter().map(ToString::to_string).collect();
        println!("    {}", issues.join(", "));
    }
}

pub fn print_locations(events: &EventSet, tz: &Tz) {
    if events.is_empty() {
        println!("No location set");
        return;
    }
    for event in events {
        let location = event
            .location_payload
            .as_ref()
            .map_or_else(|| event.title().to_string(), ToString::to_string);
        println!("{}  {location}", format_span(&event.range(), true, tz));
    }
}
