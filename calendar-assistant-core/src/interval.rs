//! Interval merging and subtraction over [`TimeRange`]s.

use crate::time::TimeRange;

/// Merge overlapping or touching ranges.
///
/// Returns a sorted list in which consecutive ranges neither overlap nor
/// touch. Sorting dominates, so the cost is `O(n log n)`.
pub fn merge(mut intervals: Vec<TimeRange>) -> Vec<TimeRange> {
    intervals.sort_by_key(|range| (range.start, range.end));

    let mut merged: Vec<TimeRange> = Vec::with_capacity(intervals.len());
    for range in intervals {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
            _ => merged.push(range),
        }
    }
    merged
}

/// The parts of `window` not covered by `busy`.
///
/// `busy` must be sorted and merged (see [`merge`]). Busy ranges reaching
/// outside the window are clipped to it; empty ones cover nothing.
pub fn subtract(window: &TimeRange, busy: &[TimeRange]) -> Vec<TimeRange> {
    let mut free = Vec::new();
    let mut cursor = window.start;

    for range in busy {
        if range.is_empty() || range.end <= window.start {
            continue;
        }
        if range.start >= window.end {
            break;
        }
        let busy_start = range.start.max(window.start);
        if cursor < busy_start {
            free.push(TimeRange {
                start: cursor,
                end: busy_start,
            });
        }
        cursor = cursor.max(range.end.min(window.end));
    }

    if cursor < window.end {
        free.push(TimeRange {
            start: cursor,
            end: window.end,
        });
    }
    free
}
