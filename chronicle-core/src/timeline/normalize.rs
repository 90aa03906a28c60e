//! Time normalization: both time representations onto one integer axis.
//!
//! Every event stores either calendar dates or ordinal day indices. Layout
//! and the axis need a single zero-based integer offset per event; this
//! module produces it, repairing missing or malformed inputs with defaults
//! and writing those defaults back onto the event so the user sees what
//! the engine decided.

use chrono::NaiveDate;

use crate::event::{DisplayMode, Event, TimelineMode};

/// Accepted calendar date formats, tried in order.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Width of the synthetic axis shown when a project has no events.
pub const EMPTY_AXIS_DAYS: i64 = 10;

/// Parse a calendar date, trying each accepted format and then a generic
/// ISO parse. Returns `None` for anything unrecognizable.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }
    // ISO fallback for anything the fixed formats miss.
    if let Ok(date) = text.parse::<NaiveDate>() {
        return Some(date);
    }
    text.parse::<chrono::NaiveDateTime>().ok().map(|dt| dt.date())
}

/// Pull a day index out of text like `"Day 7"` or `"12"`: the first run of
/// digits, clamped to at least 1. Only `Day`-prefixed or purely numeric
/// text qualifies; a date string such as `"2025-01-01"` is not a day
/// index.
pub fn extract_day_index(text: &str) -> Option<u32> {
    let trimmed = text.trim();
    let digits: String = if trimmed.to_lowercase().starts_with("day") {
        trimmed
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect()
    } else if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        trimmed.to_string()
    } else {
        return None;
    };
    if digits.is_empty() {
        return None;
    }
    digits.parse::<u32>().ok().map(|n| n.max(1))
}

/// One event resolved onto the shared axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEvent {
    pub event_id: String,
    /// Zero-based offset of the first occupied axis unit.
    pub start_offset: i64,
    /// Zero-based offset of the last occupied axis unit (inclusive).
    pub end_offset: i64,
    /// Point events collapse to their start visually.
    pub is_point: bool,
}

impl NormalizedEvent {
    /// Number of axis units the event occupies (at least 1).
    pub fn duration(&self) -> i64 {
        (self.end_offset - self.start_offset + 1).max(1)
    }
}

/// Where offset 0 sits on the real axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisOrigin {
    /// Calendar mode: the earliest date across all events.
    Date(NaiveDate),
    /// Day-sequence mode: the lowest day index across all events.
    Day(u32),
}

/// The shared axis all offsets are relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeAxis {
    pub mode: TimelineMode,
    pub origin: AxisOrigin,
    /// Number of units on the visible axis, always at least 1; a synthetic
    /// [`EMPTY_AXIS_DAYS`]-unit axis when there are no events.
    pub day_count: i64,
}

impl TimeAxis {
    /// Human-readable label for one axis offset.
    pub fn label(&self, offset: i64) -> String {
        match self.origin {
            AxisOrigin::Date(min) => {
                let date = min + chrono::Duration::days(offset);
                date.format("%Y-%m-%d").to_string()
            }
            AxisOrigin::Day(min) => format!("Day {}", min as i64 + offset),
        }
    }

    /// Labels for the whole axis, one per unit.
    pub fn labels(&self) -> Vec<String> {
        (0..self.day_count).map(|offset| self.label(offset)).collect()
    }
}

/// Resolve every event onto a zero-based integer axis in the given mode.
///
/// Mutates the events: the chosen mode, repaired dates/indices, and point
/// collapses are written back. `today` anchors the defaults (and the empty
/// calendar axis) so callers control the clock.
pub fn normalize_events(
    events: &mut [Event],
    mode: TimelineMode,
    today: NaiveDate,
) -> (Vec<NormalizedEvent>, TimeAxis) {
    match mode {
        TimelineMode::DaySequence => normalize_day_sequence(events),
        TimelineMode::Calendar => normalize_calendar(events, today),
    }
}

fn normalize_day_sequence(events: &mut [Event]) -> (Vec<NormalizedEvent>, TimeAxis) {
    // Events without a usable index get the next free day so every event
    // lands somewhere; the counter also trails past every end seen so far.
    let mut next_free: u32 = 1;
    let mut resolved = Vec::with_capacity(events.len());

    for event in events.iter_mut() {
        let start = event
            .day_index
            .filter(|d| *d >= 1)
            .or_else(|| extract_day_index(&event.start_date))
            .unwrap_or_else(|| {
                let day = next_free;
                next_free += 1;
                day
            });

        let mut end = event
            .day_index_end
            .filter(|d| *d >= 1)
            .or_else(|| extract_day_index(&event.end_date))
            .unwrap_or(start);
        if end < start {
            end = start;
        }
        if event.display_mode == DisplayMode::Point {
            end = start;
        }

        event.timeline_mode = TimelineMode::DaySequence;
        event.day_index = Some(start);
        event.day_index_end = Some(end);
        event.start_date = format!("Day {start}");
        event.end_date = format!("Day {end}");

        next_free = next_free.max(end + 1);
        resolved.push((event.id.clone(), start, end, event.display_mode));
    }

    if resolved.is_empty() {
        return (
            Vec::new(),
            TimeAxis {
                mode: TimelineMode::DaySequence,
                origin: AxisOrigin::Day(1),
                day_count: EMPTY_AXIS_DAYS,
            },
        );
    }

    let min = resolved.iter().map(|(_, start, _, _)| *start).min().unwrap_or(1);
    let max = resolved.iter().map(|(_, _, end, _)| *end).max().unwrap_or(min);
    let normalized = resolved
        .into_iter()
        .map(|(event_id, start, end, display)| NormalizedEvent {
            event_id,
            start_offset: (start - min) as i64,
            end_offset: (end - min) as i64,
            is_point: display == DisplayMode::Point,
        })
        .collect();

    (
        normalized,
        TimeAxis {
            mode: TimelineMode::DaySequence,
            origin: AxisOrigin::Day(min),
            day_count: (max - min) as i64 + 1,
        },
    )
}

fn normalize_calendar(events: &mut [Event], today: NaiveDate) -> (Vec<NormalizedEvent>, TimeAxis) {
    let mut resolved = Vec::with_capacity(events.len());

    for event in events.iter_mut() {
        let start = match parse_date(&event.start_date) {
            Some(date) => date,
            None => {
                // Missing or malformed start defaults to today, visibly.
                event.start_date = today.format("%Y-%m-%d").to_string();
                today
            }
        };

        let end = parse_date(&event.end_date);
        let end = if event.display_mode == DisplayMode::Point {
            event.end_date = event.start_date.clone();
            start
        } else {
            match end {
                Some(date) if date >= start => date,
                _ => {
                    event.end_date = event.start_date.clone();
                    start
                }
            }
        };

        event.timeline_mode = TimelineMode::Calendar;
        event.day_index = None;
        event.day_index_end = None;
        resolved.push((event.id.clone(), start, end, event.display_mode));
    }

    if resolved.is_empty() {
        return (
            Vec::new(),
            TimeAxis {
                mode: TimelineMode::Calendar,
                origin: AxisOrigin::Date(today),
                day_count: EMPTY_AXIS_DAYS,
            },
        );
    }

    let min = resolved
        .iter()
        .map(|(_, start, _, _)| *start)
        .min()
        .unwrap_or(today);
    let max = resolved.iter().map(|(_, _, end, _)| *end).max().unwrap_or(min);
    let normalized = resolved
        .into_iter()
        .map(|(event_id, start, end, display)| NormalizedEvent {
            event_id,
            start_offset: (start - min).num_days(),
            end_offset: (end - min).num_days(),
            is_point: display == DisplayMode::Point,
        })
        .collect();

    (
        normalized,
        TimeAxis {
            mode: TimelineMode::Calendar,
            origin: AxisOrigin::Date(min),
            day_count: (max - min).num_days() + 1,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn calendar_event(id: &str, start: &str, end: &str) -> Event {
        let mut event = Event::new(id, id);
        event.start_date = start.to_string();
        event.end_date = end.to_string();
        event
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2025-10-31"), Some(date(2025, 10, 31)));
        assert_eq!(parse_date("2025/10/31"), Some(date(2025, 10, 31)));
        assert_eq!(parse_date("2025-10-31T14:30"), Some(date(2025, 10, 31)));
        assert_eq!(parse_date("2025-10-31T14:30:05"), Some(date(2025, 10, 31)));
        assert_eq!(parse_date("  2025-01-02  "), Some(date(2025, 1, 2)));
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_extract_day_index() {
        assert_eq!(extract_day_index("Day 7"), Some(7));
        assert_eq!(extract_day_index("day 12, morning"), Some(12));
        assert_eq!(extract_day_index("42"), Some(42));
        assert_eq!(extract_day_index("Day 0"), Some(1));
        assert_eq!(extract_day_index("2025-01-01"), None);
        assert_eq!(extract_day_index("someday"), None);
        assert_eq!(extract_day_index(""), None);
    }

    #[test]
    fn test_calendar_offsets_relative_to_minimum() {
        let mut events = vec![
            calendar_event("a", "2025-01-05", "2025-01-07"),
            calendar_event("b", "2025-01-01", "2025-01-02"),
        ];
        let (normalized, axis) = normalize_events(&mut events, TimelineMode::Calendar, date(2025, 6, 1));

        assert_eq!(normalized[0].start_offset, 4);
        assert_eq!(normalized[0].end_offset, 6);
        assert_eq!(normalized[1].start_offset, 0);
        assert_eq!(axis.day_count, 7);
        assert_eq!(axis.label(0), "2025-01-01");
    }

    #[test]
    fn test_missing_start_defaults_to_today_and_writes_back() {
        let today = date(2025, 3, 10);
        let mut events = vec![calendar_event("a", "not a date", "")];
        let (normalized, _) = normalize_events(&mut events, TimelineMode::Calendar, today);

        assert_eq!(events[0].start_date, "2025-03-10");
        assert_eq!(events[0].end_date, "2025-03-10");
        assert_eq!(normalized[0].start_offset, 0);
        assert_eq!(normalized[0].end_offset, 0);
    }

    #[test]
    fn test_end_before_start_is_clamped() {
        let mut events = vec![calendar_event("a", "2025-01-10", "2025-01-02")];
        let (normalized, _) = normalize_events(&mut events, TimelineMode::Calendar, date(2025, 1, 1));

        assert_eq!(events[0].end_date, "2025-01-10");
        assert_eq!(normalized[0].end_offset, normalized[0].start_offset);
    }

    #[test]
    fn test_point_event_collapses_to_start() {
        let mut event = calendar_event("a", "2025-01-01", "2025-01-09");
        event.display_mode = DisplayMode::Point;
        let mut events = vec![event];
        let (normalized, _) = normalize_events(&mut events, TimelineMode::Calendar, date(2025, 1, 1));

        assert!(normalized[0].is_point);
        assert_eq!(normalized[0].end_offset, normalized[0].start_offset);
        assert_eq!(events[0].end_date, "2025-01-01");
    }

    #[test]
    fn test_day_sequence_fallback_indices() {
        let mut with_index = Event::new("a", "a");
        with_index.timeline_mode = TimelineMode::DaySequence;
        with_index.day_index = Some(2);
        with_index.day_index_end = Some(4);
        // No index anywhere: gets the next free day (5).
        let mut bare = Event::new("b", "b");
        bare.timeline_mode = TimelineMode::DaySequence;

        let mut events = vec![with_index, bare];
        let (normalized, axis) =
            normalize_events(&mut events, TimelineMode::DaySequence, date(2025, 1, 1));

        assert_eq!(events[1].day_index, Some(5));
        assert_eq!(events[1].start_date, "Day 5");
        assert_eq!(normalized[0].start_offset, 0); // day 2 is the axis minimum
        assert_eq!(normalized[1].start_offset, 3);
        assert_eq!(axis.day_count, 4);
        assert_eq!(axis.label(0), "Day 2");
    }

    #[test]
    fn test_day_sequence_reads_text_indices() {
        let mut event = Event::new("a", "a");
        event.timeline_mode = TimelineMode::DaySequence;
        event.start_date = "Day 3".to_string();
        event.end_date = "Day 9".to_string();

        let mut events = vec![event];
        let (normalized, _) =
            normalize_events(&mut events, TimelineMode::DaySequence, date(2025, 1, 1));

        assert_eq!(events[0].day_index, Some(3));
        assert_eq!(events[0].day_index_end, Some(9));
        assert_eq!(normalized[0].duration(), 7);
    }

    #[test]
    fn test_empty_project_gets_synthetic_axis() {
        let mut events: Vec<Event> = Vec::new();
        let (normalized, axis) =
            normalize_events(&mut events, TimelineMode::Calendar, date(2025, 1, 1));
        assert!(normalized.is_empty());
        assert_eq!(axis.day_count, EMPTY_AXIS_DAYS);

        let (_, axis) = normalize_events(&mut events, TimelineMode::DaySequence, date(2025, 1, 1));
        assert_eq!(axis.day_count, EMPTY_AXIS_DAYS);
        assert_eq!(axis.labels()[0], "Day 1");
    }

    #[test]
    fn test_mode_is_written_back() {
        let mut event = Event::new("a", "a");
        event.timeline_mode = TimelineMode::DaySequence;
        event.day_index = Some(3);
        let mut events = vec![event];

        normalize_events(&mut events, TimelineMode::Calendar, date(2025, 1, 1));
        assert_eq!(events[0].timeline_mode, TimelineMode::Calendar);
        assert_eq!(events[0].day_index, None);
    }
}
