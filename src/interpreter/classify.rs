// Assignment-vs-event classification for incoming calendar items.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;

use super::IncomingEvent;

lazy_static! {
    // Deadline-like words in a title mark the item as an assignment.
    static ref DEADLINE_RE: Regex = Regex::new(
        r"(?i)\b(due|deadline|submit|submission|hand[- ]?in|abgabe|exam|quiz|assignment|homework|report)\b"
    )
    .unwrap();
}

/// An item is an assignment iff its title contains a deadline keyword OR its
/// start timestamp reads 23:59 (the conventional end-of-day deadline the
/// assistant emits). Both disjuncts stand on their own.
pub fn is_assignment(event: &IncomingEvent) -> bool {
    DEADLINE_RE.is_match(&event.title) || event.start.contains("23:59")
}

/// Split a batch into (calendar events, assignments), preserving order.
pub fn split_events(events: Vec<IncomingEvent>) -> (Vec<IncomingEvent>, Vec<IncomingEvent>) {
    events.into_iter().partition(|e| !is_assignment(e))
}

/// Parse a model-emitted timestamp. RFC 3339 first, then the naive formats
/// the assistant falls back to; naive values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    // Date-only, e.g. all-day entries
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN).and_utc());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn item(title: &str, start: &str) -> IncomingEvent {
        IncomingEvent {
            title: title.to_string(),
            description: None,
            start: start.to_string(),
            end: None,
            all_day: false,
            course: None,
            color: None,
        }
    }

    #[test]
    fn deadline_keyword_alone_marks_assignment() {
        assert!(is_assignment(&item("Essay Due", "2026-03-02T10:00:00Z")));
    }

    #[test]
    fn end_of_day_time_alone_marks_assignment() {
        assert!(is_assignment(&item("Study Session", "2026-03-02T23:59:00Z")));
    }

    #[test]
    fn plain_event_stays_calendar_event() {
        assert!(!is_assignment(&item("Lecture", "2026-03-02T10:00:00Z")));
    }

    #[test]
    fn keyword_matches_on_word_boundary_only() {
        // "subdue" contains "due" but is not a deadline word
        assert!(!is_assignment(&item("Subdue the dragon", "2026-03-02T10:00:00Z")));
    }

    #[test]
    fn split_preserves_both_groups() {
        let (calendar, assignments) = split_events(vec![
            item("Lecture", "2026-03-02T10:00:00Z"),
            item("Lab report due", "2026-03-06T12:00:00Z"),
            item("Revision", "2026-03-07T23:59:00"),
        ]);
        assert_eq!(calendar.len(), 1);
        assert_eq!(assignments.len(), 2);
    }

    #[test]
    fn timestamp_formats_all_parse() {
        for raw in [
            "2026-03-02T10:15:00Z",
            "2026-03-02T10:15:00+02:00",
            "2026-03-02T10:15:00",
            "2026-03-02 10:15",
        ] {
            assert!(parse_timestamp(raw).is_some(), "failed to parse {}", raw);
        }
        assert_eq!(
            parse_timestamp("2026-03-02").unwrap().hour(),
            0,
            "date-only input starts at midnight"
        );
        assert!(parse_timestamp("next tuesday").is_none());
    }
}
