//! Calendar arithmetic for attendance marking.
//!
//! All day logic runs in one configured UTC offset (`MARK_UTC_OFFSET_MINUTES`,
//! +05:30 by default) so that "today", the duplicate-check window, and the
//! stamps written to the backend agree with each other. Mixing UTC days with
//! offset timestamps shifts the window by the offset around midnight.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, SecondsFormat, Utc};

/// Inclusive RFC 3339 bounds of one calendar day, `T00:00:00` through
/// `T23:59:59` at the clock's offset. Ready to use in `Marked_at` range
/// queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayBounds {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkClock {
    offset: FixedOffset,
}

impl MarkClock {
    /// Clock at the configured marking offset.
    pub fn from_env() -> Self {
        Self::with_offset_minutes(common::config::mark_utc_offset_minutes())
    }

    /// Clock at an explicit offset east of UTC. Out-of-range offsets fall
    /// back to UTC.
    pub fn with_offset_minutes(minutes: i32) -> Self {
        let offset = FixedOffset::east_opt(minutes.saturating_mul(60)).unwrap_or_else(|| Utc.fix());
        Self {
            offset,
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    /// Current instant as the string written into `Marked_at`, e.g.
    /// `2025-03-14T09:21:09+05:30`.
    pub fn now_stamp(&self) -> String {
        self.now().to_rfc3339_opts(SecondsFormat::Secs, false)
    }

    /// Today's date at the marking offset.
    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    pub fn is_past(&self, day: NaiveDate) -> bool {
        day < self.today()
    }

    pub fn day_bounds(&self, day: NaiveDate) -> DayBounds {
        DayBounds {
            start: format!("{day}T00:00:00{}", self.offset),
            end: format!("{day}T23:59:59{}", self.offset),
        }
    }

    /// Midnight at the start of `day`, the stamp given to manual marks.
    pub fn day_start(&self, day: NaiveDate) -> DateTime<FixedOffset> {
        let local = day.and_time(NaiveTime::MIN);
        DateTime::from_naive_utc_and_offset(local - self.offset, self.offset)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Timelike;

    use super::*;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn day_bounds_carry_the_offset() {
        let clock = MarkClock::with_offset_minutes(330);
        let bounds = clock.day_bounds(day("2025-03-14"));
        assert_eq!(bounds.start, "2025-03-14T00:00:00+05:30");
        assert_eq!(bounds.end, "2025-03-14T23:59:59+05:30");
    }

    #[test]
    fn utc_clock_formats_zero_offset() {
        let clock = MarkClock::with_offset_minutes(0);
        let bounds = clock.day_bounds(day("2025-03-14"));
        assert_eq!(bounds.start, "2025-03-14T00:00:00+00:00");
    }

    #[test]
    fn negative_offsets_are_supported() {
        let clock = MarkClock::with_offset_minutes(-300);
        let bounds = clock.day_bounds(day("2025-03-14"));
        assert_eq!(bounds.end, "2025-03-14T23:59:59-05:00");
    }

    #[test]
    fn day_start_is_local_midnight() {
        let clock = MarkClock::with_offset_minutes(330);
        let start = clock.day_start(day("2025-03-14"));
        assert_eq!(
            start.to_rfc3339_opts(SecondsFormat::Secs, false),
            "2025-03-14T00:00:00+05:30"
        );
        // Same instant seen from UTC is the previous evening.
        assert_eq!(
            start.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Secs, true),
            "2025-03-13T18:30:00Z"
        );
    }

    #[test]
    fn day_bounds_are_parseable_instants() {
        let clock = MarkClock::with_offset_minutes(330);
        let bounds = clock.day_bounds(day("2025-03-14"));
        let start = DateTime::parse_from_rfc3339(&bounds.start).unwrap();
        let end = DateTime::parse_from_rfc3339(&bounds.end).unwrap();
        assert!(start < end);
        assert_eq!(end.hour(), 23);
    }

    #[test]
    fn absurd_offsets_fall_back_to_utc() {
        let clock = MarkClock::with_offset_minutes(100_000);
        assert_eq!(clock.offset(), Utc.fix());
    }

    #[test]
    fn now_stamp_parses_back() {
        let clock = MarkClock::with_offset_minutes(330);
        let stamp = clock.now_stamp();
        let parsed = DateTime::parse_from_rfc3339(&stamp).unwrap();
        assert_eq!(parsed.offset(), &clock.offset());
    }
}
