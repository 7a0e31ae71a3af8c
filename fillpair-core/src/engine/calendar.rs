//! Calendar helpers for display labelling: day labels, date ranges, moved legs.
//!
//! Calendar days are evaluated in a fixed UTC offset so that results never
//! depend on the host's local timezone.

use crate::domain::Fill;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Offset, Utc};

/// Fixed-offset calendar used to turn epoch-millisecond timestamps into days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    offset: FixedOffset,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::utc()
    }
}

impl Calendar {
    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    /// Calendar at `minutes` east of UTC. Out-of-range offsets fall back to UTC.
    pub fn with_offset_minutes(minutes: i32) -> Self {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(|offset| Self { offset })
            .unwrap_or_else(Self::utc)
    }

    /// Calendar date of an epoch-millisecond timestamp.
    pub fn date_of(&self, timestamp_ms: i64) -> NaiveDate {
        DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
            .unwrap_or_default()
            .with_timezone(&self.offset)
            .date_naive()
    }

    /// Short month/day label, e.g. `Jan 5`.
    pub fn day_label(&self, timestamp_ms: i64) -> String {
        self.date_of(timestamp_ms).format("%b %-d").to_string()
    }

    /// Label spanning the earliest and latest timestamps.
    ///
    /// Collapses to a single label when both fall on the same calendar day.
    /// Returns an empty string for an empty input.
    pub fn date_range<I>(&self, timestamps: I) -> String
    where
        I: IntoIterator<Item = i64>,
    {
        let mut bounds: Option<(i64, i64)> = None;
        for ts in timestamps {
            bounds = Some(match bounds {
                None => (ts, ts),
                Some((lo, hi)) => (lo.min(ts), hi.max(ts)),
            });
        }
        let Some((first, last)) = bounds else {
            return String::new();
        };
        if self.date_of(first) == self.date_of(last) {
            self.day_label(first)
        } else {
            format!("{} - {}", self.day_label(first), self.day_label(last))
        }
    }

    /// True when `fill` sits on a different calendar day than the group's first fill.
    pub fn is_moved_order(&self, fill: &Fill, primary_group: &[Fill]) -> bool {
        match primary_group.first() {
            Some(primary) => self.date_of(fill.timestamp) != self.date_of(primary.timestamp),
            None => false,
        }
    }

    /// Day of month (1–31) of a fill.
    pub fn day_of_month(&self, fill: &Fill) -> u32 {
        self.date_of(fill.timestamp).day()
    }
}

/// [`Calendar::is_moved_order`] in UTC.
pub fn is_moved_order(fill: &Fill, primary_group: &[Fill]) -> bool {
    Calendar::utc().is_moved_order(fill, primary_group)
}

/// [`Calendar::day_of_month`] in UTC.
pub fn day_of_month(fill: &Fill) -> u32 {
    Calendar::utc().day_of_month(fill)
}
