// crates/phoneflow-core/src/core/time.rs
// ============================================================================
// Module: PhoneFlow Time Model
// Description: Clock abstraction plus date and timestamp codecs.
// Purpose: Keep wall-clock reads behind an injectable seam.
// Dependencies: time
// ============================================================================

//! ## Overview
//! Stores stamp records through a [`Clock`] so tests can pin "now". Dates
//! travel as `YYYY-MM-DD` strings and timestamps as RFC 3339; both are
//! normalized to millisecond precision so every backend reports the same
//! values.

// ============================================================================
// SECTION: Imports
// ============================================================================

use time::Date;
use time::OffsetDateTime;
use time::format_description::FormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Calendar date layout used for stored dates.
const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Nanoseconds per millisecond.
const NANOS_PER_MILLI: i128 = 1_000_000;

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// Returns the current UTC instant.
    fn now(&self) -> OffsetDateTime;

    /// Returns the current UTC calendar date.
    fn today(&self) -> Date {
        self.now().date()
    }
}

/// Clock backed by the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Clock pinned to a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    /// Instant returned by every call.
    now: OffsetDateTime,
}

impl FixedClock {
    /// Creates a clock that always reports `now`.
    #[must_use]
    pub const fn new(now: OffsetDateTime) -> Self {
        Self {
            now,
        }
    }

    /// Creates a clock pinned to midnight UTC of `date`.
    #[must_use]
    pub const fn at_date(date: Date) -> Self {
        Self::new(date.midnight().assume_utc())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.now
    }
}

// ============================================================================
// SECTION: Codecs
// ============================================================================

/// Parses a `YYYY-MM-DD` calendar date.
#[must_use]
pub fn parse_date(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), DATE_FORMAT).ok()
}

/// Formats a calendar date as `YYYY-MM-DD`.
///
/// # Errors
///
/// Returns [`time::error::Format`] when the date cannot be rendered.
pub fn format_date(date: Date) -> Result<String, time::error::Format> {
    date.format(DATE_FORMAT)
}

/// Formats a timestamp as RFC 3339.
///
/// # Errors
///
/// Returns [`time::error::Format`] when the timestamp cannot be rendered.
pub fn format_timestamp(value: OffsetDateTime) -> Result<String, time::error::Format> {
    value.format(&Rfc3339)
}

/// Returns unix epoch milliseconds for a timestamp.
#[must_use]
pub fn unix_millis(value: OffsetDateTime) -> Option<i64> {
    i64::try_from(value.unix_timestamp_nanos() / NANOS_PER_MILLI).ok()
}

/// Builds a UTC timestamp from unix epoch milliseconds.
#[must_use]
pub fn from_unix_millis(millis: i64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * NANOS_PER_MILLI).ok()
}

/// Truncates a timestamp to millisecond precision.
#[must_use]
pub fn truncate_to_millis(value: OffsetDateTime) -> OffsetDateTime {
    unix_millis(value).and_then(from_unix_millis).unwrap_or(value)
}
