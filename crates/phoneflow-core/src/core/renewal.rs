// crates/phoneflow-core/src/core/renewal.rs
// ============================================================================
// Module: PhoneFlow Renewal Classifier
// Description: Pure date-bucket classification for line renewals.
// Purpose: Derive days-remaining and urgency buckets from renewal dates.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! [`classify`] compares a renewal date against "today" and returns the whole
//! day difference plus a bucket. Upper bounds are inclusive, so exactly 7 days
//! is urgent and exactly 30 days is upcoming. The function performs no I/O;
//! callers filter out inactive lines before classifying.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use time::Date;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Inclusive upper bound, in days, of the urgent bucket.
pub const URGENT_WINDOW_DAYS: i64 = 7;

/// Inclusive upper bound, in days, of the upcoming bucket.
pub const UPCOMING_WINDOW_DAYS: i64 = 30;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Renewal urgency bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenewalBucket {
    /// Renewal date already passed.
    Expired,
    /// Renewal due within seven days.
    Urgent,
    /// Renewal due within thirty days.
    Upcoming,
    /// Renewal further out.
    Normal,
}

impl RenewalBucket {
    /// Returns the bucket for a day difference.
    #[must_use]
    pub const fn for_days(days_remaining: i64) -> Self {
        if days_remaining < 0 {
            Self::Expired
        } else if days_remaining <= URGENT_WINDOW_DAYS {
            Self::Urgent
        } else if days_remaining <= UPCOMING_WINDOW_DAYS {
            Self::Upcoming
        } else {
            Self::Normal
        }
    }

    /// Returns true for buckets surfaced on the dashboard.
    #[must_use]
    pub const fn needs_attention(self) -> bool {
        !matches!(self, Self::Normal)
    }
}

/// Classification result for one renewal date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenewalWindow {
    /// Whole days from today to the renewal date; negative when overdue.
    pub days_remaining: i64,
    /// Urgency bucket.
    pub bucket: RenewalBucket,
}

// ============================================================================
// SECTION: Classifier
// ============================================================================

/// Classifies a renewal date relative to `today`.
#[must_use]
pub fn classify(today: Date, renewal_date: Date) -> RenewalWindow {
    let days_remaining = (renewal_date - today).whole_days();
    RenewalWindow {
        days_remaining,
        bucket: RenewalBucket::for_days(days_remaining),
    }
}
