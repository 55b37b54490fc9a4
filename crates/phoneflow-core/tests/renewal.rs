// crates/phoneflow-core/tests/renewal.rs
// ============================================================================
// Module: Renewal Classifier Tests
// Description: Boundary and property tests for renewal classification.
// Purpose: Pin bucket edges and day arithmetic against a fixed "today".
// Dependencies: phoneflow-core, proptest, time
// ============================================================================
//! ## Overview
//! Exercises the inclusive 7-day and 30-day edges and checks that buckets are
//! monotonic in the day difference.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use phoneflow_core::RenewalBucket;
use phoneflow_core::classify;
use proptest::prelude::*;
use time::Date;
use time::Duration;
use time::macros::date;

const TODAY: Date = date!(2026 - 03 - 15);

fn offset(days: i64) -> Date {
    TODAY + Duration::days(days)
}

/// Verifies a date one day in the past is expired with -1 days remaining.
#[test]
fn yesterday_is_expired() {
    let window = classify(TODAY, offset(-1));
    assert_eq!(window.days_remaining, -1);
    assert_eq!(window.bucket, RenewalBucket::Expired);
}

/// Verifies today itself is urgent with zero days remaining.
#[test]
fn today_is_urgent() {
    let window = classify(TODAY, TODAY);
    assert_eq!(window.days_remaining, 0);
    assert_eq!(window.bucket, RenewalBucket::Urgent);
}

/// Verifies exactly seven days belongs to the urgent bucket.
#[test]
fn seven_days_is_urgent() {
    let window = classify(TODAY, offset(7));
    assert_eq!(window.days_remaining, 7);
    assert_eq!(window.bucket, RenewalBucket::Urgent);
}

/// Verifies eight days moves into the upcoming bucket.
#[test]
fn eight_days_is_upcoming() {
    let window = classify(TODAY, offset(8));
    assert_eq!(window.days_remaining, 8);
    assert_eq!(window.bucket, RenewalBucket::Upcoming);
}

/// Verifies exactly thirty days stays upcoming.
#[test]
fn thirty_days_is_upcoming() {
    let window = classify(TODAY, offset(30));
    assert_eq!(window.days_remaining, 30);
    assert_eq!(window.bucket, RenewalBucket::Upcoming);
}

/// Verifies thirty-one days is normal.
#[test]
fn thirty_one_days_is_normal() {
    let window = classify(TODAY, offset(31));
    assert_eq!(window.days_remaining, 31);
    assert_eq!(window.bucket, RenewalBucket::Normal);
}

/// Verifies day arithmetic crosses month and leap-year boundaries.
#[test]
fn day_difference_spans_leap_day() {
    let window = classify(date!(2028 - 02 - 27), date!(2028 - 03 - 01));
    assert_eq!(window.days_remaining, 3);
}

/// Verifies only the normal bucket is excluded from attention lists.
#[test]
fn attention_excludes_normal_only() {
    assert!(RenewalBucket::Expired.needs_attention());
    assert!(RenewalBucket::Urgent.needs_attention());
    assert!(RenewalBucket::Upcoming.needs_attention());
    assert!(!RenewalBucket::Normal.needs_attention());
}

/// Verifies buckets serialize as lowercase labels.
#[test]
fn bucket_serializes_snake_case() {
    let encoded = serde_json::to_string(&RenewalBucket::Upcoming).unwrap();
    assert_eq!(encoded, "\"upcoming\"");
}

proptest! {
    /// Verifies days remaining equals the offset and buckets never get less urgent as dates approach.
    #[test]
    fn buckets_are_monotonic(days in -400_i64..400) {
        let near = classify(TODAY, offset(days));
        let far = classify(TODAY, offset(days + 1));
        prop_assert_eq!(near.days_remaining, days);
        prop_assert!(near.bucket <= far.bucket);
    }
}
