// crates/phoneflow-core/src/runtime/dashboard.rs
// ============================================================================
// Module: PhoneFlow Dashboard Aggregator
// Description: Summary counts and renewal digests over live records.
// Purpose: Compose store reads and classifier output into report payloads.
// Dependencies: serde, time, crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`DashboardAggregator`] reads whole entity lists from a [`RecordSource`]
//! and derives reporting payloads. Any store failure aborts the aggregate;
//! callers never receive partial counts.
//!
//! Only lines in the `activa` state with a renewal date are classified.
//! Renewal entries sort by renewal date ascending, then id ascending.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Serialize;
use time::Date;

use crate::core::EntityKind;
use crate::core::Record;
use crate::core::RenewalBucket;
use crate::core::classify;
use crate::core::schema::ACTIVE_LINE_STATE;
use crate::core::time::parse_date;
use crate::interfaces::RecordSource;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Line column holding the lifecycle state.
const STATE_FIELD: &str = "estado";

/// Line column holding the renewal date.
const RENEWAL_FIELD: &str = "fecha_renovacion";

// ============================================================================
// SECTION: Payloads
// ============================================================================

/// Per-entity totals plus line state and renewal splits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryCounts {
    /// Live record count per entity.
    #[serde(flatten)]
    pub totals: BTreeMap<EntityKind, usize>,
    /// Lines in the active state.
    pub lineas_activas: usize,
    /// Lines in any other state.
    pub lineas_inactivas: usize,
    /// Active lines due within the upcoming window (urgent plus upcoming).
    pub lineas_por_renovar: usize,
    /// Active lines past their renewal date.
    pub lineas_vencidas: usize,
}

/// One classified line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenewalEntry {
    /// Line record with its joined display fields.
    #[serde(flatten)]
    pub record: Record,
    /// Whole days until renewal; negative when overdue.
    pub days_remaining: i64,
    /// Urgency bucket.
    pub bucket: RenewalBucket,
}

/// Renewal bucket counts plus the lines needing attention.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenewalDigest {
    /// Active lines past their renewal date.
    pub expired: usize,
    /// Active lines due within seven days.
    pub urgent: usize,
    /// Active lines due in eight to thirty days.
    pub upcoming: usize,
    /// Expired, urgent, and upcoming lines, soonest first.
    pub lines: Vec<RenewalEntry>,
}

// ============================================================================
// SECTION: Aggregator
// ============================================================================

/// Reporting facade over a record source.
pub struct DashboardAggregator<'a, S: RecordSource + ?Sized> {
    /// Source of live records.
    source: &'a S,
}

impl<'a, S: RecordSource + ?Sized> DashboardAggregator<'a, S> {
    /// Creates an aggregator reading from `source`.
    #[must_use]
    pub const fn new(source: &'a S) -> Self {
        Self {
            source,
        }
    }

    /// Computes entity totals and line splits.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when any store read fails or a stored renewal
    /// date is malformed.
    pub fn summary(&self, today: Date) -> Result<SummaryCounts, StoreError> {
        let mut totals = BTreeMap::new();
        let mut lines = Vec::new();
        for entity in EntityKind::ALL {
            let records = self.source.records(entity)?;
            totals.insert(entity, records.len());
            if entity == EntityKind::Lineas {
                lines = records;
            }
        }
        let lineas_activas = lines.iter().filter(|record| is_active_line(record)).count();
        let lineas_inactivas = lines.len() - lineas_activas;
        let entries = classify_lines(lines, today)?;
        let lineas_vencidas = count_bucket(&entries, RenewalBucket::Expired);
        let lineas_por_renovar = count_bucket(&entries, RenewalBucket::Urgent)
            + count_bucket(&entries, RenewalBucket::Upcoming);
        Ok(SummaryCounts {
            totals,
            lineas_activas,
            lineas_inactivas,
            lineas_por_renovar,
            lineas_vencidas,
        })
    }

    /// Computes disjoint bucket counts and the attention list.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the line read fails or a stored renewal
    /// date is malformed.
    pub fn renewal_digest(&self, today: Date) -> Result<RenewalDigest, StoreError> {
        let entries = classify_lines(self.source.records(EntityKind::Lineas)?, today)?;
        let expired = count_bucket(&entries, RenewalBucket::Expired);
        let urgent = count_bucket(&entries, RenewalBucket::Urgent);
        let upcoming = count_bucket(&entries, RenewalBucket::Upcoming);
        let lines = entries.into_iter().filter(|entry| entry.bucket.needs_attention()).collect();
        Ok(RenewalDigest {
            expired,
            urgent,
            upcoming,
            lines,
        })
    }

    /// Lists active lines renewing within `window_days`, overdue lines included.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the line read fails or a stored renewal
    /// date is malformed.
    pub fn upcoming_renewals(
        &self,
        today: Date,
        window_days: u32,
    ) -> Result<Vec<RenewalEntry>, StoreError> {
        let window = i64::from(window_days);
        let entries = classify_lines(self.source.records(EntityKind::Lineas)?, today)?;
        Ok(entries.into_iter().filter(|entry| entry.days_remaining <= window).collect())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns true when the line is in the active state.
fn is_active_line(record: &Record) -> bool {
    record.text(STATE_FIELD) == Some(ACTIVE_LINE_STATE)
}

/// Classifies active lines that carry a renewal date, soonest first.
fn classify_lines(lines: Vec<Record>, today: Date) -> Result<Vec<RenewalEntry>, StoreError> {
    let mut dated = Vec::new();
    for record in lines.into_iter().filter(is_active_line) {
        let Some(raw) = record.text(RENEWAL_FIELD) else {
            continue;
        };
        let renewal_date = parse_date(raw).ok_or_else(|| {
            StoreError::Invalid(format!("line {} has malformed {RENEWAL_FIELD}: {raw}", record.id))
        })?;
        let window = classify(today, renewal_date);
        dated.push((
            renewal_date,
            RenewalEntry {
                record,
                days_remaining: window.days_remaining,
                bucket: window.bucket,
            },
        ));
    }
    dated.sort_by(|(left_date, left), (right_date, right)| {
        left_date.cmp(right_date).then_with(|| left.record.id.cmp(&right.record.id))
    });
    Ok(dated.into_iter().map(|(_, entry)| entry).collect())
}

/// Counts entries in one bucket.
fn count_bucket(entries: &[RenewalEntry], bucket: RenewalBucket) -> usize {
    entries.iter().filter(|entry| entry.bucket == bucket).count()
}
