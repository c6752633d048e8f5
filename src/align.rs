//! Prior-period alignment and series joining.
//!
//! A value observed on a prior-window date only becomes comparable once it is
//! mapped onto the equivalent position of the current window: the 5th day of
//! a 10-day period lines up with the 5th day of the prior period even when
//! the two windows differ in length or calendar alignment. This module does
//! that mapping and builds the joined, zero-filled series endpoints chart.

use std::collections::HashMap;

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::buckets::{bucket_of, sequence_buckets};
use crate::period::{first_of_month, DateWindow, Granularity};

// ---------------------------------------------------------------------------
// SeriesPoint
// ---------------------------------------------------------------------------

/// One bucket of a joined current-vs-prior series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub current: f64,
    pub previous: f64,
}

// ---------------------------------------------------------------------------
// align_date
// ---------------------------------------------------------------------------

/// Map a prior-window date onto its positional equivalent in the current
/// window, or `None` when no counterpart exists.
///
/// Month buckets are relabeled one calendar year forward (the windows are
/// already year-shifted for last-year comparisons); year buckets shift by
/// the difference between the window start years. Day buckets map
/// positionally when the spans match and proportionally when they do not,
/// so day 1 of 31 stays comparable to day 1 of 28.
///
/// Callers must zero-fill unmapped buckets rather than drop them.
pub fn align_date(
    prior_date: NaiveDate,
    granularity: Granularity,
    current: &DateWindow,
    prior: &DateWindow,
) -> Option<NaiveDate> {
    match granularity {
        Granularity::Month => {
            let shifted = prior_date.checked_add_months(Months::new(12))?;
            let mapped = first_of_month(shifted);
            in_bucket_range(mapped, current, granularity).then_some(mapped)
        }
        Granularity::Year => {
            let year_diff = current.start().year() - prior.start().year();
            let mapped = NaiveDate::from_ymd_opt(prior_date.year() + year_diff, 1, 1)?;
            in_bucket_range(mapped, current, granularity).then_some(mapped)
        }
        Granularity::Day => {
            if !prior.contains(prior_date) {
                return None;
            }
            let current_span = current.span_days();
            let prior_span = prior.span_days();
            let offset = (prior_date - prior.start()).num_days();

            let mapped = if prior_span == 0 {
                // Only one prior day; it can only land on the current start.
                current.start()
            } else if prior_span == current_span {
                current.start() + Duration::days(offset)
            } else {
                // Proportional stretch/compression of the timeline.
                let relative = offset as f64 / prior_span as f64;
                let scaled = (relative * current_span as f64).round() as i64;
                current.start() + Duration::days(scaled)
            };
            current.contains(mapped).then_some(mapped)
        }
    }
}

/// Whether `bucket` is one of the buckets the current window touches.
fn in_bucket_range(bucket: NaiveDate, window: &DateWindow, granularity: Granularity) -> bool {
    bucket_of(window.start(), granularity) <= bucket && bucket <= window.end()
}

// ---------------------------------------------------------------------------
// Series join
// ---------------------------------------------------------------------------

/// Join current and prior per-bucket values into a complete series over the
/// current window.
///
/// Current rows are keyed by bucket directly; prior rows are re-keyed through
/// [`align_date`]. Buckets missing on either side read as zero. When `prior`
/// is `None` (comparison suppressed) every `previous` is zero.
///
/// A compressing alignment can land two prior dates on the same current
/// bucket; their values accumulate.
pub fn join_series(
    current: &DateWindow,
    prior: Option<&DateWindow>,
    granularity: Granularity,
    current_rows: &HashMap<NaiveDate, f64>,
    prior_rows: &HashMap<NaiveDate, f64>,
) -> Vec<SeriesPoint> {
    let mut aligned: HashMap<NaiveDate, f64> = HashMap::new();
    if let Some(prior) = prior {
        for (&date, &value) in prior_rows {
            if let Some(mapped) = align_date(date, granularity, current, prior) {
                *aligned.entry(bucket_of(mapped, granularity)).or_insert(0.0) += value;
            }
        }
    }

    sequence_buckets(current, granularity)
        .into_iter()
        .map(|bucket| SeriesPoint {
            date: bucket,
            current: current_rows.get(&bucket).copied().unwrap_or(0.0),
            previous: aligned.get(&bucket).copied().unwrap_or(0.0),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Percentage change
// ---------------------------------------------------------------------------

/// Relative change in percent. A zero prior value yields `0.0` by policy,
/// which treats "appeared from nothing" the same as "no change"; suppressed
/// comparisons are represented as `None` by callers, never as `0.0`.
pub fn percentage_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        (current - previous) / previous * 100.0
    }
}
