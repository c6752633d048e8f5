//! Bucket enumeration for time-series grouping.
//!
//! A bucket is a `NaiveDate` normalized to the start of its period: the day
//! itself, the first of the month, or Jan 1. Sequences are complete even
//! where the underlying data has gaps; downstream joins rely on that for
//! zero-filling.

use chrono::{Datelike, Duration, Months, NaiveDate};

use crate::period::{first_of_month, first_of_year, DateWindow, Granularity};

/// Normalize a date to the bucket it falls in.
pub fn bucket_of(date: NaiveDate, granularity: Granularity) -> NaiveDate {
    match granularity {
        Granularity::Day => date,
        Granularity::Month => first_of_month(date),
        Granularity::Year => first_of_year(date),
    }
}

/// Enumerate every bucket touched by `window`, ascending and deduplicated.
///
/// Month and year buckets may start before `window.start()`: a window from
/// Jan 15 to Mar 2 touches the January, February and March buckets.
pub fn sequence_buckets(window: &DateWindow, granularity: Granularity) -> Vec<NaiveDate> {
    let mut buckets = Vec::new();
    match granularity {
        Granularity::Day => {
            let mut day = window.start();
            while day <= window.end() {
                buckets.push(day);
                day += Duration::days(1);
            }
        }
        Granularity::Month => {
            let mut month = first_of_month(window.start());
            while month <= window.end() {
                buckets.push(month);
                match month.checked_add_months(Months::new(1)) {
                    Some(next) => month = next,
                    None => break,
                }
            }
        }
        Granularity::Year => {
            for year in window.start().year()..=window.end().year() {
                if let Some(jan1) = NaiveDate::from_ymd_opt(year, 1, 1) {
                    buckets.push(jan1);
                }
            }
        }
    }
    buckets
}
