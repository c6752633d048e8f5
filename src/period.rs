//! Reporting-window resolution.
//!
//! Turns a business date, a period type and a view type into the canonical
//! `[start, end]` calendar window an endpoint reports over. All arithmetic is
//! date-only; "today" defaulting happens once at the request boundary, never
//! here.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{InsightsError, Result};

// ---------------------------------------------------------------------------
// Granularity
// ---------------------------------------------------------------------------

/// Reporting period type, which is also the bucket granularity of the
/// per-bucket series an endpoint returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Granularity {
    Day,
    Month,
    Year,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Granularity::Day => "Day",
            Granularity::Month => "Month",
            Granularity::Year => "Year",
        };
        f.write_str(s)
    }
}

impl FromStr for Granularity {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Day" => Ok(Granularity::Day),
            "Month" => Ok(Granularity::Month),
            "Year" => Ok(Granularity::Year),
            other => Err(InsightsError::InvalidArgument(format!(
                "Unknown period type: {}",
                other
            ))),
        }
    }
}

impl Default for Granularity {
    fn default() -> Self {
        Granularity::Month
    }
}

// ---------------------------------------------------------------------------
// ViewType
// ---------------------------------------------------------------------------

/// Anchor strategy for Month and Year windows.
///
/// `Actual` reports period-to-date, `Otb` the on-the-books remainder of the
/// period, `Projected` the full period. Day windows ignore the view type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewType {
    Actual,
    Otb,
    Projected,
}

impl fmt::Display for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ViewType::Actual => "Actual",
            ViewType::Otb => "OTB",
            ViewType::Projected => "Projected",
        };
        f.write_str(s)
    }
}

impl FromStr for ViewType {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Actual" => Ok(ViewType::Actual),
            "OTB" => Ok(ViewType::Otb),
            "Projected" => Ok(ViewType::Projected),
            other => Err(InsightsError::InvalidArgument(format!(
                "Unknown view type: {}",
                other
            ))),
        }
    }
}

impl Default for ViewType {
    fn default() -> Self {
        ViewType::Actual
    }
}

// ---------------------------------------------------------------------------
// DateWindow
// ---------------------------------------------------------------------------

/// An inclusive calendar-date range with `start <= end`.
///
/// Immutable once constructed; every resolver and query in the crate passes
/// windows by value or shared reference and never mutates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    /// Construct a window, rejecting inverted ranges.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(InsightsError::InvalidWindow(format!(
                "start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days spanned, exclusive of the first: zero for a single-day
    /// window. This is the span the proportional aligner scales over.
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Inclusive day count, used for per-period capacity (room nights).
    pub fn len_days(&self) -> i64 {
        self.span_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

// ---------------------------------------------------------------------------
// Calendar helpers
// ---------------------------------------------------------------------------

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
        .expect("day 1 exists in every month")
}

pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).expect("day 1 exists in every month")
        - Duration::days(1)
}

pub fn first_of_year(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 1, 1).expect("Jan 1 exists in every year")
}

pub fn end_of_year(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 12, 31).expect("Dec 31 exists in every year")
}

// ---------------------------------------------------------------------------
// Window resolution
// ---------------------------------------------------------------------------

/// Resolve the current reporting window.
///
/// An explicit `start`/`end` pair takes precedence over period arithmetic
/// and is only validated; a partial pair is ignored. Otherwise:
///
/// - `Day`: the single day `business_date`, whatever the view type.
/// - `Month`/`Year` by view type: `Actual` runs from the first of the
///   period to the business date, `Otb` from the day after the business
///   date to the end of the period, `Projected` over the full period.
///
/// An `Otb` window on the last day of the period has no remaining days and
/// resolves to `InvalidWindow`.
pub fn resolve_window(
    business_date: NaiveDate,
    granularity: Granularity,
    view: ViewType,
    explicit_start: Option<NaiveDate>,
    explicit_end: Option<NaiveDate>,
) -> Result<DateWindow> {
    if let (Some(start), Some(end)) = (explicit_start, explicit_end) {
        return DateWindow::new(start, end);
    }

    match granularity {
        Granularity::Day => DateWindow::new(business_date, business_date),
        Granularity::Month => resolve_anchored(
            business_date,
            view,
            first_of_month(business_date),
            end_of_month(business_date),
        ),
        Granularity::Year => resolve_anchored(
            business_date,
            view,
            first_of_year(business_date),
            end_of_year(business_date),
        ),
    }
}

fn resolve_anchored(
    business_date: NaiveDate,
    view: ViewType,
    first: NaiveDate,
    last: NaiveDate,
) -> Result<DateWindow> {
    match view {
        ViewType::Actual => DateWindow::new(first, business_date),
        ViewType::Otb => {
            let start = business_date + Duration::days(1);
            if start > last {
                return Err(InsightsError::InvalidWindow(format!(
                    "no days remain after {} in the period ending {}",
                    business_date, last
                )));
            }
            DateWindow::new(start, last)
        }
        ViewType::Projected => DateWindow::new(first, last),
    }
}
