//! Comparison-window resolution.
//!
//! Given the current reporting window and a comparison selector, derives the
//! prior window, the prior as-of date (which data snapshot to query) and the
//! averaging divisor for pickup-style comparisons. Which selectors are valid
//! for which period types is driven by an explicit [`ComparisonPolicy`]
//! rather than per-endpoint defaults.

use std::collections::HashSet;
use std::fmt;

use chrono::{Datelike, Duration, Months, NaiveDate};

use crate::error::{InsightsError, Result};
use crate::period::{DateWindow, Granularity};

// ---------------------------------------------------------------------------
// ComparisonSelector
// ---------------------------------------------------------------------------

/// The comparison baseline a user selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonSelector {
    /// Same calendar window one year back. With `match_weekday` each endpoint
    /// is nudged so weekdays line up with the current window.
    LastYear { match_weekday: bool },
    /// Same window math as `LastYear`, sourced from the budget table instead
    /// of actuals downstream.
    Budget,
    /// No prior window at all; callers suppress the comparison series.
    NoComparison,
    /// Pickup: the single booking day before the business date.
    Yesterday,
    /// Pickup: the N booking days before the business date, averaged.
    LastNDays(u32),
}

impl ComparisonSelector {
    /// Parse the dashboard's request strings: `"Last year - OTB"`,
    /// `"Last year (match day of week) - Actual"`, `"Budget"`,
    /// `"No comparison"`, `"Yesterday"`, `"Last 7 days"`, ...
    ///
    /// The `- OTB` / `- Actual` suffix some clients append is a display
    /// artifact and is ignored.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.starts_with("Last year") {
            return Ok(ComparisonSelector::LastYear {
                match_weekday: s.contains("match day of week"),
            });
        }
        if s == "Budget" {
            return Ok(ComparisonSelector::Budget);
        }
        if s == "No comparison" || s == "None" {
            return Ok(ComparisonSelector::NoComparison);
        }
        if s == "Yesterday" {
            return Ok(ComparisonSelector::Yesterday);
        }
        if let Some(rest) = s.strip_prefix("Last ") {
            if let Some(num) = rest.strip_suffix(" days") {
                let n: u32 = num.parse().map_err(|_| {
                    InsightsError::InvalidArgument(format!("Unknown comparison: {}", s))
                })?;
                return Ok(ComparisonSelector::LastNDays(n));
            }
        }
        Err(InsightsError::InvalidArgument(format!(
            "Unknown comparison: {}",
            s
        )))
    }

    fn kind(&self) -> SelectorKind {
        match self {
            ComparisonSelector::LastYear { .. } => SelectorKind::LastYear,
            ComparisonSelector::Budget => SelectorKind::Budget,
            ComparisonSelector::NoComparison => SelectorKind::NoComparison,
            ComparisonSelector::Yesterday => SelectorKind::Yesterday,
            ComparisonSelector::LastNDays(_) => SelectorKind::LastNDays,
        }
    }
}

impl Default for ComparisonSelector {
    fn default() -> Self {
        ComparisonSelector::LastYear {
            match_weekday: false,
        }
    }
}

impl fmt::Display for ComparisonSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonSelector::LastYear {
                match_weekday: false,
            } => f.write_str("Last year"),
            ComparisonSelector::LastYear {
                match_weekday: true,
            } => f.write_str("Last year (match day of week)"),
            ComparisonSelector::Budget => f.write_str("Budget"),
            ComparisonSelector::NoComparison => f.write_str("No comparison"),
            ComparisonSelector::Yesterday => f.write_str("Yesterday"),
            ComparisonSelector::LastNDays(n) => write!(f, "Last {} days", n),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum SelectorKind {
    LastYear,
    Budget,
    NoComparison,
    Yesterday,
    LastNDays,
}

// ---------------------------------------------------------------------------
// ComparisonPolicy
// ---------------------------------------------------------------------------

/// Enumerates the `(period type, selector)` combinations a caller supports.
///
/// Each query interface owns a policy instead of re-deriving defaults
/// inline; requesting an unlisted combination is `UnsupportedSelector`.
#[derive(Debug, Clone)]
pub struct ComparisonPolicy {
    allowed: HashSet<(Granularity, SelectorKind)>,
}

impl ComparisonPolicy {
    /// A policy allowing nothing; combine with [`allow`](Self::allow).
    pub fn empty() -> Self {
        Self {
            allowed: HashSet::new(),
        }
    }

    /// The dashboard defaults: `LastYear` and `NoComparison` everywhere,
    /// `Budget` for Month/Year, pickup selectors for Day/Month.
    pub fn dashboard() -> Self {
        use Granularity::*;
        let mut policy = Self::empty();
        for granularity in [Day, Month, Year] {
            policy = policy
                .allow(granularity, ComparisonSelector::LastYear { match_weekday: false })
                .allow(granularity, ComparisonSelector::NoComparison);
        }
        for granularity in [Month, Year] {
            policy = policy.allow(granularity, ComparisonSelector::Budget);
        }
        for granularity in [Day, Month] {
            policy = policy
                .allow(granularity, ComparisonSelector::Yesterday)
                .allow(granularity, ComparisonSelector::LastNDays(0));
        }
        policy
    }

    /// Allow a selector for a period type. Selector payloads (`match_weekday`,
    /// the N of `LastNDays`) are irrelevant here; only the variant counts.
    pub fn allow(mut self, granularity: Granularity, selector: ComparisonSelector) -> Self {
        self.allowed.insert((granularity, selector.kind()));
        self
    }

    pub fn supports(&self, granularity: Granularity, selector: &ComparisonSelector) -> bool {
        self.allowed.contains(&(granularity, selector.kind()))
    }
}

impl Default for ComparisonPolicy {
    fn default() -> Self {
        Self::dashboard()
    }
}

// ---------------------------------------------------------------------------
// ComparisonResult
// ---------------------------------------------------------------------------

/// The two resolved windows plus the snapshot date and averaging divisor.
#[derive(Debug, Clone)]
pub struct ComparisonResult {
    pub current: DateWindow,
    /// `None` when the selector was `NoComparison`.
    pub prior: Option<DateWindow>,
    /// The as-of date whose data snapshot the prior queries should read.
    pub prior_as_of: NaiveDate,
    /// Days contributing to the prior aggregate. Starts at the requested N
    /// for `LastNDays` and must be corrected via
    /// [`with_observed_days`](Self::with_observed_days) once the query
    /// reports how many distinct days actually had data.
    pub divisor: u32,
}

impl ComparisonResult {
    /// Replace the divisor with the observed count of distinct data days.
    /// A zero observation keeps the requested divisor so the average stays
    /// well-defined over an empty prior sample.
    pub fn with_observed_days(mut self, observed: u32) -> Self {
        if observed > 0 {
            self.divisor = observed;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// ComparisonResolver
// ---------------------------------------------------------------------------

/// Resolves prior windows under a [`ComparisonPolicy`].
#[derive(Debug, Clone, Default)]
pub struct ComparisonResolver {
    policy: ComparisonPolicy,
}

impl ComparisonResolver {
    pub fn new(policy: ComparisonPolicy) -> Self {
        Self { policy }
    }

    /// Derive the prior window for `selector`, or `UnsupportedSelector` if
    /// the policy does not list the combination.
    pub fn resolve(
        &self,
        current: DateWindow,
        granularity: Granularity,
        business_date: NaiveDate,
        selector: ComparisonSelector,
    ) -> Result<ComparisonResult> {
        if !self.policy.supports(granularity, &selector) {
            return Err(InsightsError::UnsupportedSelector {
                selector: selector.to_string(),
                granularity: granularity.to_string(),
            });
        }

        match selector {
            ComparisonSelector::NoComparison => Ok(ComparisonResult {
                current,
                prior: None,
                prior_as_of: business_date,
                divisor: 1,
            }),
            ComparisonSelector::LastYear { match_weekday } => {
                self.year_shifted(current, business_date, match_weekday)
            }
            ComparisonSelector::Budget => self.year_shifted(current, business_date, false),
            ComparisonSelector::Yesterday => {
                let day = business_date - Duration::days(1);
                Ok(ComparisonResult {
                    current,
                    prior: Some(DateWindow::new(day, day)?),
                    prior_as_of: day,
                    divisor: 1,
                })
            }
            ComparisonSelector::LastNDays(n) => {
                if n == 0 {
                    return Err(InsightsError::InvalidArgument(
                        "Last N days comparison requires N > 0".into(),
                    ));
                }
                let start = business_date - Duration::days(i64::from(n));
                let end = business_date - Duration::days(1);
                Ok(ComparisonResult {
                    current,
                    prior: Some(DateWindow::new(start, end)?),
                    prior_as_of: end,
                    divisor: n,
                })
            }
        }
    }

    fn year_shifted(
        &self,
        current: DateWindow,
        business_date: NaiveDate,
        match_weekday: bool,
    ) -> Result<ComparisonResult> {
        let (start, end) = if match_weekday {
            (
                matching_weekday_year_back(current.start()),
                matching_weekday_year_back(current.end()),
            )
        } else {
            (year_back(current.start()), year_back(current.end()))
        };
        Ok(ComparisonResult {
            current,
            prior: Some(DateWindow::new(start, end)?),
            prior_as_of: year_back(business_date),
            divisor: 1,
        })
    }
}

// ---------------------------------------------------------------------------
// Calendar shifts
// ---------------------------------------------------------------------------

/// Same month and day one year earlier, clipped to a valid date: Feb 29 of a
/// leap year maps to Feb 28.
pub fn year_back(date: NaiveDate) -> NaiveDate {
    date.checked_sub_months(Months::new(12)).unwrap_or(date)
}

/// Year-back shift adjusted so the result falls on the same day of the week
/// as the input.
pub fn matching_weekday_year_back(date: NaiveDate) -> NaiveDate {
    let shifted = year_back(date);
    let original = i64::from(date.weekday().num_days_from_sunday());
    let target = i64::from(shifted.weekday().num_days_from_sunday());
    shifted + Duration::days(original - target)
}
