//! Pickup queries: booking activity on the report date for a fixed
//! occupancy window, compared against yesterday or a last-N-days average.
//!
//! Pickup reads the live booking facts; unlike the occupancy reports there
//! is no snapshot (SCD) filter, because the booking date itself is the
//! as-of axis.

use chrono::NaiveDate;

use crate::comparison::{
    ComparisonPolicy, ComparisonResolver, ComparisonResult, ComparisonSelector,
};
use crate::error::Result;
use crate::models::{PickupKpi, PickupReport};
use crate::period::{end_of_month, end_of_year, DateWindow, Granularity};
use crate::queries::{metric, round_metric};
use crate::response_cache::{CacheKey, ResponseCache};
use crate::sql_builder::SqlBuilder;

// ---------------------------------------------------------------------------
// PickupParams
// ---------------------------------------------------------------------------

/// Parameters for the pickup KPI report.
#[derive(Debug, Clone)]
pub struct PickupParams {
    /// The booking date under inspection; defaults to today at the boundary.
    pub report_date: Option<NaiveDate>,
    /// Occupancy span the bookings are counted against: the report day
    /// itself, or through the end of its month or year.
    pub granularity: Granularity,
    pub selector: ComparisonSelector,
    pub property: Option<String>,
}

impl Default for PickupParams {
    fn default() -> Self {
        Self {
            report_date: None,
            granularity: Granularity::Day,
            selector: ComparisonSelector::Yesterday,
            property: None,
        }
    }
}

// ---------------------------------------------------------------------------
// PickupQuery
// ---------------------------------------------------------------------------

/// Query interface for pickup KPIs backed by the `insights` view.
pub struct PickupQuery<'a> {
    conn: &'a crate::connection::Connection,
    cache: &'a ResponseCache,
    resolver: ComparisonResolver,
}

#[derive(Debug, Clone, Copy, Default)]
struct PickupTotals {
    rooms_sold: f64,
    room_revenue: f64,
    cancelled_rooms: f64,
    revenue_lost: f64,
}

impl<'a> PickupQuery<'a> {
    /// Create a new `PickupQuery` bound to the given connection and cache.
    /// Pickup only defines the booking-day baselines, and not for year-long
    /// occupancy spans.
    pub fn new(conn: &'a crate::connection::Connection, cache: &'a ResponseCache) -> Self {
        use Granularity::*;
        let mut policy = ComparisonPolicy::empty();
        for granularity in [Day, Month] {
            policy = policy
                .allow(granularity, ComparisonSelector::Yesterday)
                .allow(granularity, ComparisonSelector::LastNDays(0));
        }
        Self {
            conn,
            cache,
            resolver: ComparisonResolver::new(policy),
        }
    }

    /// Compute (or replay) the pickup KPI report.
    pub fn report(&self, params: &PickupParams) -> Result<PickupReport> {
        let report_date = params
            .report_date
            .unwrap_or_else(|| self.cache.now().date_naive());

        let key = self.cache_key(params, report_date);
        if let Some(entry) = self.cache.fetch(&key) {
            return Ok(serde_json::from_value(entry.body)?);
        }

        let booking_day = DateWindow::new(report_date, report_date)?;
        let cmp =
            self.resolver
                .resolve(booking_day, params.granularity, report_date, params.selector)?;

        let report = self.compute(params, report_date, &cmp)?;
        self.cache.put(&key, serde_json::to_value(&report)?, 200);
        Ok(report)
    }

    fn cache_key(&self, params: &PickupParams, report_date: NaiveDate) -> String {
        CacheKey::new("pickup")
            .param("reportDate", report_date)
            .param("viewType", params.granularity)
            .param("comparison", params.selector)
            .opt_param("property", params.property.as_deref())
            .build()
    }

    fn compute(
        &self,
        params: &PickupParams,
        report_date: NaiveDate,
        cmp: &ComparisonResult,
    ) -> Result<PickupReport> {
        self.conn.ensure_views(&["insights"])?;
        let property = params.property.as_deref();

        // The occupancy window is anchored at the report date for both
        // sides: the comparison varies the booking dates, not the stays.
        let occupancy = occupancy_window(report_date, params.granularity)?;

        let (current, _) = self.totals(&cmp.current, &occupancy, property, false)?;
        let (prior, observed_days) = match cmp.prior {
            Some(window) => {
                let wants_divisor = matches!(params.selector, ComparisonSelector::LastNDays(_));
                self.totals(&window, &occupancy, property, wants_divisor)?
            }
            None => (PickupTotals::default(), None),
        };

        // Correct the divisor to the distinct booking days that actually
        // had data; sparse sources must not under-count the average.
        let cmp = cmp
            .clone()
            .with_observed_days(observed_days.unwrap_or(0));
        let divisor = f64::from(cmp.divisor.max(1));

        let comparison = PickupTotals {
            rooms_sold: prior.rooms_sold / divisor,
            room_revenue: prior.room_revenue / divisor,
            cancelled_rooms: prior.cancelled_rooms / divisor,
            revenue_lost: prior.revenue_lost / divisor,
        };

        let adr = ratio(current.room_revenue, current.rooms_sold);
        let comparison_adr = ratio(comparison.room_revenue, comparison.rooms_sold);

        let kpis = vec![
            kpi("roomsSold", "Rooms sold", current.rooms_sold, comparison.rooms_sold, None),
            kpi(
                "roomsRevenue",
                "Rooms revenue",
                round_metric(current.room_revenue),
                round_metric(comparison.room_revenue),
                Some("€"),
            ),
            kpi("adr", "ADR", adr, comparison_adr, Some("€")),
            kpi(
                "cancellations",
                "Cancellations",
                current.cancelled_rooms,
                comparison.cancelled_rooms,
                None,
            ),
            kpi(
                "revenueLost",
                "Revenue lost",
                round_metric(current.revenue_lost),
                round_metric(comparison.revenue_lost),
                Some("€"),
            ),
        ];

        Ok(PickupReport {
            kpis,
            comparison_days: cmp.divisor,
        })
    }

    /// Booking totals over a booking-date window and fixed occupancy window.
    /// With `count_days`, also report how many distinct booking days had
    /// any data.
    fn totals(
        &self,
        booking: &DateWindow,
        occupancy: &DateWindow,
        property: Option<&str>,
        count_days: bool,
    ) -> Result<(PickupTotals, Option<u32>)> {
        let mut cols = vec![
            "SUM(rooms_sold) AS rooms_sold",
            "SUM(room_revenue) AS room_revenue",
            "SUM(cancelled_rooms) AS cancelled_rooms",
            "SUM(revenue_lost) AS revenue_lost",
        ];
        if count_days {
            cols.push("COUNT(DISTINCT booking_date) AS observed_days");
        }

        let mut qb = SqlBuilder::new("insights");
        qb.select(&cols);
        qb.where_date_between(
            "booking_date",
            &booking.start().to_string(),
            &booking.end().to_string(),
        );
        qb.where_date_between(
            "occupancy_date",
            &occupancy.start().to_string(),
            &occupancy.end().to_string(),
        );
        if let Some(p) = property {
            qb.where_eq("property", p);
        }
        let (sql, sql_params) = qb.build();
        let rows = self.conn.execute(&sql, &sql_params)?;

        let Some(row) = rows.first() else {
            return Ok((PickupTotals::default(), None));
        };
        let totals = PickupTotals {
            rooms_sold: metric(row, "rooms_sold"),
            room_revenue: metric(row, "room_revenue"),
            cancelled_rooms: metric(row, "cancelled_rooms"),
            revenue_lost: metric(row, "revenue_lost"),
        };
        let observed = count_days.then(|| metric(row, "observed_days") as u32);
        Ok((totals, observed))
    }
}

/// The stays a pickup report counts: the report day, or the remainder of
/// its month or year.
fn occupancy_window(report_date: NaiveDate, granularity: Granularity) -> Result<DateWindow> {
    match granularity {
        Granularity::Day => DateWindow::new(report_date, report_date),
        Granularity::Month => DateWindow::new(report_date, end_of_month(report_date)),
        Granularity::Year => DateWindow::new(report_date, end_of_year(report_date)),
    }
}

/// Division with the crate-wide zero-denominator policy.
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

fn kpi(
    name: &str,
    title: &str,
    current_value: f64,
    comparison_value: f64,
    prefix: Option<&str>,
) -> PickupKpi {
    PickupKpi {
        kpi_name: name.to_string(),
        title: title.to_string(),
        current_value,
        comparison_value,
        prefix: prefix.map(str::to_string),
    }
}
