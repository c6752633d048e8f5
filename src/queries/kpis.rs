//! Overview KPI queries: headline revenue and occupancy cards for the
//! selected period vs a comparison baseline, each with a per-bucket
//! fluctuation series.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde_json::Value;

use crate::align::{join_series, percentage_change, SeriesPoint};
use crate::buckets::{bucket_of, sequence_buckets};
use crate::comparison::{ComparisonResolver, ComparisonResult, ComparisonSelector};
use crate::error::Result;
use crate::models::{KpiCard, KpiReport};
use crate::period::{resolve_window, DateWindow, Granularity, ViewType};
use crate::queries::{chart_granularity, metric, parse_bucket};
use crate::response_cache::{CacheKey, ResponseCache};
use crate::sql_builder::SqlBuilder;

// ---------------------------------------------------------------------------
// KpiParams
// ---------------------------------------------------------------------------

/// Parameters for the overview KPI report.
///
/// An absent `business_date` resolves to today (by the response cache's
/// clock) once, at this boundary; everything beneath treats it as required.
#[derive(Debug, Clone, Default)]
pub struct KpiParams {
    pub business_date: Option<NaiveDate>,
    pub granularity: Granularity,
    pub view: ViewType,
    pub selector: ComparisonSelector,
    pub property: Option<String>,
    /// Explicit range override; both ends must be present to take effect.
    pub custom_start: Option<NaiveDate>,
    pub custom_end: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// KpiQuery
// ---------------------------------------------------------------------------

/// Query interface for the overview KPI cards, backed by the `insights`,
/// `room_type_details` and `budget` views.
pub struct KpiQuery<'a> {
    conn: &'a crate::connection::Connection,
    cache: &'a ResponseCache,
    resolver: ComparisonResolver,
}

/// Period totals used for both the current and the prior side.
#[derive(Debug, Clone, Copy, Default)]
struct Totals {
    rooms_sold: f64,
    room_revenue: f64,
    fb_revenue: f64,
    other_revenue: f64,
    total_revenue: f64,
}

impl Totals {
    fn from_row(row: &HashMap<String, Value>) -> Self {
        Self {
            rooms_sold: metric(row, "rooms_sold"),
            room_revenue: metric(row, "room_revenue"),
            fb_revenue: metric(row, "fb_revenue"),
            other_revenue: metric(row, "other_revenue"),
            total_revenue: metric(row, "total_revenue"),
        }
    }

    fn accumulate(&mut self, other: &Totals) {
        self.rooms_sold += other.rooms_sold;
        self.room_revenue += other.room_revenue;
        self.fb_revenue += other.fb_revenue;
        self.other_revenue += other.other_revenue;
        self.total_revenue += other.total_revenue;
    }
}

/// Everything the per-card series builders need for one comparison side.
struct SeriesSide {
    buckets: HashMap<NaiveDate, Totals>,
    /// Window days per bucket, for room-night denominators.
    day_counts: HashMap<NaiveDate, i64>,
    capacity: f64,
}

impl<'a> KpiQuery<'a> {
    /// Create a new `KpiQuery` bound to the given connection and cache.
    pub fn new(conn: &'a crate::connection::Connection, cache: &'a ResponseCache) -> Self {
        Self {
            conn,
            cache,
            resolver: ComparisonResolver::default(),
        }
    }

    /// Compute (or replay) the overview KPI report.
    pub fn report(&self, params: &KpiParams) -> Result<KpiReport> {
        let business_date = params
            .business_date
            .unwrap_or_else(|| self.cache.now().date_naive());

        let key = self.cache_key(params, business_date);
        if let Some(entry) = self.cache.fetch(&key) {
            return Ok(serde_json::from_value(entry.body)?);
        }

        let current = resolve_window(
            business_date,
            params.granularity,
            params.view,
            params.custom_start,
            params.custom_end,
        )?;
        let cmp = self
            .resolver
            .resolve(current, params.granularity, business_date, params.selector)?;

        let report = self.compute(params, business_date, &cmp)?;

        // Only successful computations are memoized; errors propagate
        // uncached and are retried on the next request.
        self.cache.put(&key, serde_json::to_value(&report)?, 200);
        Ok(report)
    }

    fn cache_key(&self, params: &KpiParams, business_date: NaiveDate) -> String {
        CacheKey::new("kpis")
            .param("businessDate", business_date)
            .param("periodType", params.granularity)
            .param("viewType", params.view)
            .param("comparison", params.selector)
            .opt_param("property", params.property.as_deref())
            .opt_param("customStartDate", params.custom_start)
            .opt_param("customEndDate", params.custom_end)
            .build()
    }

    fn compute(
        &self,
        params: &KpiParams,
        business_date: NaiveDate,
        cmp: &ComparisonResult,
    ) -> Result<KpiReport> {
        self.conn.ensure_views(&["insights", "room_type_details"])?;
        let prior_table = match params.selector {
            ComparisonSelector::Budget => {
                self.conn.ensure_views(&["budget"])?;
                "budget"
            }
            _ => "insights",
        };
        let property = params.property.as_deref();
        let series_g = chart_granularity(params.granularity);

        let current = cmp.current;
        let totals = self.aggregate("insights", &current, business_date, property)?;
        let capacity = self.capacity(business_date, property)?;
        let current_side = SeriesSide {
            buckets: bucket_totals(
                &self.daily("insights", &current, business_date, property)?,
                series_g,
            ),
            day_counts: bucket_day_counts(&current, series_g),
            capacity,
        };

        let (prior_totals, prior_side) = match cmp.prior {
            Some(prior) => {
                let totals = self.aggregate(prior_table, &prior, cmp.prior_as_of, property)?;
                // Budgets are stated against current inventory; actuals read
                // the capacity snapshot as of the prior business date.
                let prior_capacity = if prior_table == "budget" {
                    capacity
                } else {
                    self.capacity(cmp.prior_as_of, property)?
                };
                let side = SeriesSide {
                    buckets: bucket_totals(
                        &self.daily(prior_table, &prior, cmp.prior_as_of, property)?,
                        series_g,
                    ),
                    day_counts: bucket_day_counts(&prior, series_g),
                    capacity: prior_capacity,
                };
                (totals, side)
            }
            None => (
                Totals::default(),
                SeriesSide {
                    buckets: HashMap::new(),
                    day_counts: HashMap::new(),
                    capacity: 0.0,
                },
            ),
        };

        let suppressed = cmp.prior.is_none();
        let room_nights = capacity * current.len_days() as f64;
        let prior_room_nights = cmp
            .prior
            .map(|w| prior_side.capacity * w.len_days() as f64)
            .unwrap_or(0.0);

        // Per-bucket value: totals plus the bucket's room nights.
        let series = |value_of: &dyn Fn(&Totals, f64) -> f64| -> Vec<SeriesPoint> {
            let value_map = |side: &SeriesSide| -> HashMap<NaiveDate, f64> {
                side.buckets
                    .iter()
                    .map(|(&bucket, t)| {
                        let days = side.day_counts.get(&bucket).copied().unwrap_or(1);
                        (bucket, value_of(t, side.capacity * days as f64))
                    })
                    .collect()
            };
            join_series(
                &cmp.current,
                cmp.prior.as_ref(),
                series_g,
                &value_map(&current_side),
                &value_map(&prior_side),
            )
        };

        let card = |value: f64, previous: f64, fluctuation: Vec<SeriesPoint>| KpiCard {
            value,
            percentage_change: if suppressed {
                None
            } else {
                Some(percentage_change(value, previous))
            },
            fluctuation,
        };

        let adr = ratio(totals.room_revenue, totals.rooms_sold);
        let prior_adr = ratio(prior_totals.room_revenue, prior_totals.rooms_sold);

        Ok(KpiReport {
            total_revenue: card(
                totals.total_revenue,
                prior_totals.total_revenue,
                series(&|t, _| t.total_revenue),
            ),
            rooms_sold: card(
                totals.rooms_sold,
                prior_totals.rooms_sold,
                series(&|t, _| t.rooms_sold),
            ),
            adr: card(
                adr,
                prior_adr,
                series(&|t, _| ratio(t.room_revenue, t.rooms_sold)),
            ),
            occupancy_rate: card(
                ratio(totals.rooms_sold, room_nights) * 100.0,
                ratio(prior_totals.rooms_sold, prior_room_nights) * 100.0,
                series(&|t, nights| ratio(t.rooms_sold, nights) * 100.0),
            ),
            room_revenue: card(
                totals.room_revenue,
                prior_totals.room_revenue,
                series(&|t, _| t.room_revenue),
            ),
            fb_revenue: card(
                totals.fb_revenue,
                prior_totals.fb_revenue,
                series(&|t, _| t.fb_revenue),
            ),
            other_revenue: card(
                totals.other_revenue,
                prior_totals.other_revenue,
                series(&|t, _| t.other_revenue),
            ),
            revpar: card(
                ratio(totals.room_revenue, room_nights),
                ratio(prior_totals.room_revenue, prior_room_nights),
                series(&|t, nights| ratio(t.room_revenue, nights)),
            ),
            trevpar: card(
                ratio(totals.total_revenue, room_nights),
                ratio(prior_totals.total_revenue, prior_room_nights),
                series(&|t, nights| ratio(t.total_revenue, nights)),
            ),
            hotel_capacity: capacity,
        })
    }

    /// Period totals from `insights` or `budget`. The budget table carries
    /// no SCD versioning, so the snapshot filter only applies to actuals.
    fn aggregate(
        &self,
        table: &str,
        window: &DateWindow,
        as_of: NaiveDate,
        property: Option<&str>,
    ) -> Result<Totals> {
        let mut qb = SqlBuilder::new(table);
        qb.select(&[
            "SUM(rooms_sold) AS rooms_sold",
            "SUM(room_revenue) AS room_revenue",
            "SUM(fb_revenue) AS fb_revenue",
            "SUM(other_revenue) AS other_revenue",
            "SUM(total_revenue) AS total_revenue",
        ]);
        qb.where_date_between(
            "occupancy_date",
            &window.start().to_string(),
            &window.end().to_string(),
        );
        if table == "insights" {
            qb.where_as_of("scd_valid_from", "scd_valid_to", &as_of.to_string());
        }
        if let Some(p) = property {
            qb.where_eq("property", p);
        }
        let (sql, sql_params) = qb.build();
        let rows = self.conn.execute(&sql, &sql_params)?;
        Ok(rows.first().map(Totals::from_row).unwrap_or_default())
    }

    /// Daily physical-room capacity as of the given date.
    fn capacity(&self, as_of: NaiveDate, property: Option<&str>) -> Result<f64> {
        let mut qb = SqlBuilder::new("room_type_details");
        qb.select(&["SUM(physical_rooms) AS physical_rooms"]);
        qb.where_as_of("scd_valid_from", "scd_valid_to", &as_of.to_string());
        if let Some(p) = property {
            qb.where_eq("property", p);
        }
        let (sql, sql_params) = qb.build();
        let value = self.conn.execute_scalar(&sql, &sql_params)?;
        Ok(value.and_then(|v| v.as_f64()).unwrap_or(0.0))
    }

    /// Per-day totals over a window, keyed by occupancy date.
    fn daily(
        &self,
        table: &str,
        window: &DateWindow,
        as_of: NaiveDate,
        property: Option<&str>,
    ) -> Result<HashMap<NaiveDate, Totals>> {
        let mut qb = SqlBuilder::new(table);
        qb.select(&[
            "strftime(occupancy_date, '%Y-%m-%d') AS bucket",
            "SUM(rooms_sold) AS rooms_sold",
            "SUM(room_revenue) AS room_revenue",
            "SUM(fb_revenue) AS fb_revenue",
            "SUM(other_revenue) AS other_revenue",
            "SUM(total_revenue) AS total_revenue",
        ]);
        qb.where_date_between(
            "occupancy_date",
            &window.start().to_string(),
            &window.end().to_string(),
        );
        if table == "insights" {
            qb.where_as_of("scd_valid_from", "scd_valid_to", &as_of.to_string());
        }
        if let Some(p) = property {
            qb.where_eq("property", p);
        }
        qb.group_by(&["bucket"]);
        let (sql, sql_params) = qb.build();

        let mut out = HashMap::new();
        for row in self.conn.execute(&sql, &sql_params)? {
            if let Some(date) = parse_bucket(&row, "bucket") {
                out.insert(date, Totals::from_row(&row));
            }
        }
        Ok(out)
    }
}

/// Roll per-day totals up to chart buckets.
fn bucket_totals(
    daily: &HashMap<NaiveDate, Totals>,
    granularity: Granularity,
) -> HashMap<NaiveDate, Totals> {
    let mut out: HashMap<NaiveDate, Totals> = HashMap::new();
    for (&date, totals) in daily {
        out.entry(bucket_of(date, granularity))
            .or_default()
            .accumulate(totals);
    }
    out
}

/// How many window days fall into each chart bucket (a partial first or
/// last month counts only its in-window days).
fn bucket_day_counts(window: &DateWindow, granularity: Granularity) -> HashMap<NaiveDate, i64> {
    let mut out: HashMap<NaiveDate, i64> = HashMap::new();
    for day in sequence_buckets(window, Granularity::Day) {
        *out.entry(bucket_of(day, granularity)).or_insert(0) += 1;
    }
    out
}

/// Division with the crate-wide zero-denominator policy.
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}
