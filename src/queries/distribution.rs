//! Distribution queries: top-N category splits of a dimension field with
//! aligned per-category daily series.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde_json::Value;

use crate::align::{join_series, percentage_change, SeriesPoint};
use crate::buckets::bucket_of;
use crate::comparison::{ComparisonPolicy, ComparisonResolver, ComparisonResult, ComparisonSelector};
use crate::config;
use crate::error::{InsightsError, Result};
use crate::models::{DistributionReport, DistributionSlice, MetricSplit};
use crate::names;
use crate::period::{resolve_window, DateWindow, Granularity, ViewType};
use crate::queries::{chart_granularity, metric, parse_bucket};
use crate::response_cache::{CacheKey, ResponseCache};
use crate::sql_builder::SqlBuilder;

const DEFAULT_LIMIT: usize = 10;

// ---------------------------------------------------------------------------
// DistributionParams
// ---------------------------------------------------------------------------

/// Parameters for a distribution split.
#[derive(Debug, Clone)]
pub struct DistributionParams {
    pub business_date: Option<NaiveDate>,
    pub granularity: Granularity,
    pub view: ViewType,
    pub selector: ComparisonSelector,
    /// Dimension to group by; must be one of the known fields.
    pub field: String,
    pub property: Option<String>,
    pub limit: usize,
    pub custom_start: Option<NaiveDate>,
    pub custom_end: Option<NaiveDate>,
}

impl Default for DistributionParams {
    fn default() -> Self {
        Self {
            business_date: None,
            granularity: Granularity::default(),
            view: ViewType::default(),
            selector: ComparisonSelector::default(),
            field: "guest_country".to_string(),
            property: None,
            limit: DEFAULT_LIMIT,
            custom_start: None,
            custom_end: None,
        }
    }
}

// ---------------------------------------------------------------------------
// DistributionQuery
// ---------------------------------------------------------------------------

/// Query interface for dimension splits backed by the `insights` view.
pub struct DistributionQuery<'a> {
    conn: &'a crate::connection::Connection,
    cache: &'a ResponseCache,
    resolver: ComparisonResolver,
}

/// Per-category, per-day totals for one period side.
type DailyByCategory = HashMap<String, HashMap<NaiveDate, CategoryDay>>;

#[derive(Debug, Clone, Copy, Default)]
struct CategoryDay {
    rooms_sold: f64,
    room_revenue: f64,
    total_revenue: f64,
}

impl CategoryDay {
    fn accumulate(&mut self, other: &CategoryDay) {
        self.rooms_sold += other.rooms_sold;
        self.room_revenue += other.room_revenue;
        self.total_revenue += other.total_revenue;
    }
}

impl<'a> DistributionQuery<'a> {
    /// Create a new `DistributionQuery` bound to the given connection and
    /// cache. Splits only support year-over-year and suppressed
    /// comparisons; there is no per-dimension budget.
    pub fn new(conn: &'a crate::connection::Connection, cache: &'a ResponseCache) -> Self {
        use Granularity::*;
        let mut policy = ComparisonPolicy::empty();
        for granularity in [Day, Month, Year] {
            policy = policy
                .allow(granularity, ComparisonSelector::LastYear { match_weekday: false })
                .allow(granularity, ComparisonSelector::NoComparison);
        }
        Self {
            conn,
            cache,
            resolver: ComparisonResolver::new(policy),
        }
    }

    /// Compute (or replay) the top-N split for `params.field`.
    pub fn report(&self, params: &DistributionParams) -> Result<DistributionReport> {
        if !config::dimension_fields().contains(&params.field.as_str()) {
            return Err(InsightsError::InvalidArgument(format!(
                "Unknown dimension field: {}",
                params.field
            )));
        }

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
        self.cache.put(&key, serde_json::to_value(&report)?, 200);
        Ok(report)
    }

    fn cache_key(&self, params: &DistributionParams, business_date: NaiveDate) -> String {
        CacheKey::new("distribution")
            .param("businessDate", business_date)
            .param("periodType", params.granularity)
            .param("viewType", params.view)
            .param("comparison", params.selector)
            .param("field", &params.field)
            .param("limit", params.limit)
            .opt_param("property", params.property.as_deref())
            .opt_param("customStartDate", params.custom_start)
            .opt_param("customEndDate", params.custom_end)
            .build()
    }

    fn compute(
        &self,
        params: &DistributionParams,
        business_date: NaiveDate,
        cmp: &ComparisonResult,
    ) -> Result<DistributionReport> {
        self.conn.ensure_views(&["insights"])?;
        let field = params.field.as_str();
        let property = params.property.as_deref();

        // Top categories by current-period revenue drive everything else.
        let top = self.top_categories(params, business_date, &cmp.current)?;
        let top_refs: Vec<&str> = top.iter().map(|(name, _)| name.as_str()).collect();

        let prior_totals: HashMap<String, CategoryDay> = match cmp.prior {
            Some(prior) => self.category_totals(field, &prior, cmp.prior_as_of, property, &top_refs)?,
            None => HashMap::new(),
        };

        let daily = self.category_daily(field, &cmp.current, business_date, property, &top_refs)?;
        let prior_daily = match cmp.prior {
            Some(prior) => self.category_daily(field, &prior, cmp.prior_as_of, property, &top_refs)?,
            None => DailyByCategory::new(),
        };

        let suppressed = cmp.prior.is_none();
        let series_g = chart_granularity(params.granularity);
        let empty = HashMap::new();

        let slices = top
            .into_iter()
            .map(|(name, totals)| {
                let prior = prior_totals.get(&name).copied().unwrap_or_default();
                let days = bucket_category_days(daily.get(&name).unwrap_or(&empty), series_g);
                let prior_days =
                    bucket_category_days(prior_daily.get(&name).unwrap_or(&empty), series_g);

                let split = |current: f64,
                             previous: f64,
                             value_of: &dyn Fn(&CategoryDay) -> f64|
                 -> MetricSplit {
                    MetricSplit {
                        current,
                        previous,
                        change: if suppressed {
                            None
                        } else {
                            Some(percentage_change(current, previous))
                        },
                        series: self.series(cmp, series_g, &days, &prior_days, value_of),
                    }
                };

                let adr = ratio(totals.room_revenue, totals.rooms_sold);
                let prior_adr = ratio(prior.room_revenue, prior.rooms_sold);

                DistributionSlice {
                    code: names::category_code(field, &name),
                    revenue: split(totals.total_revenue, prior.total_revenue, &|d| {
                        d.total_revenue
                    }),
                    rooms_sold: split(totals.rooms_sold, prior.rooms_sold, &|d| d.rooms_sold),
                    adr: split(adr, prior_adr, &|d| ratio(d.room_revenue, d.rooms_sold)),
                    name,
                }
            })
            .collect();

        Ok(DistributionReport {
            field: params.field.clone(),
            slices,
        })
    }

    /// Top categories by revenue over the current window, in rank order.
    fn top_categories(
        &self,
        params: &DistributionParams,
        business_date: NaiveDate,
        window: &DateWindow,
    ) -> Result<Vec<(String, CategoryDay)>> {
        let field = params.field.as_str();
        // `field` is validated against the known dimension list before it is
        // interpolated as an identifier.
        let category = format!("{} AS category", field);
        let mut qb = self.base_query(field, window, business_date, params.property.as_deref());
        qb.select(&[
            category.as_str(),
            "SUM(rooms_sold) AS rooms_sold",
            "SUM(room_revenue) AS room_revenue",
            "SUM(total_revenue) AS total_revenue",
        ]);
        qb.group_by(&["category"]);
        qb.order_by(&["total_revenue DESC"]);
        qb.limit(params.limit);
        let (sql, sql_params) = qb.build();

        let mut out = Vec::new();
        for row in self.conn.execute(&sql, &sql_params)? {
            if let Some(name) = row.get("category").and_then(Value::as_str) {
                out.push((
                    name.to_string(),
                    CategoryDay {
                        rooms_sold: metric(&row, "rooms_sold"),
                        room_revenue: metric(&row, "room_revenue"),
                        total_revenue: metric(&row, "total_revenue"),
                    },
                ));
            }
        }
        Ok(out)
    }

    /// Prior-period totals for the already-chosen top categories.
    fn category_totals(
        &self,
        field: &str,
        window: &DateWindow,
        as_of: NaiveDate,
        property: Option<&str>,
        categories: &[&str],
    ) -> Result<HashMap<String, CategoryDay>> {
        let category = format!("{} AS category", field);
        let mut qb = self.base_query(field, window, as_of, property);
        qb.select(&[
            category.as_str(),
            "SUM(rooms_sold) AS rooms_sold",
            "SUM(room_revenue) AS room_revenue",
            "SUM(total_revenue) AS total_revenue",
        ]);
        qb.where_in(field, categories);
        qb.group_by(&["category"]);
        let (sql, sql_params) = qb.build();

        let mut out = HashMap::new();
        for row in self.conn.execute(&sql, &sql_params)? {
            if let Some(name) = row.get("category").and_then(Value::as_str) {
                out.insert(
                    name.to_string(),
                    CategoryDay {
                        rooms_sold: metric(&row, "rooms_sold"),
                        room_revenue: metric(&row, "room_revenue"),
                        total_revenue: metric(&row, "total_revenue"),
                    },
                );
            }
        }
        Ok(out)
    }

    /// Per-category, per-day totals for one period side.
    fn category_daily(
        &self,
        field: &str,
        window: &DateWindow,
        as_of: NaiveDate,
        property: Option<&str>,
        categories: &[&str],
    ) -> Result<DailyByCategory> {
        let category = format!("{} AS category", field);
        let mut qb = self.base_query(field, window, as_of, property);
        qb.select(&[
            "strftime(occupancy_date, '%Y-%m-%d') AS bucket",
            category.as_str(),
            "SUM(rooms_sold) AS rooms_sold",
            "SUM(room_revenue) AS room_revenue",
            "SUM(total_revenue) AS total_revenue",
        ]);
        qb.where_in(field, categories);
        qb.group_by(&["bucket", "category"]);
        let (sql, sql_params) = qb.build();

        let mut out = DailyByCategory::new();
        for row in self.conn.execute(&sql, &sql_params)? {
            let name = match row.get("category").and_then(Value::as_str) {
                Some(name) => name.to_string(),
                None => continue,
            };
            if let Some(date) = parse_bucket(&row, "bucket") {
                out.entry(name).or_default().insert(
                    date,
                    CategoryDay {
                        rooms_sold: metric(&row, "rooms_sold"),
                        room_revenue: metric(&row, "room_revenue"),
                        total_revenue: metric(&row, "total_revenue"),
                    },
                );
            }
        }
        Ok(out)
    }

    /// Window + snapshot + junk filters shared by every distribution query.
    fn base_query(
        &self,
        field: &str,
        window: &DateWindow,
        as_of: NaiveDate,
        property: Option<&str>,
    ) -> SqlBuilder {
        let mut qb = SqlBuilder::new("insights");
        qb.where_date_between(
            "occupancy_date",
            &window.start().to_string(),
            &window.end().to_string(),
        );
        qb.where_as_of("scd_valid_from", "scd_valid_to", &as_of.to_string());
        if let Some(p) = property {
            qb.where_eq("property", p);
        }
        // Junk values the warehouse uses as "unknown" markers
        match field {
            "guest_country" => {
                qb.where_clause(
                    "guest_country IS NOT NULL AND guest_country <> '' AND guest_country <> 'UNDEFINED'",
                    &[],
                );
            }
            "producer" => {
                qb.where_clause("producer <> '-1'", &[]);
            }
            _ => {}
        }
        qb
    }

    fn series(
        &self,
        cmp: &ComparisonResult,
        granularity: Granularity,
        days: &HashMap<NaiveDate, CategoryDay>,
        prior_days: &HashMap<NaiveDate, CategoryDay>,
        value_of: &dyn Fn(&CategoryDay) -> f64,
    ) -> Vec<SeriesPoint> {
        let current: HashMap<NaiveDate, f64> =
            days.iter().map(|(&d, v)| (d, value_of(v))).collect();
        let prior: HashMap<NaiveDate, f64> = prior_days
            .iter()
            .map(|(&d, v)| (d, value_of(v)))
            .collect();
        join_series(&cmp.current, cmp.prior.as_ref(), granularity, &current, &prior)
    }
}

/// Roll a category's per-day totals up to chart buckets.
fn bucket_category_days(
    days: &HashMap<NaiveDate, CategoryDay>,
    granularity: Granularity,
) -> HashMap<NaiveDate, CategoryDay> {
    let mut out: HashMap<NaiveDate, CategoryDay> = HashMap::new();
    for (&date, day) in days {
        out.entry(bucket_of(date, granularity))
            .or_default()
            .accumulate(day);
    }
    out
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}
