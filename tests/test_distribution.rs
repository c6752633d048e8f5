//! End-to-end distribution tests: top-N selection, junk filtering, ISO
//! codes, aligned per-category series.

mod common;

use chrono::NaiveDate;
use hotel_insights_sdk::queries::DistributionQuery;
use hotel_insights_sdk::{
    ComparisonSelector, DistributionParams, Granularity, InsightsError, ViewType,
};

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn params() -> DistributionParams {
    DistributionParams {
        business_date: Some(date("2024-06-03")),
        granularity: Granularity::Month,
        view: ViewType::Actual,
        selector: ComparisonSelector::LastYear {
            match_weekday: false,
        },
        field: "guest_country".to_string(),
        property: Some("coast".to_string()),
        limit: 2,
        custom_start: None,
        custom_end: None,
    }
}

#[test]
fn top_categories_rank_by_current_revenue() {
    let (conn, _tmp) = common::setup_sample_db();
    let cache = common::memory_cache();
    let report = DistributionQuery::new(&conn, &cache).report(&params()).unwrap();

    assert_eq!(report.field, "guest_country");
    assert_eq!(report.slices.len(), 2);
    assert_eq!(report.slices[0].name, "Germany");
    assert_eq!(report.slices[1].name, "Croatia");

    // Germany: 1300 + 2000 current vs 900 + 1000 prior
    assert_eq!(report.slices[0].revenue.current, 3300.0);
    assert_eq!(report.slices[0].revenue.previous, 1900.0);
    let change = report.slices[0].revenue.change.unwrap();
    assert!((change - (3300.0 - 1900.0) / 1900.0 * 100.0).abs() < 1e-9);
}

#[test]
fn junk_country_markers_are_filtered() {
    let (conn, _tmp) = common::setup_sample_db();
    let cache = common::memory_cache();
    let mut p = params();
    p.limit = 10;
    let report = DistributionQuery::new(&conn, &cache).report(&p).unwrap();

    // UNDEFINED is present in the facts but never surfaces as a slice
    assert!(report.slices.iter().all(|s| s.name != "UNDEFINED"));
    let names: Vec<&str> = report.slices.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Germany", "Croatia", "United Kingdom"]);
}

#[test]
fn country_slices_carry_iso_codes() {
    let (conn, _tmp) = common::setup_sample_db();
    let cache = common::memory_cache();
    let report = DistributionQuery::new(&conn, &cache).report(&params()).unwrap();

    assert_eq!(report.slices[0].code, "de");
    assert_eq!(report.slices[1].code, "hr");
}

#[test]
fn per_category_series_are_gap_free_and_aligned() {
    let (conn, _tmp) = common::setup_sample_db();
    let cache = common::memory_cache();
    let report = DistributionQuery::new(&conn, &cache).report(&params()).unwrap();

    let germany = &report.slices[0].revenue.series;
    let dates: Vec<NaiveDate> = germany.iter().map(|p| p.date).collect();
    assert_eq!(
        dates,
        vec![date("2024-06-01"), date("2024-06-02"), date("2024-06-03")]
    );
    let current: Vec<f64> = germany.iter().map(|p| p.current).collect();
    assert_eq!(current, vec![1300.0, 2000.0, 0.0]);
    let previous: Vec<f64> = germany.iter().map(|p| p.previous).collect();
    assert_eq!(previous, vec![900.0, 1000.0, 0.0]);

    // Croatia only shows on the final day of both periods
    let croatia = &report.slices[1].revenue.series;
    let previous: Vec<f64> = croatia.iter().map(|p| p.previous).collect();
    assert_eq!(previous, vec![0.0, 0.0, 300.0]);
}

#[test]
fn adr_split_divides_revenue_by_rooms() {
    let (conn, _tmp) = common::setup_sample_db();
    let cache = common::memory_cache();
    let report = DistributionQuery::new(&conn, &cache).report(&params()).unwrap();

    // Germany: 3000 room revenue over 30 rooms current, 1800 over 18 prior
    let adr = &report.slices[0].adr;
    assert!((adr.current - 100.0).abs() < 1e-9);
    assert!((adr.previous - 100.0).abs() < 1e-9);
    assert_eq!(adr.change, Some(0.0));
}

#[test]
fn producer_splits_use_slug_codes_and_skip_unassigned() {
    let (conn, _tmp) = common::setup_sample_db();
    let cache = common::memory_cache();
    let mut p = params();
    p.field = "producer".to_string();
    p.limit = 10;
    let report = DistributionQuery::new(&conn, &cache).report(&p).unwrap();

    // The junk producer id -1 is filtered
    assert!(report.slices.iter().all(|s| s.name != "-1"));
    assert!(report.slices.iter().any(|s| s.name == "10" && s.code == "10"));
}

#[test]
fn unknown_dimension_fields_are_rejected() {
    let (conn, _tmp) = common::setup_sample_db();
    let cache = common::memory_cache();
    let mut p = params();
    p.field = "guest_country; DROP TABLE insights".to_string();

    let result = DistributionQuery::new(&conn, &cache).report(&p);
    assert!(matches!(result, Err(InsightsError::InvalidArgument(_))));
}

#[test]
fn pickup_selectors_are_not_valid_for_splits() {
    let (conn, _tmp) = common::setup_sample_db();
    let cache = common::memory_cache();
    let mut p = params();
    p.selector = ComparisonSelector::LastNDays(7);

    let result = DistributionQuery::new(&conn, &cache).report(&p);
    assert!(matches!(
        result,
        Err(InsightsError::UnsupportedSelector { .. })
    ));
}

#[test]
fn no_comparison_leaves_slices_without_changes() {
    let (conn, _tmp) = common::setup_sample_db();
    let cache = common::memory_cache();
    let mut p = params();
    p.selector = ComparisonSelector::NoComparison;
    let report = DistributionQuery::new(&conn, &cache).report(&p).unwrap();

    for slice in &report.slices {
        assert_eq!(slice.revenue.change, None);
        assert_eq!(slice.revenue.previous, 0.0);
        assert!(slice.revenue.series.iter().all(|pt| pt.previous == 0.0));
    }
}
