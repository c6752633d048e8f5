//! Unit tests for the SqlBuilder query construction.

use hotel_insights_sdk::SqlBuilder;

// ---------------------------------------------------------------------------
// Basic construction
// ---------------------------------------------------------------------------

#[test]
fn new_creates_select_star_from_table() {
    let (sql, params) = SqlBuilder::new("insights").build();
    assert_eq!(sql, "SELECT *\nFROM insights");
    assert!(params.is_empty());
}

#[test]
fn select_replaces_default_star() {
    let (sql, _) = SqlBuilder::new("insights")
        .select(&["occupancy_date", "total_revenue"])
        .build();
    assert!(sql.starts_with("SELECT occupancy_date, total_revenue\n"));
}

// ---------------------------------------------------------------------------
// WHERE conditions
// ---------------------------------------------------------------------------

#[test]
fn where_eq_adds_equality_with_param() {
    let (sql, params) = SqlBuilder::new("insights")
        .where_eq("property", "coast")
        .build();
    assert!(sql.contains("WHERE property = ?"));
    assert_eq!(params, vec!["coast"]);
}

#[test]
fn where_in_adds_in_clause() {
    let (sql, params) = SqlBuilder::new("insights")
        .where_in("guest_country", &["Germany", "Croatia", "Italy"])
        .build();
    assert!(sql.contains("guest_country IN (?, ?, ?)"));
    assert_eq!(params, vec!["Germany", "Croatia", "Italy"]);
}

#[test]
fn where_in_empty_produces_false() {
    let (sql, params) = SqlBuilder::new("insights")
        .where_in("guest_country", &[])
        .build();
    assert!(sql.contains("WHERE FALSE"));
    assert!(params.is_empty());
}

#[test]
fn where_gte_adds_comparison() {
    let (sql, params) = SqlBuilder::new("insights")
        .where_gte("rooms_sold", "3")
        .build();
    assert!(sql.contains("rooms_sold >= ?"));
    assert_eq!(params, vec!["3"]);
}

#[test]
fn where_lte_adds_comparison() {
    let (sql, params) = SqlBuilder::new("insights")
        .where_lte("rooms_sold", "5")
        .build();
    assert!(sql.contains("rooms_sold <= ?"));
    assert_eq!(params, vec!["5"]);
}

#[test]
fn where_date_between_casts_both_bounds() {
    let (sql, params) = SqlBuilder::new("insights")
        .where_date_between("occupancy_date", "2024-06-01", "2024-06-30")
        .build();
    assert!(sql.contains("occupancy_date BETWEEN CAST(? AS DATE) AND CAST(? AS DATE)"));
    assert_eq!(params, vec!["2024-06-01", "2024-06-30"]);
}

#[test]
fn where_date_eq_casts_the_value() {
    let (sql, params) = SqlBuilder::new("insights")
        .where_date_eq("booking_date", "2024-06-05")
        .build();
    assert!(sql.contains("booking_date = CAST(? AS DATE)"));
    assert_eq!(params, vec!["2024-06-05"]);
}

#[test]
fn where_as_of_binds_the_snapshot_date_twice() {
    let (sql, params) = SqlBuilder::new("insights")
        .where_as_of("scd_valid_from", "scd_valid_to", "2024-06-05")
        .build();
    assert!(sql.contains("scd_valid_from <= CAST(? AS DATE) AND CAST(? AS DATE) < scd_valid_to"));
    assert_eq!(params, vec!["2024-06-05", "2024-06-05"]);
}

#[test]
fn where_clause_appends_params_in_order() {
    let (sql, params) = SqlBuilder::new("insights")
        .where_eq("property", "coast")
        .where_clause("guest_country <> ?", &["UNDEFINED"])
        .build();
    assert!(sql.contains("property = ?"));
    assert!(sql.contains("guest_country <> ?"));
    assert_eq!(params, vec!["coast", "UNDEFINED"]);
}

// ---------------------------------------------------------------------------
// JOIN
// ---------------------------------------------------------------------------

#[test]
fn join_adds_clause() {
    let (sql, _) = SqlBuilder::new("insights i")
        .join("JOIN room_type_details r ON i.room_type = r.room_type")
        .build();
    assert!(sql.contains("JOIN room_type_details r ON i.room_type = r.room_type"));
}

// ---------------------------------------------------------------------------
// GROUP BY / ORDER BY / LIMIT
// ---------------------------------------------------------------------------

#[test]
fn group_by_adds_clause() {
    let (sql, _) = SqlBuilder::new("insights")
        .select(&["guest_country", "SUM(total_revenue) AS revenue"])
        .group_by(&["guest_country"])
        .build();
    assert!(sql.contains("GROUP BY guest_country"));
}

#[test]
fn order_by_adds_clause() {
    let (sql, _) = SqlBuilder::new("insights")
        .order_by(&["occupancy_date ASC", "total_revenue DESC"])
        .build();
    assert!(sql.contains("ORDER BY occupancy_date ASC, total_revenue DESC"));
}

#[test]
fn limit_adds_clause() {
    let (sql, _) = SqlBuilder::new("insights").limit(10).build();
    assert!(sql.contains("LIMIT 10"));
}

// ---------------------------------------------------------------------------
// Combined / chained
// ---------------------------------------------------------------------------

#[test]
fn multiple_where_clauses_joined_with_and() {
    let (sql, _) = SqlBuilder::new("insights")
        .where_eq("property", "coast")
        .where_eq("guest_country", "Germany")
        .build();
    assert!(sql.contains("WHERE property = ? AND guest_country = ?"));
}

#[test]
fn full_query_with_window_snapshot_and_grouping() {
    let (sql, params) = SqlBuilder::new("insights")
        .select(&["guest_country", "SUM(total_revenue) AS revenue"])
        .where_date_between("occupancy_date", "2024-06-01", "2024-06-30")
        .where_as_of("scd_valid_from", "scd_valid_to", "2024-06-05")
        .where_eq("property", "coast")
        .group_by(&["guest_country"])
        .order_by(&["revenue DESC"])
        .limit(5)
        .build();

    assert!(sql.contains("SELECT guest_country, SUM(total_revenue) AS revenue"));
    assert!(sql.contains("FROM insights"));
    assert!(sql.contains("occupancy_date BETWEEN CAST(? AS DATE) AND CAST(? AS DATE)"));
    assert!(sql.contains("GROUP BY guest_country"));
    assert!(sql.contains("ORDER BY revenue DESC"));
    assert!(sql.contains("LIMIT 5"));
    assert_eq!(
        params,
        vec!["2024-06-01", "2024-06-30", "2024-06-05", "2024-06-05", "coast"]
    );
}
