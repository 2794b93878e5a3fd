//! Live integration tests for revdb-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness, so they need `DATABASE_URL` pointing at a server that
//! allows database creation. Run with `cargo test -- --ignored`.

use chrono::NaiveDate;
use revdb_db::{
    delete_report, find_location_config, get_report_by_client_and_period,
    list_clients_with_monthly_analysis, save_report, DbError,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn insert_client(pool: &sqlx::PgPool, name: &str, monthly: bool) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO clients (name, enabled, monthly_analysis_enabled, report_email_address) \
         VALUES ($1, TRUE, $2, NULL) RETURNING id",
    )
    .bind(name)
    .bind(monthly)
    .fetch_one(pool)
    .await
    .unwrap_or_else(|e| panic!("insert_client failed for '{name}': {e}"))
}

async fn insert_location(pool: &sqlx::PgPool, client_id: i64, name: &str, postal: &str) {
    sqlx::query(
        "INSERT INTO location_configs \
             (client_id, location_name, postal_code, time_zone, enabled, report_enabled, \
              monthly_analysis_enabled) \
         VALUES ($1, $2, $3, 'Europe/London', TRUE, TRUE, TRUE)",
    )
    .bind(client_id)
    .bind(name)
    .bind(postal)
    .execute(pool)
    .await
    .unwrap_or_else(|e| panic!("insert_location failed for '{name}': {e}"));
}

fn march() -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[ignore = "requires a live Postgres via DATABASE_URL"]
#[sqlx::test(migrations = "../../migrations")]
async fn lists_only_clients_with_analysis_enabled_locations(pool: sqlx::PgPool) {
    let with_location = insert_client(&pool, "Alpha Cars", true).await;
    insert_location(&pool, with_location, "Alpha Depot", "AB1 2CD").await;
    let _no_location = insert_client(&pool, "Beta Cars", true).await;
    let disabled = insert_client(&pool, "Gamma Cars", false).await;
    insert_location(&pool, disabled, "Gamma Depot", "EF3 4GH").await;

    let clients = list_clients_with_monthly_analysis(&pool).await.unwrap();
    let ids: Vec<i64> = clients.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![with_location]);
}

#[ignore = "requires a live Postgres via DATABASE_URL"]
#[sqlx::test(migrations = "../../migrations")]
async fn find_location_config_ignores_whitespace(pool: sqlx::PgPool) {
    let client_id = insert_client(&pool, "Alpha Cars", true).await;
    insert_location(&pool, client_id, "  Alpha Depot ", "AB1 2CD").await;

    let found = find_location_config(&pool, "Alpha Depot", "AB12CD")
        .await
        .unwrap()
        .expect("config should match");
    assert_eq!(found.client_id, client_id);

    let missing = find_location_config(&pool, "Alpha Depot", "ZZ9 9ZZ")
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[ignore = "requires a live Postgres via DATABASE_URL"]
#[sqlx::test(migrations = "../../migrations")]
async fn report_save_lookup_delete_cycle(pool: sqlx::PgPool) {
    let client_id = insert_client(&pool, "Alpha Cars", true).await;
    let (start, end) = march();
    let body = serde_json::json!([{ "locationID": "accounts/1/locations/2" }]);

    assert!(get_report_by_client_and_period(&pool, client_id, start, end)
        .await
        .unwrap()
        .is_none());

    let report_id = save_report(&pool, client_id, start, end, &body).await.unwrap();
    let stored = get_report_by_client_and_period(&pool, client_id, start, end)
        .await
        .unwrap()
        .expect("report should exist");
    assert_eq!(stored.report_id, report_id);
    assert_eq!(stored.locations, body);

    let duplicate = save_report(&pool, client_id, start, end, &body).await;
    assert!(matches!(duplicate, Err(DbError::DuplicateReport { .. })));

    delete_report(&pool, report_id).await.unwrap();
    assert!(matches!(
        delete_report(&pool, report_id).await,
        Err(DbError::NotFound)
    ));
}
