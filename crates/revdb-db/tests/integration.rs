//! Offline tests for revdb-db pool configuration and row types.
//! These tests do not require a live database connection.

use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use revdb_core::{AppConfig, Client, Environment, LocationConfig};
use revdb_db::{ClientReportRow, ClientRow, LocationConfigRow, PoolConfig};

fn app_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        log_level: "info".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        listing_access_token: None,
        listing_accounts_url: "http://accounts.test/".to_string(),
        listing_locations_url: "http://locations.test/".to_string(),
        listing_reviews_url: "http://reviews.test/".to_string(),
        listing_timeout_secs: 30,
        default_timezone: "Europe/London".to_string(),
        llm_api_key: None,
        llm_base_url: "http://llm.test".to_string(),
        llm_model: "gpt-4.1".to_string(),
        llm_max_tokens: 2000,
        llm_temperature: 0.7,
        llm_max_retries: 3,
        llm_retry_delay_ms: 2000,
        llm_timeout_secs: 120,
        pdf_api_url: None,
        pdf_api_key: None,
        pdf_timeout_secs: 60,
        sendgrid_api_key: None,
        sendgrid_template_id: None,
        email_from: "admin@review-assistant.com".to_string(),
        email_from_name: "Monthly Review Report".to_string(),
        retry_file: PathBuf::from("retry_tracking.json"),
        max_retry_attempts: 3,
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn client_row_maps_onto_domain_client() {
    let row = ClientRow {
        id: 11,
        name: "Northside Taxis".to_string(),
        enabled: true,
        monthly_analysis_enabled: true,
        report_email_address: Some("owner@northside.test".to_string()),
    };

    let client = Client::from(row);
    assert_eq!(client.id, 11);
    assert_eq!(client.notification_email(), Some("owner@northside.test"));
}

#[test]
fn location_config_row_maps_onto_domain_config() {
    let row = LocationConfigRow {
        client_id: 11,
        location_name: "Northside Depot".to_string(),
        postal_code: "M1 1AE".to_string(),
        time_zone: Some("Europe/London".to_string()),
        report_enabled: true,
        monthly_analysis_enabled: true,
    };

    let config = LocationConfig::from(row);
    assert_eq!(config.client_id, 11);
    assert_eq!(config.time_zone.as_deref(), Some("Europe/London"));
}

/// Compile-time smoke test: confirm that [`ClientReportRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn client_report_row_has_expected_fields() {
    let row = ClientReportRow {
        report_id: 5,
        client_id: 11,
        report_period_start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        report_period_end: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
        generated_at: Utc::now(),
        locations: serde_json::json!([]),
    };

    assert_eq!(row.report_id, 5);
    assert!(row.locations.as_array().is_some_and(Vec::is_empty));
}
