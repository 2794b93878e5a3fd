use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

const DEFAULT_ACCOUNTS_URL: &str = "https://mybusinessaccountmanagement.googleapis.com/v1/";
const DEFAULT_LOCATIONS_URL: &str = "https://mybusinessbusinessinformation.googleapis.com/v1/";
const DEFAULT_REVIEWS_URL: &str = "https://mybusiness.googleapis.com/v4/";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
#[allow(clippy::too_many_lines)]
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_f32 = |var: &str, default: &str| -> Result<f32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<f32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("REVDB_ENV", "development"));
    let log_level = or_default("REVDB_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("REVDB_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("REVDB_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("REVDB_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let listing_access_token = optional("REVDB_LISTING_ACCESS_TOKEN");
    let listing_accounts_url = or_default("REVDB_LISTING_ACCOUNTS_URL", DEFAULT_ACCOUNTS_URL);
    let listing_locations_url = or_default("REVDB_LISTING_LOCATIONS_URL", DEFAULT_LOCATIONS_URL);
    let listing_reviews_url = or_default("REVDB_LISTING_REVIEWS_URL", DEFAULT_REVIEWS_URL);
    let listing_timeout_secs = parse_u64("REVDB_LISTING_TIMEOUT_SECS", "30")?;

    let default_timezone = or_default("REVDB_DEFAULT_TIMEZONE", "Europe/London");
    if default_timezone.parse::<chrono_tz::Tz>().is_err() {
        return Err(ConfigError::InvalidEnvVar {
            var: "REVDB_DEFAULT_TIMEZONE".to_string(),
            reason: format!("unknown time zone '{default_timezone}'"),
        });
    }

    let llm_api_key = optional("REVDB_LLM_API_KEY");
    let llm_base_url = or_default("REVDB_LLM_BASE_URL", "https://api.openai.com");
    let llm_model = or_default("REVDB_LLM_MODEL", "gpt-4.1");
    let llm_max_tokens = parse_u32("REVDB_LLM_MAX_TOKENS", "2000")?;
    let llm_temperature = parse_f32("REVDB_LLM_TEMPERATURE", "0.7")?;
    let llm_max_retries = parse_u32("REVDB_LLM_MAX_RETRIES", "3")?;
    let llm_retry_delay_ms = parse_u64("REVDB_LLM_RETRY_DELAY_MS", "2000")?;
    let llm_timeout_secs = parse_u64("REVDB_LLM_TIMEOUT_SECS", "120")?;

    let pdf_api_url = optional("REVDB_PDF_API_URL");
    let pdf_api_key = optional("REVDB_PDF_API_KEY");
    let pdf_timeout_secs = parse_u64("REVDB_PDF_TIMEOUT_SECS", "60")?;

    let sendgrid_api_key = optional("REVDB_SENDGRID_API_KEY");
    let sendgrid_template_id = optional("REVDB_SENDGRID_TEMPLATE_ID");
    let email_from = or_default("REVDB_EMAIL_FROM", "admin@review-assistant.com");
    let email_from_name = or_default("REVDB_EMAIL_FROM_NAME", "Monthly Review Report");

    let retry_file = PathBuf::from(or_default("REVDB_RETRY_FILE", "retry_tracking.json"));
    let max_retry_attempts = parse_u32("REVDB_MAX_RETRY_ATTEMPTS", "3")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        listing_access_token,
        listing_accounts_url,
        listing_locations_url,
        listing_reviews_url,
        listing_timeout_secs,
        default_timezone,
        llm_api_key,
        llm_base_url,
        llm_model,
        llm_max_tokens,
        llm_temperature,
        llm_max_retries,
        llm_retry_delay_ms,
        llm_timeout_secs,
        pdf_api_url,
        pdf_api_key,
        pdf_timeout_secs,
        sendgrid_api_key,
        sendgrid_template_id,
        email_from,
        email_from_name,
        retry_file,
        max_retry_attempts,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
