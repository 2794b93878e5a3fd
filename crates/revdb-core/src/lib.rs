pub mod app_config;
pub mod config;
pub mod domain;
pub mod period;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use domain::{Client, LocationConfig};
pub use period::{
    format_month, month_label, parse_month, previous_month, resolve_timezone, MonthPeriod,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("invalid month \"{0}\": expected YYYY-MM")]
    InvalidMonth(String),
}
