use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Bearer token issued by the external credential process.
    pub listing_access_token: Option<String>,
    pub listing_accounts_url: String,
    pub listing_locations_url: String,
    pub listing_reviews_url: String,
    pub listing_timeout_secs: u64,
    /// IANA zone used when a location's configured zone is not recognised.
    pub default_timezone: String,
    pub llm_api_key: Option<String>,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_max_tokens: u32,
    pub llm_temperature: f32,
    pub llm_max_retries: u32,
    pub llm_retry_delay_ms: u64,
    pub llm_timeout_secs: u64,
    pub pdf_api_url: Option<String>,
    pub pdf_api_key: Option<String>,
    pub pdf_timeout_secs: u64,
    pub sendgrid_api_key: Option<String>,
    pub sendgrid_template_id: Option<String>,
    pub email_from: String,
    pub email_from_name: String,
    pub retry_file: PathBuf,
    pub max_retry_attempts: u32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[redacted]");
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("listing_access_token", &redact(&self.listing_access_token))
            .field("listing_accounts_url", &self.listing_accounts_url)
            .field("listing_locations_url", &self.listing_locations_url)
            .field("listing_reviews_url", &self.listing_reviews_url)
            .field("listing_timeout_secs", &self.listing_timeout_secs)
            .field("default_timezone", &self.default_timezone)
            .field("llm_api_key", &redact(&self.llm_api_key))
            .field("llm_base_url", &self.llm_base_url)
            .field("llm_model", &self.llm_model)
            .field("llm_max_tokens", &self.llm_max_tokens)
            .field("llm_temperature", &self.llm_temperature)
            .field("llm_max_retries", &self.llm_max_retries)
            .field("llm_retry_delay_ms", &self.llm_retry_delay_ms)
            .field("llm_timeout_secs", &self.llm_timeout_secs)
            .field("pdf_api_url", &self.pdf_api_url)
            .field("pdf_api_key", &redact(&self.pdf_api_key))
            .field("pdf_timeout_secs", &self.pdf_timeout_secs)
            .field("sendgrid_api_key", &redact(&self.sendgrid_api_key))
            .field("sendgrid_template_id", &self.sendgrid_template_id)
            .field("email_from", &self.email_from)
            .field("email_from_name", &self.email_from_name)
            .field("retry_file", &self.retry_file)
            .field("max_retry_attempts", &self.max_retry_attempts)
            .finish()
    }
}
