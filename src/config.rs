use chrono::NaiveDate;
use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::env;
use tracing_subscriber::EnvFilter;
use validator::Validate;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";

/// Royalty accounting knobs. The defaults reproduce the launch arrangement:
/// tracked title sold from 16 December 2025, launch window due end of
/// February 2026, £1.00 owed per copy.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct RoyaltyConfig {
    /// Product name fragment identifying the tracked book (matched
    /// case-insensitively against line item names)
    #[serde(default = "default_tracked_title")]
    #[validate(length(min = 1))]
    pub tracked_title: String,

    /// Name fragment marking a line item as a pre-order sale
    #[serde(default = "default_preorder_marker")]
    pub preorder_marker: String,

    /// First day of the launch period
    #[serde(default = "default_launch_start")]
    pub launch_start: NaiveDate,

    /// Fixed due date for the launch period
    #[serde(default = "default_launch_due")]
    pub launch_due: NaiveDate,

    /// Amount owed per copy sold, applied to newly created periods
    #[serde(default = "default_amount_per_book")]
    pub amount_per_book: Decimal,
}

impl Default for RoyaltyConfig {
    fn default() -> Self {
        Self {
            tracked_title: default_tracked_title(),
            preorder_marker: default_preorder_marker(),
            launch_start: default_launch_start(),
            launch_due: default_launch_due(),
            amount_per_book: default_amount_per_book(),
        }
    }
}

/// CSV import settings.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct ImportConfig {
    /// Default export file path used when the CLI is given none
    #[serde(default = "default_import_path")]
    pub file_path: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            file_path: default_import_path(),
        }
    }
}

/// Application configuration with validation.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// CORS: comma-separated list of allowed origins
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    #[serde(default)]
    #[validate]
    pub royalty: RoyaltyConfig,

    #[serde(default)]
    #[validate]
    pub import: ImportConfig,
}

fn default_database_url() -> String {
    "sqlite://pressroom.db?mode=rwc".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_min_connections() -> u32 {
    1
}

fn default_tracked_title() -> String {
    "Through Bear's Eyes".to_string()
}

fn default_preorder_marker() -> String {
    "Pre-Order".to_string()
}

fn default_launch_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, 16).expect("static date")
}

fn default_launch_due() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, 28).expect("static date")
}

fn default_amount_per_book() -> Decimal {
    dec!(1.00)
}

fn default_import_path() -> String {
    "orders_export.csv".to_string()
}

impl AppConfig {
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }
}

/// Load configuration from `config/default.toml`, an environment-specific
/// overlay selected by `APP_ENV`, and `APP__`-prefixed environment variables
/// (highest precedence).
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let run_env = env::var("APP_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());

    let settings = Config::builder()
        .add_source(File::with_name(&format!("{CONFIG_DIR}/default")).required(false))
        .add_source(File::with_name(&format!("{CONFIG_DIR}/{run_env}")).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let cfg: AppConfig = settings.try_deserialize()?;

    cfg.validate()
        .map_err(|e| ConfigError::Message(format!("invalid configuration: {e}")))?;

    Ok(cfg)
}

/// Initialize the global tracing subscriber. `RUST_LOG` wins over the
/// configured level when set.
pub fn init_tracing(log_level: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
