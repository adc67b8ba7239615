use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub risk: RiskConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    pub ledger: LedgerConfig,
    pub kalshi: KalshiConfig,
    pub polymarket: PolymarketConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Risk-control limits and account sizing
#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    /// Account balance on first run (USD)
    pub initial_balance: Decimal,
    /// Target units (shares) per leg
    pub bet_amount: u64,
    /// Minimum ROI percentage to accept a candidate
    pub min_roi: Decimal,
    /// Maximum cost of a single trade (USD)
    pub max_position_size: Decimal,
    /// Maximum trades per UTC day
    pub max_daily_trades: usize,
    /// Daily realized-loss limit (USD)
    pub daily_loss_limit: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    /// Seconds between candidate-placement ticks
    #[serde(default = "default_place_interval")]
    pub place_interval_secs: u64,
    /// Seconds between settlement-reconciliation ticks
    #[serde(default = "default_settle_interval")]
    pub settle_interval_secs: u64,
    /// Per-call timeout for every external network call
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,
}

fn default_place_interval() -> u64 {
    30
}

fn default_settle_interval() -> u64 {
    60
}

fn default_call_timeout() -> u64 {
    10
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            place_interval_secs: default_place_interval(),
            settle_interval_secs: default_settle_interval(),
            call_timeout_secs: default_call_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Path to the persisted ledger JSON file
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KalshiConfig {
    #[serde(default = "default_kalshi_base")]
    pub api_base: String,
    /// Opaque access key; never logged
    #[serde(default)]
    pub api_key: Option<String>,
    /// Opaque signing secret; never logged
    #[serde(default)]
    pub api_secret: Option<String>,
}

fn default_kalshi_base() -> String {
    "https://api.elections.kalshi.com/trade-api/v2".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct PolymarketConfig {
    #[serde(default = "default_polymarket_base")]
    pub api_base: String,
    /// Opaque bearer token; never logged
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_polymarket_base() -> String {
    "https://gamma-api.polymarket.com".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AdminConfig {
    /// Secret the destructive reset operation must be confirmed with
    #[serde(default)]
    pub reset_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("ledger.path", "data/ledger.json")?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(
                File::from(config_dir.join(
                    std::env::var("POLYMIX_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (POLYMIX_RISK__MIN_ROI, etc.)
            .add_source(
                Environment::with_prefix("POLYMIX")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.risk.initial_balance <= Decimal::ZERO {
            errors.push("initial_balance must be positive".to_string());
        }

        if self.risk.bet_amount == 0 {
            errors.push("bet_amount must be greater than zero".to_string());
        }

        if self.risk.min_roi < Decimal::ZERO {
            errors.push("min_roi cannot be negative".to_string());
        }

        if self.risk.max_position_size <= Decimal::ZERO {
            errors.push("max_position_size must be positive".to_string());
        }

        if self.risk.max_daily_trades == 0 {
            errors.push("max_daily_trades must be greater than zero".to_string());
        }

        if self.risk.daily_loss_limit <= Decimal::ZERO {
            errors.push("daily_loss_limit must be positive".to_string());
        }

        if self.execution.call_timeout_secs == 0 {
            errors.push("call_timeout_secs must be greater than zero".to_string());
        }

        if self.ledger.path.trim().is_empty() {
            errors.push("ledger.path must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
