use thiserror::Error;

use crate::domain::Platform;

/// Main error type for the arbitrage executor
#[derive(Error, Debug)]
pub enum PolymixError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Pre-trade rejections
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Risk check rejected: {0}")]
    RiskRejected(String),

    // External platform calls (network, timeout, platform-reported failure)
    #[error("{platform} call failed: {reason}")]
    ExchangeCall { platform: Platform, reason: String },

    // Ledger write failures after successful placement
    #[error("Ledger persistence failed: {0}")]
    Persistence(String),

    // Reset without a valid confirmation token
    #[error("Authorization failed: {0}")]
    Authorization(String),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl PolymixError {
    /// Build an exchange-call failure from a reqwest error, preserving the
    /// timeout/connect distinction in the message only.
    pub fn exchange(platform: Platform, err: impl std::fmt::Display) -> Self {
        PolymixError::ExchangeCall {
            platform,
            reason: err.to_string(),
        }
    }
}

/// Result type alias for PolymixError
pub type Result<T> = std::result::Result<T, PolymixError>;
