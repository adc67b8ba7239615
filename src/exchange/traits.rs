use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::Platform;
use crate::error::Result;

/// Acknowledgement returned by a platform when an order is accepted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAck {
    pub order_id: String,
    /// Platform-reported status string at acceptance time
    pub status: String,
}

/// Point-in-time order state as reported by the platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusReport {
    pub state: String,
    pub filled_quantity: u64,
}

/// A single fill reported by a platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillRecord {
    pub order_id: String,
    pub market_id: String,
    pub side: String,
    pub quantity: u64,
    pub price: Decimal,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Polymorphic client for one trading venue.
///
/// Every call may block on network I/O, is bounded by the configured call
/// timeout, and fails with a typed [`crate::error::PolymixError::ExchangeCall`]
/// rather than a crash. Credentials are opaque and never logged.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    fn platform(&self) -> Platform;

    async fn place_order(
        &self,
        market_id: &str,
        side: &str,
        quantity: u64,
        price: Decimal,
    ) -> Result<OrderAck>;

    async fn cancel_order(&self, order_id: &str) -> Result<bool>;

    async fn get_order_status(&self, order_id: &str) -> Result<OrderStatusReport>;

    async fn get_fills(&self, market_id: Option<&str>, limit: u32) -> Result<Vec<FillRecord>>;
}

/// Resolution outcome for one market
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketResolution {
    pub resolved: bool,
    /// Winning side code, present once resolved
    #[serde(default)]
    pub winner: Option<String>,
}

impl MarketResolution {
    pub fn unresolved() -> Self {
        Self {
            resolved: false,
            winner: None,
        }
    }

    pub fn won_by(winner: impl Into<String>) -> Self {
        Self {
            resolved: true,
            winner: Some(winner.into()),
        }
    }
}

/// External market-resolution lookup: given a market identifier, report
/// whether the market has resolved and which side won.
#[async_trait]
pub trait ResolutionSource: Send + Sync {
    async fn resolve(&self, platform: Platform, market_id: &str) -> Result<MarketResolution>;
}
