use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One entry in the daily trade counter, matching the on-disk
/// `daily_trades` list the legacy file carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyTradeEntry {
    pub date: NaiveDate,
    pub trade_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Daily risk counters, reset at the UTC-midnight boundary.
///
/// Every read/write path must call [`DailyMetrics::roll`] with the current
/// UTC date before using the counters; the reset happens as part of every
/// risk check and every settlement write, not only at process start.
#[derive(Debug, Clone)]
pub struct DailyMetrics {
    pub date: NaiveDate,
    pub cumulative_loss: Decimal,
    pub entries: Vec<DailyTradeEntry>,
}

impl DailyMetrics {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            cumulative_loss: Decimal::ZERO,
            entries: Vec::new(),
        }
    }

    /// Reset the counters if the stored date is not `today`.
    /// Returns true when a reset occurred.
    pub fn roll(&mut self, today: NaiveDate) -> bool {
        if self.date == today {
            return false;
        }
        *self = DailyMetrics::new(today);
        true
    }

    pub fn trade_count(&self) -> usize {
        self.entries.len()
    }

    pub fn record_trade(&mut self, trade_id: &str, now: DateTime<Utc>) {
        self.entries.push(DailyTradeEntry {
            date: self.date,
            trade_id: trade_id.to_string(),
            timestamp: now,
        });
    }

    /// Accrue a realized loss (positive magnitude).
    pub fn record_loss(&mut self, loss: Decimal) {
        self.cumulative_loss += loss.abs();
    }
}

/// Maximum error records the ledger retains; older entries are evicted FIFO.
pub const MAX_ERROR_RECORDS: usize = 100;

/// A recorded trading error, retained for the state query surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    #[serde(default)]
    pub trade_id: Option<String>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorRecord {
    pub fn new(trade_id: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            trade_id: trade_id.map(str::to_string),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}
