//! Pre-trade risk gating.
//!
//! Every admission decision runs the same ordered checks against the live
//! ledger state: daily boundary reset first, then trade count, position
//! size, daily loss, and balance. The first failing check wins and its
//! reason is surfaced verbatim in the rejection.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::config::RiskConfig;
use crate::ledger::LedgerState;

/// Immutable risk limits, taken from configuration at startup.
#[derive(Debug, Clone)]
pub struct RiskLimits {
    pub max_position_size: Decimal,
    pub max_daily_trades: usize,
    pub daily_loss_limit: Decimal,
}

impl From<&RiskConfig> for RiskLimits {
    fn from(cfg: &RiskConfig) -> Self {
        Self {
            max_position_size: cfg.max_position_size,
            max_daily_trades: cfg.max_daily_trades,
            daily_loss_limit: cfg.daily_loss_limit,
        }
    }
}

/// Outcome of a risk evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskVerdict {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl RiskVerdict {
    fn pass() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn fail(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

pub struct RiskController {
    limits: RiskLimits,
}

impl RiskController {
    pub fn new(limits: RiskLimits) -> Self {
        Self { limits }
    }

    /// Evaluate a proposed trade of exact total cost `proposed_cost`.
    ///
    /// Rolls the daily counters when `today` has moved past the stored
    /// metrics date, so a process that runs across midnight UTC resumes
    /// trading without a restart.
    pub fn evaluate(
        &self,
        state: &mut LedgerState,
        proposed_cost: Decimal,
        today: NaiveDate,
    ) -> RiskVerdict {
        if state.daily.roll(today) {
            info!(%today, "daily risk counters reset");
        }

        let trades_today = state.daily.trade_count();
        if trades_today >= self.limits.max_daily_trades {
            let reason = format!(
                "daily trade limit reached ({}/{})",
                trades_today, self.limits.max_daily_trades
            );
            warn!(%reason, "trade rejected");
            return RiskVerdict::fail(reason);
        }

        if proposed_cost > self.limits.max_position_size {
            let reason = format!(
                "position size {} exceeds limit {}",
                proposed_cost, self.limits.max_position_size
            );
            warn!(%reason, "trade rejected");
            return RiskVerdict::fail(reason);
        }

        if state.daily.cumulative_loss >= self.limits.daily_loss_limit {
            let reason = format!(
                "daily loss limit reached ({}/{})",
                state.daily.cumulative_loss, self.limits.daily_loss_limit
            );
            warn!(%reason, "trade rejected");
            return RiskVerdict::fail(reason);
        }

        if proposed_cost > state.balance {
            let reason = format!(
                "insufficient balance: need {}, have {}",
                proposed_cost, state.balance
            );
            warn!(%reason, "trade rejected");
            return RiskVerdict::fail(reason);
        }

        RiskVerdict::pass()
    }
}
