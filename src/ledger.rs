//! Persisted trade ledger.
//!
//! The ledger is the single owner of all mutable trading state: balance,
//! trades, daily risk counters, and the bounded error history. The placement
//! path and the settlement path both go through its commit-style methods, so
//! every mutation is serialized behind one writer lock and persisted before
//! the caller sees success.
//!
//! The on-disk shape keeps the legacy field names (`bets`, `daily_trades`,
//! `daily_loss`, `last_daily_reset_date`, `errors`); loading tolerates any of
//! the newer fields being absent and migrates once, so nothing else in the
//! crate branches on field presence.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::domain::{
    DailyMetrics, DailyTradeEntry, ErrorRecord, Trade, TradeStatus, MAX_ERROR_RECORDS,
};
use crate::error::{PolymixError, Result};
use crate::risk::{RiskController, RiskVerdict};

/// In-memory trading state, fully populated after migration.
#[derive(Debug, Clone)]
pub struct LedgerState {
    pub balance: Decimal,
    pub initial_balance: Decimal,
    pub trades: Vec<Trade>,
    pub daily: DailyMetrics,
    pub errors: VecDeque<ErrorRecord>,
}

impl LedgerState {
    fn fresh(initial_balance: Decimal, today: NaiveDate) -> Self {
        Self {
            balance: initial_balance,
            initial_balance,
            trades: Vec::new(),
            daily: DailyMetrics::new(today),
            errors: VecDeque::new(),
        }
    }

    fn push_error(&mut self, record: ErrorRecord) {
        self.errors.push_back(record);
        while self.errors.len() > MAX_ERROR_RECORDS {
            self.errors.pop_front();
        }
    }
}

/// On-disk ledger shape. Every field newer than the original format is
/// optional so legacy files load cleanly.
#[derive(Debug, Serialize, Deserialize)]
struct LedgerFile {
    balance: Decimal,
    initial_balance: Decimal,
    #[serde(default)]
    bets: Vec<Trade>,
    #[serde(default)]
    daily_trades: Option<Vec<DailyTradeEntry>>,
    #[serde(default)]
    daily_loss: Option<Decimal>,
    #[serde(default)]
    last_daily_reset_date: Option<NaiveDate>,
    #[serde(default)]
    errors: Option<Vec<ErrorRecord>>,
}

impl LedgerFile {
    /// One-time migration to the fully-populated in-memory struct.
    fn migrate(self, today: NaiveDate) -> LedgerState {
        let date = self.last_daily_reset_date.unwrap_or(today);
        let entries = self
            .daily_trades
            .unwrap_or_default()
            .into_iter()
            .filter(|entry| entry.date == date)
            .collect();

        LedgerState {
            balance: self.balance,
            initial_balance: self.initial_balance,
            trades: self.bets,
            daily: DailyMetrics {
                date,
                cumulative_loss: self.daily_loss.unwrap_or(Decimal::ZERO),
                entries,
            },
            errors: self.errors.unwrap_or_default().into(),
        }
    }

    fn from_state(state: &LedgerState) -> Self {
        Self {
            balance: state.balance,
            initial_balance: state.initial_balance,
            bets: state.trades.clone(),
            daily_trades: Some(state.daily.entries.clone()),
            daily_loss: Some(state.daily.cumulative_loss),
            last_daily_reset_date: Some(state.daily.date),
            errors: Some(state.errors.iter().cloned().collect()),
        }
    }
}

/// Per-leg resolution update produced by the reconciler.
#[derive(Debug, Clone)]
pub struct LegUpdate {
    pub index: usize,
    pub winning: bool,
}

/// Outcome of applying resolutions to one pending trade.
#[derive(Debug, Clone, PartialEq)]
pub enum SettlementOutcome {
    /// Trade was not pending; nothing changed.
    Noop,
    /// Some legs still unresolved and the timeout has not elapsed.
    StillPending,
    /// All legs resolved; account credited.
    Settled { payout: Decimal, profit: Decimal },
    /// Force-finalized after the timeout with unresolved legs treated as
    /// non-winning.
    Incomplete { payout: Decimal, profit: Decimal },
}

/// Read-only view of the ledger for the state query surface.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerSnapshot {
    pub balance: Decimal,
    pub initial_balance: Decimal,
    pub total_profit: Decimal,
    pub estimated_profit: Decimal,
    pub total_trades: usize,
    pub daily_loss: Decimal,
    pub daily_trades: usize,
    pub trades: Vec<Trade>,
    pub errors: Vec<ErrorRecord>,
}

/// Single-writer ledger backed by a JSON file.
pub struct Ledger {
    path: PathBuf,
    reset_token: Option<String>,
    state: RwLock<LedgerState>,
}

impl Ledger {
    /// Open the ledger at `path`, migrating a legacy file if present or
    /// creating (and persisting) a fresh state from `initial_balance`.
    pub async fn load(
        path: impl AsRef<Path>,
        initial_balance: Decimal,
        reset_token: Option<String>,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let today = Utc::now().date_naive();

        let state = if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            let content = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| PolymixError::Persistence(format!("read {:?}: {}", path, e)))?;
            let file: LedgerFile = serde_json::from_str(&content)
                .map_err(|e| PolymixError::Persistence(format!("parse {:?}: {}", path, e)))?;
            let state = file.migrate(today);
            info!(
                trades = state.trades.len(),
                balance = %state.balance,
                "loaded ledger"
            );
            state
        } else {
            info!(%initial_balance, "no ledger file, starting fresh");
            let state = LedgerState::fresh(initial_balance, today);
            Self::persist_to(&path, &state).await?;
            state
        };

        Ok(Self {
            path,
            reset_token,
            state: RwLock::new(state),
        })
    }

    async fn persist_to(path: &Path, state: &LedgerState) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| PolymixError::Persistence(format!("mkdir {:?}: {}", parent, e)))?;
            }
        }

        let content = serde_json::to_string_pretty(&LedgerFile::from_state(state))
            .map_err(|e| PolymixError::Persistence(format!("serialize ledger: {}", e)))?;

        // Write-then-rename so a crash mid-write never truncates the ledger.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| PolymixError::Persistence(format!("write {:?}: {}", tmp, e)))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| PolymixError::Persistence(format!("rename {:?}: {}", path, e)))?;

        debug!(path = ?path, "ledger persisted");
        Ok(())
    }

    /// Gate a proposed trade through the risk controller. Applies the daily
    /// boundary reset in the same critical section.
    pub async fn check_risk(&self, controller: &RiskController, proposed_cost: Decimal) -> RiskVerdict {
        let mut state = self.state.write().await;
        controller.evaluate(&mut state, proposed_cost, Utc::now().date_naive())
    }

    /// True when a trade with this id is still pending.
    pub async fn has_open_trade(&self, trade_id: &str) -> bool {
        let state = self.state.read().await;
        state
            .trades
            .iter()
            .any(|t| t.id == trade_id && t.status == TradeStatus::Pending)
    }

    /// Commit a fully-placed trade: append it, deduct its cost, count it
    /// against the daily limit, and persist. On persistence failure the
    /// in-memory state is rolled back to its pre-commit values.
    pub async fn commit_trade(&self, trade: Trade) -> Result<()> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        state.daily.roll(now.date_naive());

        let cost = trade.cost;
        let trade_id = trade.id.clone();
        state.trades.push(trade);
        state.balance -= cost;
        state.daily.record_trade(&trade_id, now);

        if let Err(err) = Self::persist_to(&self.path, &state).await {
            state.trades.pop();
            state.balance += cost;
            state.daily.entries.pop();
            state.push_error(ErrorRecord::new(
                Some(&trade_id),
                format!("failed to save trade: {}", err),
            ));
            // Best effort: the error record itself should survive if the
            // disk recovers; ignore a second failure.
            if let Err(persist_err) = Self::persist_to(&self.path, &state).await {
                warn!(%persist_err, "could not persist error record after rollback");
            }
            return Err(err);
        }

        info!(%trade_id, %cost, "trade committed");
        Ok(())
    }

    /// Apply per-leg resolutions to a pending trade and settle it when the
    /// rules allow. Already-settled and already-incomplete trades are
    /// untouched (idempotence).
    pub async fn apply_resolutions(
        &self,
        trade_id: &str,
        updates: &[LegUpdate],
        settlement_timeout: chrono::Duration,
    ) -> Result<SettlementOutcome> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        state.daily.roll(now.date_naive());

        let Some(trade) = state.trades.iter_mut().find(|t| t.id == trade_id) else {
            return Ok(SettlementOutcome::Noop);
        };
        if trade.status != TradeStatus::Pending {
            return Ok(SettlementOutcome::Noop);
        }

        for update in updates {
            if let Some(leg) = trade.legs.get_mut(update.index) {
                leg.resolved = true;
                leg.winning = update.winning;
            }
        }

        let resolved = trade.legs.iter().filter(|l| l.resolved).count();
        let total = trade.legs.len();
        let timed_out = trade.age(now) > settlement_timeout;

        let outcome = if resolved == total {
            Self::finalize(trade, TradeStatus::Settled)
        } else if resolved > 0 && timed_out {
            // Unresolved legs are treated as non-winning; payout comes from
            // the resolved legs only.
            Self::finalize(trade, TradeStatus::Incomplete)
        } else {
            SettlementOutcome::StillPending
        };

        match &outcome {
            SettlementOutcome::Settled { payout, profit }
            | SettlementOutcome::Incomplete { payout, profit } => {
                let prior_loss = state.daily.cumulative_loss;
                state.balance += *payout;
                if *profit < Decimal::ZERO {
                    // The only place daily loss accrues: a consequence of
                    // settlement, not of trade placement.
                    state.daily.record_loss(*profit);
                }
                if let Err(err) = Self::persist_to(&self.path, &state).await {
                    // Leave the trade pending so the next sweep retries once
                    // the disk recovers.
                    state.balance -= *payout;
                    state.daily.cumulative_loss = prior_loss;
                    if let Some(trade) = state.trades.iter_mut().find(|t| t.id == trade_id) {
                        trade.status = TradeStatus::Pending;
                        trade.settled_amount = None;
                        trade.realized_profit = None;
                    }
                    error!(trade_id, %err, "failed to persist settlement, reverted");
                    return Err(err);
                }
                info!(trade_id, %payout, %profit, "trade finalized");
            }
            SettlementOutcome::StillPending => {
                // Leg flags may have changed; keep them durable so the next
                // cycle does not re-query resolved legs.
                if !updates.is_empty() {
                    Self::persist_to(&self.path, &state).await?;
                }
            }
            SettlementOutcome::Noop => {}
        }

        Ok(outcome)
    }

    fn finalize(trade: &mut Trade, status: TradeStatus) -> SettlementOutcome {
        let payout: Decimal = trade
            .legs
            .iter()
            .filter(|leg| leg.resolved && leg.winning)
            .map(|leg| leg.payout())
            .sum();
        let profit = payout - trade.cost;

        trade.status = status;
        trade.settled_amount = Some(payout);
        trade.realized_profit = Some(profit);

        match status {
            TradeStatus::Settled => SettlementOutcome::Settled { payout, profit },
            _ => SettlementOutcome::Incomplete { payout, profit },
        }
    }

    /// Append an error record (bounded at [`MAX_ERROR_RECORDS`]); persistence
    /// here is best effort so recording can never mask the original failure.
    pub async fn record_error(&self, trade_id: Option<&str>, message: impl Into<String>) {
        let mut state = self.state.write().await;
        state.push_error(ErrorRecord::new(trade_id, message));
        if let Err(err) = Self::persist_to(&self.path, &state).await {
            warn!(%err, "could not persist error record");
        }
    }

    /// Destructive reset back to the initial balance. Requires the
    /// caller-supplied token to match the configured secret.
    pub async fn reset(&self, token: &str) -> Result<()> {
        let expected = self.reset_token.as_deref().ok_or_else(|| {
            PolymixError::Authorization("reset token is not configured".to_string())
        })?;
        if token != expected {
            return Err(PolymixError::Authorization(
                "reset token mismatch".to_string(),
            ));
        }

        let mut state = self.state.write().await;
        let fresh = LedgerState::fresh(state.initial_balance, Utc::now().date_naive());
        let previous = std::mem::replace(&mut *state, fresh);
        if let Err(err) = Self::persist_to(&self.path, &state).await {
            *state = previous;
            return Err(err);
        }

        info!("ledger reset to initial balance");
        Ok(())
    }

    /// Clone of all pending trades, for the reconciler.
    pub async fn pending_trades(&self) -> Vec<Trade> {
        let state = self.state.read().await;
        state
            .trades
            .iter()
            .filter(|t| t.is_pending())
            .cloned()
            .collect()
    }

    /// Read-only snapshot for the state query surface.
    pub async fn snapshot(&self) -> LedgerSnapshot {
        let state = self.state.read().await;

        let total_profit = state
            .trades
            .iter()
            .filter_map(|t| t.realized_profit)
            .sum();
        let estimated_profit = state
            .trades
            .iter()
            .filter(|t| t.is_pending())
            .map(|t| t.expected_profit)
            .sum();

        let mut trades = state.trades.clone();
        trades.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        LedgerSnapshot {
            balance: state.balance,
            initial_balance: state.initial_balance,
            total_profit,
            estimated_profit,
            total_trades: state.trades.len(),
            daily_loss: state.daily.cumulative_loss,
            daily_trades: state.daily.trade_count(),
            trades,
            errors: state.errors.iter().cloned().collect(),
        }
    }

    #[cfg(test)]
    pub(crate) async fn balance(&self) -> Decimal {
        self.state.read().await.balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Leg, Platform};
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn leg(platform: Platform, side: &str, price: Decimal) -> Leg {
        Leg {
            platform,
            market_id: format!("mkt-{}", side),
            side: side.to_string(),
            label: side.to_string(),
            quantity: 100,
            price,
            order_id: Some(format!("ord-{}", side)),
            resolved: false,
            winning: false,
        }
    }

    fn trade(id: &str) -> Trade {
        let legs = vec![
            leg(Platform::Kalshi, "CHI", dec!(0.60)),
            leg(Platform::Polymarket, "LAL", dec!(0.35)),
        ];
        let cost: Decimal = legs.iter().map(|l| l.cost()).sum();
        Trade {
            id: id.to_string(),
            title: "Bulls vs Lakers".to_string(),
            category: "nba".to_string(),
            created_at: Utc::now(),
            status: TradeStatus::Pending,
            legs,
            cost,
            expected_profit: dec!(5),
            roi_percent: dec!(5.26),
            realized_profit: None,
            settled_amount: None,
            order_ids: HashMap::new(),
        }
    }

    async fn fresh_ledger(dir: &tempfile::TempDir) -> Ledger {
        Ledger::load(
            dir.path().join("ledger.json"),
            dec!(10000),
            Some("sesame".to_string()),
        )
        .await
        .expect("ledger loads")
    }

    #[tokio::test]
    async fn commit_deducts_balance_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = fresh_ledger(&dir).await;

        ledger.commit_trade(trade("CHI@LAL")).await.unwrap();
        assert_eq!(ledger.balance().await, dec!(9905.00));

        // Reload from disk and confirm durability
        let reloaded = Ledger::load(dir.path().join("ledger.json"), dec!(10000), None)
            .await
            .unwrap();
        let snap = reloaded.snapshot().await;
        assert_eq!(snap.balance, dec!(9905.00));
        assert_eq!(snap.total_trades, 1);
        assert_eq!(snap.daily_trades, 1);
    }

    #[tokio::test]
    async fn persistence_failure_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = fresh_ledger(&dir).await;

        // Turn the ledger path into a directory so the rename fails.
        let path = dir.path().join("ledger.json");
        tokio::fs::remove_file(&path).await.unwrap();
        tokio::fs::create_dir(&path).await.unwrap();

        let before = ledger.balance().await;
        let err = ledger.commit_trade(trade("CHI@LAL")).await.unwrap_err();
        assert!(matches!(err, PolymixError::Persistence(_)));

        assert_eq!(ledger.balance().await, before);
        let snap = ledger.snapshot().await;
        assert_eq!(snap.total_trades, 0);
        assert_eq!(snap.errors.len(), 1);
        assert!(snap.errors[0].message.contains("failed to save trade"));
    }

    #[tokio::test]
    async fn full_settlement_credits_payout() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = fresh_ledger(&dir).await;
        ledger.commit_trade(trade("CHI@LAL")).await.unwrap();

        let outcome = ledger
            .apply_resolutions(
                "CHI@LAL",
                &[
                    LegUpdate {
                        index: 0,
                        winning: true,
                    },
                    LegUpdate {
                        index: 1,
                        winning: false,
                    },
                ],
                chrono::Duration::hours(24),
            )
            .await
            .unwrap();

        // payout 100, cost 95 -> profit 5
        assert_eq!(
            outcome,
            SettlementOutcome::Settled {
                payout: dec!(100),
                profit: dec!(5.00),
            }
        );
        assert_eq!(ledger.balance().await, dec!(10005.00));

        // Re-running is a no-op
        let again = ledger
            .apply_resolutions("CHI@LAL", &[], chrono::Duration::hours(24))
            .await
            .unwrap();
        assert_eq!(again, SettlementOutcome::Noop);
        assert_eq!(ledger.balance().await, dec!(10005.00));
    }

    #[tokio::test]
    async fn settlement_persist_failure_reverts_and_stays_pending() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = fresh_ledger(&dir).await;
        ledger.commit_trade(trade("CHI@LAL")).await.unwrap();
        let before = ledger.balance().await;

        // Turn the ledger path into a directory so the rename fails.
        let path = dir.path().join("ledger.json");
        tokio::fs::remove_file(&path).await.unwrap();
        tokio::fs::create_dir(&path).await.unwrap();

        let updates = [
            LegUpdate {
                index: 0,
                winning: false,
            },
            LegUpdate {
                index: 1,
                winning: false,
            },
        ];
        let err = ledger
            .apply_resolutions("CHI@LAL", &updates, chrono::Duration::hours(24))
            .await
            .unwrap_err();
        assert!(matches!(err, PolymixError::Persistence(_)));

        // Neither the credit nor the loss sticks, and the trade is still
        // pending for the next sweep.
        assert_eq!(ledger.balance().await, before);
        let snap = ledger.snapshot().await;
        assert_eq!(snap.daily_loss, Decimal::ZERO);
        let pending = ledger.pending_trades().await;
        assert_eq!(pending.len(), 1);
        assert!(pending[0].realized_profit.is_none());
        assert!(pending[0].settled_amount.is_none());

        // Once the disk recovers the same resolutions go through.
        tokio::fs::remove_dir(&path).await.unwrap();
        let outcome = ledger
            .apply_resolutions("CHI@LAL", &updates, chrono::Duration::hours(24))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            SettlementOutcome::Settled {
                payout: Decimal::ZERO,
                profit: dec!(-95.00),
            }
        );
        assert_eq!(ledger.snapshot().await.daily_loss, dec!(95.00));
    }

    #[tokio::test]
    async fn losing_settlement_accrues_daily_loss() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = fresh_ledger(&dir).await;
        ledger.commit_trade(trade("CHI@LAL")).await.unwrap();

        let outcome = ledger
            .apply_resolutions(
                "CHI@LAL",
                &[
                    LegUpdate {
                        index: 0,
                        winning: false,
                    },
                    LegUpdate {
                        index: 1,
                        winning: false,
                    },
                ],
                chrono::Duration::hours(24),
            )
            .await
            .unwrap();

        assert_eq!(
            outcome,
            SettlementOutcome::Settled {
                payout: dec!(0),
                profit: dec!(-95.00),
            }
        );
        let snap = ledger.snapshot().await;
        assert_eq!(snap.daily_loss, dec!(95.00));
    }

    #[tokio::test]
    async fn partial_resolution_before_timeout_stays_pending() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = fresh_ledger(&dir).await;
        ledger.commit_trade(trade("CHI@LAL")).await.unwrap();

        let outcome = ledger
            .apply_resolutions(
                "CHI@LAL",
                &[LegUpdate {
                    index: 0,
                    winning: true,
                }],
                chrono::Duration::hours(24),
            )
            .await
            .unwrap();
        assert_eq!(outcome, SettlementOutcome::StillPending);

        // The leg flag survives for the next cycle
        let pending = ledger.pending_trades().await;
        assert!(pending[0].legs[0].resolved);
        assert!(pending[0].legs[0].winning);
    }

    #[tokio::test]
    async fn partial_resolution_past_timeout_is_incomplete() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = fresh_ledger(&dir).await;

        let mut old = trade("CHI@LAL");
        old.created_at = Utc::now() - chrono::Duration::hours(25);
        ledger.commit_trade(old).await.unwrap();

        let outcome = ledger
            .apply_resolutions(
                "CHI@LAL",
                &[LegUpdate {
                    index: 0,
                    winning: true,
                }],
                chrono::Duration::hours(24),
            )
            .await
            .unwrap();

        assert_eq!(
            outcome,
            SettlementOutcome::Incomplete {
                payout: dec!(100),
                profit: dec!(5.00),
            }
        );

        // Idempotent on re-run: balance applied exactly once
        let balance = ledger.balance().await;
        let again = ledger
            .apply_resolutions("CHI@LAL", &[], chrono::Duration::hours(24))
            .await
            .unwrap();
        assert_eq!(again, SettlementOutcome::Noop);
        assert_eq!(ledger.balance().await, balance);
    }

    #[tokio::test]
    async fn unresolved_past_timeout_stays_pending() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = fresh_ledger(&dir).await;

        let mut old = trade("CHI@LAL");
        old.created_at = Utc::now() - chrono::Duration::hours(25);
        ledger.commit_trade(old).await.unwrap();

        let outcome = ledger
            .apply_resolutions("CHI@LAL", &[], chrono::Duration::hours(24))
            .await
            .unwrap();
        assert_eq!(outcome, SettlementOutcome::StillPending);
    }

    #[tokio::test]
    async fn legacy_file_migrates_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");

        // Original format: no daily_loss, daily_trades,
        // last_daily_reset_date, or errors fields.
        tokio::fs::write(
            &path,
            r#"{"balance": "8000", "initial_balance": "10000", "bets": []}"#,
        )
        .await
        .unwrap();

        let ledger = Ledger::load(&path, dec!(10000), None).await.unwrap();
        let snap = ledger.snapshot().await;
        assert_eq!(snap.balance, dec!(8000));
        assert_eq!(snap.daily_loss, Decimal::ZERO);
        assert_eq!(snap.daily_trades, 0);
        assert!(snap.errors.is_empty());
    }

    #[tokio::test]
    async fn error_history_is_capped_fifo() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = fresh_ledger(&dir).await;

        for i in 0..105 {
            ledger.record_error(None, format!("error {}", i)).await;
        }

        let snap = ledger.snapshot().await;
        assert_eq!(snap.errors.len(), MAX_ERROR_RECORDS);
        assert_eq!(snap.errors[0].message, "error 5");
        assert_eq!(snap.errors[99].message, "error 104");
    }

    #[tokio::test]
    async fn reset_requires_matching_token() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = fresh_ledger(&dir).await;
        ledger.commit_trade(trade("CHI@LAL")).await.unwrap();

        let err = ledger.reset("wrong").await.unwrap_err();
        assert!(matches!(err, PolymixError::Authorization(_)));
        assert_eq!(ledger.snapshot().await.total_trades, 1);

        ledger.reset("sesame").await.unwrap();
        let snap = ledger.snapshot().await;
        assert_eq!(snap.total_trades, 0);
        assert_eq!(snap.balance, dec!(10000));
    }

    #[tokio::test]
    async fn reset_without_configured_token_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::load(dir.path().join("ledger.json"), dec!(10000), None)
            .await
            .unwrap();
        let err = ledger.reset("anything").await.unwrap_err();
        assert!(matches!(err, PolymixError::Authorization(_)));
    }
}
