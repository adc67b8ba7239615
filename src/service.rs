//! Long-running trading service.
//!
//! Two independent cadences share one ledger: a placement loop that polls
//! the candidate feed and runs each candidate through the executor, and a
//! settlement loop that sweeps pending trades. Failures inside either loop
//! are logged where they surface and recorded on the ledger by whoever hit
//! them; neither loop ever dies to an error.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::ExecutionConfig;
use crate::domain::TradeCandidate;
use crate::error::{PolymixError, Result};
use crate::executor::OrderExecutor;
use crate::settlement::SettlementReconciler;

/// Supplier of candidate trades. Opportunity detection is external; the
/// service only consumes its output.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn poll(&self) -> Result<Vec<TradeCandidate>>;
}

pub struct TradingService {
    executor: Arc<OrderExecutor>,
    reconciler: Arc<SettlementReconciler>,
    candidates: Arc<dyn CandidateSource>,
    place_interval: Duration,
    settle_interval: Duration,
}

impl TradingService {
    pub fn new(
        executor: Arc<OrderExecutor>,
        reconciler: Arc<SettlementReconciler>,
        candidates: Arc<dyn CandidateSource>,
        execution: &ExecutionConfig,
    ) -> Self {
        Self {
            executor,
            reconciler,
            candidates,
            place_interval: Duration::from_secs(execution.place_interval_secs),
            settle_interval: Duration::from_secs(execution.settle_interval_secs),
        }
    }

    /// Run both loops until ctrl-c.
    pub async fn run(&self) -> Result<()> {
        info!(
            place_secs = self.place_interval.as_secs(),
            settle_secs = self.settle_interval.as_secs(),
            "trading service started"
        );

        let mut place_tick = tokio::time::interval(self.place_interval);
        place_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut settle_tick = tokio::time::interval(self.settle_interval);
        settle_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = place_tick.tick() => self.placement_cycle().await,
                _ = settle_tick.tick() => self.settlement_cycle().await,
                result = tokio::signal::ctrl_c() => {
                    if let Err(err) = result {
                        error!(%err, "signal handler failed, shutting down");
                    } else {
                        info!("shutdown signal received");
                    }
                    break;
                }
            }
        }

        info!("trading service stopped");
        Ok(())
    }

    /// One pass over the candidate feed.
    pub async fn placement_cycle(&self) {
        let candidates = match self.candidates.poll().await {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(%err, "candidate feed poll failed");
                return;
            }
        };

        for candidate in candidates {
            let trade_id = candidate.trade_id();
            match self.executor.execute(&candidate).await {
                Ok(trade) => {
                    info!(
                        %trade_id,
                        cost = %trade.cost,
                        expected_profit = %trade.expected_profit,
                        "trade placed"
                    );
                }
                // Routine skips: not worth an error record.
                Err(PolymixError::RiskRejected(reason)) => {
                    debug!(%trade_id, %reason, "candidate skipped by risk gate");
                }
                Err(PolymixError::Validation(reason)) => {
                    debug!(%trade_id, %reason, "candidate skipped by validation");
                }
                // The executor and ledger record their own error entries;
                // the loop just keeps going.
                Err(err) => {
                    error!(%trade_id, %err, "trade execution failed");
                }
            }
        }
    }

    /// One settlement sweep.
    pub async fn settlement_cycle(&self) {
        let stats = self.reconciler.run_once().await;
        if stats.settled > 0 || stats.incomplete > 0 {
            info!(
                settled = stats.settled,
                incomplete = stats.incomplete,
                "settlement sweep finished"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CandidateLeg, Platform};
    use crate::exchange::{
        ExchangeClient, FillRecord, MarketResolution, OrderAck, OrderStatusReport,
        ResolutionSource,
    };
    use crate::ledger::Ledger;
    use crate::risk::{RiskController, RiskLimits};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct StubExchange(Platform);

    #[async_trait]
    impl ExchangeClient for StubExchange {
        fn platform(&self) -> Platform {
            self.0
        }

        async fn place_order(
            &self,
            _market_id: &str,
            _side: &str,
            _quantity: u64,
            _price: Decimal,
        ) -> Result<OrderAck> {
            Ok(OrderAck {
                order_id: format!("{}-1", self.0),
                status: "resting".to_string(),
            })
        }

        async fn cancel_order(&self, _order_id: &str) -> Result<bool> {
            Ok(true)
        }

        async fn get_order_status(&self, _order_id: &str) -> Result<OrderStatusReport> {
            Ok(OrderStatusReport {
                state: "resting".to_string(),
                filled_quantity: 0,
            })
        }

        async fn get_fills(
            &self,
            _market_id: Option<&str>,
            _limit: u32,
        ) -> Result<Vec<FillRecord>> {
            Ok(Vec::new())
        }
    }

    struct QueueSource(Mutex<Vec<TradeCandidate>>);

    #[async_trait]
    impl CandidateSource for QueueSource {
        async fn poll(&self) -> Result<Vec<TradeCandidate>> {
            Ok(std::mem::take(&mut *self.0.lock().unwrap()))
        }
    }

    struct NeverResolves;

    #[async_trait]
    impl ResolutionSource for NeverResolves {
        async fn resolve(&self, _p: Platform, _m: &str) -> Result<MarketResolution> {
            Ok(MarketResolution::unresolved())
        }
    }

    fn candidate() -> TradeCandidate {
        TradeCandidate {
            away_code: "CHI".to_string(),
            home_code: "LAL".to_string(),
            title: "Bulls vs Lakers".to_string(),
            category: "nba".to_string(),
            legs: [
                CandidateLeg {
                    platform: Platform::Kalshi,
                    market_id: "k-1".to_string(),
                    side: "yes".to_string(),
                    label: "CHI".to_string(),
                    quantity: 100,
                    price: dec!(0.55),
                },
                CandidateLeg {
                    platform: Platform::Polymarket,
                    market_id: "p-1".to_string(),
                    side: "LAL".to_string(),
                    label: "LAL".to_string(),
                    quantity: 100,
                    price: dec!(0.40),
                },
            ],
        }
    }

    async fn service(
        dir: &tempfile::TempDir,
        candidates: Vec<TradeCandidate>,
    ) -> (TradingService, Arc<Ledger>) {
        let ledger = Arc::new(
            Ledger::load(dir.path().join("ledger.json"), dec!(10000), None)
                .await
                .unwrap(),
        );
        let mut clients: HashMap<Platform, Arc<dyn ExchangeClient>> = HashMap::new();
        clients.insert(Platform::Kalshi, Arc::new(StubExchange(Platform::Kalshi)));
        clients.insert(
            Platform::Polymarket,
            Arc::new(StubExchange(Platform::Polymarket)),
        );
        let limits = RiskLimits {
            max_position_size: dec!(500),
            max_daily_trades: 10,
            daily_loss_limit: dec!(1000),
        };
        let executor = Arc::new(OrderExecutor::new(
            clients,
            ledger.clone(),
            RiskController::new(limits),
            dec!(1),
        ));
        let reconciler = Arc::new(SettlementReconciler::new(
            ledger.clone(),
            Arc::new(NeverResolves),
        ));

        let svc = TradingService::new(
            executor,
            reconciler,
            Arc::new(QueueSource(Mutex::new(candidates))),
            &ExecutionConfig::default(),
        );
        (svc, ledger)
    }

    #[tokio::test]
    async fn placement_cycle_places_fed_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let (svc, ledger) = service(&dir, vec![candidate()]).await;

        svc.placement_cycle().await;
        assert!(ledger.has_open_trade("CHI@LAL").await);

        // An empty follow-up cycle is harmless
        svc.placement_cycle().await;
        assert_eq!(ledger.snapshot().await.total_trades, 1);
    }

    #[tokio::test]
    async fn duplicate_candidate_does_not_abort_the_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let (svc, ledger) = service(&dir, vec![candidate(), candidate()]).await;

        svc.placement_cycle().await;
        let snap = ledger.snapshot().await;
        assert_eq!(snap.total_trades, 1);
        // Duplicate is a routine skip, not a recorded error
        assert!(snap.errors.is_empty());
    }

    #[tokio::test]
    async fn settlement_cycle_with_unresolved_markets_is_quiet() {
        let dir = tempfile::tempdir().unwrap();
        let (svc, ledger) = service(&dir, vec![candidate()]).await;
        svc.placement_cycle().await;
        svc.settlement_cycle().await;
        assert_eq!(ledger.pending_trades().await.len(), 1);
    }
}
