//! Settlement reconciliation.
//!
//! A periodic sweep over pending trades that asks the resolution source
//! about each unresolved leg, records outcomes on the ledger, and finalizes
//! trades that are fully resolved or stuck past the settlement window.
//! Per-leg query failures are recorded and skipped; one bad market never
//! stalls the sweep.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::exchange::ResolutionSource;
use crate::ledger::{Ledger, LegUpdate, SettlementOutcome};

/// How long a partially-resolved trade may stay pending before it is
/// force-finalized with its unresolved legs treated as losses.
const SETTLEMENT_WINDOW_HOURS: i64 = 24;

/// Counts from one reconciliation sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    pub checked: usize,
    pub settled: usize,
    pub incomplete: usize,
}

pub struct SettlementReconciler {
    ledger: Arc<Ledger>,
    source: Arc<dyn ResolutionSource>,
    window: chrono::Duration,
}

impl SettlementReconciler {
    pub fn new(ledger: Arc<Ledger>, source: Arc<dyn ResolutionSource>) -> Self {
        Self {
            ledger,
            source,
            window: chrono::Duration::hours(SETTLEMENT_WINDOW_HOURS),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_window(mut self, window: chrono::Duration) -> Self {
        self.window = window;
        self
    }

    /// One full sweep over every pending trade.
    pub async fn run_once(&self) -> SweepStats {
        let pending = self.ledger.pending_trades().await;
        let mut stats = SweepStats {
            checked: pending.len(),
            ..SweepStats::default()
        };
        if pending.is_empty() {
            return stats;
        }
        debug!(pending = pending.len(), "settlement sweep");

        for trade in pending {
            let mut updates = Vec::new();
            for (index, leg) in trade.legs.iter().enumerate() {
                if leg.resolved {
                    continue;
                }
                match self.source.resolve(leg.platform, &leg.market_id).await {
                    Ok(resolution) if resolution.resolved => {
                        let winning = resolution
                            .winner
                            .as_deref()
                            .map(|w| w.eq_ignore_ascii_case(&leg.label))
                            .unwrap_or(false);
                        updates.push(LegUpdate { index, winning });
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warn!(
                            trade_id = %trade.id,
                            platform = %leg.platform,
                            market_id = %leg.market_id,
                            %err,
                            "resolution query failed"
                        );
                        self.ledger
                            .record_error(
                                Some(&trade.id),
                                format!("resolution query failed for {}: {}", leg.market_id, err),
                            )
                            .await;
                    }
                }
            }

            // Applied even with no new updates so trades stuck past the
            // window get force-finalized.
            match self.ledger.apply_resolutions(&trade.id, &updates, self.window).await {
                Ok(SettlementOutcome::Settled { payout, profit }) => {
                    info!(trade_id = %trade.id, %payout, %profit, "trade settled");
                    stats.settled += 1;
                }
                Ok(SettlementOutcome::Incomplete { payout, profit }) => {
                    warn!(
                        trade_id = %trade.id,
                        %payout,
                        %profit,
                        "trade force-finalized past settlement window"
                    );
                    stats.incomplete += 1;
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(trade_id = %trade.id, %err, "could not persist settlement");
                    self.ledger
                        .record_error(Some(&trade.id), format!("settlement persist failed: {}", err))
                        .await;
                }
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Leg, Platform, Trade, TradeStatus};
    use crate::exchange::MarketResolution;
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted resolution source keyed by market id.
    struct ScriptedSource {
        outcomes: Mutex<HashMap<String, MarketResolution>>,
        queries: Mutex<Vec<String>>,
    }

    impl ScriptedSource {
        fn new(entries: Vec<(&str, MarketResolution)>) -> Self {
            Self {
                outcomes: Mutex::new(
                    entries
                        .into_iter()
                        .map(|(k, v)| (k.to_string(), v))
                        .collect(),
                ),
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ResolutionSource for ScriptedSource {
        async fn resolve(
            &self,
            _platform: Platform,
            market_id: &str,
        ) -> crate::error::Result<MarketResolution> {
            self.queries.lock().unwrap().push(market_id.to_string());
            Ok(self
                .outcomes
                .lock()
                .unwrap()
                .get(market_id)
                .cloned()
                .unwrap_or_else(MarketResolution::unresolved))
        }
    }

    fn leg(platform: Platform, market_id: &str, label: &str, price: Decimal) -> Leg {
        Leg {
            platform,
            market_id: market_id.to_string(),
            side: "yes".to_string(),
            label: label.to_string(),
            quantity: 100,
            price,
            order_id: Some("ord".to_string()),
            resolved: false,
            winning: false,
        }
    }

    fn trade(id: &str, age_hours: i64) -> Trade {
        let legs = vec![
            leg(Platform::Kalshi, "k-1", "CHI", dec!(0.55)),
            leg(Platform::Polymarket, "p-1", "LAL", dec!(0.40)),
        ];
        let cost = legs.iter().map(|l| l.cost()).sum();
        Trade {
            id: id.to_string(),
            title: "Bulls vs Lakers".to_string(),
            category: "nba".to_string(),
            created_at: Utc::now() - chrono::Duration::hours(age_hours),
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

    async fn ledger_with(dir: &tempfile::TempDir, trades: Vec<Trade>) -> Arc<Ledger> {
        let ledger = Ledger::load(dir.path().join("ledger.json"), dec!(10000), None)
            .await
            .unwrap();
        for t in trades {
            ledger.commit_trade(t).await.unwrap();
        }
        Arc::new(ledger)
    }

    #[tokio::test]
    async fn both_legs_resolved_settles_the_trade() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_with(&dir, vec![trade("CHI@LAL", 1)]).await;
        let source = Arc::new(ScriptedSource::new(vec![
            ("k-1", MarketResolution::won_by("CHI")),
            ("p-1", MarketResolution::won_by("CHI")),
        ]));

        let stats = SettlementReconciler::new(ledger.clone(), source).run_once().await;
        assert_eq!(stats.settled, 1);
        assert_eq!(stats.incomplete, 0);

        let snap = ledger.snapshot().await;
        // Kalshi leg won: payout 100 against cost 95
        assert_eq!(snap.balance, dec!(10005.00));
        assert!(snap.trades[0].legs.iter().all(|l| l.resolved));
    }

    #[tokio::test]
    async fn unresolved_markets_leave_the_trade_pending() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_with(&dir, vec![trade("CHI@LAL", 1)]).await;
        let source = Arc::new(ScriptedSource::new(vec![]));

        let stats = SettlementReconciler::new(ledger.clone(), source).run_once().await;
        assert_eq!(stats.settled, 0);
        assert_eq!(stats.incomplete, 0);
        assert_eq!(ledger.pending_trades().await.len(), 1);
    }

    #[tokio::test]
    async fn resolved_legs_are_not_requeried() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_with(&dir, vec![trade("CHI@LAL", 1)]).await;
        let source = Arc::new(ScriptedSource::new(vec![(
            "k-1",
            MarketResolution::won_by("CHI"),
        )]));

        let reconciler = SettlementReconciler::new(ledger.clone(), source.clone());
        reconciler.run_once().await;
        reconciler.run_once().await;

        let queries = source.queries.lock().unwrap();
        // k-1 answered on the first sweep; only p-1 is asked again.
        assert_eq!(
            queries
                .iter()
                .filter(|q| q.as_str() == "k-1")
                .count(),
            1
        );
        assert_eq!(
            queries
                .iter()
                .filter(|q| q.as_str() == "p-1")
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn stale_partial_trade_is_force_finalized() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_with(&dir, vec![trade("CHI@LAL", 25)]).await;
        let source = Arc::new(ScriptedSource::new(vec![(
            "k-1",
            MarketResolution::won_by("CHI"),
        )]));

        let stats = SettlementReconciler::new(ledger.clone(), source).run_once().await;
        assert_eq!(stats.incomplete, 1);

        let snap = ledger.snapshot().await;
        assert_eq!(snap.balance, dec!(10005.00));
        assert_eq!(snap.trades[0].settled_amount, Some(dec!(100)));
    }

    #[tokio::test]
    async fn stale_fully_unresolved_trade_stays_pending() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_with(&dir, vec![trade("CHI@LAL", 25)]).await;
        let source = Arc::new(ScriptedSource::new(vec![]));

        let stats = SettlementReconciler::new(ledger.clone(), source).run_once().await;
        assert_eq!(stats.incomplete, 0);
        assert_eq!(ledger.pending_trades().await.len(), 1);
    }

    #[tokio::test]
    async fn query_failure_on_one_leg_does_not_stall_the_sweep() {
        struct FailingSource;

        #[async_trait]
        impl ResolutionSource for FailingSource {
            async fn resolve(
                &self,
                platform: Platform,
                market_id: &str,
            ) -> crate::error::Result<MarketResolution> {
                if market_id == "k-1" {
                    return Err(crate::error::PolymixError::exchange(platform, "http 500"));
                }
                Ok(MarketResolution::won_by("LAL"))
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_with(&dir, vec![trade("CHI@LAL", 1)]).await;
        let stats = SettlementReconciler::new(ledger.clone(), Arc::new(FailingSource))
            .run_once()
            .await;
        assert_eq!(stats.checked, 1);

        let snap = ledger.snapshot().await;
        // The Polymarket leg still resolved; the failed Kalshi query left
        // an error record behind.
        assert!(snap.trades[0].legs[1].resolved);
        assert!(!snap.trades[0].legs[0].resolved);
        assert!(!snap.errors.is_empty());
    }
}
