//! Two-leg order placement.
//!
//! Placement is a small saga: leg one, then leg two, then a single ledger
//! commit. The only compensating action is cancelling leg one when leg two
//! fails; that cancel is best effort and never masks the original failure.
//! External calls always complete before any local state changes.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::domain::{Leg, Platform, Trade, TradeCandidate, TradeStatus};
use crate::error::{PolymixError, Result};
use crate::exchange::ExchangeClient;
use crate::ledger::Ledger;
use crate::risk::RiskController;
use crate::validation::{validate_price, validate_quantity};

pub struct OrderExecutor {
    clients: HashMap<Platform, Arc<dyn ExchangeClient>>,
    ledger: Arc<Ledger>,
    risk: RiskController,
    min_roi: Decimal,
}

impl OrderExecutor {
    pub fn new(
        clients: HashMap<Platform, Arc<dyn ExchangeClient>>,
        ledger: Arc<Ledger>,
        risk: RiskController,
        min_roi: Decimal,
    ) -> Self {
        Self {
            clients,
            ledger,
            risk,
            min_roi,
        }
    }

    fn client(&self, platform: Platform) -> Result<&Arc<dyn ExchangeClient>> {
        self.clients.get(&platform).ok_or_else(|| {
            PolymixError::Internal(format!("no client registered for {}", platform))
        })
    }

    /// Run one candidate through validation, the risk gate, and both
    /// placement legs. Returns the committed trade on success.
    pub async fn execute(&self, candidate: &TradeCandidate) -> Result<Trade> {
        let trade_id = candidate.trade_id();

        let [first, second] = &candidate.legs;
        if first.platform == second.platform {
            return Err(PolymixError::Validation(format!(
                "both legs target {}; a hedged pair needs two venues",
                first.platform
            )));
        }

        for leg in &candidate.legs {
            validate_price(leg.price, &format!("{} price", leg.platform))?;
            validate_quantity(leg.quantity, &format!("{} quantity", leg.platform))?;
            if leg.market_id.trim().is_empty() {
                return Err(PolymixError::Validation(format!(
                    "empty market id on the {} leg",
                    leg.platform
                )));
            }
        }

        let roi = candidate.roi_percent();
        if roi < self.min_roi {
            return Err(PolymixError::RiskRejected(format!(
                "roi {:.2}% below minimum {:.2}%",
                roi, self.min_roi
            )));
        }

        if self.ledger.has_open_trade(&trade_id).await {
            return Err(PolymixError::Validation(format!(
                "market already traded: {}",
                trade_id
            )));
        }

        let cost = candidate.total_cost();
        let verdict = self.ledger.check_risk(&self.risk, cost).await;
        if !verdict.allowed {
            return Err(PolymixError::RiskRejected(
                verdict.reason.unwrap_or_else(|| "risk check failed".to_string()),
            ));
        }

        info!(
            %trade_id,
            %cost,
            roi = %roi,
            "placing hedged pair"
        );

        let first_client = self.client(first.platform)?;
        let second_client = self.client(second.platform)?;

        let first_ack = match first_client
            .place_order(&first.market_id, &first.side, first.quantity, first.price)
            .await
        {
            Ok(ack) => ack,
            Err(err) => {
                error!(%trade_id, platform = %first.platform, %err, "first leg failed");
                self.ledger
                    .record_error(
                        Some(&trade_id),
                        format!("{} leg failed: {}", first.platform, err),
                    )
                    .await;
                return Err(err);
            }
        };
        info!(
            %trade_id,
            platform = %first.platform,
            order_id = %first_ack.order_id,
            "first leg placed"
        );

        let second_ack = match second_client
            .place_order(&second.market_id, &second.side, second.quantity, second.price)
            .await
        {
            Ok(ack) => ack,
            Err(err) => {
                error!(
                    %trade_id,
                    platform = %second.platform,
                    %err,
                    "second leg failed, unwinding first"
                );
                let cancel_note = match first_client.cancel_order(&first_ack.order_id).await {
                    Ok(true) => {
                        info!(%trade_id, order_id = %first_ack.order_id, "first leg cancelled");
                        format!("{} leg cancelled", first.platform)
                    }
                    Ok(false) => {
                        warn!(
                            %trade_id,
                            order_id = %first_ack.order_id,
                            "first leg cancel not confirmed; position may be naked"
                        );
                        format!(
                            "{} leg cancel not confirmed; position may be naked",
                            first.platform
                        )
                    }
                    Err(cancel_err) => {
                        warn!(
                            %trade_id,
                            order_id = %first_ack.order_id,
                            %cancel_err,
                            "first leg cancel failed; position may be naked"
                        );
                        format!(
                            "{} leg cancel failed ({}); position may be naked",
                            first.platform, cancel_err
                        )
                    }
                };
                self.ledger
                    .record_error(
                        Some(&trade_id),
                        format!("{} leg failed ({}); {}", second.platform, err, cancel_note),
                    )
                    .await;
                return Err(err);
            }
        };
        info!(
            %trade_id,
            platform = %second.platform,
            order_id = %second_ack.order_id,
            "second leg placed"
        );

        let trade = Self::build_trade(
            candidate,
            &trade_id,
            [&first_ack.order_id, &second_ack.order_id],
        );
        self.ledger.commit_trade(trade.clone()).await?;
        Ok(trade)
    }

    fn build_trade(candidate: &TradeCandidate, trade_id: &str, order_ids: [&str; 2]) -> Trade {
        let legs: Vec<Leg> = candidate
            .legs
            .iter()
            .zip(order_ids)
            .map(|(leg, order_id)| Leg {
                platform: leg.platform,
                market_id: leg.market_id.clone(),
                side: leg.side.clone(),
                label: leg.label.clone(),
                quantity: leg.quantity,
                price: leg.price,
                order_id: Some(order_id.to_string()),
                resolved: false,
                winning: false,
            })
            .collect();

        let order_map = candidate
            .legs
            .iter()
            .zip(order_ids)
            .map(|(leg, order_id)| (leg.platform, order_id.to_string()))
            .collect();

        Trade {
            id: trade_id.to_string(),
            title: candidate.title.clone(),
            category: candidate.category.clone(),
            created_at: chrono::Utc::now(),
            status: TradeStatus::Pending,
            legs,
            cost: candidate.total_cost(),
            expected_profit: candidate.expected_profit(),
            roi_percent: candidate.roi_percent(),
            realized_profit: None,
            settled_amount: None,
            order_ids: order_map,
        }
    }
}
