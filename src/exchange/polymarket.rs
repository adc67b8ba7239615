//! Polymarket order adapter.
//!
//! Talks to the gamma order surface with a bearer token. Prices are already
//! on the (0,1) decimal scale so no conversion is needed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::domain::Platform;
use crate::error::{PolymixError, Result};
use crate::exchange::traits::{ExchangeClient, FillRecord, OrderAck, OrderStatusReport};

#[derive(Clone)]
pub struct PolymarketClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct WireOrder {
    id: String,
    status: String,
    filled: u64,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct FillsEnvelope {
    fills: Vec<WireFill>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct WireFill {
    order_id: String,
    market: String,
    side: String,
    amount: u64,
    price: Decimal,
    timestamp: Option<DateTime<Utc>>,
}

impl PolymarketClient {
    pub fn new(base_url: &str, api_key: Option<String>, call_timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent("polymix/0.1")
            .timeout(call_timeout)
            .build()
            .map_err(|e| {
                PolymixError::Internal(format!("failed to build Polymarket HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn request_json(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, String)]>,
        body: Option<Value>,
    ) -> Result<Value> {
        let key = self.api_key.as_ref().ok_or_else(|| {
            PolymixError::exchange(Platform::Polymarket, "API key is not configured")
        })?;

        let url = format!("{}{}", self.base_url, path);
        let mut req = self
            .http
            .request(method.clone(), &url)
            .bearer_auth(key)
            .header(reqwest::header::CONTENT_TYPE, "application/json");

        if let Some(query) = query {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| PolymixError::exchange(Platform::Polymarket, e))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| PolymixError::exchange(Platform::Polymarket, e))?;

        if !status.is_success() {
            return Err(PolymixError::exchange(
                Platform::Polymarket,
                format!("{} {} failed: status={} body={}", method, path, status, text),
            ));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| {
            PolymixError::exchange(Platform::Polymarket, format!("invalid JSON response: {}", e))
        })
    }

    fn parse<T: serde::de::DeserializeOwned>(value: Value, context: &str) -> Result<T> {
        serde_json::from_value(value).map_err(|e| {
            PolymixError::exchange(
                Platform::Polymarket,
                format!("unexpected {} payload: {}", context, e),
            )
        })
    }
}

#[async_trait]
impl ExchangeClient for PolymarketClient {
    fn platform(&self) -> Platform {
        Platform::Polymarket
    }

    async fn place_order(
        &self,
        market_id: &str,
        side: &str,
        quantity: u64,
        price: Decimal,
    ) -> Result<OrderAck> {
        let payload = json!({
            "market": market_id,
            "side": side,
            "amount": quantity,
            "price": price,
            "orderType": "limit",
        });

        let raw = self
            .request_json(Method::POST, "/orders", None, Some(payload))
            .await?;
        let order: WireOrder = Self::parse(raw, "order")?;

        Ok(OrderAck {
            order_id: order.id,
            status: order.status,
        })
    }

    async fn cancel_order(&self, order_id: &str) -> Result<bool> {
        self.request_json(Method::DELETE, &format!("/orders/{}", order_id), None, None)
            .await?;
        Ok(true)
    }

    async fn get_order_status(&self, order_id: &str) -> Result<OrderStatusReport> {
        let raw = self
            .request_json(Method::GET, &format!("/orders/{}", order_id), None, None)
            .await?;
        let order: WireOrder = Self::parse(raw, "order")?;

        Ok(OrderStatusReport {
            state: order.status,
            filled_quantity: order.filled,
        })
    }

    async fn get_fills(&self, market_id: Option<&str>, limit: u32) -> Result<Vec<FillRecord>> {
        let mut query: Vec<(&str, String)> = vec![("limit", limit.to_string())];
        if let Some(market) = market_id {
            query.push(("market", market.to_string()));
        }

        let raw = self
            .request_json(Method::GET, "/fills", Some(&query), None)
            .await?;
        let envelope: FillsEnvelope = Self::parse(raw, "fills")?;

        Ok(envelope
            .fills
            .into_iter()
            .map(|fill| FillRecord {
                order_id: fill.order_id,
                market_id: fill.market,
                side: fill.side,
                quantity: fill.amount,
                price: fill.price,
                timestamp: fill.timestamp,
            })
            .collect())
    }
}
