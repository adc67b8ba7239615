//! Kalshi REST adapter (native Rust, no external SDK dependency).
//!
//! Kalshi prices trade in integer cents on the wire; this client converts
//! to and from the (0,1) decimal scale the rest of the system uses.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::Sha256;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::Platform;
use crate::error::{PolymixError, Result};
use crate::exchange::traits::{ExchangeClient, FillRecord, OrderAck, OrderStatusReport};

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct KalshiClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    api_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrderEnvelope {
    order: WireOrder,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct WireOrder {
    order_id: String,
    status: String,
    filled_count: u64,
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
    ticker: String,
    side: String,
    count: u64,
    price: Decimal,
    created_time: Option<chrono::DateTime<Utc>>,
}

impl KalshiClient {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        api_secret: Option<String>,
        call_timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .user_agent("polymix/0.1")
            .timeout(call_timeout)
            .build()
            .map_err(|e| {
                PolymixError::Internal(format!("failed to build Kalshi HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            api_secret,
        })
    }

    fn auth_headers(&self, method: &Method, path: &str, body: &str) -> Result<HeaderMap> {
        let key = self.api_key.as_ref().ok_or_else(|| {
            PolymixError::exchange(Platform::Kalshi, "access key is not configured")
        })?;
        let secret = self.api_secret.as_ref().ok_or_else(|| {
            PolymixError::exchange(Platform::Kalshi, "signing secret is not configured")
        })?;

        let timestamp = Utc::now().timestamp_millis().to_string();
        let sign_payload = format!("{}{}{}{}", timestamp, method.as_str(), path, body);

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| {
            PolymixError::exchange(Platform::Kalshi, format!("invalid signing secret: {}", e))
        })?;
        mac.update(sign_payload.as_bytes());
        let signature = BASE64_STANDARD.encode(mac.finalize().into_bytes());

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("kalshi-access-key"),
            HeaderValue::from_str(key).map_err(|e| {
                PolymixError::exchange(Platform::Kalshi, format!("invalid key header: {}", e))
            })?,
        );
        headers.insert(
            HeaderName::from_static("kalshi-access-signature"),
            HeaderValue::from_str(&signature).map_err(|e| {
                PolymixError::exchange(Platform::Kalshi, format!("invalid signature header: {}", e))
            })?,
        );
        headers.insert(
            HeaderName::from_static("kalshi-access-timestamp"),
            HeaderValue::from_str(&timestamp).map_err(|e| {
                PolymixError::exchange(Platform::Kalshi, format!("invalid timestamp header: {}", e))
            })?,
        );

        Ok(headers)
    }

    async fn request_json(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, String)]>,
        body: Option<Value>,
    ) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let body_text = body.as_ref().map(Value::to_string).unwrap_or_default();

        let headers = self.auth_headers(&method, path, &body_text)?;
        let mut req = self.http.request(method.clone(), &url).headers(headers);

        if let Some(query) = query {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.header(CONTENT_TYPE, "application/json").json(&body);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| PolymixError::exchange(Platform::Kalshi, e))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| PolymixError::exchange(Platform::Kalshi, e))?;

        if !status.is_success() {
            return Err(PolymixError::exchange(
                Platform::Kalshi,
                format!("{} {} failed: status={} body={}", method, path, status, text),
            ));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| {
            PolymixError::exchange(Platform::Kalshi, format!("invalid JSON response: {}", e))
        })
    }

    /// Convert a (0,1) decimal price to integer cents for the wire.
    fn to_cents(price: Decimal) -> Result<i64> {
        (price * Decimal::from(100))
            .round()
            .to_i64()
            .ok_or_else(|| {
                PolymixError::exchange(Platform::Kalshi, format!("price {} out of range", price))
            })
    }

    /// Kalshi buys trade on the yes/no axis; named outcomes are placed as
    /// "yes" on the outcome's own market.
    fn wire_side(side: &str) -> &'static str {
        if side.eq_ignore_ascii_case("no") {
            "no"
        } else {
            "yes"
        }
    }

    fn parse<T: serde::de::DeserializeOwned>(value: Value, context: &str) -> Result<T> {
        serde_json::from_value(value).map_err(|e| {
            PolymixError::exchange(
                Platform::Kalshi,
                format!("unexpected {} payload: {}", context, e),
            )
        })
    }
}

#[async_trait]
impl ExchangeClient for KalshiClient {
    fn platform(&self) -> Platform {
        Platform::Kalshi
    }

    async fn place_order(
        &self,
        market_id: &str,
        side: &str,
        quantity: u64,
        price: Decimal,
    ) -> Result<OrderAck> {
        let payload = json!({
            "ticker": market_id,
            "client_order_id": Uuid::new_v4().to_string(),
            "action": "buy",
            "side": Self::wire_side(side),
            "count": quantity,
            "price": Self::to_cents(price)?,
            "type": "limit",
        });

        let raw = self
            .request_json(Method::POST, "/orders", None, Some(payload))
            .await?;
        let envelope: OrderEnvelope = Self::parse(raw, "order")?;

        Ok(OrderAck {
            order_id: envelope.order.order_id,
            status: envelope.order.status,
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
        let envelope: OrderEnvelope = Self::parse(raw, "order")?;

        Ok(OrderStatusReport {
            state: envelope.order.status,
            filled_quantity: envelope.order.filled_count,
        })
    }

    async fn get_fills(&self, market_id: Option<&str>, limit: u32) -> Result<Vec<FillRecord>> {
        let mut query: Vec<(&str, String)> = vec![("limit", limit.to_string())];
        if let Some(ticker) = market_id {
            query.push(("ticker", ticker.to_string()));
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
                market_id: fill.ticker,
                side: fill.side,
                quantity: fill.count,
                // fills report cents like everything else on this API
                price: fill.price / Decimal::from(100),
                timestamp: fill.created_time,
            })
            .collect())
    }
}
