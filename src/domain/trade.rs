use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Trading venue for one leg of an arbitrage trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Kalshi,
    Polymarket,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kalshi => "kalshi",
            Self::Polymarket => "polymarket",
        }
    }

    /// The opposite venue; a valid two-leg trade always spans both.
    pub fn other(&self) -> Platform {
        match self {
            Self::Kalshi => Self::Polymarket,
            Self::Polymarket => Self::Kalshi,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = &'static str;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "kalshi" => Ok(Self::Kalshi),
            "polymarket" | "pm" => Ok(Self::Polymarket),
            _ => Err("invalid platform; expected kalshi|polymarket"),
        }
    }
}

/// Trade lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeStatus {
    /// Both legs placed, awaiting market resolution
    Pending,
    /// All legs resolved and the account credited
    Settled,
    /// Force-finalized after the settlement timeout with unresolved legs
    Incomplete,
    /// Terminal failure recorded against the trade
    Failed,
}

impl TradeStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TradeStatus::Settled | TradeStatus::Incomplete | TradeStatus::Failed
        )
    }
}

impl std::fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TradeStatus::Pending => "pending",
            TradeStatus::Settled => "settled",
            TradeStatus::Incomplete => "incomplete",
            TradeStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// One side of a two-leg trade, placed on one platform against one market
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leg {
    pub platform: Platform,
    /// Market/ticker identifier on the leg's platform
    pub market_id: String,
    /// Outcome code being bought (e.g. a team code)
    pub side: String,
    /// Display name for the outcome
    pub label: String,
    pub quantity: u64,
    /// Unit price on the (0,1) binary-outcome scale
    pub price: Decimal,
    /// External order id once the leg is placed
    #[serde(default)]
    pub order_id: Option<String>,
    /// Set by the reconciler once the market reports an outcome
    #[serde(default)]
    pub resolved: bool,
    #[serde(default)]
    pub winning: bool,
}

impl Leg {
    /// Dollar cost of this leg: quantity x unit price.
    pub fn cost(&self) -> Decimal {
        Decimal::from(self.quantity) * self.price
    }

    /// Payout if this leg wins: quantity x $1.
    pub fn payout(&self) -> Decimal {
        Decimal::from(self.quantity)
    }
}

/// A committed two-leg arbitrage trade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    /// Derived from the two participant codes as "{away}@{home}"
    pub id: String,
    /// Display name, e.g. "Bulls vs Lakers"
    pub title: String,
    /// Market category (sport)
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub status: TradeStatus,
    /// Exactly two legs, one per platform
    pub legs: Vec<Leg>,
    /// Exact total charged: sum of quantity x price over both legs
    pub cost: Decimal,
    /// Edge estimated at entry time
    pub expected_profit: Decimal,
    pub roi_percent: Decimal,
    /// Set at settlement: payout minus cost
    #[serde(default)]
    pub realized_profit: Option<Decimal>,
    /// Total payout credited at settlement
    #[serde(default)]
    pub settled_amount: Option<Decimal>,
    /// External order id per platform
    #[serde(default)]
    pub order_ids: HashMap<Platform, String>,
}

impl Trade {
    /// Age of the trade relative to `now`.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.created_at
    }

    pub fn is_pending(&self) -> bool {
        self.status == TradeStatus::Pending
    }
}

/// One leg of a candidate trade, before any order is placed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateLeg {
    pub platform: Platform,
    pub market_id: String,
    pub side: String,
    pub label: String,
    pub quantity: u64,
    pub price: Decimal,
}

impl CandidateLeg {
    pub fn cost(&self) -> Decimal {
        Decimal::from(self.quantity) * self.price
    }
}

/// A candidate two-leg trade handed in by opportunity detection.
///
/// Market ids are expected to already be resolved through the ordered
/// fallback chain (see [`crate::validation::resolve_market_id`]) because
/// upstream market-data sources are inconsistent about field naming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeCandidate {
    /// Away-side participant code
    pub away_code: String,
    /// Home-side participant code
    pub home_code: String,
    pub title: String,
    pub category: String,
    pub legs: [CandidateLeg; 2],
}

impl TradeCandidate {
    /// Trade identifier derived from the two participant codes.
    pub fn trade_id(&self) -> String {
        format!("{}@{}", self.away_code, self.home_code)
    }

    /// Exact total cost of this specific candidate: the per-leg sum of
    /// quantity x price, never a per-leg estimate multiplied by leg count.
    pub fn total_cost(&self) -> Decimal {
        self.legs.iter().map(|leg| leg.cost()).sum()
    }

    /// Payout if exactly one of the two mutually exclusive outcomes wins.
    pub fn payout_if_won(&self) -> Decimal {
        // Both legs carry the same quantity for a balanced arb; the winning
        // leg pays quantity x $1.
        self.legs
            .iter()
            .map(|leg| Decimal::from(leg.quantity))
            .max()
            .unwrap_or(Decimal::ZERO)
    }

    /// Guaranteed edge: payout minus cost.
    pub fn expected_profit(&self) -> Decimal {
        self.payout_if_won() - self.total_cost()
    }

    /// Return on investment as a percentage of cost.
    pub fn roi_percent(&self) -> Decimal {
        let cost = self.total_cost();
        if cost.is_zero() {
            return Decimal::ZERO;
        }
        self.expected_profit() / cost * Decimal::from(100)
    }
}
