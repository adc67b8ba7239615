//! File-backed feeds for the run loop.
//!
//! Opportunity detection lives outside this crate; the binary consumes its
//! output as plain JSON files. A candidate file holds an array of
//! [`TradeCandidate`], a resolution file holds a map of market id to
//! [`MarketResolution`]. Both are re-read on every poll so an external
//! process can update them in place.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::{CandidateLeg, Platform, TradeCandidate};
use crate::error::{PolymixError, Result};
use crate::exchange::{MarketResolution, ResolutionSource};
use crate::service::CandidateSource;
use crate::validation::resolve_market_id;

/// Raw feed leg. Sources disagree on the market id field name, so both
/// spellings are accepted and resolved by ordered fallback.
#[derive(Debug, Deserialize)]
struct RawLeg {
    platform: Platform,
    #[serde(default)]
    market_id: Option<String>,
    #[serde(default)]
    alt_market_id: Option<String>,
    side: String,
    label: String,
    /// Falls back to the configured per-leg bet amount when omitted
    #[serde(default)]
    quantity: Option<u64>,
    price: Decimal,
}

#[derive(Debug, Deserialize)]
struct RawCandidate {
    away_code: String,
    home_code: String,
    title: String,
    category: String,
    legs: [RawLeg; 2],
}

impl RawCandidate {
    fn into_candidate(self, default_quantity: u64) -> Result<TradeCandidate> {
        let [away, home] = self.legs;
        let legs = [
            Self::into_leg(away, "away", default_quantity)?,
            Self::into_leg(home, "home", default_quantity)?,
        ];
        Ok(TradeCandidate {
            away_code: self.away_code,
            home_code: self.home_code,
            title: self.title,
            category: self.category,
            legs,
        })
    }

    fn into_leg(raw: RawLeg, leg_name: &str, default_quantity: u64) -> Result<CandidateLeg> {
        let market_id = resolve_market_id(
            &[raw.market_id.as_deref(), raw.alt_market_id.as_deref()],
            raw.platform,
            leg_name,
        )?;
        Ok(CandidateLeg {
            platform: raw.platform,
            market_id,
            side: raw.side,
            label: raw.label,
            quantity: raw.quantity.unwrap_or(default_quantity),
            price: raw.price,
        })
    }
}

/// Candidate feed backed by a JSON array file. Each candidate id is emitted
/// once per process run; the ledger's duplicate guard covers restarts.
pub struct FileCandidateSource {
    path: PathBuf,
    default_quantity: u64,
    seen: Mutex<HashSet<String>>,
}

impl FileCandidateSource {
    pub fn new(path: impl AsRef<Path>, default_quantity: u64) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            default_quantity,
            seen: Mutex::new(HashSet::new()),
        }
    }
}

#[async_trait]
impl CandidateSource for FileCandidateSource {
    async fn poll(&self) -> Result<Vec<TradeCandidate>> {
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(Vec::new());
        }
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| PolymixError::Persistence(format!("read {:?}: {}", self.path, e)))?;
        let raw: Vec<RawCandidate> = serde_json::from_str(&content)
            .map_err(|e| PolymixError::Persistence(format!("parse {:?}: {}", self.path, e)))?;

        let mut seen = self.seen.lock().map_err(|_| {
            PolymixError::Internal("candidate feed lock poisoned".to_string())
        })?;
        let mut fresh = Vec::new();
        for raw in raw {
            match raw.into_candidate(self.default_quantity) {
                Ok(candidate) => {
                    if seen.insert(candidate.trade_id()) {
                        fresh.push(candidate);
                    }
                }
                // One malformed entry never blocks the rest of the feed.
                Err(err) => warn!(%err, "skipping malformed candidate"),
            }
        }
        if !fresh.is_empty() {
            debug!(count = fresh.len(), "new candidates from feed");
        }
        Ok(fresh)
    }
}

/// Resolution lookup backed by a JSON object file keyed by market id.
/// Markets absent from the file are reported as unresolved.
pub struct FileResolutionSource {
    path: PathBuf,
}

impl FileResolutionSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl ResolutionSource for FileResolutionSource {
    async fn resolve(&self, _platform: Platform, market_id: &str) -> Result<MarketResolution> {
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(MarketResolution::unresolved());
        }
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| PolymixError::Persistence(format!("read {:?}: {}", self.path, e)))?;
        let outcomes: HashMap<String, MarketResolution> = match serde_json::from_str(&content) {
            Ok(outcomes) => outcomes,
            Err(e) => {
                // A feed mid-rewrite should not fail the sweep.
                warn!(path = ?self.path, %e, "resolution feed unreadable, treating as unresolved");
                return Ok(MarketResolution::unresolved());
            }
        };
        Ok(outcomes
            .get(market_id)
            .cloned()
            .unwrap_or_else(MarketResolution::unresolved))
    }
}
