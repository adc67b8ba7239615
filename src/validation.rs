//! Input validation for candidate trades.
//!
//! Candidates arrive from external market-data sources that are inconsistent
//! about field naming and occasionally carry junk prices; everything here
//! runs before any network effect.

use rust_decimal::Decimal;

use crate::domain::Platform;
use crate::error::{PolymixError, Result};

/// Validate a binary-outcome price: strictly between 0 and 1, exclusive.
pub fn validate_price(price: Decimal, field_name: &str) -> Result<()> {
    if price <= Decimal::ZERO || price >= Decimal::ONE {
        return Err(PolymixError::Validation(format!(
            "{} must be strictly between 0 and 1, got {}",
            field_name, price
        )));
    }
    Ok(())
}

/// Validate a leg quantity.
pub fn validate_quantity(quantity: u64, field_name: &str) -> Result<()> {
    if quantity == 0 {
        return Err(PolymixError::Validation(format!(
            "{} must be greater than zero",
            field_name
        )));
    }
    Ok(())
}

/// Resolve a market identifier from an ordered list of candidate fields.
///
/// Upstream feeds disagree on field names (a platform-specific primary field
/// and a secondary/alternate name), so resolution is an explicit ordered
/// fallback: the first non-empty candidate wins. When none exist the error
/// names the platform and leg so the failure is actionable.
pub fn resolve_market_id(
    candidates: &[Option<&str>],
    platform: Platform,
    leg_name: &str,
) -> Result<String> {
    candidates
        .iter()
        .flatten()
        .map(|id| id.trim())
        .find(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            PolymixError::Validation(format!(
                "missing market id for {} ({} leg)",
                platform, leg_name
            ))
        })
}
