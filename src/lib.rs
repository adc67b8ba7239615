//! Cross-venue hedged pair execution.
//!
//! Takes candidate two-leg trades whose combined cost is below the $1
//! payout, gates them through pre-trade risk checks, places both legs on
//! their venues with a compensating cancel when the second leg fails, and
//! reconciles settlements against a persisted ledger.

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod exchange;
pub mod executor;
pub mod feed;
pub mod ledger;
pub mod risk;
pub mod service;
pub mod settlement;
pub mod validation;

pub use config::AppConfig;
pub use error::{PolymixError, Result};
