pub mod metrics;
pub mod trade;

pub use metrics::*;
pub use trade::*;
