pub mod kalshi;
pub mod polymarket;
pub mod traits;

pub use kalshi::KalshiClient;
pub use polymarket::PolymarketClient;
pub use traits::{
    ExchangeClient, FillRecord, MarketResolution, OrderAck, OrderStatusReport, ResolutionSource,
};
