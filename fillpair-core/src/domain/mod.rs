//! Domain types for fillpair

pub mod fill;
pub mod ids;
pub mod market;
pub mod position;

pub use fill::{Fill, Side};
pub use ids::{OrderId, TradeId};
pub use market::{FeeAsset, Market, MarketError};
pub use position::{Position, PositionStatus};
