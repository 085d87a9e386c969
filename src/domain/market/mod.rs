// Market inputs pre-fetched by the execution engine
pub mod order_book;
pub mod volatility_series;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use order_book::{BookLevel, OrderBookDepth};
pub use volatility_series::VolatilitySeries;

/// Per-symbol market inputs for one evaluation. Every field is optional;
/// layers that need a missing input pass the proposal through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketConditions {
    #[serde(default)]
    pub order_book: Option<OrderBookDepth>,
    #[serde(default)]
    pub volatility: Option<VolatilitySeries>,
    /// Recent traded prices, oldest first, for flash-crash detection.
    #[serde(default)]
    pub recent_prices: Vec<Decimal>,
}

impl MarketConditions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_order_book(mut self, book: OrderBookDepth) -> Self {
        self.order_book = Some(book);
        self
    }

    pub fn with_volatility(mut self, series: VolatilitySeries) -> Self {
        self.volatility = Some(series);
        self
    }

    pub fn with_recent_prices(mut self, prices: Vec<Decimal>) -> Self {
        self.recent_prices = prices;
        self
    }
}
