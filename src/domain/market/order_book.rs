use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::trading::types::TradeSide;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: Decimal,
    pub quantity: Decimal,
}

impl BookLevel {
    pub fn new(price: Decimal, quantity: Decimal) -> Self {
        Self { price, quantity }
    }

    pub fn notional(&self) -> Decimal {
        self.price * self.quantity
    }
}

/// Best levels per side, best first, pre-fetched by the execution engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBookDepth {
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

impl OrderBookDepth {
    pub fn new(bids: Vec<BookLevel>, asks: Vec<BookLevel>) -> Self {
        Self { bids, asks }
    }

    /// The side a new position of `side` trades against: longs lift asks,
    /// shorts hit bids.
    pub fn consumed_side(&self, side: TradeSide) -> &[BookLevel] {
        match side {
            TradeSide::Long => &self.asks,
            TradeSide::Short => &self.bids,
        }
    }

    /// Quote notional over the best `levels` of the side `side` consumes.
    pub fn notional_depth(&self, side: TradeSide, levels: usize) -> Decimal {
        self.consumed_side(side)
            .iter()
            .take(levels)
            .map(BookLevel::notional)
            .sum()
    }

    /// First level with a non-positive price or a negative quantity.
    pub fn find_invalid_level(&self) -> Option<&BookLevel> {
        self.bids
            .iter()
            .chain(self.asks.iter())
            .find(|level| level.price <= Decimal::ZERO || level.quantity < Decimal::ZERO)
    }
}
