use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Drawdown bands, each a third of the configured ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DrawdownBand {
    Normal,
    Caution,
    Reduced,
    Ceiling,
}

/// Step schedule shared by Position Sizing and Leverage Control.
///
/// | band    | drawdown             | size  | leverage |
/// |---------|----------------------|-------|----------|
/// | Normal  | < max/3              | 1.00  | 1.0      |
/// | Caution | [max/3, 2max/3)      | 0.67  | 0.7      |
/// | Reduced | [2max/3, max)        | 0.33  | 0.5      |
/// | Ceiling | >= max               | 0     | 0.5      |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawdownSchedule {
    max_drawdown_pct: Decimal,
}

impl DrawdownSchedule {
    pub fn new(max_drawdown_pct: Decimal) -> Self {
        Self { max_drawdown_pct }
    }

    pub fn max_drawdown_pct(&self) -> Decimal {
        self.max_drawdown_pct
    }

    pub fn band(&self, drawdown_pct: Decimal) -> DrawdownBand {
        let max = self.max_drawdown_pct;
        if drawdown_pct >= max {
            DrawdownBand::Ceiling
        } else if drawdown_pct >= max * dec!(2) / dec!(3) {
            DrawdownBand::Reduced
        } else if drawdown_pct >= max / dec!(3) {
            DrawdownBand::Caution
        } else {
            DrawdownBand::Normal
        }
    }

    pub fn size_multiplier(&self, drawdown_pct: Decimal) -> Decimal {
        match self.band(drawdown_pct) {
            DrawdownBand::Normal => Decimal::ONE,
            DrawdownBand::Caution => dec!(0.67),
            DrawdownBand::Reduced => dec!(0.33),
            DrawdownBand::Ceiling => Decimal::ZERO,
        }
    }

    pub fn leverage_multiplier(&self, drawdown_pct: Decimal) -> Decimal {
        match self.band(drawdown_pct) {
            DrawdownBand::Normal => Decimal::ONE,
            DrawdownBand::Caution => dec!(0.7),
            DrawdownBand::Reduced | DrawdownBand::Ceiling => dec!(0.5),
        }
    }
}
