use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Error type for risk configuration validation
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RiskConfigError {
    #[error("Invalid RiskConfig: {field} = {value} (expected {expected})")]
    InvalidThreshold {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("Invalid RiskConfig: correlation group {group:?} {problem}")]
    InvalidCorrelationGroup { group: String, problem: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionSizingConfig {
    /// Fraction of available balance committed per trade.
    pub position_size_pct: Decimal,
    pub min_position_size: Decimal,
    pub max_position_size: Decimal,
    /// Reject at the drawdown ceiling here instead of deferring to Maximum Drawdown.
    pub early_drawdown_cutoff: bool,
}

impl Default for PositionSizingConfig {
    fn default() -> Self {
        Self {
            position_size_pct: dec!(0.10),
            min_position_size: dec!(1),
            max_position_size: dec!(1000),
            early_drawdown_cutoff: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeverageConfig {
    pub max_leverage: Decimal,
    pub min_leverage: Decimal,
}

impl Default for LeverageConfig {
    fn default() -> Self {
        Self {
            max_leverage: dec!(10),
            min_leverage: dec!(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StopLossConfig {
    pub stop_loss_pct: Decimal,
    /// Widest stop distance any layer may set.
    pub max_stop_distance_pct: Decimal,
}

impl Default for StopLossConfig {
    fn default() -> Self {
        Self {
            stop_loss_pct: dec!(0.02),
            max_stop_distance_pct: dec!(0.10),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyLossConfig {
    /// Fraction of initial capital.
    pub max_daily_loss_pct: Decimal,
    /// Fixed offset from UTC that defines the trading day.
    pub utc_offset_minutes: i32,
}

impl Default for DailyLossConfig {
    fn default() -> Self {
        Self {
            max_daily_loss_pct: dec!(0.05),
            utc_offset_minutes: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawdownConfig {
    pub max_drawdown_pct: Decimal,
}

impl Default for DrawdownConfig {
    fn default() -> Self {
        Self {
            max_drawdown_pct: dec!(0.15),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationConfig {
    pub max_open_positions: usize,
    pub max_correlated_positions: usize,
    /// Base assets that move together, e.g. `["BTC", "WBTC", "BTCB"]`.
    pub groups: Vec<Vec<String>>,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            max_open_positions: 5,
            max_correlated_positions: 2,
            groups: vec![
                vec!["BTC".into(), "WBTC".into(), "BTCB".into()],
                vec!["ETH".into(), "WETH".into(), "STETH".into()],
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VolatilityConfig {
    pub lookback_periods: usize,
    pub recent_periods: usize,
    pub high_ratio: f64,
    pub extreme_ratio: f64,
    pub high_size_factor: Decimal,
    pub extreme_size_factor: Decimal,
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        Self {
            lookback_periods: 20,
            recent_periods: 5,
            high_ratio: 1.5,
            extreme_ratio: 2.5,
            high_size_factor: dec!(0.5),
            extreme_size_factor: dec!(0.25),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiquidityConfig {
    pub min_depth: Decimal,
    /// Largest share of visible depth one trade may consume.
    pub max_depth_consumption_pct: Decimal,
    pub levels: usize,
}

impl Default for LiquidityConfig {
    fn default() -> Self {
        Self {
            min_depth: dec!(10000),
            max_depth_consumption_pct: dec!(0.10),
            levels: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitConfig {
    pub window_seconds: u64,
    pub max_trades_per_window: usize,
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::seconds(self.window_seconds as i64)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_seconds: 60,
            max_trades_per_window: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CircuitBreakerConfig {
    pub enabled: bool,
    pub consecutive_losses_threshold: u32,
    pub flash_crash_threshold_pct: Decimal,
    /// Zero halts until an operator clears it.
    pub halt_duration_hours: u64,
}

impl CircuitBreakerConfig {
    /// `None` for an indefinite halt.
    pub fn halt_duration(&self) -> Option<Duration> {
        if self.halt_duration_hours == 0 {
            None
        } else {
            Some(Duration::hours(self.halt_duration_hours as i64))
        }
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            consecutive_losses_threshold: 5,
            flash_crash_threshold_pct: dec!(0.10),
            halt_duration_hours: 48,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CapitalPreservationConfig {
    /// Fraction of initial capital below which nothing trades.
    pub capital_floor_pct: Decimal,
}

impl Default for CapitalPreservationConfig {
    fn default() -> Self {
        Self {
            capital_floor_pct: dec!(0.10),
        }
    }
}

/// Thresholds for every layer of one account's pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskConfig {
    /// Reference capital for the daily loss limit and the capital floor.
    pub initial_capital: Decimal,
    pub position_sizing: PositionSizingConfig,
    pub leverage: LeverageConfig,
    pub stop_loss: StopLossConfig,
    pub daily_loss: DailyLossConfig,
    pub drawdown: DrawdownConfig,
    pub correlation: CorrelationConfig,
    pub volatility: VolatilityConfig,
    pub liquidity: LiquidityConfig,
    pub rate_limit: RateLimitConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub capital_preservation: CapitalPreservationConfig,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            initial_capital: dec!(100),
            position_sizing: PositionSizingConfig::default(),
            leverage: LeverageConfig::default(),
            stop_loss: StopLossConfig::default(),
            daily_loss: DailyLossConfig::default(),
            drawdown: DrawdownConfig::default(),
            correlation: CorrelationConfig::default(),
            volatility: VolatilityConfig::default(),
            liquidity: LiquidityConfig::default(),
            rate_limit: RateLimitConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            capital_preservation: CapitalPreservationConfig::default(),
        }
    }
}

fn ensure(
    ok: bool,
    field: &'static str,
    value: impl ToString,
    expected: &'static str,
) -> Result<(), RiskConfigError> {
    if ok {
        Ok(())
    } else {
        Err(RiskConfigError::InvalidThreshold {
            field,
            value: value.to_string(),
            expected,
        })
    }
}

fn is_fraction(value: Decimal) -> bool {
    value > Decimal::ZERO && value <= Decimal::ONE
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), RiskConfigError> {
        ensure(
            self.initial_capital > Decimal::ZERO,
            "initial_capital",
            self.initial_capital,
            "> 0",
        )?;

        let sizing = &self.position_sizing;
        ensure(
            is_fraction(sizing.position_size_pct),
            "position_size_pct",
            sizing.position_size_pct,
            "within (0, 1]",
        )?;
        ensure(
            sizing.min_position_size >= Decimal::ZERO,
            "min_position_size",
            sizing.min_position_size,
            ">= 0",
        )?;
        ensure(
            sizing.max_position_size >= sizing.min_position_size,
            "max_position_size",
            sizing.max_position_size,
            ">= min_position_size",
        )?;

        let leverage = &self.leverage;
        ensure(
            leverage.min_leverage >= Decimal::ONE,
            "min_leverage",
            leverage.min_leverage,
            ">= 1",
        )?;
        ensure(
            leverage.max_leverage >= leverage.min_leverage,
            "max_leverage",
            leverage.max_leverage,
            ">= min_leverage",
        )?;

        ensure(
            self.stop_loss.stop_loss_pct > Decimal::ZERO
                && self.stop_loss.stop_loss_pct < Decimal::ONE,
            "stop_loss_pct",
            self.stop_loss.stop_loss_pct,
            "within (0, 1)",
        )?;
        ensure(
            self.stop_loss.max_stop_distance_pct >= self.stop_loss.stop_loss_pct
                && self.stop_loss.max_stop_distance_pct < Decimal::ONE,
            "max_stop_distance_pct",
            self.stop_loss.max_stop_distance_pct,
            "within [stop_loss_pct, 1)",
        )?;

        ensure(
            is_fraction(self.daily_loss.max_daily_loss_pct),
            "max_daily_loss_pct",
            self.daily_loss.max_daily_loss_pct,
            "within (0, 1]",
        )?;
        ensure(
            self.daily_loss.utc_offset_minutes.abs() < 24 * 60,
            "utc_offset_minutes",
            self.daily_loss.utc_offset_minutes,
            "strictly within one day of UTC",
        )?;

        ensure(
            self.drawdown.max_drawdown_pct > Decimal::ZERO
                && self.drawdown.max_drawdown_pct < Decimal::ONE,
            "max_drawdown_pct",
            self.drawdown.max_drawdown_pct,
            "within (0, 1)",
        )?;

        let correlation = &self.correlation;
        ensure(
            correlation.max_open_positions > 0,
            "max_open_positions",
            correlation.max_open_positions,
            "> 0",
        )?;
        ensure(
            correlation.max_correlated_positions > 0,
            "max_correlated_positions",
            correlation.max_correlated_positions,
            "> 0",
        )?;
        for group in &correlation.groups {
            if group.len() < 2 {
                return Err(RiskConfigError::InvalidCorrelationGroup {
                    group: group.join(":"),
                    problem: "needs at least two assets",
                });
            }
            if group.iter().any(|asset| asset.trim().is_empty()) {
                return Err(RiskConfigError::InvalidCorrelationGroup {
                    group: group.join(":"),
                    problem: "contains an empty asset",
                });
            }
        }

        let volatility = &self.volatility;
        ensure(
            volatility.recent_periods >= 2,
            "volatility_recent_periods",
            volatility.recent_periods,
            ">= 2",
        )?;
        ensure(
            volatility.lookback_periods > volatility.recent_periods,
            "volatility_lookback_periods",
            volatility.lookback_periods,
            "> volatility_recent_periods",
        )?;
        ensure(
            volatility.high_ratio.is_finite() && volatility.high_ratio > 1.0,
            "volatility_high_ratio",
            volatility.high_ratio,
            "> 1",
        )?;
        ensure(
            volatility.extreme_ratio.is_finite()
                && volatility.extreme_ratio > volatility.high_ratio,
            "volatility_extreme_ratio",
            volatility.extreme_ratio,
            "> volatility_high_ratio",
        )?;
        ensure(
            is_fraction(volatility.high_size_factor),
            "volatility_high_size_factor",
            volatility.high_size_factor,
            "within (0, 1]",
        )?;
        ensure(
            is_fraction(volatility.extreme_size_factor)
                && volatility.extreme_size_factor <= volatility.high_size_factor,
            "volatility_extreme_size_factor",
            volatility.extreme_size_factor,
            "within (0, volatility_high_size_factor]",
        )?;

        let liquidity = &self.liquidity;
        ensure(
            liquidity.min_depth >= Decimal::ZERO,
            "min_liquidity_depth",
            liquidity.min_depth,
            ">= 0",
        )?;
        ensure(
            is_fraction(liquidity.max_depth_consumption_pct),
            "max_depth_consumption_pct",
            liquidity.max_depth_consumption_pct,
            "within (0, 1]",
        )?;
        ensure(
            liquidity.levels > 0,
            "order_book_levels",
            liquidity.levels,
            "> 0",
        )?;

        ensure(
            self.rate_limit.window_seconds > 0,
            "rate_limit_window_seconds",
            self.rate_limit.window_seconds,
            "> 0",
        )?;
        ensure(
            self.rate_limit.max_trades_per_window > 0,
            "max_trades_per_window",
            self.rate_limit.max_trades_per_window,
            "> 0",
        )?;

        let breaker = &self.circuit_breaker;
        ensure(
            breaker.consecutive_losses_threshold > 0,
            "consecutive_losses_threshold",
            breaker.consecutive_losses_threshold,
            "> 0",
        )?;
        ensure(
            breaker.flash_crash_threshold_pct > Decimal::ZERO
                && breaker.flash_crash_threshold_pct < Decimal::ONE,
            "flash_crash_threshold_pct",
            breaker.flash_crash_threshold_pct,
            "within (0, 1)",
        )?;

        ensure(
            is_fraction(self.capital_preservation.capital_floor_pct),
            "capital_floor_pct",
            self.capital_preservation.capital_floor_pct,
            "within (0, 1]",
        )?;

        Ok(())
    }
}
