//! Risk pipeline configuration parsing from environment variables.
//!
//! Covers position sizing, leverage, stops, daily loss, drawdown,
//! correlation groups, volatility, liquidity, rate limiting, the circuit
//! breaker and the capital floor.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::env;
use std::str::FromStr;

use crate::domain::risk::risk_config::{
    CapitalPreservationConfig, CircuitBreakerConfig, CorrelationConfig, DailyLossConfig,
    DrawdownConfig, LeverageConfig, LiquidityConfig, PositionSizingConfig, RateLimitConfig,
    RiskConfig, StopLossConfig, VolatilityConfig,
};

const DEFAULT_CORRELATION_GROUPS: &str = "BTC:WBTC:BTCB,ETH:WETH:STETH";

/// Risk environment configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RiskEnvConfig {
    pub initial_capital: Decimal,

    // Position Sizing
    pub position_size_pct: Decimal,
    pub min_position_size: Decimal,
    pub max_position_size: Decimal,
    pub early_drawdown_cutoff: bool,

    // Leverage & Stops
    pub max_leverage: Decimal,
    pub min_leverage: Decimal,
    pub stop_loss_pct: Decimal,
    pub max_stop_distance_pct: Decimal,

    // Loss Limits
    pub max_daily_loss_pct: Decimal,
    pub trading_day_utc_offset_minutes: i32,
    pub max_drawdown_pct: Decimal,

    // Correlation
    pub max_open_positions: usize,
    pub max_correlated_positions: usize,
    pub correlation_groups: Vec<Vec<String>>,

    // Volatility
    pub volatility_lookback_periods: usize,
    pub volatility_recent_periods: usize,
    pub volatility_high_ratio: f64,
    pub volatility_extreme_ratio: f64,
    pub volatility_high_size_factor: Decimal,
    pub volatility_extreme_size_factor: Decimal,

    // Liquidity
    pub min_liquidity_depth: Decimal,
    pub max_depth_consumption_pct: Decimal,
    pub order_book_levels: usize,

    // Rate Limit
    pub rate_limit_window_seconds: u64,
    pub max_trades_per_window: usize,

    // Circuit Breaker
    pub enable_circuit_breaker: bool,
    pub consecutive_losses_threshold: u32,
    pub flash_crash_threshold_pct: Decimal,
    pub halt_duration_hours: u64,

    pub capital_floor_pct: Decimal,
}

/// Looks keys up under an optional account prefix, falling back to the bare
/// key when the prefixed one is unset.
struct EnvSource<'a> {
    prefix: &'a str,
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl EnvSource<'_> {
    fn raw(&self, key: &str) -> Option<(String, String)> {
        if !self.prefix.is_empty() {
            let prefixed = format!("{}{}", self.prefix, key);
            if let Some(value) = (self.lookup)(&prefixed) {
                return Some((prefixed, value));
            }
        }
        (self.lookup)(key).map(|value| (key.to_string(), value))
    }

    fn parse<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match self.raw(key) {
            Some((name, value)) => value
                .trim()
                .parse::<T>()
                .with_context(|| format!("Failed to parse {} = {:?}", name, value)),
            None => Ok(default),
        }
    }

    fn parse_bool(&self, key: &str, default: bool) -> Result<bool> {
        match self.raw(key) {
            Some((name, value)) => match value.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" => Ok(false),
                other => {
                    anyhow::bail!("Failed to parse {} = {:?}: expected a boolean", name, other)
                }
            },
            None => Ok(default),
        }
    }

    fn parse_groups(&self, key: &str, default: &str) -> Result<Vec<Vec<String>>> {
        let (name, value) = self
            .raw(key)
            .unwrap_or_else(|| (key.to_string(), default.to_string()));
        parse_correlation_groups(&value).with_context(|| format!("Failed to parse {}", name))
    }
}

/// Parses `"BTC:WBTC:BTCB,ETH:WETH"` into symbol groups.
fn parse_correlation_groups(value: &str) -> Result<Vec<Vec<String>>> {
    let mut groups = Vec::new();
    for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let members: Vec<String> = entry
            .split(':')
            .map(|symbol| symbol.trim().to_uppercase())
            .collect();
        if members.iter().any(String::is_empty) {
            anyhow::bail!("empty symbol in correlation group {:?}", entry);
        }
        groups.push(members);
    }
    Ok(groups)
}

impl RiskEnvConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_env_with_prefix("")
    }

    /// Reads a per-account profile: `FUTURES_MAX_LEVERAGE` wins over
    /// `MAX_LEVERAGE` when the prefix is `"FUTURES_"`.
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self> {
        Self::from_lookup(prefix, |key| env::var(key).ok())
    }

    /// Same as `from_env_with_prefix` over an arbitrary key source.
    pub fn from_lookup(prefix: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let source = EnvSource {
            prefix,
            lookup: &lookup,
        };

        Ok(Self {
            initial_capital: source.parse("INITIAL_CAPITAL", dec!(100))?,
            position_size_pct: source.parse("POSITION_SIZE_PCT", dec!(0.10))?,
            min_position_size: source.parse("MIN_POSITION_SIZE", dec!(1))?,
            max_position_size: source.parse("MAX_POSITION_SIZE", dec!(1000))?,
            early_drawdown_cutoff: source.parse_bool("EARLY_DRAWDOWN_CUTOFF", false)?,
            max_leverage: source.parse("MAX_LEVERAGE", dec!(10))?,
            min_leverage: source.parse("MIN_LEVERAGE", dec!(1))?,
            stop_loss_pct: source.parse("STOP_LOSS_PCT", dec!(0.02))?,
            max_stop_distance_pct: source.parse("MAX_STOP_DISTANCE_PCT", dec!(0.10))?,
            max_daily_loss_pct: source.parse("MAX_DAILY_LOSS_PCT", dec!(0.05))?,
            trading_day_utc_offset_minutes: source.parse("TRADING_DAY_UTC_OFFSET_MINUTES", 0)?,
            max_drawdown_pct: source.parse("MAX_DRAWDOWN_PCT", dec!(0.15))?,
            max_open_positions: source.parse("MAX_OPEN_POSITIONS", 5)?,
            max_correlated_positions: source.parse("MAX_CORRELATED_POSITIONS", 2)?,
            correlation_groups: source
                .parse_groups("CORRELATION_GROUPS", DEFAULT_CORRELATION_GROUPS)?,
            volatility_lookback_periods: source.parse("VOLATILITY_LOOKBACK_PERIODS", 20)?,
            volatility_recent_periods: source.parse("VOLATILITY_RECENT_PERIODS", 5)?,
            volatility_high_ratio: source.parse("VOLATILITY_HIGH_RATIO", 1.5)?,
            volatility_extreme_ratio: source.parse("VOLATILITY_EXTREME_RATIO", 2.5)?,
            volatility_high_size_factor: source.parse("VOLATILITY_HIGH_SIZE_FACTOR", dec!(0.5))?,
            volatility_extreme_size_factor: source
                .parse("VOLATILITY_EXTREME_SIZE_FACTOR", dec!(0.25))?,
            min_liquidity_depth: source.parse("MIN_LIQUIDITY_DEPTH", dec!(10000))?,
            max_depth_consumption_pct: source.parse("MAX_DEPTH_CONSUMPTION_PCT", dec!(0.10))?,
            order_book_levels: source.parse("ORDER_BOOK_LEVELS", 10)?,
            rate_limit_window_seconds: source.parse("RATE_LIMIT_WINDOW_SECONDS", 60)?,
            max_trades_per_window: source.parse("MAX_TRADES_PER_WINDOW", 10)?,
            enable_circuit_breaker: source.parse_bool("ENABLE_CIRCUIT_BREAKER", true)?,
            consecutive_losses_threshold: source.parse("CONSECUTIVE_LOSSES_THRESHOLD", 5)?,
            flash_crash_threshold_pct: source.parse("FLASH_CRASH_THRESHOLD_PCT", dec!(0.10))?,
            halt_duration_hours: source.parse("HALT_DURATION_HOURS", 48)?,
            capital_floor_pct: source.parse("CAPITAL_FLOOR_PCT", dec!(0.10))?,
        })
    }

    /// Builds the domain config and validates it.
    pub fn into_risk_config(self) -> Result<RiskConfig> {
        let config = RiskConfig {
            initial_capital: self.initial_capital,
            position_sizing: PositionSizingConfig {
                position_size_pct: self.position_size_pct,
                min_position_size: self.min_position_size,
                max_position_size: self.max_position_size,
                early_drawdown_cutoff: self.early_drawdown_cutoff,
            },
            leverage: LeverageConfig {
                max_leverage: self.max_leverage,
                min_leverage: self.min_leverage,
            },
            stop_loss: StopLossConfig {
                stop_loss_pct: self.stop_loss_pct,
                max_stop_distance_pct: self.max_stop_distance_pct,
            },
            daily_loss: DailyLossConfig {
                max_daily_loss_pct: self.max_daily_loss_pct,
                utc_offset_minutes: self.trading_day_utc_offset_minutes,
            },
            drawdown: DrawdownConfig {
                max_drawdown_pct: self.max_drawdown_pct,
            },
            correlation: CorrelationConfig {
                max_open_positions: self.max_open_positions,
                max_correlated_positions: self.max_correlated_positions,
                groups: self.correlation_groups,
            },
            volatility: VolatilityConfig {
                lookback_periods: self.volatility_lookback_periods,
                recent_periods: self.volatility_recent_periods,
                high_ratio: self.volatility_high_ratio,
                extreme_ratio: self.volatility_extreme_ratio,
                high_size_factor: self.volatility_high_size_factor,
                extreme_size_factor: self.volatility_extreme_size_factor,
            },
            liquidity: LiquidityConfig {
                min_depth: self.min_liquidity_depth,
                max_depth_consumption_pct: self.max_depth_consumption_pct,
                levels: self.order_book_levels,
            },
            rate_limit: RateLimitConfig {
                window_seconds: self.rate_limit_window_seconds,
                max_trades_per_window: self.max_trades_per_window,
            },
            circuit_breaker: CircuitBreakerConfig {
                enabled: self.enable_circuit_breaker,
                consecutive_losses_threshold: self.consecutive_losses_threshold,
                flash_crash_threshold_pct: self.flash_crash_threshold_pct,
                halt_duration_hours: self.halt_duration_hours,
            },
            capital_preservation: CapitalPreservationConfig {
                capital_floor_pct: self.capital_floor_pct,
            },
        };
        config.validate().context("Invalid risk configuration")?;
        Ok(config)
    }
}
