// Risk pipeline layers, in evaluation order
pub mod layer_trait;

pub mod position_sizing;
pub mod leverage_control;
pub mod stop_loss;
pub mod daily_loss_limit;
pub mod maximum_drawdown;
pub mod correlation_risk;
pub mod volatility_adjustment;
pub mod liquidity_check;
pub mod rate_limit;
pub mod circuit_breaker;
pub mod capital_preservation;

pub use capital_preservation::CapitalPreservationLayer;
pub use circuit_breaker::CircuitBreakerLayer;
pub use correlation_risk::CorrelationRiskLayer;
pub use daily_loss_limit::DailyLossLimitLayer;
pub use layer_trait::{EvaluationContext, LayerVerdict, RiskLayer};
pub use leverage_control::LeverageControlLayer;
pub use liquidity_check::LiquidityCheckLayer;
pub use maximum_drawdown::MaximumDrawdownLayer;
pub use position_sizing::PositionSizingLayer;
pub use rate_limit::RateLimitLayer;
pub use stop_loss::StopLossLayer;
pub use volatility_adjustment::VolatilityAdjustmentLayer;
