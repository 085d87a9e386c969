// Risk management domain
pub mod drawdown;
pub mod events;
pub mod layers;
pub mod risk_config;
pub mod state;

pub use events::{NoopObserver, RiskEvent, RiskObserver};
pub use layers::{EvaluationContext, LayerVerdict, RiskLayer};
pub use risk_config::{RiskConfig, RiskConfigError};
