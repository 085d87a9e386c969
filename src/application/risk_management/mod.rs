pub mod commands;
pub mod risk_manager;
pub mod risk_service;

pub use commands::RiskCommand;
pub use risk_manager::{EvaluationVerdict, RiskManager, RiskStatus};
pub use risk_service::{RiskService, RiskServiceHandle};
