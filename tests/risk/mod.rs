mod common;

mod circuit_breaker;
mod config_loading;
mod daily_and_drawdown;
mod pipeline_scenarios;
mod properties;
mod service_integration;
