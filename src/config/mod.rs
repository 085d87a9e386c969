//! Configuration loading from environment variables.
//!
//! Every risk threshold is read from the environment (optionally through a
//! per-account prefix) and converted into the domain `RiskConfig`, which
//! validates itself before any manager is built.

mod risk_env_config;

pub use risk_env_config::RiskEnvConfig;
