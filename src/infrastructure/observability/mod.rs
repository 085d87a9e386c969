//! Risk event observers
//!
//! Everything here only consumes `RiskEvent`s: structured logs through
//! `tracing`, Prometheus counters, and an in-memory log for tests and
//! dashboards.

pub mod event_log;
pub mod fanout;
pub mod metrics;
pub mod tracing_observer;

pub use event_log::EventLog;
pub use fanout::FanoutObserver;
pub use metrics::RiskMetrics;
pub use tracing_observer::TracingObserver;
