// Market inputs consumed by the risk layers
pub mod market;

// Risk management domain
pub mod risk;

// Core trading domain
pub mod trading;

// Domain-specific error types
pub mod errors;
