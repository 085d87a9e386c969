// Risk pipeline and the per-account service around it
pub mod risk_management;
