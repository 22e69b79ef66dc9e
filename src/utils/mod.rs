pub mod export;
pub mod metrics;
