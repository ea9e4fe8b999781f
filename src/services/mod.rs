pub mod cache;
pub mod clock;
pub mod database;
pub mod metrics;
pub mod notifier;
pub mod period;
pub mod thresholds;
pub mod usage;
