pub mod tracker;
pub mod types;

pub use tracker::PerformanceTracker;
pub use types::{EquityPoint, PerformanceSummary};
