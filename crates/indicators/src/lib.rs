pub mod error;
pub mod supertrend;
pub mod types;

pub use error::{Error, Result};
pub use supertrend::{SuperTrend, TrendSignal};
pub use types::SuperTrendSettings;
