use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct SizerSettings {
    /// Cap on position notional as a fraction of account equity.
    #[serde(default = "default_max_allocation")]
    pub max_allocation: f64,

    /// Smallest position worth opening, in quote currency. Risk-based sizes
    /// below this are raised to the floor rather than dropped.
    #[serde(default = "default_min_notional")]
    pub min_notional: Decimal,
}

fn default_max_allocation() -> f64 {
    0.10
}

fn default_min_notional() -> Decimal {
    Decimal::ONE_HUNDRED
}

impl Default for SizerSettings {
    fn default() -> Self {
        Self {
            max_allocation: default_max_allocation(),
            min_notional: default_min_notional(),
        }
    }
}
