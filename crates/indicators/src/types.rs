use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct SuperTrendSettings {
    /// ATR lookback period.
    #[serde(default = "default_period")]
    pub period: u32,

    /// Distance of the candidate bands from the HL2 midpoint, in ATRs.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_period() -> u32 {
    10
}

fn default_multiplier() -> f64 {
    3.0
}

impl Default for SuperTrendSettings {
    fn default() -> Self {
        Self {
            period: default_period(),
            multiplier: default_multiplier(),
        }
    }
}
