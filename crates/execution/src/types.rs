use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Point-in-time view of the trading account, as pulled by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub cash: Decimal,
    pub position_quantity: Decimal,
    pub total_equity: Decimal,
}
