use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// One point on the equity curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub value: Decimal,
}

/// Point-in-time performance summary.
#[derive(Debug, Clone, Serialize, Default)]
pub struct PerformanceSummary {
    pub initial_equity: Decimal,
    pub final_equity: Decimal,
    /// Net return as a fraction of initial equity.
    pub total_return: f64,
    /// Largest peak-to-trough equity decline, as a fraction of the peak.
    pub max_drawdown: f64,
    /// Fraction of closed trades with positive pnl.
    pub win_rate: f64,
    pub trade_count: u32,
    pub total_pnl: Decimal,
}
