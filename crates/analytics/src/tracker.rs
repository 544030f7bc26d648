use crate::types::{EquityPoint, PerformanceSummary};
use chrono::{DateTime, Utc};
use core_types::TradeRecord;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;

/// Streaming performance observer.
///
/// Accumulates the equity curve, running peak and maximum drawdown from
/// per-bar equity snapshots, and win/loss statistics from closed trades. It
/// is strictly read-only with respect to trading: nothing here feeds back
/// into the controller.
#[derive(Debug)]
pub struct PerformanceTracker {
    initial_equity: Decimal,
    equity_curve: Vec<EquityPoint>,
    trades: Vec<TradeRecord>,
    peak_equity: Decimal,
    max_drawdown: Decimal,
    winning_trades: u32,
    losing_trades: u32,
    total_pnl: Decimal,
}

impl PerformanceTracker {
    pub fn new(initial_equity: Decimal) -> Self {
        Self {
            initial_equity,
            equity_curve: Vec::new(),
            trades: Vec::new(),
            peak_equity: initial_equity,
            max_drawdown: Decimal::ZERO,
            winning_trades: 0,
            losing_trades: 0,
            total_pnl: Decimal::ZERO,
        }
    }

    /// Appends one equity snapshot and updates peak/drawdown tracking.
    pub fn record_equity(&mut self, timestamp: DateTime<Utc>, equity: Decimal) {
        self.equity_curve.push(EquityPoint {
            timestamp,
            value: equity,
        });

        if equity > self.peak_equity {
            self.peak_equity = equity;
        }
        if self.peak_equity > Decimal::ZERO {
            let drawdown = (self.peak_equity - equity) / self.peak_equity;
            if drawdown > self.max_drawdown {
                self.max_drawdown = drawdown;
            }
        }
    }

    /// Accumulates one closed trade.
    pub fn record_trade(&mut self, trade: &TradeRecord) {
        if trade.pnl > Decimal::ZERO {
            self.winning_trades += 1;
        } else {
            self.losing_trades += 1;
        }
        self.total_pnl += trade.pnl;
        self.trades.push(trade.clone());
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn summary(&self) -> PerformanceSummary {
        let final_equity = self
            .equity_curve
            .last()
            .map(|p| p.value)
            .unwrap_or(self.initial_equity);

        let total_return = if self.initial_equity > Decimal::ZERO {
            ((final_equity - self.initial_equity) / self.initial_equity)
                .to_f64()
                .unwrap_or(0.0)
        } else {
            0.0
        };

        let trade_count = self.winning_trades + self.losing_trades;
        let win_rate = if trade_count > 0 {
            f64::from(self.winning_trades) / f64::from(trade_count)
        } else {
            0.0
        };

        PerformanceSummary {
            initial_equity: self.initial_equity,
            final_equity,
            total_return,
            max_drawdown: self.max_drawdown.to_f64().unwrap_or(0.0),
            win_rate,
            trade_count,
            total_pnl: self.total_pnl,
        }
    }
}
