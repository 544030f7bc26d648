use crate::types::PortfolioSnapshot;
use crate::{AccountView, Error, Executor, Result};
use async_trait::async_trait;
use core_types::{Fill, OrderRequest, Side, Symbol};
use num_traits::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PaperSettings {
    /// Adverse price adjustment applied to market orders (e.g. 0.0005 for
    /// 0.05%).
    #[serde(default)]
    pub slippage_percent: f64,

    /// Taker fee charged on the filled notional (e.g. 0.0004 for 0.04%).
    #[serde(default)]
    pub taker_fee: f64,
}

/// An execution venue backed by a paper account.
///
/// Fills every order at the mark price adjusted by the configured slippage,
/// charges a taker fee, and keeps cash and position balances. Entries that
/// the cash balance cannot cover are rejected with
/// [`Error::InsufficientFunds`]; the engine never holds a short position, so
/// sells beyond the held quantity are rejected outright.
pub struct PaperExecutor {
    settings: PaperSettings,
    cash: Decimal,
    positions: HashMap<Symbol, Decimal>,
}

impl PaperExecutor {
    pub fn new(settings: PaperSettings, initial_cash: Decimal) -> Self {
        Self {
            settings,
            cash: initial_cash,
            positions: HashMap::new(),
        }
    }

    pub fn cash(&self) -> Decimal {
        self.cash
    }

    fn held_quantity(&self, symbol: &Symbol) -> Decimal {
        self.positions.get(symbol).copied().unwrap_or(Decimal::ZERO)
    }

    /// Slippage always moves the price against the order.
    fn execution_price(&self, side: Side, mark_price: Decimal) -> Decimal {
        let slippage = Decimal::from_f64(self.settings.slippage_percent).unwrap_or(Decimal::ZERO);
        match side {
            Side::Long => mark_price * (dec!(1) + slippage),
            Side::Short => mark_price * (dec!(1) - slippage),
        }
    }
}

#[async_trait]
impl Executor for PaperExecutor {
    fn name(&self) -> &'static str {
        "PaperExecutor"
    }

    async fn execute(
        &mut self,
        order: &OrderRequest,
        mark_price: Decimal,
        timestamp_ms: i64,
    ) -> Result<Fill> {
        if order.quantity <= Decimal::ZERO {
            return Err(Error::Rejected {
                code: 400,
                message: format!("non-positive order quantity {}", order.quantity),
            });
        }

        let price = self.execution_price(order.side, mark_price);
        let notional = order.quantity * price;
        let fee_rate = Decimal::from_f64(self.settings.taker_fee).unwrap_or(Decimal::ZERO);
        let fee = notional * fee_rate;

        match order.side {
            Side::Long => {
                let cost = notional + fee;
                if cost > self.cash {
                    return Err(Error::InsufficientFunds {
                        required: cost,
                        available: self.cash,
                    });
                }
                self.cash -= cost;
                *self
                    .positions
                    .entry(order.symbol.clone())
                    .or_insert(Decimal::ZERO) += order.quantity;
            }
            Side::Short => {
                let held = self.held_quantity(&order.symbol);
                if order.quantity > held {
                    return Err(Error::Rejected {
                        code: 422,
                        message: format!(
                            "cannot sell {} with only {} held",
                            order.quantity, held
                        ),
                    });
                }
                self.cash += notional - fee;
                let remaining = held - order.quantity;
                if remaining == Decimal::ZERO {
                    self.positions.remove(&order.symbol);
                } else {
                    self.positions.insert(order.symbol.clone(), remaining);
                }
            }
        }

        tracing::debug!(
            symbol = %order.symbol,
            side = ?order.side,
            quantity = %order.quantity,
            %price,
            %fee,
            timestamp_ms,
            "Paper fill."
        );

        Ok(Fill {
            symbol: order.symbol.clone(),
            side: order.side,
            quantity: order.quantity,
            price,
            fee,
        })
    }
}

impl AccountView for PaperExecutor {
    fn snapshot(&self, symbol: &Symbol, mark_price: Decimal) -> PortfolioSnapshot {
        let position_quantity = self.held_quantity(symbol);
        PortfolioSnapshot {
            cash: self.cash,
            position_quantity,
            total_equity: self.cash + position_quantity * mark_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(side: Side, quantity: Decimal) -> OrderRequest {
        OrderRequest {
            symbol: Symbol("BTCUSD".to_string()),
            side,
            quantity,
        }
    }

    #[tokio::test]
    async fn round_trip_updates_cash_and_position() {
        let mut exec = PaperExecutor::new(PaperSettings::default(), dec!(10000));
        let symbol = Symbol("BTCUSD".to_string());

        let fill = exec
            .execute(&order(Side::Long, dec!(10)), dec!(100), 0)
            .await
            .unwrap();
        assert_eq!(fill.price, dec!(100));
        assert_eq!(exec.cash(), dec!(9000));
        assert_eq!(exec.snapshot(&symbol, dec!(100)).position_quantity, dec!(10));

        exec.execute(&order(Side::Short, dec!(10)), dec!(110), 1)
            .await
            .unwrap();
        assert_eq!(exec.cash(), dec!(10100));
        assert_eq!(
            exec.snapshot(&symbol, dec!(110)).position_quantity,
            dec!(0)
        );
    }

    #[tokio::test]
    async fn entry_beyond_cash_is_rejected_as_insufficient_funds() {
        let mut exec = PaperExecutor::new(PaperSettings::default(), dec!(100));
        let result = exec.execute(&order(Side::Long, dec!(10)), dec!(100), 0).await;
        assert!(matches!(result, Err(Error::InsufficientFunds { .. })));
        // Nothing moved.
        assert_eq!(exec.cash(), dec!(100));
    }

    #[tokio::test]
    async fn selling_more_than_held_is_rejected() {
        let mut exec = PaperExecutor::new(PaperSettings::default(), dec!(10000));
        let result = exec.execute(&order(Side::Short, dec!(1)), dec!(100), 0).await;
        assert!(matches!(result, Err(Error::Rejected { .. })));
    }

    #[tokio::test]
    async fn slippage_and_fees_are_applied() {
        let settings = PaperSettings {
            slippage_percent: 0.01,
            taker_fee: 0.001,
        };
        let mut exec = PaperExecutor::new(settings, dec!(10000));
        let fill = exec
            .execute(&order(Side::Long, dec!(1)), dec!(100), 0)
            .await
            .unwrap();
        assert_eq!(fill.price, dec!(101));
        assert_eq!(fill.fee, dec!(0.101));
        assert_eq!(exec.cash(), dec!(10000) - dec!(101) - dec!(0.101));
    }

    #[test]
    fn snapshot_values_position_at_mark() {
        let mut exec = PaperExecutor::new(PaperSettings::default(), dec!(1000));
        exec.positions.insert(Symbol("BTCUSD".to_string()), dec!(2));
        let snap = exec.snapshot(&Symbol("BTCUSD".to_string()), dec!(50));
        assert_eq!(snap.total_equity, dec!(1100));
    }
}
