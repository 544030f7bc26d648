use async_trait::async_trait;
use core_types::{Fill, OrderRequest, Symbol};
use rust_decimal::Decimal;

pub mod error;
pub mod paper;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use paper::{PaperExecutor, PaperSettings};
pub use types::PortfolioSnapshot;

/// The universal interface for an order execution venue.
///
/// An order is fire-and-wait: `execute` submits it and suspends until the
/// venue reports exactly one outcome, a fill or a failure. There is no
/// cancellation concept for an in-flight order, and the caller must not
/// advance any trading state until the outcome is known.
#[async_trait]
pub trait Executor {
    /// The name of the executor (e.g., "PaperExecutor").
    fn name(&self) -> &'static str;

    /// Submits an order and waits for its single outcome.
    ///
    /// `mark_price` is the reference price of the bar the order was decided
    /// on; `timestamp_ms` is that bar's open time.
    async fn execute(
        &mut self,
        order: &OrderRequest,
        mark_price: Decimal,
        timestamp_ms: i64,
    ) -> Result<Fill>;
}

/// Read-only view of the trading account, pulled by the controller before
/// sizing and again after each fill to confirm the position actually
/// changed. This narrow capability is all the engine ever sees of the
/// account collaborator; unit tests implement it with a plain struct.
pub trait AccountView {
    /// Snapshot of cash, position quantity and total equity, with the open
    /// position valued at `mark_price`.
    fn snapshot(&self, symbol: &Symbol, mark_price: Decimal) -> PortfolioSnapshot;
}
