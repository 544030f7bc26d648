use crate::types::SizerSettings;
use crate::{Error, Result};
use num_traits::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Fixed-fractional position sizer.
///
/// Maps an entry/stop pair and the current account equity to an order
/// quantity: risk a fixed fraction of equity over the stop distance, capped
/// by a maximum allocation and floored by a minimum notional. The sizer is
/// stateless; `risk_fraction` is a call parameter because the controller
/// lowers it after insufficient-funds rejections.
#[derive(Debug, Clone)]
pub struct PositionSizer {
    settings: SizerSettings,
}

/// Stops closer than this fraction of the entry price are widened to it
/// before dividing, so an implausibly tight stop cannot blow the size up.
const MIN_STOP_DISTANCE_FRACTION: Decimal = dec!(0.01);

impl PositionSizer {
    pub fn new(settings: SizerSettings) -> Result<Self> {
        if settings.max_allocation <= 0.0 || settings.max_allocation > 1.0 {
            return Err(Error::InvalidParameters(format!(
                "max_allocation must be in (0, 1], got {}",
                settings.max_allocation
            )));
        }
        if settings.min_notional < Decimal::ZERO {
            return Err(Error::InvalidParameters(format!(
                "min_notional must be non-negative, got {}",
                settings.min_notional
            )));
        }
        Ok(Self { settings })
    }

    /// Returns the quantity to order, always `>= 0`.
    ///
    /// A zero return means "no trade" and is not an error; it is produced
    /// for non-positive entry or stop prices. Sizes below the minimum
    /// notional are raised to it rather than dropped.
    pub fn size(
        &self,
        entry_price: Decimal,
        stop_price: Decimal,
        account_equity: Decimal,
        risk_fraction: f64,
    ) -> Decimal {
        if entry_price <= Decimal::ZERO || stop_price <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let risk_fraction = Decimal::from_f64(risk_fraction).unwrap_or(Decimal::ZERO);
        let risk_amount = account_equity * risk_fraction;

        let per_unit_risk =
            (entry_price - stop_price).abs().max(entry_price * MIN_STOP_DISTANCE_FRACTION);

        let raw_size = risk_amount / per_unit_risk;
        let max_allocation =
            Decimal::from_f64(self.settings.max_allocation).unwrap_or(Decimal::ZERO);
        let allocation_cap = account_equity * max_allocation / entry_price;
        let mut quantity = raw_size.min(allocation_cap);

        let min_quantity = self.settings.min_notional / entry_price;
        if quantity < min_quantity {
            tracing::debug!(
                %entry_price,
                %quantity,
                %min_quantity,
                "Risk-based size below minimum notional, raising to floor."
            );
            quantity = min_quantity;
        }

        quantity
    }
}
