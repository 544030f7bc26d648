use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The venue refused the order because the account cannot cover it.
    /// The controller reacts by shrinking its risk fraction.
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    /// Any other venue-side rejection. The controller reacts with a timed
    /// trading pause.
    #[error("Order rejected ({code}): {message}")]
    Rejected { code: u32, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
