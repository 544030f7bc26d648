use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid indicator parameters: {0}")]
    InvalidParameters(String),
}

pub type Result<T> = std::result::Result<T, Error>;
