use thiserror::Error;

pub type TlResult<T> = Result<T, TlError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TlError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Malformed number for {what}: {input:?}")]
    Malformed { what: &'static str, input: String },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}
