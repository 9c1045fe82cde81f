use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Price arrays must be of equal length (got {left} and {right})")]
    LengthMismatch { left: usize, right: usize },

    #[error("Price arrays cannot be empty")]
    EmptyInput,

    #[error("Invalid price value: {0}")]
    InvalidData(String),
}
