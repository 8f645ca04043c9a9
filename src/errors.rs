use chrono::NaiveDateTime;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("STALE_SOURCE: source last modified {modified}, before week start {week_start}")]
    Stale {
        modified: NaiveDateTime,
        week_start: NaiveDateTime,
    },
    #[error("INSUFFICIENT_DATA: habit '{habit}' has {points} weekly point(s), need at least 2")]
    InsufficientData { habit: String, points: usize },
    #[error("DELIVERY_FAILED: {0}")]
    Delivery(String),
    #[error("CONFIG_INVALID: {0}")]
    Config(String),
    #[error("DATA_INVALID: {0}")]
    Data(String),
    #[error("RENDER_FAILED: {0}")]
    Render(String),
    #[error("IO_FAILURE: {0}")]
    Io(String),
    #[error("INTERNAL: {0}")]
    Internal(String),
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(value: csv::Error) -> Self {
        Self::Data(value.to_string())
    }
}

impl From<lettre::address::AddressError> for AppError {
    fn from(value: lettre::address::AddressError) -> Self {
        Self::Delivery(value.to_string())
    }
}

impl From<lettre::error::Error> for AppError {
    fn from(value: lettre::error::Error) -> Self {
        Self::Delivery(value.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for AppError {
    fn from(value: lettre::transport::smtp::Error) -> Self {
        Self::Delivery(value.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
