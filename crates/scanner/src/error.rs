use shared::{
    error::{ApiError, ErrorCode},
    time::MalformedTimeError,
};
use thiserror::Error;

/// Why a start request was turned away. Nothing is spawned in either case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    #[error("{0}")]
    Validation(String),
    #[error("Scanner is already running")]
    AlreadyRunning,
}

impl StartError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            StartError::Validation(_) => ErrorCode::Validation,
            StartError::AlreadyRunning => ErrorCode::AlreadyRunning,
        }
    }
}

impl From<MalformedTimeError> for StartError {
    fn from(value: MalformedTimeError) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<StartError> for ApiError {
    fn from(value: StartError) -> Self {
        ApiError::new(value.code(), value.to_string())
    }
}
