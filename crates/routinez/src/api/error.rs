//! Error types for the routine API client.

use thiserror::Error;

use crate::classify::{AppError, GENERIC_FAILURE};

/// Errors surfaced by [`RoutineClient`](super::RoutineClient) calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a usable response.
    #[error("network error: {message}")]
    Network { message: String },

    /// The response body was not the JSON we expected.
    #[error("decode error: {message}")]
    Decode { message: String },

    /// The server answered with a routine-level error.
    #[error("{0}")]
    Routine(AppError),
}

impl ApiError {
    /// Whether retrying the same call might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Network { .. })
    }

    /// Collapses any variant into the display shape. Transport and decode
    /// failures become the generic message; their detail is already in
    /// the logs.
    pub fn into_app_error(self) -> AppError {
        match self {
            ApiError::Routine(error) => error,
            ApiError::Network { .. } | ApiError::Decode { .. } => {
                AppError::from_message(GENERIC_FAILURE)
            }
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode {
                message: err.to_string(),
            }
        } else {
            ApiError::Network {
                message: err.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode {
            message: err.to_string(),
        }
    }
}
