//! Mapping of engine errors onto HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use holdem_engine::{
    table::{TableError, ValidationError},
    wallet::WalletError,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// An error ready to be sent to a client.
///
/// Messages come from `client_message()` so ledger and invariant details
/// stay in the server logs.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<TableError> for ApiError {
    fn from(err: TableError) -> Self {
        let status = match &err {
            TableError::Validation(
                ValidationError::TableFull
                | ValidationError::AlreadySeated(_)
                | ValidationError::TableNotEmpty,
            ) => StatusCode::CONFLICT,
            TableError::Validation(ValidationError::InsufficientBalance { .. }) => {
                StatusCode::PAYMENT_REQUIRED
            }
            TableError::Validation(_) | TableError::Config(_) => StatusCode::BAD_REQUEST,
            TableError::NotFound(_) => StatusCode::NOT_FOUND,
            TableError::Concurrency { .. } => StatusCode::CONFLICT,
            TableError::Closed => StatusCode::GONE,
            TableError::Ledger(wallet) => return wallet_status(wallet, err.client_message()),
            TableError::Invariant(_) | TableError::Halted => {
                tracing::error!(error = %err, "Table unavailable");
                StatusCode::SERVICE_UNAVAILABLE
            }
        };
        Self::new(status, err.client_message())
    }
}

impl From<WalletError> for ApiError {
    fn from(err: WalletError) -> Self {
        let message = err.client_message();
        wallet_status(&err, message)
    }
}

fn wallet_status(err: &WalletError, message: String) -> ApiError {
    let status = match err {
        WalletError::InsufficientBalance { .. } => StatusCode::PAYMENT_REQUIRED,
        WalletError::InvalidAmount(_)
        | WalletError::SelfTransfer
        | WalletError::BalanceOverflow => StatusCode::BAD_REQUEST,
        WalletError::DuplicateTransaction(_) => StatusCode::CONFLICT,
        WalletError::WalletNotFound(_) | WalletError::UnknownTable(_) => StatusCode::NOT_FOUND,
        WalletError::TransactionFailed(_) => {
            tracing::error!(error = %err, "Ledger failure");
            StatusCode::BAD_GATEWAY
        }
    };
    ApiError::new(status, message)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
