//! Brand wallet HTTP API.
//!
//! Every route is nested under `/api/v1/brands/{brand_id}`.
//!
//! # Endpoints
//!
//! - `GET  /deposit`          – current flow state and fee quote
//! - `GET  /deposit/methods`  – method picker entries
//! - `POST /deposit/method`   – select a payment method
//! - `POST /deposit/network`  – select a crypto network and issue its address
//! - `POST /deposit/amount`   – enter the deposit amount
//! - `POST /deposit/confirm`  – open the card checkout or run the personal transfer
//! - `POST /deposit/next`     – finish after the address step
//! - `POST /deposit/back`     – previous step
//! - `POST /deposit/reset`    – start over
//! - `GET  /wire`             – wire instructions
//! - `GET  /wallet`           – refreshed balance, pending deposits and history
//! - `GET  /checkout/return`  – card checkout return
//! - `GET  /ws`               – WebSocket notice stream

mod deposit;
mod wallet;
mod ws;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bwallet_core::flow::{DepositError, ValidationError};
use bwallet_core::rails::RailError;
use bwallet_core::wallet::LedgerError;
use serde::Serialize;
use thiserror::Error;

use crate::state::AppState;

/// Build the brand API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(deposit::router())
        .merge(wallet::router())
        .merge(ws::router())
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request does not fit the flow's current state.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A payment rail failed or refused the request.
    #[error(transparent)]
    Rail(#[from] RailError),

    /// The flow was reset or switched while the request was in flight.
    #[error("deposit flow changed before the request finished")]
    Abandoned,

    /// Reading the wallet ledger failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl From<DepositError> for ApiError {
    fn from(value: DepositError) -> Self {
        match value {
            DepositError::Validation(e) => ApiError::Validation(e),
            DepositError::Rail(e) => ApiError::Rail(e),
            DepositError::Abandoned => ApiError::Abandoned,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Rail(RailError::InsufficientFunds { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Rail(RailError::Database(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Rail(_) => StatusCode::BAD_GATEWAY,
            ApiError::Abandoned => StatusCode::CONFLICT,
            ApiError::Ledger(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Brand API internal error");
            "internal server error".to_string()
        } else {
            if status == StatusCode::BAD_GATEWAY {
                tracing::warn!(error = %self, "Brand API rail error");
            }
            self.to_string()
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(DepositError::Validation(ValidationError::NoMethod)).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(DepositError::Rail(RailError::Rejected("down".into()))).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(DepositError::Abandoned).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Ledger(LedgerError::Unavailable("gone".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_message_is_returned() {
        let response = ApiError::Validation(ValidationError::NonPositiveAmount).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
