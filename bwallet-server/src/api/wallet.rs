//! Wallet read model, wire instructions, and checkout returns.

use axum::{
    Json, Router,
    extract::{Path, RawQuery, State},
    routing::get,
};
use bwallet_core::processors::{CheckoutReturn, CheckoutReturnHandler};
use bwallet_sdk::objects::{
    CheckoutReturnOutcome, CheckoutReturnResponse, DepositStep, WalletResponse,
    WireInstructionsResponse,
};
use kanau::processor::Processor;
use time::OffsetDateTime;
use url::form_urlencoded;
use uuid::Uuid;

use super::ApiError;
use super::deposit::schedule_reset;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/wallet", get(get_wallet))
        .route("/wire", get(get_wire))
        .route("/checkout/return", get(checkout_return))
}

/// `GET /wallet`: Re-read the ledger and return the brand's wallet.
async fn get_wallet(
    state: State<AppState>,
    Path(brand_id): Path<Uuid>,
) -> Result<Json<WalletResponse>, ApiError> {
    let entry = state.brand(brand_id).await;
    let view = entry.watch.view();
    view.refresh().await?;
    Ok(Json(view.to_response(OffsetDateTime::now_utc()).await))
}

/// `GET /wire`: Wire instructions with the brand's memo reference and the
/// copy-all text.
async fn get_wire(
    state: State<AppState>,
    Path(brand_id): Path<Uuid>,
) -> Result<Json<WireInstructionsResponse>, ApiError> {
    let entry = state.brand(brand_id).await;
    let instructions = entry.session.lock().await.wire_instructions().await?;
    Ok(Json(instructions.into()))
}

fn return_message(outcome: CheckoutReturnOutcome) -> Option<String> {
    let message = match outcome {
        CheckoutReturnOutcome::NotACheckoutReturn => return None,
        CheckoutReturnOutcome::Completed => "Checkout completed.",
        CheckoutReturnOutcome::Finalized => "Top-up finalized.",
        CheckoutReturnOutcome::FinalizeFailed => "Could not finalize top-up. Please try again.",
        CheckoutReturnOutcome::FinalizeError => "Failed to finalize top-up.",
    };
    Some(message.to_string())
}

/// `GET /checkout/return?…`: The card processor redirected the user back.
///
/// Requests without the success markers are answered with
/// `not_a_checkout_return` and change nothing.
async fn checkout_return(
    state: State<AppState>,
    Path(brand_id): Path<Uuid>,
    RawQuery(query): RawQuery,
) -> Result<Json<CheckoutReturnResponse>, ApiError> {
    let query = query.unwrap_or_default();
    let Some(marker) = CheckoutReturn::detect(form_urlencoded::parse(query.as_bytes())) else {
        return Ok(Json(CheckoutReturnResponse {
            outcome: CheckoutReturnOutcome::NotACheckoutReturn,
            message: None,
        }));
    };

    let entry = state.brand(brand_id).await;
    let handler = CheckoutReturnHandler::new(
        brand_id,
        state.rails.card.clone(),
        state.pending.clone(),
        state.return_url().await,
        entry.watch.events(),
    );
    let outcome = handler
        .process(marker)
        .await
        .unwrap_or_else(|never| match never {});

    let mut session = entry.session.lock().await;
    session.checkout_returned();
    if session.flow().step() == DepositStep::Success {
        schedule_reset(entry.clone(), session.epoch());
    }

    Ok(Json(CheckoutReturnResponse {
        outcome,
        message: return_message(outcome),
    }))
}
