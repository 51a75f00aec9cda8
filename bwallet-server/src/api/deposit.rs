//! Deposit flow handlers.
//!
//! The brand's session lock is held only while reading or mutating the
//! flow. Rail calls run on a [`RailTicket`] with the lock released, and the
//! result is applied after re-locking.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use bwallet_core::events::WalletEvent;
use bwallet_core::flow::{NetworkSelection, RailResult, RailTicket};
use bwallet_core::rails::PersonalTransfer;
use bwallet_sdk::objects::{
    DepositFlowResponse, DepositStep, EnterAmountRequest, PaymentMethodOption,
    SelectMethodRequest, SelectNetworkRequest,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::ApiError;
use crate::brands::BrandEntry;
use crate::state::AppState;

/// How long a finished flow stays on the success step.
const SUCCESS_DISPLAY: Duration = Duration::from_secs(3);

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/deposit", get(get_deposit))
        .route("/deposit/methods", get(get_methods))
        .route("/deposit/method", post(select_method))
        .route("/deposit/network", post(select_network))
        .route("/deposit/amount", post(enter_amount))
        .route("/deposit/confirm", post(confirm))
        .route("/deposit/next", post(next_step))
        .route("/deposit/back", post(prev_step))
        .route("/deposit/reset", post(reset))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Current balance of the personal wallet, or `None` if it could not be read.
async fn source_balance(state: &AppState) -> Option<Decimal> {
    match state.rails.personal.available_balance().await {
        Ok(balance) => Some(balance),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read personal wallet balance");
            None
        }
    }
}

/// Reset the flow after the success display delay unless it moved on.
pub(super) fn schedule_reset(entry: Arc<BrandEntry>, epoch: u64) {
    tokio::spawn(async move {
        tokio::time::sleep(SUCCESS_DISPLAY).await;
        let mut session = entry.session.lock().await;
        if session.reset_if_unchanged(epoch) {
            tracing::debug!(brand_id = %session.brand_id(), "Deposit flow reset after success");
        }
    });
}

/// Execute `ticket` without the lock, then apply the result.
async fn run_ticket(
    entry: &Arc<BrandEntry>,
    ticket: RailTicket,
) -> Result<Json<DepositFlowResponse>, ApiError> {
    let result = ticket.execute().await;

    // The ledger has already moved the money, even if the flow was reset
    // in the meantime.
    if let Ok(RailResult::Transferred { amount }) = &result {
        let event = WalletEvent::TransferCompleted { amount: *amount };
        if let Err(e) = entry.watch.events().send(event).await {
            tracing::warn!(error = %e, "Reconciler is gone; transfer not reconciled");
        }
    }

    let mut session = entry.session.lock().await;
    session.complete(&ticket, result)?;
    if session.flow().step() == DepositStep::Success {
        schedule_reset(entry.clone(), session.epoch());
    }
    Ok(Json(session.to_response()))
}

// ---------------------------------------------------------------------------
// GET /deposit, GET /deposit/methods
// ---------------------------------------------------------------------------

async fn get_deposit(
    state: State<AppState>,
    Path(brand_id): Path<Uuid>,
) -> Result<Json<DepositFlowResponse>, ApiError> {
    let entry = state.brand(brand_id).await;
    let session = entry.session.lock().await;
    Ok(Json(session.to_response()))
}

/// `GET /deposit/methods`: Method picker entries with personal availability
/// computed from a fresh source balance.
async fn get_methods(
    state: State<AppState>,
    Path(brand_id): Path<Uuid>,
) -> Result<Json<Vec<PaymentMethodOption>>, ApiError> {
    let entry = state.brand(brand_id).await;
    let balance = source_balance(&state).await;
    let mut session = entry.session.lock().await;
    if let Some(balance) = balance {
        session.set_source_balance(balance);
    }
    Ok(Json(session.method_options()))
}

// ---------------------------------------------------------------------------
// POST /deposit/method, /deposit/network, /deposit/amount
// ---------------------------------------------------------------------------

async fn select_method(
    state: State<AppState>,
    Path(brand_id): Path<Uuid>,
    Json(request): Json<SelectMethodRequest>,
) -> Result<Json<DepositFlowResponse>, ApiError> {
    let entry = state.brand(brand_id).await;
    let balance = source_balance(&state).await;
    let mut session = entry.session.lock().await;
    if let Some(balance) = balance {
        session.set_source_balance(balance);
    }
    session.select_method(request.method);
    Ok(Json(session.to_response()))
}

/// `POST /deposit/network`: An address already issued for the network is
/// reused; otherwise the crypto rail issues one.
async fn select_network(
    state: State<AppState>,
    Path(brand_id): Path<Uuid>,
    Json(request): Json<SelectNetworkRequest>,
) -> Result<Json<DepositFlowResponse>, ApiError> {
    let entry = state.brand(brand_id).await;
    let ticket = {
        let mut session = entry.session.lock().await;
        match session.begin_network(request.network)? {
            NetworkSelection::Cached(_) => return Ok(Json(session.to_response())),
            NetworkSelection::Issue(ticket) => ticket,
        }
    };
    run_ticket(&entry, ticket).await
}

async fn enter_amount(
    state: State<AppState>,
    Path(brand_id): Path<Uuid>,
    Json(request): Json<EnterAmountRequest>,
) -> Result<Json<DepositFlowResponse>, ApiError> {
    let entry = state.brand(brand_id).await;
    let mut session = entry.session.lock().await;
    session.enter_amount(request.amount)?;
    Ok(Json(session.to_response()))
}

// ---------------------------------------------------------------------------
// POST /deposit/confirm, /deposit/next
// ---------------------------------------------------------------------------

/// `POST /deposit/confirm`: Opens the card checkout (the response carries
/// `checkout_url`) or moves funds from the personal wallet.
async fn confirm(
    state: State<AppState>,
    Path(brand_id): Path<Uuid>,
) -> Result<Json<DepositFlowResponse>, ApiError> {
    let entry = state.brand(brand_id).await;
    let ticket = entry.session.lock().await.begin_confirm()?;
    run_ticket(&entry, ticket).await
}

async fn next_step(
    state: State<AppState>,
    Path(brand_id): Path<Uuid>,
) -> Result<Json<DepositFlowResponse>, ApiError> {
    let entry = state.brand(brand_id).await;
    let mut session = entry.session.lock().await;
    session.advance()?;
    if session.flow().step() == DepositStep::Success {
        schedule_reset(entry.clone(), session.epoch());
    }
    Ok(Json(session.to_response()))
}

// ---------------------------------------------------------------------------
// POST /deposit/back, /deposit/reset
// ---------------------------------------------------------------------------

async fn prev_step(
    state: State<AppState>,
    Path(brand_id): Path<Uuid>,
) -> Result<Json<DepositFlowResponse>, ApiError> {
    let entry = state.brand(brand_id).await;
    let mut session = entry.session.lock().await;
    session.prev_step();
    Ok(Json(session.to_response()))
}

async fn reset(
    state: State<AppState>,
    Path(brand_id): Path<Uuid>,
) -> Result<Json<DepositFlowResponse>, ApiError> {
    let entry = state.brand(brand_id).await;
    let mut session = entry.session.lock().await;
    session.reset();
    Ok(Json(session.to_response()))
}
