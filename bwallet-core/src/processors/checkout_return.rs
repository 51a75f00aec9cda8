//! Checkout return handling.
//!
//! The card processor sends the user back with marker query parameters. A
//! return is only recognised when a success marker and a return id are both
//! present.

use std::convert::Infallible;
use std::sync::Arc;

use bwallet_sdk::objects::CheckoutReturnOutcome;
use kanau::processor::Processor;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

use crate::events::{WalletEvent, WalletEventSender};
use crate::pending::PendingTopupStore;
use crate::rails::{CardCheckout, FinalizeOutcome};

const STATUS_KEYS: [&str; 2] = ["checkout_status", "status"];
const RETURN_ID_KEYS: [&str; 4] = ["setup_intent_id", "membership_id", "payment_id", "receipt_id"];

/// Markers of a successful return from the card processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutReturn {
    /// Whichever processor id came back, e.g. `payment_id`.
    pub return_id: (String, String),
}

impl CheckoutReturn {
    pub fn detect<I, K, V>(pairs: I) -> Option<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut succeeded = false;
        let mut return_id = None;
        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref());
            if STATUS_KEYS.contains(&key) && value == "success" {
                succeeded = true;
            }
            if return_id.is_none() && RETURN_ID_KEYS.contains(&key) && !value.is_empty() {
                return_id = Some((key.to_string(), value.to_string()));
            }
        }
        match (succeeded, return_id) {
            (true, Some(return_id)) => Some(Self { return_id }),
            _ => None,
        }
    }

    pub fn from_url(url: &Url) -> Option<Self> {
        Self::detect(url.query_pairs())
    }
}

/// Finalizes the remembered top-up of one brand after a checkout return.
pub struct CheckoutReturnHandler {
    brand_id: Uuid,
    card: Arc<dyn CardCheckout>,
    pending: Arc<dyn PendingTopupStore>,
    return_url: Url,
    events_tx: WalletEventSender,
}

impl CheckoutReturnHandler {
    pub fn new(
        brand_id: Uuid,
        card: Arc<dyn CardCheckout>,
        pending: Arc<dyn PendingTopupStore>,
        return_url: Url,
        events_tx: WalletEventSender,
    ) -> Self {
        Self {
            brand_id,
            card,
            pending,
            return_url,
            events_tx,
        }
    }
}

impl Processor<CheckoutReturn> for CheckoutReturnHandler {
    type Output = CheckoutReturnOutcome;
    type Error = Infallible;

    async fn process(&self, marker: CheckoutReturn) -> Result<CheckoutReturnOutcome, Infallible> {
        let brand_id = self.brand_id;
        let (marker_key, marker_value) = &marker.return_id;
        info!(brand_id = %brand_id, marker = %marker_key, value = %marker_value, "Checkout return received");

        // Taken before finalizing so a repeated return cannot finalize twice.
        let (outcome, amount) = match self.pending.take(brand_id) {
            None => (CheckoutReturnOutcome::Completed, None),
            Some(topup) => {
                let outcome = match self
                    .card
                    .finalize_checkout(
                        brand_id,
                        topup.amount,
                        topup.transaction_id,
                        &self.return_url,
                    )
                    .await
                {
                    Ok(FinalizeOutcome::Completed) => CheckoutReturnOutcome::Finalized,
                    Ok(FinalizeOutcome::NeedsPaymentMethod) => {
                        warn!(brand_id = %brand_id, transaction_id = %topup.transaction_id, "Top-up still needs a payment method");
                        CheckoutReturnOutcome::FinalizeFailed
                    }
                    Err(e) => {
                        warn!(brand_id = %brand_id, transaction_id = %topup.transaction_id, error = %e, "Failed to finalize top-up");
                        CheckoutReturnOutcome::FinalizeError
                    }
                };
                (outcome, Some(topup.amount))
            }
        };

        if let Err(e) = self
            .events_tx
            .send(WalletEvent::CheckoutReturned { outcome, amount })
            .await
        {
            warn!(brand_id = %brand_id, error = %e, "Reconciler is gone; checkout return not reconciled");
        }
        Ok(outcome)
    }
}
