//! Payment rail contracts.
//!
//! The deposit flow only talks to rails through these traits:
//! - `CryptoAddressIssuer` hands out a deposit address per (brand, network)
//! - `CardCheckout` opens an off-app checkout and finalizes it on return
//! - `WireInstructionSource` returns static bank details with a brand reference
//! - `PersonalTransfer` moves funds synchronously from the operator's balance
//!
//! Only the personal transfer settles inline. Every other rail leaves a
//! pending ledger row that the reconciler settles later.

pub mod http;
pub mod ledger;
pub mod wire;

use std::sync::Arc;

use async_trait::async_trait;
use bwallet_sdk::objects::{CryptoNetwork, WireInstructions};
use rust_decimal::Decimal;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

pub use http::HttpRails;
pub use ledger::LedgerPersonalTransfer;
pub use wire::{StaticWireInstructions, WireAccount};

/// Errors raised by a payment rail call.
#[derive(Debug, Error)]
pub enum RailError {
    /// HTTP request error
    #[error("rail request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The rail answered but refused the operation
    #[error("{0}")]
    Rejected(String),

    /// The rail answered without a field the flow needs
    #[error("rail response is missing {0}")]
    IncompleteResponse(&'static str),

    /// Source balance cannot cover a personal transfer
    #[error("insufficient funds: {available} available")]
    InsufficientFunds { available: Decimal },

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A URL returned by or sent to a rail was malformed
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

/// An off-app card checkout awaiting the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub checkout_url: Url,
    /// Pending ledger row the checkout will settle.
    pub transaction_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeOutcome {
    Completed,
    /// The processor still wants a payment method; the top-up is not settled.
    NeedsPaymentMethod,
}

#[async_trait]
pub trait CryptoAddressIssuer: Send + Sync {
    /// Must return the same address for repeated calls with the same pair.
    async fn issue_address(
        &self,
        brand_id: Uuid,
        network: CryptoNetwork,
    ) -> Result<String, RailError>;
}

#[async_trait]
pub trait CardCheckout: Send + Sync {
    /// Open a checkout for `amount`. Creates a pending ledger row.
    async fn create_checkout(
        &self,
        brand_id: Uuid,
        amount: Decimal,
        return_url: &Url,
    ) -> Result<CheckoutSession, RailError>;

    /// Settle a checkout after the user returns from it.
    async fn finalize_checkout(
        &self,
        brand_id: Uuid,
        amount: Decimal,
        transaction_id: Uuid,
        return_url: &Url,
    ) -> Result<FinalizeOutcome, RailError>;
}

#[async_trait]
pub trait WireInstructionSource: Send + Sync {
    async fn wire_instructions(&self, brand_id: Uuid) -> Result<WireInstructions, RailError>;
}

#[async_trait]
pub trait PersonalTransfer: Send + Sync {
    /// Balance a transfer can draw from.
    async fn available_balance(&self) -> Result<Decimal, RailError>;

    /// Debit the source and credit the brand as one ledger operation.
    async fn execute_transfer(&self, brand_id: Uuid, amount: Decimal) -> Result<(), RailError>;
}

/// The set of rails a deposit session can call.
#[derive(Clone)]
pub struct PaymentRails {
    pub crypto: Arc<dyn CryptoAddressIssuer>,
    pub card: Arc<dyn CardCheckout>,
    pub wire: Arc<dyn WireInstructionSource>,
    pub personal: Arc<dyn PersonalTransfer>,
}

impl std::fmt::Debug for PaymentRails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentRails").finish_non_exhaustive()
    }
}
