//! Deposit flow API request and response types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::methods::{CryptoNetwork, PaymentMethod};
use super::transactions::{PendingDeposit, WalletTransaction};

/// Position of a deposit flow within its method's step sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepositStep {
    #[default]
    Idle,
    Network,
    Address,
    Amount,
    Confirm,
    Processing,
    Success,
}

impl std::fmt::Display for DepositStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DepositStep::Idle => write!(f, "idle"),
            DepositStep::Network => write!(f, "network"),
            DepositStep::Address => write!(f, "address"),
            DepositStep::Amount => write!(f, "amount"),
            DepositStep::Confirm => write!(f, "confirm"),
            DepositStep::Processing => write!(f, "processing"),
            DepositStep::Success => write!(f, "success"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectMethodRequest {
    pub method: PaymentMethod,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectNetworkRequest {
    pub network: CryptoNetwork,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnterAmountRequest {
    pub amount: Decimal,
}

/// Fee breakdown shown on the confirm step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeQuote {
    pub deposit_amount: Decimal,
    pub processing_fee: Decimal,
    pub total_charged: Decimal,
    pub you_receive: Decimal,
    pub fee_percentage: String,
}

/// Snapshot of a brand's deposit flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositFlowResponse {
    pub brand_id: Uuid,
    pub method: Option<PaymentMethod>,
    pub step: DepositStep,
    pub amount: Decimal,
    pub network: Option<CryptoNetwork>,
    pub error: Option<String>,
    pub is_loading: bool,
    /// Issued address for the selected network, once known.
    pub deposit_address: Option<String>,
    /// Off-app card checkout to redirect to, once created.
    pub checkout_url: Option<String>,
    pub fees: Option<FeeQuote>,
}

/// One entry of the method picker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethodOption {
    pub method: PaymentMethod,
    pub title: String,
    pub description: String,
    pub fee_label: String,
    pub estimated_time: Option<String>,
    pub available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletResponse {
    pub brand_id: Uuid,
    pub balance: Decimal,
    pub pending_deposits: Vec<PendingDeposit>,
    pub history: Vec<WalletTransaction>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub refreshed_at: Option<time::OffsetDateTime>,
}

/// Result of handling a return from an off-app checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutReturnOutcome {
    /// The request carried no checkout markers.
    NotACheckoutReturn,
    /// Markers present but nothing was remembered for this brand.
    Completed,
    /// The remembered top-up was finalized.
    Finalized,
    /// The processor answered but did not settle the top-up.
    FinalizeFailed,
    /// The finalize call itself failed.
    FinalizeError,
}

impl CheckoutReturnOutcome {
    /// The remembered top-up was taken but not settled.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            CheckoutReturnOutcome::FinalizeFailed | CheckoutReturnOutcome::FinalizeError
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutReturnResponse {
    pub outcome: CheckoutReturnOutcome,
    pub message: Option<String>,
}
