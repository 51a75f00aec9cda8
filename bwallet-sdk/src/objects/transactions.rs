//! Ledger transaction types as seen by API consumers.
//!
//! These are the DTO versions without `sqlx::Type`. For database
//! operations, use the versions in `bwallet-core::entities`.

use rust_decimal::Decimal;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::methods::CryptoNetwork;

/// Kind of a brand wallet ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// USDC received on chain.
    CryptoDeposit,
    /// Bank wire received.
    Deposit,
    /// Card checkout.
    Topup,
    /// Funds moved in from the operator's personal balance.
    TransferIn,
    TransferOut,
    Withdrawal,
    /// A wire the operator announced but the bank has not yet delivered.
    DepositIntent,
}

impl TransactionKind {
    /// Deposit-like entries are the ones that can sit in the pending list.
    pub fn is_deposit(&self) -> bool {
        matches!(
            self,
            TransactionKind::CryptoDeposit | TransactionKind::Deposit | TransactionKind::Topup
        )
    }

    /// Label used in user-facing confirmation messages.
    pub fn confirmation_label(&self) -> &'static str {
        match self {
            TransactionKind::CryptoDeposit => "Crypto deposit",
            TransactionKind::Deposit => "Wire deposit",
            TransactionKind::Topup => "Card payment",
            _ => "Deposit",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::CryptoDeposit => write!(f, "crypto_deposit"),
            TransactionKind::Deposit => write!(f, "deposit"),
            TransactionKind::Topup => write!(f, "topup"),
            TransactionKind::TransferIn => write!(f, "transfer_in"),
            TransactionKind::TransferOut => write!(f, "transfer_out"),
            TransactionKind::Withdrawal => write!(f, "withdrawal"),
            TransactionKind::DepositIntent => write!(f, "deposit_intent"),
        }
    }
}

/// Settlement status of a ledger entry.
///
/// `Pending` moves at most once to `Completed` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "pending"),
            TransactionStatus::Completed => write!(f, "completed"),
            TransactionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Free-form details attached to a ledger entry by the rail that created it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionMetadata {
    /// Unknown or malformed networks read as `None`.
    #[serde(
        default,
        deserialize_with = "lenient_network",
        skip_serializing_if = "Option::is_none"
    )]
    pub network: Option<CryptoNetwork>,
    /// Processor payment id, wire memo, or similar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_reference: Option<String>,
    /// On-chain transaction hash or signature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_signature: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNetwork {
    Name(String),
    Other(IgnoredAny),
}

fn lenient_network<'de, D>(deserializer: D) -> Result<Option<CryptoNetwork>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawNetwork>::deserialize(deserializer)? {
        Some(RawNetwork::Name(name)) => CryptoNetwork::from_name(&name),
        Some(RawNetwork::Other(_)) | None => None,
    })
}

/// A brand wallet ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub brand_id: Uuid,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub status: TransactionStatus,
    #[serde(default)]
    pub metadata: TransactionMetadata,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: time::OffsetDateTime,
}

/// A pending deposit as listed in the wallet view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDeposit {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<CryptoNetwork>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_signature: Option<String>,
    /// Block explorer link, when both the network and signature are known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: time::OffsetDateTime,
    /// e.g. "12 min ago"
    pub elapsed: String,
}
