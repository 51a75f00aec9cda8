//! Event type definitions for the wallet reconciliation pipeline.
//!
//! Events carry the authoritative status of a ledger row, never a balance
//! delta. Whoever handles one re-reads the balance from the ledger.

use bwallet_sdk::objects::{
    CheckoutReturnOutcome, FeedOperation, NoticeLevel, StatusChangePayload, TransactionKind,
    TransactionStatus, WsServerMessage,
};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::wallet::LedgerError;

/// A status-change event that could not be used.
#[derive(Debug, Error)]
pub enum ReconciliationError {
    /// Payload was not valid JSON for a status change
    #[error("malformed status payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Payload parsed but describes an impossible transition
    #[error("invalid status change for {id}: {reason}")]
    Invalid { id: Uuid, reason: &'static str },

    /// Event was routed to the wrong brand
    #[error("status change for brand {got} delivered to brand {expected}")]
    ForeignBrand { expected: Uuid, got: Uuid },

    /// The ledger could not be re-read after the event
    #[error("wallet refresh failed: {0}")]
    Ledger(#[from] LedgerError),
}

/// A validated status change of one ledger row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub op: FeedOperation,
    pub id: Uuid,
    pub brand_id: Uuid,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub old_status: Option<TransactionStatus>,
}

impl StatusChange {
    /// The row reached `completed` with this event, either by update or by
    /// being inserted already completed.
    pub fn just_completed(&self) -> bool {
        self.status == TransactionStatus::Completed
            && self.old_status != Some(TransactionStatus::Completed)
    }

    pub fn just_failed(&self) -> bool {
        self.status == TransactionStatus::Failed
            && self.old_status != Some(TransactionStatus::Failed)
    }

    /// Dedupe key. Status only moves once, so (id, status) names a transition.
    pub fn dedupe_key(&self) -> (Uuid, TransactionStatus) {
        (self.id, self.status)
    }
}

impl TryFrom<StatusChangePayload> for StatusChange {
    type Error = ReconciliationError;

    fn try_from(payload: StatusChangePayload) -> Result<Self, Self::Error> {
        if payload.amount.is_sign_negative() {
            return Err(ReconciliationError::Invalid {
                id: payload.id,
                reason: "negative amount",
            });
        }
        let left_terminal = payload
            .old_status
            .is_some_and(|old| old.is_terminal() && payload.status != old);
        if left_terminal {
            return Err(ReconciliationError::Invalid {
                id: payload.id,
                reason: "status left a terminal state",
            });
        }
        Ok(StatusChange {
            op: payload.op,
            id: payload.id,
            brand_id: payload.brand_id,
            kind: payload.kind,
            amount: payload.amount,
            status: payload.status,
            old_status: payload.old_status,
        })
    }
}

/// Parse a raw feed notification.
pub fn parse_feed_payload(raw: &str) -> Result<StatusChange, ReconciliationError> {
    let payload: StatusChangePayload = serde_json::from_str(raw)?;
    payload.try_into()
}

/// Input to a brand's reconciler.
///
/// Every balance-affecting refresh goes through this one path, whether it was
/// triggered by the live feed or by a user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    /// A ledger row changed status.
    StatusChanged(StatusChange),
    /// A personal transfer settled inline.
    TransferCompleted { amount: Decimal },
    /// The user came back from a card checkout.
    CheckoutReturned {
        outcome: CheckoutReturnOutcome,
        amount: Option<Decimal>,
    },
}

/// A user-visible message produced by reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletNotice {
    pub level: NoticeLevel,
    pub message: String,
    pub transaction_id: Option<Uuid>,
    pub kind: Option<TransactionKind>,
}

impl WalletNotice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
            transaction_id: None,
            kind: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            ..Self::success(message)
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            ..Self::success(message)
        }
    }

    pub fn for_transaction(mut self, change: &StatusChange) -> Self {
        self.transaction_id = Some(change.id);
        self.kind = Some(change.kind);
        self
    }
}

impl From<WalletNotice> for WsServerMessage {
    fn from(value: WalletNotice) -> Self {
        WsServerMessage::Notice {
            level: value.level,
            message: value.message,
            transaction_id: value.transaction_id,
            kind: value.kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UPDATE: &str = r#"{
        "op": "UPDATE",
        "id": "0195a4f2-3c1d-7e55-9a51-2b0f3f1e9c01",
        "brand_id": "0195a4f2-3c1d-7e55-9a51-2b0f3f1e9c02",
        "type": "topup",
        "amount": "40.00",
        "status": "completed",
        "old_status": "pending"
    }"#;

    #[test]
    fn test_update_to_completed_is_a_completion() {
        let change = parse_feed_payload(UPDATE).unwrap();
        assert!(change.just_completed());
        assert!(!change.just_failed());
    }

    #[test]
    fn test_insert_completed_is_a_completion() {
        let raw = UPDATE
            .replace("\"UPDATE\"", "\"INSERT\"")
            .replace(",\n        \"old_status\": \"pending\"", "");
        let change = parse_feed_payload(&raw).unwrap();
        assert_eq!(change.op, FeedOperation::Insert);
        assert_eq!(change.old_status, None);
        assert!(change.just_completed());
    }

    #[test]
    fn test_malformed_payload_is_an_error() {
        assert!(matches!(
            parse_feed_payload("{\"op\":\"UPDATE\"}"),
            Err(ReconciliationError::Malformed(_))
        ));
        assert!(matches!(
            parse_feed_payload("not json"),
            Err(ReconciliationError::Malformed(_))
        ));
    }

    #[test]
    fn test_leaving_terminal_state_is_invalid() {
        let raw = UPDATE
            .replace("\"status\": \"completed\"", "\"status\": \"pending\"")
            .replace("\"old_status\": \"pending\"", "\"old_status\": \"failed\"");
        assert!(matches!(
            parse_feed_payload(&raw),
            Err(ReconciliationError::Invalid { .. })
        ));
    }

    #[test]
    fn test_notice_becomes_ws_message() {
        let change = parse_feed_payload(UPDATE).unwrap();
        let message: WsServerMessage = WalletNotice::success("ok").for_transaction(&change).into();
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], "notice");
        assert_eq!(json["level"], "success");
        assert_eq!(json["kind"], "topup");
    }
}
