//! Payload published on the ledger's status-change feed.
//!
//! The database emits one JSON object per inserted row and per status
//! update on `brand_wallet_transactions`. Amounts travel as strings to keep
//! decimal precision.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::transactions::{TransactionKind, TransactionStatus};

/// Name of the NOTIFY channel the ledger publishes on.
pub const STATUS_FEED_CHANNEL: &str = "brand_wallet_transactions";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FeedOperation {
    Insert,
    Update,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChangePayload {
    pub op: FeedOperation,
    pub id: Uuid,
    pub brand_id: Uuid,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub status: TransactionStatus,
    /// Only present on updates.
    #[serde(default)]
    pub old_status: Option<TransactionStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_update_payload() {
        let json = r#"{
            "op": "UPDATE",
            "id": "0195a4f2-3c1d-7e55-9a51-2b0f3f1e9c01",
            "brand_id": "0195a4f2-3c1d-7e55-9a51-2b0f3f1e9c02",
            "type": "topup",
            "amount": "40.00",
            "status": "completed",
            "old_status": "pending"
        }"#;
        let payload: StatusChangePayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.op, FeedOperation::Update);
        assert_eq!(payload.kind, TransactionKind::Topup);
        assert_eq!(payload.old_status, Some(TransactionStatus::Pending));
    }

    #[test]
    fn test_insert_payload_has_no_old_status() {
        let json = r#"{
            "op": "INSERT",
            "id": "0195a4f2-3c1d-7e55-9a51-2b0f3f1e9c01",
            "brand_id": "0195a4f2-3c1d-7e55-9a51-2b0f3f1e9c02",
            "type": "crypto_deposit",
            "amount": "5",
            "status": "completed"
        }"#;
        let payload: StatusChangePayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.op, FeedOperation::Insert);
        assert!(payload.old_status.is_none());
    }
}
