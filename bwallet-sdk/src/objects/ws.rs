//! WebSocket message types for the wallet notice stream.
//!
//! `GET /api/v1/brands/{brand_id}/ws` upgrades to a WebSocket connection
//! that pushes [`WsServerMessage`] JSON frames for as long as the client
//! stays connected. There is no terminal state; the client closes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::transactions::TransactionKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

/// Server-to-client WebSocket message.
///
/// ```json
/// {"type":"notice","level":"success","message":"Card payment of $40.00 confirmed!", ...}
/// {"type":"balance","balance":"140.00"}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsServerMessage {
    /// A user-visible message, usually a deposit confirmation.
    Notice {
        level: NoticeLevel,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        transaction_id: Option<Uuid>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kind: Option<TransactionKind>,
    },

    /// The wallet balance after a refresh.
    Balance { balance: Decimal },

    Error { code: u16, reason: String },
}

/// Well-known WebSocket close codes used by the notice stream.
pub struct WsCloseCode;

impl WsCloseCode {
    /// The server is shutting down.
    pub const GOING_AWAY: u16 = 1001;
}
