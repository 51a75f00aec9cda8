//! Event system for wallet reconciliation.
//!
//! # Event Flow
//!
//! 1. `StatusFeed` turns ledger NOTIFY payloads into `WalletEvent::StatusChanged`
//! 2. Request handlers emit `TransferCompleted` and `CheckoutReturned`
//! 3. `DepositReconciler` refreshes the `WalletView` and emits `WalletNotice`
//! 4. WebSocket connections forward notices to the browser
//!
//! Events carry statuses, not deltas, so a repeated event can at worst cause
//! an extra refresh.

pub mod channels;
pub mod types;

pub use channels::{
    DEFAULT_CHANNEL_BUFFER, WalletEventReceiver, WalletEventSender, WalletNoticeReceiver,
    WalletNoticeSender, wallet_event_channel, wallet_notice_channel,
};

pub use types::{
    ReconciliationError, StatusChange, WalletEvent, WalletNotice, parse_feed_payload,
};
