//! Event channel factories and handles.

use super::types::{WalletEvent, WalletNotice};
use tokio::sync::{broadcast, mpsc};

/// Default buffer size for event channels.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Sender handle for WalletEvent events.
pub type WalletEventSender = mpsc::Sender<WalletEvent>;
/// Receiver handle for WalletEvent events.
pub type WalletEventReceiver = mpsc::Receiver<WalletEvent>;

/// Sender handle for WalletNotice broadcasts.
pub type WalletNoticeSender = broadcast::Sender<WalletNotice>;
/// Receiver handle for WalletNotice broadcasts.
pub type WalletNoticeReceiver = broadcast::Receiver<WalletNotice>;

/// Create a new WalletEvent channel.
///
/// One per brand; the feed listener and request handlers share the sender,
/// the reconciler owns the receiver.
pub fn wallet_event_channel() -> (WalletEventSender, WalletEventReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Create a new WalletNotice broadcast channel.
///
/// Every connected WebSocket subscribes. Notices sent with no subscriber
/// are dropped.
pub fn wallet_notice_channel() -> (WalletNoticeSender, WalletNoticeReceiver) {
    broadcast::channel(DEFAULT_CHANNEL_BUFFER)
}
