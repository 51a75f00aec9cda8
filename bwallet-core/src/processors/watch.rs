//! Lifetime of one brand's reconciliation task.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::reconciler::DepositReconciler;
use super::status_feed::FeedRoutes;
use crate::events::{
    WalletEventSender, WalletNoticeReceiver, WalletNoticeSender, wallet_event_channel,
    wallet_notice_channel,
};
use crate::wallet::WalletView;

/// A brand's wallet view with its reconciler, routed into the shared status
/// feed while it lives. Dropping the watch stops the reconciler and removes
/// the route.
pub struct WalletWatch {
    view: Arc<WalletView>,
    events_tx: WalletEventSender,
    notices_tx: WalletNoticeSender,
    shutdown_tx: watch::Sender<bool>,
    routes: FeedRoutes,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl WalletWatch {
    /// Spawn the reconciler for `view` and route the brand's feed to it.
    /// Must be called inside a runtime.
    pub fn start(view: Arc<WalletView>, routes: &FeedRoutes) -> Self {
        let (events_tx, events_rx) = wallet_event_channel();
        let (notices_tx, _) = wallet_notice_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let reconciler =
            DepositReconciler::new(view.clone(), notices_tx.clone(), events_rx, shutdown_rx);
        let handle = tokio::spawn(reconciler.run());
        routes.register(view.brand_id(), events_tx.clone());

        Self {
            view,
            events_tx,
            notices_tx,
            shutdown_tx,
            routes: routes.clone(),
            task: Mutex::new(Some(handle)),
        }
    }

    pub fn view(&self) -> &Arc<WalletView> {
        &self.view
    }

    /// Sender into the reconciler, for events raised by request handlers.
    pub fn events(&self) -> WalletEventSender {
        self.events_tx.clone()
    }

    pub fn subscribe(&self) -> WalletNoticeReceiver {
        self.notices_tx.subscribe()
    }

    /// Number of live notice subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.notices_tx.receiver_count()
    }

    fn stop(&self) {
        self.routes.unregister(self.view.brand_id(), &self.events_tx);
        let _ = self.shutdown_tx.send(true);
    }

    /// Stop the reconciler and wait for it to finish.
    pub async fn shutdown(&self) {
        self.stop();
        let handle = self
            .task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(brand_id = %self.view.brand_id(), error = %e, "Wallet task ended abnormally");
            }
        }
        info!(brand_id = %self.view.brand_id(), "Wallet watch stopped");
    }
}

impl Drop for WalletWatch {
    fn drop(&mut self) {
        self.stop();
    }
}
