//! StatusFeed processor.
//!
//! One listener connection serves every brand. Each notification is parsed
//! and handed to the reconciler registered for its brand in [`FeedRoutes`];
//! brands without a live watch are skipped. Payloads that do not parse are
//! logged and dropped; the next event or a manual refresh catches the wallet
//! up.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use bwallet_sdk::objects::STATUS_FEED_CHANNEL;
use sqlx::postgres::PgListener;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::events::{ReconciliationError, WalletEvent, WalletEventSender, parse_feed_payload};

/// Pause after a listener error before receiving again.
const RECONNECT_BACKOFF: Duration = Duration::from_secs(1);

/// Reconciler inboxes by brand, shared by the feed and the wallet watches.
#[derive(Clone, Default)]
pub struct FeedRoutes {
    inner: Arc<RwLock<HashMap<Uuid, WalletEventSender>>>,
}

impl FeedRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, WalletEventSender>> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, WalletEventSender>> {
        self.inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn register(&self, brand_id: Uuid, events_tx: WalletEventSender) {
        self.write().insert(brand_id, events_tx);
    }

    /// Remove the brand's route if it still points at `events_tx`.
    pub fn unregister(&self, brand_id: Uuid, events_tx: &WalletEventSender) {
        let mut routes = self.write();
        if routes
            .get(&brand_id)
            .is_some_and(|current| current.same_channel(events_tx))
        {
            routes.remove(&brand_id);
        }
    }

    pub fn contains(&self, brand_id: Uuid) -> bool {
        self.read().contains_key(&brand_id)
    }

    /// Parse `raw` and forward it to its brand's reconciler.
    ///
    /// Returns `Ok(false)` when no reconciler took the change.
    pub async fn dispatch(&self, raw: &str) -> Result<bool, ReconciliationError> {
        let change = parse_feed_payload(raw)?;
        let Some(events_tx) = self.read().get(&change.brand_id).cloned() else {
            return Ok(false);
        };
        Ok(events_tx
            .send(WalletEvent::StatusChanged(change))
            .await
            .is_ok())
    }
}

pub struct StatusFeed {
    listener: PgListener,
    routes: FeedRoutes,
    shutdown_rx: watch::Receiver<bool>,
}

impl StatusFeed {
    /// Open a listener on its own connection, outside the query pool, and
    /// subscribe to the feed.
    pub async fn connect(
        database_url: &str,
        routes: FeedRoutes,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Result<Self, sqlx::Error> {
        let mut listener = PgListener::connect(database_url).await?;
        listener.listen(STATUS_FEED_CHANNEL).await?;
        Ok(Self {
            listener,
            routes,
            shutdown_rx,
        })
    }

    /// Run the StatusFeed until shutdown.
    pub async fn run(mut self) {
        info!(channel = STATUS_FEED_CHANNEL, "StatusFeed started");

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        info!("StatusFeed received shutdown signal");
                        break;
                    }
                }

                notification = self.listener.try_recv() => {
                    match notification {
                        Ok(Some(notification)) => self.forward(notification.payload()).await,
                        // The next receive reconnects and re-subscribes.
                        Ok(None) => warn!("Status feed connection lost; notifications may have been missed"),
                        Err(e) => {
                            error!(error = %e, "Status feed listener error");
                            tokio::time::sleep(RECONNECT_BACKOFF).await;
                        }
                    }
                }
            }
        }

        if let Err(e) = self.listener.unlisten_all().await {
            debug!(error = %e, "Failed to unlisten status feed");
        }
        info!("StatusFeed shutdown complete");
    }

    async fn forward(&self, raw: &str) {
        match self.routes.dispatch(raw).await {
            Ok(true) => {}
            Ok(false) => debug!("Status change for a brand without a live watch"),
            Err(e) => warn!(error = %e, "Dropping status feed payload"),
        }
    }
}
