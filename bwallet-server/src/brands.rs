//! Per-brand deposit sessions and wallet watches.
//!
//! A brand's entry is created on its first request. Entries that nothing
//! references, with no notice subscriber, are stopped and removed once they
//! have been idle for [`IDLE_TIMEOUT`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};

use bwallet_core::flow::DepositSession;
use bwallet_core::framework::DatabaseProcessor;
use bwallet_core::pending::PendingTopupStore;
use bwallet_core::processors::{FeedRoutes, WalletWatch};
use bwallet_core::rails::PaymentRails;
use bwallet_core::wallet::{PgWalletLedger, WalletView};
use sqlx::PgPool;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;
use url::Url;
use uuid::Uuid;

/// How long an unused brand entry is kept.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// How often idle entries are looked for.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub struct BrandEntry {
    /// Held only between rail calls, never across one.
    pub session: Mutex<DepositSession>,
    pub watch: WalletWatch,
    last_used: StdMutex<Instant>,
}

impl BrandEntry {
    fn new(session: DepositSession, watch: WalletWatch) -> Self {
        Self {
            session: Mutex::new(session),
            watch,
            last_used: StdMutex::new(Instant::now()),
        }
    }

    fn touch(&self) {
        *self
            .last_used
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Instant::now();
    }

    fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(
            *self
                .last_used
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }
}

pub struct BrandRegistry {
    db: PgPool,
    rails: PaymentRails,
    pending: Arc<dyn PendingTopupStore>,
    routes: FeedRoutes,
    brands: RwLock<HashMap<Uuid, Arc<BrandEntry>>>,
    shutdown_tx: watch::Sender<bool>,
}

impl BrandRegistry {
    pub fn new(
        db: PgPool,
        rails: PaymentRails,
        pending: Arc<dyn PendingTopupStore>,
        routes: FeedRoutes,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            db,
            rails,
            pending,
            routes,
            brands: RwLock::new(HashMap::new()),
            shutdown_tx,
        }
    }

    /// Return the brand's entry, starting its wallet watch on first use.
    pub async fn get_or_start(&self, brand_id: Uuid, return_url: Url) -> Arc<BrandEntry> {
        if let Some(entry) = self.brands.read().await.get(&brand_id) {
            entry.touch();
            return entry.clone();
        }

        let mut brands = self.brands.write().await;
        if let Some(entry) = brands.get(&brand_id) {
            entry.touch();
            return entry.clone();
        }

        let ledger = PgWalletLedger::new(DatabaseProcessor {
            pool: self.db.clone(),
        });
        let view = Arc::new(WalletView::new(brand_id, Arc::new(ledger)));
        let entry = Arc::new(BrandEntry::new(
            DepositSession::new(brand_id, self.rails.clone(), self.pending.clone(), return_url),
            WalletWatch::start(view, &self.routes),
        ));
        brands.insert(brand_id, entry.clone());
        tracing::info!(brand_id = %brand_id, "Brand wallet watch started");
        entry
    }

    /// Point every live session at a new checkout return URL.
    pub async fn set_return_url(&self, return_url: &Url) {
        let entries: Vec<_> = self.brands.read().await.values().cloned().collect();
        for entry in entries {
            entry.session.lock().await.set_return_url(return_url.clone());
        }
    }

    /// Remove entries idle for at least `idle_timeout` that no request, reset
    /// timer or WebSocket still holds, and stop their watches.
    pub async fn evict_idle(&self, idle_timeout: Duration) -> usize {
        let now = Instant::now();
        let evicted: Vec<_> = {
            let mut brands = self.brands.write().await;
            let idle: Vec<Uuid> = brands
                .iter()
                .filter(|(_, entry)| {
                    Arc::strong_count(entry) == 1
                        && entry.watch.subscriber_count() == 0
                        && entry.idle_for(now) >= idle_timeout
                })
                .map(|(brand_id, _)| *brand_id)
                .collect();
            idle.iter().filter_map(|id| brands.remove(id)).collect()
        };

        for entry in &evicted {
            entry.watch.shutdown().await;
        }
        if !evicted.is_empty() {
            tracing::info!(count = evicted.len(), "Evicted idle brand wallet watches");
        }
        evicted.len()
    }

    /// Periodically evict idle entries until [`BrandRegistry::shutdown_all`].
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let registry = self.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;

                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }

                    _ = interval.tick() => {
                        registry.evict_idle(IDLE_TIMEOUT).await;
                    }
                }
            }
            tracing::debug!("Brand sweeper stopped");
        })
    }

    /// Stop the sweeper and every brand's reconciler.
    pub async fn shutdown_all(&self) {
        let _ = self.shutdown_tx.send(true);
        let entries: Vec<_> = self.brands.write().await.drain().map(|(_, e)| e).collect();
        for entry in entries {
            entry.watch.shutdown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bwallet_core::pending::MemoryPendingTopups;
    use bwallet_core::rails::{
        CardCheckout, CheckoutSession, CryptoAddressIssuer, FinalizeOutcome, PersonalTransfer,
        RailError, WireInstructionSource,
    };
    use bwallet_sdk::objects::{CryptoNetwork, WireInstructions};
    use rust_decimal::Decimal;
    use sqlx::postgres::PgPoolOptions;

    struct NoRails;

    #[async_trait]
    impl CryptoAddressIssuer for NoRails {
        async fn issue_address(
            &self,
            _brand_id: Uuid,
            _network: CryptoNetwork,
        ) -> Result<String, RailError> {
            Err(RailError::Rejected("offline".into()))
        }
    }

    #[async_trait]
    impl CardCheckout for NoRails {
        async fn create_checkout(
            &self,
            _brand_id: Uuid,
            _amount: Decimal,
            _return_url: &Url,
        ) -> Result<CheckoutSession, RailError> {
            Err(RailError::Rejected("offline".into()))
        }

        async fn finalize_checkout(
            &self,
            _brand_id: Uuid,
            _amount: Decimal,
            _transaction_id: Uuid,
            _return_url: &Url,
        ) -> Result<FinalizeOutcome, RailError> {
            Err(RailError::Rejected("offline".into()))
        }
    }

    #[async_trait]
    impl WireInstructionSource for NoRails {
        async fn wire_instructions(&self, _brand_id: Uuid) -> Result<WireInstructions, RailError> {
            Err(RailError::Rejected("offline".into()))
        }
    }

    #[async_trait]
    impl PersonalTransfer for NoRails {
        async fn available_balance(&self) -> Result<Decimal, RailError> {
            Ok(Decimal::ZERO)
        }

        async fn execute_transfer(
            &self,
            _brand_id: Uuid,
            _amount: Decimal,
        ) -> Result<(), RailError> {
            Err(RailError::Rejected("offline".into()))
        }
    }

    fn registry(routes: &FeedRoutes) -> BrandRegistry {
        let rails = Arc::new(NoRails);
        // Never connects: nothing here reads the ledger.
        let db = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/bwallet_test")
            .unwrap();
        BrandRegistry::new(
            db,
            PaymentRails {
                crypto: rails.clone(),
                card: rails.clone(),
                wire: rails.clone(),
                personal: rails,
            },
            Arc::new(MemoryPendingTopups::new()),
            routes.clone(),
        )
    }

    async fn brand_count(registry: &BrandRegistry) -> usize {
        registry.brands.read().await.len()
    }

    fn return_url() -> Url {
        Url::parse("https://app.example.com/wallet").unwrap()
    }

    #[tokio::test]
    async fn test_brands_share_one_route_table() {
        let routes = FeedRoutes::new();
        let registry = registry(&routes);
        for n in 0..20 {
            registry.get_or_start(Uuid::from_u128(n), return_url()).await;
        }
        assert_eq!(brand_count(&registry).await, 20);
        assert!(routes.contains(Uuid::from_u128(19)));

        let again = registry.get_or_start(Uuid::from_u128(3), return_url()).await;
        assert_eq!(again.session.lock().await.brand_id(), Uuid::from_u128(3));
        assert_eq!(brand_count(&registry).await, 20);
        registry.shutdown_all().await;
    }

    #[tokio::test]
    async fn test_idle_entries_are_evicted_unless_in_use() {
        let routes = FeedRoutes::new();
        let registry = registry(&routes);
        let idle = Uuid::from_u128(1);
        let held = Uuid::from_u128(2);
        let watched = Uuid::from_u128(3);

        registry.get_or_start(idle, return_url()).await;
        let _held_entry = registry.get_or_start(held, return_url()).await;
        let _notices = registry
            .get_or_start(watched, return_url())
            .await
            .watch
            .subscribe();

        assert_eq!(registry.evict_idle(Duration::from_secs(60)).await, 0);
        assert_eq!(registry.evict_idle(Duration::ZERO).await, 1);

        assert!(!routes.contains(idle));
        assert!(routes.contains(held));
        assert!(routes.contains(watched));
        assert_eq!(brand_count(&registry).await, 2);
        registry.shutdown_all().await;
        assert!(!routes.contains(held));
    }
}
