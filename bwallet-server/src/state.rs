//! Application state shared across all request handlers.

use crate::brands::{BrandEntry, BrandRegistry};
use crate::config::LoadedConfig;
use crate::config::runtime::SharedConfig;
use bwallet_core::framework::DatabaseProcessor;
use bwallet_core::processors::FeedRoutes;
use bwallet_core::pending::{MemoryPendingTopups, PendingTopupStore};
use bwallet_core::rails::PaymentRails;
use bwallet_core::rails::http::HttpRails;
use bwallet_core::rails::ledger::LedgerPersonalTransfer;
use bwallet_core::rails::wire::StaticWireInstructions;
use sqlx::PgPool;
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Reloadable configuration sections.
    pub config: SharedConfig,
    pub rails: PaymentRails,
    /// Concrete wire source, kept so a reload can swap the account.
    pub wire: StaticWireInstructions,
    pub pending: Arc<dyn PendingTopupStore>,
    pub brands: Arc<BrandRegistry>,
}

impl AppState {
    /// Wire up the rails and the brand registry from loaded configuration.
    ///
    /// `routes` is the table the process-wide status feed delivers into.
    pub fn new(db: PgPool, routes: FeedRoutes, config: &LoadedConfig) -> Self {
        let http = Arc::new(HttpRails::new(
            config.rails.base_url.clone(),
            config.rails.api_key.clone(),
            config.rails.timeout,
        ));
        let wire = StaticWireInstructions::new(config.wire.clone());
        let personal = LedgerPersonalTransfer::new(
            DatabaseProcessor { pool: db.clone() },
            config.operator_user_id,
        );
        let rails = PaymentRails {
            crypto: http.clone(),
            card: http,
            wire: Arc::new(wire.clone()),
            personal: Arc::new(personal),
        };
        let pending: Arc<dyn PendingTopupStore> = Arc::new(MemoryPendingTopups::new());
        let brands = Arc::new(BrandRegistry::new(
            db,
            rails.clone(),
            pending.clone(),
            routes,
        ));

        Self {
            config: config.shared(),
            rails,
            wire,
            pending,
            brands,
        }
    }

    pub async fn return_url(&self) -> Url {
        self.config.return_url.read().await.clone()
    }

    /// The brand's session and wallet watch, started on first use.
    pub async fn brand(&self, brand_id: Uuid) -> Arc<BrandEntry> {
        let return_url = self.return_url().await;
        self.brands.get_or_start(brand_id, return_url).await
    }
}
