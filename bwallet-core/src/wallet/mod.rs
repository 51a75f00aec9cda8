//! Brand wallet read model.
//!
//! The ledger is the only authority for balances. [`WalletView`] keeps a
//! snapshot of it for one brand and is refreshed explicitly.

pub mod view;

use async_trait::async_trait;
use bwallet_sdk::objects::WalletTransaction;
use kanau::processor::Processor;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::entities::brand_wallets::GetBrandWalletBalance;
use crate::entities::wallet_transactions::ListBrandWalletTransactions;
use crate::framework::DatabaseProcessor;

pub use view::{WalletSnapshot, WalletView};

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Ledger could not be reached
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait WalletLedger: Send + Sync {
    async fn balance(&self, brand_id: Uuid) -> Result<Decimal, LedgerError>;

    /// Most recent entries first.
    async fn transactions(
        &self,
        brand_id: Uuid,
        limit: i64,
    ) -> Result<Vec<WalletTransaction>, LedgerError>;
}

/// Ledger backed by the `brand_wallet_transactions` table.
#[derive(Debug, Clone)]
pub struct PgWalletLedger {
    processor: DatabaseProcessor,
}

impl PgWalletLedger {
    pub fn new(processor: DatabaseProcessor) -> Self {
        Self { processor }
    }
}

#[async_trait]
impl WalletLedger for PgWalletLedger {
    async fn balance(&self, brand_id: Uuid) -> Result<Decimal, LedgerError> {
        Ok(self
            .processor
            .process(GetBrandWalletBalance { brand_id })
            .await?)
    }

    async fn transactions(
        &self,
        brand_id: Uuid,
        limit: i64,
    ) -> Result<Vec<WalletTransaction>, LedgerError> {
        let records = self
            .processor
            .process(ListBrandWalletTransactions { brand_id, limit })
            .await?;
        Ok(records.into_iter().map(Into::into).collect())
    }
}
