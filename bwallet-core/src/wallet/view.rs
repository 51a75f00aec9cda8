use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bwallet_sdk::objects::{
    PendingDeposit, TransactionKind, TransactionStatus, WalletResponse, WalletTransaction,
};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{LedgerError, WalletLedger};
use crate::utils::elapsed::elapsed_label;

/// What the ledger said at the last refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletSnapshot {
    pub balance: Decimal,
    /// Newest first.
    pub transactions: Vec<WalletTransaction>,
    pub refreshed_at: Option<time::OffsetDateTime>,
}

impl WalletSnapshot {
    /// Deposits still waiting on their rail. These never expire.
    pub fn pending_deposits(&self, now: time::OffsetDateTime) -> Vec<PendingDeposit> {
        self.transactions
            .iter()
            .filter(|tx| tx.status == TransactionStatus::Pending && tx.kind.is_deposit())
            .map(|tx| PendingDeposit {
                id: tx.id,
                kind: tx.kind,
                amount: tx.amount,
                network: tx.metadata.network,
                external_reference: tx.metadata.external_reference.clone(),
                tx_signature: tx.metadata.tx_signature.clone(),
                explorer_url: tx
                    .metadata
                    .network
                    .zip(tx.metadata.tx_signature.as_deref())
                    .map(|(network, sig)| format!("{}{sig}", network.explorer_tx_url())),
                created_at: tx.created_at,
                elapsed: elapsed_label(tx.created_at, now),
            })
            .collect()
    }

    /// Settled entries plus pending ones, minus announced-but-unsent wires.
    pub fn history(&self) -> Vec<WalletTransaction> {
        self.transactions
            .iter()
            .filter(|tx| match tx.status {
                TransactionStatus::Completed => true,
                TransactionStatus::Pending => tx.kind != TransactionKind::DepositIntent,
                TransactionStatus::Failed => false,
            })
            .cloned()
            .collect()
    }
}

/// Snapshot tagged with the sequence number of the refresh that read it.
#[derive(Default)]
struct Current {
    seq: u64,
    snapshot: WalletSnapshot,
}

/// Wallet read model for one brand.
pub struct WalletView {
    brand_id: Uuid,
    ledger: Arc<dyn WalletLedger>,
    current: RwLock<Current>,
    started: AtomicU64,
    refreshes: AtomicU64,
}

impl WalletView {
    pub const HISTORY_LIMIT: i64 = 100;

    pub fn new(brand_id: Uuid, ledger: Arc<dyn WalletLedger>) -> Self {
        Self {
            brand_id,
            ledger,
            current: RwLock::new(Current::default()),
            started: AtomicU64::new(0),
            refreshes: AtomicU64::new(0),
        }
    }

    pub fn brand_id(&self) -> Uuid {
        self.brand_id
    }

    /// Re-read balance and history from the ledger.
    ///
    /// A read that finishes after a later-started one is discarded, and the
    /// newer snapshot is returned instead.
    pub async fn refresh(&self) -> Result<WalletSnapshot, LedgerError> {
        let seq = self.started.fetch_add(1, Ordering::Relaxed) + 1;
        let (balance, transactions) = tokio::try_join!(
            self.ledger.balance(self.brand_id),
            self.ledger
                .transactions(self.brand_id, Self::HISTORY_LIMIT)
        )?;
        let fresh = WalletSnapshot {
            balance,
            transactions,
            refreshed_at: Some(time::OffsetDateTime::now_utc()),
        };
        let count = self.refreshes.fetch_add(1, Ordering::Relaxed) + 1;

        let mut current = self.current.write().await;
        if seq < current.seq {
            debug!(brand_id = %self.brand_id, seq, latest = current.seq, "Discarding stale wallet read");
            return Ok(current.snapshot.clone());
        }
        current.seq = seq;
        current.snapshot = fresh.clone();
        debug!(brand_id = %self.brand_id, balance = %balance, refreshes = count, "Wallet refreshed");
        Ok(fresh)
    }

    /// Balance straight from the ledger, or the last known one if the read
    /// fails.
    pub async fn fresh_balance(&self) -> Decimal {
        match self.refresh().await {
            Ok(snapshot) => snapshot.balance,
            Err(e) => {
                warn!(brand_id = %self.brand_id, error = %e, "Serving cached balance");
                self.current.read().await.snapshot.balance
            }
        }
    }

    pub async fn snapshot(&self) -> WalletSnapshot {
        self.current.read().await.snapshot.clone()
    }

    /// Number of completed ledger reads, stale ones included.
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::Relaxed)
    }

    pub async fn to_response(&self, now: time::OffsetDateTime) -> WalletResponse {
        let current = self.current.read().await;
        let snapshot = &current.snapshot;
        WalletResponse {
            brand_id: self.brand_id,
            balance: snapshot.balance,
            pending_deposits: snapshot.pending_deposits(now),
            history: snapshot.history(),
            refreshed_at: snapshot.refreshed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bwallet_sdk::objects::{CryptoNetwork, TransactionMetadata};

    fn tx(n: u128, kind: TransactionKind, status: TransactionStatus) -> WalletTransaction {
        WalletTransaction {
            id: Uuid::from_u128(n),
            brand_id: Uuid::from_u128(1),
            kind,
            amount: Decimal::new(25, 0),
            status,
            metadata: TransactionMetadata {
                network: Some(CryptoNetwork::Solana),
                ..Default::default()
            },
            created_at: time::OffsetDateTime::from_unix_timestamp(1_767_607_200).unwrap(),
        }
    }

    struct FixedLedger(Vec<WalletTransaction>);

    #[async_trait]
    impl WalletLedger for FixedLedger {
        async fn balance(&self, _brand_id: Uuid) -> Result<Decimal, LedgerError> {
            Ok(Decimal::new(125, 0))
        }

        async fn transactions(
            &self,
            _brand_id: Uuid,
            _limit: i64,
        ) -> Result<Vec<WalletTransaction>, LedgerError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_pending_deposits_filter() {
        let snapshot = WalletSnapshot {
            transactions: vec![
                tx(1, TransactionKind::CryptoDeposit, TransactionStatus::Pending),
                tx(2, TransactionKind::Topup, TransactionStatus::Completed),
                tx(3, TransactionKind::TransferIn, TransactionStatus::Pending),
                tx(4, TransactionKind::DepositIntent, TransactionStatus::Pending),
                tx(5, TransactionKind::Deposit, TransactionStatus::Pending),
            ],
            ..Default::default()
        };
        let now = time::OffsetDateTime::from_unix_timestamp(1_767_607_200 + 600).unwrap();
        let pending = snapshot.pending_deposits(now);
        let ids: Vec<_> = pending.iter().map(|p| p.id.as_u128()).collect();
        assert_eq!(ids, vec![1, 5]);
        assert_eq!(pending[0].elapsed, "10 min ago");
        assert_eq!(pending[0].network, Some(CryptoNetwork::Solana));
        assert_eq!(pending[0].explorer_url, None);
    }

    #[test]
    fn test_pending_deposit_explorer_link() {
        let mut deposit = tx(1, TransactionKind::CryptoDeposit, TransactionStatus::Pending);
        deposit.metadata.tx_signature = Some("5hQx".into());
        let snapshot = WalletSnapshot {
            transactions: vec![deposit],
            ..Default::default()
        };
        let pending = snapshot.pending_deposits(time::OffsetDateTime::now_utc());
        assert_eq!(
            pending[0].explorer_url.as_deref(),
            Some("https://solscan.io/tx/5hQx")
        );
    }

    #[test]
    fn test_history_skips_intents_and_failures() {
        let snapshot = WalletSnapshot {
            transactions: vec![
                tx(1, TransactionKind::CryptoDeposit, TransactionStatus::Pending),
                tx(2, TransactionKind::Topup, TransactionStatus::Completed),
                tx(3, TransactionKind::DepositIntent, TransactionStatus::Pending),
                tx(4, TransactionKind::Topup, TransactionStatus::Failed),
            ],
            ..Default::default()
        };
        let ids: Vec<_> = snapshot.history().iter().map(|t| t.id.as_u128()).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_refresh_reads_ledger() {
        let view = WalletView::new(
            Uuid::from_u128(1),
            Arc::new(FixedLedger(vec![tx(
                1,
                TransactionKind::Topup,
                TransactionStatus::Completed,
            )])),
        );
        assert_eq!(view.snapshot().await, WalletSnapshot::default());
        let snapshot = view.refresh().await.unwrap();
        assert_eq!(snapshot.balance, Decimal::new(125, 0));
        assert_eq!(view.refresh_count(), 1);
        let response = view.to_response(time::OffsetDateTime::now_utc()).await;
        assert_eq!(response.history.len(), 1);
        assert!(response.refreshed_at.is_some());
    }

    /// First balance read parks until released; later reads answer at once.
    #[derive(Default)]
    struct SlowFirstLedger {
        calls: AtomicU64,
        entered: tokio::sync::Notify,
        release: tokio::sync::Notify,
    }

    #[async_trait]
    impl WalletLedger for SlowFirstLedger {
        async fn balance(&self, _brand_id: Uuid) -> Result<Decimal, LedgerError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                self.entered.notify_one();
                self.release.notified().await;
                Ok(Decimal::new(100, 0))
            } else {
                Ok(Decimal::new(140, 0))
            }
        }

        async fn transactions(
            &self,
            _brand_id: Uuid,
            _limit: i64,
        ) -> Result<Vec<WalletTransaction>, LedgerError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_fresh_balance_reads_ledger_on_cold_view() {
        let view = WalletView::new(Uuid::from_u128(1), Arc::new(FixedLedger(Vec::new())));
        assert_eq!(view.snapshot().await.balance, Decimal::ZERO);
        assert_eq!(view.fresh_balance().await, Decimal::new(125, 0));
        assert_eq!(view.refresh_count(), 1);
    }

    #[tokio::test]
    async fn test_late_stale_read_does_not_overwrite_newer_balance() {
        let ledger = Arc::new(SlowFirstLedger::default());
        let view = Arc::new(WalletView::new(Uuid::from_u128(1), ledger.clone()));

        let slow = tokio::spawn({
            let view = view.clone();
            async move { view.refresh().await }
        });
        ledger.entered.notified().await;

        let fresh = view.refresh().await.unwrap();
        assert_eq!(fresh.balance, Decimal::new(140, 0));

        ledger.release.notify_one();
        let late = slow.await.unwrap().unwrap();
        assert_eq!(late.balance, Decimal::new(140, 0));
        assert_eq!(view.snapshot().await.balance, Decimal::new(140, 0));
        assert_eq!(view.refresh_count(), 2);
    }
}
