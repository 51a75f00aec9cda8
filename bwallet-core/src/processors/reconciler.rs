//! DepositReconciler processor.
//!
//! The DepositReconciler is responsible for:
//! - Receiving `WalletEvent`s for one brand
//! - Refreshing the brand's `WalletView` from the ledger
//! - Emitting a `WalletNotice` per confirmed, received, or failed deposit
//! - Handling each (transaction, status) transition at most once
//!
//! It never applies amounts itself. A duplicate or reordered event can only
//! cause an extra ledger read.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use bwallet_sdk::objects::{CheckoutReturnOutcome, FeedOperation, TransactionStatus};
use kanau::processor::Processor;
use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::events::{
    ReconciliationError, StatusChange, WalletEvent, WalletEventReceiver, WalletNotice,
    WalletNoticeSender,
};
use crate::wallet::WalletView;

/// How many handled transitions are remembered for deduplication.
const SEEN_CAPACITY: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The wallet was re-read from the ledger.
    Refreshed,
    /// This transition was already handled.
    Duplicate,
    /// Nothing in the event affects the wallet.
    Ignored,
}

#[derive(Debug, Default)]
struct SeenTransitions {
    set: HashSet<(Uuid, TransactionStatus)>,
    order: VecDeque<(Uuid, TransactionStatus)>,
}

impl SeenTransitions {
    fn insert(&mut self, key: (Uuid, TransactionStatus)) -> bool {
        if !self.set.insert(key) {
            return false;
        }
        self.order.push_back(key);
        while self.order.len() > SEEN_CAPACITY {
            if let Some(oldest) = self.order.pop_front() {
                self.set.remove(&oldest);
            }
        }
        true
    }

    fn forget(&mut self, key: &(Uuid, TransactionStatus)) {
        if self.set.remove(key) {
            self.order.retain(|k| k != key);
        }
    }
}

/// Reconciles asynchronous deposit confirmations into a brand's wallet view.
pub struct DepositReconciler {
    view: Arc<WalletView>,
    notices: WalletNoticeSender,
    seen: Mutex<SeenTransitions>,
    events_rx: WalletEventReceiver,
    shutdown_rx: watch::Receiver<bool>,
}

impl DepositReconciler {
    /// Create a new DepositReconciler.
    ///
    /// # Arguments
    ///
    /// * `view` - Wallet read model to refresh
    /// * `notices` - Broadcast sender for user-visible notices
    /// * `events_rx` - Receiver for WalletEvent events
    /// * `shutdown_rx` - Receiver for shutdown signal
    pub fn new(
        view: Arc<WalletView>,
        notices: WalletNoticeSender,
        events_rx: WalletEventReceiver,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            view,
            notices,
            seen: Mutex::new(SeenTransitions::default()),
            events_rx,
            shutdown_rx,
        }
    }

    /// Run the DepositReconciler.
    pub async fn run(mut self) {
        let brand_id = self.view.brand_id();
        info!(brand_id = %brand_id, "DepositReconciler started");

        loop {
            tokio::select! {
                biased;

                // Check for shutdown
                _ = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        info!(brand_id = %brand_id, "DepositReconciler received shutdown signal");
                        break;
                    }
                }

                // Receive WalletEvent events
                Some(event) = self.events_rx.recv() => {
                    debug!(brand_id = %brand_id, event = ?event, "Received WalletEvent");

                    match self.process(event).await {
                        Ok(outcome) => debug!(brand_id = %brand_id, outcome = ?outcome, "WalletEvent handled"),
                        Err(e) => error!(brand_id = %brand_id, error = %e, "Failed to reconcile WalletEvent"),
                    }
                }

                else => {
                    info!(brand_id = %brand_id, "WalletEvent channel closed");
                    break;
                }
            }
        }

        info!(brand_id = %brand_id, "DepositReconciler shutdown complete");
    }

    fn seen(&self) -> std::sync::MutexGuard<'_, SeenTransitions> {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn notify(&self, notice: WalletNotice) {
        // No subscriber is fine; the refresh already happened.
        let _ = self.notices.send(notice);
    }

    async fn on_status_change(
        &self,
        change: StatusChange,
    ) -> Result<ReconcileOutcome, ReconciliationError> {
        let brand_id = self.view.brand_id();
        if change.brand_id != brand_id {
            return Err(ReconciliationError::ForeignBrand {
                expected: brand_id,
                got: change.brand_id,
            });
        }

        let key = change.dedupe_key();
        if !self.seen().insert(key) {
            debug!(brand_id = %brand_id, transaction_id = %change.id, status = %change.status, "Duplicate status change");
            return Ok(ReconcileOutcome::Duplicate);
        }

        let notice = if change.just_completed() {
            change.kind.is_deposit().then(|| {
                let verb = match change.op {
                    FeedOperation::Insert => "received",
                    FeedOperation::Update => "confirmed",
                };
                WalletNotice::success(format!(
                    "{} of ${:.2} {verb}!",
                    change.kind.confirmation_label(),
                    change.amount
                ))
                .for_transaction(&change)
            })
        } else if change.just_failed() {
            change.kind.is_deposit().then(|| {
                WalletNotice::error(format!(
                    "{} of ${:.2} failed.",
                    change.kind.confirmation_label(),
                    change.amount
                ))
                .for_transaction(&change)
            })
        } else if change.op == FeedOperation::Insert {
            // New pending row; show it in the pending list.
            None
        } else {
            return Ok(ReconcileOutcome::Ignored);
        };

        if let Err(e) = self.view.refresh().await {
            self.seen().forget(&key);
            return Err(e.into());
        }
        if let Some(notice) = notice {
            info!(brand_id = %brand_id, transaction_id = %change.id, status = %change.status, "Deposit reconciled");
            self.notify(notice);
        }
        Ok(ReconcileOutcome::Refreshed)
    }

    async fn on_checkout_return(
        &self,
        outcome: CheckoutReturnOutcome,
        amount: Option<Decimal>,
    ) -> Result<ReconcileOutcome, ReconciliationError> {
        let notice = match (outcome, amount) {
            (CheckoutReturnOutcome::NotACheckoutReturn, _) => {
                return Ok(ReconcileOutcome::Ignored);
            }
            (CheckoutReturnOutcome::FinalizeFailed, _) => {
                self.notify(WalletNotice::error(
                    "Could not finalize top-up. Please try again.",
                ));
                return Ok(ReconcileOutcome::Ignored);
            }
            (CheckoutReturnOutcome::FinalizeError, _) => {
                self.notify(WalletNotice::error("Failed to finalize top-up."));
                return Ok(ReconcileOutcome::Ignored);
            }
            (CheckoutReturnOutcome::Finalized, Some(amount)) => {
                WalletNotice::success(format!("Added ${amount:.2} to your wallet!"))
            }
            (CheckoutReturnOutcome::Finalized, None) | (CheckoutReturnOutcome::Completed, _) => {
                WalletNotice::success("Checkout completed.")
            }
        };
        self.view.refresh().await?;
        self.notify(notice);
        Ok(ReconcileOutcome::Refreshed)
    }
}

impl Processor<WalletEvent> for DepositReconciler {
    type Output = ReconcileOutcome;
    type Error = ReconciliationError;

    async fn process(&self, event: WalletEvent) -> Result<ReconcileOutcome, ReconciliationError> {
        match event {
            WalletEvent::StatusChanged(change) => self.on_status_change(change).await,
            WalletEvent::TransferCompleted { amount } => {
                self.view.refresh().await?;
                self.notify(WalletNotice::success(format!(
                    "Transferred ${amount:.2} to your brand wallet"
                )));
                Ok(ReconcileOutcome::Refreshed)
            }
            WalletEvent::CheckoutReturned { outcome, amount } => {
                if outcome.is_failure() {
                    warn!(brand_id = %self.view.brand_id(), "Card top-up was not finalized");
                }
                self.on_checkout_return(outcome, amount).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{wallet_event_channel, wallet_notice_channel};
    use crate::wallet::{LedgerError, WalletLedger};
    use async_trait::async_trait;
    use bwallet_sdk::objects::{NoticeLevel, TransactionKind, WalletTransaction};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    const BRAND: Uuid = Uuid::from_u128(0xB4A2D);

    #[derive(Default)]
    struct CountingLedger {
        reads: AtomicUsize,
        down: AtomicBool,
    }

    #[async_trait]
    impl WalletLedger for CountingLedger {
        async fn balance(&self, _brand_id: Uuid) -> Result<Decimal, LedgerError> {
            if self.down.load(Ordering::SeqCst) {
                return Err(LedgerError::Unavailable("down".into()));
            }
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(Decimal::new(140, 0))
        }

        async fn transactions(
            &self,
            _brand_id: Uuid,
            _limit: i64,
        ) -> Result<Vec<WalletTransaction>, LedgerError> {
            Ok(Vec::new())
        }
    }

    struct Harness {
        reconciler: DepositReconciler,
        ledger: Arc<CountingLedger>,
        view: Arc<WalletView>,
        notices: crate::events::WalletNoticeReceiver,
    }

    fn harness() -> Harness {
        let ledger = Arc::new(CountingLedger::default());
        let view = Arc::new(WalletView::new(BRAND, ledger.clone()));
        let (notice_tx, notices) = wallet_notice_channel();
        let (_events_tx, events_rx) = wallet_event_channel();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        Harness {
            reconciler: DepositReconciler::new(view.clone(), notice_tx, events_rx, shutdown_rx),
            ledger,
            view,
            notices,
        }
    }

    fn change(op: FeedOperation, status: TransactionStatus) -> WalletEvent {
        WalletEvent::StatusChanged(StatusChange {
            op,
            id: Uuid::from_u128(42),
            brand_id: BRAND,
            kind: TransactionKind::CryptoDeposit,
            amount: Decimal::new(2550, 2),
            status,
            old_status: match op {
                FeedOperation::Insert => None,
                FeedOperation::Update => Some(TransactionStatus::Pending),
            },
        })
    }

    #[tokio::test]
    async fn test_duplicate_event_refreshes_once() {
        let mut h = harness();
        let event = change(FeedOperation::Update, TransactionStatus::Completed);

        let first = h.reconciler.process(event.clone()).await.unwrap();
        let second = h.reconciler.process(event).await.unwrap();

        assert_eq!(first, ReconcileOutcome::Refreshed);
        assert_eq!(second, ReconcileOutcome::Duplicate);
        assert_eq!(h.view.refresh_count(), 1);
        let notice = h.notices.try_recv().unwrap();
        assert_eq!(notice.message, "Crypto deposit of $25.50 confirmed!");
        assert!(h.notices.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_insert_completed_takes_the_confirmation_path() {
        let mut h = harness();
        let outcome = h
            .reconciler
            .process(change(FeedOperation::Insert, TransactionStatus::Completed))
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Refreshed);
        assert_eq!(h.view.refresh_count(), 1);
        let notice = h.notices.try_recv().unwrap();
        assert_eq!(notice.level, NoticeLevel::Success);
        assert_eq!(notice.message, "Crypto deposit of $25.50 received!");
        assert_eq!(notice.transaction_id, Some(Uuid::from_u128(42)));

        // A late update for the same transition is a duplicate.
        let late = h
            .reconciler
            .process(change(FeedOperation::Update, TransactionStatus::Completed))
            .await
            .unwrap();
        assert_eq!(late, ReconcileOutcome::Duplicate);
    }

    #[tokio::test]
    async fn test_pending_insert_refreshes_without_notice() {
        let mut h = harness();
        let outcome = h
            .reconciler
            .process(change(FeedOperation::Insert, TransactionStatus::Pending))
            .await
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::Refreshed);
        assert!(h.notices.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_failed_deposit_notifies_without_retry() {
        let mut h = harness();
        h.reconciler
            .process(change(FeedOperation::Update, TransactionStatus::Failed))
            .await
            .unwrap();
        let notice = h.notices.try_recv().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(h.ledger.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_foreign_brand_is_rejected() {
        let h = harness();
        let WalletEvent::StatusChanged(mut foreign) =
            change(FeedOperation::Update, TransactionStatus::Completed)
        else {
            unreachable!()
        };
        foreign.brand_id = Uuid::from_u128(7);
        let err = h
            .reconciler
            .process(WalletEvent::StatusChanged(foreign))
            .await
            .unwrap_err();
        assert!(matches!(err, ReconciliationError::ForeignBrand { .. }));
        assert_eq!(h.view.refresh_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_refresh_allows_redelivery() {
        let mut h = harness();
        let event = change(FeedOperation::Update, TransactionStatus::Completed);
        h.ledger.down.store(true, Ordering::SeqCst);
        assert!(h.reconciler.process(event.clone()).await.is_err());
        assert!(h.notices.try_recv().is_err());

        h.ledger.down.store(false, Ordering::SeqCst);
        let outcome = h.reconciler.process(event).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Refreshed);
        assert!(h.notices.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_checkout_return_messages() {
        let mut h = harness();
        h.reconciler
            .process(WalletEvent::CheckoutReturned {
                outcome: CheckoutReturnOutcome::Finalized,
                amount: Some(Decimal::new(100, 0)),
            })
            .await
            .unwrap();
        assert_eq!(
            h.notices.try_recv().unwrap().message,
            "Added $100.00 to your wallet!"
        );

        h.reconciler
            .process(WalletEvent::CheckoutReturned {
                outcome: CheckoutReturnOutcome::Completed,
                amount: None,
            })
            .await
            .unwrap();
        assert_eq!(h.notices.try_recv().unwrap().message, "Checkout completed.");

        let outcome = h
            .reconciler
            .process(WalletEvent::CheckoutReturned {
                outcome: CheckoutReturnOutcome::FinalizeFailed,
                amount: Some(Decimal::new(100, 0)),
            })
            .await
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::Ignored);
        assert_eq!(
            h.notices.try_recv().unwrap().message,
            "Could not finalize top-up. Please try again."
        );

        h.reconciler
            .process(WalletEvent::CheckoutReturned {
                outcome: CheckoutReturnOutcome::FinalizeError,
                amount: Some(Decimal::new(100, 0)),
            })
            .await
            .unwrap();
        assert_eq!(
            h.notices.try_recv().unwrap().message,
            "Failed to finalize top-up."
        );
        assert_eq!(h.view.refresh_count(), 2);
    }

    #[tokio::test]
    async fn test_run_loop_stops_on_shutdown() {
        let ledger = Arc::new(CountingLedger::default());
        let view = Arc::new(WalletView::new(BRAND, ledger));
        let (notice_tx, mut notices) = wallet_notice_channel();
        let (events_tx, events_rx) = wallet_event_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(
            DepositReconciler::new(view.clone(), notice_tx, events_rx, shutdown_rx).run(),
        );

        events_tx
            .send(WalletEvent::TransferCompleted {
                amount: Decimal::new(20, 0),
            })
            .await
            .unwrap();
        let notice = notices.recv().await.unwrap();
        assert_eq!(notice.message, "Transferred $20.00 to your brand wallet");

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
        assert_eq!(view.refresh_count(), 1);
    }
}
