//! Event processors for wallet reconciliation.
//!
//! - `StatusFeed`: Listens on the ledger feed, routes `WalletEvent::StatusChanged` by brand
//! - `CheckoutReturnHandler`: Finalizes a card top-up, emits `WalletEvent::CheckoutReturned`
//! - `DepositReconciler`: Receives `WalletEvent`, refreshes the wallet, emits `WalletNotice`
//! - `WalletWatch`: Owns one brand's reconciler and its feed route

pub mod checkout_return;
pub mod reconciler;
pub mod status_feed;
pub mod watch;

pub use checkout_return::{CheckoutReturn, CheckoutReturnHandler};
pub use reconciler::{DepositReconciler, ReconcileOutcome};
pub use status_feed::{FeedRoutes, StatusFeed};
pub use watch::WalletWatch;
