//! Remembered card top-ups awaiting a checkout return.
//!
//! When a card checkout is opened the flow records `{amount, transaction_id}`
//! under a per-brand key. The checkout return handler takes the record, which
//! removes it, so a repeated return finds nothing to finalize.

use std::collections::HashMap;
use std::sync::Mutex;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTopup {
    pub amount: Decimal,
    pub transaction_id: Uuid,
}

pub fn pending_topup_key(brand_id: Uuid) -> String {
    format!("pending_topup_{brand_id}")
}

pub trait PendingTopupStore: Send + Sync {
    /// Overwrites any earlier record for the brand.
    fn remember(&self, brand_id: Uuid, topup: PendingTopup);

    /// Remove and return the record for the brand.
    fn take(&self, brand_id: Uuid) -> Option<PendingTopup>;
}

/// Process-local store keeping records as serialized JSON.
#[derive(Debug, Default)]
pub struct MemoryPendingTopups {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryPendingTopups {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PendingTopupStore for MemoryPendingTopups {
    fn remember(&self, brand_id: Uuid, topup: PendingTopup) {
        match serde_json::to_string(&topup) {
            Ok(raw) => {
                self.entries().insert(pending_topup_key(brand_id), raw);
            }
            Err(e) => warn!(brand_id = %brand_id, error = %e, "Failed to encode pending top-up"),
        }
    }

    fn take(&self, brand_id: Uuid) -> Option<PendingTopup> {
        let raw = self.entries().remove(&pending_topup_key(brand_id))?;
        match serde_json::from_str(&raw) {
            Ok(topup) => Some(topup),
            Err(e) => {
                warn!(brand_id = %brand_id, error = %e, "Dropping unreadable pending top-up");
                None
            }
        }
    }
}
