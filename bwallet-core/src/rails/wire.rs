use std::sync::Arc;

use async_trait::async_trait;
use bwallet_sdk::objects::WireInstructions;
use bwallet_sdk::reference::wire_reference;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{RailError, WireInstructionSource};

/// Receiving bank account shared by every brand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireAccount {
    pub account_name: String,
    pub account_number: String,
    pub routing_number: String,
    pub bank_name: String,
}

/// Wire instructions from configured account data.
///
/// The account sits behind a lock so a config reload can swap it in place.
#[derive(Debug, Clone)]
pub struct StaticWireInstructions {
    account: Arc<RwLock<WireAccount>>,
}

impl StaticWireInstructions {
    pub fn new(account: WireAccount) -> Self {
        Self {
            account: Arc::new(RwLock::new(account)),
        }
    }

    pub async fn replace(&self, account: WireAccount) {
        *self.account.write().await = account;
    }
}

#[async_trait]
impl WireInstructionSource for StaticWireInstructions {
    async fn wire_instructions(&self, brand_id: Uuid) -> Result<WireInstructions, RailError> {
        let account = self.account.read().await;
        Ok(WireInstructions {
            account_name: account.account_name.clone(),
            account_number: account.account_number.clone(),
            routing_number: account.routing_number.clone(),
            bank_name: account.bank_name.clone(),
            reference: wire_reference(brand_id),
        })
    }
}
