use async_trait::async_trait;
use kanau::processor::Processor;
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use super::{PersonalTransfer, RailError};
use crate::entities::brand_wallets::{
    ExecutePersonalTransfer, GetPersonalBalance, PersonalTransferOutcome,
};
use crate::framework::DatabaseProcessor;

/// Personal transfers settled directly on the ledger database.
#[derive(Debug, Clone)]
pub struct LedgerPersonalTransfer {
    processor: DatabaseProcessor,
    source_user: Uuid,
}

impl LedgerPersonalTransfer {
    /// `source_user` owns the personal wallet transfers draw from.
    pub fn new(processor: DatabaseProcessor, source_user: Uuid) -> Self {
        Self {
            processor,
            source_user,
        }
    }
}

#[async_trait]
impl PersonalTransfer for LedgerPersonalTransfer {
    async fn available_balance(&self) -> Result<Decimal, RailError> {
        let balance = self
            .processor
            .process(GetPersonalBalance {
                user_id: self.source_user,
            })
            .await?;
        Ok(balance)
    }

    async fn execute_transfer(&self, brand_id: Uuid, amount: Decimal) -> Result<(), RailError> {
        let outcome = self
            .processor
            .process(ExecutePersonalTransfer {
                user_id: self.source_user,
                brand_id,
                amount,
            })
            .await?;
        match outcome {
            PersonalTransferOutcome::Completed(record) => {
                info!(
                    brand_id = %brand_id,
                    transaction_id = %record.id,
                    amount = %amount,
                    "Personal transfer completed"
                );
                Ok(())
            }
            PersonalTransferOutcome::InsufficientFunds { available } => {
                Err(RailError::InsufficientFunds { available })
            }
        }
    }
}
