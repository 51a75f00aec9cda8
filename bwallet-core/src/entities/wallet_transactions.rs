use crate::entities::{TransactionKind, TransactionStatus};
use crate::framework::DatabaseProcessor;
use bwallet_sdk::objects::{TransactionMetadata, WalletTransaction};
use kanau::processor::Processor;
use rust_decimal::Decimal;
use sqlx::types::Json;
use uuid::Uuid;

/// A row of `brand_wallet_transactions`.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct WalletTransactionRecord {
    pub id: Uuid,
    pub brand_id: Uuid,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub metadata: Json<TransactionMetadata>,
    pub created_at: time::OffsetDateTime,
}

impl From<WalletTransactionRecord> for WalletTransaction {
    fn from(value: WalletTransactionRecord) -> Self {
        WalletTransaction {
            id: value.id,
            brand_id: value.brand_id,
            kind: value.kind.into(),
            amount: value.amount,
            status: value.status.into(),
            metadata: value.metadata.0,
            created_at: value.created_at,
        }
    }
}

pub(crate) const WALLET_TRANSACTION_COLUMNS: &str =
    "id, brand_id, kind, amount, status, metadata, created_at";

#[derive(Debug, Clone)]
/// List a brand's ledger entries, newest first.
pub struct ListBrandWalletTransactions {
    pub brand_id: Uuid,
    pub limit: i64,
}

impl Processor<ListBrandWalletTransactions> for DatabaseProcessor {
    type Output = Vec<WalletTransactionRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListBrandWalletTransactions")]
    async fn process(
        &self,
        query: ListBrandWalletTransactions,
    ) -> Result<Vec<WalletTransactionRecord>, sqlx::Error> {
        let sql = format!(
            "SELECT {WALLET_TRANSACTION_COLUMNS} \
             FROM brand_wallet_transactions \
             WHERE brand_id = $1 \
             ORDER BY created_at DESC \
             LIMIT $2"
        );
        let records = sqlx::query_as::<_, WalletTransactionRecord>(&sql)
            .bind(query.brand_id)
            .bind(query.limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }
}
