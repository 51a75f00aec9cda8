use crate::entities::wallet_transactions::{WALLET_TRANSACTION_COLUMNS, WalletTransactionRecord};
use crate::entities::{TransactionKind, TransactionStatus};
use crate::framework::{DatabaseAccessor, DatabaseProcessor, TransactionProcessor};
use bwallet_sdk::objects::TransactionMetadata;
use kanau::processor::Processor;
use rust_decimal::Decimal;
use sqlx::types::Json;
use uuid::Uuid;

#[derive(Debug, Clone)]
/// Committed balance of a brand wallet.
///
/// Summed from completed ledger rows: credits minus debits. Pending rows and
/// deposit intents never count.
pub struct GetBrandWalletBalance {
    pub brand_id: Uuid,
}

impl Processor<GetBrandWalletBalance> for DatabaseProcessor {
    type Output = Decimal;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetBrandWalletBalance")]
    async fn process(&self, query: GetBrandWalletBalance) -> Result<Decimal, sqlx::Error> {
        let balance: Option<Decimal> = sqlx::query_scalar(
            r#"
            SELECT SUM(
                CASE
                    WHEN kind IN ('crypto_deposit', 'deposit', 'topup', 'transfer_in') THEN amount
                    WHEN kind IN ('transfer_out', 'withdrawal') THEN -amount
                    ELSE 0
                END
            )
            FROM brand_wallet_transactions
            WHERE brand_id = $1 AND status = 'completed'
            "#,
        )
        .bind(query.brand_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(balance.unwrap_or(Decimal::ZERO))
    }
}

#[derive(Debug, Clone)]
/// Balance of an operator's personal wallet.
pub struct GetPersonalBalance {
    pub user_id: Uuid,
}

impl Processor<GetPersonalBalance> for DatabaseProcessor {
    type Output = Decimal;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetPersonalBalance")]
    async fn process(&self, query: GetPersonalBalance) -> Result<Decimal, sqlx::Error> {
        let balance: Option<Decimal> =
            sqlx::query_scalar("SELECT balance FROM personal_wallets WHERE user_id = $1")
                .bind(query.user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(balance.unwrap_or(Decimal::ZERO))
    }
}

#[derive(Debug, Clone)]
/// Move funds from a personal wallet into a brand wallet.
///
/// Runs in one database transaction: the personal row is locked, checked,
/// debited, and a completed `transfer_in` row is written for the brand.
/// Nothing is written when funds are short.
pub struct ExecutePersonalTransfer {
    pub user_id: Uuid,
    pub brand_id: Uuid,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonalTransferOutcome {
    Completed(WalletTransactionRecord),
    InsufficientFunds { available: Decimal },
}

async fn lock_personal_balance(
    db: &mut impl DatabaseAccessor,
    user_id: Uuid,
) -> Result<Decimal, sqlx::Error> {
    let balance: Option<Decimal> =
        sqlx::query_scalar("SELECT balance FROM personal_wallets WHERE user_id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(db.acquire())
            .await?;
    Ok(balance.unwrap_or(Decimal::ZERO))
}

impl Processor<ExecutePersonalTransfer> for DatabaseProcessor {
    type Output = PersonalTransferOutcome;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ExecutePersonalTransfer")]
    async fn process(
        &self,
        transfer: ExecutePersonalTransfer,
    ) -> Result<PersonalTransferOutcome, sqlx::Error> {
        let ExecutePersonalTransfer {
            user_id,
            brand_id,
            amount,
        } = transfer;
        let mut db = TransactionProcessor {
            tx: self.pool.begin().await?,
        };

        let available = lock_personal_balance(&mut db, user_id).await?;
        if available < amount {
            db.tx.rollback().await?;
            return Ok(PersonalTransferOutcome::InsufficientFunds { available });
        }

        sqlx::query(
            "UPDATE personal_wallets SET balance = balance - $2, updated_at = now() WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(amount)
        .execute(db.acquire())
        .await?;

        let sql = format!(
            "INSERT INTO brand_wallet_transactions (brand_id, kind, amount, status, metadata) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {WALLET_TRANSACTION_COLUMNS}"
        );
        let record = sqlx::query_as::<_, WalletTransactionRecord>(&sql)
            .bind(brand_id)
            .bind(TransactionKind::TransferIn)
            .bind(amount)
            .bind(TransactionStatus::Completed)
            .bind(Json(TransactionMetadata::default()))
            .fetch_one(db.acquire())
            .await?;

        db.tx.commit().await?;
        Ok(PersonalTransferOutcome::Completed(record))
    }
}
