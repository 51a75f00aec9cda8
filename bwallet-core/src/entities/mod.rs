pub mod brand_wallets;
pub mod wallet_transactions;

use bwallet_sdk::objects::{
    TransactionKind as SdkTransactionKind, TransactionStatus as SdkTransactionStatus,
};

/// Ledger transaction kind for database operations.
///
/// This is the sqlx::Type version. For API/DTO use, see `bwallet_sdk::objects::TransactionKind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "snake_case", type_name = "wallet_transaction_kind")]
pub enum TransactionKind {
    CryptoDeposit,
    Deposit,
    Topup,
    TransferIn,
    TransferOut,
    Withdrawal,
    DepositIntent,
}

impl From<TransactionKind> for SdkTransactionKind {
    fn from(value: TransactionKind) -> Self {
        match value {
            TransactionKind::CryptoDeposit => SdkTransactionKind::CryptoDeposit,
            TransactionKind::Deposit => SdkTransactionKind::Deposit,
            TransactionKind::Topup => SdkTransactionKind::Topup,
            TransactionKind::TransferIn => SdkTransactionKind::TransferIn,
            TransactionKind::TransferOut => SdkTransactionKind::TransferOut,
            TransactionKind::Withdrawal => SdkTransactionKind::Withdrawal,
            TransactionKind::DepositIntent => SdkTransactionKind::DepositIntent,
        }
    }
}

impl From<SdkTransactionKind> for TransactionKind {
    fn from(value: SdkTransactionKind) -> Self {
        match value {
            SdkTransactionKind::CryptoDeposit => TransactionKind::CryptoDeposit,
            SdkTransactionKind::Deposit => TransactionKind::Deposit,
            SdkTransactionKind::Topup => TransactionKind::Topup,
            SdkTransactionKind::TransferIn => TransactionKind::TransferIn,
            SdkTransactionKind::TransferOut => TransactionKind::TransferOut,
            SdkTransactionKind::Withdrawal => TransactionKind::Withdrawal,
            SdkTransactionKind::DepositIntent => TransactionKind::DepositIntent,
        }
    }
}

/// Ledger transaction status for database operations.
///
/// This is the sqlx::Type version. For API/DTO use, see `bwallet_sdk::objects::TransactionStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "wallet_transaction_status")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl From<TransactionStatus> for SdkTransactionStatus {
    fn from(value: TransactionStatus) -> Self {
        match value {
            TransactionStatus::Pending => SdkTransactionStatus::Pending,
            TransactionStatus::Completed => SdkTransactionStatus::Completed,
            TransactionStatus::Failed => SdkTransactionStatus::Failed,
        }
    }
}

impl From<SdkTransactionStatus> for TransactionStatus {
    fn from(value: SdkTransactionStatus) -> Self {
        match value {
            SdkTransactionStatus::Pending => TransactionStatus::Pending,
            SdkTransactionStatus::Completed => TransactionStatus::Completed,
            SdkTransactionStatus::Failed => TransactionStatus::Failed,
        }
    }
}
