pub mod deposit;
pub mod feed;
pub mod methods;
pub mod rails;
pub mod transactions;
pub mod ws;

pub use deposit::{
    CheckoutReturnOutcome, CheckoutReturnResponse, DepositFlowResponse, DepositStep,
    EnterAmountRequest, FeeQuote, PaymentMethodOption, SelectMethodRequest, SelectNetworkRequest,
    WalletResponse,
};
pub use feed::{FeedOperation, STATUS_FEED_CHANNEL, StatusChangePayload};
pub use methods::{CryptoNetwork, PaymentMethod};
pub use rails::{
    CardTopupRequest, CardTopupResponse, IssueAddressRequest, IssueAddressResponse,
    WireInstructions, WireInstructionsResponse,
};
pub use transactions::{
    PendingDeposit, TransactionKind, TransactionMetadata, TransactionStatus, WalletTransaction,
};
pub use ws::{NoticeLevel, WsCloseCode, WsServerMessage};
