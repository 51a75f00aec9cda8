//! A brand's deposit flow bound to its payment rails.
//!
//! Rail calls run in two phases so the caller never holds the session across
//! network I/O: `begin_*` validates, marks the flow loading, and hands back a
//! [`RailTicket`]; the ticket is executed without the session; `complete`
//! applies the result. Every reset or method switch bumps the session epoch,
//! and a ticket from an older epoch is discarded on completion.

use std::collections::HashMap;
use std::sync::Arc;

use bwallet_sdk::objects::{
    CryptoNetwork, DepositFlowResponse, DepositStep, PaymentMethod, PaymentMethodOption,
    WireInstructions,
};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use super::DepositFlow;
use crate::fees::{fee_label, fees};
use crate::pending::{PendingTopup, PendingTopupStore};
use crate::rails::{CheckoutSession, PaymentRails, RailError};

/// Input rejected before any rail is called.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("select a payment method first")]
    NoMethod,

    #[error("amount must be greater than zero")]
    NonPositiveAmount,

    #[error("amount is too large")]
    AmountTooLarge,

    #[error("amount ${requested:.2} exceeds available balance of ${available:.2}")]
    ExceedsBalance {
        requested: Decimal,
        available: Decimal,
    },

    #[error("{method} deposits do not take an amount")]
    AmountNotAccepted { method: PaymentMethod },

    #[error("{method} deposits do not take a network")]
    NetworkNotAccepted { method: PaymentMethod },

    #[error("cannot {action} on the {step} step")]
    WrongStep {
        action: &'static str,
        step: DepositStep,
    },

    #[error("another request for this deposit is still in progress")]
    Busy,

    #[error("{method} deposits have nothing to confirm")]
    NotConfirmable { method: PaymentMethod },
}

#[derive(Debug, Error)]
pub enum DepositError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Rail(#[from] RailError),

    /// The flow was reset or switched while the rail call was in flight.
    #[error("deposit flow changed before the request finished")]
    Abandoned,
}

#[derive(Debug, Clone)]
enum RailCall {
    IssueAddress { network: CryptoNetwork },
    OpenCheckout { amount: Decimal },
    PersonalTransfer { amount: Decimal },
}

/// A rail call prepared by the session, run outside of it.
#[derive(Debug, Clone)]
pub struct RailTicket {
    epoch: u64,
    brand_id: Uuid,
    call: RailCall,
    rails: PaymentRails,
    return_url: Url,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RailResult {
    Address {
        network: CryptoNetwork,
        address: String,
    },
    Checkout {
        session: CheckoutSession,
        amount: Decimal,
    },
    Transferred {
        amount: Decimal,
    },
}

impl RailTicket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub async fn execute(&self) -> Result<RailResult, RailError> {
        match self.call {
            RailCall::IssueAddress { network } => {
                let address = self
                    .rails
                    .crypto
                    .issue_address(self.brand_id, network)
                    .await?;
                Ok(RailResult::Address { network, address })
            }
            RailCall::OpenCheckout { amount } => {
                let session = self
                    .rails
                    .card
                    .create_checkout(self.brand_id, amount, &self.return_url)
                    .await?;
                Ok(RailResult::Checkout { session, amount })
            }
            RailCall::PersonalTransfer { amount } => {
                self.rails
                    .personal
                    .execute_transfer(self.brand_id, amount)
                    .await?;
                Ok(RailResult::Transferred { amount })
            }
        }
    }
}

pub enum NetworkSelection {
    /// An address was already issued for this network.
    Cached(String),
    Issue(RailTicket),
}

pub struct DepositSession {
    brand_id: Uuid,
    flow: DepositFlow,
    rails: PaymentRails,
    pending: Arc<dyn PendingTopupStore>,
    return_url: Url,
    source_balance: Decimal,
    addresses: HashMap<CryptoNetwork, String>,
    checkout: Option<CheckoutSession>,
    epoch: u64,
}

impl DepositSession {
    pub fn new(
        brand_id: Uuid,
        rails: PaymentRails,
        pending: Arc<dyn PendingTopupStore>,
        return_url: Url,
    ) -> Self {
        Self {
            brand_id,
            flow: DepositFlow::new(),
            rails,
            pending,
            return_url,
            source_balance: Decimal::ZERO,
            addresses: HashMap::new(),
            checkout: None,
            epoch: 0,
        }
    }

    pub fn brand_id(&self) -> Uuid {
        self.brand_id
    }

    pub fn flow(&self) -> &DepositFlow {
        &self.flow
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn source_balance(&self) -> Decimal {
        self.source_balance
    }

    pub fn set_source_balance(&mut self, balance: Decimal) {
        self.source_balance = balance;
    }

    pub fn set_return_url(&mut self, return_url: Url) {
        self.return_url = return_url;
    }

    /// Method picker entries. Personal is offered only with a positive balance.
    pub fn method_options(&self) -> Vec<PaymentMethodOption> {
        PaymentMethod::ALL
            .into_iter()
            .map(|method| PaymentMethodOption {
                method,
                title: method.title().to_string(),
                description: method.description().to_string(),
                fee_label: fee_label(method),
                estimated_time: method.estimated_time().map(str::to_string),
                available: method != PaymentMethod::Personal
                    || self.source_balance > Decimal::ZERO,
            })
            .collect()
    }

    fn bump_epoch(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
    }

    pub fn select_method(&mut self, method: PaymentMethod) {
        self.bump_epoch();
        self.checkout = None;
        self.flow.select_method(method);
        debug!(brand_id = %self.brand_id, method = %method, "Deposit method selected");
    }

    pub fn prev_step(&mut self) {
        self.bump_epoch();
        self.flow.prev_step();
        if self.flow.method().is_none() {
            self.clear();
        }
    }

    pub fn reset(&mut self) {
        self.bump_epoch();
        self.flow.reset();
        self.clear();
    }

    /// Reset only if nothing touched the flow since `epoch` was read.
    pub fn reset_if_unchanged(&mut self, epoch: u64) -> bool {
        if self.epoch != epoch {
            return false;
        }
        self.reset();
        true
    }

    fn clear(&mut self) {
        self.addresses.clear();
        self.checkout = None;
    }

    pub fn validate_amount(&self, amount: Decimal) -> Result<(), ValidationError> {
        let method = self.flow.method().ok_or(ValidationError::NoMethod)?;
        if amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount);
        }
        if fees(method, amount).is_none() {
            return Err(ValidationError::AmountTooLarge);
        }
        if method == PaymentMethod::Personal && amount > self.source_balance {
            return Err(ValidationError::ExceedsBalance {
                requested: amount,
                available: self.source_balance,
            });
        }
        Ok(())
    }

    fn expect_step(&self, action: &'static str, step: DepositStep) -> Result<(), ValidationError> {
        if self.flow.step() != step {
            return Err(ValidationError::WrongStep {
                action,
                step: self.flow.step(),
            });
        }
        if self.flow.is_loading() {
            return Err(ValidationError::Busy);
        }
        Ok(())
    }

    /// Store `amount` and move to confirm if it is acceptable.
    ///
    /// A rejected amount is still stored so the form keeps what was typed.
    pub fn enter_amount(&mut self, amount: Decimal) -> Result<(), ValidationError> {
        let method = self.flow.method().ok_or(ValidationError::NoMethod)?;
        if !matches!(method, PaymentMethod::Card | PaymentMethod::Personal) {
            return Err(ValidationError::AmountNotAccepted { method });
        }
        self.expect_step("enter an amount", DepositStep::Amount)?;
        self.flow.set_amount(amount);
        if let Err(e) = self.validate_amount(amount) {
            self.flow.set_error(Some(e.to_string()));
            return Err(e);
        }
        self.flow.set_error(None);
        self.flow.next_step();
        Ok(())
    }

    pub fn begin_network(
        &mut self,
        network: CryptoNetwork,
    ) -> Result<NetworkSelection, ValidationError> {
        let method = self.flow.method().ok_or(ValidationError::NoMethod)?;
        if method != PaymentMethod::Crypto {
            return Err(ValidationError::NetworkNotAccepted { method });
        }
        self.expect_step("choose a network", DepositStep::Network)?;
        self.flow.set_network(network);

        if let Some(address) = self.addresses.get(&network) {
            self.flow.next_step();
            return Ok(NetworkSelection::Cached(address.clone()));
        }
        self.flow.set_loading(true);
        Ok(NetworkSelection::Issue(
            self.ticket(RailCall::IssueAddress { network }),
        ))
    }

    pub fn begin_confirm(&mut self) -> Result<RailTicket, ValidationError> {
        let method = self.flow.method().ok_or(ValidationError::NoMethod)?;
        let amount = self.flow.amount();
        let call = match method {
            PaymentMethod::Card => RailCall::OpenCheckout { amount },
            PaymentMethod::Personal => RailCall::PersonalTransfer { amount },
            PaymentMethod::Crypto | PaymentMethod::Wire => {
                return Err(ValidationError::NotConfirmable { method });
            }
        };
        self.expect_step("confirm", DepositStep::Confirm)?;
        self.validate_amount(amount)?;
        self.flow.set_loading(true);
        Ok(self.ticket(call))
    }

    fn ticket(&self, call: RailCall) -> RailTicket {
        RailTicket {
            epoch: self.epoch,
            brand_id: self.brand_id,
            call,
            rails: self.rails.clone(),
            return_url: self.return_url.clone(),
        }
    }

    /// Apply the result of an executed ticket.
    ///
    /// Failures leave the step and amount untouched for a retry.
    pub fn complete(
        &mut self,
        ticket: &RailTicket,
        result: Result<RailResult, RailError>,
    ) -> Result<(), DepositError> {
        if ticket.epoch != self.epoch {
            debug!(
                brand_id = %self.brand_id,
                ticket_epoch = ticket.epoch,
                epoch = self.epoch,
                "Discarding rail result for an abandoned flow"
            );
            return Err(DepositError::Abandoned);
        }

        let result = match result {
            Ok(result) => result,
            Err(e) => {
                warn!(brand_id = %self.brand_id, error = %e, "Rail call failed");
                self.flow.set_error(Some(e.to_string()));
                return Err(e.into());
            }
        };

        match result {
            RailResult::Address { network, address } => {
                info!(
                    brand_id = %self.brand_id,
                    network = network.display_name(),
                    "Deposit address issued"
                );
                self.addresses.insert(network, address);
                self.flow.set_loading(false);
                if self.flow.network() == Some(network) {
                    self.flow.next_step();
                }
            }
            RailResult::Checkout { session, amount } => {
                self.pending.remember(
                    self.brand_id,
                    PendingTopup {
                        amount,
                        transaction_id: session.transaction_id,
                    },
                );
                info!(
                    brand_id = %self.brand_id,
                    transaction_id = %session.transaction_id,
                    "Card checkout opened"
                );
                self.checkout = Some(session);
                self.flow.set_loading(false);
                self.flow.next_step();
            }
            RailResult::Transferred { amount } => {
                self.source_balance -= amount;
                self.flow.success();
            }
        }
        Ok(())
    }

    /// Pick a network and make sure an address exists for it.
    pub async fn choose_network(&mut self, network: CryptoNetwork) -> Result<String, DepositError> {
        let ticket = match self.begin_network(network)? {
            NetworkSelection::Cached(address) => return Ok(address),
            NetworkSelection::Issue(ticket) => ticket,
        };
        let result = ticket.execute().await;
        self.complete(&ticket, result)?;
        self.addresses
            .get(&network)
            .cloned()
            .ok_or(DepositError::Abandoned)
    }

    pub async fn confirm(&mut self) -> Result<(), DepositError> {
        let ticket = self.begin_confirm()?;
        let result = ticket.execute().await;
        self.complete(&ticket, result)
    }

    /// Finish from a step that needs no rail call (showing an address).
    pub fn advance(&mut self) -> Result<(), ValidationError> {
        self.flow.method().ok_or(ValidationError::NoMethod)?;
        self.expect_step("continue", DepositStep::Address)?;
        self.flow.next_step();
        Ok(())
    }

    /// The user came back from the card checkout.
    pub fn checkout_returned(&mut self) {
        if self.flow.method() == Some(PaymentMethod::Card)
            && self.flow.step() == DepositStep::Processing
        {
            self.checkout = None;
            self.flow.success();
        }
    }

    pub async fn wire_instructions(&self) -> Result<WireInstructions, RailError> {
        self.rails.wire.wire_instructions(self.brand_id).await
    }

    pub fn to_response(&self) -> DepositFlowResponse {
        let state = self.flow.state();
        let deposit_address = match (state.method, state.step, state.network) {
            (Some(PaymentMethod::Crypto), DepositStep::Address, Some(network)) => {
                self.addresses.get(&network).cloned()
            }
            _ => None,
        };
        let fees = match state.method {
            Some(PaymentMethod::Card | PaymentMethod::Personal) if state.amount > Decimal::ZERO => {
                self.flow.fees().map(Into::into)
            }
            _ => None,
        };
        DepositFlowResponse {
            brand_id: self.brand_id,
            method: state.method,
            step: state.step,
            amount: state.amount,
            network: state.network,
            error: state.error.clone(),
            is_loading: state.is_loading,
            deposit_address,
            checkout_url: self.checkout.as_ref().map(|c| c.checkout_url.to_string()),
            fees,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pending::MemoryPendingTopups;
    use crate::rails::{
        CardCheckout, CryptoAddressIssuer, FinalizeOutcome, PersonalTransfer,
        WireInstructionSource,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeRails {
        issued: Mutex<Vec<(Uuid, CryptoNetwork)>>,
        checkouts: AtomicUsize,
        transfers: Mutex<Vec<Decimal>>,
        fail_next: Mutex<Option<String>>,
    }

    impl FakeRails {
        fn failure(&self) -> Result<(), RailError> {
            match self.fail_next.lock().unwrap().take() {
                Some(message) => Err(RailError::Rejected(message)),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl CryptoAddressIssuer for FakeRails {
        async fn issue_address(
            &self,
            brand_id: Uuid,
            network: CryptoNetwork,
        ) -> Result<String, RailError> {
            self.failure()?;
            self.issued.lock().unwrap().push((brand_id, network));
            Ok(format!("{network}-address-{brand_id}"))
        }
    }

    #[async_trait]
    impl CardCheckout for FakeRails {
        async fn create_checkout(
            &self,
            _brand_id: Uuid,
            _amount: Decimal,
            _return_url: &Url,
        ) -> Result<CheckoutSession, RailError> {
            self.failure()?;
            let n = self.checkouts.fetch_add(1, Ordering::SeqCst) as u128;
            Ok(CheckoutSession {
                checkout_url: Url::parse("https://checkout.example.com/s/1")?,
                transaction_id: Uuid::from_u128(1000 + n),
            })
        }

        async fn finalize_checkout(
            &self,
            _brand_id: Uuid,
            _amount: Decimal,
            _transaction_id: Uuid,
            _return_url: &Url,
        ) -> Result<FinalizeOutcome, RailError> {
            Ok(FinalizeOutcome::Completed)
        }
    }

    #[async_trait]
    impl WireInstructionSource for FakeRails {
        async fn wire_instructions(&self, brand_id: Uuid) -> Result<WireInstructions, RailError> {
            Ok(WireInstructions {
                account_name: "Brand Wallet Inc".into(),
                account_number: "1".into(),
                routing_number: "2".into(),
                bank_name: "Bank".into(),
                reference: bwallet_sdk::reference::wire_reference(brand_id),
            })
        }
    }

    #[async_trait]
    impl PersonalTransfer for FakeRails {
        async fn available_balance(&self) -> Result<Decimal, RailError> {
            Ok(Decimal::new(50, 0))
        }

        async fn execute_transfer(
            &self,
            _brand_id: Uuid,
            amount: Decimal,
        ) -> Result<(), RailError> {
            self.failure()?;
            self.transfers.lock().unwrap().push(amount);
            Ok(())
        }
    }

    const BRAND: Uuid = Uuid::from_u128(0xB4A2D);

    fn session() -> (DepositSession, Arc<FakeRails>, Arc<MemoryPendingTopups>) {
        let fake = Arc::new(FakeRails::default());
        let rails = PaymentRails {
            crypto: fake.clone(),
            card: fake.clone(),
            wire: fake.clone(),
            personal: fake.clone(),
        };
        let pending = Arc::new(MemoryPendingTopups::new());
        let session = DepositSession::new(
            BRAND,
            rails,
            pending.clone(),
            Url::parse("https://app.example.com/wallet").unwrap(),
        );
        (session, fake, pending)
    }

    #[tokio::test]
    async fn test_personal_amount_over_balance_blocks_continue() {
        let (mut session, fake, _) = session();
        session.set_source_balance(Decimal::new(50, 0));
        session.select_method(PaymentMethod::Personal);

        let err = session.enter_amount(Decimal::new(75, 0)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::ExceedsBalance {
                requested: Decimal::new(75, 0),
                available: Decimal::new(50, 0),
            }
        );
        assert_eq!(session.flow().step(), DepositStep::Amount);
        assert_eq!(session.flow().amount(), Decimal::new(75, 0));
        assert!(session.flow().state().error.is_some());
        assert!(fake.transfers.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_positive_amount_is_rejected() {
        let (mut session, _, _) = session();
        session.select_method(PaymentMethod::Card);
        assert_eq!(
            session.enter_amount(Decimal::ZERO),
            Err(ValidationError::NonPositiveAmount)
        );
        assert_eq!(
            session.enter_amount(Decimal::new(-5, 0)),
            Err(ValidationError::NonPositiveAmount)
        );
    }

    #[tokio::test]
    async fn test_oversized_card_amount_is_rejected() {
        let (mut session, _, _) = session();
        session.select_method(PaymentMethod::Card);
        assert_eq!(
            session.enter_amount(Decimal::MAX),
            Err(ValidationError::AmountTooLarge)
        );
        let response = session.to_response();
        assert_eq!(response.step, DepositStep::Amount);
        assert_eq!(response.amount, Decimal::MAX);
        assert!(response.fees.is_none());
        assert_eq!(response.error.as_deref(), Some("amount is too large"));
    }

    #[tokio::test]
    async fn test_crypto_address_is_issued_once_per_network() {
        let (mut session, fake, _) = session();
        session.select_method(PaymentMethod::Crypto);
        let first = session.choose_network(CryptoNetwork::Solana).await.unwrap();
        assert_eq!(session.flow().step(), DepositStep::Address);

        session.prev_step();
        assert_eq!(session.flow().step(), DepositStep::Network);
        let second = session.choose_network(CryptoNetwork::Solana).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(
            fake.issued.lock().unwrap().as_slice(),
            &[(BRAND, CryptoNetwork::Solana)]
        );
        assert_eq!(session.to_response().deposit_address, Some(first));
    }

    #[tokio::test]
    async fn test_reset_clears_address_cache() {
        let (mut session, fake, _) = session();
        session.select_method(PaymentMethod::Crypto);
        session.choose_network(CryptoNetwork::Base).await.unwrap();
        session.reset();
        session.select_method(PaymentMethod::Crypto);
        session.choose_network(CryptoNetwork::Base).await.unwrap();
        assert_eq!(fake.issued.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rail_failure_keeps_step_and_amount() {
        let (mut session, fake, pending) = session();
        session.select_method(PaymentMethod::Card);
        session.enter_amount(Decimal::new(100, 0)).unwrap();
        *fake.fail_next.lock().unwrap() = Some("amount must be at least $1".into());

        let err = session.confirm().await.unwrap_err();
        assert!(matches!(err, DepositError::Rail(RailError::Rejected(_))));
        let state = session.flow().state();
        assert_eq!(state.step, DepositStep::Confirm);
        assert_eq!(state.amount, Decimal::new(100, 0));
        assert!(!state.is_loading);
        assert_eq!(state.error.as_deref(), Some("amount must be at least $1"));
        assert_eq!(pending.take(BRAND), None);

        session.confirm().await.unwrap();
        assert_eq!(session.flow().step(), DepositStep::Processing);
    }

    #[tokio::test]
    async fn test_card_confirm_remembers_pending_topup() {
        let (mut session, _, pending) = session();
        session.select_method(PaymentMethod::Card);
        session.enter_amount(Decimal::new(100, 0)).unwrap();
        let fees = session.to_response().fees.unwrap();
        assert_eq!(fees.total_charged, Decimal::new(10330, 2));

        session.confirm().await.unwrap();
        let response = session.to_response();
        assert_eq!(response.step, DepositStep::Processing);
        assert_eq!(
            response.checkout_url.as_deref(),
            Some("https://checkout.example.com/s/1")
        );
        assert_eq!(
            pending.take(BRAND),
            Some(PendingTopup {
                amount: Decimal::new(100, 0),
                transaction_id: Uuid::from_u128(1000),
            })
        );

        session.checkout_returned();
        assert_eq!(session.flow().step(), DepositStep::Success);
    }

    #[tokio::test]
    async fn test_personal_transfer_succeeds_synchronously() {
        let (mut session, fake, _) = session();
        session.set_source_balance(Decimal::new(50, 0));
        session.select_method(PaymentMethod::Personal);
        session.enter_amount(Decimal::new(20, 0)).unwrap();
        session.confirm().await.unwrap();

        assert_eq!(session.flow().step(), DepositStep::Success);
        assert_eq!(session.source_balance(), Decimal::new(30, 0));
        assert_eq!(fake.transfers.lock().unwrap().as_slice(), &[Decimal::new(20, 0)]);
    }

    #[tokio::test]
    async fn test_result_after_method_switch_is_discarded() {
        let (mut session, fake, pending) = session();
        session.select_method(PaymentMethod::Card);
        session.enter_amount(Decimal::new(10, 0)).unwrap();
        let ticket = session.begin_confirm().unwrap();
        assert!(session.flow().is_loading());
        assert_eq!(session.begin_confirm().unwrap_err(), ValidationError::Busy);

        session.select_method(PaymentMethod::Wire);
        let result = ticket.execute().await;
        assert!(matches!(
            session.complete(&ticket, result),
            Err(DepositError::Abandoned)
        ));
        assert_eq!(session.flow().step(), DepositStep::Address);
        assert_eq!(session.flow().method(), Some(PaymentMethod::Wire));
        assert_eq!(fake.checkouts.load(Ordering::SeqCst), 1);
        assert_eq!(pending.take(BRAND), None);
    }

    #[tokio::test]
    async fn test_personal_option_needs_positive_balance() {
        let (mut session, _, _) = session();
        let personal = |s: &DepositSession| {
            s.method_options()
                .into_iter()
                .find(|o| o.method == PaymentMethod::Personal)
                .unwrap()
                .available
        };
        assert!(!personal(&session));
        session.set_source_balance(Decimal::new(1, 2));
        assert!(personal(&session));
    }

    #[tokio::test]
    async fn test_wrong_method_inputs_are_rejected() {
        let (mut session, _, _) = session();
        assert_eq!(
            session.enter_amount(Decimal::ONE),
            Err(ValidationError::NoMethod)
        );
        session.select_method(PaymentMethod::Wire);
        assert!(matches!(
            session.begin_network(CryptoNetwork::Base),
            Err(ValidationError::NetworkNotAccepted { .. })
        ));
        assert!(matches!(
            session.begin_confirm(),
            Err(ValidationError::NotConfirmable { .. })
        ));
        session.advance().unwrap();
        assert_eq!(session.flow().step(), DepositStep::Success);
    }

    #[tokio::test]
    async fn test_reset_if_unchanged_respects_new_flow() {
        let (mut session, _, _) = session();
        session.select_method(PaymentMethod::Wire);
        session.advance().unwrap();
        let epoch = session.epoch();
        session.select_method(PaymentMethod::Card);
        assert!(!session.reset_if_unchanged(epoch));
        assert_eq!(session.flow().method(), Some(PaymentMethod::Card));
        let epoch = session.epoch();
        assert!(session.reset_if_unchanged(epoch));
        assert_eq!(session.flow().step(), DepositStep::Idle);
    }
}
