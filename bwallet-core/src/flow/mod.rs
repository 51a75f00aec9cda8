//! Deposit flow state machine.
//!
//! Step order lives in [`step_sequence`], a table from method to its ordered
//! steps. [`DepositFlow`] walks that table by position, so adding a method
//! means adding a row, not a branch.

pub mod session;

use bwallet_sdk::objects::{CryptoNetwork, DepositStep, PaymentMethod};
use rust_decimal::Decimal;

use crate::fees::{FeeCalculation, fees};

pub use session::{
    DepositError, DepositSession, NetworkSelection, RailResult, RailTicket, ValidationError,
};

const CRYPTO_STEPS: &[DepositStep] = &[DepositStep::Network, DepositStep::Address];
const CARD_STEPS: &[DepositStep] = &[
    DepositStep::Amount,
    DepositStep::Confirm,
    DepositStep::Processing,
    DepositStep::Success,
];
const WIRE_STEPS: &[DepositStep] = &[DepositStep::Address];

/// Ordered steps for `method`.
pub fn step_sequence(method: PaymentMethod) -> &'static [DepositStep] {
    match method {
        PaymentMethod::Crypto => CRYPTO_STEPS,
        PaymentMethod::Card | PaymentMethod::Personal => CARD_STEPS,
        PaymentMethod::Wire => WIRE_STEPS,
    }
}

pub fn first_step(method: PaymentMethod) -> DepositStep {
    step_sequence(method)
        .first()
        .copied()
        .unwrap_or(DepositStep::Success)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepositFlowState {
    pub method: Option<PaymentMethod>,
    pub step: DepositStep,
    pub amount: Decimal,
    pub network: Option<CryptoNetwork>,
    pub error: Option<String>,
    pub is_loading: bool,
}

/// Transient deposit flow for one brand. Nothing here persists.
#[derive(Debug, Clone, Default)]
pub struct DepositFlow {
    state: DepositFlowState,
}

impl DepositFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DepositFlowState {
        &self.state
    }

    pub fn method(&self) -> Option<PaymentMethod> {
        self.state.method
    }

    pub fn step(&self) -> DepositStep {
        self.state.step
    }

    pub fn amount(&self) -> Decimal {
        self.state.amount
    }

    pub fn network(&self) -> Option<CryptoNetwork> {
        self.state.network
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading
    }

    /// Start over with `method`. Amount, network and error never carry over.
    pub fn select_method(&mut self, method: PaymentMethod) {
        self.state = DepositFlowState {
            method: Some(method),
            step: first_step(method),
            ..DepositFlowState::default()
        };
    }

    /// Stores the amount as given; callers validate before advancing.
    pub fn set_amount(&mut self, amount: Decimal) {
        self.state.amount = amount;
    }

    pub fn set_network(&mut self, network: CryptoNetwork) {
        self.state.network = Some(network);
    }

    /// Position of the current step within the method's sequence.
    fn position(&self) -> Option<(&'static [DepositStep], usize)> {
        let sequence = step_sequence(self.state.method?);
        let index = sequence.iter().position(|s| *s == self.state.step)?;
        Some((sequence, index))
    }

    pub fn next_step(&mut self) {
        if matches!(self.state.step, DepositStep::Idle | DepositStep::Success) {
            return;
        }
        let Some((sequence, index)) = self.position() else {
            return;
        };
        self.state.step = sequence
            .get(index + 1)
            .copied()
            .unwrap_or(DepositStep::Success);
    }

    /// Step back one entry. From the first entry this is a full reset.
    pub fn prev_step(&mut self) {
        match self.position() {
            Some((sequence, index)) if index > 0 => {
                self.state.step = sequence[index - 1];
            }
            _ => self.reset(),
        }
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.state.is_loading = loading;
        if loading {
            self.state.error = None;
        }
    }

    pub fn set_error(&mut self, error: Option<String>) {
        if error.is_some() {
            self.state.is_loading = false;
        }
        self.state.error = error;
    }

    pub fn success(&mut self) {
        self.state.step = DepositStep::Success;
        self.state.is_loading = false;
        self.state.error = None;
    }

    pub fn reset(&mut self) {
        self.state = DepositFlowState::default();
    }

    /// Fee quote for the current method and amount.
    pub fn fees(&self) -> Option<FeeCalculation> {
        self.state.method.and_then(|m| fees(m, self.state.amount))
    }
}
