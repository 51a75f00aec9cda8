//! Deposit fee calculation.
//!
//! Card is the only rail with a processing fee: a percentage plus a flat
//! amount, charged on top of the deposit. Every rail credits the wallet the
//! face amount the user entered.

use bwallet_sdk::objects::{FeeQuote, PaymentMethod};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// Card processing percentage (3%).
pub const CARD_PERCENT_FEE: Decimal = Decimal::from_parts(3, 0, 0, false, 2);

/// Card processing flat fee ($0.30).
pub const CARD_FLAT_FEE: Decimal = Decimal::from_parts(30, 0, 0, false, 2);

/// Fees are quoted in cents.
const FEE_SCALE: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeeCalculation {
    pub deposit_amount: Decimal,
    pub processing_fee: Decimal,
    pub total_charged: Decimal,
    pub you_receive: Decimal,
    pub fee_percentage: String,
}

/// Compute the fee breakdown for depositing `amount` through `method`.
///
/// Returns `None` when the total does not fit in a `Decimal`.
pub fn fees(method: PaymentMethod, amount: Decimal) -> Option<FeeCalculation> {
    let processing_fee = processing_fee(method, amount)?;
    Some(FeeCalculation {
        deposit_amount: amount,
        processing_fee,
        total_charged: amount.checked_add(processing_fee)?,
        you_receive: amount,
        fee_percentage: fee_label(method),
    })
}

fn processing_fee(method: PaymentMethod, amount: Decimal) -> Option<Decimal> {
    match method {
        PaymentMethod::Card => {
            let fee = amount
                .checked_mul(CARD_PERCENT_FEE)?
                .checked_add(CARD_FLAT_FEE)?;
            Some(fee.round_dp_with_strategy(FEE_SCALE, RoundingStrategy::MidpointAwayFromZero))
        }
        PaymentMethod::Crypto | PaymentMethod::Wire | PaymentMethod::Personal => Some(Decimal::ZERO),
    }
}

/// Human-readable fee label, built from the same constants the fee uses.
pub fn fee_label(method: PaymentMethod) -> String {
    match method {
        PaymentMethod::Card => {
            let percent = (CARD_PERCENT_FEE * Decimal::ONE_HUNDRED).normalize();
            format!("{percent}% + ${:.2}", CARD_FLAT_FEE)
        }
        PaymentMethod::Crypto | PaymentMethod::Wire | PaymentMethod::Personal => {
            "No fees".to_string()
        }
    }
}

impl From<FeeCalculation> for FeeQuote {
    fn from(value: FeeCalculation) -> Self {
        FeeQuote {
            deposit_amount: value.deposit_amount,
            processing_fee: value.processing_fee,
            total_charged: value.total_charged,
            you_receive: value.you_receive,
            fee_percentage: value.fee_percentage,
        }
    }
}
