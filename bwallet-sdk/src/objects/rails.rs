//! Request and response bodies exchanged with the payment rail functions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use super::methods::CryptoNetwork;

/// Body for the `generate-deposit-address` function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueAddressRequest {
    pub brand_id: Uuid,
    pub network: CryptoNetwork,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueAddressResponse {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub network: Option<CryptoNetwork>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body for the `create-brand-wallet-topup` function.
///
/// Without `transaction_id` this opens a new checkout session; with it, the
/// function finalizes the top-up that session created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardTopupRequest {
    pub brand_id: Uuid,
    pub amount: Decimal,
    pub return_url: Url,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardTopupResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub checkout_url: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<Uuid>,
    /// Set when the processor still needs a saved payment method.
    #[serde(default)]
    pub needs_payment_method: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Bank details a brand wires funds to.
///
/// Receipt is matched on `reference` only, so the sender must put it in the
/// wire memo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireInstructions {
    pub account_name: String,
    pub account_number: String,
    pub routing_number: String,
    pub bank_name: String,
    pub reference: String,
}

impl WireInstructions {
    /// The five labelled fields in display order.
    pub fn fields(&self) -> [(&'static str, &str); 5] {
        [
            ("Account Name", &self.account_name),
            ("Account Number", &self.account_number),
            ("Routing Number", &self.routing_number),
            ("Bank Name", &self.bank_name),
            ("Reference", &self.reference),
        ]
    }

    /// All fields as `Label: value` lines, for the copy-all button.
    pub fn clipboard_text(&self) -> String {
        self.fields()
            .iter()
            .map(|(label, value)| format!("{label}: {value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// `GET /wire` body: the instructions plus their copy-all text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireInstructionsResponse {
    #[serde(flatten)]
    pub instructions: WireInstructions,
    pub clipboard_text: String,
}

impl From<WireInstructions> for WireInstructionsResponse {
    fn from(instructions: WireInstructions) -> Self {
        let clipboard_text = instructions.clipboard_text();
        Self {
            instructions,
            clipboard_text,
        }
    }
}
