//! Rails backed by the payments service's HTTP functions.

use std::time::Duration;

use async_trait::async_trait;
use bwallet_sdk::objects::{
    CardTopupRequest, CardTopupResponse, CryptoNetwork, IssueAddressRequest, IssueAddressResponse,
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use super::{CardCheckout, CheckoutSession, CryptoAddressIssuer, FinalizeOutcome, RailError};

/// Client for the address issuance and card top-up functions.
#[derive(Debug, Clone)]
pub struct HttpRails {
    base_url: Url,
    api_key: String,
    http_client: reqwest::Client,
}

#[derive(Debug, serde::Deserialize)]
struct RailErrorBody {
    #[serde(default)]
    error: Option<String>,
}

impl HttpRails {
    const ISSUE_ADDRESS_PATH: &str = "functions/v1/generate-deposit-address";
    const CARD_TOPUP_PATH: &str = "functions/v1/create-brand-wallet-topup";

    pub fn new(base_url: Url, api_key: String, timeout: Duration) -> Self {
        Self {
            base_url,
            api_key,
            http_client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, RailError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.base_url.join(path)?;
        let response = self
            .http_client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<RailErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_else(|| format!("rail returned status {status}"));
            warn!(path, status = %status, message = %message, "Rail call rejected");
            return Err(RailError::Rejected(message));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl CryptoAddressIssuer for HttpRails {
    async fn issue_address(
        &self,
        brand_id: Uuid,
        network: CryptoNetwork,
    ) -> Result<String, RailError> {
        let response: IssueAddressResponse = self
            .post(
                Self::ISSUE_ADDRESS_PATH,
                &IssueAddressRequest { brand_id, network },
            )
            .await?;
        if let Some(error) = response.error {
            return Err(RailError::Rejected(error));
        }
        let address = response
            .address
            .ok_or(RailError::IncompleteResponse("address"))?;
        debug!(brand_id = %brand_id, network = %network, "Deposit address issued");
        Ok(address)
    }
}

#[async_trait]
impl CardCheckout for HttpRails {
    async fn create_checkout(
        &self,
        brand_id: Uuid,
        amount: Decimal,
        return_url: &Url,
    ) -> Result<CheckoutSession, RailError> {
        let response: CardTopupResponse = self
            .post(
                Self::CARD_TOPUP_PATH,
                &CardTopupRequest {
                    brand_id,
                    amount,
                    return_url: return_url.clone(),
                    transaction_id: None,
                },
            )
            .await?;
        if let Some(error) = response.error {
            return Err(RailError::Rejected(error));
        }
        let checkout_url = response
            .checkout_url
            .ok_or(RailError::IncompleteResponse("checkout_url"))?;
        let transaction_id = response
            .transaction_id
            .ok_or(RailError::IncompleteResponse("transaction_id"))?;
        Ok(CheckoutSession {
            checkout_url: Url::parse(&checkout_url)?,
            transaction_id,
        })
    }

    async fn finalize_checkout(
        &self,
        brand_id: Uuid,
        amount: Decimal,
        transaction_id: Uuid,
        return_url: &Url,
    ) -> Result<FinalizeOutcome, RailError> {
        let response: CardTopupResponse = self
            .post(
                Self::CARD_TOPUP_PATH,
                &CardTopupRequest {
                    brand_id,
                    amount,
                    return_url: return_url.clone(),
                    transaction_id: Some(transaction_id),
                },
            )
            .await?;
        match response {
            CardTopupResponse {
                success: true,
                needs_payment_method: false,
                ..
            } => Ok(FinalizeOutcome::Completed),
            CardTopupResponse {
                success: true,
                needs_payment_method: true,
                ..
            } => Ok(FinalizeOutcome::NeedsPaymentMethod),
            CardTopupResponse { error, .. } => Err(RailError::Rejected(
                error.unwrap_or_else(|| "top-up was not finalized".to_string()),
            )),
        }
    }
}
