//! Paystack adapter: verifies a transaction by its reference

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::{GatewayVerifier, PaymentIntent, PaymentStatus, VerifiedPayment, VerifyError, VerifyResult};

/// Configuration for the Paystack API client
#[derive(Debug, Clone)]
pub struct PaystackConfig {
    pub secret_key: String,
    pub base_path: String,
}

impl PaystackConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, VerifyError> {
        let secret_key = std::env::var("PAYSTACK_SECRET_KEY")
            .map_err(|_| VerifyError::Config("Missing PAYSTACK_SECRET_KEY".to_string()))?;

        let base_path = std::env::var("PAYSTACK_BASE_URL")
            .unwrap_or_else(|_| "https://api.paystack.co".to_string());

        Ok(PaystackConfig {
            secret_key,
            base_path,
        })
    }
}

/// Paystack gateway verifier ("gateway A")
///
/// Paystack calls back with the transaction reference itself, so the
/// default identity `resolve_session` applies.
#[derive(Clone)]
pub struct PaystackVerifier {
    config: Arc<PaystackConfig>,
    http_client: Client,
}

/// Top-level Paystack verify response
#[derive(Debug, Deserialize)]
struct PaystackVerifyResponse {
    status: bool,
    message: String,
    data: Option<PaystackTransaction>,
}

#[derive(Debug, Deserialize)]
struct PaystackTransaction {
    status: String,
    reference: String,
    /// Amount in the smallest currency unit (kobo/cents)
    amount: i64,
    currency: String,
    metadata: Option<serde_json::Value>,
}

impl PaystackVerifier {
    /// Create a new verifier with the given configuration
    pub fn new(config: PaystackConfig) -> Result<Self, VerifyError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| VerifyError::Http(e.to_string()))?;

        Ok(PaystackVerifier {
            config: Arc::new(config),
            http_client,
        })
    }

    /// Create a new verifier from environment variables
    pub fn from_env() -> Result<Self, VerifyError> {
        Self::new(PaystackConfig::from_env()?)
    }

    fn map_status(status: &str) -> PaymentStatus {
        match status {
            "success" => PaymentStatus::Success,
            "abandoned" => PaymentStatus::Abandoned,
            _ => PaymentStatus::Failed,
        }
    }
}

#[async_trait]
impl GatewayVerifier for PaystackVerifier {
    fn gateway(&self) -> &'static str {
        "paystack"
    }

    async fn verify(&self, reference: &str) -> VerifyResult<VerifiedPayment> {
        let url = format!("{}/transaction/verify/{}", self.config.base_path, reference);
        let response = self
            .http_client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.config.secret_key))
            .send()
            .await
            .map_err(|e| VerifyError::Http(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(VerifyError::UnknownReference(reference.to_string()));
        }
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(VerifyError::Api {
                status_code: status.as_u16(),
                message: error_body,
            });
        }

        let body: PaystackVerifyResponse = response
            .json()
            .await
            .map_err(|e| VerifyError::Parse(e.to_string()))?;

        let data = match (body.status, body.data) {
            (true, Some(data)) => data,
            (_, _) => {
                tracing::warn!(reference, message = %body.message, "Paystack could not verify reference");
                return Err(VerifyError::UnknownReference(reference.to_string()));
            }
        };

        let intent = PaymentIntent::from_metadata(data.metadata.as_ref());

        tracing::info!(
            reference = %data.reference,
            status = %data.status,
            amount_minor = data.amount,
            "Paystack verification completed"
        );

        Ok(VerifiedPayment {
            reference: data.reference,
            status: Self::map_status(&data.status),
            amount_minor: data.amount,
            currency: data.currency,
            intent,
        })
    }
}
