//! Stripe adapter: resolves a checkout session to its payment intent,
//! then verifies the intent

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::{GatewayVerifier, PaymentIntent, PaymentStatus, VerifiedPayment, VerifyError, VerifyResult};

/// Configuration for the Stripe API client
#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub base_path: String,
}

impl StripeConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, VerifyError> {
        let secret_key = std::env::var("STRIPE_SECRET_KEY")
            .map_err(|_| VerifyError::Config("Missing STRIPE_SECRET_KEY".to_string()))?;

        let base_path = std::env::var("STRIPE_BASE_URL")
            .unwrap_or_else(|_| "https://api.stripe.com".to_string());

        Ok(StripeConfig {
            secret_key,
            base_path,
        })
    }
}

/// Stripe gateway verifier ("gateway B")
///
/// Stripe confirmations carry an opaque checkout-session id, so
/// `resolve_session` is overridden to look up the session and return the
/// underlying payment-intent id as the reference.
#[derive(Clone)]
pub struct StripeVerifier {
    config: Arc<StripeConfig>,
    http_client: Client,
}

#[derive(Debug, Deserialize)]
struct StripeCheckoutSession {
    id: String,
    payment_intent: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripePaymentIntent {
    id: String,
    status: String,
    amount: i64,
    currency: String,
    metadata: Option<serde_json::Value>,
}

impl StripeVerifier {
    /// Create a new verifier with the given configuration
    pub fn new(config: StripeConfig) -> Result<Self, VerifyError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| VerifyError::Http(e.to_string()))?;

        Ok(StripeVerifier {
            config: Arc::new(config),
            http_client,
        })
    }

    /// Create a new verifier from environment variables
    pub fn from_env() -> Result<Self, VerifyError> {
        Self::new(StripeConfig::from_env()?)
    }

    /// Make an authenticated GET request to the Stripe API
    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> VerifyResult<T> {
        let url = format!("{}{}", self.config.base_path, path);
        let response = self
            .http_client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.config.secret_key))
            .send()
            .await
            .map_err(|e| VerifyError::Http(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| VerifyError::Parse(e.to_string()))
        } else {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            Err(VerifyError::Api {
                status_code: status.as_u16(),
                message: error_body,
            })
        }
    }

    fn map_status(status: &str) -> PaymentStatus {
        match status {
            "succeeded" => PaymentStatus::Success,
            "canceled" => PaymentStatus::Abandoned,
            _ => PaymentStatus::Failed,
        }
    }
}

#[async_trait]
impl GatewayVerifier for StripeVerifier {
    fn gateway(&self) -> &'static str {
        "stripe"
    }

    async fn verify(&self, reference: &str) -> VerifyResult<VerifiedPayment> {
        let intent: StripePaymentIntent = self
            .get(&format!("/v1/payment_intents/{}", reference))
            .await
            .map_err(|e| match e {
                VerifyError::Api { status_code: 404, .. } => {
                    VerifyError::UnknownReference(reference.to_string())
                }
                other => other,
            })?;

        let payment_intent = PaymentIntent::from_metadata(intent.metadata.as_ref());

        tracing::info!(
            reference = %intent.id,
            status = %intent.status,
            amount_minor = intent.amount,
            "Stripe verification completed"
        );

        Ok(VerifiedPayment {
            reference: intent.id,
            status: Self::map_status(&intent.status),
            amount_minor: intent.amount,
            currency: intent.currency.to_uppercase(),
            intent: payment_intent,
        })
    }

    async fn resolve_session(&self, session_id: &str) -> VerifyResult<String> {
        let session: StripeCheckoutSession = self
            .get(&format!("/v1/checkout/sessions/{}", session_id))
            .await
            .map_err(|e| match e {
                VerifyError::Api { status_code: 404, .. } => {
                    VerifyError::UnknownReference(session_id.to_string())
                }
                other => other,
            })?;

        session.payment_intent.ok_or_else(|| {
            tracing::warn!(session_id = %session.id, "checkout session has no payment intent");
            VerifyError::UnknownReference(session_id.to_string())
        })
    }
}
