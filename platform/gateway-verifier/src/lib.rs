//! # Gateway Verifier Abstraction
//!
//! A platform-level abstraction over external payment gateways.
//!
//! ## Why This Lives in Tier 1
//!
//! Payment verification is a **shared runtime capability**: the
//! reconciliation service must treat every gateway identically once a
//! payment has been verified. Placing the contract in `platform/` allows:
//! - Modules to depend on one trait instead of per-gateway clients
//! - Config-driven swap between live gateways (production) and the mock
//!   verifier (dev/test)
//!
//! ## Implementations
//!
//! - **PaystackVerifier**: verifies a transaction by reference
//! - **StripeVerifier**: resolves a checkout session to a payment intent,
//!   then verifies the intent
//! - **MockVerifier**: scripted results for tests and local development
//!
//! ## Usage
//!
//! ```rust,no_run
//! use gateway_verifier::{GatewayVerifier, MockVerifier, PaymentIntent, VerifiedPayment};
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mock = MockVerifier::new();
//! mock.register(VerifiedPayment::succeeded(
//!     "ps-001",
//!     5000,
//!     PaymentIntent::WalletTopUp { user_id: Uuid::new_v4() },
//! ));
//!
//! let verifier: Arc<dyn GatewayVerifier> = Arc::new(mock);
//! let payment = verifier.verify("ps-001").await?;
//! assert_eq!(payment.amount_minor, 5000);
//! # Ok(())
//! # }
//! ```

mod mock;
mod paystack;
mod stripe;

pub use mock::MockVerifier;
pub use paystack::{PaystackConfig, PaystackVerifier};
pub use stripe::{StripeConfig, StripeVerifier};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Terminal status reported by a gateway for a payment attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Success,
    Failed,
    Abandoned,
}

impl PaymentStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, PaymentStatus::Success)
    }
}

/// What the payer intended the money for, decided at payment-initiation
/// time and carried through the gateway as metadata.
///
/// Gateways transport this as the JSON object
/// `{"type": "wallet"|"order", "uuid": <user>, "order_id": <order>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PaymentIntent {
    /// Fund the user's wallet directly.
    #[serde(rename = "wallet")]
    WalletTopUp {
        #[serde(rename = "uuid")]
        user_id: Uuid,
    },
    /// Settle a specific order through the user's wallet.
    #[serde(rename = "order")]
    OrderSettlement {
        #[serde(rename = "uuid")]
        user_id: Uuid,
        order_id: Uuid,
    },
}

impl PaymentIntent {
    /// Parse gateway metadata into a typed intent.
    ///
    /// Returns `None` when the metadata is absent or does not carry the
    /// expected fields; the caller decides whether that is fatal.
    pub fn from_metadata(metadata: Option<&serde_json::Value>) -> Option<Self> {
        let value = metadata?;
        serde_json::from_value(value.clone()).ok()
    }

    pub fn user_id(&self) -> Uuid {
        match self {
            PaymentIntent::WalletTopUp { user_id } => *user_id,
            PaymentIntent::OrderSettlement { user_id, .. } => *user_id,
        }
    }
}

/// Verified payment facts returned by a gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPayment {
    /// Gateway-scoped idempotency key for this monetary event
    pub reference: String,
    pub status: PaymentStatus,
    /// Amount in the smallest currency unit
    pub amount_minor: i64,
    /// ISO 4217 code as reported by the gateway
    pub currency: String,
    /// Typed intent parsed from gateway metadata; `None` when the
    /// metadata could not be resolved
    pub intent: Option<PaymentIntent>,
}

impl VerifiedPayment {
    /// Build a successful verification result (test and mock helper).
    pub fn succeeded(reference: &str, amount_minor: i64, intent: PaymentIntent) -> Self {
        Self {
            reference: reference.to_string(),
            status: PaymentStatus::Success,
            amount_minor,
            currency: "USD".to_string(),
            intent: Some(intent),
        }
    }

    /// Build a failed verification result (test and mock helper).
    pub fn failed(reference: &str, amount_minor: i64) -> Self {
        Self {
            reference: reference.to_string(),
            status: PaymentStatus::Failed,
            amount_minor,
            currency: "USD".to_string(),
            intent: None,
        }
    }
}

/// Errors that can occur while talking to a gateway
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("http error: {0}")]
    Http(String),

    #[error("gateway API error (status {status_code}): {message}")]
    Api { status_code: u16, message: String },

    #[error("failed to parse gateway response: {0}")]
    Parse(String),

    #[error("gateway does not know reference {0}")]
    UnknownReference(String),
}

impl VerifyError {
    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        matches!(self, VerifyError::Api { status_code, .. } if (400..500).contains(status_code))
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        matches!(self, VerifyError::Api { status_code, .. } if (500..600).contains(status_code))
    }
}

/// Result type for gateway operations
pub type VerifyResult<T> = Result<T, VerifyError>;

/// Core contract every payment gateway adapter must satisfy
///
/// The reconciliation layer depends only on this trait; gateway-specific
/// HTTP and signature details stay inside the adapters.
#[async_trait]
pub trait GatewayVerifier: Send + Sync {
    /// Short gateway name used in logs and transaction descriptions
    fn gateway(&self) -> &'static str;

    /// Confirm a payment with the gateway and return the verified facts.
    ///
    /// The returned status is the gateway's word on whether money actually
    /// moved; callers must not treat anything but `Success` as settled.
    async fn verify(&self, reference: &str) -> VerifyResult<VerifiedPayment>;

    /// Resolve an opaque session identifier to a payment reference.
    ///
    /// Gateways that call back with the reference itself use the default
    /// identity implementation; session-based gateways override this.
    async fn resolve_session(&self, session_id: &str) -> VerifyResult<String> {
        Ok(session_id.to_string())
    }
}

impl fmt::Debug for dyn GatewayVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GatewayVerifier({})", self.gateway())
    }
}
