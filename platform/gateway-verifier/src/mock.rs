//! Scripted verifier for tests and local development

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::{GatewayVerifier, VerifiedPayment, VerifyError, VerifyResult};

/// GatewayVerifier implementation backed by in-memory scripts
///
/// This implementation is suitable for:
/// - Unit and integration tests (no external dependencies)
/// - Local development without gateway credentials
///
/// Register the payments the "gateway" should know about up front; any
/// reference that was not registered verifies as `UnknownReference`,
/// which is exactly how a live gateway treats a reference it never issued.
///
/// # Example
/// ```rust
/// use gateway_verifier::{GatewayVerifier, MockVerifier, PaymentIntent, VerifiedPayment};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mock = MockVerifier::new();
/// mock.register(VerifiedPayment::succeeded(
///     "ps-001",
///     5000,
///     PaymentIntent::WalletTopUp { user_id: Uuid::new_v4() },
/// ));
///
/// let payment = mock.verify("ps-001").await?;
/// assert!(payment.status.is_success());
/// assert!(mock.verify("ps-unknown").await.is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct MockVerifier {
    payments: Arc<Mutex<HashMap<String, VerifiedPayment>>>,
    sessions: Arc<Mutex<HashMap<String, String>>>,
}

impl MockVerifier {
    /// Create a new mock verifier with no known payments
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a payment keyed by its reference
    pub fn register(&self, payment: VerifiedPayment) {
        self.payments
            .lock()
            .expect("mock verifier lock poisoned")
            .insert(payment.reference.clone(), payment);
    }

    /// Register a session alias resolving to a payment reference
    pub fn register_session(&self, session_id: &str, reference: &str) {
        self.sessions
            .lock()
            .expect("mock verifier lock poisoned")
            .insert(session_id.to_string(), reference.to_string());
    }
}

#[async_trait]
impl GatewayVerifier for MockVerifier {
    fn gateway(&self) -> &'static str {
        "mock"
    }

    async fn verify(&self, reference: &str) -> VerifyResult<VerifiedPayment> {
        let payments = self.payments.lock().expect("mock verifier lock poisoned");
        payments
            .get(reference)
            .cloned()
            .ok_or_else(|| VerifyError::UnknownReference(reference.to_string()))
    }

    async fn resolve_session(&self, session_id: &str) -> VerifyResult<String> {
        let sessions = self.sessions.lock().expect("mock verifier lock poisoned");
        sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| VerifyError::UnknownReference(session_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PaymentIntent, PaymentStatus};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_registered_payment_verifies() {
        let mock = MockVerifier::new();
        let user_id = Uuid::new_v4();
        mock.register(VerifiedPayment::succeeded(
            "ps-100",
            2500,
            PaymentIntent::WalletTopUp { user_id },
        ));

        let payment = mock.verify("ps-100").await.unwrap();
        assert_eq!(payment.status, PaymentStatus::Success);
        assert_eq!(payment.amount_minor, 2500);
        assert_eq!(
            payment.intent,
            Some(PaymentIntent::WalletTopUp { user_id })
        );
    }

    #[tokio::test]
    async fn test_unknown_reference_errors() {
        let mock = MockVerifier::new();
        let err = mock.verify("nope").await.unwrap_err();
        assert!(matches!(err, VerifyError::UnknownReference(_)));
    }

    #[tokio::test]
    async fn test_session_resolution() {
        let mock = MockVerifier::new();
        mock.register_session("cs_test_123", "pi_abc");

        assert_eq!(mock.resolve_session("cs_test_123").await.unwrap(), "pi_abc");
        assert!(mock.resolve_session("cs_missing").await.is_err());
    }
}
