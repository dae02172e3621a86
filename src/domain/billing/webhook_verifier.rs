//! Gateway webhook signature verification.
//!
//! The gateway signs the exact raw request body with HMAC-SHA256 using the
//! shared webhook secret and sends the hex digest in the signature header.
//! Verification must happen on the raw bytes, before any parsing, and the
//! comparison must be constant-time.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::errors::WebhookError;
use super::gateway_event::GatewayEvent;

/// Verifier for gateway webhook signatures.
pub struct WebhookVerifier {
    /// Shared webhook signing secret from the gateway dashboard.
    secret: String,
}

impl WebhookVerifier {
    /// Creates a new verifier with the given webhook secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Verifies the signature over the exact raw payload bytes.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::InvalidSignature` if the header is not valid
    /// hex or the digest does not match.
    pub fn verify(&self, payload: &[u8], signature_hex: &str) -> Result<(), WebhookError> {
        let provided =
            hex::decode(signature_hex.trim()).map_err(|_| WebhookError::InvalidSignature)?;

        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(payload);
        let expected = mac.finalize().into_bytes();

        if constant_time_compare(&expected, &provided) {
            Ok(())
        } else {
            Err(WebhookError::InvalidSignature)
        }
    }

    /// Verifies the signature and parses the event payload.
    ///
    /// Any transition driven by an inbound webhook must pass through this
    /// gate first; a signature failure is terminal for the request and no
    /// state is mutated.
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_hex: &str,
    ) -> Result<GatewayEvent, WebhookError> {
        self.verify(payload, signature_hex)?;
        GatewayEvent::from_slice(payload)
    }
}

/// Performs constant-time comparison of two byte slices.
///
/// Prevents timing attacks that could leak the expected signature.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Computes the hex HMAC-SHA256 digest for use in test fixtures.
#[cfg(test)]
pub fn compute_test_signature(secret: &str, payload: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}
