//! Request signature verification.
//!
//! Discord signs every interaction request with Ed25519. The signed message is
//! the `X-Signature-Timestamp` header value followed by the raw request body.

use async_trait::async_trait;
use ed25519_dalek::{Signature, Verifier, VerifyingKey, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
use tracing::debug;

use crate::error::DiscordError;

/// Verifies that a request body was signed by the platform.
///
/// Returns `false` for any malformed input; a verifier never errors.
#[async_trait]
pub trait SignatureVerifier: Send + Sync {
    async fn verify(&self, body: &[u8], signature: &str, timestamp: &str) -> bool;
}

/// Ed25519 verifier bound to an application's public key.
///
/// # Examples
///
/// ```rust,no_run
/// use discord_webhook_core::verification::{Ed25519Verifier, SignatureVerifier};
///
/// # async fn example(body: &[u8], signature: &str, timestamp: &str) -> Result<(), Box<dyn std::error::Error>> {
/// let verifier = Ed25519Verifier::from_hex(
///     "e3a1b1e1b0a4c2f6d9a8b7c6d5e4f3a2b1c0d9e8f7a6b5c4d3e2f1a0b9c8d7e6",
/// )?;
///
/// if !verifier.verify(body, signature, timestamp).await {
///     println!("Invalid signature - rejecting request");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Ed25519Verifier {
    key: VerifyingKey,
}

impl Ed25519Verifier {
    /// Build a verifier from the hex-encoded public key shown in the
    /// developer portal.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming `public_key` if the value is not
    /// 32 bytes of hex or is not a valid curve point.
    pub fn from_hex(public_key: &str) -> Result<Self, DiscordError> {
        let bytes = hex::decode(public_key.trim()).map_err(|e| {
            DiscordError::configuration("public_key", format!("Public key is not valid hex: {}", e))
        })?;
        let bytes: [u8; PUBLIC_KEY_LENGTH] = bytes.try_into().map_err(|b: Vec<u8>| {
            DiscordError::configuration(
                "public_key",
                format!(
                    "Public key must be {} bytes, got {}",
                    PUBLIC_KEY_LENGTH,
                    b.len()
                ),
            )
        })?;
        let key = VerifyingKey::from_bytes(&bytes).map_err(|e| {
            DiscordError::configuration("public_key", format!("Public key is invalid: {}", e))
        })?;
        Ok(Self { key })
    }

    pub fn from_key(key: VerifyingKey) -> Self {
        Self { key }
    }

    /// Synchronous form of [`SignatureVerifier::verify`].
    pub fn verify_sync(&self, body: &[u8], signature: &str, timestamp: &str) -> bool {
        let Ok(raw) = hex::decode(signature.trim()) else {
            debug!("Signature header is not valid hex");
            return false;
        };
        let Ok(raw) = <[u8; SIGNATURE_LENGTH]>::try_from(raw.as_slice()) else {
            debug!(length = raw.len(), "Signature has the wrong length");
            return false;
        };
        let signature = Signature::from_bytes(&raw);

        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);

        self.key.verify(&message, &signature).is_ok()
    }
}

impl std::fmt::Debug for Ed25519Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519Verifier")
            .field("public_key", &hex::encode(self.key.as_bytes()))
            .finish()
    }
}

#[async_trait]
impl SignatureVerifier for Ed25519Verifier {
    async fn verify(&self, body: &[u8], signature: &str, timestamp: &str) -> bool {
        self.verify_sync(body, signature, timestamp)
    }
}

#[cfg(test)]
#[path = "verification_tests.rs"]
mod tests;
