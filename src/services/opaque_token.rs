use crate::error::{AppError, Result};
use base64::Engine;
use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};

/// Length of generated opaque tokens in bytes (256 bits of entropy).
pub const OPAQUE_TOKEN_BYTES: usize = 32;

#[derive(Debug)]
pub struct OpaqueToken;

impl OpaqueToken {
    /// Generates a cryptographically secure random string (32 bytes -> URL-safe Base64).
    ///
    /// # Errors
    /// Returns `AppError::Internal` if the OS random source fails.
    pub fn generate() -> Result<String> {
        let mut bytes = [0u8; OPAQUE_TOKEN_BYTES];
        OsRng.try_fill_bytes(&mut bytes).map_err(|e| {
            tracing::error!(error = %e, "OS random source failed");
            AppError::Internal
        })?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Hashes a token using SHA-256 for secure storage.
    #[must_use]
    pub fn hash(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }
}
