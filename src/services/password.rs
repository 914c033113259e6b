use crate::config::PasswordConfig;
use crate::error::{AppError, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
};
use rand::{RngCore, rngs::OsRng};
use std::sync::Arc;

const SALT_BYTES: usize = 16;
const DUMMY_PASSWORD: &str = "timing-equalizer";

/// Argon2id password hashing with a configurable work factor.
///
/// Hashes are PHC strings, so each one carries its own algorithm, parameters and salt
/// and verification needs nothing but the stored string.
#[derive(Clone, Debug)]
pub struct PasswordHasher {
    params: Params,
    dummy_hash: Arc<str>,
}

impl PasswordHasher {
    /// # Errors
    /// Returns `AppError::Internal` if the Argon2 parameters are out of range.
    pub fn new(config: &PasswordConfig) -> Result<Self> {
        let params = Params::new(config.m_cost, config.t_cost, config.p_cost, None).map_err(|e| {
            tracing::error!(error = %e, "Invalid Argon2 parameters");
            AppError::Internal
        })?;
        let dummy_hash = hash_with(&params, DUMMY_PASSWORD)?;
        Ok(Self { params, dummy_hash: Arc::from(dummy_hash) })
    }

    #[tracing::instrument(err, skip(self, password))]
    pub async fn hash(&self, password: &str) -> Result<String> {
        let password = password.to_string();
        let params = self.params.clone();
        tokio::task::spawn_blocking(move || hash_with(&params, &password)).await.map_err(|_| AppError::Internal)?
    }

    /// Constant-time check of `password` against a stored hash.
    ///
    /// A malformed stored hash reports `false` after doing the same amount of work as a
    /// real comparison.
    #[tracing::instrument(err, skip(self, password, password_hash))]
    pub async fn verify(&self, password: &str, password_hash: &str) -> Result<bool> {
        let password = password.to_string();
        let password_hash = password_hash.to_string();
        let dummy_hash = Arc::clone(&self.dummy_hash);
        tokio::task::spawn_blocking(move || verify_with(&password, &password_hash, &dummy_hash))
            .await
            .map_err(|_| AppError::Internal)
    }

    /// Burns one verification against the dummy hash. Used when there is no stored hash
    /// to compare with, so unknown accounts cost as much as wrong passwords.
    pub async fn verify_dummy(&self, password: &str) -> Result<()> {
        let dummy_hash = Arc::clone(&self.dummy_hash);
        self.verify(password, &dummy_hash).await.map(|_| ())
    }
}

fn hash_with(params: &Params, password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; SALT_BYTES];
    OsRng.try_fill_bytes(&mut salt_bytes).map_err(|e| {
        tracing::error!(error = %e, "OS random source failed");
        AppError::Internal
    })?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|_| AppError::Internal)?;

    Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone())
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| {
            tracing::error!(error = %e, "Password hashing failed");
            AppError::Internal
        })
}

fn verify_with(password: &str, password_hash: &str, dummy_hash: &str) -> bool {
    if let Ok(parsed_hash) = PasswordHash::new(password_hash) {
        return Argon2::default().verify_password(password.as_bytes(), &parsed_hash).is_ok();
    }

    tracing::warn!("Stored password hash is malformed");
    if let Ok(dummy) = PasswordHash::new(dummy_hash) {
        let _ = Argon2::default().verify_password(password.as_bytes(), &dummy);
    }
    false
}
