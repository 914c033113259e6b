use crate::domain::claims::{ACCESS_TOKEN_TYPE, AccessClaims};
use crate::domain::{AppId, UserId};
use crate::error::{AppError, Result};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use time::OffsetDateTime;

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Token is malformed")]
    Malformed,
    #[error("Unsupported signing algorithm")]
    UnsupportedAlgorithm,
    #[error("Missing claim: {0}")]
    MissingClaim(&'static str),
    #[error("Token has expired")]
    Expired,
    #[error("Signature mismatch")]
    InvalidSignature,
    #[error("Not an access token")]
    WrongType,
    #[error("Token names an unknown or disabled app")]
    UnknownApp,
    #[error("Secret lookup failed: {0}")]
    Lookup(AppError),
}

/// Who an access token is minted for.
#[derive(Debug, Clone, Copy)]
pub struct TokenSubject<'a> {
    pub user_id: UserId,
    pub email: &'a str,
    pub app_id: AppId,
    pub is_admin: bool,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: AccessClaims,
}

/// The only claim read before the signature is checked.
#[derive(Deserialize)]
struct UnverifiedClaims {
    app_id: Option<AppId>,
}

#[derive(Deserialize)]
struct VerifiedClaims {
    uid: Option<UserId>,
    app_id: Option<AppId>,
    #[serde(default)]
    email: String,
    #[serde(default)]
    is_admin: bool,
    exp: i64,
    #[serde(rename = "type")]
    token_type: Option<String>,
}

/// Mints and checks HS256 access tokens keyed by per-app secrets.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokenSigner;

impl TokenSigner {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Signs an access token for `subject` expiring `ttl` from now.
    ///
    /// # Errors
    /// Returns `AppError::Internal` if encoding fails.
    pub fn issue(&self, subject: &TokenSubject<'_>, secret: &str, ttl: Duration) -> Result<IssuedToken> {
        let exp = i64::try_from(ttl.as_secs())
            .ok()
            .and_then(|ttl_secs| OffsetDateTime::now_utc().unix_timestamp().checked_add(ttl_secs))
            .ok_or_else(|| {
                tracing::error!(ttl_secs = ttl.as_secs(), "Access token expiry out of range");
                AppError::Internal
            })?;
        let claims = AccessClaims {
            uid: subject.user_id,
            email: subject.email.to_string(),
            app_id: subject.app_id,
            is_admin: subject.is_admin,
            exp,
            token_type: ACCESS_TOKEN_TYPE.to_string(),
        };

        let token = encode(&Header::new(ALGORITHM), &claims, &EncodingKey::from_secret(secret.as_bytes()))
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to sign access token");
                AppError::Internal
            })?;

        Ok(IssuedToken { token, claims })
    }

    /// Verifies `token` against the secret of the app it claims to belong to.
    ///
    /// The `app_id` claim is read unauthenticated only to pick the key; nothing else is
    /// trusted until the second decode has checked the signature with that key.
    /// `secret_lookup` returns `Ok(None)` for unknown or disabled apps.
    ///
    /// # Errors
    /// Returns `TokenError::Lookup` if the lookup itself fails, and another `TokenError`
    /// variant if the token is rejected.
    pub async fn verify<F, Fut>(&self, token: &str, secret_lookup: F) -> std::result::Result<AccessClaims, TokenError>
    where
        F: FnOnce(AppId) -> Fut,
        Fut: Future<Output = Result<Option<String>>>,
    {
        let header = decode_header(token).map_err(|_| TokenError::Malformed)?;
        if header.alg != ALGORITHM {
            return Err(TokenError::UnsupportedAlgorithm);
        }

        let app_id = read_unverified(token)?.app_id.ok_or(TokenError::MissingClaim("app_id"))?;

        let secret = secret_lookup(app_id).await.map_err(TokenError::Lookup)?.ok_or(TokenError::UnknownApp)?;

        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let verified = decode::<VerifiedClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => TokenError::UnsupportedAlgorithm,
                ErrorKind::MissingRequiredClaim(_) => TokenError::MissingClaim("exp"),
                _ => TokenError::Malformed,
            })?
            .claims;

        let uid = verified.uid.ok_or(TokenError::MissingClaim("uid"))?;
        let verified_app_id = verified.app_id.ok_or(TokenError::MissingClaim("app_id"))?;
        if verified_app_id != app_id {
            return Err(TokenError::InvalidSignature);
        }
        if verified.token_type.as_deref() != Some(ACCESS_TOKEN_TYPE) {
            return Err(TokenError::WrongType);
        }

        Ok(AccessClaims {
            uid,
            email: verified.email,
            app_id,
            is_admin: verified.is_admin,
            exp: verified.exp,
            token_type: ACCESS_TOKEN_TYPE.to_string(),
        })
    }
}

fn read_unverified(token: &str) -> std::result::Result<UnverifiedClaims, TokenError> {
    let mut validation = Validation::new(ALGORITHM);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    decode::<UnverifiedClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|_| TokenError::Malformed)
}
