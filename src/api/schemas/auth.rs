use crate::domain::claims::{AccessClaims, TokenValidation};
use crate::domain::user::Profile;
use crate::domain::{AppId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub profile: Profile,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registered {
    pub user_id: UserId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Login {
    pub email: String,
    pub password: String,
    pub app_id: AppId,
}

impl Login {
    /// # Errors
    /// Returns a message naming the first missing field.
    pub fn validate(&self) -> Result<(), String> {
        if self.email.trim().is_empty() {
            return Err("email is required".into());
        }
        if self.password.is_empty() {
            return Err("password is required".into());
        }
        if self.app_id == 0 {
            return Err("appId is required".into());
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Refresh {
    pub refresh_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Logout {
    pub refresh_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateToken {
    pub access_token: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenStatus {
    pub user_id: Option<UserId>,
    pub valid: bool,
    pub claims: Option<TokenClaims>,
}

impl From<TokenValidation> for TokenStatus {
    fn from(validation: TokenValidation) -> Self {
        Self { user_id: validation.user_id, valid: validation.valid, claims: validation.claims.map(Into::into) }
    }
}

/// Access token claims as exposed over HTTP.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    pub uid: UserId,
    pub email: String,
    pub app_id: AppId,
    pub is_admin: bool,
    pub exp: i64,
    #[serde(rename = "type")]
    pub token_type: String,
}

impl From<AccessClaims> for TokenClaims {
    fn from(claims: AccessClaims) -> Self {
        Self {
            uid: claims.uid,
            email: claims.email,
            app_id: claims.app_id,
            is_admin: claims.is_admin,
            exp: claims.exp,
            token_type: claims.token_type,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatus {
    pub is_admin: bool,
}
