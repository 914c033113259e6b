use super::{AppId, UserId};
use serde::{Deserialize, Serialize};

pub const ACCESS_TOKEN_TYPE: &str = "access";

/// Claims carried by every access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub uid: UserId,
    pub email: String,
    pub app_id: AppId,
    pub is_admin: bool,
    pub exp: i64,
    #[serde(rename = "type")]
    pub token_type: String,
}

/// Result of validating an access token. Invalid tokens carry no user or claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenValidation {
    pub user_id: Option<UserId>,
    pub valid: bool,
    pub claims: Option<AccessClaims>,
}

impl TokenValidation {
    #[must_use]
    pub const fn invalid() -> Self {
        Self { user_id: None, valid: false, claims: None }
    }

    #[must_use]
    pub fn valid(claims: AccessClaims) -> Self {
        Self { user_id: Some(claims.uid), valid: true, claims: Some(claims) }
    }
}
