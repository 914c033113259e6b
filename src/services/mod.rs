pub mod app_service;
pub mod health_service;
pub mod opaque_token;
pub mod password;
pub mod session_manager;
pub mod token_signer;
pub mod user_service;

use crate::error::{AppError, Result};
use std::future::Future;
use std::time::Duration;

/// Runs a store call under `limit`, failing with `AppError::Timeout` instead of hanging.
pub(crate) async fn bounded<T, F>(limit: Duration, operation: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(limit, fut).await.unwrap_or_else(|_| {
        tracing::warn!(operation, timeout = ?limit, "Store call timed out");
        Err(AppError::Timeout)
    })
}
