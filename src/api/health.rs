use crate::api::MgmtState;
use crate::api::schemas::health::HealthResponse;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

/// Liveness probe: returns 200 OK as long as the server is running.
pub async fn livez() -> impl IntoResponse {
    StatusCode::OK
}

/// Readiness probe: checks that the credential store answers.
pub async fn readyz(State(state): State<MgmtState>) -> impl IntoResponse {
    let (status_code, store_status) = match state.health_service.check_store().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!(error = %e, component = "store", "Readiness probe failed");
            (StatusCode::SERVICE_UNAVAILABLE, "error")
        }
    };

    let response = HealthResponse {
        status: if status_code == StatusCode::OK { "ok" } else { "error" }.to_string(),
        store: store_status.to_string(),
    };

    (status_code, Json(response))
}
