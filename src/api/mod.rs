use crate::services::app_service::AppService;
use crate::services::health_service::HealthService;
use crate::services::session_manager::SessionManager;
use crate::services::user_service::UserService;
use axum::body::Body;
use axum::http::{HeaderName, Request};
use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub mod apps;
pub mod auth;
pub mod health;
pub mod middleware;
pub mod schemas;
pub mod users;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// State of the public router.
#[derive(Clone, Debug)]
pub struct AppState {
    pub session_manager: SessionManager,
    pub user_service: UserService,
}

/// State of the management router: probes plus app and user administration.
#[derive(Clone, Debug)]
pub struct MgmtState {
    pub health_service: HealthService,
    pub app_service: AppService,
    pub user_service: UserService,
}

/// Configures and returns the public API router.
pub fn app_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/users", post(auth::register))
        .route("/users/me", get(users::me).patch(users::update_me).delete(users::delete_me))
        .route("/sessions", post(auth::login).delete(auth::logout))
        .route("/sessions/refresh", post(auth::refresh))
        .route("/tokens/validate", post(auth::validate_token))
        .route("/apps/{appId}/admins/{userId}", get(auth::is_admin));

    with_request_tracing(Router::new().nest("/v1", api_routes)).with_state(state)
}

/// Configures the management router, served on its own port.
pub fn mgmt_router(state: MgmtState) -> Router {
    let routes = Router::new()
        .route("/livez", get(health::livez))
        .route("/readyz", get(health::readyz))
        .route("/apps", get(apps::list_apps).post(apps::create_app))
        .route("/apps/{id}", get(apps::get_app).patch(apps::update_app).delete(apps::delete_app))
        .route("/apps/{id}/status", put(apps::set_status))
        .route("/apps/{id}/users", get(apps::list_app_users))
        .route("/apps/{id}/admins/{userId}", put(apps::grant_admin).delete(apps::revoke_admin))
        .route("/users", get(users::list_users));

    with_request_tracing(routes).with_state(state)
}

fn with_request_tracing<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(REQUEST_ID_HEADER)))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .extensions()
                        .get::<RequestId>()
                        .and_then(|id| id.header_value().to_str().ok())
                        .unwrap_or_default()
                        .to_string();

                    tracing::info_span!(
                        "request",
                        "request_id" = %request_id,
                        "http.request.method" = %request.method(),
                        "url.path" = %request.uri().path(),
                        "http.response.status_code" = tracing::field::Empty,
                        "otel.kind" = "server",
                        "user_id" = tracing::field::Empty,
                    )
                })
                .on_response(|response: &axum::http::Response<_>, latency: std::time::Duration, span: &tracing::Span| {
                    let status = response.status();
                    span.record("http.response.status_code", status.as_u16());

                    tracing::info!(
                        latency_ms = %latency.as_millis(),
                        status = %status.as_u16(),
                        "request completed"
                    );
                })
                .on_failure(|error, _latency, _span: &tracing::Span| {
                    tracing::error!(error = %error, "request failed");
                }),
        )
        .layer(SetRequestIdLayer::new(HeaderName::from_static(REQUEST_ID_HEADER), MakeRequestUuid))
}
