use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::routing::patch;
use axum::routing::post;
use servicedesk_core::RequestDesk;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::auth::ApiKey;

pub mod error;
pub mod health;
pub mod openapi;
pub mod requests;

#[derive(Clone)]
pub struct AppState {
    pub desk: Arc<RequestDesk>,
    pub api_key: ApiKey,
}

impl AppState {
    pub fn new(desk: Arc<RequestDesk>, api_key: ApiKey) -> Self {
        Self { desk, api_key }
    }
}

/// Full application router. Create and status update require the API key;
/// everything else is public.
pub fn router(state: AppState) -> Router {
    let require_key = from_fn_with_state(state.api_key.clone(), auth::require_api_key);

    Router::new()
        .route(
            "/api/requests",
            get(requests::list_requests)
                .merge(post(requests::create_request).route_layer(require_key.clone())),
        )
        .route("/api/requests/{id}", get(requests::get_request))
        .route(
            "/api/requests/{id}/status",
            patch(requests::update_status).route_layer(require_key),
        )
        .with_state(state)
        .route("/health", get(health::health_handler))
        .route("/api-docs/openapi.json", get(openapi::openapi_json))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Serve `state` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "request service listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
