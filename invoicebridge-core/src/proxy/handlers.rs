use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::Value;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::auth::{self, CurrentPartner};
use crate::error::IntegrationError;
use crate::provider::api::RawResponse;
use crate::proxy::types::{ProxyErrorBody, ProxyRequest};
use crate::proxy::AppState;

/// Health check endpoint.
async fn health_check() -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "invoicebridge-core",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Database health check endpoint.
async fn db_health_check(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    sqlx::query("SELECT 1")
        .execute(&state.db)
        .await
        .map_err(|e| {
            error!("Database health check failed: {}", e);
            StatusCode::SERVICE_UNAVAILABLE
        })?;

    Ok(Json(serde_json::json!({
        "status": "ok",
        "database": "connected"
    })))
}

/// Proxy entry point.
///
/// Dispatches the tagged request to the provider API and forwards the
/// upstream status code and body back unchanged, success or error, so
/// callers can inspect provider-specific shapes. Internal failures map
/// to a 502 `{error, details}` body.
async fn provider_handler(
    State(state): State<AppState>,
    Extension(CurrentPartner(partner_id)): Extension<CurrentPartner>,
    Json(request): Json<ProxyRequest>,
) -> Response {
    info!(
        action = request.action_name(),
        partner_id = %partner_id,
        "proxying provider request"
    );

    let result = match &request {
        ProxyRequest::FetchClients {
            company_id,
            access_token,
            page,
            per_page,
            search,
        } => {
            state
                .provider
                .list_clients(company_id, access_token, *page, *per_page, search.as_deref())
                .await
        }
        ProxyRequest::FetchClientDetails {
            company_id,
            access_token,
            client_id,
        } => {
            state
                .provider
                .client_details(company_id, access_token, *client_id)
                .await
        }
        ProxyRequest::CreateDocument {
            company_id,
            access_token,
            document,
        } => {
            state
                .provider
                .create_document(company_id, access_token, document)
                .await
        }
    };

    match result {
        Ok(upstream) => passthrough(upstream),
        Err(err) => {
            error!(action = request.action_name(), %err, "proxy dispatch failed");
            let status = match err {
                IntegrationError::Network(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (
                status,
                Json(ProxyErrorBody::new(
                    "provider request failed",
                    Some(err.user_message()),
                )),
            )
                .into_response()
        }
    }
}

/// Forwards the upstream response verbatim: same status code, same body.
fn passthrough(upstream: RawResponse) -> Response {
    let status = StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::BAD_GATEWAY);
    (status, Json(upstream.body)).into_response()
}

/// Creates the proxy application router.
///
/// The provider endpoint sits behind the caller-identity middleware;
/// health endpoints stay public.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/provider", post(provider_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::jwt_middleware,
        ))
        .route("/health", get(health_check))
        .route("/health/db", get(db_health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
