use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use axum::Json;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use uuid::Uuid;

use crate::proxy::types::ProxyErrorBody;
use crate::proxy::AppState;

/// Container for the authenticated partner's id stored in request extensions.
#[derive(Clone, Debug)]
pub struct CurrentPartner(pub Uuid);

/// Claims expected inside the JWT for authenticated callers.
#[derive(Debug, Deserialize)]
pub struct Claims {
    /// Subject - the partner's UUID as a string.
    pub sub: String,
    pub exp: usize,
}

fn unauthorized() -> (StatusCode, Json<ProxyErrorBody>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ProxyErrorBody::new("unauthorized", None)),
    )
}

/// Middleware to validate a Bearer JWT in the `Authorization` header.
///
/// The proxy processes no request without a valid caller identity. On
/// success the partner id is attached to the request extensions and the
/// request is forwarded; on failure a `401 {error}` body is returned.
pub async fn jwt_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<ProxyErrorBody>)> {
    // Extract token from Authorization header
    let auth_header = req.headers().get("authorization");
    let token = match auth_header.and_then(|v| v.to_str().ok()) {
        Some(s) if s.starts_with("Bearer ") => &s[7..],
        _ => return Err(unauthorized()),
    };

    let decoding_key = DecodingKey::from_secret(state.jwt_secret.as_bytes());

    let decoded = match decode::<Claims>(token, &decoding_key, &Validation::new(Algorithm::HS256)) {
        Ok(c) => c.claims,
        Err(_) => return Err(unauthorized()),
    };

    // Parse subject as UUID and attach to request extensions for downstream handlers.
    let partner_id = match Uuid::parse_str(&decoded.sub) {
        Ok(id) => id,
        Err(_) => return Err(unauthorized()),
    };

    req.extensions_mut().insert(CurrentPartner(partner_id));

    Ok(next.run(req).await)
}
