pub mod handlers;
pub mod types;

use sqlx::PgPool;
use std::sync::Arc;

use crate::provider::ProviderApi;

pub use handlers::router;
pub use types::{ProxyErrorBody, ProxyRequest};

/// Application state shared by the proxy routes.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub db: PgPool,

    /// Provider API client
    pub provider: Arc<ProviderApi>,

    /// Secret used to validate caller identity tokens
    pub jwt_secret: String,
}
