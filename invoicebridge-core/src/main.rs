use dotenv::dotenv;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use invoicebridge_core::db;
use invoicebridge_core::provider::ProviderApi;
use invoicebridge_core::proxy::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive(LevelFilter::INFO.into());

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();

    info!("Starting InvoiceBridge proxy server...");

    // Initialize database connection pool
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
    let db_pool = db::create_pool(&database_url).await?;

    let provider_base = std::env::var("PROVIDER_API_BASE")
        .unwrap_or_else(|_| "https://api.invoicing-provider.example".to_string());
    let jwt_secret = std::env::var("JWT_SECRET")
        .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?;

    // Create application state
    let app_state = AppState {
        db: db_pool,
        provider: Arc::new(ProviderApi::new(provider_base)),
        jwt_secret,
    };

    // Create router
    let app = proxy::router(app_state);

    // Get server configuration
    let host = std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("SERVER_PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .map_err(|_| anyhow::anyhow!("Invalid SERVER_PORT"))?;

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}:{}: {}", host, port, e))?;

    info!("Proxy listening on {}:{}", host, port);

    // Start the server
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
