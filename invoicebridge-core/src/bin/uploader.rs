use dotenv::dotenv;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use invoicebridge_core::db;
use invoicebridge_core::gateway::DirectGateway;
use invoicebridge_core::provider::ProviderApi;
use invoicebridge_core::store::PgRecordStore;
use invoicebridge_core::upload::{bulk_upload, Pacer};

/// Worker binary running a bulk upload from the trusted side.
///
/// Usage: `uploader <partner-id> <contract-id> [<contract-id> ...]`
///
/// Once started, the batch runs to completion: individual failures are
/// reported in the summary, never aborting the remaining contracts.
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

    let mut args = std::env::args().skip(1);
    let partner_id = args
        .next()
        .ok_or_else(|| anyhow::anyhow!("usage: uploader <partner-id> <contract-id>..."))?
        .parse::<Uuid>()
        .map_err(|_| anyhow::anyhow!("partner id must be a UUID"))?;
    let contract_ids = args
        .map(|raw| {
            raw.parse::<Uuid>()
                .map_err(|_| anyhow::anyhow!("contract id {raw} is not a UUID"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if contract_ids.is_empty() {
        return Err(anyhow::anyhow!("no contract ids given"));
    }

    info!(
        "Starting InvoiceBridge bulk uploader for {} contract(s)...",
        contract_ids.len()
    );

    // Initialize database connection pool
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
    let db_pool = db::create_pool(&database_url).await?;
    let store = PgRecordStore::new(db_pool);

    let provider_base = std::env::var("PROVIDER_API_BASE")
        .unwrap_or_else(|_| "https://api.invoicing-provider.example".to_string());
    let gateway = DirectGateway::new(ProviderApi::new(provider_base));

    // Inter-call delay policy (default: 1 second)
    let pacer = std::env::var("UPLOAD_DELAY_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Pacer::from_millis)
        .unwrap_or_default();

    let outcomes = match bulk_upload(&store, &gateway, partner_id, &contract_ids, &pacer).await {
        Ok(outcomes) => outcomes,
        Err(e) => {
            error!("Bulk upload rejected: {}", e);
            return Err(e.into());
        }
    };

    let succeeded = outcomes.iter().filter(|o| o.success).count();
    for outcome in &outcomes {
        if outcome.success {
            info!(
                "Contract {}: uploaded as invoice {:?} {:?}",
                outcome.contract_id, outcome.invoice_id, outcome.invoice_number
            );
        } else {
            error!(
                "Contract {}: failed ({})",
                outcome.contract_id,
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
    info!("Bulk upload finished: {}/{} succeeded", succeeded, outcomes.len());

    Ok(())
}
