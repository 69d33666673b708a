use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::IntegrationError;
use crate::gateway::ProviderGateway;
use crate::models::{Contract, Customer, NewUploadRecord, PartnerIntegrationConfig};
use crate::provider::build_document;
use crate::store::RecordStore;

/// Outcome of a single contract upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub success: bool,
    pub invoice_id: Option<i64>,
    pub invoice_number: Option<String>,
    pub error: Option<String>,
}

impl UploadOutcome {
    fn succeeded(invoice_id: i64, invoice_number: Option<String>) -> Self {
        Self {
            success: true,
            invoice_id: Some(invoice_id),
            invoice_number,
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            success: false,
            invoice_id: None,
            invoice_number: None,
            error: Some(error),
        }
    }
}

/// Uploads one contract to the provider.
///
/// Preconditions are checked in order (integration enabled, then
/// credentials present) and fail fast before any network call. Exactly
/// one upload record is written per invocation, success or failure,
/// before the outcome is returned. Only record-store failures surface
/// as `Err`.
pub async fn upload_contract(
    store: &dyn RecordStore,
    gateway: &dyn ProviderGateway,
    contract: &Contract,
    customer: &Customer,
    config: &PartnerIntegrationConfig,
) -> Result<UploadOutcome, IntegrationError> {
    if let Err(precondition) = config.ensure_ready() {
        warn!(contract_id = %contract.id, %precondition, "upload rejected before network call");
        let message = precondition.user_message();
        store
            .record_upload(NewUploadRecord::failure(contract.id, message.clone()))
            .await?;
        return Ok(UploadOutcome::failed(message));
    }

    let payload = build_document(contract, customer, config);

    match gateway.create_document(config, &payload).await {
        Ok(created) => {
            store
                .record_upload(NewUploadRecord::success(
                    contract.id,
                    created.id,
                    created.number.clone(),
                ))
                .await?;
            info!(
                contract_id = %contract.id,
                invoice_id = created.id,
                "contract uploaded to provider"
            );
            Ok(UploadOutcome::succeeded(created.id, created.number))
        }
        Err(err) => {
            warn!(contract_id = %contract.id, %err, "contract upload failed");
            let message = err.to_string();
            store
                .record_upload(NewUploadRecord::failure(contract.id, message.clone()))
                .await?;
            Ok(UploadOutcome::failed(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{UploadState, UploadStatus};
    use crate::testutil::{sample_config, sample_contract, sample_customer, MemoryStore, StubGateway};

    #[tokio::test]
    async fn successful_upload_records_invoice_identity() {
        let store = MemoryStore::new();
        let gateway = StubGateway::new();
        gateway.push_create_success(42, Some("2024/15"));

        let contract = sample_contract("abbonamento");
        let customer = sample_customer();
        let config = sample_config(true);

        let outcome = upload_contract(&store, &gateway, &contract, &customer, &config)
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.invoice_id, Some(42));
        assert_eq!(outcome.invoice_number.as_deref(), Some("2024/15"));

        let records = store.uploads_for(contract.id);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, UploadStatus::Success);
        assert_eq!(
            store.upload_state(contract.id).await.unwrap(),
            UploadState::Uploaded
        );
        assert_eq!(
            store
                .latest_upload(contract.id)
                .await
                .unwrap()
                .unwrap()
                .provider_invoice_number
                .as_deref(),
            Some("2024/15")
        );
    }

    #[tokio::test]
    async fn disabled_integration_is_recorded_without_a_network_call() {
        let store = MemoryStore::new();
        let gateway = StubGateway::new();

        let contract = sample_contract("abbonamento");
        let customer = sample_customer();
        let config = sample_config(false);

        let outcome = upload_contract(&store, &gateway, &contract, &customer, &config)
            .await
            .unwrap();

        assert!(!outcome.success);
        assert!(outcome.error.is_some());
        assert_eq!(gateway.create_calls(), 0);

        let records = store.uploads_for(contract.id);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, UploadStatus::Failed);
    }

    #[tokio::test]
    async fn missing_credentials_fail_after_the_enabled_check() {
        let store = MemoryStore::new();
        let gateway = StubGateway::new();

        let contract = sample_contract("abbonamento");
        let customer = sample_customer();
        let mut config = sample_config(true);
        config.api_token = None;

        let outcome = upload_contract(&store, &gateway, &contract, &customer, &config)
            .await
            .unwrap();

        assert!(!outcome.success);
        assert!(outcome
            .error
            .as_deref()
            .unwrap()
            .contains("missing the API token"));
        assert_eq!(gateway.create_calls(), 0);
    }

    #[tokio::test]
    async fn provider_error_is_recorded_with_status_and_message() {
        let store = MemoryStore::new();
        let gateway = StubGateway::new();
        gateway.push_create_error(422, "invalid entity");

        let contract = sample_contract("abbonamento");
        let customer = sample_customer();
        let config = sample_config(true);

        let outcome = upload_contract(&store, &gateway, &contract, &customer, &config)
            .await
            .unwrap();

        assert!(!outcome.success);
        let error = outcome.error.unwrap();
        assert!(error.contains("422"));
        assert!(error.contains("invalid entity"));

        let records = store.uploads_for(contract.id);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, UploadStatus::Failed);
        assert_eq!(
            store.upload_state(contract.id).await.unwrap(),
            UploadState::Failed
        );
    }
}
