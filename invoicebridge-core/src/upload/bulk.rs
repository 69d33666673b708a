use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::error::IntegrationError;
use crate::gateway::ProviderGateway;
use crate::store::RecordStore;
use crate::upload::orchestrator::upload_contract;
use crate::upload::pacer::Pacer;

/// Per-contract outcome of a bulk upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkItemOutcome {
    pub contract_id: Uuid,
    pub success: bool,
    pub invoice_id: Option<i64>,
    pub invoice_number: Option<String>,
    pub error: Option<String>,
}

/// Uploads a set of contracts sequentially.
///
/// The partner configuration is fetched once up front; a disabled or
/// missing integration fails the whole batch before any per-item work.
/// Otherwise every input id produces exactly one outcome entry, in input
/// order: a contract that cannot be loaded, or whose upload fails, maps
/// to a failure entry and processing continues with the next id. The
/// pacer waits between attempts to respect provider rate limits.
///
/// The aggregate verdict belongs to the caller: this function only
/// returns the per-item list.
pub async fn bulk_upload(
    store: &dyn RecordStore,
    gateway: &dyn ProviderGateway,
    partner_id: Uuid,
    contract_ids: &[Uuid],
    pacer: &Pacer,
) -> Result<Vec<BulkItemOutcome>, IntegrationError> {
    let config = store
        .partner_config(partner_id)
        .await?
        .ok_or(IntegrationError::MissingCredentials)?;
    config.ensure_ready()?;

    info!(
        partner_id = %partner_id,
        contracts = contract_ids.len(),
        "starting bulk upload"
    );

    let mut outcomes = Vec::with_capacity(contract_ids.len());

    for (index, &contract_id) in contract_ids.iter().enumerate() {
        let outcome = match store.contract_with_customer(contract_id).await {
            Ok(Some((contract, customer))) => {
                match upload_contract(store, gateway, &contract, &customer, &config).await {
                    Ok(outcome) => BulkItemOutcome {
                        contract_id,
                        success: outcome.success,
                        invoice_id: outcome.invoice_id,
                        invoice_number: outcome.invoice_number,
                        error: outcome.error,
                    },
                    Err(err) => {
                        error!(contract_id = %contract_id, %err, "upload attempt errored");
                        failure(contract_id, err.to_string())
                    }
                }
            }
            Ok(None) => failure(
                contract_id,
                IntegrationError::RecordNotFound {
                    entity: "contract",
                    id: contract_id.to_string(),
                }
                .to_string(),
            ),
            Err(err) => {
                error!(contract_id = %contract_id, %err, "contract lookup failed");
                failure(contract_id, err.to_string())
            }
        };
        outcomes.push(outcome);

        // Rate limit between attempts, success or failure.
        if index + 1 < contract_ids.len() {
            pacer.pause().await;
        }
    }

    let succeeded = outcomes.iter().filter(|o| o.success).count();
    info!(
        partner_id = %partner_id,
        succeeded,
        total = outcomes.len(),
        "bulk upload finished"
    );

    Ok(outcomes)
}

fn failure(contract_id: Uuid, error: String) -> BulkItemOutcome {
    BulkItemOutcome {
        contract_id,
        success: false,
        invoice_id: None,
        invoice_number: None,
        error: Some(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{sample_config, sample_contract, sample_customer, MemoryStore, StubGateway};

    fn zero_pacer() -> Pacer {
        Pacer::from_millis(0)
    }

    #[tokio::test]
    async fn every_input_id_yields_one_outcome_in_order() {
        let store = MemoryStore::new();
        let gateway = StubGateway::new();
        let config = sample_config(true);
        let partner_id = config.partner_id;
        store.put_config(config);

        // Three contracts: first succeeds, second is unknown to the
        // store, third fails at the provider.
        let first = sample_contract("abbonamento");
        let third = sample_contract("pacchetto");
        store.put_contract(first.clone(), sample_customer());
        store.put_contract(third.clone(), sample_customer());
        let missing = Uuid::new_v4();

        gateway.push_create_success(7, Some("2024/1"));
        gateway.push_create_error(429, "rate limited");

        let ids = vec![first.id, missing, third.id];
        let outcomes = bulk_upload(&store, &gateway, partner_id, &ids, &zero_pacer())
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].contract_id, first.id);
        assert!(outcomes[0].success);
        assert_eq!(outcomes[0].invoice_id, Some(7));

        assert_eq!(outcomes[1].contract_id, missing);
        assert!(!outcomes[1].success);
        assert!(outcomes[1].error.as_deref().unwrap().contains("not found"));

        assert_eq!(outcomes[2].contract_id, third.id);
        assert!(!outcomes[2].success);
        assert!(outcomes[2].error.as_deref().unwrap().contains("429"));
    }

    #[tokio::test]
    async fn disabled_integration_fails_the_whole_batch_with_no_attempts() {
        let store = MemoryStore::new();
        let gateway = StubGateway::new();
        let config = sample_config(false);
        let partner_id = config.partner_id;
        store.put_config(config);

        let contract = sample_contract("abbonamento");
        store.put_contract(contract.clone(), sample_customer());

        let result = bulk_upload(
            &store,
            &gateway,
            partner_id,
            &[contract.id],
            &zero_pacer(),
        )
        .await;

        assert!(matches!(result, Err(IntegrationError::IntegrationDisabled)));
        assert_eq!(gateway.create_calls(), 0);
        assert!(store.uploads_for(contract.id).is_empty());
    }

    #[tokio::test]
    async fn unknown_partner_fails_the_whole_batch() {
        let store = MemoryStore::new();
        let gateway = StubGateway::new();

        let result = bulk_upload(
            &store,
            &gateway,
            Uuid::new_v4(),
            &[Uuid::new_v4()],
            &zero_pacer(),
        )
        .await;

        assert!(matches!(result, Err(IntegrationError::MissingCredentials)));
        assert_eq!(gateway.create_calls(), 0);
    }

    #[tokio::test]
    async fn empty_input_produces_empty_output() {
        let store = MemoryStore::new();
        let gateway = StubGateway::new();
        let config = sample_config(true);
        let partner_id = config.partner_id;
        store.put_config(config);

        let outcomes = bulk_upload(&store, &gateway, partner_id, &[], &zero_pacer())
            .await
            .unwrap();
        assert!(outcomes.is_empty());
    }
}
