use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::IntegrationError;
use crate::models::{
    Contract, Customer, NewUploadRecord, PartnerIntegrationConfig, UploadRecord, UploadState,
};
use crate::provider::types::ProviderClient;

/// Keyed-query surface of the record store, as consumed by the
/// orchestrators. The dashboard owns the schema; this subsystem only
/// reads contracts, customers and partner configuration, and writes the
/// upload log and imported customers.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Reads a contract together with its customer.
    async fn contract_with_customer(
        &self,
        contract_id: Uuid,
    ) -> Result<Option<(Contract, Customer)>, IntegrationError>;

    /// Reads the provider configuration for a partner.
    async fn partner_config(
        &self,
        partner_id: Uuid,
    ) -> Result<Option<PartnerIntegrationConfig>, IntegrationError>;

    /// Appends one attempt to the upload log and moves the contract's
    /// status row accordingly, in a single transaction.
    async fn record_upload(
        &self,
        record: NewUploadRecord,
    ) -> Result<UploadRecord, IntegrationError>;

    /// Current upload state of a contract.
    async fn upload_state(&self, contract_id: Uuid) -> Result<UploadState, IntegrationError>;

    /// Most recent attempt for a contract, if any.
    async fn latest_upload(
        &self,
        contract_id: Uuid,
    ) -> Result<Option<UploadRecord>, IntegrationError>;

    /// Full attempt history for a contract, newest first.
    async fn upload_history(
        &self,
        contract_id: Uuid,
    ) -> Result<Vec<UploadRecord>, IntegrationError>;

    /// Local customer already mapped to a provider client, if any.
    /// Import duplicate-prevention key.
    async fn find_customer_by_provider_client(
        &self,
        provider_client_id: i64,
    ) -> Result<Option<Uuid>, IntegrationError>;

    /// Creates a local customer from an imported provider client.
    async fn insert_imported_customer(
        &self,
        client: &ProviderClient,
    ) -> Result<Uuid, IntegrationError>;
}

/// Postgres-backed record store.
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn contract_with_customer(
        &self,
        contract_id: Uuid,
    ) -> Result<Option<(Contract, Customer)>, IntegrationError> {
        let contract = sqlx::query_as::<_, Contract>(
            r#"
            SELECT
                id, customer_id, service_name, service_type, cost, currency,
                start_date, end_date, payment_terms_code, max_entries,
                created_at, updated_at
            FROM contracts
            WHERE id = $1
            "#,
        )
        .bind(contract_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(contract) = contract else {
            return Ok(None);
        };

        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT
                id, company_name, first_name, second_name, vat_number, fiscal_code,
                address_street, address_postal_code, address_city, address_province,
                country, certified_email, email, phone, provider_client_id,
                created_at, updated_at
            FROM customers
            WHERE id = $1
            "#,
        )
        .bind(contract.customer_id)
        .fetch_optional(&self.pool)
        .await?;

        match customer {
            Some(customer) => Ok(Some((contract, customer))),
            None => Err(IntegrationError::RecordNotFound {
                entity: "customer",
                id: contract.customer_id.to_string(),
            }),
        }
    }

    async fn partner_config(
        &self,
        partner_id: Uuid,
    ) -> Result<Option<PartnerIntegrationConfig>, IntegrationError> {
        let config = sqlx::query_as::<_, PartnerIntegrationConfig>(
            r#"
            SELECT
                partner_id, enabled, company_id, api_token, default_vat_rate,
                document_type, created_at, updated_at
            FROM partner_integrations
            WHERE partner_id = $1
            "#,
        )
        .bind(partner_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(config)
    }

    async fn record_upload(
        &self,
        record: NewUploadRecord,
    ) -> Result<UploadRecord, IntegrationError> {
        let mut tx = self.pool.begin().await?;

        let saved = sqlx::query_as::<_, UploadRecord>(
            r#"
            INSERT INTO upload_records (
                id, contract_id, status, provider_invoice_id,
                provider_invoice_number, error_message
            ) VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING
                id, contract_id, status, provider_invoice_id,
                provider_invoice_number, error_message, uploaded_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.contract_id)
        .bind(record.status)
        .bind(record.provider_invoice_id)
        .bind(record.provider_invoice_number.as_deref())
        .bind(record.error_message.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        // An uploaded contract never drops back to failed: the success
        // record keeps existing in the log.
        sqlx::query(
            r#"
            INSERT INTO contract_upload_status (contract_id, status, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (contract_id) DO UPDATE
            SET status = CASE
                    WHEN contract_upload_status.status = 'uploaded'
                        THEN contract_upload_status.status
                    ELSE EXCLUDED.status
                END,
                updated_at = NOW()
            "#,
        )
        .bind(record.contract_id)
        .bind(record.resulting_state())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            contract_id = %saved.contract_id,
            status = %saved.status,
            "recorded upload attempt"
        );
        Ok(saved)
    }

    async fn upload_state(&self, contract_id: Uuid) -> Result<UploadState, IntegrationError> {
        let state = sqlx::query_scalar::<_, UploadState>(
            "SELECT status FROM contract_upload_status WHERE contract_id = $1",
        )
        .bind(contract_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(state.unwrap_or(UploadState::NeverAttempted))
    }

    async fn latest_upload(
        &self,
        contract_id: Uuid,
    ) -> Result<Option<UploadRecord>, IntegrationError> {
        let record = sqlx::query_as::<_, UploadRecord>(
            r#"
            SELECT
                id, contract_id, status, provider_invoice_id,
                provider_invoice_number, error_message, uploaded_at
            FROM upload_records
            WHERE contract_id = $1
            ORDER BY uploaded_at DESC
            LIMIT 1
            "#,
        )
        .bind(contract_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn upload_history(
        &self,
        contract_id: Uuid,
    ) -> Result<Vec<UploadRecord>, IntegrationError> {
        let records = sqlx::query_as::<_, UploadRecord>(
            r#"
            SELECT
                id, contract_id, status, provider_invoice_id,
                provider_invoice_number, error_message, uploaded_at
            FROM upload_records
            WHERE contract_id = $1
            ORDER BY uploaded_at DESC
            "#,
        )
        .bind(contract_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn find_customer_by_provider_client(
        &self,
        provider_client_id: i64,
    ) -> Result<Option<Uuid>, IntegrationError> {
        let id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM customers WHERE provider_client_id = $1",
        )
        .bind(provider_client_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    async fn insert_imported_customer(
        &self,
        client: &ProviderClient,
    ) -> Result<Uuid, IntegrationError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO customers (
                id, company_name, vat_number, email, address_city, provider_client_id
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(&client.name)
        .bind(client.vat_number.as_deref())
        .bind(client.email.as_deref())
        .bind(client.city.as_deref())
        .bind(client.id)
        .execute(&self.pool)
        .await?;

        info!(customer_id = %id, provider_client_id = client.id, "imported provider client");
        Ok(id)
    }
}
