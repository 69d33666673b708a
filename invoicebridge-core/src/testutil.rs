//! In-memory collaborators for orchestrator tests.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use crate::error::IntegrationError;
use crate::gateway::ProviderGateway;
use crate::models::{
    Contract, Customer, NewUploadRecord, PartnerIntegrationConfig, UploadRecord, UploadState,
};
use crate::provider::types::{
    ClientPage, CreatedDocument, InvoiceDocumentPayload, ProviderClient,
};
use crate::store::RecordStore;

pub fn sample_contract(service_type: &str) -> Contract {
    Contract {
        id: Uuid::new_v4(),
        customer_id: Uuid::new_v4(),
        service_name: "Sala prove".to_string(),
        service_type: service_type.to_string(),
        cost: Decimal::new(10000, 2),
        currency: "EUR".to_string(),
        start_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        end_date: None,
        payment_terms_code: Some("net_30".to_string()),
        max_entries: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn sample_customer() -> Customer {
    Customer {
        id: Uuid::new_v4(),
        company_name: Some("Banda Larga Srl".to_string()),
        first_name: None,
        second_name: None,
        vat_number: Some("IT01234567890".to_string()),
        fiscal_code: None,
        address_street: Some("Via Roma 1".to_string()),
        address_postal_code: Some("20100".to_string()),
        address_city: Some("Milano".to_string()),
        address_province: Some("MI".to_string()),
        country: None,
        certified_email: None,
        email: Some("info@bandalarga.it".to_string()),
        phone: None,
        provider_client_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn sample_config(enabled: bool) -> PartnerIntegrationConfig {
    PartnerIntegrationConfig {
        partner_id: Uuid::new_v4(),
        enabled,
        company_id: Some("1234".to_string()),
        api_token: Some("tok".to_string()),
        default_vat_rate: Decimal::new(22, 0),
        document_type: "proforma".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn provider_client(id: i64, name: &str) -> ProviderClient {
    ProviderClient {
        id,
        name: name.to_string(),
        vat_number: Some(format!("IT{id:011}")),
        email: None,
        city: Some("Milano".to_string()),
    }
}

pub fn page_of(data: Vec<ProviderClient>, current: i64, last: i64, total: i64) -> ClientPage {
    let per_page = 10;
    let from = if data.is_empty() {
        None
    } else {
        Some((current - 1) * per_page + 1)
    };
    let to = from.map(|f| f + data.len() as i64 - 1);
    ClientPage {
        current_page: current,
        last_page: last,
        per_page,
        total,
        from,
        to,
        data,
    }
}

/// In-memory record store.
#[derive(Default)]
pub struct MemoryStore {
    contracts: Mutex<HashMap<Uuid, (Contract, Customer)>>,
    configs: Mutex<HashMap<Uuid, PartnerIntegrationConfig>>,
    uploads: Mutex<Vec<UploadRecord>>,
    states: Mutex<HashMap<Uuid, UploadState>>,
    provider_mapping: Mutex<HashMap<i64, Uuid>>,
    imported: Mutex<Vec<ProviderClient>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_contract(&self, contract: Contract, mut customer: Customer) {
        customer.id = contract.customer_id;
        self.contracts
            .lock()
            .unwrap()
            .insert(contract.id, (contract, customer));
    }

    pub fn put_config(&self, config: PartnerIntegrationConfig) {
        self.configs
            .lock()
            .unwrap()
            .insert(config.partner_id, config);
    }

    pub fn map_provider_client(&self, provider_client_id: i64) {
        self.provider_mapping
            .lock()
            .unwrap()
            .insert(provider_client_id, Uuid::new_v4());
    }

    pub fn uploads_for(&self, contract_id: Uuid) -> Vec<UploadRecord> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.contract_id == contract_id)
            .cloned()
            .collect()
    }

    pub fn imported_count(&self) -> usize {
        self.imported.lock().unwrap().len()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn contract_with_customer(
        &self,
        contract_id: Uuid,
    ) -> Result<Option<(Contract, Customer)>, IntegrationError> {
        Ok(self.contracts.lock().unwrap().get(&contract_id).cloned())
    }

    async fn partner_config(
        &self,
        partner_id: Uuid,
    ) -> Result<Option<PartnerIntegrationConfig>, IntegrationError> {
        Ok(self.configs.lock().unwrap().get(&partner_id).cloned())
    }

    async fn record_upload(
        &self,
        record: NewUploadRecord,
    ) -> Result<UploadRecord, IntegrationError> {
        let saved = UploadRecord {
            id: Uuid::new_v4(),
            contract_id: record.contract_id,
            status: record.status,
            provider_invoice_id: record.provider_invoice_id,
            provider_invoice_number: record.provider_invoice_number.clone(),
            error_message: record.error_message.clone(),
            uploaded_at: Utc::now(),
        };
        self.uploads.lock().unwrap().push(saved.clone());

        let mut states = self.states.lock().unwrap();
        let current = states
            .get(&record.contract_id)
            .copied()
            .unwrap_or(UploadState::NeverAttempted);
        if current != UploadState::Uploaded {
            states.insert(record.contract_id, record.resulting_state());
        }
        Ok(saved)
    }

    async fn upload_state(&self, contract_id: Uuid) -> Result<UploadState, IntegrationError> {
        Ok(self
            .states
            .lock()
            .unwrap()
            .get(&contract_id)
            .copied()
            .unwrap_or(UploadState::NeverAttempted))
    }

    async fn latest_upload(
        &self,
        contract_id: Uuid,
    ) -> Result<Option<UploadRecord>, IntegrationError> {
        Ok(self
            .uploads
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.contract_id == contract_id)
            .last()
            .cloned())
    }

    async fn upload_history(
        &self,
        contract_id: Uuid,
    ) -> Result<Vec<UploadRecord>, IntegrationError> {
        let mut records = self.uploads_for(contract_id);
        records.reverse();
        Ok(records)
    }

    async fn find_customer_by_provider_client(
        &self,
        provider_client_id: i64,
    ) -> Result<Option<Uuid>, IntegrationError> {
        Ok(self
            .provider_mapping
            .lock()
            .unwrap()
            .get(&provider_client_id)
            .copied())
    }

    async fn insert_imported_customer(
        &self,
        client: &ProviderClient,
    ) -> Result<Uuid, IntegrationError> {
        let id = Uuid::new_v4();
        self.provider_mapping.lock().unwrap().insert(client.id, id);
        self.imported.lock().unwrap().push(client.clone());
        Ok(id)
    }
}

/// Programmable gateway stub.
#[derive(Default)]
pub struct StubGateway {
    create_results: Mutex<VecDeque<Result<CreatedDocument, (u16, String)>>>,
    create_calls: AtomicUsize,
    list_results: Mutex<VecDeque<ClientPage>>,
    list_calls: AtomicUsize,
    last_page: Mutex<Option<i64>>,
    last_search: Mutex<Option<String>>,
    details_ok: Mutex<HashMap<i64, ProviderClient>>,
    details_fail: Mutex<HashMap<i64, (u16, String)>>,
    details_calls: AtomicUsize,
}

impl StubGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_create_success(&self, id: i64, number: Option<&str>) {
        self.create_results.lock().unwrap().push_back(Ok(CreatedDocument {
            id,
            number: number.map(String::from),
        }));
    }

    pub fn push_create_error(&self, status: u16, message: &str) {
        self.create_results
            .lock()
            .unwrap()
            .push_back(Err((status, message.to_string())));
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn push_page(&self, page: ClientPage) {
        self.list_results.lock().unwrap().push_back(page);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn last_requested_page(&self) -> Option<i64> {
        *self.last_page.lock().unwrap()
    }

    pub fn last_search(&self) -> Option<String> {
        self.last_search.lock().unwrap().clone()
    }

    pub fn put_details(&self, client: ProviderClient) {
        self.details_ok.lock().unwrap().insert(client.id, client);
    }

    pub fn fail_details(&self, client_id: i64, status: u16, message: &str) {
        self.details_fail
            .lock()
            .unwrap()
            .insert(client_id, (status, message.to_string()));
    }

    pub fn details_calls(&self) -> usize {
        self.details_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderGateway for StubGateway {
    async fn list_clients(
        &self,
        _config: &PartnerIntegrationConfig,
        page: i64,
        _per_page: i64,
        search: Option<&str>,
    ) -> Result<ClientPage, IntegrationError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_page.lock().unwrap() = Some(page);
        *self.last_search.lock().unwrap() = search.map(String::from);
        self.list_results
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(IntegrationError::ProviderApi {
                status: 500,
                message: "no stubbed page".to_string(),
            })
    }

    async fn client_details(
        &self,
        _config: &PartnerIntegrationConfig,
        client_id: i64,
    ) -> Result<ProviderClient, IntegrationError> {
        self.details_calls.fetch_add(1, Ordering::SeqCst);
        if let Some((status, message)) = self.details_fail.lock().unwrap().get(&client_id) {
            return Err(IntegrationError::ProviderApi {
                status: *status,
                message: message.clone(),
            });
        }
        self.details_ok
            .lock()
            .unwrap()
            .get(&client_id)
            .cloned()
            .ok_or(IntegrationError::ProviderApi {
                status: 404,
                message: "client not found".to_string(),
            })
    }

    async fn create_document(
        &self,
        _config: &PartnerIntegrationConfig,
        _payload: &InvoiceDocumentPayload,
    ) -> Result<CreatedDocument, IntegrationError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        match self.create_results.lock().unwrap().pop_front() {
            Some(Ok(created)) => Ok(created),
            Some(Err((status, message))) => {
                Err(IntegrationError::ProviderApi { status, message })
            }
            None => Err(IntegrationError::ProviderApi {
                status: 500,
                message: "no stubbed result".to_string(),
            }),
        }
    }
}
