use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::IntegrationError;
use crate::gateway::ProviderGateway;
use crate::models::PartnerIntegrationConfig;
use crate::provider::types::{ClientPage, ProviderClient};
use crate::store::RecordStore;

/// Default page size for the provider client directory.
pub const DEFAULT_PER_PAGE: i64 = 10;

/// Phase of the client import workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportPhase {
    /// Nothing fetched yet
    Idle,
    /// A page fetch is in flight
    Loading,
    /// A non-empty page is listed
    Listed,
    /// The fetch came back with no clients
    Empty,
    /// An import of the selected clients is in flight
    Importing,
}

impl fmt::Display for ImportPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportPhase::Idle => write!(f, "idle"),
            ImportPhase::Loading => write!(f, "loading"),
            ImportPhase::Listed => write!(f, "listed"),
            ImportPhase::Empty => write!(f, "empty"),
            ImportPhase::Importing => write!(f, "importing"),
        }
    }
}

/// Pagination metadata of the currently listed page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationState {
    pub current_page: i64,
    pub last_page: i64,
    pub per_page: i64,
    pub total: i64,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

impl PaginationState {
    fn empty(per_page: i64) -> Self {
        Self {
            current_page: 1,
            last_page: 1,
            per_page,
            total: 0,
            from: None,
            to: None,
        }
    }

    fn update_from(&mut self, page: &ClientPage) {
        self.current_page = page.current_page;
        self.last_page = page.last_page;
        self.per_page = page.per_page;
        self.total = page.total;
        self.from = page.from;
        self.to = page.to;
    }
}

/// Per-client outcome of an import run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientImportResult {
    pub client_id: i64,
    pub success: bool,
    pub error: Option<String>,
}

/// Paginated, searchable import of the provider client directory.
///
/// Fetches pages through the gateway, tracks a page-scoped selection,
/// and maps selected clients into the local customer store. Imported
/// clients disappear from the candidate list so a rerun only targets
/// the remaining failures.
pub struct ClientImporter {
    gateway: Arc<dyn ProviderGateway>,
    store: Arc<dyn RecordStore>,
    config: PartnerIntegrationConfig,
    phase: ImportPhase,
    pagination: PaginationState,
    search_term: String,
    clients: Vec<ProviderClient>,
    selection: HashSet<i64>,
}

impl ClientImporter {
    pub fn new(
        gateway: Arc<dyn ProviderGateway>,
        store: Arc<dyn RecordStore>,
        config: PartnerIntegrationConfig,
    ) -> Self {
        Self {
            gateway,
            store,
            config,
            phase: ImportPhase::Idle,
            pagination: PaginationState::empty(DEFAULT_PER_PAGE),
            search_term: String::new(),
            clients: Vec::new(),
            selection: HashSet::new(),
        }
    }

    pub fn phase(&self) -> ImportPhase {
        self.phase
    }

    pub fn pagination(&self) -> &PaginationState {
        &self.pagination
    }

    pub fn clients(&self) -> &[ProviderClient] {
        &self.clients
    }

    pub fn selection(&self) -> &HashSet<i64> {
        &self.selection
    }

    /// Fetches one page of the client directory.
    ///
    /// A changed search term restarts from page 1. Every fetch replaces
    /// the listed clients and clears the selection.
    pub async fn fetch_page(&mut self, page: i64, search: &str) -> Result<(), IntegrationError> {
        self.config.ensure_ready()?;

        let page = if search != self.search_term {
            self.search_term = search.to_string();
            1
        } else {
            page
        };

        self.phase = ImportPhase::Loading;
        let search_term = if self.search_term.trim().is_empty() {
            None
        } else {
            Some(self.search_term.as_str())
        };

        match self
            .gateway
            .list_clients(&self.config, page, self.pagination.per_page, search_term)
            .await
        {
            Ok(listed) => {
                self.pagination.update_from(&listed);
                self.clients = listed.data;
                self.selection.clear();
                self.phase = if self.clients.is_empty() {
                    ImportPhase::Empty
                } else {
                    ImportPhase::Listed
                };
                info!(
                    page = self.pagination.current_page,
                    total = self.pagination.total,
                    "listed provider clients"
                );
                Ok(())
            }
            Err(err) => {
                warn!(%err, "client directory fetch failed");
                self.phase = if self.clients.is_empty() {
                    ImportPhase::Idle
                } else {
                    ImportPhase::Listed
                };
                Err(err)
            }
        }
    }

    /// Toggles one visible client in or out of the selection.
    pub fn toggle_selection(&mut self, client_id: i64) {
        if !self.clients.iter().any(|c| c.id == client_id) {
            return;
        }
        if !self.selection.remove(&client_id) {
            self.selection.insert(client_id);
        }
    }

    /// Selects every client visible on the current page. Selection never
    /// spans pages.
    pub fn select_all_visible(&mut self) {
        self.selection = self.clients.iter().map(|c| c.id).collect();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn can_next(&self) -> bool {
        self.phase != ImportPhase::Importing
            && self.pagination.current_page < self.pagination.last_page
    }

    pub fn can_previous(&self) -> bool {
        self.phase != ImportPhase::Importing && self.pagination.current_page > 1
    }

    pub async fn next_page(&mut self) -> Result<(), IntegrationError> {
        if !self.can_next() {
            return Ok(());
        }
        let search = self.search_term.clone();
        self.fetch_page(self.pagination.current_page + 1, &search).await
    }

    pub async fn previous_page(&mut self) -> Result<(), IntegrationError> {
        if !self.can_previous() {
            return Ok(());
        }
        let search = self.search_term.clone();
        self.fetch_page(self.pagination.current_page - 1, &search).await
    }

    /// Imports the selected clients into the local customer store.
    ///
    /// Produces exactly one result per selected client, in list order.
    /// A failure for one client never interrupts the rest. Afterwards
    /// the successfully imported clients are removed from the candidate
    /// list and the selection is cleared entirely, failures included.
    pub async fn import_selected(&mut self) -> Result<Vec<ClientImportResult>, IntegrationError> {
        self.config.ensure_ready()?;
        if self.selection.is_empty() {
            return Ok(Vec::new());
        }

        self.phase = ImportPhase::Importing;
        let targets: Vec<i64> = self
            .clients
            .iter()
            .map(|c| c.id)
            .filter(|id| self.selection.contains(id))
            .collect();

        let mut results = Vec::with_capacity(targets.len());
        let mut imported: HashSet<i64> = HashSet::new();

        for client_id in targets {
            match self.import_one(client_id).await {
                Ok(()) => {
                    imported.insert(client_id);
                    results.push(ClientImportResult {
                        client_id,
                        success: true,
                        error: None,
                    });
                }
                Err(err) => {
                    warn!(client_id, %err, "client import failed");
                    results.push(ClientImportResult {
                        client_id,
                        success: false,
                        error: Some(err.to_string()),
                    });
                }
            }
        }

        self.clients.retain(|c| !imported.contains(&c.id));
        self.selection.clear();
        self.phase = if self.clients.is_empty() {
            ImportPhase::Empty
        } else {
            ImportPhase::Listed
        };

        info!(
            imported = imported.len(),
            failed = results.len() - imported.len(),
            "client import finished"
        );
        Ok(results)
    }

    /// Imports one client: skips ids already mapped to a local customer,
    /// otherwise fetches the full record and creates the customer.
    async fn import_one(&self, client_id: i64) -> Result<(), IntegrationError> {
        if self
            .store
            .find_customer_by_provider_client(client_id)
            .await?
            .is_some()
        {
            info!(client_id, "client already imported, skipping insert");
            return Ok(());
        }

        let details = self.gateway.client_details(&self.config, client_id).await?;
        self.store.insert_imported_customer(&details).await?;
        Ok(())
    }
}
