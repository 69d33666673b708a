use async_trait::async_trait;
use std::time::Duration;

use crate::error::IntegrationError;
use crate::models::PartnerIntegrationConfig;
use crate::provider::api::{ProviderApi, RawResponse};
use crate::provider::types::{
    ClientPage, CreatedDocument, DataEnvelope, InvoiceDocumentPayload, ProviderClient,
};
use crate::proxy::types::ProxyRequest;

/// The three provider operations orchestrators can reach, exactly
/// matching the proxy's action surface.
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    async fn list_clients(
        &self,
        config: &PartnerIntegrationConfig,
        page: i64,
        per_page: i64,
        search: Option<&str>,
    ) -> Result<ClientPage, IntegrationError>;

    async fn client_details(
        &self,
        config: &PartnerIntegrationConfig,
        client_id: i64,
    ) -> Result<ProviderClient, IntegrationError>;

    async fn create_document(
        &self,
        config: &PartnerIntegrationConfig,
        payload: &InvoiceDocumentPayload,
    ) -> Result<CreatedDocument, IntegrationError>;
}

fn credentials(config: &PartnerIntegrationConfig) -> Result<(&str, &str), IntegrationError> {
    match (config.company_id.as_deref(), config.api_token.as_deref()) {
        (Some(company), Some(token))
            if !company.trim().is_empty() && !token.trim().is_empty() =>
        {
            Ok((company, token))
        }
        _ => Err(IntegrationError::MissingCredentials),
    }
}

/// Trusted server-side gateway: calls the provider API directly. Used by
/// the worker binary, where the partner credentials are already inside
/// the trust boundary.
pub struct DirectGateway {
    api: ProviderApi,
}

impl DirectGateway {
    pub fn new(api: ProviderApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ProviderGateway for DirectGateway {
    async fn list_clients(
        &self,
        config: &PartnerIntegrationConfig,
        page: i64,
        per_page: i64,
        search: Option<&str>,
    ) -> Result<ClientPage, IntegrationError> {
        let (company_id, token) = credentials(config)?;
        self.api
            .list_clients(company_id, token, page, per_page, search)
            .await?
            .decode::<ClientPage>()
    }

    async fn client_details(
        &self,
        config: &PartnerIntegrationConfig,
        client_id: i64,
    ) -> Result<ProviderClient, IntegrationError> {
        let (company_id, token) = credentials(config)?;
        let envelope: DataEnvelope<ProviderClient> = self
            .api
            .client_details(company_id, token, client_id)
            .await?
            .decode()?;
        Ok(envelope.data)
    }

    async fn create_document(
        &self,
        config: &PartnerIntegrationConfig,
        payload: &InvoiceDocumentPayload,
    ) -> Result<CreatedDocument, IntegrationError> {
        let (company_id, token) = credentials(config)?;
        let envelope: DataEnvelope<CreatedDocument> = self
            .api
            .create_document(company_id, token, payload)
            .await?
            .decode()?;
        Ok(envelope.data)
    }
}

/// Untrusted-side gateway: posts the tagged envelope to the proxy with
/// the caller's identity token. The partner API token only appears in
/// the request body crossing into the trust boundary.
pub struct HttpProxyGateway {
    proxy_url: String,
    caller_token: String,
    http: reqwest::Client,
}

impl HttpProxyGateway {
    pub fn new(proxy_url: impl Into<String>, caller_token: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            proxy_url: proxy_url.into(),
            caller_token: caller_token.into(),
            http,
        }
    }

    async fn dispatch(&self, request: &ProxyRequest) -> Result<RawResponse, IntegrationError> {
        let response = self
            .http
            .post(&self.proxy_url)
            .bearer_auth(&self.caller_token)
            .json(request)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status == 401 {
            return Err(IntegrationError::Unauthorized);
        }
        let text = response.text().await?;
        let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));
        Ok(RawResponse { status, body })
    }
}

#[async_trait]
impl ProviderGateway for HttpProxyGateway {
    async fn list_clients(
        &self,
        config: &PartnerIntegrationConfig,
        page: i64,
        per_page: i64,
        search: Option<&str>,
    ) -> Result<ClientPage, IntegrationError> {
        let (company_id, token) = credentials(config)?;
        let request = ProxyRequest::FetchClients {
            company_id: company_id.to_string(),
            access_token: token.to_string(),
            page,
            per_page,
            search: search.map(String::from),
        };
        self.dispatch(&request).await?.decode::<ClientPage>()
    }

    async fn client_details(
        &self,
        config: &PartnerIntegrationConfig,
        client_id: i64,
    ) -> Result<ProviderClient, IntegrationError> {
        let (company_id, token) = credentials(config)?;
        let request = ProxyRequest::FetchClientDetails {
            company_id: company_id.to_string(),
            access_token: token.to_string(),
            client_id,
        };
        let envelope: DataEnvelope<ProviderClient> = self.dispatch(&request).await?.decode()?;
        Ok(envelope.data)
    }

    async fn create_document(
        &self,
        config: &PartnerIntegrationConfig,
        payload: &InvoiceDocumentPayload,
    ) -> Result<CreatedDocument, IntegrationError> {
        let (company_id, token) = credentials(config)?;
        let request = ProxyRequest::CreateDocument {
            company_id: company_id.to_string(),
            access_token: token.to_string(),
            document: payload.clone(),
        };
        let envelope: DataEnvelope<CreatedDocument> = self.dispatch(&request).await?.decode()?;
        Ok(envelope.data)
    }
}
