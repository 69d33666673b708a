use reqwest::Method;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::IntegrationError;
use crate::provider::types::InvoiceDocumentPayload;

/// Raw provider response: upstream status code plus the body, parsed as
/// JSON when possible, kept as a string otherwise. The proxy passes this
/// through to callers unchanged.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Value,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decodes a success body into `T`, or converts a provider error
    /// body into [`IntegrationError::ProviderApi`].
    pub fn decode<T: serde::de::DeserializeOwned>(self) -> Result<T, IntegrationError> {
        if self.is_success() {
            serde_json::from_value(self.body)
                .map_err(|e| IntegrationError::MalformedResponse(e.to_string()))
        } else {
            Err(IntegrationError::ProviderApi {
                status: self.status,
                message: extract_error_message(&self.body),
            })
        }
    }
}

/// Pulls a human-readable message out of a provider error body.
///
/// The provider nests messages under `error.message` or `message`;
/// anything unrecognized falls back to the raw body text.
pub fn extract_error_message(body: &Value) -> String {
    if let Some(msg) = body
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
    {
        return msg.to_string();
    }
    if let Some(msg) = body.get("message").and_then(|m| m.as_str()) {
        return msg.to_string();
    }
    if let Some(msg) = body.get("error").and_then(|e| e.as_str()) {
        return match body.get("details").and_then(|d| d.as_str()) {
            Some(details) => format!("{msg}: {details}"),
            None => msg.to_string(),
        };
    }
    match body {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Provider query expression meaning "name contains term".
///
/// Single quotes in the term are doubled so no unescaped quote ever
/// reaches the upstream call. Empty terms produce no expression.
pub fn name_contains_query(term: &str) -> Option<String> {
    let term = term.trim();
    if term.is_empty() {
        return None;
    }
    Some(format!("name like '%{}%'", term.replace('\'', "''")))
}

/// HTTP client for the provider's REST API.
///
/// This is the only component that puts the partner's API token on the
/// wire. Credentials are taken per request and never stored or logged.
pub struct ProviderApi {
    base_url: String,
    http: reqwest::Client,
}

impl ProviderApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Lists one page of the provider client directory.
    pub async fn list_clients(
        &self,
        company_id: &str,
        api_token: &str,
        page: i64,
        per_page: i64,
        search: Option<&str>,
    ) -> Result<RawResponse, IntegrationError> {
        let url = format!("{}/c/{}/entities/clients", self.base_url, company_id);
        let mut query: Vec<(String, String)> = vec![
            ("page".to_string(), page.to_string()),
            ("per_page".to_string(), per_page.to_string()),
        ];
        if let Some(expr) = search.and_then(name_contains_query) {
            query.push(("q".to_string(), expr));
        }
        debug!(company_id, page, per_page, "listing provider clients");
        self.send(Method::GET, &url, api_token, Some(&query), None)
            .await
    }

    /// Fetches a single client by id.
    pub async fn client_details(
        &self,
        company_id: &str,
        api_token: &str,
        client_id: i64,
    ) -> Result<RawResponse, IntegrationError> {
        let url = format!(
            "{}/c/{}/entities/clients/{}",
            self.base_url, company_id, client_id
        );
        debug!(company_id, client_id, "fetching provider client details");
        self.send(Method::GET, &url, api_token, None, None).await
    }

    /// Creates an issued document (the upload path).
    pub async fn create_document(
        &self,
        company_id: &str,
        api_token: &str,
        payload: &InvoiceDocumentPayload,
    ) -> Result<RawResponse, IntegrationError> {
        let url = format!("{}/c/{}/issued_documents", self.base_url, company_id);
        let body = json!({ "data": payload });
        debug!(company_id, doc_type = %payload.doc_type, "creating provider document");
        self.send(Method::POST, &url, api_token, None, Some(body))
            .await
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        api_token: &str,
        query: Option<&[(String, String)]>,
        body: Option<Value>,
    ) -> Result<RawResponse, IntegrationError> {
        let mut request = self.http.request(method, url).bearer_auth(api_token);
        if let Some(query) = query {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

        if !(200..300).contains(&status) {
            warn!(status, url, "provider call returned an error status");
        }
        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_term_single_quotes_are_doubled() {
        assert_eq!(
            name_contains_query("O'Brien").as_deref(),
            Some("name like '%O''Brien%'")
        );
    }

    #[test]
    fn empty_search_produces_no_expression() {
        assert_eq!(name_contains_query(""), None);
        assert_eq!(name_contains_query("   "), None);
    }

    #[test]
    fn plain_terms_are_embedded_untouched() {
        assert_eq!(
            name_contains_query("Rossi").as_deref(),
            Some("name like '%Rossi%'")
        );
    }

    #[test]
    fn error_message_extraction_prefers_structured_bodies() {
        let nested = serde_json::json!({"error": {"message": "invalid vat number"}});
        assert_eq!(extract_error_message(&nested), "invalid vat number");

        let flat = serde_json::json!({"message": "too many requests"});
        assert_eq!(extract_error_message(&flat), "too many requests");

        let raw = Value::String("<html>502</html>".to_string());
        assert_eq!(extract_error_message(&raw), "<html>502</html>");
    }

    #[test]
    fn decode_maps_error_statuses_to_provider_api_errors() {
        let response = RawResponse {
            status: 422,
            body: serde_json::json!({"error": {"message": "bad entity"}}),
        };
        let err = response
            .decode::<crate::provider::types::CreatedDocument>()
            .unwrap_err();
        match err {
            IntegrationError::ProviderApi { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "bad entity");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn decode_reads_success_envelopes() {
        let response = RawResponse {
            status: 200,
            body: serde_json::json!({"data": {"id": 7, "number": "2024/15"}}),
        };
        let doc: crate::provider::types::DataEnvelope<crate::provider::types::CreatedDocument> =
            response.decode().unwrap();
        assert_eq!(doc.data.id, 7);
        assert_eq!(doc.data.number.as_deref(), Some("2024/15"));
    }
}
