use serde::{Deserialize, Serialize};
use std::fmt;

use crate::provider::types::InvoiceDocumentPayload;

fn default_per_page() -> i64 {
    10
}

/// Request envelope accepted by the proxy endpoint.
///
/// One variant per action, dispatched on the `action` tag; there is no
/// implicit default action. Credentials travel in the already
/// authenticated body and are used transiently per request.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ProxyRequest {
    /// Paginated, optionally searched, client directory listing.
    FetchClients {
        company_id: String,
        access_token: String,
        page: i64,
        #[serde(default = "default_per_page")]
        per_page: i64,
        #[serde(default)]
        search: Option<String>,
    },

    /// Single client by id.
    FetchClientDetails {
        company_id: String,
        access_token: String,
        client_id: i64,
    },

    /// Invoice document upload.
    CreateDocument {
        company_id: String,
        access_token: String,
        document: InvoiceDocumentPayload,
    },
}

impl ProxyRequest {
    /// Action name for logging. Never includes the token.
    pub fn action_name(&self) -> &'static str {
        match self {
            ProxyRequest::FetchClients { .. } => "fetch_clients",
            ProxyRequest::FetchClientDetails { .. } => "fetch_client_details",
            ProxyRequest::CreateDocument { .. } => "create_document",
        }
    }
}

impl fmt::Debug for ProxyRequest {
    /// The access token is redacted: envelopes end up in logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyRequest::FetchClients {
                company_id,
                page,
                per_page,
                search,
                ..
            } => f
                .debug_struct("FetchClients")
                .field("company_id", company_id)
                .field("access_token", &"<redacted>")
                .field("page", page)
                .field("per_page", per_page)
                .field("search", search)
                .finish(),
            ProxyRequest::FetchClientDetails {
                company_id,
                client_id,
                ..
            } => f
                .debug_struct("FetchClientDetails")
                .field("company_id", company_id)
                .field("access_token", &"<redacted>")
                .field("client_id", client_id)
                .finish(),
            ProxyRequest::CreateDocument { company_id, .. } => f
                .debug_struct("CreateDocument")
                .field("company_id", company_id)
                .field("access_token", &"<redacted>")
                .finish(),
        }
    }
}

/// Error body returned for failures inside the proxy itself (auth,
/// malformed upstream response). Provider-side errors are passed through
/// verbatim instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ProxyErrorBody {
    pub fn new(error: impl Into<String>, details: Option<String>) -> Self {
        Self {
            error: error.into(),
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_clients_envelope_round_trips() {
        let json = serde_json::json!({
            "action": "fetch_clients",
            "companyId": "1234",
            "accessToken": "tok",
            "page": 2,
            "perPage": 25,
            "search": "Rossi"
        });
        let request: ProxyRequest = serde_json::from_value(json).unwrap();
        match &request {
            ProxyRequest::FetchClients {
                company_id,
                page,
                per_page,
                search,
                ..
            } => {
                assert_eq!(company_id, "1234");
                assert_eq!(*page, 2);
                assert_eq!(*per_page, 25);
                assert_eq!(search.as_deref(), Some("Rossi"));
            }
            other => panic!("wrong variant: {other:?}"),
        }
        assert_eq!(request.action_name(), "fetch_clients");
    }

    #[test]
    fn per_page_defaults_when_absent() {
        let json = serde_json::json!({
            "action": "fetch_clients",
            "companyId": "1234",
            "accessToken": "tok",
            "page": 1
        });
        let request: ProxyRequest = serde_json::from_value(json).unwrap();
        match request {
            ProxyRequest::FetchClients { per_page, search, .. } => {
                assert_eq!(per_page, 10);
                assert_eq!(search, None);
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn debug_output_redacts_the_access_token() {
        let request = ProxyRequest::FetchClientDetails {
            company_id: "1234".to_string(),
            access_token: "super-secret-token".to_string(),
            client_id: 9,
        };
        let debug = format!("{request:?}");
        assert!(!debug.contains("super-secret-token"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn missing_or_unknown_action_is_rejected() {
        let no_action = serde_json::json!({
            "companyId": "1234",
            "accessToken": "tok"
        });
        assert!(serde_json::from_value::<ProxyRequest>(no_action).is_err());

        let unknown = serde_json::json!({
            "action": "delete_everything",
            "companyId": "1234",
            "accessToken": "tok"
        });
        assert!(serde_json::from_value::<ProxyRequest>(unknown).is_err());
    }
}
