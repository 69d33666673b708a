use thiserror::Error;

/// Error taxonomy for the provider integration.
///
/// Configuration problems are detected before any network call is made;
/// provider-side failures keep the upstream HTTP status so callers can
/// inspect provider-specific error shapes.
#[derive(Debug, Error)]
pub enum IntegrationError {
    /// The partner has not enabled the provider integration.
    #[error("provider integration is disabled for this partner")]
    IntegrationDisabled,

    /// The partner configuration is missing the API token or company id.
    #[error("provider credentials are not configured")]
    MissingCredentials,

    /// The caller presented no identity token, or an invalid one.
    #[error("caller is not authorized")]
    Unauthorized,

    /// The provider returned a non-2xx response.
    #[error("provider API error (status {status}): {message}")]
    ProviderApi { status: u16, message: String },

    /// Transport failure reaching the proxy or the provider.
    #[error("network error: {0}")]
    Network(String),

    /// A contract or customer is missing from the record store.
    #[error("{entity} {id} not found")]
    RecordNotFound { entity: &'static str, id: String },

    /// Record store failure.
    #[error("record store error: {0}")]
    Store(#[from] sqlx::Error),

    /// The provider returned a body this integration cannot decode.
    #[error("unexpected provider response: {0}")]
    MalformedResponse(String),
}

impl IntegrationError {
    /// Message suitable for surfacing to a dashboard user.
    pub fn user_message(&self) -> String {
        match self {
            IntegrationError::IntegrationDisabled => {
                "The invoicing integration is disabled in the partner settings.".to_string()
            }
            IntegrationError::MissingCredentials => {
                "The invoicing integration is missing the API token or company id.".to_string()
            }
            IntegrationError::Unauthorized => "You are not authorized to do this.".to_string(),
            IntegrationError::ProviderApi { status, message } => {
                format!("The invoicing provider rejected the request ({status}): {message}")
            }
            IntegrationError::Network(_) => {
                "Could not reach the invoicing provider. Try again later.".to_string()
            }
            IntegrationError::RecordNotFound { entity, id } => {
                format!("{entity} {id} was not found")
            }
            IntegrationError::Store(_) | IntegrationError::MalformedResponse(_) => {
                "An internal error occurred.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for IntegrationError {
    fn from(err: reqwest::Error) -> Self {
        IntegrationError::Network(err.to_string())
    }
}
