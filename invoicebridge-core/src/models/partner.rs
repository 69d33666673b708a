use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

use crate::error::IntegrationError;

/// Per-partner configuration for the invoicing provider.
///
/// Maps to the `partner_integrations` table. The API token is the one
/// secret in this system: it is excluded from serialization and from
/// `Debug` output, and only crosses the network inside the provider API
/// client.
#[derive(Clone, Serialize, Deserialize, FromRow)]
pub struct PartnerIntegrationConfig {
    /// Partner (tenant) this configuration belongs to
    pub partner_id: Uuid,

    /// Whether the integration is enabled
    pub enabled: bool,

    /// Provider company id
    pub company_id: Option<String>,

    /// Provider API token (secret)
    #[serde(default, skip_serializing)]
    pub api_token: Option<String>,

    /// Default VAT rate applied to invoice lines (percent)
    pub default_vat_rate: Decimal,

    /// Document type created on upload ("proforma" or "invoice")
    pub document_type: String,

    /// Timestamp when the configuration was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the configuration was last updated
    pub updated_at: DateTime<Utc>,
}

impl PartnerIntegrationConfig {
    pub fn has_credentials(&self) -> bool {
        let token_set = self
            .api_token
            .as_deref()
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false);
        let company_set = self
            .company_id
            .as_deref()
            .map(|c| !c.trim().is_empty())
            .unwrap_or(false);
        token_set && company_set
    }

    /// Precondition check shared by upload and import: the integration
    /// must be enabled, and both credentials must be present. Checked in
    /// that order, each failing with its own error, before any network
    /// call is made.
    pub fn ensure_ready(&self) -> Result<(), IntegrationError> {
        if !self.enabled {
            return Err(IntegrationError::IntegrationDisabled);
        }
        if !self.has_credentials() {
            return Err(IntegrationError::MissingCredentials);
        }
        Ok(())
    }
}

impl fmt::Debug for PartnerIntegrationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartnerIntegrationConfig")
            .field("partner_id", &self.partner_id)
            .field("enabled", &self.enabled)
            .field("company_id", &self.company_id)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("default_vat_rate", &self.default_vat_rate)
            .field("document_type", &self.document_type)
            .finish()
    }
}
