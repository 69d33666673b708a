use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Invoice document in the provider's schema.
///
/// Transient: constructed per upload attempt by the payload builder and
/// never persisted locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceDocumentPayload {
    /// Document type ("proforma" or "invoice")
    #[serde(rename = "type")]
    pub doc_type: String,

    /// Subject line shown on the document
    pub subject: String,

    /// Buyer entity block
    pub entity: DocumentEntity,

    /// Issue date
    pub date: NaiveDate,

    /// Next due date
    pub next_due_date: NaiveDate,

    /// Invoice lines
    pub items_list: Vec<DocumentItem>,

    /// Expected payments
    pub payments_list: Vec<DocumentPayment>,
}

/// Buyer identity block of a provider document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentEntity {
    pub name: String,
    pub vat_number: Option<String>,
    pub tax_code: Option<String>,
    pub address_street: Option<String>,
    pub address_postal_code: Option<String>,
    pub address_city: Option<String>,
    pub address_province: Option<String>,
    pub country: String,
    pub certified_email: Option<String>,
    pub email: Option<String>,
}

/// One invoice line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentItem {
    pub code: String,
    pub name: String,
    pub measure: String,
    pub net_price: Decimal,
    pub gross_price: Decimal,
    pub qty: i64,
    pub vat: VatBlock,
}

/// VAT block attached to an invoice line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VatBlock {
    /// Rate in percent
    pub value: Decimal,
}

/// One expected payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentPayment {
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub payment_terms: PaymentTermsBlock,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentTermsBlock {
    pub days: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Identity of a document created by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedDocument {
    pub id: i64,
    pub number: Option<String>,
}

/// Client record in the provider's directory. Transient: fetched page by
/// page and only persisted through the import mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderClient {
    pub id: i64,
    pub name: String,
    pub vat_number: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
}

/// One page of the provider client directory, pagination metadata in the
/// provider's own shape, passed through the proxy verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientPage {
    pub current_page: i64,
    pub last_page: i64,
    pub per_page: i64,
    pub total: i64,
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub data: Vec<ProviderClient>,
}

/// Success envelope used by the provider for single-resource responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}
