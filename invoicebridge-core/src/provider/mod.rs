pub mod api;
pub mod payload;
pub mod types;

pub use api::{name_contains_query, ProviderApi, RawResponse};
pub use payload::build_document;
pub use types::{
    ClientPage, CreatedDocument, DataEnvelope, DocumentEntity, DocumentItem, DocumentPayment,
    InvoiceDocumentPayload, PaymentTermsBlock, ProviderClient, VatBlock,
};
