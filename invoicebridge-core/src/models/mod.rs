pub mod contract;
pub mod customer;
pub mod partner;
pub mod upload_record;

pub use contract::{Contract, PaymentTerms, ServiceType};
pub use customer::Customer;
pub use partner::PartnerIntegrationConfig;
pub use upload_record::{NewUploadRecord, UploadRecord, UploadState, UploadStatus};
