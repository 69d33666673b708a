pub mod bulk;
pub mod orchestrator;
pub mod pacer;

pub use bulk::{bulk_upload, BulkItemOutcome};
pub use orchestrator::{upload_contract, UploadOutcome};
pub use pacer::Pacer;
