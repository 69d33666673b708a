pub mod orchestrator;

pub use orchestrator::{
    ClientImportResult, ClientImporter, ImportPhase, PaginationState, DEFAULT_PER_PAGE,
};
