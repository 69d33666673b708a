use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Outcome of a single upload attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar")]
pub enum UploadStatus {
    #[sqlx(rename = "success")]
    Success,
    #[sqlx(rename = "failed")]
    Failed,
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadStatus::Success => write!(f, "success"),
            UploadStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Current upload state of a contract, maintained alongside the
/// append-only attempt log. Once a contract reaches `Uploaded` it stays
/// there: later failed attempts do not downgrade it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar")]
pub enum UploadState {
    #[sqlx(rename = "never_attempted")]
    NeverAttempted,
    #[sqlx(rename = "failed")]
    Failed,
    #[sqlx(rename = "uploaded")]
    Uploaded,
}

impl fmt::Display for UploadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadState::NeverAttempted => write!(f, "never_attempted"),
            UploadState::Failed => write!(f, "failed"),
            UploadState::Uploaded => write!(f, "uploaded"),
        }
    }
}

/// One row of the upload attempt log.
///
/// Maps to the `upload_records` table. Append-only: a contract
/// accumulates one row per attempt, success or failure.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UploadRecord {
    /// Unique identifier for the attempt
    pub id: Uuid,

    /// Contract the attempt was for
    pub contract_id: Uuid,

    /// Attempt outcome
    pub status: UploadStatus,

    /// Provider document id, on success
    pub provider_invoice_id: Option<i64>,

    /// Provider document number, on success
    pub provider_invoice_number: Option<String>,

    /// Error message, on failure
    pub error_message: Option<String>,

    /// When the attempt happened
    pub uploaded_at: DateTime<Utc>,
}

/// Attempt outcome to be persisted.
#[derive(Debug, Clone)]
pub struct NewUploadRecord {
    pub contract_id: Uuid,
    pub status: UploadStatus,
    pub provider_invoice_id: Option<i64>,
    pub provider_invoice_number: Option<String>,
    pub error_message: Option<String>,
}

impl NewUploadRecord {
    pub fn success(contract_id: Uuid, invoice_id: i64, invoice_number: Option<String>) -> Self {
        Self {
            contract_id,
            status: UploadStatus::Success,
            provider_invoice_id: Some(invoice_id),
            provider_invoice_number: invoice_number,
            error_message: None,
        }
    }

    pub fn failure(contract_id: Uuid, error: impl Into<String>) -> Self {
        Self {
            contract_id,
            status: UploadStatus::Failed,
            provider_invoice_id: None,
            provider_invoice_number: None,
            error_message: Some(error.into()),
        }
    }

    /// State the `contract_upload_status` row should move to because of
    /// this attempt (an `Uploaded` row is never downgraded by the store).
    pub fn resulting_state(&self) -> UploadState {
        match self.status {
            UploadStatus::Success => UploadState::Uploaded,
            UploadStatus::Failed => UploadState::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_record_carries_invoice_identity() {
        let contract_id = Uuid::new_v4();
        let record = NewUploadRecord::success(contract_id, 42, Some("2024/15".to_string()));
        assert_eq!(record.status, UploadStatus::Success);
        assert_eq!(record.provider_invoice_id, Some(42));
        assert_eq!(record.provider_invoice_number.as_deref(), Some("2024/15"));
        assert_eq!(record.resulting_state(), UploadState::Uploaded);
    }

    #[test]
    fn failure_record_carries_the_error() {
        let record = NewUploadRecord::failure(Uuid::new_v4(), "boom");
        assert_eq!(record.status, UploadStatus::Failed);
        assert_eq!(record.error_message.as_deref(), Some("boom"));
        assert_eq!(record.resulting_state(), UploadState::Failed);
    }
}
