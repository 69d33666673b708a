use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Kind of service sold by a contract.
///
/// The record store keeps the label the dashboard was configured with
/// (historically Italian), so parsing accepts both the Italian labels and
/// their English equivalents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceType {
    Subscription,
    Package,
    FreeTrial,
    Other,
}

impl ServiceType {
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "abbonamento" | "subscription" => ServiceType::Subscription,
            "pacchetto" | "package" => ServiceType::Package,
            "prova" | "prova_gratuita" | "free_trial" | "free-trial" | "trial" => {
                ServiceType::FreeTrial
            }
            _ => ServiceType::Other,
        }
    }

    /// Item code used on provider invoice lines.
    pub fn item_code(self) -> &'static str {
        match self {
            ServiceType::Subscription => "SUB",
            ServiceType::Package => "PKG",
            ServiceType::FreeTrial => "TRL",
            ServiceType::Other => "SRV",
        }
    }
}

/// Payment terms applied to a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentTerms {
    Immediate,
    Net15,
    Net30,
    Net45,
    Net60,
}

impl PaymentTerms {
    /// Resolves a stored payment-terms code. Unknown or missing codes
    /// fall back to net-30.
    pub fn parse(code: Option<&str>) -> Self {
        match code.map(|c| c.trim().to_lowercase()) {
            Some(ref c) if c == "immediate" => PaymentTerms::Immediate,
            Some(ref c) if c == "net_15" => PaymentTerms::Net15,
            Some(ref c) if c == "net_30" => PaymentTerms::Net30,
            Some(ref c) if c == "net_45" => PaymentTerms::Net45,
            Some(ref c) if c == "net_60" => PaymentTerms::Net60,
            _ => PaymentTerms::Net30,
        }
    }

    /// Days between issue date and due date.
    pub fn days(self) -> i64 {
        match self {
            PaymentTerms::Immediate => 0,
            PaymentTerms::Net15 => 15,
            PaymentTerms::Net30 => 30,
            PaymentTerms::Net45 => 45,
            PaymentTerms::Net60 => 60,
        }
    }
}

/// Contract model representing a sold service.
///
/// Maps to the `contracts` table. Read-only to the integration: the
/// dashboard owns creation and editing.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Contract {
    /// Unique identifier for the contract
    pub id: Uuid,

    /// Customer this contract was sold to
    pub customer_id: Uuid,

    /// Name of the sold service, as shown on the invoice line
    pub service_name: String,

    /// Stored service-type label (see [`ServiceType::parse`])
    pub service_type: String,

    /// Contract cost (net amount)
    pub cost: Decimal,

    /// Currency code (ISO 4217)
    pub currency: String,

    /// Contract start date
    pub start_date: NaiveDate,

    /// Contract end date, if bounded
    pub end_date: Option<NaiveDate>,

    /// Stored payment-terms code (see [`PaymentTerms::parse`])
    pub payment_terms_code: Option<String>,

    /// Package contracts only: maximum bookable entries
    pub max_entries: Option<i32>,

    /// Timestamp when the contract was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the contract was last updated
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    pub fn service_kind(&self) -> ServiceType {
        ServiceType::parse(&self.service_type)
    }

    pub fn payment_terms(&self) -> PaymentTerms {
        PaymentTerms::parse(self.payment_terms_code.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_type_parses_italian_and_english_labels() {
        assert_eq!(ServiceType::parse("abbonamento"), ServiceType::Subscription);
        assert_eq!(ServiceType::parse("pacchetto"), ServiceType::Package);
        assert_eq!(ServiceType::parse("Package"), ServiceType::Package);
        assert_eq!(ServiceType::parse("prova"), ServiceType::FreeTrial);
        assert_eq!(ServiceType::parse("consulenza"), ServiceType::Other);
    }

    #[test]
    fn item_codes_follow_the_fixed_mapping() {
        assert_eq!(ServiceType::Subscription.item_code(), "SUB");
        assert_eq!(ServiceType::Package.item_code(), "PKG");
        assert_eq!(ServiceType::FreeTrial.item_code(), "TRL");
        assert_eq!(ServiceType::Other.item_code(), "SRV");
    }

    #[test]
    fn payment_terms_table() {
        assert_eq!(PaymentTerms::parse(Some("immediate")).days(), 0);
        assert_eq!(PaymentTerms::parse(Some("net_15")).days(), 15);
        assert_eq!(PaymentTerms::parse(Some("net_30")).days(), 30);
        assert_eq!(PaymentTerms::parse(Some("net_45")).days(), 45);
        assert_eq!(PaymentTerms::parse(Some("net_60")).days(), 60);
    }

    #[test]
    fn unknown_or_missing_terms_default_to_net_30() {
        assert_eq!(PaymentTerms::parse(Some("net_90")).days(), 30);
        assert_eq!(PaymentTerms::parse(None).days(), 30);
    }
}
