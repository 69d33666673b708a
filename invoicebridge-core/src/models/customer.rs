use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Customer model holding the billing-relevant identity fields.
///
/// Maps to the `customers` table. Read-only to the integration, except
/// for rows created by the client import.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Customer {
    /// Unique identifier for the customer
    pub id: Uuid,

    /// Company name, if the customer is a business
    pub company_name: Option<String>,

    /// First personal name, used when no company name is set
    pub first_name: Option<String>,

    /// Second personal name (surname)
    pub second_name: Option<String>,

    /// VAT number
    pub vat_number: Option<String>,

    /// Fiscal code
    pub fiscal_code: Option<String>,

    /// Street address
    pub address_street: Option<String>,

    /// Postal code
    pub address_postal_code: Option<String>,

    /// City
    pub address_city: Option<String>,

    /// Province code
    pub address_province: Option<String>,

    /// Country name
    pub country: Option<String>,

    /// Certified email / SDI routing code for electronic invoicing
    pub certified_email: Option<String>,

    /// Contact email
    pub email: Option<String>,

    /// Contact phone
    pub phone: Option<String>,

    /// Provider client id, set when the row was created by the import
    pub provider_client_id: Option<i64>,

    /// Timestamp when the customer was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the customer was last updated
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Display name: company name when present, else "{first} {second}".
    pub fn display_name(&self) -> String {
        match &self.company_name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => {
                let first = self.first_name.as_deref().unwrap_or("");
                let second = self.second_name.as_deref().unwrap_or("");
                format!("{} {}", first, second).trim().to_string()
            }
        }
    }

    /// Tax code for the invoice entity block. Falls back to the VAT
    /// number when no fiscal code is recorded.
    pub fn tax_code_or_vat(&self) -> Option<String> {
        self.fiscal_code
            .clone()
            .filter(|c| !c.trim().is_empty())
            .or_else(|| self.vat_number.clone())
    }

    pub fn country_or_default(&self) -> String {
        self.country
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| "Italia".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_customer() -> Customer {
        Customer {
            id: Uuid::new_v4(),
            company_name: None,
            first_name: None,
            second_name: None,
            vat_number: None,
            fiscal_code: None,
            address_street: None,
            address_postal_code: None,
            address_city: None,
            address_province: None,
            country: None,
            certified_email: None,
            email: None,
            phone: None,
            provider_client_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn display_name_prefers_company_name() {
        let mut customer = blank_customer();
        customer.company_name = Some("Rossi Srl".to_string());
        customer.first_name = Some("Mario".to_string());
        assert_eq!(customer.display_name(), "Rossi Srl");
    }

    #[test]
    fn display_name_falls_back_to_personal_names() {
        let mut customer = blank_customer();
        customer.first_name = Some("Mario".to_string());
        customer.second_name = Some("Rossi".to_string());
        assert_eq!(customer.display_name(), "Mario Rossi");
    }

    #[test]
    fn tax_code_falls_back_to_vat_number() {
        let mut customer = blank_customer();
        customer.vat_number = Some("IT01234567890".to_string());
        assert_eq!(customer.tax_code_or_vat().as_deref(), Some("IT01234567890"));

        customer.fiscal_code = Some("RSSMRA80A01H501U".to_string());
        assert_eq!(
            customer.tax_code_or_vat().as_deref(),
            Some("RSSMRA80A01H501U")
        );
    }

    #[test]
    fn country_defaults_to_italia() {
        let customer = blank_customer();
        assert_eq!(customer.country_or_default(), "Italia");
    }
}
