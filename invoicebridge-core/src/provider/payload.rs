use chrono::{Duration, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{Contract, Customer, PartnerIntegrationConfig, ServiceType};
use crate::provider::types::{
    DocumentEntity, DocumentItem, DocumentPayment, InvoiceDocumentPayload, PaymentTermsBlock,
    VatBlock,
};

/// VAT amount for a net amount at a percent rate, rounded to 2 decimals.
pub fn vat_amount(net: Decimal, rate: Decimal) -> Decimal {
    (net * rate / Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Due date for a contract: start date plus the payment-terms offset.
pub fn due_date_for(contract: &Contract) -> NaiveDate {
    contract.start_date + Duration::days(contract.payment_terms().days())
}

/// Whole months between two dates, by month components rather than
/// elapsed days, floored at 1.
fn months_spanned(start: NaiveDate, end: NaiveDate) -> i64 {
    use chrono::Datelike;
    let months = (i64::from(end.year()) - i64::from(start.year())) * 12
        + (i64::from(end.month()) - i64::from(start.month()));
    months.max(1)
}

/// Line quantity for a contract.
///
/// Package contracts bill a single unit unless a max-entries figure is
/// recorded; subscriptions bill one unit per month of the contract span.
fn quantity_for(contract: &Contract) -> i64 {
    match contract.service_kind() {
        ServiceType::Package => contract.max_entries.map(i64::from).unwrap_or(1),
        ServiceType::Subscription => match contract.end_date {
            Some(end) => months_spanned(contract.start_date, end),
            None => 1,
        },
        ServiceType::FreeTrial | ServiceType::Other => 1,
    }
}

/// Builds the provider invoice document for a contract.
///
/// Pure transformation: no I/O, no business-rule failures. Inputs are
/// assumed pre-validated by the orchestrator.
pub fn build_document(
    contract: &Contract,
    customer: &Customer,
    config: &PartnerIntegrationConfig,
) -> InvoiceDocumentPayload {
    let rate = config.default_vat_rate;
    let net = contract.cost;
    let vat = vat_amount(net, rate);
    let gross = net + vat;
    let due_date = due_date_for(contract);

    let entity = DocumentEntity {
        name: customer.display_name(),
        vat_number: customer.vat_number.clone(),
        tax_code: customer.tax_code_or_vat(),
        address_street: customer.address_street.clone(),
        address_postal_code: customer.address_postal_code.clone(),
        address_city: customer.address_city.clone(),
        address_province: customer.address_province.clone(),
        country: customer.country_or_default(),
        certified_email: customer.certified_email.clone(),
        email: customer.email.clone(),
    };

    let item = DocumentItem {
        code: contract.service_kind().item_code().to_string(),
        name: contract.service_name.clone(),
        measure: "unit".to_string(),
        net_price: net,
        gross_price: gross,
        qty: quantity_for(contract),
        vat: VatBlock { value: rate },
    };

    let payment = DocumentPayment {
        amount: gross,
        due_date,
        payment_terms: PaymentTermsBlock {
            days: contract.payment_terms().days(),
            kind: "standard".to_string(),
        },
        status: "not_paid".to_string(),
    };

    InvoiceDocumentPayload {
        doc_type: config.document_type.clone(),
        subject: contract.service_name.clone(),
        entity,
        date: contract.start_date,
        next_due_date: due_date,
        items_list: vec![item],
        payments_list: vec![payment],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::str::FromStr;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn contract(service_type: &str, cost: &str, start: NaiveDate, end: Option<NaiveDate>) -> Contract {
        Contract {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            service_name: "Sala prove".to_string(),
            service_type: service_type.to_string(),
            cost: dec(cost),
            currency: "EUR".to_string(),
            start_date: start,
            end_date: end,
            payment_terms_code: None,
            max_entries: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn customer() -> Customer {
        Customer {
            id: Uuid::new_v4(),
            company_name: Some("Banda Larga Srl".to_string()),
            first_name: None,
            second_name: None,
            vat_number: Some("IT01234567890".to_string()),
            fiscal_code: None,
            address_street: Some("Via Roma 1".to_string()),
            address_postal_code: Some("20100".to_string()),
            address_city: Some("Milano".to_string()),
            address_province: Some("MI".to_string()),
            country: None,
            certified_email: Some("pec@bandalarga.it".to_string()),
            email: Some("info@bandalarga.it".to_string()),
            phone: None,
            provider_client_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn config() -> PartnerIntegrationConfig {
        PartnerIntegrationConfig {
            partner_id: Uuid::new_v4(),
            enabled: true,
            company_id: Some("1234".to_string()),
            api_token: Some("tok".to_string()),
            default_vat_rate: Decimal::new(22, 0),
            document_type: "proforma".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn due_date_offsets_follow_the_terms_table() {
        let cases = [
            (Some("immediate"), 0i64),
            (Some("net_15"), 15),
            (Some("net_30"), 30),
            (Some("net_45"), 45),
            (Some("net_60"), 60),
            (Some("something_else"), 30),
            (None, 30),
        ];
        for (code, offset) in cases {
            let mut c = contract("abbonamento", "100.00", date(2024, 1, 1), None);
            c.payment_terms_code = code.map(String::from);
            assert_eq!(
                due_date_for(&c),
                date(2024, 1, 1) + Duration::days(offset),
                "terms code {:?}",
                code
            );
        }
    }

    #[test]
    fn vat_is_22_percent_rounded_to_two_decimals() {
        assert_eq!(vat_amount(dec("100.00"), dec("22")), dec("22.00"));
        assert_eq!(vat_amount(dec("33.33"), dec("22")), dec("7.33"));
    }

    #[test]
    fn package_contract_without_max_entries_bills_one_unit() {
        // pacchetto, 2024-01-01 -> 2024-04-01, 300.00, default terms
        let c = contract(
            "pacchetto",
            "300.00",
            date(2024, 1, 1),
            Some(date(2024, 4, 1)),
        );
        let doc = build_document(&c, &customer(), &config());

        let item = &doc.items_list[0];
        assert_eq!(item.code, "PKG");
        assert_eq!(item.qty, 1);
        assert_eq!(item.net_price, dec("300.00"));
        assert_eq!(item.gross_price, dec("366.00"));
        assert_eq!(doc.next_due_date, date(2024, 1, 31));
    }

    #[test]
    fn package_contract_with_max_entries_bills_that_many() {
        let mut c = contract("pacchetto", "300.00", date(2024, 1, 1), None);
        c.max_entries = Some(10);
        let doc = build_document(&c, &customer(), &config());
        assert_eq!(doc.items_list[0].qty, 10);
    }

    #[test]
    fn subscription_quantity_is_whole_months_floored_at_one() {
        let c = contract(
            "abbonamento",
            "50.00",
            date(2024, 1, 15),
            Some(date(2024, 4, 10)),
        );
        // month components: april - january = 3, regardless of the days
        let doc = build_document(&c, &customer(), &config());
        assert_eq!(doc.items_list[0].code, "SUB");
        assert_eq!(doc.items_list[0].qty, 3);

        let short = contract(
            "abbonamento",
            "50.00",
            date(2024, 1, 1),
            Some(date(2024, 1, 20)),
        );
        assert_eq!(build_document(&short, &customer(), &config()).items_list[0].qty, 1);
    }

    #[test]
    fn unknown_service_type_maps_to_generic_item_code() {
        let c = contract("consulenza", "80.00", date(2024, 1, 1), None);
        let doc = build_document(&c, &customer(), &config());
        assert_eq!(doc.items_list[0].code, "SRV");
    }

    #[test]
    fn entity_block_applies_the_fallback_rules() {
        let mut cust = customer();
        cust.company_name = None;
        cust.first_name = Some("Mario".to_string());
        cust.second_name = Some("Rossi".to_string());
        cust.fiscal_code = None;

        let c = contract("abbonamento", "100.00", date(2024, 1, 1), None);
        let doc = build_document(&c, &cust, &config());

        assert_eq!(doc.entity.name, "Mario Rossi");
        assert_eq!(doc.entity.tax_code.as_deref(), Some("IT01234567890"));
        assert_eq!(doc.entity.country, "Italia");
    }

    #[test]
    fn payment_carries_gross_amount_and_terms_days() {
        let mut c = contract("abbonamento", "100.00", date(2024, 3, 1), None);
        c.payment_terms_code = Some("net_60".to_string());
        let doc = build_document(&c, &customer(), &config());

        let payment = &doc.payments_list[0];
        assert_eq!(payment.amount, dec("122.00"));
        assert_eq!(payment.payment_terms.days, 60);
        assert_eq!(payment.due_date, date(2024, 3, 1) + Duration::days(60));
        assert_eq!(payment.status, "not_paid");
        assert_eq!(doc.date, date(2024, 3, 1));
    }

    #[test]
    fn document_type_comes_from_partner_settings() {
        let mut cfg = config();
        cfg.document_type = "invoice".to_string();
        let c = contract("abbonamento", "100.00", date(2024, 1, 1), None);
        assert_eq!(build_document(&c, &customer(), &cfg).doc_type, "invoice");
    }
}
