use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An open accounts-receivable invoice, supplied by the billing system.
/// Read-only input to the match engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// Internal identifier in the billing system.
    pub id: String,
    /// Display number, e.g. `INV-2041`.
    pub number: String,
    /// Customer display name as billed.
    pub customer_name: String,
    /// Unpaid balance; the match target for incoming credits.
    pub amount_remaining: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Deep link into the billing system.
    pub url: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Invoice {
    /// Spreadsheet-ready hyperlink formula pointing at the invoice.
    pub fn hyperlink(&self) -> String {
        format!(r#"=HYPERLINK("{}","Open invoice")"#, self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn deserializes_from_json() {
        let json = r#"{
            "id": "812",
            "number": "INV-2041",
            "customer_name": "ACME CORP",
            "amount_remaining": "1500.00",
            "due_date": "2026-08-15",
            "url": "https://billing.example.com/invoice/812"
        }"#;
        let inv: Invoice = serde_json::from_str(json).unwrap();
        assert_eq!(inv.number, "INV-2041");
        assert_eq!(inv.amount_remaining, Decimal::from_str("1500.00").unwrap());
        assert_eq!(inv.currency, "USD");
        assert_eq!(
            inv.due_date,
            Some(NaiveDate::from_ymd_opt(2026, 8, 15).unwrap())
        );
    }

    #[test]
    fn hyperlink_wraps_url() {
        let inv = Invoice {
            id: "812".to_string(),
            number: "INV-2041".to_string(),
            customer_name: "ACME CORP".to_string(),
            amount_remaining: Decimal::from(1500),
            currency: "USD".to_string(),
            due_date: None,
            url: "https://billing.example.com/invoice/812".to_string(),
        };
        assert_eq!(
            inv.hyperlink(),
            r#"=HYPERLINK("https://billing.example.com/invoice/812","Open invoice")"#
        );
    }
}
