use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type InvoiceId = i64;
pub type PaymentId = i64;

/// Payment state as computed by the server (`statutPaiement`).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentStatus {
    #[serde(rename = "IMPAYEE")]
    Unpaid,
    #[serde(rename = "PARTIELLEMENT_PAYEE")]
    PartiallyPaid,
    #[serde(rename = "PAYEE")]
    Paid,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 3] = [Self::Unpaid, Self::PartiallyPaid, Self::Paid];

    /// Value used in the `statut` query parameter.
    pub fn as_wire(self) -> &'static str {
        match self {
            Self::Unpaid => "IMPAYEE",
            Self::PartiallyPaid => "PARTIELLEMENT_PAYEE",
            Self::Paid => "PAYEE",
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "IMPAYEE" | "UNPAID" => Ok(Self::Unpaid),
            "PARTIELLEMENT_PAYEE" | "PARTIALLY_PAID" | "PARTIAL" => Ok(Self::PartiallyPaid),
            "PAYEE" | "PAID" => Ok(Self::Paid),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InvoiceLine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "quantite")]
    pub quantity: u64,
    #[serde(rename = "designation")]
    pub description: String,
    #[serde(rename = "prixUnitaire")]
    pub unit_price: f64,
}

impl InvoiceLine {
    pub fn amount(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }
}

/// Server-owned invoice. Every payment-derived field may be missing from a
/// response, in which case it reads as zero.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: InvoiceId,
    #[serde(rename = "numeroFacture", default)]
    pub invoice_number: String,
    #[serde(rename = "nomClient", default)]
    pub client_name: String,
    #[serde(rename = "dateFacturation", default)]
    pub issue_date: Option<NaiveDate>,
    #[serde(rename = "lignes", default)]
    pub lines: Vec<InvoiceLine>,
    #[serde(default)]
    pub total: f64,
    #[serde(rename = "totalEnLettres", default)]
    pub total_in_words: Option<String>,
    #[serde(rename = "montantPaye", default)]
    pub amount_paid: Option<f64>,
    #[serde(rename = "resteAPayer", default)]
    pub amount_remaining: Option<f64>,
    #[serde(rename = "statutPaiement", default)]
    pub payment_status: Option<PaymentStatus>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Payment {
    pub id: PaymentId,
    #[serde(rename = "montant")]
    pub amount: f64,
    #[serde(rename = "datePaiement", default)]
    pub payment_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct NewPayment {
    #[serde(rename = "montant")]
    pub amount: f64,
    #[serde(rename = "datePaiement")]
    pub payment_date: NaiveDate,
}

/// Body of create/update requests. Only built from a validated draft.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct InvoicePayload {
    #[serde(rename = "nomClient")]
    pub client_name: String,
    #[serde(rename = "lignes")]
    pub lines: Vec<InvoiceLine>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePage {
    #[serde(rename = "factures", default)]
    pub invoices: Vec<Invoice>,
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_items: u64,
}

/// Aggregate figures for the dashboard (`stats-paiements`).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentStats {
    #[serde(rename = "nombreFactures")]
    pub invoice_count: Option<u64>,
    #[serde(rename = "totalFactures")]
    pub invoiced_total: Option<f64>,
    #[serde(rename = "totalPaiements")]
    pub paid_total: Option<f64>,
    #[serde(rename = "totalResteAPayer")]
    pub remaining_total: Option<f64>,
    #[serde(rename = "impayees")]
    pub unpaid_count: Option<u64>,
    #[serde(rename = "partiellementPayees")]
    pub partially_paid_count: Option<u64>,
    #[serde(rename = "payees")]
    pub paid_count: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoice_reads_french_wire_names() {
        let json = r#"{
            "id": 7,
            "numeroFacture": "F-2024-007",
            "nomClient": "Acme",
            "dateFacturation": "2024-03-15",
            "lignes": [{"id": 1, "quantite": 2, "designation": "Widget", "prixUnitaire": 500}],
            "total": 1000,
            "totalEnLettres": "mille",
            "montantPaye": 400,
            "resteAPayer": 600,
            "statutPaiement": "PARTIELLEMENT_PAYEE"
        }"#;
        let invoice: Invoice = serde_json::from_str(json).unwrap();
        assert_eq!(invoice.invoice_number, "F-2024-007");
        assert_eq!(invoice.lines[0].amount(), 1000.0);
        assert_eq!(invoice.amount_remaining, Some(600.0));
        assert_eq!(invoice.payment_status, Some(PaymentStatus::PartiallyPaid));
        assert_eq!(invoice.issue_date, NaiveDate::from_ymd_opt(2024, 3, 15));
    }

    #[test]
    fn invoice_tolerates_missing_payment_fields() {
        let invoice: Invoice = serde_json::from_str(r#"{"id": 1, "total": 50}"#).unwrap();
        assert_eq!(invoice.amount_paid, None);
        assert_eq!(invoice.payment_status, None);
        assert!(invoice.lines.is_empty());
    }

    #[test]
    fn payload_serializes_without_line_ids() {
        let payload = InvoicePayload {
            client_name: "Acme".into(),
            lines: vec![InvoiceLine { id: None, quantity: 1, description: "x".into(), unit_price: 3.0 }],
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["nomClient"], "Acme");
        assert!(value["lignes"][0].get("id").is_none());
        assert_eq!(value["lignes"][0]["prixUnitaire"], 3.0);
    }

    #[test]
    fn status_parses_cli_spellings() {
        assert_eq!("paid".parse::<PaymentStatus>(), Ok(PaymentStatus::Paid));
        assert_eq!("partiellement-payee".parse::<PaymentStatus>(), Ok(PaymentStatus::PartiallyPaid));
        assert!("later".parse::<PaymentStatus>().is_err());
    }
}
