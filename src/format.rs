//! Display helpers. Each one defines its output for absent values.

use chrono::NaiveDate;
use comfy_table::Color;

use crate::model::{Invoice, PaymentStatus};
use crate::payment::invoice_progress;

const GREEN: Color = Color::Rgb { r: 4, g: 120, b: 87 };
const AMBER: Color = Color::Rgb { r: 180, g: 83, b: 9 };
const RED: Color = Color::Rgb { r: 185, g: 28, b: 28 };
const GREY: Color = Color::Rgb { r: 107, g: 114, b: 128 };

/// Whole-unit amount grouped by thousands: `1 234 567 FCFA`.
pub fn format_amount(value: Option<f64>, currency: &str) -> String {
    let number = format_number(value);
    if currency.is_empty() {
        number
    } else {
        format!("{number} {currency}")
    }
}

/// Same as [`format_amount`] without the currency suffix.
pub fn format_number(value: Option<f64>) -> String {
    let rounded = match value {
        Some(v) if v.is_finite() => v.round(),
        _ => 0.0,
    };
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%d/%m/%Y").to_string()).unwrap_or_default()
}

pub fn format_percent(percent: u32) -> String {
    format!("{percent}%")
}

/// Text progress bar, `fill` in percent.
pub fn progress_bar(fill: u32, width: usize) -> String {
    let filled = (fill.min(100) as usize * width + 50) / 100;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(width - filled))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusDisplay {
    pub label: &'static str,
    pub color: Color,
}

const STATUS_TABLE: [(PaymentStatus, StatusDisplay); 3] = [
    (PaymentStatus::Paid, StatusDisplay { label: "Payée", color: GREEN }),
    (PaymentStatus::PartiallyPaid, StatusDisplay { label: "Partiellement payée", color: AMBER }),
    (PaymentStatus::Unpaid, StatusDisplay { label: "Impayée", color: RED }),
];

const UNKNOWN_STATUS: StatusDisplay = StatusDisplay { label: "Inconnu", color: GREY };

impl PaymentStatus {
    pub fn display(self) -> StatusDisplay {
        STATUS_TABLE
            .iter()
            .find(|(status, _)| *status == self)
            .map(|(_, display)| *display)
            .unwrap_or(UNKNOWN_STATUS)
    }

    /// Sentence shown above the payment progress bar.
    pub fn summary(self) -> &'static str {
        match self {
            Self::Paid => "Invoice fully paid",
            Self::PartiallyPaid => "Invoice partially paid",
            Self::Unpaid => "Invoice unpaid",
        }
    }
}

pub fn status_display(status: Option<PaymentStatus>) -> StatusDisplay {
    status.map(PaymentStatus::display).unwrap_or(UNKNOWN_STATUS)
}

/// Lines of the payment progress section: summary and status label, paid and
/// remaining amounts, then the bar when there is a total to divide by.
pub fn progress_section(invoice: &Invoice, currency: &str) -> Vec<String> {
    let progress = invoice_progress(invoice);
    let mut lines = vec![
        format!("{} ({})", progress.status.summary(), progress.status.display().label),
        format!(
            "Paid: {}   Remaining: {}",
            format_amount(Some(progress.amount_paid), currency),
            format_amount(Some(progress.amount_remaining), currency)
        ),
    ];
    if invoice.total > 0.0 {
        lines.push(format!("{} {}", progress_bar(progress.fill, 30), format_percent(progress.percent)));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_are_grouped_by_thousands() {
        assert_eq!(format_amount(Some(1000.0), "FCFA"), "1 000 FCFA");
        assert_eq!(format_amount(Some(1234567.0), "FCFA"), "1 234 567 FCFA");
        assert_eq!(format_amount(Some(999.6), "FCFA"), "1 000 FCFA");
        assert_eq!(format_amount(Some(12.0), ""), "12");
        assert_eq!(format_number(Some(-2500.0)), "-2 500");
    }

    #[test]
    fn absent_amounts_render_as_zero() {
        assert_eq!(format_amount(None, "FCFA"), "0 FCFA");
        assert_eq!(format_amount(Some(f64::NAN), "FCFA"), "0 FCFA");
    }

    #[test]
    fn dates_use_day_first() {
        assert_eq!(format_date(NaiveDate::from_ymd_opt(2024, 3, 5)), "05/03/2024");
        assert_eq!(format_date(None), "");
    }

    #[test]
    fn bar_fills_proportionally() {
        assert_eq!(progress_bar(40, 10), "[####......]");
        assert_eq!(progress_bar(0, 4), "[....]");
        assert_eq!(progress_bar(250, 4), "[####]");
        assert_eq!(format_percent(40), "40%");
    }

    #[test]
    fn every_status_has_a_label() {
        for status in PaymentStatus::ALL {
            assert_ne!(status.display().label, UNKNOWN_STATUS.label);
        }
        assert_eq!(status_display(None).label, "Inconnu");
        assert_eq!(PaymentStatus::Unpaid.display().color, RED);
    }

    fn server_invoice(json: &str) -> Invoice {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn overpaid_invoice_never_shows_a_negative_remainder() {
        let invoice = server_invoice(
            r#"{"id":1,"total":1000,"montantPaye":1200,"resteAPayer":-200,"statutPaiement":"PAYEE"}"#,
        );
        let lines = progress_section(&invoice, "FCFA");
        assert_eq!(lines[0], "Invoice fully paid (Payée)");
        assert_eq!(lines[1], "Paid: 1 200 FCFA   Remaining: 0 FCFA");
        assert_eq!(lines[2], format!("{} 120%", progress_bar(100, 30)));
    }

    #[test]
    fn summary_agrees_with_label_without_amount_paid() {
        let invoice = server_invoice(r#"{"id":1,"total":1000,"resteAPayer":0,"statutPaiement":"PAYEE"}"#);
        let lines = progress_section(&invoice, "FCFA");
        assert_eq!(lines[0], "Invoice fully paid (Payée)");
        assert_eq!(lines[1], "Paid: 1 000 FCFA   Remaining: 0 FCFA");
    }

    #[test]
    fn zero_total_has_no_bar() {
        let invoice = server_invoice(r#"{"id":1,"total":0}"#);
        assert_eq!(progress_section(&invoice, "FCFA").len(), 2);
    }
}
