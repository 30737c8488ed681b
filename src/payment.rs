//! Payment progress derived from an invoice total and the amount paid.

use thiserror::Error;

use crate::format::format_amount;
use crate::model::{Invoice, PaymentStatus};
use crate::money::{normalize_amount, parse_price};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reconciliation {
    pub amount_remaining: f64,
    pub status: PaymentStatus,
}

/// Remaining balance and status. Over-payments show as nothing left to pay.
///
/// Branch order matters when `total == 0`: the invoice is reported as paid.
pub fn reconcile(total: f64, amount_paid: f64) -> Reconciliation {
    let amount_remaining = (total - amount_paid).max(0.0);
    let status = if amount_remaining == 0.0 {
        PaymentStatus::Paid
    } else if amount_remaining == total {
        PaymentStatus::Unpaid
    } else {
        PaymentStatus::PartiallyPaid
    };
    Reconciliation { amount_remaining, status }
}

/// Amount paid according to the server: `montantPaye` when sent, otherwise
/// what `resteAPayer` leaves of the total.
fn server_paid(invoice: &Invoice) -> f64 {
    let total = normalize_amount(Some(invoice.total));
    match (invoice.amount_paid, invoice.amount_remaining) {
        (Some(paid), _) => normalize_amount(Some(paid)),
        (None, Some(remaining)) => (total - normalize_amount(Some(remaining))).max(0.0),
        (None, None) => 0.0,
    }
}

/// Reconciles using the server's figures for an invoice.
pub fn reconcile_invoice(invoice: &Invoice) -> Reconciliation {
    reconcile(normalize_amount(Some(invoice.total)), server_paid(invoice))
}

/// Everything the payment progress section shows for one invoice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvoiceProgress {
    pub amount_paid: f64,
    /// Never negative, whatever the server sent.
    pub amount_remaining: f64,
    /// The server's status when present, the reconciled one otherwise.
    pub status: PaymentStatus,
    pub percent: u32,
    pub fill: u32,
}

pub fn invoice_progress(invoice: &Invoice) -> InvoiceProgress {
    let amount_paid = server_paid(invoice);
    let reconciled = reconcile_invoice(invoice);
    InvoiceProgress {
        amount_paid,
        amount_remaining: reconciled.amount_remaining,
        status: invoice.payment_status.unwrap_or(reconciled.status),
        percent: progress_percent(amount_paid, invoice.total),
        fill: progress_bar_fill(amount_paid, invoice.total),
    }
}

/// `round(100 * paid / total)`, or 0 when there is nothing to divide by.
pub fn progress_percent(amount_paid: f64, total: f64) -> u32 {
    if total <= 0.0 || !total.is_finite() {
        return 0;
    }
    let ratio = (100.0 * normalize_amount(Some(amount_paid)) / total).round();
    ratio.min(u32::MAX as f64) as u32
}

/// Width of the progress bar in percent, capped at 100.
pub fn progress_bar_fill(amount_paid: f64, total: f64) -> u32 {
    progress_percent(amount_paid, total).min(100)
}

/// Whether a new payment may be recorded against `remaining`.
pub fn can_accept(amount: f64, remaining: f64) -> bool {
    amount > 0.0 && amount <= remaining
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PaymentRejected {
    #[error("Please enter a valid amount")]
    InvalidAmount,
    #[error("The amount cannot exceed the remaining balance ({remaining})")]
    ExceedsRemaining { remaining: String },
}

/// Parses the typed amount and applies [`can_accept`].
pub fn check_amount(raw: &str, remaining: f64, currency: &str) -> Result<f64, PaymentRejected> {
    let amount = parse_price(raw)
        .filter(|amount| *amount > 0.0)
        .ok_or(PaymentRejected::InvalidAmount)?;
    if can_accept(amount, remaining) {
        Ok(amount)
    } else {
        Err(PaymentRejected::ExceedsRemaining {
            remaining: format_amount(Some(remaining), currency),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fully_paid_invoice() {
        let r = reconcile(1000.0, 1000.0);
        assert_eq!(r.amount_remaining, 0.0);
        assert_eq!(r.status, PaymentStatus::Paid);
        assert_eq!(progress_percent(1000.0, 1000.0), 100);
    }

    #[test]
    fn partially_paid_invoice() {
        let r = reconcile(1000.0, 400.0);
        assert_eq!(r.amount_remaining, 600.0);
        assert_eq!(r.status, PaymentStatus::PartiallyPaid);
        assert_eq!(progress_percent(400.0, 1000.0), 40);
    }

    #[test]
    fn unpaid_invoice() {
        let r = reconcile(1000.0, 0.0);
        assert_eq!(r.amount_remaining, 1000.0);
        assert_eq!(r.status, PaymentStatus::Unpaid);
        assert_eq!(progress_percent(0.0, 1000.0), 0);
    }

    #[test]
    fn overpayment_clamps_remaining() {
        let r = reconcile(1000.0, 1200.0);
        assert_eq!(r.amount_remaining, 0.0);
        assert_eq!(r.status, PaymentStatus::Paid);
        assert_eq!(progress_percent(1200.0, 1000.0), 120);
        assert_eq!(progress_bar_fill(1200.0, 1000.0), 100);
    }

    fn server_invoice(json: &str) -> Invoice {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn negative_server_remainder_reads_as_zero() {
        let invoice = server_invoice(
            r#"{"id":1,"total":1000,"montantPaye":1200,"resteAPayer":-200,"statutPaiement":"PAYEE"}"#,
        );
        let progress = invoice_progress(&invoice);
        assert_eq!(progress.amount_remaining, 0.0);
        assert_eq!(progress.status, PaymentStatus::Paid);
        assert_eq!(progress.fill, 100);
    }

    #[test]
    fn missing_amount_paid_is_derived_from_remainder() {
        let invoice = server_invoice(r#"{"id":1,"total":1000,"resteAPayer":0,"statutPaiement":"PAYEE"}"#);
        assert_eq!(reconcile_invoice(&invoice).status, PaymentStatus::Paid);
        let progress = invoice_progress(&invoice);
        assert_eq!(progress.amount_paid, 1000.0);
        assert_eq!(progress.percent, 100);

        let invoice = server_invoice(r#"{"id":1,"total":1000,"resteAPayer":250}"#);
        let progress = invoice_progress(&invoice);
        assert_eq!(progress.status, PaymentStatus::PartiallyPaid);
        assert_eq!(progress.amount_remaining, 250.0);
        assert_eq!(progress.percent, 75);
    }

    #[test]
    fn server_status_wins_over_reconciled_one() {
        let invoice = server_invoice(
            r#"{"id":1,"total":1000,"montantPaye":0,"resteAPayer":1000,"statutPaiement":"PARTIELLEMENT_PAYEE"}"#,
        );
        assert_eq!(invoice_progress(&invoice).status, PaymentStatus::PartiallyPaid);
        let invoice = server_invoice(r#"{"id":1,"total":1000}"#);
        assert_eq!(invoice_progress(&invoice).status, PaymentStatus::Unpaid);
    }

    // Never seen on a real invoice, kept for parity with the server.
    #[test]
    fn zero_total_counts_as_paid() {
        assert_eq!(reconcile(0.0, 0.0).status, PaymentStatus::Paid);
        assert_eq!(progress_percent(0.0, 0.0), 0);
    }

    #[test]
    fn progress_rounds_to_nearest() {
        assert_eq!(progress_percent(1.0, 3.0), 33);
        assert_eq!(progress_percent(2.0, 3.0), 67);
    }

    #[test]
    fn guard_bounds() {
        assert!(!can_accept(0.0, 100.0));
        assert!(!can_accept(150.0, 100.0));
        assert!(can_accept(100.0, 100.0));
        assert!(can_accept(50.0, 100.0));
        assert!(!can_accept(-1.0, 100.0));
    }

    #[test]
    fn check_amount_explains_rejection() {
        assert_eq!(check_amount("250", 600.0, "FCFA"), Ok(250.0));
        assert_eq!(check_amount("", 600.0, "FCFA"), Err(PaymentRejected::InvalidAmount));
        assert_eq!(check_amount("0", 600.0, "FCFA"), Err(PaymentRejected::InvalidAmount));
        let err = check_amount("700", 600.0, "FCFA").unwrap_err();
        assert_eq!(err.to_string(), "The amount cannot exceed the remaining balance (600 FCFA)");
    }
}
