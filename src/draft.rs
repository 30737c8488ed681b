//! Editable invoice draft and the checks it must pass before submission.

use std::fmt;

use thiserror::Error;

use crate::model::{Invoice, InvoiceLine, InvoicePayload};
use crate::money::{normalize_quantity, parse_price};
use crate::totals::invoice_total;

pub const MIN_CLIENT_NAME_CHARS: usize = 2;

/// One line as typed: the numeric fields are kept as raw text so a missing
/// value can be told apart from a zero.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftLine {
    pub id: Option<i64>,
    pub quantity: String,
    pub unit_price: String,
    pub description: String,
}

impl DraftLine {
    pub fn new(
        quantity: impl Into<String>,
        unit_price: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            quantity: quantity.into(),
            unit_price: unit_price.into(),
            description: description.into(),
        }
    }

    pub fn blank() -> Self {
        Self::new("1", "0", "")
    }
}

impl From<&InvoiceLine> for DraftLine {
    fn from(line: &InvoiceLine) -> Self {
        Self {
            id: line.id,
            quantity: line.quantity.to_string(),
            unit_price: line.unit_price.to_string(),
            description: line.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasonCode {
    ClientNameTooShort,
    NoLines,
    EmptyDescription,
    MissingQuantity,
    QuantityBelowOne,
    MissingPrice,
    PriceNotANumber,
    NegativePrice,
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::ClientNameTooShort => "client name must have at least 2 characters",
            Self::NoLines => "an invoice needs at least one line",
            Self::EmptyDescription => "description is empty",
            Self::MissingQuantity => "quantity is missing",
            Self::QuantityBelowOne => "quantity must be at least 1",
            Self::MissingPrice => "unit price is missing",
            Self::PriceNotANumber => "unit price is not a number",
            Self::NegativePrice => "unit price cannot be negative",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reason {
    /// Zero-based line index, `None` for draft-level problems.
    pub line: Option<usize>,
    pub code: ReasonCode,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(index) => write!(f, "line {}: {}", index + 1, self.code),
            None => write!(f, "{}", self.code),
        }
    }
}

fn join_reasons(reasons: &[Reason]) -> String {
    reasons.iter().map(Reason::to_string).collect::<Vec<_>>().join("; ")
}

/// Every problem found in a draft, rendered as a single message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Please correct the invoice: {}", join_reasons(.reasons))]
pub struct Invalid {
    pub reasons: Vec<Reason>,
}

impl Invalid {
    pub fn has(&self, line: Option<usize>, code: ReasonCode) -> bool {
        self.reasons.iter().any(|r| r.line == line && r.code == code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("an invoice must keep at least one line")]
    LastLine,
    #[error("line {0} does not exist")]
    NoSuchLine(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDraft {
    pub client_name: String,
    lines: Vec<DraftLine>,
}

impl Default for InvoiceDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceDraft {
    /// Empty draft as shown on the creation screen: one blank line.
    pub fn new() -> Self {
        Self {
            client_name: String::new(),
            lines: vec![DraftLine::blank()],
        }
    }

    /// Re-hydrates a draft from a fetched invoice for editing. An invoice
    /// without lines still yields one blank line.
    pub fn from_invoice(invoice: &Invoice) -> Self {
        let mut lines: Vec<DraftLine> = invoice.lines.iter().map(DraftLine::from).collect();
        if lines.is_empty() {
            lines.push(DraftLine::blank());
        }
        Self {
            client_name: invoice.client_name.clone(),
            lines,
        }
    }

    pub fn lines(&self) -> &[DraftLine] {
        &self.lines
    }

    pub fn line_mut(&mut self, index: usize) -> Option<&mut DraftLine> {
        self.lines.get_mut(index)
    }

    /// Appends a blank line and returns its index.
    pub fn add_line(&mut self) -> usize {
        self.lines.push(DraftLine::blank());
        self.lines.len() - 1
    }

    pub fn push_line(&mut self, line: DraftLine) -> usize {
        self.lines.push(line);
        self.lines.len() - 1
    }

    /// Removes a line. Refused without any change when it is the last one.
    pub fn remove_line(&mut self, index: usize) -> Result<DraftLine, DraftError> {
        if index >= self.lines.len() {
            return Err(DraftError::NoSuchLine(index));
        }
        if self.lines.len() <= 1 {
            return Err(DraftError::LastLine);
        }
        Ok(self.lines.remove(index))
    }

    /// Live total of the current state.
    pub fn total(&self) -> f64 {
        invoice_total(&self.lines)
    }

    pub fn validate(&self) -> Result<(), Invalid> {
        let mut reasons = Vec::new();

        if self.client_name.trim().chars().count() < MIN_CLIENT_NAME_CHARS {
            reasons.push(Reason { line: None, code: ReasonCode::ClientNameTooShort });
        }
        if self.lines.is_empty() {
            reasons.push(Reason { line: None, code: ReasonCode::NoLines });
        }

        for (index, line) in self.lines.iter().enumerate() {
            let mut flag = |code| reasons.push(Reason { line: Some(index), code });

            if line.description.trim().is_empty() {
                flag(ReasonCode::EmptyDescription);
            }

            if line.quantity.trim().is_empty() {
                flag(ReasonCode::MissingQuantity);
            } else if normalize_quantity(&line.quantity) < 1 {
                flag(ReasonCode::QuantityBelowOne);
            }

            if line.unit_price.trim().is_empty() {
                flag(ReasonCode::MissingPrice);
            } else {
                match parse_price(&line.unit_price) {
                    None => flag(ReasonCode::PriceNotANumber),
                    Some(price) if price < 0.0 => flag(ReasonCode::NegativePrice),
                    Some(_) => {}
                }
            }
        }

        if reasons.is_empty() {
            Ok(())
        } else {
            Err(Invalid { reasons })
        }
    }

    /// Validates, then builds the request body with trimmed text.
    pub fn to_payload(&self) -> Result<InvoicePayload, Invalid> {
        self.validate()?;
        let lines = self
            .lines
            .iter()
            .map(|line| InvoiceLine {
                id: line.id,
                quantity: normalize_quantity(&line.quantity),
                description: line.description.trim().to_string(),
                unit_price: parse_price(&line.unit_price).unwrap_or(0.0),
            })
            .collect();
        Ok(InvoicePayload {
            client_name: self.client_name.trim().to_string(),
            lines,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme() -> InvoiceDraft {
        let mut draft = InvoiceDraft::new();
        draft.client_name = "Acme".into();
        *draft.line_mut(0).unwrap() = DraftLine::new("2", "500", "Widget");
        draft
    }

    #[test]
    fn new_draft_has_one_blank_line() {
        let draft = InvoiceDraft::new();
        assert_eq!(draft.lines(), &[DraftLine::new("1", "0", "")]);
        assert_eq!(draft.total(), 0.0);
    }

    #[test]
    fn valid_draft_builds_payload() {
        let mut draft = acme();
        draft.line_mut(0).unwrap().description = "  Widget  ".into();
        let payload = draft.to_payload().unwrap();
        assert_eq!(payload.client_name, "Acme");
        assert_eq!(payload.lines[0].description, "Widget");
        assert_eq!(payload.lines[0].quantity, 2);
        assert_eq!(payload.lines[0].unit_price, 500.0);
        assert_eq!(draft.total(), 1000.0);
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let mut draft = acme();
        draft.line_mut(0).unwrap().quantity = "0".into();
        let err = draft.validate().unwrap_err();
        assert!(err.has(Some(0), ReasonCode::QuantityBelowOne));
    }

    #[test]
    fn whitespace_description_is_rejected() {
        let mut draft = acme();
        draft.line_mut(0).unwrap().description = "  ".into();
        let err = draft.validate().unwrap_err();
        assert!(err.has(Some(0), ReasonCode::EmptyDescription));
    }

    #[test]
    fn missing_price_is_not_free() {
        let mut draft = acme();
        draft.line_mut(0).unwrap().unit_price = "".into();
        let err = draft.validate().unwrap_err();
        assert!(err.has(Some(0), ReasonCode::MissingPrice));
    }

    #[test]
    fn zero_price_is_allowed() {
        let mut draft = acme();
        draft.line_mut(0).unwrap().unit_price = "0".into();
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn price_checks_cover_text_and_sign() {
        let mut draft = acme();
        draft.line_mut(0).unwrap().unit_price = "abc".into();
        draft.push_line(DraftLine::new("1", "-5", "Refund"));
        let err = draft.validate().unwrap_err();
        assert!(err.has(Some(0), ReasonCode::PriceNotANumber));
        assert!(err.has(Some(1), ReasonCode::NegativePrice));
    }

    #[test]
    fn short_client_name_is_rejected() {
        let mut draft = acme();
        draft.client_name = " A ".into();
        assert!(draft.validate().unwrap_err().has(None, ReasonCode::ClientNameTooShort));
    }

    #[test]
    fn last_line_cannot_be_removed() {
        let mut draft = acme();
        assert_eq!(draft.remove_line(0), Err(DraftError::LastLine));
        assert_eq!(draft.lines().len(), 1);
    }

    #[test]
    fn removal_works_while_lines_remain() {
        let mut draft = acme();
        let index = draft.add_line();
        assert_eq!(index, 1);
        assert!(draft.remove_line(0).is_ok());
        assert_eq!(draft.lines(), &[DraftLine::blank()]);
        assert_eq!(draft.remove_line(5), Err(DraftError::NoSuchLine(5)));
    }

    #[test]
    fn message_aggregates_every_reason() {
        let mut draft = InvoiceDraft::new();
        draft.line_mut(0).unwrap().quantity = "".into();
        let message = draft.validate().unwrap_err().to_string();
        assert_eq!(
            message,
            "Please correct the invoice: client name must have at least 2 characters; \
             line 1: description is empty; line 1: quantity is missing"
        );
    }

    #[test]
    fn rehydrated_draft_keeps_line_ids() {
        let invoice = Invoice {
            id: 3,
            invoice_number: "F-3".into(),
            client_name: "Bolt".into(),
            issue_date: None,
            lines: vec![InvoiceLine { id: Some(11), quantity: 3, description: "Nut".into(), unit_price: 2.5 }],
            total: 7.5,
            total_in_words: None,
            amount_paid: None,
            amount_remaining: None,
            payment_status: None,
        };
        let draft = InvoiceDraft::from_invoice(&invoice);
        assert_eq!(draft.lines()[0].id, Some(11));
        assert_eq!(draft.total(), 7.5);
        assert_eq!(draft.to_payload().unwrap().lines[0].id, Some(11));
    }
}
