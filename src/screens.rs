//! Per-screen state for the CLI.
//!
//! Mutations never patch local state: each successful create, update, delete
//! or payment change is followed by a fresh fetch from the API. API failures
//! are turned into a [`Banner`] and never propagate past the screen.

use chrono::NaiveDate;

use crate::api::{FactureApi, OUTSTANDING_SORT, PageRequest, SortDirection};
use crate::draft::InvoiceDraft;
use crate::error::Error;
use crate::model::{Invoice, InvoiceId, NewPayment, Payment, PaymentId, PaymentStats, PaymentStatus};
use crate::money::normalize_amount;
use crate::payment::{Reconciliation, check_amount, invoice_progress, reconcile_invoice};
use crate::selection::Selection;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    Error(String),
    Success(String),
}

impl Banner {
    fn from_error(err: &Error, fallback: &str) -> Self {
        Self::Error(err.banner_message(fallback))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    All,
    Search(String),
    Status(PaymentStatus),
    Outstanding,
}

impl Listing {
    /// A blank search shows the full list.
    pub fn search(term: &str) -> Self {
        let term = term.trim();
        if term.is_empty() { Self::All } else { Self::Search(term.to_string()) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
}

pub struct ListScreen<'a, A: FactureApi> {
    api: &'a A,
    page_size: u32,
    listing: Listing,
    pub pagination: Pagination,
    pub invoices: Vec<Invoice>,
    pub selection: Selection,
    pub banner: Option<Banner>,
}

impl<'a, A: FactureApi> ListScreen<'a, A> {
    pub fn new(api: &'a A, page_size: u32) -> Self {
        Self {
            api,
            page_size,
            listing: Listing::All,
            pagination: Pagination::default(),
            invoices: Vec::new(),
            selection: Selection::new(),
            banner: None,
        }
    }

    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    pub fn set_listing(&mut self, listing: Listing) {
        self.listing = match listing {
            Listing::Search(term) => Listing::search(&term),
            other => other,
        };
    }

    pub fn visible_ids(&self) -> Vec<InvoiceId> {
        self.invoices.iter().map(|i| i.id).collect()
    }

    /// Fetches `page` of the current listing. Returns whether it succeeded.
    pub fn load(&mut self, page: u32) -> bool {
        let request = PageRequest::new(page, self.page_size);
        let result = match &self.listing {
            Listing::All => self.api.list(&request),
            Listing::Search(term) => self.api.search(term, page, self.page_size),
            Listing::Status(status) => self.api.by_status(*status, &request),
            Listing::Outstanding => self
                .api
                .outstanding_page(&request.sorted_by(OUTSTANDING_SORT, SortDirection::Desc)),
        };
        match result {
            Ok(found) => {
                self.invoices = found.invoices;
                self.pagination = Pagination {
                    current_page: found.current_page,
                    total_pages: found.total_pages,
                    total_items: found.total_items,
                };
                true
            }
            Err(err) => {
                let fallback = match self.listing {
                    Listing::Search(_) => "Search failed",
                    _ => "Could not load invoices",
                };
                self.banner = Some(Banner::from_error(&err, fallback));
                false
            }
        }
    }

    /// Moves to `page` when it exists; out-of-range requests are ignored.
    pub fn go_to(&mut self, page: u32) -> bool {
        if page >= self.pagination.total_pages {
            return false;
        }
        self.load(page)
    }

    pub fn delete(&mut self, id: InvoiceId) -> bool {
        match self.api.delete(id) {
            Ok(()) => {
                tracing::info!(id, "invoice deleted");
                self.banner = Some(Banner::Success("Invoice deleted".to_string()));
                self.selection.deselect(id);
                self.load(0);
                true
            }
            Err(err) => {
                self.banner = Some(Banner::from_error(&err, "Could not delete the invoice"));
                false
            }
        }
    }

    /// Deletes every selected invoice in one call. Returns how many were
    /// deleted; 0 when nothing was selected or the call failed.
    pub fn delete_selected(&mut self) -> usize {
        if self.selection.is_empty() {
            return 0;
        }
        let ids = self.selection.ids();
        match self.api.delete_many(&ids) {
            Ok(()) => {
                tracing::info!(count = ids.len(), "invoices deleted");
                self.banner = Some(Banner::Success(format!("{} invoice(s) deleted", ids.len())));
                self.selection.clear();
                self.load(0);
                ids.len()
            }
            Err(err) => {
                self.banner = Some(Banner::from_error(&err, "Could not delete the selected invoices"));
                0
            }
        }
    }
}

/// Outcome of opening an invoice's detail screen.
#[derive(Debug, Clone, PartialEq)]
pub enum Detail {
    Loaded(Box<Invoice>),
    /// Terminal state; the only way out is back to the list.
    NotFound,
    Failed(String),
}

impl Detail {
    pub fn load<A: FactureApi>(api: &A, id: InvoiceId) -> Self {
        match api.get(id) {
            Ok(invoice) => Self::Loaded(Box::new(invoice)),
            Err(err) if err.is_not_found() => Self::NotFound,
            Err(err) => Self::Failed(err.banner_message("Could not load the invoice")),
        }
    }

    pub fn reconciliation(&self) -> Option<Reconciliation> {
        match self {
            Self::Loaded(invoice) => Some(reconcile_invoice(invoice)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit(InvoiceId),
}

pub struct EditorScreen<'a, A: FactureApi> {
    api: &'a A,
    mode: EditorMode,
    pub draft: InvoiceDraft,
    pub saved: Option<Invoice>,
    pub banner: Option<Banner>,
}

impl<'a, A: FactureApi> EditorScreen<'a, A> {
    pub fn create(api: &'a A) -> Self {
        Self {
            api,
            mode: EditorMode::Create,
            draft: InvoiceDraft::new(),
            saved: None,
            banner: None,
        }
    }

    /// Loads the invoice and re-hydrates a draft from it.
    pub fn edit(api: &'a A, id: InvoiceId) -> Result<Self, Detail> {
        match Detail::load(api, id) {
            Detail::Loaded(invoice) => Ok(Self {
                api,
                mode: EditorMode::Edit(id),
                draft: InvoiceDraft::from_invoice(&invoice),
                saved: Some(*invoice),
                banner: None,
            }),
            other => Err(other),
        }
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    /// Removes a line, surfacing the refusal for the last one as a banner.
    pub fn remove_line(&mut self, index: usize) -> bool {
        match self.draft.remove_line(index) {
            Ok(_) => true,
            Err(err) => {
                self.banner = Some(Banner::from_error(&err.into(), "Could not remove the line"));
                false
            }
        }
    }

    /// Validates, sends, then reloads the saved invoice. Invalid drafts are
    /// never sent.
    pub fn submit(&mut self) -> Option<&Invoice> {
        let payload = match self.draft.to_payload() {
            Ok(payload) => payload,
            Err(invalid) => {
                self.banner = Some(Banner::Error(invalid.to_string()));
                return None;
            }
        };

        let (result, fallback, done) = match self.mode {
            EditorMode::Create => (
                self.api.create(&payload),
                "Could not create the invoice",
                "Invoice created",
            ),
            EditorMode::Edit(id) => (
                self.api.update(id, &payload),
                "Could not update the invoice",
                "Invoice updated",
            ),
        };

        let stored = match result.and_then(|written| self.api.get(written.id)) {
            Ok(stored) => stored,
            Err(err) => {
                self.banner = Some(Banner::from_error(&err, fallback));
                return None;
            }
        };

        tracing::info!(id = stored.id, number = %stored.invoice_number, "invoice saved");
        self.mode = EditorMode::Edit(stored.id);
        self.draft = InvoiceDraft::from_invoice(&stored);
        self.banner = Some(Banner::Success(done.to_string()));
        self.saved = Some(stored);
        self.saved.as_ref()
    }
}

pub struct PaymentsScreen<'a, A: FactureApi> {
    api: &'a A,
    invoice_id: InvoiceId,
    currency: String,
    pub invoice: Option<Invoice>,
    pub payments: Vec<Payment>,
    pub banner: Option<Banner>,
}

impl<'a, A: FactureApi> PaymentsScreen<'a, A> {
    pub fn new(api: &'a A, invoice_id: InvoiceId, currency: &str) -> Self {
        Self {
            api,
            invoice_id,
            currency: currency.to_string(),
            invoice: None,
            payments: Vec::new(),
            banner: None,
        }
    }

    /// Fetches the invoice and its payments. Returns whether both arrived.
    pub fn load(&mut self) -> bool {
        let invoice_ok = match self.api.get(self.invoice_id) {
            Ok(invoice) => {
                self.invoice = Some(invoice);
                true
            }
            Err(err) => {
                self.banner = Some(Banner::from_error(&err, "Could not load the invoice"));
                false
            }
        };
        let payments_ok = match self.api.payments(self.invoice_id) {
            Ok(payments) => {
                self.payments = payments;
                true
            }
            Err(err) => {
                self.banner = Some(Banner::from_error(&err, "Could not load the payments"));
                false
            }
        };
        invoice_ok && payments_ok
    }

    /// Remaining balance as reported by the server.
    pub fn remaining(&self) -> f64 {
        self.invoice
            .as_ref()
            .map(|i| normalize_amount(i.amount_remaining))
            .unwrap_or(0.0)
    }

    pub fn reconciliation(&self) -> Option<Reconciliation> {
        self.invoice.as_ref().map(reconcile_invoice)
    }

    pub fn progress(&self) -> u32 {
        self.invoice
            .as_ref()
            .map(|i| invoice_progress(i).percent)
            .unwrap_or(0)
    }

    /// Records a payment after the local guard accepts it, then re-fetches.
    pub fn add_payment(&mut self, raw_amount: &str, date: NaiveDate) -> bool {
        let amount = match check_amount(raw_amount, self.remaining(), &self.currency) {
            Ok(amount) => amount,
            Err(rejected) => {
                self.banner = Some(Banner::from_error(&rejected.into(), "Invalid amount"));
                return false;
            }
        };
        let payment = NewPayment { amount, payment_date: date };
        match self.api.add_payment(self.invoice_id, &payment) {
            Ok(_) => {
                tracing::info!(invoice = self.invoice_id, amount, "payment added");
                self.banner = Some(Banner::Success("Payment added".to_string()));
                self.load();
                true
            }
            Err(err) => {
                self.banner = Some(Banner::from_error(&err, "Could not add the payment"));
                false
            }
        }
    }

    pub fn delete_payment(&mut self, payment_id: PaymentId) -> bool {
        match self.api.delete_payment(self.invoice_id, payment_id) {
            Ok(()) => {
                tracing::info!(invoice = self.invoice_id, payment_id, "payment deleted");
                self.banner = Some(Banner::Success("Payment deleted".to_string()));
                self.load();
                true
            }
            Err(err) => {
                self.banner = Some(Banner::from_error(&err, "Could not delete the payment"));
                false
            }
        }
    }
}

/// Dashboard figures plus the most recent invoices.
pub struct Dashboard {
    pub stats: PaymentStats,
    pub recent: Vec<Invoice>,
}

impl Dashboard {
    pub fn load<A: FactureApi>(api: &A, recent: u32) -> Result<Self, Banner> {
        let stats = api
            .payment_stats()
            .map_err(|err| Banner::from_error(&err, "Could not load statistics"))?;
        let recent = api
            .list(&PageRequest::new(0, recent))
            .map(|page| page.invoices)
            .map_err(|err| Banner::from_error(&err, "Could not load statistics"))?;
        Ok(Self { stats, recent })
    }
}
