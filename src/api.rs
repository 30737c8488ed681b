//! Client for the remote invoicing API.
//!
//! [`FactureApi`] is the seam the screens depend on; [`HttpApi`] is the
//! blocking `reqwest` implementation used by the CLI.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::model::{
    Invoice, InvoiceId, InvoicePage, InvoicePayload, NewPayment, Payment, PaymentId, PaymentStats,
    PaymentStatus,
};

pub const DEFAULT_SORT: &str = "dateFacturation";
pub const OUTSTANDING_SORT: &str = "resteAPayer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort_by: String,
    pub direction: SortDirection,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size,
            sort_by: DEFAULT_SORT.to_string(),
            direction: SortDirection::Desc,
        }
    }

    pub fn sorted_by(mut self, field: &str, direction: SortDirection) -> Self {
        self.sort_by = field.to_string();
        self.direction = direction;
        self
    }

    pub fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("page", self.page.to_string()),
            ("size", self.size.to_string()),
            ("sortBy", self.sort_by.clone()),
            ("direction", self.direction.as_str().to_string()),
        ]
    }
}

/// Every call the client makes against the invoicing API.
pub trait FactureApi {
    fn list(&self, page: &PageRequest) -> Result<InvoicePage>;
    fn search(&self, term: &str, page: u32, size: u32) -> Result<InvoicePage>;
    fn by_status(&self, status: PaymentStatus, page: &PageRequest) -> Result<InvoicePage>;
    fn outstanding(&self) -> Result<Vec<Invoice>>;
    fn outstanding_page(&self, page: &PageRequest) -> Result<InvoicePage>;
    fn get(&self, id: InvoiceId) -> Result<Invoice>;
    fn preview(&self, id: InvoiceId) -> Result<serde_json::Value>;
    fn create(&self, payload: &InvoicePayload) -> Result<Invoice>;
    fn update(&self, id: InvoiceId, payload: &InvoicePayload) -> Result<Invoice>;
    fn delete(&self, id: InvoiceId) -> Result<()>;
    fn delete_many(&self, ids: &[InvoiceId]) -> Result<()>;
    fn download_pdf(&self, id: InvoiceId) -> Result<Vec<u8>>;
    fn view_pdf(&self, id: InvoiceId) -> Result<Vec<u8>>;
    fn payment_stats(&self) -> Result<PaymentStats>;
    fn payments(&self, id: InvoiceId) -> Result<Vec<Payment>>;
    fn add_payment(&self, id: InvoiceId, payment: &NewPayment) -> Result<Payment>;
    fn delete_payment(&self, id: InvoiceId, payment_id: PaymentId) -> Result<()>;
    fn total_paid(&self, id: InvoiceId) -> Result<f64>;
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Extracts the `message` field from an error body, if any.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
}

fn status_error(status: StatusCode, body: &str, what: &str) -> Error {
    let message = error_message(body);
    if status == StatusCode::NOT_FOUND {
        return Error::NotFound(message.unwrap_or_else(|| what.to_string()));
    }
    Error::Api { status, message }
}

#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: settings.api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        tracing::debug!(%method, %url, "api request");
        self.client.request(method, url)
    }

    fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = request.send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        let err = status_error(status, &body, what);
        tracing::warn!(%status, what, error = %err, "api call failed");
        Err(err)
    }

    fn json<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let bytes = self.send(request, what)?.bytes()?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn unit(&self, request: RequestBuilder, what: &str) -> Result<()> {
        self.send(request, what).map(|_| ())
    }

    fn blob(&self, request: RequestBuilder, what: &str) -> Result<Vec<u8>> {
        Ok(self.send(request, what)?.bytes()?.to_vec())
    }
}

impl FactureApi for HttpApi {
    fn list(&self, page: &PageRequest) -> Result<InvoicePage> {
        let req = self.request(Method::GET, "factures/paginated").query(&page.query());
        self.json(req, "invoice list")
    }

    fn search(&self, term: &str, page: u32, size: u32) -> Result<InvoicePage> {
        let req = self.request(Method::GET, "factures/search").query(&[
            ("search", term.to_string()),
            ("page", page.to_string()),
            ("size", size.to_string()),
        ]);
        self.json(req, "invoice search")
    }

    fn by_status(&self, status: PaymentStatus, page: &PageRequest) -> Result<InvoicePage> {
        let req = self
            .request(Method::GET, "factures/by-statut")
            .query(&[("statut", status.as_wire())])
            .query(&page.query());
        self.json(req, "invoice list by status")
    }

    fn outstanding(&self) -> Result<Vec<Invoice>> {
        self.json(self.request(Method::GET, "factures/reste-a-payer"), "outstanding invoices")
    }

    fn outstanding_page(&self, page: &PageRequest) -> Result<InvoicePage> {
        let req = self.request(Method::GET, "factures/paginated/reste-a-payer").query(&page.query());
        self.json(req, "outstanding invoices")
    }

    fn get(&self, id: InvoiceId) -> Result<Invoice> {
        self.json(self.request(Method::GET, &format!("factures/{id}")), &format!("invoice {id}"))
    }

    fn preview(&self, id: InvoiceId) -> Result<serde_json::Value> {
        self.json(self.request(Method::GET, &format!("factures/{id}/preview")), &format!("invoice {id} preview"))
    }

    fn create(&self, payload: &InvoicePayload) -> Result<Invoice> {
        self.json(self.request(Method::POST, "factures").json(payload), "new invoice")
    }

    fn update(&self, id: InvoiceId, payload: &InvoicePayload) -> Result<Invoice> {
        let req = self.request(Method::PUT, &format!("factures/{id}")).json(payload);
        self.json(req, &format!("invoice {id}"))
    }

    fn delete(&self, id: InvoiceId) -> Result<()> {
        self.unit(self.request(Method::DELETE, &format!("factures/{id}")), &format!("invoice {id}"))
    }

    fn delete_many(&self, ids: &[InvoiceId]) -> Result<()> {
        self.unit(self.request(Method::DELETE, "factures/batch").json(ids), "invoice batch")
    }

    fn download_pdf(&self, id: InvoiceId) -> Result<Vec<u8>> {
        self.blob(self.request(Method::GET, &format!("factures/{id}/pdf")), &format!("invoice {id} PDF"))
    }

    fn view_pdf(&self, id: InvoiceId) -> Result<Vec<u8>> {
        self.blob(self.request(Method::GET, &format!("factures/{id}/view")), &format!("invoice {id} PDF"))
    }

    fn payment_stats(&self) -> Result<PaymentStats> {
        self.json(self.request(Method::GET, "factures/stats-paiements"), "payment statistics")
    }

    fn payments(&self, id: InvoiceId) -> Result<Vec<Payment>> {
        self.json(self.request(Method::GET, &format!("factures/{id}/paiements")), &format!("invoice {id} payments"))
    }

    fn add_payment(&self, id: InvoiceId, payment: &NewPayment) -> Result<Payment> {
        let req = self.request(Method::POST, &format!("factures/{id}/paiements")).json(payment);
        self.json(req, &format!("invoice {id} payments"))
    }

    fn delete_payment(&self, id: InvoiceId, payment_id: PaymentId) -> Result<()> {
        let req = self.request(Method::DELETE, &format!("factures/{id}/paiements/{payment_id}"));
        self.unit(req, &format!("payment {payment_id}"))
    }

    fn total_paid(&self, id: InvoiceId) -> Result<f64> {
        let req = self.request(Method::GET, &format!("factures/{id}/paiements/total"));
        let total: Option<f64> = self.json(req, &format!("invoice {id} payments total"))?;
        Ok(crate::money::normalize_amount(total))
    }
}
