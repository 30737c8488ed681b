use reqwest::Url;
use serde::Serialize;
use tera::{Context, Tera};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::format::{format_amount, format_date};
use crate::model::Invoice;

const WHATSAPP_SHARE: &str = "https://wa.me/";

pub const DEFAULT_SHARE_TEMPLATE: &str = "Invoice {{ number }} for {{ client }}\n\
Date: {{ date }}\n\
Total: {{ total }}\n\
\n\
Thank you for your business!";

#[derive(Serialize)]
struct ShareContext<'a> {
    number: &'a str,
    client: &'a str,
    date: String,
    total: String,
    pdf_url: String,
}

/// Message sent alongside a shared invoice.
pub fn share_message(invoice: &Invoice, settings: &Settings) -> Result<String> {
    let template = settings.share_template.as_deref().unwrap_or(DEFAULT_SHARE_TEMPLATE);
    let data = ShareContext {
        number: &invoice.invoice_number,
        client: &invoice.client_name,
        date: format_date(invoice.issue_date),
        total: format_amount(Some(invoice.total), &settings.currency),
        pdf_url: settings.pdf_url(invoice.id),
    };
    let context = Context::from_serialize(&data)?;
    Ok(Tera::one_off(template, &context, false)?)
}

pub fn pdf_file_name(invoice: &Invoice) -> String {
    format!("Facture_{}.pdf", invoice.invoice_number)
}

/// Link-based share used when no native share sheet is available.
pub fn fallback_share_url(message: &str, pdf_url: &str) -> Result<Url> {
    let text = format!("{message}\n\nDownload the invoice: {pdf_url}");
    Url::parse_with_params(WHATSAPP_SHARE, &[("text", text)]).map_err(|e| Error::Config(e.to_string()))
}
