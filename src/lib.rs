//! Terminal client for a remote invoicing ("facture") API.
//!
//! The server owns numbering, totals, payment status and PDF rendering. This
//! crate keeps the live line-item total, the payment progress figures and the
//! checks a draft must pass before it is sent.

pub mod api;
pub mod config;
pub mod draft;
pub mod error;
pub mod format;
pub mod model;
pub mod money;
pub mod payment;
pub mod screens;
pub mod selection;
pub mod share;
pub mod totals;

pub use error::{Error, Result};
