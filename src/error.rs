use reqwest::StatusCode;
use thiserror::Error;

use crate::draft::{DraftError, Invalid};
use crate::payment::PaymentRejected;

#[derive(Debug, Error)]
pub enum Error {
    /// Local draft checks failed; nothing was sent.
    #[error("{0}")]
    Validation(#[from] Invalid),

    #[error("{0}")]
    Draft(#[from] DraftError),

    #[error("{0}")]
    PaymentRejected(#[from] PaymentRejected),

    /// Non-success response. `message` is the server's `message` field.
    #[error("API error ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Api { status: StatusCode, message: Option<String> },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Prompt error: {0}")]
    Prompt(#[from] inquire::InquireError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Text for an error banner: the server's own message when it sent one,
    /// local validation text as is, otherwise `fallback`.
    pub fn banner_message(&self, fallback: &str) -> String {
        match self {
            Self::Api { message: Some(message), .. } if !message.trim().is_empty() => message.clone(),
            Self::Validation(_) | Self::Draft(_) | Self::PaymentRejected(_) => self.to_string(),
            _ => fallback.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_is_used_verbatim() {
        let err = Error::Api {
            status: StatusCode::BAD_REQUEST,
            message: Some("Montant invalide".into()),
        };
        assert_eq!(err.banner_message("Could not add payment"), "Montant invalide");
    }

    #[test]
    fn missing_message_falls_back() {
        let err = Error::Api { status: StatusCode::INTERNAL_SERVER_ERROR, message: None };
        assert_eq!(err.banner_message("Could not add payment"), "Could not add payment");
        let err = Error::NotFound("invoice 4".into());
        assert_eq!(err.banner_message("Could not load"), "Could not load");
        assert!(err.is_not_found());
    }

    #[test]
    fn local_errors_keep_their_text() {
        let err = Error::from(DraftError::LastLine);
        assert_eq!(err.banner_message("ignored"), "an invoice must keep at least one line");
    }
}
