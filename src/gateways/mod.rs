pub mod mail;
pub mod media;
pub mod payment;

pub use mail::{Mailer, MailtrapMailer};
pub use media::{CloudinaryStore, ImageStore};
pub use payment::{CheckoutSession, CheckoutSessionParams, PaymentGateway, PaymentLineItem, StripeGateway};

use thiserror::Error;

/// Errors surfaced by the external provider clients (payment, mail, media).
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed before a response was obtained.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("{service} API error: {status} - {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },

    /// The provider's response could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),
}
