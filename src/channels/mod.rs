//! Notification delivery.
//!
//! The pipeline only knows the `Notifier` trait. Real transports live in
//! `email`; tests plug in their own implementation.

pub mod email;

pub use email::{EmailConfig, OutboxNotifier, SmtpConfig, SmtpNotifier};

use async_trait::async_trait;

use crate::error::DeliveryError;

/// A rendered report ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingReport {
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html_body: String,
    /// Destination address.
    pub to: String,
}

/// Trait for delivery backends. Pure I/O, no business logic.
///
/// A failed send affects only that recipient; the caller moves on to the
/// next group.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Backend name (e.g. "smtp", "outbox").
    fn name(&self) -> &str;

    /// Deliver one report.
    async fn send(&self, report: &OutgoingReport) -> Result<(), DeliveryError>;
}
