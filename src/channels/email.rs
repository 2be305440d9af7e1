//! Email delivery via lettre: SMTP relay, or an outbox directory of `.eml` files.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{FileTransport, Message, SmtpTransport, Transport};
use secrecy::{ExposeSecret, SecretString};

use crate::channels::{Notifier, OutgoingReport};
use crate::error::{ConfigError, DeliveryError};

/// Sender used when no sender variable is set and `SMTP_USERNAME` is not an address.
pub const DEFAULT_FROM_ADDRESS: &str = "automacao@localhost.localdomain";

/// Default outbox directory for the file transport.
pub const DEFAULT_OUTBOX_DIR: &str = "./outbox";

// ── Configuration ───────────────────────────────────────────────────

/// SMTP relay settings.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
}

impl SmtpConfig {
    /// Build config from environment variables.
    /// Returns `None` if `SMTP_HOST` is not set.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let host = var("SMTP_HOST").filter(|h| !h.trim().is_empty())?;

        let port: u16 = var("SMTP_PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(587);

        let username = var("SMTP_USERNAME").unwrap_or_default();
        let password = SecretString::from(var("SMTP_PASSWORD").unwrap_or_default());

        Some(Self {
            host,
            port,
            username,
            password,
        })
    }
}

/// Delivery settings, built from environment variables.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub from_address: String,
    /// SMTP relay; when absent, reports are written to `outbox_dir`.
    pub smtp: Option<SmtpConfig>,
    pub outbox_dir: PathBuf,
}

impl EmailConfig {
    pub fn from_env() -> Self {
        let smtp = SmtpConfig::from_env();

        let from_address = resolve_from_address(
            std::env::var("SMTP_FROM").ok(),
            std::env::var("EMAIL_FROM_ADDRESS").ok(),
            smtp.as_ref().map(|s| s.username.as_str()),
        );

        let outbox_dir = std::env::var("ALERTS_OUTBOX_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_OUTBOX_DIR));

        Self {
            from_address,
            smtp,
            outbox_dir,
        }
    }

    /// Build the notifier this configuration selects.
    pub fn notifier(&self) -> Result<Box<dyn Notifier>, ConfigError> {
        match &self.smtp {
            Some(smtp) => Ok(Box::new(SmtpNotifier::new(smtp, &self.from_address)?)),
            None => Ok(Box::new(OutboxNotifier::new(
                &self.outbox_dir,
                &self.from_address,
            )?)),
        }
    }
}

/// Pick the sender: `SMTP_FROM`, then `EMAIL_FROM_ADDRESS`, then an SMTP
/// username that looks like an address, then [`DEFAULT_FROM_ADDRESS`].
/// Blank values are skipped.
fn resolve_from_address(
    smtp_from: Option<String>,
    email_from: Option<String>,
    username: Option<&str>,
) -> String {
    smtp_from
        .into_iter()
        .chain(email_from)
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
        .or_else(|| {
            username
                .map(str::trim)
                .filter(|u| u.contains('@'))
                .map(String::from)
        })
        .unwrap_or_else(|| DEFAULT_FROM_ADDRESS.to_string())
}

// ── Message building ────────────────────────────────────────────────

fn parse_from(from_address: &str) -> Result<Mailbox, ConfigError> {
    from_address
        .parse()
        .map_err(|e| ConfigError::InvalidValue {
            key: "SMTP_FROM".into(),
            message: format!("{e}"),
        })
}

/// Build an HTML email for a report.
pub fn build_message(from: &Mailbox, report: &OutgoingReport) -> Result<Message, DeliveryError> {
    let to: Mailbox = report
        .to
        .trim()
        .parse()
        .map_err(|e| DeliveryError::InvalidAddress {
            address: report.to.clone(),
            reason: format!("{e}"),
        })?;

    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(report.subject.as_str())
        .header(ContentType::TEXT_HTML)
        .body(report.html_body.clone())
        .map_err(|e| DeliveryError::Build(format!("{e}")))
}

// ── SMTP ────────────────────────────────────────────────────────────

/// Delivers reports through an SMTP relay (STARTTLS).
pub struct SmtpNotifier {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig, from_address: &str) -> Result<Self, ConfigError> {
        let from = parse_from(from_address)?;

        let mut builder = SmtpTransport::starttls_relay(&config.host)
            .map_err(|e| ConfigError::InvalidValue {
                key: "SMTP_HOST".into(),
                message: format!("SMTP relay error: {e}"),
            })?
            .port(config.port);

        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.expose_secret().to_string(),
            ));
        }

        tracing::info!(host = %config.host, port = config.port, "Using SMTP relay");

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    fn name(&self) -> &str {
        "smtp"
    }

    async fn send(&self, report: &OutgoingReport) -> Result<(), DeliveryError> {
        let message = build_message(&self.from, report)?;
        let transport = self.transport.clone();

        tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .map_err(|e| DeliveryError::Transport {
                name: "smtp".into(),
                reason: format!("send task panicked: {e}"),
            })?
            .map_err(|e| DeliveryError::Transport {
                name: "smtp".into(),
                reason: format!("SMTP send failed: {e}"),
            })?;

        Ok(())
    }
}

// ── Outbox ──────────────────────────────────────────────────────────

/// Writes each report as an `.eml` file for later review or pickup.
pub struct OutboxNotifier {
    transport: FileTransport,
    dir: PathBuf,
    from: Mailbox,
}

impl OutboxNotifier {
    /// Creates `dir` if needed.
    pub fn new(dir: &Path, from_address: &str) -> Result<Self, ConfigError> {
        let from = parse_from(from_address)?;
        std::fs::create_dir_all(dir)?;

        tracing::info!(dir = %dir.display(), "No SMTP host configured, writing reports to outbox");

        Ok(Self {
            transport: FileTransport::new(dir),
            dir: dir.to_path_buf(),
            from,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl Notifier for OutboxNotifier {
    fn name(&self) -> &str {
        "outbox"
    }

    async fn send(&self, report: &OutgoingReport) -> Result<(), DeliveryError> {
        let message = build_message(&self.from, report)?;
        let transport = self.transport.clone();

        let id = tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .map_err(|e| DeliveryError::Transport {
                name: "outbox".into(),
                reason: format!("write task panicked: {e}"),
            })?
            .map_err(|e| DeliveryError::Transport {
                name: "outbox".into(),
                reason: format!("failed to write message: {e}"),
            })?;

        tracing::debug!(id = %id, dir = %self.dir.display(), "Report written to outbox");
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────────
