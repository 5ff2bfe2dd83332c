//! Outgoing email for the check-in services
//!
//! [`EmailSender`] is the only thing the rest of the workspace sees. The SMTP
//! implementation is built from the environment; when no credentials are
//! configured a [`DisabledSender`] takes its place and every send fails
//! with [`EmailError::NotConfigured`].

pub mod config;
pub mod sender;
pub mod templates;

use std::sync::Arc;

use tracing::warn;

pub use config::SmtpConfig;
pub use sender::{DisabledSender, EmailError, EmailSender, OutgoingEmail, SmtpSender};

/// Build the sender described by the `SMTP_*` environment variables
pub fn sender_from_env() -> Result<Arc<dyn EmailSender>, EmailError> {
    match SmtpConfig::from_env()? {
        Some(config) => Ok(Arc::new(SmtpSender::new(config)?)),
        None => {
            warn!("SMTP credentials not set, email sending is disabled");
            Ok(Arc::new(DisabledSender))
        }
    }
}
