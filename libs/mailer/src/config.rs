//! SMTP configuration

use std::env;

use crate::sender::EmailError;

/// Port on which SMTP servers expect implicit TLS
pub const IMPLICIT_TLS_PORT: u16 = 465;

/// SMTP connection and sender identity
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Address placed in the `From` header
    pub from_address: String,
    /// Display name placed in the `From` header
    pub from_name: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("from_address", &self.from_address)
            .field("from_name", &self.from_name)
            .finish()
    }
}

impl SmtpConfig {
    /// Create a new SmtpConfig from environment variables
    ///
    /// Returns `Ok(None)` when `SMTP_USER` or `SMTP_PASS` is missing or empty,
    /// and an error when `SMTP_PORT` is set but not a port number.
    ///
    /// # Environment Variables
    /// - `SMTP_HOST`: SMTP server (default: "smtp.163.com")
    /// - `SMTP_PORT`: SMTP port (default: 465)
    /// - `SMTP_USER` / `SMTP_PASS`: credentials
    /// - `FROM_EMAIL`: sender address (default: `SMTP_USER`)
    /// - `FROM_NAME`: sender display name (default: "Daily Check-In")
    pub fn from_env() -> Result<Option<Self>, EmailError> {
        let (Some(username), Some(password)) = (non_empty("SMTP_USER"), non_empty("SMTP_PASS"))
        else {
            return Ok(None);
        };

        let host = non_empty("SMTP_HOST").unwrap_or_else(|| "smtp.163.com".to_string());
        let port = match non_empty("SMTP_PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                EmailError::InvalidConfig(format!("SMTP_PORT must be a port number, got {raw:?}"))
            })?,
            None => IMPLICIT_TLS_PORT,
        };
        let from_address = non_empty("FROM_EMAIL").unwrap_or_else(|| username.clone());
        let from_name = non_empty("FROM_NAME").unwrap_or_else(|| "Daily Check-In".to_string());

        Ok(Some(Self {
            host,
            port,
            username,
            password,
            from_address,
            from_name,
        }))
    }

    /// Whether the connection starts in TLS rather than upgrading with STARTTLS
    pub fn implicit_tls(&self) -> bool {
        self.port == IMPLICIT_TLS_PORT
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
