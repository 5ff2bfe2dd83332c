//! HTTP server settings

use serde::Deserialize;

/// Name of the cookie holding the session token
pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Address the server listens on
    pub bind_address: String,
    /// Mark the session cookie `Secure`; enable behind HTTPS
    pub cookie_secure: bool,
}

impl ApiConfig {
    /// Load settings from `API_*` environment variables
    ///
    /// # Environment Variables
    /// - `API_BIND_ADDRESS` (default: "0.0.0.0:3000")
    /// - `API_COOKIE_SECURE` (default: false)
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .set_default("bind_address", "0.0.0.0:3000")?
            .set_default("cookie_secure", false)?
            .add_source(config::Environment::with_prefix("API").try_parsing(true))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_defaults() {
        let config = ApiConfig::from_env().unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:3000");
        assert!(!config.cookie_secure);
    }

    #[test]
    #[serial]
    fn test_environment_overrides() {
        unsafe {
            std::env::set_var("API_BIND_ADDRESS", "127.0.0.1:8080");
            std::env::set_var("API_COOKIE_SECURE", "true");
        }

        let config = ApiConfig::from_env().unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:8080");
        assert!(config.cookie_secure);

        unsafe {
            std::env::remove_var("API_BIND_ADDRESS");
            std::env::remove_var("API_COOKIE_SECURE");
        }
    }
}
