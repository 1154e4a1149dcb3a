use std::net::SocketAddr;

use restx_api::config::{env_or, split_list, ApiSettings, ConfigError};

/// Server configuration loaded from environment variables.
///
/// Everything except `DATABASE_URL` has a default suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    pub database_url: String,
    /// View and schema settings.
    pub api: ApiSettings,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `DATABASE_URL`         | (required)                 |
    ///
    /// See [`ApiSettings::from_env`] for the view layer variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = env_or("PORT", 3000, "a valid u16")?;

        let cors_origins = split_list(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into()),
        );

        let request_timeout_secs: u64 = env_or("REQUEST_TIMEOUT_SECS", 30, "a valid u64")?;

        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            database_url,
            api: ApiSettings::from_env()?,
        })
    }

    /// The address to bind, from `host` and `port`.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = self.host.parse().map_err(|_| ConfigError::Invalid {
            var: "HOST",
            expected: "an IP address",
            value: self.host.clone(),
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}
