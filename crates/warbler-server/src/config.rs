//! Server configuration loaded from environment variables.
//!
//! Every setting has a default so the server starts with no configuration
//! for local development.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use tracing::warn;

/// Secret used when `WARBLER_SECRET_KEY` is unset. Fine locally, never in
/// production.
pub const DEV_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Env: `WARBLER_HOST`. Default: `0.0.0.0`
    pub host: IpAddr,

    /// Env: `WARBLER_PORT`. Default: `3000`
    pub port: u16,

    /// Env: `WARBLER_DB_PATH`. Default: `warbler.db`
    pub db_path: PathBuf,

    /// Signs session tokens.
    /// Env: `WARBLER_SECRET_KEY`. Default: [`DEV_SECRET`]
    pub secret_key: String,

    /// Env: `WARBLER_SESSION_DAYS`. Default: `30`
    pub session_days: i64,

    /// Env: `WARBLER_STATIC_DIR`. Default: `./static`
    pub static_dir: PathBuf,

    /// Marks the session cookie `Secure`.
    /// Env: `WARBLER_SECURE_COOKIES` (true/false). Default: `false`
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: 3000,
            db_path: PathBuf::from("warbler.db"),
            secret_key: DEV_SECRET.to_string(),
            session_days: 30,
            static_dir: PathBuf::from("./static"),
            secure_cookies: false,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Unparseable values are logged
    /// and replaced by the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(host) = lookup("WARBLER_HOST") {
            match host.parse() {
                Ok(parsed) => config.host = parsed,
                Err(_) => warn!(value = %host, "Invalid WARBLER_HOST, using default"),
            }
        }

        if let Some(port) = lookup("WARBLER_PORT") {
            match port.parse() {
                Ok(parsed) => config.port = parsed,
                Err(_) => warn!(value = %port, "Invalid WARBLER_PORT, using default"),
            }
        }

        if let Some(path) = lookup("WARBLER_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }

        if let Some(secret) = lookup("WARBLER_SECRET_KEY").filter(|s| !s.is_empty()) {
            config.secret_key = secret;
        }

        if let Some(days) = lookup("WARBLER_SESSION_DAYS") {
            match days.parse::<i64>() {
                Ok(n) if n > 0 => config.session_days = n,
                _ => warn!(value = %days, "Invalid WARBLER_SESSION_DAYS, using default"),
            }
        }

        if let Some(dir) = lookup("WARBLER_STATIC_DIR") {
            config.static_dir = PathBuf::from(dir);
        }

        if let Some(val) = lookup("WARBLER_SECURE_COOKIES") {
            config.secure_cookies = val == "true" || val == "1";
        }

        config
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.secret_key == DEV_SECRET
    }
}
