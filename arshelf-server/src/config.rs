//! Server configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then environment
//! variables. The CLI applies its own flags last.
//!
//! Environment variables:
//! - `ARSHELF_BIND`: listen address (default: 127.0.0.1:3030)
//! - `ARSHELF_PUBLIC_DIR`: static client files served with an `index.html` fallback
//! - `ARSHELF_CORS_PERMISSIVE`: allow any origin (`true`/`false`)
//! - `ARSHELF_SESSION_TTL_HOURS`: login session lifetime
//! - `ARSHELF_MAX_MODEL_BYTES`: largest accepted model upload, decoded
//! - `ARSHELF_SECURE_COOKIES`: mark session cookies `Secure`
//! - `ARSHELF_LOGIN_MAX_FAILURES`: failed logins allowed per username in the window
//! - `ARSHELF_LOGIN_WINDOW_SECS`: failed-login window length
//! - `DATABASE_URL`: Postgres connection string

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid value for {var}: '{value}'")]
    Env { var: &'static str, value: String },
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:3030)
    pub bind_addr: SocketAddr,

    /// Allow permissive CORS (default: false = localhost only)
    pub cors_permissive: bool,

    /// Directory holding the browser client
    pub public_dir: Option<PathBuf>,

    pub database_url: Option<String>,

    pub session_ttl_hours: i64,

    /// Upper bound for a decoded model file
    pub max_model_bytes: usize,

    pub secure_cookies: bool,

    /// Failed logins allowed per username inside `login_window_secs`
    pub login_max_failures: usize,
    pub login_window_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3030)),
            cors_permissive: false,
            public_dir: None,
            database_url: None,
            session_ttl_hours: 24,
            max_model_bytes: 20 * 1024 * 1024,
            secure_cookies: false,
            login_max_failures: 5,
            login_window_secs: 60,
        }
    }
}

fn parse<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { var, value })
}

impl ServerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Read a TOML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Override fields from the process environment.
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_env_from(|var| std::env::var(var).ok())
    }

    /// Override fields from `lookup`, which maps a variable name to its value.
    pub fn apply_env_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(v) = lookup("ARSHELF_BIND") {
            self.bind_addr = parse("ARSHELF_BIND", v)?;
        }
        if let Some(v) = lookup("ARSHELF_PUBLIC_DIR") {
            self.public_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("ARSHELF_CORS_PERMISSIVE") {
            self.cors_permissive = parse("ARSHELF_CORS_PERMISSIVE", v)?;
        }
        if let Some(v) = lookup("ARSHELF_SESSION_TTL_HOURS") {
            self.session_ttl_hours = parse("ARSHELF_SESSION_TTL_HOURS", v)?;
        }
        if let Some(v) = lookup("ARSHELF_MAX_MODEL_BYTES") {
            self.max_model_bytes = parse("ARSHELF_MAX_MODEL_BYTES", v)?;
        }
        if let Some(v) = lookup("ARSHELF_SECURE_COOKIES") {
            self.secure_cookies = parse("ARSHELF_SECURE_COOKIES", v)?;
        }
        if let Some(v) = lookup("ARSHELF_LOGIN_MAX_FAILURES") {
            self.login_max_failures = parse("ARSHELF_LOGIN_MAX_FAILURES", v)?;
        }
        if let Some(v) = lookup("ARSHELF_LOGIN_WINDOW_SECS") {
            self.login_window_secs = parse("ARSHELF_LOGIN_WINDOW_SECS", v)?;
        }
        if let Some(v) = lookup("DATABASE_URL") {
            self.database_url = Some(v);
        }
        Ok(self)
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session_ttl_hours.max(1))
    }

    pub fn login_window(&self) -> Duration {
        Duration::from_secs(self.login_window_secs)
    }

    /// Request body cap: a base64 model plus JSON overhead.
    pub fn body_limit(&self) -> usize {
        self.max_model_bytes / 3 * 4 + 64 * 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 3030);
        assert!(!config.cors_permissive);
        assert_eq!(config.login_max_failures, 5);
        assert_eq!(config.login_window(), Duration::from_secs(60));
    }

    #[test]
    fn toml_overrides_only_given_keys() {
        let config = ServerConfig::from_toml_str(
            r#"
            bind_addr = "0.0.0.0:8080"
            public_dir = "client/dist"
            "#,
        )
        .unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.public_dir, Some(PathBuf::from("client/dist")));
        assert_eq!(config.session_ttl_hours, 24);
    }

    #[test]
    fn env_overrides_file() {
        let env: HashMap<&str, &str> = [
            ("ARSHELF_BIND", "127.0.0.1:4000"),
            ("ARSHELF_CORS_PERMISSIVE", "true"),
            ("DATABASE_URL", "postgres://localhost/arshelf"),
        ]
        .into_iter()
        .collect();

        let config = ServerConfig::default()
            .apply_env_from(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.bind_addr.port(), 4000);
        assert!(config.cors_permissive);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/arshelf")
        );
    }

    #[test]
    fn env_sets_login_throttle() {
        let env: HashMap<&str, &str> = [
            ("ARSHELF_LOGIN_MAX_FAILURES", "3"),
            ("ARSHELF_LOGIN_WINDOW_SECS", "300"),
        ]
        .into_iter()
        .collect();

        let config = ServerConfig::default()
            .apply_env_from(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.login_max_failures, 3);
        assert_eq!(config.login_window(), Duration::from_secs(300));

        let err = ServerConfig::default()
            .apply_env_from(|k| (k == "ARSHELF_LOGIN_WINDOW_SECS").then(|| "-1".to_owned()))
            .unwrap_err();
        assert!(err.to_string().contains("ARSHELF_LOGIN_WINDOW_SECS"));
    }

    #[test]
    fn bad_env_value_is_reported() {
        let err = ServerConfig::default()
            .apply_env_from(|k| (k == "ARSHELF_MAX_MODEL_BYTES").then(|| "lots".to_owned()))
            .unwrap_err();
        assert!(err.to_string().contains("ARSHELF_MAX_MODEL_BYTES"));
    }

    #[test]
    fn unreadable_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = ServerConfig::load(&missing).unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }
}
