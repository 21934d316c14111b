//! Configuration module for the checklist reports backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::render::Locale;

/// Configuration problem detected at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub variable: &'static str,
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}: {}", self.variable, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Admin key, grants reads and writes. `None` disables authentication.
    pub api_psk: Option<String>,
    /// Read-only key for reports admins
    pub viewer_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Path to the template search index directory
    pub index_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Locale used when a request does not name one
    pub default_locale: Locale,
    /// Trailing-edge window for coalescing change events
    pub invalidation_debounce: Duration,
    /// Navigation sessions idle longer than this are dropped
    pub session_idle_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let api_psk = non_empty_var("REPORTS_API_PSK");
        let viewer_psk = non_empty_var("REPORTS_VIEWER_PSK");

        let db_path = env::var("REPORTS_DB_PATH")
            .unwrap_or_else(|_| "./data/reports.sqlite".to_string())
            .into();

        let index_path = env::var("REPORTS_INDEX_PATH")
            .unwrap_or_else(|_| "./data/template-index".to_string())
            .into();

        let bind_addr = env::var("REPORTS_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| ConfigError {
                variable: "REPORTS_BIND_ADDR",
                message: format!("{}", e),
            })?;

        let log_level = env::var("REPORTS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let default_locale = match env::var("REPORTS_LOCALE") {
            Ok(code) => code.parse().map_err(|e| ConfigError {
                variable: "REPORTS_LOCALE",
                message: e,
            })?,
            Err(_) => Locale::default(),
        };

        let debounce_ms = match env::var("REPORTS_DEBOUNCE_MS") {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|e| ConfigError {
                variable: "REPORTS_DEBOUNCE_MS",
                message: format!("{}", e),
            })?,
            Err(_) => 250,
        };

        let session_idle_secs = match env::var("REPORTS_SESSION_IDLE_SECS") {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|e| ConfigError {
                variable: "REPORTS_SESSION_IDLE_SECS",
                message: format!("{}", e),
            })?,
            Err(_) => 1800,
        };

        Ok(Self {
            api_psk,
            viewer_psk,
            db_path,
            index_path,
            bind_addr,
            log_level,
            default_locale,
            invalidation_debounce: Duration::from_millis(debounce_ms),
            session_idle_timeout: Duration::from_secs(session_idle_secs),
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::sync::Mutex;

    // Environment variables are process-global; serialize the tests touching them.
    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const VARS: [&str; 9] = [
        "REPORTS_API_PSK",
        "REPORTS_VIEWER_PSK",
        "REPORTS_DB_PATH",
        "REPORTS_INDEX_PATH",
        "REPORTS_BIND_ADDR",
        "REPORTS_LOG_LEVEL",
        "REPORTS_LOCALE",
        "REPORTS_DEBOUNCE_MS",
        "REPORTS_SESSION_IDLE_SECS",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_default_config() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        let config = Config::from_env().unwrap();

        assert!(config.api_psk.is_none());
        assert!(config.viewer_psk.is_none());
        assert_eq!(config.db_path, PathBuf::from("./data/reports.sqlite"));
        assert_eq!(config.index_path, PathBuf::from("./data/template-index"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.default_locale, Locale::En);
        assert_eq!(config.invalidation_debounce, Duration::from_millis(250));
        assert_eq!(config.session_idle_timeout, Duration::from_secs(1800));
    }

    #[test]
    fn test_overrides_and_blank_keys() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("REPORTS_API_PSK", "   ");
        env::set_var("REPORTS_VIEWER_PSK", "viewer");
        env::set_var("REPORTS_LOCALE", "de");
        env::set_var("REPORTS_DEBOUNCE_MS", "40");
        env::set_var("REPORTS_SESSION_IDLE_SECS", "90");

        let config = Config::from_env().unwrap();
        clear_env();

        assert!(config.api_psk.is_none());
        assert_eq!(config.viewer_psk.as_deref(), Some("viewer"));
        assert_eq!(config.default_locale, Locale::De);
        assert_eq!(config.invalidation_debounce, Duration::from_millis(40));
        assert_eq!(config.session_idle_timeout, Duration::from_secs(90));
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("REPORTS_BIND_ADDR", "not-an-address");
        let err = Config::from_env().unwrap_err();
        assert_eq!(err.variable, "REPORTS_BIND_ADDR");

        clear_env();
        env::set_var("REPORTS_LOCALE", "fr");
        let err = Config::from_env().unwrap_err();
        assert_eq!(err.variable, "REPORTS_LOCALE");

        clear_env();
        env::set_var("REPORTS_SESSION_IDLE_SECS", "soon");
        let err = Config::from_env().unwrap_err();
        assert_eq!(err.variable, "REPORTS_SESSION_IDLE_SECS");
        clear_env();
    }
}
