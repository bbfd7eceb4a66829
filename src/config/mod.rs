//! Configuration module for the glazing backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Default business inbox that receives lead notifications.
pub const DEFAULT_BUSINESS_EMAIL: &str = "info@castlecrewglazing.co.uk";
/// Default phone number offered whenever an online path fails.
pub const DEFAULT_FALLBACK_PHONE: &str = "+44 7949 821925";

/// Configuration could not be parsed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file backing the key/value store
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,
    /// Inbox that receives business notifications
    pub business_email: String,
    /// From address used on outgoing mail
    pub mail_from: String,
    /// Phone number shown to users when delivery fails
    pub fallback_phone: String,
    /// Quiescence window before an intake draft is persisted
    pub draft_debounce: Duration,
    /// Open intake sessions unused for this long are dropped
    pub session_idle: Duration,
    /// Resend API key; delivery is disabled without one
    pub resend_api_key: Option<String>,
    pub resend_base_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let db_path = env::var("SITE_DB_PATH")
            .unwrap_or_else(|_| "./data/site.sqlite".to_string())
            .into();

        let bind_addr = parse_var("SITE_BIND_ADDR", "127.0.0.1:8080")?;

        let log_level = env::var("SITE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_format = match env::var("SITE_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("text") | Err(_) => LogFormat::Text,
            Ok(other) => {
                return Err(ConfigError::Invalid {
                    name: "SITE_LOG_FORMAT",
                    value: other.to_string(),
                })
            }
        };

        let business_email = env::var("SITE_BUSINESS_EMAIL")
            .unwrap_or_else(|_| DEFAULT_BUSINESS_EMAIL.to_string());

        let mail_from = env::var("SITE_MAIL_FROM").unwrap_or_else(|_| {
            "Castle Crew Glazing <noreply@castlecrewglazing.co.uk>".to_string()
        });

        let fallback_phone = env::var("SITE_FALLBACK_PHONE")
            .unwrap_or_else(|_| DEFAULT_FALLBACK_PHONE.to_string());

        let debounce_ms: u64 = parse_var("SITE_DRAFT_DEBOUNCE_MS", "1000")?;

        let session_idle_secs: u64 = parse_var("SITE_SESSION_IDLE_SECS", "1800")?;

        let resend_api_key = env::var("RESEND_API_KEY").ok().filter(|k| !k.is_empty());

        let resend_base_url = env::var("SITE_RESEND_BASE_URL")
            .unwrap_or_else(|_| "https://api.resend.com".to_string());

        Ok(Self {
            db_path,
            bind_addr,
            log_level,
            log_format,
            business_email,
            mail_from,
            fallback_phone,
            draft_debounce: Duration::from_millis(debounce_ms),
            session_idle: Duration::from_secs(session_idle_secs),
            resend_api_key,
            resend_base_url,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: &str) -> Result<T, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse()
        .map_err(|_| ConfigError::Invalid { name, value: raw })
}
