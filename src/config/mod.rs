//! Configuration module for the check-in backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Event tag printed in front of ticket codes on the badges.
pub const DEFAULT_TICKET_PREFIX: &str = "IFI2026-";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for API authentication (required in production)
    pub api_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Literal tag stripped from scanned codes before lookup
    pub ticket_prefix: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let api_psk = env::var("CHECKIN_API_PSK").ok().filter(|s| !s.is_empty());

        let db_path = env::var("CHECKIN_DB_PATH")
            .unwrap_or_else(|_| "./data/checkin.sqlite".to_string())
            .into();

        let bind_addr = env::var("CHECKIN_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid CHECKIN_BIND_ADDR format");

        let log_level = env::var("CHECKIN_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let ticket_prefix =
            env::var("CHECKIN_TICKET_PREFIX").unwrap_or_else(|_| DEFAULT_TICKET_PREFIX.to_string());

        Self {
            api_psk,
            db_path,
            bind_addr,
            log_level,
            ticket_prefix,
        }
    }
}
