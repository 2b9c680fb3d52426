//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::str::FromStr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Selects the storage adapter. `memory://` keeps everything in process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatabaseBackend {
    Postgres(String),
    Memory,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database: DatabaseBackend,
    pub max_connections: u32,
    pub log_level: Level,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub meeting_base_url: String,
    pub default_max_participants: i32,
    pub cors_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;
        let database = if database_url == "memory://" {
            DatabaseBackend::Memory
        } else {
            DatabaseBackend::Postgres(database_url)
        };
        let max_connections = parse_var("DATABASE_MAX_CONNECTIONS", 5u32)?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Token Settings ---
        let jwt_secret = std::env::var("JWT_SECRET")
            .map_err(|_| ConfigError::MissingVar("JWT_SECRET".to_string()))?;
        if jwt_secret.is_empty() {
            return Err(ConfigError::InvalidValue(
                "JWT_SECRET".to_string(),
                "must not be empty".to_string(),
            ));
        }
        let token_ttl_hours = parse_var("TOKEN_TTL_HOURS", 24i64)?;

        // --- Load Conferencing Settings ---
        let meeting_base_url = std::env::var("MEETING_BASE_URL")
            .unwrap_or_else(|_| "https://meet.example.com/room".to_string())
            .trim_end_matches('/')
            .to_string();
        let default_max_participants = parse_var("DEFAULT_MAX_PARTICIPANTS", 100i32)?;

        let cors_origin =
            std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());

        Ok(Self {
            bind_address,
            database,
            max_connections,
            log_level,
            jwt_secret,
            token_ttl_hours,
            meeting_base_url,
            default_max_participants,
            cors_origin,
        })
    }

    /// A configuration for tests and tooling: in-memory storage and a fixed secret.
    pub fn for_tests() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 0)),
            database: DatabaseBackend::Memory,
            max_connections: 1,
            log_level: Level::DEBUG,
            jwt_secret: "test-secret".to_string(),
            token_ttl_hours: 24,
            meeting_base_url: "https://meet.example.com/room".to_string(),
            default_max_participants: 100,
            cors_origin: "http://localhost:3000".to_string(),
        }
    }
}

/// Reads an optional variable, falling back to `default` when unset.
fn parse_var<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}
