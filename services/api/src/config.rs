//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
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

/// Which realtime transport variant the composition root constructs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Locally fabricated events; never touches the network.
    Simulated,
    /// Polls an upstream HTTP endpoint for events.
    Http,
}

impl TransportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Simulated => "simulated",
            TransportMode::Http => "http",
        }
    }
}

impl FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simulated" => Ok(TransportMode::Simulated),
            "http" => Ok(TransportMode::Http),
            other => Err(format!("'{other}' is not a valid realtime mode")),
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub storage_dir: PathBuf,
    pub cors_origin: String,
    pub openai_api_key: Option<String>,
    pub interviewer_model: String,
    pub sst_model: String,
    pub transport_mode: TransportMode,
    pub realtime_upstream: Option<String>,
    pub realtime_token: Option<String>,
    pub poll_interval_ms: u64,
    pub reply_cache_ttl_secs: u64,
    pub stream_replies: bool,
    pub preload_replies: bool,
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

        // --- Load Server Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let storage_dir = std::env::var("STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./storage"));

        let cors_origin =
            std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:5173".to_string());

        // --- Load API Keys (as optional) ---
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();

        // --- Load Adapter-specific Settings ---
        let interviewer_model =
            std::env::var("INTERVIEWER_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let sst_model = std::env::var("SST_MODEL").unwrap_or_else(|_| "whisper-1".to_string());

        // --- Load Realtime Transport Settings ---
        let transport_mode_str =
            std::env::var("REALTIME_MODE").unwrap_or_else(|_| "simulated".to_string());
        let transport_mode = transport_mode_str
            .parse::<TransportMode>()
            .map_err(|e| ConfigError::InvalidValue("REALTIME_MODE".to_string(), e))?;

        let realtime_upstream = std::env::var("REALTIME_UPSTREAM").ok();
        if transport_mode == TransportMode::Http && realtime_upstream.is_none() {
            return Err(ConfigError::MissingVar("REALTIME_UPSTREAM".to_string()));
        }
        let realtime_token = std::env::var("REALTIME_TOKEN").ok();

        let poll_interval_ms = parse_u64_var("POLL_INTERVAL_MS", 1000)?;
        let reply_cache_ttl_secs = parse_u64_var("REPLY_CACHE_TTL_SECS", 300)?;
        let stream_replies = parse_bool_var("STREAM_REPLIES", false)?;
        let preload_replies = parse_bool_var("PRELOAD_REPLIES", false)?;

        Ok(Self {
            bind_address,
            log_level,
            storage_dir,
            cors_origin,
            openai_api_key,
            interviewer_model,
            sst_model,
            transport_mode,
            realtime_upstream,
            realtime_token,
            poll_interval_ms,
            reply_cache_ttl_secs,
            stream_replies,
            preload_replies,
        })
    }
}

fn parse_u64_var(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
    }
}

fn parse_bool_var(name: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .parse::<bool>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
    }
}
