//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

const DEFAULT_INSTITUTION: &str = "SIDDHARTH INSTITUTE OF ENGINEERING & TECHNOLOGY:: PUTTUR";
const DEFAULT_EXAM_TITLE: &str = "Regular & Supplementary Examinations";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub db_max_connections: u32,
    pub log_level: Level,
    pub storage_dir: PathBuf,
    pub fonts_dir: PathBuf,
    pub font_family: String,
    pub institution_name: String,
    pub exam_title: String,
    /// `None` allows any origin.
    pub cors_origin: Option<String>,
    pub max_upload_bytes: usize,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Server and Database Settings ---
        let bind_address = parse_var("BIND_ADDRESS", "0.0.0.0:5000")?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;
        let db_max_connections = parse_var("DB_MAX_CONNECTIONS", "5")?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Storage and Paper Rendering ---
        let storage_dir = path_var("STORAGE_DIR", "./uploads");
        let fonts_dir = path_var("FONTS_DIR", "./fonts");
        let font_family =
            std::env::var("FONT_FAMILY").unwrap_or_else(|_| "LiberationSans".to_string());
        let institution_name = std::env::var("INSTITUTION_NAME")
            .unwrap_or_else(|_| DEFAULT_INSTITUTION.to_string());
        let exam_title =
            std::env::var("EXAM_TITLE").unwrap_or_else(|_| DEFAULT_EXAM_TITLE.to_string());

        // --- HTTP Settings ---
        let cors_origin = std::env::var("CORS_ORIGIN")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let max_upload_bytes = parse_var("MAX_UPLOAD_BYTES", "20971520")?;

        Ok(Self {
            bind_address,
            database_url,
            db_max_connections,
            log_level,
            storage_dir,
            fonts_dir,
            font_family,
            institution_name,
            exam_title,
            cors_origin,
            max_upload_bytes,
        })
    }
}

fn parse_var<T>(name: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}

fn path_var(name: &str, default: &str) -> PathBuf {
    std::env::var(name)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}
