//! Application configuration.

use serde::Deserialize;
use std::path::Path;

use crate::{AppError, AppResult};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Anonymity configuration.
    pub anonymity: AnonymityConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Anonymity configuration.
///
/// The server secret keys every pseudonym derivation. Rotating it
/// re-pseudonymizes the whole instance, so it must be set once and
/// kept stable.
#[derive(Debug, Clone, Deserialize)]
pub struct AnonymityConfig {
    /// Secret key for pseudonym derivation.
    #[serde(default)]
    pub server_secret: String,
    /// Interval between ban sweep runs, in seconds.
    #[serde(default = "default_ban_sweep_interval_secs")]
    pub ban_sweep_interval_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_ban_sweep_interval_secs() -> u64 {
    300
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `QUAD_ENV`)
    /// 3. Environment variables with `QUAD_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        // A .env file can supply the QUAD_ variables in development
        dotenvy::dotenv().ok();

        let env = std::env::var("QUAD_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("QUAD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("QUAD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Validate settings that must be correct before the server starts.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] when the pseudonym secret is missing
    /// or the public URL does not parse.
    pub fn validate(&self) -> AppResult<()> {
        if self.anonymity.server_secret.trim().is_empty() {
            return Err(AppError::Config(
                "anonymity.server_secret must be set (QUAD_ANONYMITY__SERVER_SECRET)".to_string(),
            ));
        }

        url::Url::parse(&self.server.url)
            .map_err(|e| AppError::Config(format!("server.url is not a valid URL: {e}")))?;

        Ok(())
    }
}
