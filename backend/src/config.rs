//! Configuration management for the Agri Supply Chain platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with AGT_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT verification configuration
    pub jwt: JwtConfig,

    /// QR/trace artifact service configuration
    pub artifact: ArtifactConfig,

    /// Public trace page configuration
    pub trace: TraceConfig,

    /// Lifecycle engine tuning
    pub lifecycle: LifecycleConfig,

    /// Log output format: "pretty" or "json"
    pub log_format: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Upper bound on row lock waits; exceeded waits surface as conflicts
    pub lock_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key used to verify bearer tokens
    pub secret: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ArtifactConfig {
    /// Artifact service endpoint. Empty means trace URLs are built locally.
    pub endpoint: String,

    /// Artifact service API key
    pub api_key: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TraceConfig {
    /// Base URL encoded into QR payloads
    pub public_base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LifecycleConfig {
    /// Maximum ancestors visited when accumulating transport fees
    pub max_lineage_depth: usize,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("AGT_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("log_format", "pretty")?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.lock_timeout_ms", 5000)?
            .set_default("artifact.endpoint", "")?
            .set_default("artifact.api_key", "")?
            .set_default("artifact.timeout_secs", 10)?
            .set_default("trace.public_base_url", "http://localhost:3000")?
            .set_default(
                "lifecycle.max_lineage_depth",
                shared::DEFAULT_MAX_LINEAGE_DEPTH as u64,
            )?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (AGT_ prefix)
            .add_source(
                Environment::with_prefix("AGT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            max_lineage_depth: shared::DEFAULT_MAX_LINEAGE_DEPTH,
        }
    }
}
