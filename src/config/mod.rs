//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Configuration is loaded with the
//! `BILLING_SYNC` prefix and nested values use double underscores as
//! separators.
//!
//! # Example
//!
//! ```no_run
//! use billing_sync::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate_or_warn().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr().unwrap());
//! ```

mod cache;
mod database;
mod error;
mod payment;
mod server;

pub use cache::CacheConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Payment provider configuration (Stripe + App Store)
    #[serde(default)]
    pub payment: PaymentConfig,

    /// Local snapshot cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `BILLING_SYNC` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `BILLING_SYNC__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `BILLING_SYNC__DATABASE__URL=...` -> `database.url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types
    /// or the database URL is absent.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("BILLING_SYNC")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate configuration, halting only on errors the process cannot
    /// run without.
    ///
    /// The database and server sections must be valid since every code path
    /// needs them. Payment options are validated best-effort: a missing
    /// Stripe key or webhook secret is logged as a warning and the process
    /// continues (webhook verification then rejects every delivery until
    /// the secret is configured).
    pub fn validate_or_warn(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.cache.validate()?;
        if let Err(e) = self.payment.validate() {
            tracing::warn!(error = %e, "Payment configuration incomplete; provider calls will fail");
        }
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
