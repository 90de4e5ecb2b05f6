//! Shared configuration loader for Auto Gateway services
//!
//! Environment-variable based configuration with an `AUTO_GATEWAY_` prefix,
//! bare-name fallbacks (`DATABASE_URL`, `PORT`, `RUST_LOG`), `.env` support
//! via dotenvy, and validation with clear error messages.
//!
//! Override hierarchy: defaults < .env < environment.

use crate::error::AutoGatewayError;
use std::time::Duration;
use url::Url;

/// Configuration loader trait
///
/// Standardized loading and validation of configuration from environment
/// variables.
pub trait ConfigLoader: Sized {
    /// Load configuration from environment variables, with defaults for
    /// missing optional values.
    fn from_env() -> Result<Self, AutoGatewayError>;

    /// Validate configuration values (URL formats, port ranges, timeouts).
    fn validate(&self) -> Result<(), AutoGatewayError>;
}

/// PostgreSQL connection configuration
///
/// # Environment Variables
///
/// - `AUTO_GATEWAY_DATABASE_URL` (required, falls back to `DATABASE_URL`)
/// - `AUTO_GATEWAY_DATABASE_MAX_CONNECTIONS` (default: 20)
/// - `AUTO_GATEWAY_DATABASE_MIN_CONNECTIONS` (default: 2)
/// - `AUTO_GATEWAY_DATABASE_CONNECT_TIMEOUT` seconds (default: 30)
/// - `AUTO_GATEWAY_DATABASE_IDLE_TIMEOUT` seconds (default: 600)
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/auto_gateway".to_string(),
            max_connections: 20,
            min_connections: 2,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

impl ConfigLoader for DatabaseConfig {
    fn from_env() -> Result<Self, AutoGatewayError> {
        let url = std::env::var("AUTO_GATEWAY_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .map_err(|_| AutoGatewayError::ConfigurationError {
                message: "DATABASE_URL or AUTO_GATEWAY_DATABASE_URL must be set".to_string(),
                key: Some("AUTO_GATEWAY_DATABASE_URL".to_string()),
            })?;

        let defaults = DatabaseConfig::default();
        Ok(Self {
            url,
            max_connections: parse_env_var(
                "AUTO_GATEWAY_DATABASE_MAX_CONNECTIONS",
                defaults.max_connections,
            )?,
            min_connections: parse_env_var(
                "AUTO_GATEWAY_DATABASE_MIN_CONNECTIONS",
                defaults.min_connections,
            )?,
            connect_timeout: Duration::from_secs(parse_env_var(
                "AUTO_GATEWAY_DATABASE_CONNECT_TIMEOUT",
                30u64,
            )?),
            idle_timeout: Duration::from_secs(parse_env_var(
                "AUTO_GATEWAY_DATABASE_IDLE_TIMEOUT",
                600u64,
            )?),
        })
    }

    fn validate(&self) -> Result<(), AutoGatewayError> {
        Url::parse(&self.url).map_err(|e| AutoGatewayError::ConfigurationError {
            message: format!("Invalid DATABASE_URL: {}", e),
            key: Some("AUTO_GATEWAY_DATABASE_URL".to_string()),
        })?;

        if self.max_connections == 0 {
            return Err(AutoGatewayError::ConfigurationError {
                message: "max_connections must be greater than 0".to_string(),
                key: Some("AUTO_GATEWAY_DATABASE_MAX_CONNECTIONS".to_string()),
            });
        }

        if self.min_connections > self.max_connections {
            return Err(AutoGatewayError::ConfigurationError {
                message: format!(
                    "min_connections ({}) cannot exceed max_connections ({})",
                    self.min_connections, self.max_connections
                ),
                key: Some("AUTO_GATEWAY_DATABASE_MIN_CONNECTIONS".to_string()),
            });
        }

        if self.connect_timeout.as_secs() == 0 || self.idle_timeout.as_secs() == 0 {
            return Err(AutoGatewayError::ConfigurationError {
                message: "database timeouts must be greater than 0 seconds".to_string(),
                key: Some("AUTO_GATEWAY_DATABASE_CONNECT_TIMEOUT".to_string()),
            });
        }

        Ok(())
    }
}

/// HTTP service configuration
///
/// # Environment Variables
///
/// - `AUTO_GATEWAY_SERVICE_HOST` (default: "0.0.0.0")
/// - `AUTO_GATEWAY_SERVICE_PORT` (default: 8082, falls back to `PORT`)
/// - `AUTO_GATEWAY_SERVICE_WORKERS` (default: CPU count)
/// - `AUTO_GATEWAY_SERVICE_LOG_LEVEL` (default: "info", falls back to `RUST_LOG`)
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8082,
            workers: num_cpus::get(),
            log_level: "info".to_string(),
        }
    }
}

impl ConfigLoader for ServiceConfig {
    fn from_env() -> Result<Self, AutoGatewayError> {
        let defaults = ServiceConfig::default();

        let host = std::env::var("AUTO_GATEWAY_SERVICE_HOST")
            .or_else(|_| std::env::var("HOST"))
            .unwrap_or(defaults.host);

        let port = parse_env_var("AUTO_GATEWAY_SERVICE_PORT", defaults.port)
            .or_else(|_| parse_env_var("PORT", ServiceConfig::default().port))?;

        let workers = parse_env_var("AUTO_GATEWAY_SERVICE_WORKERS", defaults.workers)?;

        let log_level = std::env::var("AUTO_GATEWAY_SERVICE_LOG_LEVEL")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(defaults.log_level);

        Ok(Self {
            host,
            port,
            workers,
            log_level,
        })
    }

    fn validate(&self) -> Result<(), AutoGatewayError> {
        if self.port == 0 {
            return Err(AutoGatewayError::ConfigurationError {
                message: "port must be greater than 0".to_string(),
                key: Some("AUTO_GATEWAY_SERVICE_PORT".to_string()),
            });
        }

        if self.workers == 0 {
            return Err(AutoGatewayError::ConfigurationError {
                message: "workers must be greater than 0".to_string(),
                key: Some("AUTO_GATEWAY_SERVICE_WORKERS".to_string()),
            });
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(AutoGatewayError::ConfigurationError {
                message: format!(
                    "Invalid log_level '{}'. Must be one of: {}",
                    self.log_level,
                    valid_log_levels.join(", ")
                ),
                key: Some("AUTO_GATEWAY_SERVICE_LOG_LEVEL".to_string()),
            });
        }

        Ok(())
    }
}

/// Parse an environment variable with a default value
fn parse_env_var<T>(key: &str, default: T) -> Result<T, AutoGatewayError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(key)
        .ok()
        .map(|v| {
            v.parse::<T>()
                .map_err(|e| AutoGatewayError::ConfigurationError {
                    message: format!("Failed to parse {}: {}", key, e),
                    key: Some(key.to_string()),
                })
        })
        .unwrap_or(Ok(default))
}

/// Load a `.env` file if present
///
/// Does not fail when the file is missing.
pub fn load_dotenv() {
    if let Err(e) = dotenvy::dotenv() {
        if !e.to_string().contains("not found") {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }
}
