//! # Application Configuration
//!
//! This module manages application configuration loaded from environment variables.
//! All configuration is validated on startup to fail fast if misconfigured.
//!
//! ## Global Config Access
//!
//! Use [`core_config()`] to access the global configuration instance after a
//! single [`init_config()`] call at application startup.

use std::env;
use std::sync::OnceLock;

/// Application configuration loaded from environment variables.
#[derive(Clone, Debug)]
pub struct Config {
    /// SQLite database connection URL
    pub database_url: String,

    /// Secret key for JWT token signing and verification
    ///
    /// **Must be at least 32 characters long** for security.
    pub jwt_secret: String,

    /// JWT token validity period in hours
    ///
    /// After this period, users must re-authenticate.
    /// Valid range: 1-720 hours (1 hour to 30 days)
    pub jwt_expiration_hours: i64,

    /// Base URL of the local generation backend (Ollama)
    pub ollama_url: String,

    /// Model identifier sent with every generation request
    pub ollama_model: String,

    /// Directory where uploaded attachments are written
    pub upload_dir: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:data/huddle.db".to_string());

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| "JWT_SECRET must be set in environment")?;

        let jwt_expiration_hours = env::var("JWT_EXPIRATION_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse()
            .map_err(|e| format!("JWT_EXPIRATION_HOURS must be a valid number: {}", e))?;

        let ollama_url = env::var("OLLAMA_URL")
            .unwrap_or_else(|_| "http://localhost:11434".to_string());

        let ollama_model = env::var("OLLAMA_MODEL")
            .unwrap_or_else(|_| "llama3.2:1b".to_string());

        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration_hours,
            ollama_url,
            ollama_model,
            upload_dir,
        })
    }

    /// Validate configuration values against security and business rules.
    pub fn validate(&self) -> Result<(), String> {
        if self.jwt_secret.len() < 32 {
            return Err("JWT_SECRET must be at least 32 characters long".to_string());
        }

        if self.jwt_expiration_hours < 1 || self.jwt_expiration_hours > 720 {
            return Err("JWT_EXPIRATION_HOURS must be between 1 and 720 (30 days)".to_string());
        }

        if self.ollama_model.trim().is_empty() {
            return Err("OLLAMA_MODEL must not be empty".to_string());
        }

        Ok(())
    }
}

/// Global configuration instance (initialized once at startup).
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Initialize the global configuration.
///
/// This should be called once at application startup, before any handlers
/// or services that need configuration are used.
///
/// # Errors
///
/// Returns an error if:
/// - Environment variables are missing or invalid
/// - Configuration validation fails
/// - Config has already been initialized
pub fn init_config() -> Result<(), String> {
    let config = Config::from_env()?;
    config.validate()?;

    CONFIG.set(config)
        .map_err(|_| "Config has already been initialized".to_string())
}

/// Get a reference to the global configuration.
///
/// # Panics
///
/// Panics if [`init_config()`] has not been called yet. This ensures
/// configuration is always available when accessed.
pub fn core_config() -> &'static Config {
    CONFIG.get().expect("Config must be initialized with init_config() before use")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-secret-key-must-be-at-least-32-characters!".to_string(),
            jwt_expiration_hours: 24,
            ollama_url: "http://localhost:11434".to_string(),
            ollama_model: "llama3.2:1b".to_string(),
            upload_dir: "uploads".to_string(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let mut config = base_config();
        config.jwt_secret = "too-short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_expiration_out_of_range_rejected() {
        let mut config = base_config();
        config.jwt_expiration_hours = 0;
        assert!(config.validate().is_err());

        config.jwt_expiration_hours = 721;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_model_rejected() {
        let mut config = base_config();
        config.ollama_model = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
