//! Application configuration

use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub bind_address: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // Authentication
    pub jwt_secret: String,
    pub access_token_ttl_minutes: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Server
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),

            // Database
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .unwrap_or(20),

            // Authentication
            jwt_secret: {
                let secret =
                    env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
                // Ensure the signing key is cryptographically strong
                if secret.len() < 32 {
                    return Err(ConfigError::WeakSecret(
                        "JWT_SECRET must be at least 32 characters",
                    ));
                }
                secret
            },
            access_token_ttl_minutes: {
                let ttl: i64 = env::var("ACCESS_TOKEN_TTL_MINUTES")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .unwrap_or(60);
                if ttl < 1 {
                    return Err(ConfigError::Invalid(
                        "ACCESS_TOKEN_TTL_MINUTES must be at least 1",
                    ));
                }
                ttl
            },
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Weak secret: {0}")]
    WeakSecret(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure config tests run serially (they modify shared env vars)
    static CONFIG_TEST_MUTEX: Mutex<()> = Mutex::new(());

    fn setup_minimal_config() {
        env::set_var("DATABASE_URL", "postgres://test");
        env::set_var(
            "JWT_SECRET",
            "test-jwt-secret-must-be-at-least-32-characters-long",
        );
    }

    fn cleanup_config() {
        env::remove_var("DATABASE_URL");
        env::remove_var("JWT_SECRET");
        env::remove_var("ACCESS_TOKEN_TTL_MINUTES");
    }

    #[test]
    fn test_config_validation() {
        let _lock = CONFIG_TEST_MUTEX.lock().unwrap();

        // === Missing JWT secret ===
        setup_minimal_config();
        env::remove_var("JWT_SECRET");
        let result = Config::from_env();
        assert!(matches!(result, Err(ConfigError::Missing("JWT_SECRET"))));

        // === Weak JWT secret rejected ===
        setup_minimal_config();
        env::set_var("JWT_SECRET", "too-short");
        let result = Config::from_env();
        assert!(matches!(result, Err(ConfigError::WeakSecret(_))));

        // === Non-positive access TTL rejected ===
        setup_minimal_config();
        env::set_var("ACCESS_TOKEN_TTL_MINUTES", "0");
        let result = Config::from_env();
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        // === Valid config accepted ===
        setup_minimal_config();
        env::set_var("ACCESS_TOKEN_TTL_MINUTES", "15");
        let config = Config::from_env().unwrap();
        assert_eq!(config.access_token_ttl_minutes, 15);
        assert_eq!(config.database_max_connections, 20);

        cleanup_config();
    }
}
