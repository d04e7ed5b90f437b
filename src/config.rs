use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    /// Request-scoped budget for acquiring a connection; hitting it surfaces
    /// a retryable error instead of hanging the caller.
    pub database_acquire_timeout_secs: u64,
    pub gateway_base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok(); // Load .env file if present

        Ok(Config {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a number")?,
            database_acquire_timeout_secs: env::var("DATABASE_ACQUIRE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("DATABASE_ACQUIRE_TIMEOUT_SECS must be a number")?,
            gateway_base_url: env::var("GATEWAY_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:4000".to_string()),
        })
    }

    pub async fn connect(&self) -> Result<PgPool> {
        PgPoolOptions::new()
            .max_connections(self.database_max_connections)
            .acquire_timeout(Duration::from_secs(self.database_acquire_timeout_secs))
            .connect(&self.database_url)
            .await
            .context("Failed to connect to database")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_applies_defaults() {
        env::set_var("DATABASE_URL", "postgres://localhost/shareledger_test");
        env::remove_var("DATABASE_MAX_CONNECTIONS");
        env::remove_var("DATABASE_ACQUIRE_TIMEOUT_SECS");
        env::remove_var("GATEWAY_BASE_URL");

        let config = Config::from_env().expect("config loads");
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.database_acquire_timeout_secs, 5);
        assert_eq!(config.gateway_base_url, "http://localhost:4000");
    }
}
