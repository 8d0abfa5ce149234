/// Configuration management for the alumni service
///
/// Loads configuration from environment variables (after `.env`, if present).
use anyhow::{bail, Context, Result};
use db_pool::env_utils::parse_env_with_default;
use db_pool::DbConfig;
use std::str::FromStr;

pub const SERVICE_NAME: &str = "alumni-service";

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub storage: StorageConfig,
    pub websocket: WebSocketConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    pub host: String,
    pub port: u16,
}

/// Which storage backend the repositories run on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    /// In-process store, nothing survives a restart
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Present only for the Postgres backend
    pub database: Option<DbConfig>,
    pub run_migrations: bool,
}

#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    pub heartbeat_interval_secs: u64,
    pub client_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// `*` or a comma separated list of origins
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn allow_any(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: 5,
            client_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env_with_default("SERVER_PORT", 8080),
        };

        let backend = match std::env::var("STORAGE_BACKEND") {
            Ok(raw) => raw
                .parse::<StorageBackend>()
                .map_err(anyhow::Error::msg)
                .context("invalid STORAGE_BACKEND")?,
            Err(_) => StorageBackend::Postgres,
        };

        let database = match backend {
            StorageBackend::Postgres => Some(
                DbConfig::from_env(SERVICE_NAME)
                    .map_err(anyhow::Error::msg)
                    .context("database configuration")?,
            ),
            StorageBackend::Memory => None,
        };

        let storage = StorageConfig {
            backend,
            database,
            run_migrations: parse_env_with_default("RUN_MIGRATIONS", true),
        };

        let defaults = WebSocketConfig::default();
        let websocket = WebSocketConfig {
            heartbeat_interval_secs: parse_env_with_default(
                "WS_HEARTBEAT_INTERVAL_SECS",
                defaults.heartbeat_interval_secs,
            ),
            client_timeout_secs: parse_env_with_default(
                "WS_CLIENT_TIMEOUT_SECS",
                defaults.client_timeout_secs,
            ),
        };
        if websocket.heartbeat_interval_secs == 0
            || websocket.client_timeout_secs <= websocket.heartbeat_interval_secs
        {
            bail!("WS_CLIENT_TIMEOUT_SECS must be greater than a non-zero WS_HEARTBEAT_INTERVAL_SECS");
        }

        let cors = CorsConfig {
            allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string())
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
        };

        Ok(Config {
            app,
            storage,
            websocket,
            cors,
        })
    }

    /// Configuration used by tests and local runs without a database.
    pub fn in_memory() -> Self {
        Config {
            app: AppConfig {
                env: "test".to_string(),
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                database: None,
                run_migrations: false,
            },
            websocket: WebSocketConfig::default(),
            cors: CorsConfig {
                allowed_origins: vec!["*".to_string()],
            },
        }
    }

    pub fn is_production(&self) -> bool {
        self.app.env.eq_ignore_ascii_case("production")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "APP_ENV",
            "SERVER_HOST",
            "SERVER_PORT",
            "STORAGE_BACKEND",
            "DATABASE_URL",
            "RUN_MIGRATIONS",
            "WS_HEARTBEAT_INTERVAL_SECS",
            "WS_CLIENT_TIMEOUT_SECS",
            "CORS_ALLOWED_ORIGINS",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_with_memory_backend() {
        clear_env();
        std::env::set_var("STORAGE_BACKEND", "memory");

        let config = Config::from_env().unwrap();
        assert_eq!(config.app.env, "development");
        assert_eq!(config.app.port, 8080);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert!(config.storage.database.is_none());
        assert_eq!(config.websocket.heartbeat_interval_secs, 5);
        assert_eq!(config.websocket.client_timeout_secs, 30);
        assert!(config.cors.allow_any());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_postgres_backend_requires_database_url() {
        clear_env();
        assert!(Config::from_env().is_err());

        std::env::set_var("DATABASE_URL", "postgres://localhost/alumni");
        let config = Config::from_env().unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert_eq!(
            config.storage.database.unwrap().service_name,
            SERVICE_NAME
        );

        clear_env();
    }

    #[test]
    #[serial]
    fn test_rejects_timeout_shorter_than_heartbeat() {
        clear_env();
        std::env::set_var("STORAGE_BACKEND", "memory");
        std::env::set_var("WS_HEARTBEAT_INTERVAL_SECS", "10");
        std::env::set_var("WS_CLIENT_TIMEOUT_SECS", "5");

        assert!(Config::from_env().is_err());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_cors_origin_list() {
        clear_env();
        std::env::set_var("STORAGE_BACKEND", "memory");
        std::env::set_var(
            "CORS_ALLOWED_ORIGINS",
            "https://alumni.example.com, https://admin.example.com",
        );

        let config = Config::from_env().unwrap();
        assert!(!config.cors.allow_any());
        assert_eq!(config.cors.allowed_origins.len(), 2);

        clear_env();
    }

    #[test]
    fn test_storage_backend_parsing() {
        assert_eq!(
            "Postgres".parse::<StorageBackend>().unwrap(),
            StorageBackend::Postgres
        );
        assert_eq!(
            "memory".parse::<StorageBackend>().unwrap(),
            StorageBackend::Memory
        );
        assert!("redis".parse::<StorageBackend>().is_err());
    }
}
