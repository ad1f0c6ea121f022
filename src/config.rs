//! Application configuration loaded from environment variables.
//!
//! A `.env` file is read first when present, so local development needs no
//! exported variables.

use std::env;
use std::str::FromStr;

/// Where collections are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Process memory; lost on restart
    Memory,
    /// JSON files under `storage_dir`
    File,
    /// Firestore documents in `gcp_project_id`
    Firestore,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "file" => Ok(StorageBackend::File),
            "firestore" => Ok(StorageBackend::Firestore),
            other => Err(ConfigError::Invalid {
                var: "STORAGE_BACKEND",
                value: other.to_string(),
            }),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Mobile/web client origin allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,

    pub storage_backend: StorageBackend,
    /// Directory for the file backend
    pub storage_dir: String,
    /// GCP project ID (firestore backend only)
    pub gcp_project_id: Option<String>,

    /// Identity provider base URL
    pub auth_url: String,
    /// Identity provider public API key
    pub auth_api_key: String,

    /// Fixed seed for territory colors (reproducible runs)
    pub color_seed: Option<u64>,
}

impl Config {
    /// Deterministic config for tests.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:8081".to_string(),
            port: 8080,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            storage_backend: StorageBackend::Memory,
            storage_dir: "data".to_string(),
            gcp_project_id: None,
            auth_url: "http://localhost:54321".to_string(),
            auth_api_key: "test_api_key".to_string(),
            color_seed: Some(7),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(raw) => raw.parse()?,
            Err(_) => StorageBackend::File,
        };

        let gcp_project_id = env::var("GCP_PROJECT_ID").ok();
        if storage_backend == StorageBackend::Firestore && gcp_project_id.is_none() {
            return Err(ConfigError::Missing("GCP_PROJECT_ID"));
        }

        let color_seed = match env::var("TERRITORY_COLOR_SEED") {
            Ok(raw) => Some(raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "TERRITORY_COLOR_SEED",
                value: raw.clone(),
            })?),
            Err(_) => None,
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:8081".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            storage_backend,
            storage_dir: env::var("STORAGE_DIR").unwrap_or_else(|_| "data".to_string()),
            gcp_project_id,
            auth_url: env::var("AUTH_URL").map_err(|_| ConfigError::Missing("AUTH_URL"))?,
            auth_api_key: env::var("AUTH_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("AUTH_API_KEY"))?,
            color_seed,
        })
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.frontend_url.starts_with("https://")
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("AUTH_URL", "http://localhost:54321");
        env::set_var("AUTH_API_KEY", " anon-key ");
        env::set_var("STORAGE_BACKEND", "memory");
        env::set_var("TERRITORY_COLOR_SEED", "99");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.auth_api_key, "anon-key");
        assert_eq!(config.storage_backend, StorageBackend::Memory);
        assert_eq!(config.color_seed, Some(99));
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_storage_backend_parsing() {
        assert_eq!(
            "File".parse::<StorageBackend>().unwrap(),
            StorageBackend::File
        );
        assert_eq!(
            " firestore ".parse::<StorageBackend>().unwrap(),
            StorageBackend::Firestore
        );
        assert!("postgres".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_secure_cookies_follow_frontend_scheme() {
        let mut config = Config::test_default();
        assert!(!config.secure_cookies());
        config.frontend_url = "https://territory.example".to_string();
        assert!(config.secure_cookies());
    }
}
