use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub jwt_expiry_hours: u64,
    /// Signing keys by key id. Never serialized.
    #[serde(skip)]
    pub jwt_keys: BTreeMap<String, String>,
    /// Key id used to sign newly issued tokens.
    pub jwt_active_key: String,
}

/// Key id used when a single `JWT_SECRET` is configured.
pub const DEFAULT_KEY_ID: &str = "default";

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        let config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()?;

        config.validate()?;
        Ok(config)
    }

    fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        // Database overrides
        if let Ok(v) = env::var("STORAGE_BACKEND") {
            self.database.backend = match v.to_ascii_lowercase().as_str() {
                "postgres" | "pg" => StorageBackend::Postgres,
                "memory" => StorageBackend::Memory,
                other => {
                    return Err(ConfigError::Invalid {
                        name: "STORAGE_BACKEND",
                        reason: format!("unknown backend '{}'", other),
                    })
                }
            };
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // API overrides
        if let Ok(v) = env::var("API_HOST") {
            self.api.host = v;
        }
        if let Some(port) = env::var("API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.api.port = port;
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_keys.insert(DEFAULT_KEY_ID.to_string(), v);
        }
        if let Ok(v) = env::var("JWT_KEYS") {
            self.security.jwt_keys.extend(parse_key_list(&v)?);
        }
        if let Ok(v) = env::var("JWT_ACTIVE_KEY") {
            self.security.jwt_active_key = v;
        } else if !self.security.jwt_keys.contains_key(&self.security.jwt_active_key) {
            // Fall back to the highest key id, e.g. v2 over v1
            if let Some(kid) = self.security.jwt_keys.keys().next_back() {
                self.security.jwt_active_key = kid.clone();
            }
        }

        Ok(self)
    }

    /// Checks the settings that have no usable default.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_keys.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET or JWT_KEYS"));
        }
        if self.security.jwt_keys.values().any(|secret| secret.is_empty()) {
            return Err(ConfigError::Invalid {
                name: "JWT_KEYS",
                reason: "signing secrets must not be empty".to_string(),
            });
        }
        if !self.security.jwt_keys.contains_key(&self.security.jwt_active_key) {
            return Err(ConfigError::Invalid {
                name: "JWT_ACTIVE_KEY",
                reason: format!("no key with id '{}'", self.security.jwt_active_key),
            });
        }
        if self.database.backend == StorageBackend::Postgres && self.database.url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                backend: StorageBackend::Postgres,
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                enable_cors: true,
                jwt_expiry_hours: 24 * 7, // 1 week
                jwt_keys: BTreeMap::new(),
                jwt_active_key: DEFAULT_KEY_ID.to_string(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                backend: StorageBackend::Postgres,
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                enable_cors: true,
                jwt_expiry_hours: 24,
                jwt_keys: BTreeMap::new(),
                jwt_active_key: DEFAULT_KEY_ID.to_string(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                backend: StorageBackend::Postgres,
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                enable_cors: false,
                jwt_expiry_hours: 4,
                jwt_keys: BTreeMap::new(),
                jwt_active_key: DEFAULT_KEY_ID.to_string(),
            },
        }
    }
}

/// Parses `kid:secret` pairs separated by commas.
fn parse_key_list(raw: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut keys = BTreeMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (kid, secret) = entry.split_once(':').ok_or_else(|| ConfigError::Invalid {
            name: "JWT_KEYS",
            reason: format!("expected kid:secret, got '{}'", entry),
        })?;
        let kid = kid.trim();
        if kid.is_empty() {
            return Err(ConfigError::Invalid {
                name: "JWT_KEYS",
                reason: "key id must not be empty".to_string(),
            });
        }
        keys.insert(kid.to_string(), secret.to_string());
    }
    Ok(keys)
}
