use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub filter: FilterConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub storage: StorageConfig,
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub default_limit: u32,
    pub max_limit: u32,
    pub debug_logging: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub enable_audit_logging: bool,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub firebase_bucket: Option<String>,
    pub firebase_access_token: Option<String>,
    pub firebase_base_url: String,
    pub max_upload_bytes: usize,
    pub allowed_content_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub msg91_auth_key: Option<String>,
    pub msg91_integrated_number: Option<String>,
    pub msg91_base_url: String,
    pub default_language: String,
}

impl StorageConfig {
    /// Firebase is used only when both the bucket and a token are present
    pub fn firebase_enabled(&self) -> bool {
        self.firebase_bucket.is_some() && self.firebase_access_token.is_some()
    }
}

impl NotificationConfig {
    pub fn msg91_enabled(&self) -> bool {
        self.msg91_auth_key.is_some() && self.msg91_integrated_number.is_some()
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("CATALOG_HOST") {
            self.server.host = v;
        }
        if let Some(port) = env::var("CATALOG_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }

        // Filter overrides
        if let Ok(v) = env::var("FILTER_DEFAULT_LIMIT") {
            self.filter.default_limit = v.parse().unwrap_or(self.filter.default_limit);
        }
        if let Ok(v) = env::var("FILTER_MAX_LIMIT") {
            self.filter.max_limit = v.parse().unwrap_or(self.filter.max_limit);
        }
        if let Ok(v) = env::var("FILTER_DEBUG_LOGGING") {
            self.filter.debug_logging = v.parse().unwrap_or(self.filter.debug_logging);
        }

        // Database overrides
        if let Ok(v) = env::var("STORE_BACKEND") {
            match v.to_ascii_lowercase().as_str() {
                "memory" => self.database.backend = StoreBackend::Memory,
                "postgres" | "postgresql" => self.database.backend = StoreBackend::Postgres,
                other => tracing::warn!("Ignoring unknown STORE_BACKEND '{}'", other),
            }
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
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // API overrides
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_AUDIT_LOGGING") {
            self.security.enable_audit_logging = v.parse().unwrap_or(self.security.enable_audit_logging);
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }

        // Storage overrides
        if let Ok(v) = env::var("FIREBASE_STORAGE_BUCKET") {
            self.storage.firebase_bucket = Some(v);
        }
        if let Ok(v) = env::var("FIREBASE_ACCESS_TOKEN") {
            self.storage.firebase_access_token = Some(v);
        }
        if let Ok(v) = env::var("FIREBASE_STORAGE_BASE_URL") {
            self.storage.firebase_base_url = v;
        }
        if let Ok(v) = env::var("STORAGE_MAX_UPLOAD_BYTES") {
            self.storage.max_upload_bytes = v.parse().unwrap_or(self.storage.max_upload_bytes);
        }
        if let Ok(v) = env::var("STORAGE_ALLOWED_CONTENT_TYPES") {
            self.storage.allowed_content_types = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Notification overrides
        if let Ok(v) = env::var("MSG91_AUTH_KEY") {
            self.notifications.msg91_auth_key = Some(v);
        }
        if let Ok(v) = env::var("MSG91_INTEGRATED_NUMBER") {
            self.notifications.msg91_integrated_number = Some(v);
        }
        if let Ok(v) = env::var("MSG91_BASE_URL") {
            self.notifications.msg91_base_url = v;
        }
        if let Ok(v) = env::var("MSG91_DEFAULT_LANGUAGE") {
            self.notifications.default_language = v;
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            filter: FilterConfig {
                default_limit: 25,
                max_limit: 1000,
                debug_logging: true,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            api: ApiConfig {
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                enable_audit_logging: false,
                jwt_secret: "development-secret-change-me".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
            },
            storage: StorageConfig::defaults(5 * 1024 * 1024),
            notifications: NotificationConfig::defaults(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            filter: FilterConfig {
                default_limit: 25,
                max_limit: 500,
                debug_logging: false,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                run_migrations: true,
            },
            api: ApiConfig {
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                enable_audit_logging: true,
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
            },
            storage: StorageConfig::defaults(5 * 1024 * 1024),
            notifications: NotificationConfig::defaults(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            filter: FilterConfig {
                default_limit: 20,
                max_limit: 100,
                debug_logging: false,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
            },
            api: ApiConfig {
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                enable_audit_logging: true,
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
            },
            storage: StorageConfig::defaults(2 * 1024 * 1024),
            notifications: NotificationConfig::defaults(),
        }
    }
}

impl StorageConfig {
    fn defaults(max_upload_bytes: usize) -> Self {
        Self {
            firebase_bucket: None,
            firebase_access_token: None,
            firebase_base_url: "https://firebasestorage.googleapis.com".to_string(),
            max_upload_bytes,
            allowed_content_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/webp".to_string(),
            ],
        }
    }
}

impl NotificationConfig {
    fn defaults() -> Self {
        Self {
            msg91_auth_key: None,
            msg91_integrated_number: None,
            msg91_base_url: "https://api.msg91.com".to_string(),
            default_language: "en".to_string(),
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.filter.max_limit, 1000);
        assert_eq!(config.database.backend, StoreBackend::Postgres);
        assert!(!config.security.jwt_secret.is_empty());
        assert!(!config.storage.firebase_enabled());
        assert!(!config.notifications.msg91_enabled());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.filter.max_limit, 100);
        assert!(config.security.enable_audit_logging);
        // Production must be given a secret explicitly
        assert!(config.security.jwt_secret.is_empty());
        assert!(!config.database.run_migrations);
    }

    #[test]
    fn test_integrations_enable_only_when_complete() {
        let mut config = AppConfig::development();
        config.storage.firebase_bucket = Some("bucket".to_string());
        assert!(!config.storage.firebase_enabled());
        config.storage.firebase_access_token = Some("token".to_string());
        assert!(config.storage.firebase_enabled());

        config.notifications.msg91_auth_key = Some("key".to_string());
        assert!(!config.notifications.msg91_enabled());
        config.notifications.msg91_integrated_number = Some("919999999999".to_string());
        assert!(config.notifications.msg91_enabled());
    }
}
