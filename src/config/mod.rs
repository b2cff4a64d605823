use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

use crate::compliance::app_links::AdminApps;
use crate::compliance::license::LicenseTier;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub compliance: ComplianceConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Platform database URL; the in-memory backend is used when unset
    pub url: Option<String>,
    /// Database name swapped into `url`, when it differs from the URL's own
    pub database_name: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    /// Run `ensure_schema` on startup
    pub ensure_schema: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub bind_address: String,
    pub enable_request_logging: bool,
    /// Largest request or response body the compliance hooks will buffer
    pub max_body_bytes: usize,
    pub default_report_limit: i64,
    pub max_report_limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceConfig {
    pub license: LicenseTier,
    /// Service name the admin, role and service endpoints live under
    pub system_service: String,
    pub enable_service_audit: bool,
    pub admin_app: String,
    pub api_docs_app: String,
    pub file_manager_app: String,
}

impl ComplianceConfig {
    pub fn admin_apps(&self) -> AdminApps {
        AdminApps {
            admin: self.admin_app.clone(),
            api_docs: self.api_docs_app.clone(),
            file_manager: self.file_manager_app.clone(),
        }
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
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v).filter(|v| !v.is_empty());
        }
        if let Ok(v) = env::var("DATABASE_NAME") {
            self.database.database_name = Some(v).filter(|v| !v.is_empty());
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_ENSURE_SCHEMA") {
            self.database.ensure_schema = v.parse().unwrap_or(self.database.ensure_schema);
        }

        // API overrides
        if let Ok(v) = env::var("API_BIND_ADDRESS") {
            self.api.bind_address = v;
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("COMPLIANCE_MAX_BODY_BYTES") {
            self.api.max_body_bytes = v.parse().unwrap_or(self.api.max_body_bytes);
        }

        // Compliance overrides
        if let Ok(v) = env::var("LICENSE_LEVEL") {
            self.compliance.license = v.parse().unwrap_or(self.compliance.license);
        }
        if let Ok(v) = env::var("COMPLIANCE_SYSTEM_SERVICE") {
            self.compliance.system_service = v;
        }
        if let Ok(v) = env::var("COMPLIANCE_ENABLE_SERVICE_AUDIT") {
            self.compliance.enable_service_audit = v.parse().unwrap_or(self.compliance.enable_service_audit);
        }
        if let Ok(v) = env::var("COMPLIANCE_ADMIN_APP") {
            self.compliance.admin_app = v;
        }
        if let Ok(v) = env::var("COMPLIANCE_API_DOCS_APP") {
            self.compliance.api_docs_app = v;
        }
        if let Ok(v) = env::var("COMPLIANCE_FILE_MANAGER_APP") {
            self.compliance.file_manager_app = v;
        }

        self
    }

    fn compliance_defaults(license: LicenseTier) -> ComplianceConfig {
        ComplianceConfig {
            license,
            system_service: "system".to_string(),
            enable_service_audit: true,
            admin_app: "admin".to_string(),
            api_docs_app: "api_docs".to_string(),
            file_manager_app: "file_manager".to_string(),
        }
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                database_name: None,
                max_connections: 10,
                connection_timeout: 30,
                ensure_schema: true,
            },
            api: ApiConfig {
                bind_address: "127.0.0.1:8080".to_string(),
                enable_request_logging: true,
                max_body_bytes: 10 * 1024 * 1024, // 10MB
                default_report_limit: 100,
                max_report_limit: 1000,
            },
            compliance: Self::compliance_defaults(LicenseTier::Gold),
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: None,
                database_name: None,
                max_connections: 20,
                connection_timeout: 10,
                ensure_schema: true,
            },
            api: ApiConfig {
                bind_address: "0.0.0.0:8080".to_string(),
                enable_request_logging: true,
                max_body_bytes: 5 * 1024 * 1024, // 5MB
                default_report_limit: 100,
                max_report_limit: 500,
            },
            compliance: Self::compliance_defaults(LicenseTier::OpenSource),
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: None,
                database_name: None,
                max_connections: 50,
                connection_timeout: 5,
                ensure_schema: false,
            },
            api: ApiConfig {
                bind_address: "0.0.0.0:8080".to_string(),
                enable_request_logging: false,
                max_body_bytes: 2 * 1024 * 1024, // 2MB
                default_report_limit: 50,
                max_report_limit: 200,
            },
            compliance: Self::compliance_defaults(LicenseTier::OpenSource),
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults_to_gold_and_memory_backend() {
        let config = AppConfig::development();
        assert_eq!(config.compliance.license, LicenseTier::Gold);
        assert!(config.database.url.is_none());
        assert!(config.compliance.enable_service_audit);
    }

    #[test]
    fn production_is_conservative() {
        let config = AppConfig::production();
        assert_eq!(config.compliance.license, LicenseTier::OpenSource);
        assert!(!config.database.ensure_schema);
        assert_eq!(config.api.max_body_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn admin_apps_come_from_compliance_settings() {
        let mut config = AppConfig::development();
        config.compliance.file_manager_app = "files_ui".to_string();
        let apps = config.compliance.admin_apps();
        assert_eq!(apps.admin, "admin");
        assert_eq!(apps.file_manager, "files_ui");
    }
}
