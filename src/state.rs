use std::sync::Arc;

use tracing::info;

use crate::compliance::cache::LocalAuthCache;
use crate::compliance::license::StaticLicense;
use crate::compliance::store::{AuthCache, Stores};
use crate::compliance::{RestrictedAdminGate, RootAdminGuard, ServiceAuditRecorder};
use crate::config::AppConfig;
use crate::database::{schema, DatabaseError, DatabaseManager, MemoryStore, PgRepository};

/// Request-independent settings the middleware reads
#[derive(Debug, Clone)]
pub struct ComplianceSettings {
    pub system_service: String,
    pub enable_service_audit: bool,
    pub max_body_bytes: usize,
    pub default_report_limit: i64,
    pub max_report_limit: i64,
}

impl From<&AppConfig> for ComplianceSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            system_service: config.compliance.system_service.clone(),
            enable_service_audit: config.compliance.enable_service_audit,
            max_body_bytes: config.api.max_body_bytes,
            default_report_limit: config.api.default_report_limit,
            max_report_limit: config.api.max_report_limit,
        }
    }
}

/// Shared state of the compliance middleware and handlers
#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    pub gate: Arc<RestrictedAdminGate>,
    pub guard: Arc<RootAdminGuard>,
    pub audit: Arc<ServiceAuditRecorder>,
    pub settings: Arc<ComplianceSettings>,
}

impl AppState {
    pub fn new(stores: Stores, config: &AppConfig) -> Self {
        Self {
            gate: Arc::new(RestrictedAdminGate::new(stores.clone(), config.compliance.admin_apps())),
            guard: Arc::new(RootAdminGuard::new(stores.clone())),
            audit: Arc::new(ServiceAuditRecorder::new(stores.services.clone(), stores.reports.clone())),
            settings: Arc::new(ComplianceSettings::from(config)),
            stores,
        }
    }

    /// Stores from configuration: Postgres when a database URL is set, otherwise in memory
    pub async fn connect_stores(config: &AppConfig) -> Result<Stores, DatabaseError> {
        let cache: Arc<dyn AuthCache> = Arc::new(LocalAuthCache::new());
        let license = Arc::new(StaticLicense(config.compliance.license));

        if config.database.url.is_none() {
            info!("No DATABASE_URL set, using the in-memory store");
            return Ok(Stores::from_backend(Arc::new(MemoryStore::default()), cache, license));
        }

        let pool = DatabaseManager::pool(&config.database).await?;
        if config.database.ensure_schema {
            schema::ensure_schema(&pool).await?;
        }
        Ok(Stores::from_backend(Arc::new(PgRepository::new(pool)), cache, license))
    }

    pub async fn from_config(config: &AppConfig) -> Result<Self, DatabaseError> {
        let stores = Self::connect_stores(config).await?;
        Ok(Self::new(stores, config))
    }
}
