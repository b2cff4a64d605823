// Collaborator interfaces the compliance layer consumes.
//
// The RBAC tables, service registry and app registry belong to the host platform. Postgres
// implementations live in `database::repository`, an in-memory one in `database::memory`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::compliance::acl::AclEntry;
use crate::compliance::error::ComplianceError;
use crate::compliance::license::Entitlement;
use crate::compliance::reconciler::AclChangeSet;
use crate::database::models::{AdminRecord, AppLink, NewRole, NewServiceReport, Role, ServiceReport};

/// Service registry: name <-> id
#[async_trait]
pub trait ServiceLookup: Send + Sync {
    /// Fails with `NotFound` when no service has this name
    async fn id_by_name(&self, name: &str) -> Result<i64, ComplianceError>;

    async fn name_by_id(&self, id: i64) -> Result<String, ComplianceError>;
}

#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, ComplianceError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Role>, ComplianceError>;

    /// Insert a role together with its entries in one unit.
    /// Returns `None` without writing anything when a role with the same name already exists.
    async fn create_with_access(
        &self,
        role: NewRole,
        entries: Vec<AclEntry>,
    ) -> Result<Option<Role>, ComplianceError>;

    /// Delete the role, its entries and its app links
    async fn delete(&self, id: i64) -> Result<(), ComplianceError>;
}

#[async_trait]
pub trait AclEntryStore: Send + Sync {
    async fn entries_for_role(&self, role_id: i64) -> Result<Vec<AclEntry>, ComplianceError>;

    /// Persist a reconciliation: insert `added`, remove `detached`
    async fn apply(&self, role_id: i64, changes: &AclChangeSet) -> Result<(), ComplianceError>;
}

#[async_trait]
pub trait AppLinkStore: Send + Sync {
    async fn links_for_role(&self, role_id: i64) -> Result<Vec<AppLink>, ComplianceError>;

    async fn find(
        &self,
        user_id: i64,
        app_id: i64,
        role_id: i64,
    ) -> Result<Option<AppLink>, ComplianceError>;

    async fn create(&self, user_id: i64, app_id: i64, role_id: i64) -> Result<AppLink, ComplianceError>;

    async fn delete(&self, id: i64) -> Result<(), ComplianceError>;
}

/// App registry
#[async_trait]
pub trait AppLookup: Send + Sync {
    /// Fails with `NotFound` when the app is not installed
    async fn app_id_by_name(&self, name: &str) -> Result<i64, ComplianceError>;
}

#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<AdminRecord>, ComplianceError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<AdminRecord>, ComplianceError>;

    /// Every sys admin, ordered by id
    async fn list_admins(&self) -> Result<Vec<AdminRecord>, ComplianceError>;

    async fn current_root(&self) -> Result<Option<AdminRecord>, ComplianceError>;

    /// Make `id` the only root admin. Only sys admins can be root.
    async fn set_root(&self, id: i64) -> Result<AdminRecord, ComplianceError>;

    async fn admin_exists_by_id(&self, id: i64) -> Result<bool, ComplianceError> {
        Ok(self.find_by_id(id).await?.map(|a| a.is_sys_admin).unwrap_or(false))
    }

    async fn is_root_by_id(&self, id: i64) -> Result<bool, ComplianceError> {
        Ok(self.find_by_id(id).await?.map(|a| a.is_root_admin).unwrap_or(false))
    }
}

#[async_trait]
pub trait ServiceReportStore: Send + Sync {
    async fn append(&self, report: NewServiceReport) -> Result<ServiceReport, ComplianceError>;

    /// Newest first
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<ServiceReport>, ComplianceError>;

    async fn delete_all(&self) -> Result<u64, ComplianceError>;
}

/// Cached authorization state of the host RBAC engine
#[async_trait]
pub trait AuthCache: Send + Sync {
    async fn forget(&self, key: &str);

    async fn flush(&self);
}

/// Everything the compliance layer talks to, behind trait objects
#[derive(Clone)]
pub struct Stores {
    pub roles: Arc<dyn RoleStore>,
    pub acl: Arc<dyn AclEntryStore>,
    pub links: Arc<dyn AppLinkStore>,
    pub apps: Arc<dyn AppLookup>,
    pub services: Arc<dyn ServiceLookup>,
    pub admins: Arc<dyn AdminStore>,
    pub reports: Arc<dyn ServiceReportStore>,
    pub cache: Arc<dyn AuthCache>,
    pub license: Arc<dyn Entitlement>,
}

impl Stores {
    /// Wire every store to one backend that implements them all
    pub fn from_backend<B>(backend: Arc<B>, cache: Arc<dyn AuthCache>, license: Arc<dyn Entitlement>) -> Self
    where
        B: RoleStore
            + AclEntryStore
            + AppLinkStore
            + AppLookup
            + ServiceLookup
            + AdminStore
            + ServiceReportStore
            + 'static,
    {
        Self {
            roles: backend.clone(),
            acl: backend.clone(),
            links: backend.clone(),
            apps: backend.clone(),
            services: backend.clone(),
            admins: backend.clone(),
            reports: backend,
            cache,
            license,
        }
    }
}
