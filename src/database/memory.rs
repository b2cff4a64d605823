// In-memory backend implementing every compliance store.
//
// Used by tests and by `df-compliance` when no DATABASE_URL is set. One lock guards the
// whole state so multi-table operations stay atomic.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::compliance::acl::AclEntry;
use crate::compliance::error::ComplianceError;
use crate::compliance::gate::{ADMIN_NOT_FOUND, ONLY_ADMINS_CAN_BE_ROOT};
use crate::compliance::reconciler::AclChangeSet;
use crate::compliance::store::{
    AclEntryStore, AdminStore, AppLinkStore, AppLookup, RoleStore, ServiceLookup, ServiceReportStore,
};
use crate::database::models::{AdminRecord, AppLink, NewRole, NewServiceReport, Role, ServiceReport};

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    services: BTreeMap<i64, String>,
    apps: BTreeMap<i64, String>,
    admins: BTreeMap<i64, AdminRecord>,
    roles: BTreeMap<i64, Role>,
    entries: BTreeMap<i64, AclEntry>,
    links: BTreeMap<i64, AppLink>,
    reports: BTreeMap<i64, ServiceReport>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

#[derive(Debug, Default)]
pub struct MemoryStoreBuilder {
    state: State,
}

impl MemoryStoreBuilder {
    pub fn service(mut self, name: &str) -> Self {
        let id = self.state.next_id();
        self.state.services.insert(id, name.to_string());
        self
    }

    pub fn app(mut self, name: &str) -> Self {
        let id = self.state.next_id();
        self.state.apps.insert(id, name.to_string());
        self
    }

    /// Add an admin; its id is assigned here
    pub fn admin(mut self, mut admin: AdminRecord) -> Self {
        admin.id = self.state.next_id();
        self.state.admins.insert(admin.id, admin);
        self
    }

    pub fn build(self) -> MemoryStore {
        MemoryStore { state: RwLock::new(self.state) }
    }
}

impl MemoryStore {
    pub fn builder() -> MemoryStoreBuilder {
        MemoryStoreBuilder::default()
    }

    pub async fn service_id(&self, name: &str) -> Option<i64> {
        let state = self.state.read().await;
        state.services.iter().find(|(_, n)| n.as_str() == name).map(|(id, _)| *id)
    }

    pub async fn app_id(&self, name: &str) -> Option<i64> {
        let state = self.state.read().await;
        state.apps.iter().find(|(_, n)| n.as_str() == name).map(|(id, _)| *id)
    }

    pub async fn admin_id(&self, email: &str) -> Option<i64> {
        let state = self.state.read().await;
        state.admins.values().find(|a| a.email == email).map(|a| a.id)
    }

    pub async fn role_count(&self) -> usize {
        self.state.read().await.roles.len()
    }

    pub async fn entries_of(&self, role_id: i64) -> Vec<AclEntry> {
        let state = self.state.read().await;
        state.entries.values().filter(|e| e.role_id == Some(role_id)).cloned().collect()
    }

    pub async fn links_of(&self, role_id: i64) -> Vec<AppLink> {
        let state = self.state.read().await;
        state.links.values().filter(|l| l.role_id == role_id).cloned().collect()
    }

    /// Link a user to a named app through a role, as the host would after an admin save
    pub async fn link(&self, user_id: i64, app: &str, role_id: i64) -> Option<AppLink> {
        let app_id = self.app_id(app).await?;
        let mut state = self.state.write().await;
        let id = state.next_id();
        let link = AppLink { id, user_id, app_id, role_id };
        state.links.insert(id, link.clone());
        Some(link)
    }

    pub async fn list_reports(&self) -> Vec<ServiceReport> {
        self.state.read().await.reports.values().cloned().collect()
    }
}

#[async_trait]
impl ServiceLookup for MemoryStore {
    async fn id_by_name(&self, name: &str) -> Result<i64, ComplianceError> {
        self.service_id(name)
            .await
            .ok_or_else(|| ComplianceError::not_found(format!("Service '{}' not found", name)))
    }

    async fn name_by_id(&self, id: i64) -> Result<String, ComplianceError> {
        let state = self.state.read().await;
        state
            .services
            .get(&id)
            .cloned()
            .ok_or_else(|| ComplianceError::not_found(format!("Service {} not found", id)))
    }
}

#[async_trait]
impl AppLookup for MemoryStore {
    async fn app_id_by_name(&self, name: &str) -> Result<i64, ComplianceError> {
        self.app_id(name)
            .await
            .ok_or_else(|| ComplianceError::not_found(format!("App '{}' not found", name)))
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, ComplianceError> {
        let state = self.state.read().await;
        Ok(state.roles.values().find(|r| r.name == name).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Role>, ComplianceError> {
        Ok(self.state.read().await.roles.get(&id).cloned())
    }

    async fn create_with_access(
        &self,
        role: NewRole,
        entries: Vec<AclEntry>,
    ) -> Result<Option<Role>, ComplianceError> {
        let mut state = self.state.write().await;
        if state.roles.values().any(|r| r.name == role.name) {
            return Ok(None);
        }

        let id = state.next_id();
        let created = Role { id, name: role.name, description: Some(role.description), is_active: true };
        state.roles.insert(id, created.clone());

        for mut entry in entries {
            let entry_id = state.next_id();
            entry.id = Some(entry_id);
            entry.role_id = Some(id);
            state.entries.insert(entry_id, entry);
        }
        Ok(Some(created))
    }

    async fn delete(&self, id: i64) -> Result<(), ComplianceError> {
        let mut state = self.state.write().await;
        state.roles.remove(&id);
        state.entries.retain(|_, e| e.role_id != Some(id));
        state.links.retain(|_, l| l.role_id != id);
        Ok(())
    }
}

#[async_trait]
impl AclEntryStore for MemoryStore {
    async fn entries_for_role(&self, role_id: i64) -> Result<Vec<AclEntry>, ComplianceError> {
        Ok(self.entries_of(role_id).await)
    }

    async fn apply(&self, role_id: i64, changes: &AclChangeSet) -> Result<(), ComplianceError> {
        let mut state = self.state.write().await;
        for entry in &changes.detached {
            if let Some(id) = entry.id {
                state.entries.remove(&id);
            }
        }
        for entry in &changes.added {
            let id = state.next_id();
            let mut entry = entry.clone();
            entry.id = Some(id);
            entry.role_id = Some(role_id);
            state.entries.insert(id, entry);
        }
        Ok(())
    }
}

#[async_trait]
impl AppLinkStore for MemoryStore {
    async fn links_for_role(&self, role_id: i64) -> Result<Vec<AppLink>, ComplianceError> {
        Ok(self.links_of(role_id).await)
    }

    async fn find(
        &self,
        user_id: i64,
        app_id: i64,
        role_id: i64,
    ) -> Result<Option<AppLink>, ComplianceError> {
        let state = self.state.read().await;
        Ok(state
            .links
            .values()
            .find(|l| l.user_id == user_id && l.app_id == app_id && l.role_id == role_id)
            .cloned())
    }

    async fn create(&self, user_id: i64, app_id: i64, role_id: i64) -> Result<AppLink, ComplianceError> {
        let mut state = self.state.write().await;
        let id = state.next_id();
        let link = AppLink { id, user_id, app_id, role_id };
        state.links.insert(id, link.clone());
        Ok(link)
    }

    async fn delete(&self, id: i64) -> Result<(), ComplianceError> {
        self.state.write().await.links.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl AdminStore for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<AdminRecord>, ComplianceError> {
        Ok(self.state.read().await.admins.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<AdminRecord>, ComplianceError> {
        let state = self.state.read().await;
        Ok(state.admins.values().find(|a| a.email == email).cloned())
    }

    async fn list_admins(&self) -> Result<Vec<AdminRecord>, ComplianceError> {
        let state = self.state.read().await;
        Ok(state.admins.values().filter(|a| a.is_sys_admin).cloned().collect())
    }

    async fn current_root(&self) -> Result<Option<AdminRecord>, ComplianceError> {
        let state = self.state.read().await;
        Ok(state.admins.values().find(|a| a.is_root_admin).cloned())
    }

    async fn set_root(&self, id: i64) -> Result<AdminRecord, ComplianceError> {
        let mut state = self.state.write().await;
        match state.admins.get(&id) {
            None => return Err(ComplianceError::not_found(ADMIN_NOT_FOUND)),
            Some(admin) if !admin.is_sys_admin => {
                return Err(ComplianceError::forbidden(ONLY_ADMINS_CAN_BE_ROOT))
            }
            Some(_) => {}
        }

        for admin in state.admins.values_mut() {
            admin.is_root_admin = admin.id == id;
        }
        state
            .admins
            .get(&id)
            .cloned()
            .ok_or_else(|| ComplianceError::not_found(ADMIN_NOT_FOUND))
    }
}

#[async_trait]
impl ServiceReportStore for MemoryStore {
    async fn append(&self, report: NewServiceReport) -> Result<ServiceReport, ComplianceError> {
        let mut state = self.state.write().await;
        let id = state.next_id();
        let now = Utc::now();
        let row = ServiceReport {
            id,
            service_name: report.service_name,
            user_email: report.user_email,
            action: Some(report.action.label().to_string()),
            request_verb: report.request_verb,
            created_date: Some(now),
            last_modified_date: now,
        };
        state.reports.insert(id, row.clone());
        Ok(row)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<ServiceReport>, ComplianceError> {
        let state = self.state.read().await;
        Ok(state
            .reports
            .values()
            .rev()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn delete_all(&self) -> Result<u64, ComplianceError> {
        let mut state = self.state.write().await;
        let removed = state.reports.len() as u64;
        state.reports.clear();
        Ok(removed)
    }
}
