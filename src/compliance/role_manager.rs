use serde::Serialize;
use tracing::{debug, info, warn};

use crate::compliance::cache::role_key;
use crate::compliance::catalogue;
use crate::compliance::error::ComplianceError;
use crate::compliance::gate::{RootAdminGuard, ROLE_DELETE_FORBIDDEN, SELF_EDIT_FORBIDDEN};
use crate::compliance::reconciler::AclReconciler;
use crate::compliance::session::CurrentSession;
use crate::compliance::store::Stores;
use crate::database::models::{NewRole, Role};
use crate::types::AdminAction;

/// What happened to an admin's generated role
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "transition", content = "role")]
pub enum RoleTransition {
    Created(Role),
    Updated(Role),
    Deleted(i64),
    Unchanged,
}

impl RoleTransition {
    /// Role the admin is bound to afterwards, if any
    pub fn role(&self) -> Option<&Role> {
        match self {
            RoleTransition::Created(role) | RoleTransition::Updated(role) => Some(role),
            _ => None,
        }
    }
}

/// Lifecycle of the one generated role per restricted admin
pub struct RoleManager {
    stores: Stores,
    guard: RootAdminGuard,
}

impl RoleManager {
    pub fn new(stores: Stores) -> Self {
        Self {
            guard: RootAdminGuard::new(stores.clone()),
            stores,
        }
    }

    pub fn role_name(email: &str) -> String {
        format!("{}'s role", email)
    }

    pub fn role_description(email: &str) -> String {
        format!("{}'s admin role", email)
    }

    pub async fn find_role(&self, email: &str) -> Result<Option<Role>, ComplianceError> {
        self.stores.roles.find_by_name(&Self::role_name(email)).await
    }

    /// Bring the admin's role in line with its restricted flag and tab selection
    pub async fn sync_admin<S: AsRef<str>>(
        &self,
        session: &dyn CurrentSession,
        action: AdminAction,
        email: &str,
        is_restricted_admin: bool,
        tabs: &[S],
    ) -> Result<RoleTransition, ComplianceError> {
        if is_restricted_admin && !catalogue::is_all_tabs(tabs) {
            match action {
                AdminAction::Create => self.create_role(email, tabs).await,
                AdminAction::Update => self.update_role(session, email, tabs).await,
            }
        } else {
            self.demote(session, email).await
        }
    }

    /// Remove the admin's role on behalf of `session`.
    /// Role-bound sessions may not demote anyone, and only root may demote a restricted admin.
    pub async fn demote(
        &self,
        session: &dyn CurrentSession,
        email: &str,
    ) -> Result<RoleTransition, ComplianceError> {
        let Some(role) = self.find_role(email).await? else {
            return Ok(RoleTransition::Unchanged);
        };

        if session.has_role() {
            warn!("Restricted session {} tried to lift restriction on {}", session.user_email(), email);
            return Err(ComplianceError::forbidden(SELF_EDIT_FORBIDDEN));
        }
        if self.guard.is_restricted_admin_role(role.id).await? && !self.guard.is_root(session).await? {
            warn!("Non-root session {} tried to remove role {} of {}", session.user_email(), role.id, email);
            return Err(ComplianceError::forbidden(ROLE_DELETE_FORBIDDEN));
        }

        self.remove_role(role).await
    }

    /// Create the role with the default grants plus `tabs`.
    /// If the role turns out to exist already the existing one is reconciled instead.
    pub async fn create_role<S: AsRef<str>>(
        &self,
        email: &str,
        tabs: &[S],
    ) -> Result<RoleTransition, ComplianceError> {
        let mut reconciler = AclReconciler::new(self.stores.services.as_ref());
        let entries = reconciler.materialize(tabs, true).await?;

        let new_role = NewRole {
            name: Self::role_name(email),
            description: Self::role_description(email),
        };

        match self.stores.roles.create_with_access(new_role, entries).await? {
            Some(role) => {
                info!("Created restricted admin role '{}' (id {})", role.name, role.id);
                Ok(RoleTransition::Created(role))
            }
            None => {
                debug!("Role for {} already exists, reconciling instead", email);
                match self.find_role(email).await? {
                    Some(role) => self.reconcile_role(role, tabs).await,
                    None => Err(ComplianceError::Conflict(format!(
                        "role '{}' could not be created",
                        Self::role_name(email)
                    ))),
                }
            }
        }
    }

    /// Reconcile the existing role, or create one when the admin has none yet.
    /// Sessions bound to a role may not change tab access, including their own.
    pub async fn update_role<S: AsRef<str>>(
        &self,
        session: &dyn CurrentSession,
        email: &str,
        tabs: &[S],
    ) -> Result<RoleTransition, ComplianceError> {
        if session.has_role() {
            warn!("Restricted session {} tried to edit access by tabs", session.user_email());
            return Err(ComplianceError::forbidden(SELF_EDIT_FORBIDDEN));
        }

        match self.find_role(email).await? {
            Some(role) => self.reconcile_role(role, tabs).await,
            None => self.create_role(email, tabs).await,
        }
    }

    async fn reconcile_role<S: AsRef<str>>(
        &self,
        role: Role,
        tabs: &[S],
    ) -> Result<RoleTransition, ComplianceError> {
        let current = self.stores.acl.entries_for_role(role.id).await?;
        let mut reconciler = AclReconciler::new(self.stores.services.as_ref());
        let changes = reconciler.reconcile(current, tabs).await?;

        if changes.is_empty() {
            debug!("Role {} already matches the selected tabs", role.id);
        } else {
            info!(
                "Updating role {}: {} added, {} detached",
                role.id,
                changes.added.len(),
                changes.detached.len()
            );
            self.stores.acl.apply(role.id, &changes).await?;
            self.stores.cache.forget(&role_key(role.id)).await;
        }
        Ok(RoleTransition::Updated(role))
    }

    /// Remove the role and drop cached authorization state
    async fn remove_role(&self, role: Role) -> Result<RoleTransition, ComplianceError> {
        self.stores.roles.delete(role.id).await?;
        self.stores.cache.forget(&role_key(role.id)).await;
        self.stores.cache.flush().await;

        info!("Deleted restricted admin role '{}' (id {})", role.name, role.id);
        Ok(RoleTransition::Deleted(role.id))
    }

    /// Tabs a role can open in the admin console.
    /// A role without app links is not a restricted admin role and sees every tab.
    pub async fn get_accessible_tabs_by_role_id(
        &self,
        role_id: i64,
    ) -> Result<Vec<&'static str>, ComplianceError> {
        if self.stores.links.links_for_role(role_id).await?.is_empty() {
            return Ok(catalogue::all_tabs());
        }

        let entries = self.stores.acl.entries_for_role(role_id).await?;
        AclReconciler::new(self.stores.services.as_ref())
            .granted_tabs(&entries)
            .await
    }
}
