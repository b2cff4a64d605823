// Authorization gate for admin mutations and restricted role deletion.

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::compliance::app_links::{AdminApps, AppLinkManager};
use crate::compliance::audit::value_as_id;
use crate::compliance::catalogue;
use crate::compliance::error::ComplianceError;
use crate::compliance::role_manager::{RoleManager, RoleTransition};
use crate::compliance::session::CurrentSession;
use crate::compliance::store::Stores;
use crate::database::models::LinkRequest;
use crate::types::AdminAction;

pub const GOLD_REQUIRED: &str = "Restricted admins require a Gold license.";
pub const SELF_EDIT_FORBIDDEN: &str = "RestrictedAdmins are not allowed to edit access by tabs.";
pub const ROLE_DELETE_FORBIDDEN: &str =
    "You do not have permission to delete restricted admin's role. Please contact your root administrator.";
pub const ONLY_ADMINS_CAN_BE_ROOT: &str = "Only admins can be root.";
pub const ADMIN_NOT_FOUND: &str = "Admin does not exist";

/// Payload key the host reads user/app/role links from
pub const LINKS_FIELD: &str = "user_to_app_to_role_by_user_id";

/// The restricted-admin fields of one admin record in a request
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdminMutation {
    pub id: Option<i64>,
    pub email: Option<String>,
    /// `None` when the item does not mention restriction at all
    pub is_restricted_admin: Option<bool>,
    pub access_by_tabs: Vec<String>,
}

impl AdminMutation {
    pub fn from_value(item: &Value) -> Result<Self, ComplianceError> {
        let object = item
            .as_object()
            .ok_or_else(|| ComplianceError::invalid_payload("admin record must be an object"))?;

        let access_by_tabs = match object.get("access_by_tabs") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(tabs)) => tabs
                .iter()
                .map(|tab| {
                    tab.as_str().map(str::to_string).ok_or_else(|| {
                        ComplianceError::invalid_payload("access_by_tabs must be a list of tab names")
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => {
                return Err(ComplianceError::invalid_payload(
                    "access_by_tabs must be a list of tab names",
                ))
            }
        };

        Ok(Self {
            id: object.get("id").and_then(value_as_id),
            email: object.get("email").and_then(Value::as_str).map(str::to_string),
            is_restricted_admin: object.get("is_restricted_admin").map(truthy),
            access_by_tabs,
        })
    }

    pub fn wants_restriction(&self) -> bool {
        self.is_restricted_admin == Some(true)
    }
}

/// Loose boolean as admin clients send it: `true`, `1`, `"true"`, `"1"`
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64().map(|n| n != 0).unwrap_or(false),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on"),
        _ => false,
    }
}

/// Admin request body, either one record or a `{"resource": [...]}` batch
#[derive(Debug, Clone)]
pub struct AdminPayload {
    body: Map<String, Value>,
    batched: bool,
}

impl AdminPayload {
    pub fn parse(body: Value) -> Result<Self, ComplianceError> {
        match body {
            Value::Object(body) => {
                let batched = matches!(body.get("resource"), Some(Value::Array(_)));
                Ok(Self { body, batched })
            }
            _ => Err(ComplianceError::invalid_payload("request body must be a JSON object")),
        }
    }

    pub fn is_batch(&self) -> bool {
        self.batched
    }

    /// One mutation per record, in request order
    pub fn mutations(&self) -> Result<Vec<AdminMutation>, ComplianceError> {
        match self.body.get("resource") {
            Some(Value::Array(items)) if self.batched => items.iter().map(AdminMutation::from_value).collect(),
            _ => Ok(vec![AdminMutation::from_value(&Value::Object(self.body.clone()))?]),
        }
    }

    fn record_mut(&mut self, index: usize) -> Option<&mut Map<String, Value>> {
        if self.batched {
            self.body
                .get_mut("resource")
                .and_then(Value::as_array_mut)
                .and_then(|items| items.get_mut(index))
                .and_then(Value::as_object_mut)
        } else if index == 0 {
            Some(&mut self.body)
        } else {
            None
        }
    }

    pub fn set_links(&mut self, index: usize, links: &[LinkRequest]) -> Result<(), ComplianceError> {
        let value = serde_json::to_value(links)
            .map_err(|e| ComplianceError::invalid_payload(e.to_string()))?;
        if let Some(record) = self.record_mut(index) {
            record.insert(LINKS_FIELD.to_string(), value);
        }
        Ok(())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.body)
    }
}

/// Runs restricted-admin handling for admin create/update requests
pub struct RestrictedAdminGate {
    stores: Stores,
    roles: RoleManager,
    links: AppLinkManager,
}

impl RestrictedAdminGate {
    pub fn new(stores: Stores, apps: AdminApps) -> Self {
        Self {
            roles: RoleManager::new(stores.clone()),
            links: AppLinkManager::new(stores.apps.clone(), stores.links.clone(), apps),
            stores,
        }
    }

    pub fn role_manager(&self) -> &RoleManager {
        &self.roles
    }

    /// Restricting anyone requires a Gold license
    pub fn ensure_licensed(&self, mutations: &[AdminMutation]) -> Result<(), ComplianceError> {
        if mutations.iter().any(AdminMutation::wants_restriction) && !self.stores.license.is_gold() {
            warn!("Restricted admin requested under {:?} license", self.stores.license.current_license_tier());
            return Err(ComplianceError::forbidden(GOLD_REQUIRED));
        }
        Ok(())
    }

    /// Sync roles and links for every record, returning the rewritten body.
    /// `path_id` is the admin id from `/admin/{id}` and fills in a single record's missing id.
    /// Every record is checked before the first write.
    pub async fn process(
        &self,
        session: &dyn CurrentSession,
        action: AdminAction,
        body: Value,
        path_id: Option<i64>,
    ) -> Result<Value, ComplianceError> {
        let mut payload = AdminPayload::parse(body)?;
        let mut mutations = payload.mutations()?;
        if !payload.is_batch() {
            for mutation in mutations.iter_mut().filter(|m| m.id.is_none()) {
                mutation.id = path_id;
            }
        }
        self.ensure_licensed(&mutations)?;

        let mut pending = Vec::with_capacity(mutations.len());
        for (index, mutation) in mutations.iter().enumerate() {
            let Some(is_restricted) = mutation.is_restricted_admin else {
                debug!("Admin record {} does not touch restriction, skipping", index);
                continue;
            };
            if is_restricted {
                catalogue::validate_tabs(&mutation.access_by_tabs)?;
            }
            let email = self.resolve_email(mutation).await?;
            pending.push((index, mutation, is_restricted, email));
        }

        for (index, mutation, is_restricted, email) in pending {
            let transition = self
                .roles
                .sync_admin(session, action, &email, is_restricted, &mutation.access_by_tabs)
                .await?;

            if let Some(role) = transition.role() {
                let links = self.links_for(action, mutation, &email, role.id, is_restricted).await?;
                payload.set_links(index, &links)?;
            }

            if let RoleTransition::Deleted(role_id) = transition {
                info!("Admin {} is no longer restricted (role {} removed)", email, role_id);
            }
        }

        Ok(payload.into_value())
    }

    async fn resolve_email(&self, mutation: &AdminMutation) -> Result<String, ComplianceError> {
        if let Some(email) = mutation.email.as_ref().filter(|e| !e.is_empty()) {
            return Ok(email.clone());
        }
        let id = mutation
            .id
            .ok_or_else(|| ComplianceError::invalid_payload("admin record needs an email or an id"))?;
        self.stores
            .admins
            .find_by_id(id)
            .await?
            .map(|admin| admin.email)
            .ok_or_else(|| ComplianceError::not_found(ADMIN_NOT_FOUND))
    }

    async fn links_for(
        &self,
        action: AdminAction,
        mutation: &AdminMutation,
        email: &str,
        role_id: i64,
        is_restricted: bool,
    ) -> Result<Vec<LinkRequest>, ComplianceError> {
        let tabs = &mutation.access_by_tabs;
        let user_id = match (action, mutation.id) {
            (AdminAction::Create, _) => None,
            (AdminAction::Update, Some(id)) => Some(id),
            (AdminAction::Update, None) => self.stores.admins.find_by_email(email).await?.map(|a| a.id),
        };

        match user_id {
            Some(user_id) => self.links.converge(user_id, role_id, is_restricted, tabs).await,
            None => self.links.link_requests(role_id, is_restricted, tabs).await,
        }
    }
}

/// Root-admin checks for destructive role operations
pub struct RootAdminGuard {
    stores: Stores,
}

impl RootAdminGuard {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    pub async fn is_root(&self, session: &dyn CurrentSession) -> Result<bool, ComplianceError> {
        match session.current_user() {
            Some(user) => self.stores.admins.is_root_by_id(user.id).await,
            None => Ok(false),
        }
    }

    /// A role belongs to a restricted admin when its app links point at an admin
    pub async fn is_restricted_admin_role(&self, role_id: i64) -> Result<bool, ComplianceError> {
        let links = self.stores.links.links_for_role(role_id).await?;
        match links.first() {
            Some(link) => self.stores.admins.admin_exists_by_id(link.user_id).await,
            None => Ok(false),
        }
    }

    /// Only the root admin may delete roles that belong to restricted admins
    pub async fn ensure_can_delete_roles(
        &self,
        session: &dyn CurrentSession,
        role_ids: &[i64],
    ) -> Result<(), ComplianceError> {
        let mut restricted = None;
        for role_id in role_ids {
            if self.is_restricted_admin_role(*role_id).await? {
                restricted = Some(*role_id);
                break;
            }
        }

        let Some(role_id) = restricted else {
            return Ok(());
        };

        if self.is_root(session).await? {
            return Ok(());
        }

        warn!(
            "Non-root session {} tried to delete restricted admin role {}",
            session.user_email(),
            role_id
        );
        Err(ComplianceError::forbidden(ROLE_DELETE_FORBIDDEN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::license::{LicenseTier, StaticLicense};
    use crate::compliance::session::{RequestSession, SessionUser};
    use crate::testing::{fixture, restricted_session, root_session, RESTRICTED_EMAIL, RESTRICTED_ID};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn batch_and_single_payloads_normalize() {
        let single = AdminPayload::parse(json!({"email": "a@x.io", "is_restricted_admin": true})).unwrap();
        assert!(!single.is_batch());
        assert_eq!(single.mutations().unwrap().len(), 1);

        let batch = AdminPayload::parse(json!({"resource": [
            {"email": "a@x.io", "is_restricted_admin": "1", "access_by_tabs": ["users"]},
            {"email": "b@x.io"}
        ]}))
        .unwrap();
        let mutations = batch.mutations().unwrap();
        assert!(batch.is_batch());
        assert_eq!(mutations[0].is_restricted_admin, Some(true));
        assert_eq!(mutations[0].access_by_tabs, vec!["users"]);
        assert_eq!(mutations[1].is_restricted_admin, None);
    }

    #[test]
    fn tabs_must_be_strings() {
        let payload = AdminPayload::parse(json!({"email": "a@x.io", "access_by_tabs": [1, 2]})).unwrap();
        assert!(matches!(payload.mutations(), Err(ComplianceError::InvalidPayload(_))));
        assert!(AdminPayload::parse(json!([1])).is_err());
    }

    #[tokio::test]
    async fn restriction_needs_gold() {
        let mut fx = fixture();
        fx.stores.license = Arc::new(StaticLicense(LicenseTier::Silver));
        let gate = RestrictedAdminGate::new(fx.stores, AdminApps::default());

        let err = gate
            .process(&root_session(), AdminAction::Create, json!({"email": "a@x.io", "is_restricted_admin": true}), None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), GOLD_REQUIRED);

        // Clearing restriction is allowed on any tier
        gate.process(&root_session(), AdminAction::Update, json!({"email": "a@x.io", "is_restricted_admin": false}), None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn create_populates_link_requests() {
        let fx = fixture();
        let store = fx.store.clone();
        let gate = RestrictedAdminGate::new(fx.stores, AdminApps::default());

        let body = gate
            .process(
                &root_session(),
                AdminAction::Create,
                json!({"email": "ra@x.io", "is_restricted_admin": true, "access_by_tabs": ["users", "files"]}),
                None,
            )
            .await
            .unwrap();

        let links = body[LINKS_FIELD].as_array().unwrap();
        assert_eq!(links.len(), 2);
        let role_id = links[0]["role_id"].as_i64().unwrap();
        assert!(links.iter().all(|l| l.get("user_id").is_none()));
        assert_eq!(store.entries_of(role_id).await.len(), 9);
    }

    #[tokio::test]
    async fn records_without_restriction_flag_pass_through() {
        let fx = fixture();
        let store = fx.store.clone();
        let gate = RestrictedAdminGate::new(fx.stores, AdminApps::default());

        let input = json!({"resource": [{"email": "plain@x.io", "name": "Plain"}]});
        let body = gate.process(&root_session(), AdminAction::Create, input.clone(), None).await.unwrap();
        assert_eq!(body, input);
        assert_eq!(store.role_count().await, 0);
    }

    #[tokio::test]
    async fn only_root_deletes_restricted_roles() {
        let fx = fixture();
        let store = fx.store.clone();
        let gate = RestrictedAdminGate::new(fx.stores.clone(), AdminApps::default());
        let guard = RootAdminGuard::new(fx.stores);

        let restricted = store.admin_id("ra@example.com").await.unwrap();
        gate.process(
            &root_session(),
            AdminAction::Update,
            json!({"id": restricted, "email": "ra@example.com", "is_restricted_admin": true, "access_by_tabs": ["apps"]}),
            None,
        )
        .await
        .unwrap();
        let role = gate.role_manager().find_role("ra@example.com").await.unwrap().unwrap();
        assert!(guard.is_restricted_admin_role(role.id).await.unwrap());

        let own_session = RequestSession(Some(SessionUser {
            id: restricted,
            email: "ra@example.com".into(),
            is_sys_admin: true,
            role_id: Some(role.id),
        }));
        let err = guard.ensure_can_delete_roles(&own_session, &[role.id]).await.unwrap_err();
        assert_eq!(err.to_string(), ROLE_DELETE_FORBIDDEN);

        guard.ensure_can_delete_roles(&root_session(), &[role.id]).await.unwrap();
    }

    #[tokio::test]
    async fn path_id_stands_in_for_a_missing_id() {
        let fx = fixture();
        let store = fx.store.clone();
        let gate = RestrictedAdminGate::new(fx.stores, AdminApps::default());

        let body = gate
            .process(
                &root_session(),
                AdminAction::Update,
                json!({"is_restricted_admin": true, "access_by_tabs": ["users"]}),
                Some(RESTRICTED_ID),
            )
            .await
            .unwrap();

        let role = gate.role_manager().find_role(RESTRICTED_EMAIL).await.unwrap().unwrap();
        assert_eq!(body.get("id"), None);
        assert_eq!(body[LINKS_FIELD][0]["user_id"], json!(RESTRICTED_ID));
        assert_eq!(store.links_of(role.id).await.len(), 1);
    }

    #[tokio::test]
    async fn batch_is_checked_before_any_write() {
        let fx = fixture();
        let store = fx.store.clone();
        let gate = RestrictedAdminGate::new(fx.stores, AdminApps::default());

        let err = gate
            .process(
                &root_session(),
                AdminAction::Create,
                json!({"resource": [
                    {"email": "one@x.io", "is_restricted_admin": true, "access_by_tabs": ["apps"]},
                    {"email": "two@x.io", "is_restricted_admin": true, "access_by_tabs": ["billing"]}
                ]}),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ComplianceError::UnknownTab(_)));
        assert_eq!(store.role_count().await, 0);

        let err = gate
            .process(
                &root_session(),
                AdminAction::Update,
                json!({"resource": [
                    {"email": "one@x.io", "is_restricted_admin": true, "access_by_tabs": ["apps"]},
                    {"id": 4242, "is_restricted_admin": true, "access_by_tabs": ["files"]}
                ]}),
                Some(RESTRICTED_ID),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), ADMIN_NOT_FOUND);
        assert_eq!(store.role_count().await, 0);
    }

    #[tokio::test]
    async fn demotion_needs_root() {
        let fx = fixture();
        let store = fx.store.clone();
        let gate = RestrictedAdminGate::new(fx.stores, AdminApps::default());
        let restrict = json!({"id": RESTRICTED_ID, "is_restricted_admin": true, "access_by_tabs": ["apps"]});
        gate.process(&root_session(), AdminAction::Update, restrict, None).await.unwrap();
        let role = gate.role_manager().find_role(RESTRICTED_EMAIL).await.unwrap().unwrap();

        let lift = json!({"id": RESTRICTED_ID, "email": RESTRICTED_EMAIL, "is_restricted_admin": false});
        let err = gate
            .process(&restricted_session(role.id), AdminAction::Update, lift.clone(), None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), SELF_EDIT_FORBIDDEN);

        let other = RequestSession(Some(SessionUser {
            id: 77,
            email: "other@example.com".into(),
            is_sys_admin: true,
            role_id: None,
        }));
        let err = gate.process(&other, AdminAction::Update, lift.clone(), None).await.unwrap_err();
        assert_eq!(err.to_string(), ROLE_DELETE_FORBIDDEN);
        assert_eq!(store.role_count().await, 1);

        gate.process(&root_session(), AdminAction::Update, lift, None).await.unwrap();
        assert_eq!(store.role_count().await, 0);
    }

    #[test]
    fn truthy_accepts_client_spellings() {
        assert!(truthy(&json!(true)));
        assert!(truthy(&json!(1)));
        assert!(truthy(&json!("true")));
        assert!(!truthy(&json!("0")));
        assert!(!truthy(&Value::Null));
    }
}
