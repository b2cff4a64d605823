use std::sync::Arc;

use tracing::debug;

use crate::compliance::catalogue::{API_DOCS_TAB, FILES_TAB};
use crate::compliance::error::ComplianceError;
use crate::compliance::store::{AppLinkStore, AppLookup};
use crate::database::models::LinkRequest;

/// Names of the console apps a restricted admin is linked to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminApps {
    pub admin: String,
    pub api_docs: String,
    pub file_manager: String,
}

impl Default for AdminApps {
    fn default() -> Self {
        Self {
            admin: "admin".to_string(),
            api_docs: "api_docs".to_string(),
            file_manager: "file_manager".to_string(),
        }
    }
}

impl AdminApps {
    /// Each app with whether the admin should be linked to it
    fn selection<S: AsRef<str>>(&self, is_restricted_admin: bool, tabs: &[S]) -> [(&str, bool); 3] {
        let has = |wanted: &str| tabs.iter().any(|tab| tab.as_ref() == wanted);
        [
            (self.admin.as_str(), is_restricted_admin),
            (self.api_docs.as_str(), has(API_DOCS_TAB)),
            (self.file_manager.as_str(), has(FILES_TAB)),
        ]
    }
}

/// Keeps user/app/role links in step with the tab selection
pub struct AppLinkManager {
    apps: Arc<dyn AppLookup>,
    links: Arc<dyn AppLinkStore>,
    names: AdminApps,
}

impl AppLinkManager {
    pub fn new(apps: Arc<dyn AppLookup>, links: Arc<dyn AppLinkStore>, names: AdminApps) -> Self {
        Self { apps, links, names }
    }

    /// Links for an admin that does not exist yet; the host creates them with the admin
    pub async fn link_requests<S: AsRef<str>>(
        &self,
        role_id: i64,
        is_restricted_admin: bool,
        tabs: &[S],
    ) -> Result<Vec<LinkRequest>, ComplianceError> {
        let mut requests = Vec::new();
        for (app, selected) in self.names.selection(is_restricted_admin, tabs) {
            let app_id = self.apps.app_id_by_name(app).await?;
            if selected {
                requests.push(LinkRequest { id: None, user_id: None, app_id, role_id });
            }
        }
        Ok(requests)
    }

    /// Create missing links and delete deselected ones for an existing admin.
    /// Returns the links the admin holds for this role afterwards.
    pub async fn converge<S: AsRef<str>>(
        &self,
        user_id: i64,
        role_id: i64,
        is_restricted_admin: bool,
        tabs: &[S],
    ) -> Result<Vec<LinkRequest>, ComplianceError> {
        let mut held = Vec::new();
        for (app, selected) in self.names.selection(is_restricted_admin, tabs) {
            let app_id = self.apps.app_id_by_name(app).await?;
            let existing = self.links.find(user_id, app_id, role_id).await?;

            match (selected, existing) {
                (true, Some(link)) => held.push(LinkRequest::from(link)),
                (true, None) => {
                    debug!("Linking user {} to app '{}' via role {}", user_id, app, role_id);
                    let link = self.links.create(user_id, app_id, role_id).await?;
                    held.push(LinkRequest::from(link));
                }
                (false, Some(link)) => {
                    debug!("Unlinking user {} from app '{}'", user_id, app);
                    self.links.delete(link.id).await?;
                }
                (false, None) => {}
            }
        }
        Ok(held)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixture_store;

    #[tokio::test]
    async fn requests_cover_selected_apps_only() {
        let store = fixture_store();
        let manager = AppLinkManager::new(store.clone(), store.clone(), AdminApps::default());

        let requests = manager.link_requests(4, true, &["users", "apidocs"]).await.unwrap();
        let admin = store.app_id("admin").await.unwrap();
        let api_docs = store.app_id("api_docs").await.unwrap();
        let app_ids: Vec<_> = requests.iter().map(|r| r.app_id).collect();
        assert_eq!(app_ids, vec![admin, api_docs]);
        assert!(requests.iter().all(|r| r.role_id == 4 && r.user_id.is_none()));
    }

    #[tokio::test]
    async fn converge_adds_and_removes_links() {
        let store = fixture_store();
        let manager = AppLinkManager::new(store.clone(), store.clone(), AdminApps::default());

        let held = manager.converge(9, 4, true, &["files"]).await.unwrap();
        assert_eq!(held.len(), 2);

        let held = manager.converge(9, 4, true, &["apidocs"]).await.unwrap();
        assert_eq!(held.len(), 2);
        let file_manager = store.app_id("file_manager").await.unwrap();
        assert!(held.iter().all(|l| l.app_id != file_manager));
        assert_eq!(store.links_of(4).await.len(), 2);
    }

    #[tokio::test]
    async fn missing_app_is_fatal() {
        let store = std::sync::Arc::new(crate::database::memory::MemoryStore::builder().app("admin").build());
        let manager = AppLinkManager::new(store.clone(), store, AdminApps::default());
        let err = manager.link_requests(1, true, &["files"]).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
