// Shared fixtures for unit tests: a small platform with the usual services, apps and admins.

use std::sync::Arc;

use crate::compliance::cache::LocalAuthCache;
use crate::compliance::license::{LicenseTier, StaticLicense};
use crate::compliance::session::{RequestSession, SessionUser};
use crate::compliance::store::Stores;
use crate::database::models::AdminRecord;
use crate::database::MemoryStore;

pub const ROOT_EMAIL: &str = "root@example.com";
pub const RESTRICTED_EMAIL: &str = "ra@example.com";

// Admins are added first, so their ids are fixed.
pub const ROOT_ID: i64 = 1;
pub const RESTRICTED_ID: i64 = 2;

pub fn fixture_store() -> Arc<MemoryStore> {
    let store = MemoryStore::builder()
        .admin(AdminRecord::new(0, ROOT_EMAIL).root())
        .admin(AdminRecord::new(0, RESTRICTED_EMAIL))
        .service("system")
        .service("api_docs")
        .service("db")
        .service("files")
        .service("logs")
        .service("email")
        .app("admin")
        .app("api_docs")
        .app("file_manager")
        .build();
    Arc::new(store)
}

pub struct Fixture {
    pub stores: Stores,
    pub store: Arc<MemoryStore>,
    pub cache: Arc<LocalAuthCache>,
}

/// Fixture store behind a Gold license
pub fn fixture() -> Fixture {
    let store = fixture_store();
    let cache = Arc::new(LocalAuthCache::new());
    let stores = Stores::from_backend(store.clone(), cache.clone(), Arc::new(StaticLicense(LicenseTier::Gold)));
    Fixture { stores, store, cache }
}

/// Session of the fixture's root admin
pub fn root_session() -> RequestSession {
    RequestSession(Some(SessionUser {
        id: ROOT_ID,
        email: ROOT_EMAIL.to_string(),
        is_sys_admin: true,
        role_id: None,
    }))
}

/// Session of an admin acting through role `role_id`
pub fn restricted_session(role_id: i64) -> RequestSession {
    RequestSession(Some(SessionUser {
        id: RESTRICTED_ID,
        email: RESTRICTED_EMAIL.to_string(),
        is_sys_admin: true,
        role_id: Some(role_id),
    }))
}
