// Restricted-admin compliance engine.
//
// `catalogue` and `reconciler` turn tab selections into ACL entries, `role_manager` and
// `app_links` keep an admin's generated role and app links in sync, `gate` decides who may
// change them, and `audit` records service definition changes. Storage is reached only
// through the traits in `store`.

pub mod acl;
pub mod app_links;
pub mod audit;
pub mod cache;
pub mod catalogue;
pub mod error;
pub mod gate;
pub mod license;
pub mod reconciler;
pub mod role_manager;
pub mod session;
pub mod store;

pub use acl::AclEntry;
pub use app_links::{AdminApps, AppLinkManager};
pub use audit::{ServiceAction, ServiceAuditRecorder, ServiceChange, ServiceTarget};
pub use cache::LocalAuthCache;
pub use error::ComplianceError;
pub use gate::{AdminMutation, AdminPayload, RestrictedAdminGate, RootAdminGuard};
pub use license::{Entitlement, LicenseTier, StaticLicense};
pub use reconciler::{AclChangeSet, AclReconciler};
pub use role_manager::{RoleManager, RoleTransition};
pub use session::{CurrentSession, RequestSession, SessionUser};
pub use store::Stores;
