pub mod accessible_tabs;
pub mod auth;
pub mod body;
pub mod response;
pub mod restricted_admin;
pub mod restricted_role;
pub mod root_admin;
pub mod route;
pub mod service_audit;

pub use accessible_tabs::accessible_tabs_middleware;
pub use auth::{request_session, AdminSession};
pub use response::{ApiResponse, ApiResult};
pub use restricted_admin::restricted_admin_middleware;
pub use restricted_role::restricted_role_middleware;
pub use root_admin::root_admin_middleware;
pub use route::ApiRoute;
pub use service_audit::service_audit_middleware;
