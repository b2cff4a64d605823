pub mod admin;
pub mod app_link;
pub mod role;
pub mod service_report;

pub use admin::AdminRecord;
pub use app_link::{AppLink, LinkRequest};
pub use role::{NewRole, Role};
pub use service_report::{NewServiceReport, ServiceReport};
