// handlers/mod.rs - resources the compliance layer serves itself
//
// Everything else under /api belongs to the host platform; the compliance layer only wraps it
// with middleware (see router.rs).

pub mod health;
pub mod service_report;

pub use health::health;
pub use service_report::{report_delete, report_list, report_unsupported};
