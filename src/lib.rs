pub mod cli;
pub mod compliance;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
pub mod types;

#[cfg(test)]
pub mod testing;

pub use router::{app, service_report_routes, with_compliance};
pub use state::AppState;
