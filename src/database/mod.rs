pub mod manager;
pub mod memory;
pub mod models;
pub mod repository;
pub mod schema;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use repository::PgRepository;
