pub mod db;
pub mod memory;
pub mod models;
pub mod pagination;
pub mod pg;
pub mod store;

pub use memory::MemoryStore;
pub use pg::PgStore;
pub use store::{Store, StoreError, StoreResult};
