//! Backend implementations for the storage layer.
//!
//! Chapter text always lives on the filesystem. Metadata can be kept in
//! memory or, with the `postgres` feature, in PostgreSQL.

pub mod filesystem;
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use filesystem::FilesystemContentStore;
pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;
