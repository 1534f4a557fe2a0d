//! # Quill Infrastructure
//!
//! Concrete implementations of the repository ports defined in `quill-core`.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory store only
//! - `postgres` - PostgreSQL storage via SeaORM

pub mod database;

pub use database::{DatabaseConfig, InMemoryStore};

#[cfg(feature = "postgres")]
pub use database::DatabaseConnections;
