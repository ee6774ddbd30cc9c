//! agencydesk database: the SurrealDB resource store.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Error types ([`DbError`])
//! - One repository per table family, bundled as [`SurrealStore`]

mod connection;
mod error;
pub mod repository;
mod schema;
mod scope;
mod store;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::{run_migrations, schema_v1};
pub use store::SurrealStore;
