//! # taskline-store
//!
//! `SQLite` persistence for tasks.
//!
//! - **[`connection`]**: the storage engine. A pooled [`Database`] that runs
//!   each statement in its own scoped connection and transaction, and turns
//!   native failures into [`StorageError`]s.
//! - **[`query`]**: a predicate builder that renders task filters as
//!   parameterized `SELECT` statements.
//! - **[`repository`]**: typed task CRUD on top of the engine.

#![deny(unsafe_code)]

pub mod connection;
pub mod errors;
pub mod query;
pub mod repository;
pub mod schema;

pub use connection::{ConnectionConfig, Database, Executed};
pub use errors::{StorageError, StorageErrorKind, TaskError};
pub use query::TaskQuery;
pub use repository::TaskRepository;
