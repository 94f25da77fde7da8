//! # taskline-core
//!
//! Core types shared by every taskline crate: the [`Task`] record, the
//! create/patch/filter parameter types, and the pure validation functions
//! that guard the task invariants. Nothing in here performs I/O.

#![deny(unsafe_code)]

pub mod errors;
pub mod task;
pub mod validation;

pub use errors::ValidationError;
pub use task::{NewTask, Task, TaskFilter, TaskId, TaskPatch};
pub use validation::{validate_description, validate_due_date, validate_title};
