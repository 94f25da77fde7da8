//! # taskline-server
//!
//! HTTP surface for the task repository.
//!
//! - `GET/POST /tasks`, `GET/PATCH/DELETE /tasks/{id}`, `GET /tasks/status/{is_completed}`
//! - `GET /health`
//! - Errors as `{"error": CODE, "message": text}` (see [`error`])
//! - Graceful shutdown driven by a caller-supplied future

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod health;
pub mod routes;
pub mod server;

pub use config::ServerConfig;
pub use error::ApiError;
pub use server::{AppState, build_router, serve};
