//! # taskline-settings
//!
//! Layered configuration for taskline.
//!
//! Settings are resolved from three layers (in priority order):
//! 1. **Compiled defaults**: [`TasklineSettings::default()`]
//! 2. **User file**: `~/.taskline/settings.json`, deep-merged over defaults
//! 3. **Environment variables**: `TASKLINE_*` overrides
//!
//! Command-line flags are applied on top by the binary.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    LoadedSettings, RejectedOverride, apply_overrides, deep_merge, load_settings_with,
    settings_path, taskline_home,
};
pub use types::{DatabaseSettings, LogFormat, LoggingSettings, ServerSettings, TasklineSettings};
