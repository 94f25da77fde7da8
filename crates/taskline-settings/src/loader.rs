//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`TasklineSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over the defaults
//! 3. Apply `TASKLINE_*` environment overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::{LogFormat, TasklineSettings};

/// An environment override that failed to parse and was skipped.
///
/// Settings are usually resolved before logging is installed, so callers
/// report these once a subscriber exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedOverride {
    /// Variable name, e.g. `TASKLINE_PORT`.
    pub key: &'static str,
    /// The raw value that was rejected.
    pub value: String,
}

impl fmt::Display for RejectedOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} value {:?}, ignoring", self.key, self.value)
    }
}

/// Resolved settings plus any overrides that were skipped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedSettings {
    /// The effective settings.
    pub settings: TasklineSettings,
    /// Overrides ignored because they did not parse.
    pub rejected: Vec<RejectedOverride>,
}

/// `~/.taskline`, or `/tmp/.taskline` when `HOME` is unset.
pub fn taskline_home() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".taskline")
}

/// Resolve the path to the settings file (`~/.taskline/settings.json`).
pub fn settings_path() -> PathBuf {
    taskline_home().join("settings.json")
}

/// Load settings from `path`, then apply `TASKLINE_*` overrides read through
/// `lookup` (normally `std::env::var`).
///
/// A missing file yields defaults; a file with invalid JSON is an error.
pub fn load_settings_with<F>(path: &Path, lookup: F) -> Result<LoadedSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = read_settings_file(path)?;
    let rejected = apply_overrides(&mut settings, lookup);
    Ok(LoadedSettings { settings, rejected })
}

/// Defaults merged with the file at `path`, without env overrides.
pub fn read_settings_file(path: &Path) -> Result<TasklineSettings> {
    let defaults = serde_json::to_value(TasklineSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply overrides read through `lookup`.
///
/// Empty values are treated as unset. Values that fail to parse leave the
/// file/default value in place and are returned to the caller.
pub fn apply_overrides<F>(settings: &mut TasklineSettings, lookup: F) -> Vec<RejectedOverride>
where
    F: Fn(&str) -> Option<String>,
{
    let read = |name: &str| lookup(name).filter(|v| !v.is_empty());
    let mut rejected = Vec::new();
    let mut reject = |key: &'static str, value: String| {
        rejected.push(RejectedOverride { key, value });
    };

    if let Some(v) = read("TASKLINE_DB_PATH") {
        settings.database.path = PathBuf::from(v);
    }
    if let Some(v) = read("TASKLINE_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read("TASKLINE_PORT") {
        match parse_u16_range(&v, 1, u16::MAX) {
            Some(port) => settings.server.port = port,
            None => reject("TASKLINE_PORT", v),
        }
    }
    if let Some(v) = read("TASKLINE_LOG_LEVEL") {
        match parse_level(&v) {
            Some(level) => settings.logging.level = level,
            None => reject("TASKLINE_LOG_LEVEL", v),
        }
    }
    if let Some(v) = read("TASKLINE_LOG_FORMAT") {
        match LogFormat::parse(&v) {
            Some(format) => settings.logging.format = format,
            None => reject("TASKLINE_LOG_FORMAT", v),
        }
    }
    if let Some(v) = read("TASKLINE_LOG_FILE") {
        settings.logging.file = Some(PathBuf::from(v));
    }
    rejected
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a `u16` within an inclusive range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Normalize a log level name (`trace` through `error`, or `off`).
pub fn parse_level(val: &str) -> Option<String> {
    let level = val.trim().to_lowercase();
    matches!(
        level.as_str(),
        "trace" | "debug" | "info" | "warn" | "error" | "off"
    )
    .then_some(level)
}
