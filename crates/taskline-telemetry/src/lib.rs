//! # taskline-telemetry
//!
//! Logging for the taskline binary. [`init_telemetry`] installs a global
//! `tracing` subscriber writing to stderr and, optionally, to a daily-rotated
//! file. The returned [`TelemetryGuard`] must be held for the life of the
//! process: dropping it flushes buffered file output.

#![deny(unsafe_code)]

use std::path::{Path, PathBuf};

use taskline_settings::{LogFormat, LoggingSettings};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Configuration for the logging subsystem.
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    /// Default filter directive. Overridden by `RUST_LOG`.
    pub level: String,
    /// Line format for every sink.
    pub format: LogFormat,
    /// Optional log file; rotated daily, with the date appended to the name.
    pub file: Option<PathBuf>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self::from(&LoggingSettings::default())
    }
}

impl From<&LoggingSettings> for TelemetryConfig {
    fn from(settings: &LoggingSettings) -> Self {
        Self {
            level: settings.level.clone(),
            format: settings.format,
            file: settings.file.clone(),
        }
    }
}

/// Keeps the file writer alive. Flushes on drop.
#[derive(Debug)]
pub struct TelemetryGuard {
    file_guard: Option<WorkerGuard>,
    installed: bool,
}

impl TelemetryGuard {
    /// Whether this call installed the global subscriber. `false` when one
    /// was already set, in which case the call changed nothing.
    pub fn is_installed(&self) -> bool {
        self.installed
    }

    /// Whether a file sink is active.
    pub fn has_file_sink(&self) -> bool {
        self.file_guard.is_some()
    }
}

/// Initialize logging. Call once at startup.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryGuard {
    let (layers, file_guard) = build_layers(config);
    let installed = tracing_subscriber::registry().with(layers).try_init().is_ok();
    if installed {
        tracing::debug!(level = %config.level, format = ?config.format, "telemetry initialized");
    }
    TelemetryGuard {
        file_guard: installed.then_some(file_guard).flatten(),
        installed,
    }
}

/// Build the sink layers without installing them.
fn build_layers(config: &TelemetryConfig) -> (Vec<BoxedLayer>, Option<WorkerGuard>) {
    let mut layers = vec![
        format_layer(config.format, std::io::stderr, true)
            .with_filter(env_filter(&config.level))
            .boxed(),
    ];

    let mut file_guard = None;
    if let Some(path) = &config.file {
        match file_appender(path) {
            Ok(appender) => {
                let (writer, guard) = tracing_appender::non_blocking(appender);
                layers.push(
                    format_layer(config.format, writer, false)
                        .with_filter(env_filter(&config.level))
                        .boxed(),
                );
                file_guard = Some(guard);
            }
            Err(e) => {
                eprintln!("taskline-telemetry: failed to open log file {}: {e}", path.display());
            }
        }
    }

    (layers, file_guard)
}

fn format_layer<W>(format: LogFormat, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_span_list(true)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_ansi(ansi)
            .with_writer(writer)
            .boxed(),
    }
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

fn file_appender(path: &Path) -> Result<RollingFileAppender, String> {
    let prefix = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| "log file path has no file name".to_string())?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .build(dir)
        .map_err(|e| e.to_string())
}
