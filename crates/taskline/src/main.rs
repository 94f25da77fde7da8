//! # taskline
//!
//! Task tracking over `SQLite`. Wires settings, logging, and storage together
//! and runs one of three front ends: the HTTP server, the interactive menu,
//! or a one-shot CSV export.

#![deny(unsafe_code)]

mod export;
mod menu;

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use taskline_server::{AppState, ServerConfig};
use taskline_settings::{LoadedSettings, TasklineSettings};
use taskline_store::{ConnectionConfig, Database, TaskRepository};
use taskline_telemetry::TelemetryConfig;

/// Task tracking over `SQLite`.
#[derive(Parser, Debug)]
#[command(name = "taskline", version, about = "Task tracking over SQLite")]
struct Cli {
    /// Path to the `SQLite` database (overrides settings).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Settings file (default `~/.taskline/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Serve the HTTP API.
    Serve {
        /// Host to bind (overrides settings).
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (overrides settings).
        #[arg(long)]
        port: Option<u16>,
    },
    /// Interactive menu (the default).
    Menu,
    /// Write every task to a CSV file.
    Export {
        /// Destination file.
        file: PathBuf,
    },
}

impl Cli {
    /// Settings from file and env, with command-line flags applied last.
    fn resolve_settings(&self) -> Result<LoadedSettings> {
        self.resolve_settings_with(|name| std::env::var(name).ok())
    }

    fn resolve_settings_with<F>(&self, lookup: F) -> Result<LoadedSettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = self
            .settings
            .clone()
            .unwrap_or_else(taskline_settings::settings_path);
        let mut loaded = taskline_settings::load_settings_with(&path, lookup)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?;
        let settings = &mut loaded.settings;

        if let Some(db) = &self.db {
            settings.database.path.clone_from(db);
        }
        if let Some(Command::Serve { host, port }) = &self.command {
            if let Some(host) = host {
                settings.server.host.clone_from(host);
            }
            if let Some(port) = port {
                settings.server.port = *port;
            }
        }
        Ok(loaded)
    }
}

fn open_repository(settings: &TasklineSettings) -> Result<TaskRepository> {
    let config = ConnectionConfig {
        pool_size: settings.database.pool_size.max(1),
        busy_timeout_ms: settings.database.busy_timeout_ms,
        ..ConnectionConfig::default()
    };
    let path = &settings.database.path;
    let db = Database::open(path, &config)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    db.ensure_schema().context("Failed to create schema")?;
    Ok(TaskRepository::new(db))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let LoadedSettings { settings, rejected } = cli.resolve_settings()?;

    let _telemetry = taskline_telemetry::init_telemetry(&TelemetryConfig::from(&settings.logging));
    for skipped in &rejected {
        tracing::warn!(key = skipped.key, value = %skipped.value, "invalid env override, ignoring");
    }

    let repo = open_repository(&settings)?;

    match cli.command.unwrap_or(Command::Menu) {
        Command::Serve { .. } => {
            let config = ServerConfig {
                host: settings.server.host.clone(),
                port: settings.server.port,
            };
            taskline_server::serve(&config, AppState::new(repo), shutdown_signal())
                .await
                .with_context(|| format!("Server failed on {}", config.bind_addr()))?;
        }
        Command::Menu => {
            tokio::task::spawn_blocking(move || {
                let mut session = menu::Menu::new(repo, io::stdin().lock(), io::stdout().lock());
                session.run()
            })
            .await
            .context("Menu task failed")??;
        }
        Command::Export { file } => {
            let outcome = tokio::task::spawn_blocking({
                let file = file.clone();
                move || export::export_tasks(&repo, &file)
            })
            .await
            .context("Export task failed")??;
            println!("{}", outcome.message(&file));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("taskline").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn no_subcommand_means_menu() {
        assert_eq!(parse(&[]).command, None);
    }

    #[test]
    fn serve_flags_parse() {
        let cli = parse(&["serve", "--host", "0.0.0.0", "--port", "9000"]);
        assert_eq!(
            cli.command,
            Some(Command::Serve {
                host: Some("0.0.0.0".into()),
                port: Some(9000),
            })
        );
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = parse(&["export", "out.csv", "--db", "/tmp/t.db"]);
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/t.db")));
        assert_eq!(
            cli.command,
            Some(Command::Export {
                file: PathBuf::from("out.csv")
            })
        );
    }

    #[test]
    fn cli_flags_override_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings_file = dir.path().join("settings.json");
        std::fs::write(
            &settings_file,
            r#"{"server": {"host": "10.0.0.1", "port": 7000}, "database": {"path": "/from/file.db"}}"#,
        )
        .unwrap();
        let settings_arg = settings_file.to_str().unwrap();

        let cli = parse(&["--settings", settings_arg, "--db", "/from/flag.db", "serve", "--port", "9100"]);
        let settings = cli.resolve_settings_with(|_| None).unwrap().settings;
        assert_eq!(settings.database.path, PathBuf::from("/from/flag.db"));
        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.server.host, "10.0.0.1");
    }

    #[test]
    fn flags_beat_env_and_bad_env_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let cli = parse(&[
            "--settings",
            dir.path().join("absent.json").to_str().unwrap(),
            "serve",
            "--host",
            "10.1.1.1",
        ]);
        let loaded = cli
            .resolve_settings_with(|name| match name {
                "TASKLINE_HOST" => Some("0.0.0.0".into()),
                "TASKLINE_PORT" => Some("not-a-port".into()),
                _ => None,
            })
            .unwrap();
        assert_eq!(loaded.settings.server.host, "10.1.1.1");
        assert_eq!(loaded.settings.server.port, 8000);
        assert_eq!(loaded.rejected.len(), 1);
        assert_eq!(loaded.rejected[0].key, "TASKLINE_PORT");
    }

    #[test]
    fn invalid_settings_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let settings_file = dir.path().join("settings.json");
        std::fs::write(&settings_file, "{ nope").unwrap();
        let cli = parse(&["--settings", settings_file.to_str().unwrap()]);
        assert!(cli.resolve_settings().is_err());
    }

    #[test]
    fn open_repository_creates_schema_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = TasklineSettings::default();
        settings.database.path = dir.path().join("nested").join("tasks.db");

        let repo = open_repository(&settings).unwrap();
        assert_eq!(repo.count().unwrap(), 0);
        assert!(settings.database.path.exists());
    }
}
