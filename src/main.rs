//! historysync: syncs Safari browsing history to an ingest service.
//!
//! `run` polls on an interval, `once` runs a single cycle, and the `export`
//! commands write local snapshots without touching the network.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use historysync::app::SyncApp;
use historysync::managers::sync_state_manager::{SyncStateManager, SyncStateManagerTrait};
use historysync::platform;
use historysync::services::exporter;
use historysync::services::history_reader::SafariHistoryStore;
use historysync::services::normalizer;
use historysync::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use historysync::types::export::ExtractionReport;

#[derive(Parser, Debug)]
#[command(name = "historysync", version)]
#[command(about = "Sync Safari browsing history to an ingest service", long_about = None)]
struct Cli {
    /// Settings file. Defaults to `settings.json` in the data directory.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Path to .env file (optional).
    #[arg(long, global = true, default_value = ".env")]
    env_file: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the history store periodically (default).
    Run,
    /// Run a single sync cycle and exit.
    Once,
    /// Forget sync progress so the next cycle sends the full history.
    Reset,
    /// Write local snapshots of the history store.
    #[command(subcommand)]
    Export(ExportCommand),
    /// Inspect or change the settings file.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
enum ExportCommand {
    /// Every normalized event as a JSON array.
    Json { out: PathBuf },
    /// `visitedAt,title,url` rows.
    Csv { out: PathBuf },
    /// The most recent events, pretty-printed to stdout.
    Formatted {
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
    /// Dump every supported Safari data source into `out_dir`.
    All {
        out_dir: PathBuf,
        /// Safari data directory. Defaults to `~/Library/Safari`.
        #[arg(long)]
        safari_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the effective settings, environment overrides included.
    Show,
    /// Set one key in the settings file. The value is parsed as JSON when possible.
    Set { key: String, value: String },
    /// Restore the settings file to defaults.
    Reset,
    /// Print the settings file location.
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.env_file.exists() {
        dotenvy::from_path(&cli.env_file)
            .with_context(|| format!("failed to load {}", cli.env_file.display()))?;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "historysync=info".into()),
        )
        .init();

    let mut engine = SettingsEngine::new(cli.settings);
    let settings = engine.load().context("failed to load settings")?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let app = SyncApp::from_settings(&settings)?;
            app.run(async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await;
        }
        Command::Once => {
            let app = SyncApp::from_settings(&settings)?;
            let report = app.run_once().await?;
            println!("{}", serde_json::to_string_pretty(&serde_json::json!({
                "firstRun": report.first_run,
                "normalized": report.normalized,
                "selected": report.selected,
                "inserted": report.inserted,
            }))?);
        }
        Command::Reset => {
            let manager = SyncStateManager::new(settings.state_path.clone());
            manager.reset()?;
            info!(path = %manager.path().display(), "sync state cleared");
        }
        Command::Export(export) => {
            let store = SafariHistoryStore::new(settings.history_db.clone());
            match export {
                ExportCommand::Json { out } => {
                    let events = normalizer::normalize_source(&store)?;
                    exporter::write_json(&out, &events)?;
                }
                ExportCommand::Csv { out } => {
                    let events = normalizer::normalize_source(&store)?;
                    exporter::write_csv(&out, &events)?;
                }
                ExportCommand::Formatted { limit } => {
                    let events = normalizer::normalize_source(&store)?;
                    let shown = &events[..events.len().min(limit)];
                    println!("{}", serde_json::to_string_pretty(shown)?);
                }
                ExportCommand::All {
                    out_dir,
                    safari_dir,
                } => {
                    let safari_dir = safari_dir.unwrap_or_else(platform::get_safari_dir);
                    let reports =
                        exporter::export_all(&exporter::default_tasks(&safari_dir), &out_dir);
                    for report in &reports {
                        match report {
                            ExtractionReport::Written { name, output } => {
                                println!("{}: {}", name, output.display())
                            }
                            ExtractionReport::Failed { name, reason } => {
                                println!("{}: failed ({})", name, reason)
                            }
                        }
                    }
                    let failed = reports.iter().filter(|r| !r.is_success()).count();
                    if failed > 0 {
                        warn!(failed, total = reports.len(), "some extractions failed");
                    }
                }
            }
        }
        Command::Config(config) => match config {
            ConfigCommand::Show => println!("{}", serde_json::to_string_pretty(&settings)?),
            ConfigCommand::Set { key, value } => {
                let parsed = serde_json::from_str(&value)
                    .unwrap_or(serde_json::Value::String(value));
                engine.set_value(&key, parsed)?;
                info!(key = %key, path = %engine.get_config_path().display(), "setting saved");
            }
            ConfigCommand::Reset => {
                engine.reset()?;
                info!(path = %engine.get_config_path().display(), "settings reset");
            }
            ConfigCommand::Path => println!("{}", engine.get_config_path().display()),
        },
    }

    Ok(())
}
