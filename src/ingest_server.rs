//! historysync-ingest: the deduplicating history ingest service.
//!
//! Opens (or creates) the ingest SQLite database and serves the ingest router.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use historysync::database::Database;
use historysync::ingest_handler::{self, IngestState};
use historysync::platform;

/// Ingest service for synced browsing history.
#[derive(Parser, Debug)]
#[command(name = "historysync-ingest", version)]
#[command(about = "Deduplicating ingest service for browsing history", long_about = None)]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "HISTORYSYNC_INGEST_BIND", default_value = "127.0.0.1:8787")]
    bind: String,

    /// SQLite database file. Defaults to `ingest.db` in the data directory.
    #[arg(long, env = "HISTORYSYNC_INGEST_DB")]
    db: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Read before parsing so `.env` can supply the env-backed arguments.
    let dotenv = std::env::var_os("DOTENV_PATH").map_or_else(|| PathBuf::from(".env"), PathBuf::from);
    if dotenv.exists() {
        dotenvy::from_path(&dotenv)?;
    }

    let args = Args::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "historysync=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db_path = args
        .db
        .unwrap_or_else(|| platform::get_data_dir().join("ingest.db"));
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db = Database::open(&db_path)?;
    info!(path = %db_path.display(), "ingest database ready");

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    info!(addr = %listener.local_addr()?, "ingest service listening");

    ingest_handler::serve(listener, IngestState::new(db), shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown requested");
}
