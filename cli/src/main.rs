use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use keepsake::config::{ClientConfig, ConfigError, DeploymentMode, StoragePreference};
use keepsake::field_key::{FieldKey, KeyError};
use keepsake::persistence::LocalStore;
use keepsake::sync::{RemoteStore, SyncClient, SyncCoordinator, SyncError, SyncStatus};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid field key: {0}")]
    Key(#[from] KeyError),
    #[error("remote sync failed: {0}")]
    Sync(#[from] SyncError),
    #[error("local storage write failed for {0}")]
    LocalWrite(String),
    #[error("{0} failed; see log output")]
    Remote(&'static str),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "keepsake", about = "Inspect and sync the greeting site's local store")]
struct Cli {
    /// Directory of the durable storage file.
    #[arg(long, env = "KEEPSAKE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// auto, durable, session or memory.
    #[arg(long, env = "KEEPSAKE_STORAGE")]
    storage: Option<StoragePreference>,

    /// Base URL of the remote store (`/data` is appended).
    #[arg(long, env = "KEEPSAKE_REMOTE_URL")]
    remote_url: Option<String>,

    /// development (local only) or production (sync enabled).
    #[arg(long, env = "KEEPSAKE_MODE")]
    mode: Option<DeploymentMode>,

    #[arg(long, env = "KEEPSAKE_MEMORY_SLOTS")]
    memory_slots: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sync state and storage medium.
    Status,
    Get {
        key: String,
    },
    Set {
        key: String,
        value: String,
    },
    Remove {
        key: String,
    },
    /// Everything stored under known keys.
    Snapshot,
    /// Remove every known key.
    Clear,
    /// Load the remote document into local storage.
    Pull,
    /// Replace the remote document with the local snapshot.
    Push,
    Usage,
    /// Check that the remote store answers.
    Ping,
}

impl Cli {
    /// Flags win over the environment-derived config.
    fn client_config(&self) -> Result<ClientConfig, CliError> {
        let mut config = ClientConfig::from_env()?;
        if let Some(mode) = self.mode {
            config = config.with_mode(mode);
        }
        if let Some(preference) = self.storage {
            config.storage.preference = preference;
        }
        if let Some(dir) = &self.data_dir {
            config.storage.data_dir.clone_from(dir);
        }
        if let Some(slots) = self.memory_slots {
            config.storage.memory_slots = slots;
        }
        if let Some(url) = &self.remote_url {
            config.remote.base_url = url.trim_end_matches('/').to_owned();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = cli.client_config()?;

    let local = Arc::new(LocalStore::open(&config.storage));
    let remote: Arc<dyn RemoteStore> = Arc::new(SyncClient::new(&config.remote)?);
    let sync = SyncCoordinator::new(local, remote, config.sync.clone());

    let result = run(&sync, &config, cli.command).await;
    let status = sync.shutdown().await;
    warn_if_pending(&status);
    result
}

async fn run(sync: &SyncCoordinator, config: &ClientConfig, command: Command) -> Result<(), CliError> {
    match command {
        Command::Status => print_json(&json!({
            "medium": sync.local().medium(),
            "mode": config.mode.to_string(),
            "sync": sync.status(),
            "pendingKeys": sync.pending_keys(),
        })),
        Command::Get { key } => {
            match sync.local().get_field_opt(&key) {
                Some(value) => println!("{value}"),
                None => eprintln!("{key}: not set"),
            }
            Ok(())
        }
        Command::Set { key, value } => {
            let key = key.parse::<FieldKey>()?.to_string();
            if !sync.set_item(&key, &value) {
                return Err(CliError::LocalWrite(key));
            }
            Ok(())
        }
        Command::Remove { key } => {
            let key = key.parse::<FieldKey>()?.to_string();
            if !sync.remove_item(&key) {
                return Err(CliError::LocalWrite(key));
            }
            Ok(())
        }
        Command::Snapshot => print_json(&sync.snapshot()),
        Command::Clear => {
            if !sync.clear_all() {
                return Err(CliError::LocalWrite("one or more known keys".to_owned()));
            }
            Ok(())
        }
        Command::Pull => {
            ensure_sync_enabled(sync)?;
            if !sync.force_sync().await {
                return Err(CliError::Remote("pull"));
            }
            print_json(&sync.snapshot())
        }
        Command::Push => {
            ensure_sync_enabled(sync)?;
            if !sync.push_snapshot().await {
                return Err(CliError::Remote("push"));
            }
            eprintln!("pushed local snapshot");
            Ok(())
        }
        Command::Usage => print_json(&sync.usage()),
        Command::Ping => run_ping(config).await,
    }
}

/// Fetch the document even in development mode; ping is always explicit.
async fn run_ping(config: &ClientConfig) -> Result<(), CliError> {
    let mut remote = config.remote.clone();
    remote.enabled = true;
    let client = SyncClient::new(&remote)?;
    let document = client.try_fetch_all().await?;
    println!("ok {} ({} memories)", client.endpoint(), document.memories.len());
    Ok(())
}

fn ensure_sync_enabled(sync: &SyncCoordinator) -> Result<(), CliError> {
    if sync.sync_enabled() { Ok(()) } else { Err(SyncError::Disabled.into()) }
}

fn warn_if_pending(status: &SyncStatus) {
    if status.has_pending {
        eprintln!(
            "warning: {} change(s) not confirmed by the remote store; run `keepsake push` to retry",
            status.pending_count
        );
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
