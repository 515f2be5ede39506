//! project-notes: keep one Obsidian note per Todoist project.
//!
//! Runs the same synchronization pass as the Obsidian plugin command, from
//! the terminal, against a vault on disk.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use project_notes::config::{Config, TOKEN_ENV, apply_env_overrides};
use project_notes::index_service::IndexHandle;
use project_notes::native_fs::NativeFs;
use project_notes::persistence::SettingsStore;
use project_notes::prompt::confirm_use_root;
use project_notes::todoist::TodoistClient;
use project_notes::watcher::FileWatcher;

use project_sync::{NoteIndex, PassReport, Settings, SettingsError, index_scope, run_pass};

#[derive(Parser, Debug)]
#[command(name = "project-notes")]
#[command(about = "Keep Obsidian project notes in step with Todoist projects")]
struct Args {
    /// Path to the vault directory (or PROJECT_NOTES_VAULT)
    #[arg(short, long, global = true)]
    vault: Option<PathBuf>,

    /// Settings file (defaults to <config dir>/project-notes/settings.json)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one synchronization pass
    Sync {
        /// Use the vault root without asking when no note folder is set
        #[arg(short, long)]
        yes: bool,

        /// Print the pass report as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Keep the note index current from file events and sync periodically
    Watch {
        /// Seconds between passes
        #[arg(long, default_value_t = 300)]
        interval: u64,

        /// Use the vault root without asking when no note folder is set
        #[arg(short, long)]
        yes: bool,
    },
    /// Show or edit settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the current settings (API key masked)
    Show,
    /// Set one setting by its key (apikey, notefolder, nested, separator,
    /// deletedProjectHandling, archivefolder, linktasks, templatefile)
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging - respects RUST_LOG env var, defaults to info (or debug with --verbose)
    let default_filter = if args.verbose {
        "debug,project_notes=debug"
    } else {
        "info,project_notes=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::resolve(args.vault, args.settings)?;
    let store = SettingsStore::new(config.settings_path.clone());

    match args.command {
        Command::Sync { yes, json } => sync_once(&config, &store, yes, json).await,
        Command::Watch { interval, yes } => watch(&config, &store, interval, yes).await,
        Command::Config { action } => edit_config(&store, action),
    }
}

/// Load settings, apply the environment, and settle the note folder.
fn load_settings(store: &SettingsStore, assume_yes: bool) -> Result<Settings> {
    let mut settings = store.load()?;
    apply_env_overrides(&mut settings, std::env::var(TOKEN_ENV).ok());

    if let Err(SettingsError::MissingNoteFolder) = settings.validate() {
        let use_root = assume_yes || confirm_use_root(&mut io::stdin().lock(), &mut io::stdout())?;
        if !use_root {
            bail!("No note folder configured; set one with `project-notes config set notefolder <path>`");
        }

        // Persist only the folder; an API key from the environment stays off disk
        let mut stored = store.load()?;
        stored.note_folder = "/".to_string();
        store.save(&stored)?;
        settings.note_folder = stored.note_folder;
        info!("Using the vault root for project notes");
    }

    Ok(settings)
}

async fn sync_once(config: &Config, store: &SettingsStore, assume_yes: bool, json: bool) -> Result<()> {
    let settings = load_settings(store, assume_yes)?;
    let vault = config.vault()?;
    info!("Vault path: {:?}", vault);

    let fs = NativeFs::new(vault.to_path_buf());
    let api = TodoistClient::new(&settings.api_key)?;

    let mut report = PassReport::new();
    let result = run_pass(&fs, &api, &settings, None, &mut report).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if let Err(e) = result {
        error!("Sync failed: {}", e);
        eprintln!("Sync failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn watch(config: &Config, store: &SettingsStore, interval: u64, assume_yes: bool) -> Result<()> {
    // Settings are read once; edits take effect on restart
    let settings = load_settings(store, assume_yes)?;
    settings.validate()?;
    let vault = config.vault()?.to_path_buf();
    info!("Vault path: {:?}", vault);

    let fs = Arc::new(NativeFs::new(vault.clone()));
    let api = TodoistClient::new(&settings.api_key)?;

    let scope = index_scope(&settings);
    let initial = NoteIndex::scan(fs.as_ref(), &scope)
        .await
        .with_context(|| format!("Failed to scan note folder '{}'", settings.note_folder))?;
    info!("Indexed {} projects", initial.len());
    let (index, index_task) = IndexHandle::spawn(Arc::clone(&fs), scope, initial);

    let mut watcher = FileWatcher::new(vault)?;
    info!("File watcher started");

    let mut ticker = tokio::time::interval(Duration::from_secs(interval.max(1)));
    // One listener for the whole loop, so a Ctrl+C during a pass is not lost
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    info!("Watching. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            Some(event) = watcher.event_rx().recv() => {
                index.apply(event)?;
            }

            _ = ticker.tick() => {
                let snapshot = index.snapshot().await?;
                let mut report = PassReport::new();
                match run_pass(fs.as_ref(), &api, &settings, Some(snapshot), &mut report).await {
                    Ok(reconciled) => index.replace(reconciled)?,
                    Err(e) => error!("Sync failed: {}", e),
                }
                print_report(&report);
            }

            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    drop(index);
    index_task.await?;
    info!("Shutting down");
    Ok(())
}

fn edit_config(store: &SettingsStore, action: ConfigAction) -> Result<()> {
    let mut settings = store.load()?;

    match action {
        ConfigAction::Show => {
            let mut shown = settings.clone();
            if !shown.api_key.is_empty() {
                shown.api_key = "********".to_string();
            }
            println!("# {}", store.path().display());
            println!("{}", serde_json::to_string_pretty(&shown)?);
        }
        ConfigAction::Set { key, value } => {
            settings.set(&key, &value)?;
            if let Some(warning) = settings.separator_warning() {
                warn!("{}", warning);
                eprintln!("Warning: {}", warning);
            }
            match settings.validate() {
                // Incomplete settings are fine while editing them one key at a time
                Ok(())
                | Err(SettingsError::MissingApiKey)
                | Err(SettingsError::MissingNoteFolder) => {}
                Err(e) => bail!(e),
            }
            store.save(&settings)?;
            println!("Saved {} to {}", key, store.path().display());
        }
    }

    Ok(())
}

fn print_report(report: &PassReport) {
    for notice in report.notices() {
        println!("{}", notice);
    }
    println!("{}", report.summary());
}
