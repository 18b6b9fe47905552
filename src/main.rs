// src/main.rs

mod app_logic;
mod core;

use crate::app_logic::{APP_NAME, EditorSession};
use crate::core::{
    ConfigManagerOperations, CoreConfigManager, CoreIconCache, CoreSettingsStore, ProfileRecord,
    path_utils, resolve_settings_store_path,
};
use clap::{Parser, Subcommand};
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

const LOG_FILENAME: &str = "ghub_profile_editor.log";

#[derive(Parser, Debug)]
#[command(name = "ghub_profile_editor")]
#[command(about = "Edit G HUB application profiles and their icons", long_about = None)]
struct Cli {
    /// Path to G HUB's settings.db; defaults to the remembered or standard location.
    #[arg(long)]
    db: Option<PathBuf>,
    /// Remember the --db location for later runs.
    #[arg(long, requires = "db")]
    remember: bool,
    /// Log debug output to the terminal.
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all profiles, sorted by name.
    List,
    /// Show one profile (by identifier or name).
    Show { profile: String },
    /// Add a custom profile.
    Add {
        name: String,
        #[arg(long, default_value = "")]
        path: String,
    },
    Remove { profile: String },
    Rename { profile: String, name: String },
    SetPath { profile: String, path: String },
    /// Convert an image (bmp, ico, png, jpg, jpeg) into the profile's icon.
    SetIcon { profile: String, image: PathBuf },
    ClearIcon { profile: String },
}

fn init_logging(verbose: bool) {
    let config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let term_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        term_level,
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    if let Some(dir) = path_utils::get_base_app_config_local_dir(APP_NAME) {
        let log_path = dir.join(LOG_FILENAME);
        match OpenOptions::new().create(true).append(true).open(&log_path) {
            Ok(file) => loggers.push(WriteLogger::new(LevelFilter::Debug, config, file)),
            Err(e) => eprintln!("Could not open log file {log_path:?}: {e}"),
        }
    }

    if let Err(e) = CombinedLogger::init(loggers) {
        eprintln!("Failed to initialize logging: {e}");
    }
}

fn print_profile(record: &ProfileRecord) {
    println!("id:    {}", record.id());
    println!("name:  {}", record.name());
    println!("path:  {}", record.path());
    match record.icon_ref() {
        Some(icon) => println!("icon:  {icon}"),
        None => println!("icon:  (none)"),
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config_manager = CoreConfigManager::new();
    let db_path = resolve_settings_store_path(cli.db.as_deref(), &config_manager, APP_NAME)
        .ok_or("could not determine where G HUB's settings.db is; pass --db")?;
    log::info!("Main: Using settings store {db_path:?}");

    let store = Arc::new(CoreSettingsStore::new(&db_path));
    let icons = Arc::new(CoreIconCache::for_store(&db_path));
    let mut session = EditorSession::open(store, icons)?;

    if cli.remember {
        config_manager.save_db_path(APP_NAME, &db_path)?;
        println!("Remembered settings store {}", db_path.display());
    }

    match cli.command {
        Command::List => {
            for record in session.profiles().sorted_by_name() {
                let icon = record.icon_ref().map(|i| i.to_string()).unwrap_or_default();
                println!(
                    "{}\t{}\t{}\t{}",
                    record.id(),
                    record.name(),
                    record.path(),
                    icon
                );
            }
            return Ok(());
        }
        Command::Show { profile } => {
            print_profile(session.select(&profile)?);
            return Ok(());
        }
        Command::Add { name, path } => {
            let record = session.add_profile(&name, &path);
            println!("Added {} ({})", record.name(), record.id());
        }
        Command::Remove { profile } => {
            let id = session.resolve(&profile)?.id().to_string();
            session.remove_profile(&id)?;
        }
        Command::Rename { profile, name } => {
            let id = session.resolve(&profile)?.id().to_string();
            session.rename_profile(&id, &name)?;
        }
        Command::SetPath { profile, path } => {
            let id = session.resolve(&profile)?.id().to_string();
            session.set_profile_path(&id, &path)?;
        }
        Command::SetIcon { profile, image } => {
            let id = session.resolve(&profile)?.id().to_string();
            let icon = session.set_icon(&id, &image)?;
            println!("Icon written to {icon}");
        }
        Command::ClearIcon { profile } => {
            let id = session.resolve(&profile)?.id().to_string();
            session.clear_icon(&id)?;
        }
    }

    if session.has_unsaved_changes() {
        session.save()?;
        println!("Saved {}", session.store_path().display());
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // The terminal logger always shows errors.
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
