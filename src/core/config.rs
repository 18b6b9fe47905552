/*
 * Manages application-specific configuration settings: the location of the
 * G HUB settings store the user last worked with. The value is kept as a small
 * JSON document in a standard user directory so the store does not have to be
 * located again on every start.
 *
 * It uses a trait-based approach (`ConfigManagerOperations`) to allow for
 * different storage backends or mock implementations for testing. The primary
 * concrete implementation (`CoreConfigManager`) handles file system interactions,
 * utilizing the shared path utility for determining the base configuration
 * directory unless an explicit directory is given.
 */
use crate::core::path_utils;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const DB_LOCATION_CONFIG_FILENAME: &str = "ghub_db_location_config.json";

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Serde(serde_json::Error),
    NoProjectDirectory,
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Serde(err)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Configuration I/O error: {e}"),
            ConfigError::Serde(e) => write!(f, "Configuration file format error: {e}"),
            ConfigError::NoProjectDirectory => {
                write!(f, "Could not determine directory for configuration")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Serde(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Serialize, Deserialize)]
struct DbLocationConfig {
    db_path: PathBuf,
}

pub trait ConfigManagerOperations: Send + Sync {
    fn load_db_path(&self, app_name: &str) -> Result<Option<PathBuf>>;
    fn save_db_path(&self, app_name: &str, db_path: &Path) -> Result<()>;
}

pub struct CoreConfigManager {
    config_dir: Option<PathBuf>,
}

impl CoreConfigManager {
    pub fn new() -> Self {
        CoreConfigManager { config_dir: None }
    }

    /// Keeps the configuration file in `config_dir` instead of the user directory.
    pub fn with_config_dir(config_dir: impl Into<PathBuf>) -> Self {
        CoreConfigManager {
            config_dir: Some(config_dir.into()),
        }
    }

    fn config_file_path(&self, app_name: &str) -> Result<PathBuf> {
        let dir = match &self.config_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                dir.clone()
            }
            None => path_utils::get_base_app_config_local_dir(app_name)
                .ok_or(ConfigError::NoProjectDirectory)?,
        };
        Ok(dir.join(DB_LOCATION_CONFIG_FILENAME))
    }
}

impl Default for CoreConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManagerOperations for CoreConfigManager {
    /*
     * Loads the remembered settings store location. A missing or unreadable file,
     * or one naming a store that no longer exists, yields `None` so the caller
     * falls back to the default location.
     */
    fn load_db_path(&self, app_name: &str) -> Result<Option<PathBuf>> {
        log::trace!("CoreConfigManager: Loading settings store location for app '{app_name}'");
        let file_path = self.config_file_path(app_name)?;

        if !file_path.exists() {
            log::debug!("CoreConfigManager: Config file {file_path:?} does not exist.");
            return Ok(None);
        }

        let reader = BufReader::new(File::open(&file_path)?);
        let config: DbLocationConfig = match serde_json::from_reader(reader) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("CoreConfigManager: Failed to parse config file {file_path:?}: {e}");
                return Ok(None);
            }
        };

        if config.db_path.is_file() {
            log::debug!(
                "CoreConfigManager: Loaded settings store location {:?} from {file_path:?}.",
                config.db_path
            );
            Ok(Some(config.db_path))
        } else {
            log::debug!(
                "CoreConfigManager: Remembered settings store {:?} no longer exists.",
                config.db_path
            );
            Ok(None)
        }
    }

    fn save_db_path(&self, app_name: &str, db_path: &Path) -> Result<()> {
        log::trace!(
            "CoreConfigManager: Saving settings store location {db_path:?} for app '{app_name}'"
        );
        let file_path = self.config_file_path(app_name)?;
        let config = DbLocationConfig {
            db_path: db_path.to_path_buf(),
        };

        let mut writer = BufWriter::new(File::create(&file_path)?);
        serde_json::to_writer_pretty(&mut writer, &config)?;
        writer.flush()?;
        log::debug!("CoreConfigManager: Saved settings store location to {file_path:?}.");
        Ok(())
    }
}

/*
 * Picks the settings store to open: an explicit override wins, then the location
 * remembered in the configuration, then G HUB's default location. Configuration
 * errors are logged and treated as "nothing remembered".
 */
pub fn resolve_settings_store_path(
    override_path: Option<&Path>,
    config_manager: &dyn ConfigManagerOperations,
    app_name: &str,
) -> Option<PathBuf> {
    if let Some(path) = override_path {
        log::debug!("Config: Using settings store override {path:?}.");
        return Some(path.to_path_buf());
    }
    match config_manager.load_db_path(app_name) {
        Ok(Some(path)) => return Some(path),
        Ok(None) => {}
        Err(e) => log::warn!("Config: Could not read remembered settings store location: {e}"),
    }
    let default = path_utils::default_settings_store_path();
    log::debug!("Config: Falling back to default settings store {default:?}.");
    default
}
