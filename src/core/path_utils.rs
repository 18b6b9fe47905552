/*
 * This module provides utility functions for path manipulation, focusing on
 * retrieving and ensuring the existence of application-specific directories, and
 * on locating G HUB's settings store in its default place.
 */
use directories::{BaseDirs, ProjectDirs};
use std::fs;
use std::path::PathBuf;

const GHUB_DATA_DIR_NAME: &str = "LGHUB";
pub const SETTINGS_STORE_FILENAME: &str = "settings.db";

/*
 * Retrieves the application's primary local configuration directory.
 * This function determines the platform-specific path for local (non-roaming)
 * application configuration data. It ensures the directory exists, creating it
 * if necessary (e.g. AppData/Local/<app_name> on Windows).
 *
 * Returns `None` if the directory could not be determined or created.
 */
pub fn get_base_app_config_local_dir(app_name: &str) -> Option<PathBuf> {
    log::trace!("PathUtils: Attempting to get base app config local dir for '{app_name}'");
    ProjectDirs::from("", "", app_name).and_then(|proj_dirs| {
        let config_path = proj_dirs.config_local_dir();
        if !config_path.exists() {
            if let Err(e) = fs::create_dir_all(config_path) {
                log::error!(
                    "PathUtils: Failed to create base app config directory {config_path:?}: {e}"
                );
                return None;
            }
            log::debug!("PathUtils: Created base app config directory: {config_path:?}");
        }
        Some(config_path.to_path_buf())
    })
}

/// Where G HUB keeps `settings.db` for the current user, e.g. `AppData/Local/LGHUB`.
pub fn default_settings_store_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| {
        dirs.data_local_dir()
            .join(GHUB_DATA_DIR_NAME)
            .join(SETTINGS_STORE_FILENAME)
    })
}
