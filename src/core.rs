/*
 * This module consolidates the core, platform-agnostic logic of the application.
 * It re-exports the profile data structures and the core functionalities
 * (including abstractions like `SettingsStoreOperations`, `IconCacheOperations`
 * and `ConfigManagerOperations`) for reading and writing the G HUB settings
 * store, managing the icon cache, and remembering where the store lives.
 */
pub mod config;
pub mod icon_cache;
pub mod models;
pub mod path_utils;
pub mod profiles;
pub mod settings_store;

// Re-export key structures
pub use models::{IconRef, ProfileCollection, ProfileRecord};

pub use profiles::ProfileModel;

// Re-export settings store related items
pub use settings_store::{CoreSettingsStore, SettingsStoreOperations, StoreError};

// Re-export icon cache related items
pub use icon_cache::{CoreIconCache, IconCacheOperations, IconError};

// Re-export config related items
pub use config::{ConfigManagerOperations, CoreConfigManager, resolve_settings_store_path};
