use crate::core::{
    IconCacheOperations, IconError, IconRef, ProfileModel, ProfileRecord,
    SettingsStoreOperations, StoreError,
};
use std::path::Path;
use std::sync::Arc;

// Application name used for the configuration directory.
pub const APP_NAME: &str = "GHubProfileEditor";

#[derive(Debug)]
pub enum SessionError {
    Store(StoreError),
    Icon(IconError),
    ProfileNotFound(String),
}

impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        SessionError::Store(err)
    }
}

impl From<IconError> for SessionError {
    fn from(err: IconError) -> Self {
        SessionError::Icon(err)
    }
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Store(e) => write!(f, "{e}"),
            SessionError::Icon(e) => write!(f, "{e}"),
            SessionError::ProfileNotFound(key) => write!(f, "Profile not found: {key}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Store(e) => Some(e),
            SessionError::Icon(e) => Some(e),
            SessionError::ProfileNotFound(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;

/*
 * One editing session over one settings store. It owns the profile model and the
 * current selection, and drives the store accessor and the icon cache through
 * their `...Operations` traits so UI front ends and tests can share it.
 *
 * Record edits are held in memory until `save`. Icon changes are written to the
 * cache at once and are not undone by `discard`.
 */
pub struct EditorSession {
    pub(crate) store: Arc<dyn SettingsStoreOperations>,
    pub(crate) icons: Arc<dyn IconCacheOperations>,
    pub(crate) model: ProfileModel,
    pub(crate) selected_profile_id: Option<String>,
}

impl EditorSession {
    /*
     * Opens a session by loading the profile collection from `store`. Fails with
     * `StoreUnavailable` when the store cannot be read; no session exists then.
     */
    pub fn open(
        store: Arc<dyn SettingsStoreOperations>,
        icons: Arc<dyn IconCacheOperations>,
    ) -> Result<Self> {
        log::debug!("EditorSession: Opening store {:?}", store.store_path());
        let collection = store.load()?;
        Ok(EditorSession {
            store,
            icons,
            model: ProfileModel::new(collection),
            selected_profile_id: None,
        })
    }

    pub fn store_path(&self) -> &Path {
        self.store.store_path()
    }

    pub fn profiles(&self) -> &ProfileModel {
        &self.model
    }

    /*
     * Looks a profile up by identifier, then by exact name. Names are not unique;
     * the first match in stored order wins.
     */
    pub fn resolve(&self, key: &str) -> Result<&ProfileRecord> {
        self.model
            .get(key)
            .or_else(|| self.model.find_by_name(key))
            .ok_or_else(|| SessionError::ProfileNotFound(key.to_string()))
    }

    pub fn select(&mut self, key: &str) -> Result<&ProfileRecord> {
        let id = self.resolve(key)?.id().to_string();
        log::trace!("EditorSession: Selected profile '{id}'.");
        self.selected_profile_id = Some(id.clone());
        self.resolve(&id)
    }

    pub fn selected(&self) -> Option<&ProfileRecord> {
        self.selected_profile_id
            .as_deref()
            .and_then(|id| self.model.get(id))
    }

    /// Adds a profile and selects it.
    pub fn add_profile(&mut self, name: &str, path: &str) -> ProfileRecord {
        let record = self.model.add(name, path);
        self.selected_profile_id = Some(record.id().to_string());
        log::info!(
            "EditorSession: Added profile '{}' ({}).",
            record.name(),
            record.id()
        );
        record
    }

    pub fn remove_profile(&mut self, id: &str) -> Result<()> {
        self.ensure_exists(id)?;
        self.model.remove(id);
        if self.selected_profile_id.as_deref() == Some(id) {
            self.selected_profile_id = None;
        }
        log::info!("EditorSession: Removed profile '{id}'.");
        Ok(())
    }

    pub fn rename_profile(&mut self, id: &str, new_name: &str) -> Result<()> {
        self.ensure_exists(id)?;
        self.model.rename(id, new_name);
        log::info!("EditorSession: Renamed profile '{id}' to '{new_name}'.");
        Ok(())
    }

    pub fn set_profile_path(&mut self, id: &str, new_path: &str) -> Result<()> {
        self.ensure_exists(id)?;
        self.model.set_path(id, new_path);
        log::info!("EditorSession: Set path of profile '{id}' to '{new_path}'.");
        Ok(())
    }

    /*
     * Writes the icon to the cache first and records the reference only when
     * that succeeded, so a rejected or failed image leaves the profile as it was.
     */
    pub fn set_icon(&mut self, id: &str, source: &Path) -> Result<IconRef> {
        self.ensure_exists(id)?;
        let icon = self.icons.set_icon(id, source).inspect_err(|e| {
            log::warn!("EditorSession: Icon for '{id}' not changed: {e}");
        })?;
        self.model.set_icon_ref(id, &icon);
        log::info!("EditorSession: Icon of profile '{id}' set to {icon}.");
        Ok(icon)
    }

    pub fn clear_icon(&mut self, id: &str) -> Result<()> {
        self.ensure_exists(id)?;
        self.icons.clear_icon(id)?;
        self.model.clear_icon_ref(id);
        log::info!("EditorSession: Icon of profile '{id}' cleared.");
        Ok(())
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.model.is_modified()
    }

    pub fn save(&mut self) -> Result<()> {
        self.store.save(self.model.collection()).inspect_err(|e| {
            log::error!("EditorSession: Save failed: {e}");
        })?;
        self.model.mark_saved();
        log::info!(
            "EditorSession: Saved {} profiles to {:?}.",
            self.model.len(),
            self.store.store_path()
        );
        Ok(())
    }

    /*
     * Drops unsaved record edits by reloading from the store. The selection is
     * kept when the selected profile still exists.
     */
    pub fn discard(&mut self) -> Result<()> {
        let collection = self.store.load()?;
        self.model = ProfileModel::new(collection);
        let selection_gone = self
            .selected_profile_id
            .as_deref()
            .is_some_and(|id| self.model.get(id).is_none());
        if selection_gone {
            self.selected_profile_id = None;
        }
        log::info!("EditorSession: Discarded unsaved changes.");
        Ok(())
    }

    fn ensure_exists(&self, id: &str) -> Result<()> {
        if self.model.get(id).is_some() {
            Ok(())
        } else {
            Err(SessionError::ProfileNotFound(id.to_string()))
        }
    }
}
