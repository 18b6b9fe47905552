/*
 * This module holds the in-memory profile model for an editing session. It keeps
 * the collection as last loaded (or saved) next to the working copy that the user
 * mutates, so callers can tell whether there are unsaved edits.
 *
 * The model never touches the disk. Icon cache files are managed by
 * `icon_cache`; callers update the icon reference here in lockstep.
 */
use super::models::{IconRef, ProfileCollection, ProfileRecord};

#[derive(Debug, Clone, Default)]
pub struct ProfileModel {
    baseline: ProfileCollection,
    current: ProfileCollection,
}

impl ProfileModel {
    pub fn new(collection: ProfileCollection) -> Self {
        ProfileModel {
            baseline: collection.clone(),
            current: collection,
        }
    }

    /// Appends a new record with a fresh identifier and an empty icon reference.
    pub fn add(&mut self, name: &str, path: &str) -> ProfileRecord {
        let record = ProfileRecord::new(name, path);
        log::debug!(
            "ProfileModel: Added profile '{}' with id '{}'.",
            record.name(),
            record.id()
        );
        self.current.records_mut().push(record.clone());
        record
    }

    /// Removes the record; unknown identifiers are ignored.
    pub fn remove(&mut self, id: &str) -> bool {
        let records = self.current.records_mut();
        let before = records.len();
        records.retain(|r| r.id() != id);
        let removed = records.len() != before;
        if removed {
            log::debug!("ProfileModel: Removed profile '{id}'.");
        } else {
            log::trace!("ProfileModel: Remove ignored, no profile '{id}'.");
        }
        removed
    }

    pub fn rename(&mut self, id: &str, new_name: &str) -> bool {
        self.update(id, |record| record.set_name(new_name))
    }

    pub fn set_path(&mut self, id: &str, new_path: &str) -> bool {
        self.update(id, |record| record.set_path(new_path))
    }

    pub fn set_icon_ref(&mut self, id: &str, icon: &IconRef) -> bool {
        self.update(id, |record| record.set_icon_ref(Some(icon)))
    }

    pub fn clear_icon_ref(&mut self, id: &str) -> bool {
        self.update(id, |record| record.set_icon_ref(None))
    }

    pub fn get(&self, id: &str) -> Option<&ProfileRecord> {
        self.current.records().iter().find(|r| r.id() == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&ProfileRecord> {
        self.current.records().iter().find(|r| r.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProfileRecord> {
        self.current.records().iter()
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /*
     * Returns the records ordered by name, case-insensitively, for display.
     * The stored order is not affected.
     */
    pub fn sorted_by_name(&self) -> Vec<&ProfileRecord> {
        let mut sorted: Vec<&ProfileRecord> = self.current.records().iter().collect();
        sorted.sort_by_key(|r| r.name().to_lowercase());
        sorted
    }

    pub fn collection(&self) -> &ProfileCollection {
        &self.current
    }

    pub fn is_modified(&self) -> bool {
        self.current != self.baseline
    }

    // Called after a successful save.
    pub fn mark_saved(&mut self) {
        self.baseline = self.current.clone();
    }

    fn update(&mut self, id: &str, apply: impl FnOnce(&mut ProfileRecord)) -> bool {
        match self.current.records_mut().iter_mut().find(|r| r.id() == id) {
            Some(record) => {
                apply(record);
                log::trace!("ProfileModel: Updated profile '{id}'.");
                true
            }
            None => {
                log::debug!("ProfileModel: No profile '{id}' to update.");
                false
            }
        }
    }
}
