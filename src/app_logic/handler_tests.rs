use super::handler::{EditorSession, SessionError};

use crate::core::{
    CoreIconCache, CoreSettingsStore, IconCacheOperations, IconError, IconRef,
    ProfileCollection, ProfileRecord, SettingsStoreOperations, StoreError,
};

use serde_json::{Map, json};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/*
 * This module contains unit tests for `EditorSession` from the `super::handler`
 * module. It utilizes mock implementations of the store accessor and the icon
 * cache to isolate the session's behavior, plus one end-to-end flow over a real
 * SQLite store and cache directory.
 */

// --- Mock Structures (SettingsStore, IconCache) ---
struct MockSettingsStore {
    stored: Mutex<ProfileCollection>,
    load_fails: Mutex<bool>,
    save_rejects: Mutex<bool>,
    save_calls: Mutex<Vec<ProfileCollection>>,
    path: PathBuf,
}

impl MockSettingsStore {
    fn new(collection: ProfileCollection) -> Self {
        MockSettingsStore {
            stored: Mutex::new(collection),
            load_fails: Mutex::new(false),
            save_rejects: Mutex::new(false),
            save_calls: Mutex::new(Vec::new()),
            path: PathBuf::from("/mock/LGHUB/settings.db"),
        }
    }
    fn set_load_fails(&self, fails: bool) {
        *self.load_fails.lock().unwrap() = fails;
    }
    fn set_save_rejects(&self, rejects: bool) {
        *self.save_rejects.lock().unwrap() = rejects;
    }
    fn get_save_calls(&self) -> Vec<ProfileCollection> {
        self.save_calls.lock().unwrap().clone()
    }
}

impl SettingsStoreOperations for MockSettingsStore {
    fn load(&self) -> Result<ProfileCollection, StoreError> {
        if *self.load_fails.lock().unwrap() {
            return Err(StoreError::StoreUnavailable("mocked missing store".into()));
        }
        Ok(self.stored.lock().unwrap().clone())
    }
    fn save(&self, collection: &ProfileCollection) -> Result<(), StoreError> {
        if *self.save_rejects.lock().unwrap() {
            return Err(StoreError::WriteRejected("mocked busy store".into()));
        }
        self.save_calls.lock().unwrap().push(collection.clone());
        *self.stored.lock().unwrap() = collection.clone();
        Ok(())
    }
    fn store_path(&self) -> &Path {
        &self.path
    }
}
// --- End MockSettingsStore ---

struct MockIconCache {
    files: Mutex<HashSet<String>>,
    fail_writes: Mutex<bool>,
}

impl MockIconCache {
    fn new() -> Self {
        MockIconCache {
            files: Mutex::new(HashSet::new()),
            fail_writes: Mutex::new(false),
        }
    }
    fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().unwrap() = fail;
    }
    fn has_icon(&self, id: &str) -> bool {
        self.files.lock().unwrap().contains(id)
    }
}

impl IconCacheOperations for MockIconCache {
    fn set_icon(&self, profile_id: &str, source: &Path) -> Result<IconRef, IconError> {
        if source.extension().and_then(|e| e.to_str()) == Some("gif") {
            return Err(IconError::UnsupportedFormat(source.display().to_string()));
        }
        if *self.fail_writes.lock().unwrap() {
            return Err(IconError::AssetWriteFailed("mocked disk full".into()));
        }
        self.files.lock().unwrap().insert(profile_id.to_string());
        Ok(IconRef::new(self.icon_path(profile_id).to_string_lossy()))
    }
    fn clear_icon(&self, profile_id: &str) -> Result<(), IconError> {
        self.files.lock().unwrap().remove(profile_id);
        Ok(())
    }
    fn icon_path(&self, profile_id: &str) -> PathBuf {
        PathBuf::from(format!("/mock/LGHUB/icon_cache/{profile_id}.bmp"))
    }
}
// --- End MockIconCache ---

fn record(id: &str, name: &str, path: &str, poster: &str) -> ProfileRecord {
    let mut fields = Map::new();
    fields.insert("applicationId".into(), json!(id));
    fields.insert("name".into(), json!(name));
    fields.insert("applicationPath".into(), json!(path));
    fields.insert("posterPath".into(), json!(poster));
    ProfileRecord::from_stored(fields)
}

fn setup_session(
    records: Vec<ProfileRecord>,
) -> (EditorSession, Arc<MockSettingsStore>, Arc<MockIconCache>) {
    let store = Arc::new(MockSettingsStore::new(ProfileCollection::from_records(
        records,
    )));
    let icons = Arc::new(MockIconCache::new());
    let session = EditorSession::open(store.clone(), icons.clone()).expect("session should open");
    (session, store, icons)
}

fn gaming() -> ProfileRecord {
    record("1", "Gaming", r"C:\Games\app.exe", "")
}

#[test]
fn test_open_fails_when_store_unavailable() {
    let store = Arc::new(MockSettingsStore::new(ProfileCollection::new()));
    store.set_load_fails(true);

    let result = EditorSession::open(store, Arc::new(MockIconCache::new()));

    assert!(matches!(
        result,
        Err(SessionError::Store(StoreError::StoreUnavailable(_)))
    ));
}

#[test]
fn test_rename_then_save_persists_only_the_name() {
    // Arrange
    let (mut session, store, _icons) = setup_session(vec![gaming()]);

    // Act
    session.rename_profile("1", "FPS").unwrap();
    assert!(session.has_unsaved_changes());
    session.save().unwrap();

    // Assert
    let saves = store.get_save_calls();
    assert_eq!(saves.len(), 1);
    let saved = &saves[0].records()[0];
    assert_eq!(saved.name(), "FPS");
    assert_eq!(saved.path(), r"C:\Games\app.exe");
    assert!(saved.icon_ref().is_none());
    assert!(!session.has_unsaved_changes());
}

#[test]
fn test_edits_are_not_persisted_before_save() {
    let (mut session, store, _icons) = setup_session(vec![gaming()]);

    session.set_profile_path("1", r"D:\Games\app.exe").unwrap();
    session.add_profile("Editor", "");

    assert!(store.get_save_calls().is_empty());
    assert_eq!(store.load().unwrap().len(), 1);
}

#[test]
fn test_add_profile_selects_new_entry() {
    let (mut session, _store, _icons) = setup_session(vec![gaming()]);

    let added = session.add_profile("New Entry", "");

    assert_eq!(session.selected().map(|r| r.id()), Some(added.id()));
    assert_eq!(session.profiles().len(), 2);
}

#[test]
fn test_remove_selected_profile_clears_selection() {
    let (mut session, _store, _icons) = setup_session(vec![gaming()]);
    session.select("Gaming").unwrap();

    session.remove_profile("1").unwrap();

    assert!(session.selected().is_none());
    assert!(session.profiles().is_empty());
}

#[test]
fn test_operations_on_unknown_profile_report_not_found() {
    let (mut session, _store, icons) = setup_session(vec![gaming()]);

    assert!(matches!(
        session.remove_profile("nope"),
        Err(SessionError::ProfileNotFound(_))
    ));
    assert!(matches!(
        session.rename_profile("nope", "x"),
        Err(SessionError::ProfileNotFound(_))
    ));
    assert!(matches!(
        session.set_icon("nope", Path::new("a.png")),
        Err(SessionError::ProfileNotFound(_))
    ));
    assert!(!icons.has_icon("nope"));
    assert!(!session.has_unsaved_changes());
}

#[test]
fn test_set_icon_updates_reference_after_cache_write() {
    let (mut session, _store, icons) = setup_session(vec![gaming()]);

    let icon = session.set_icon("1", Path::new("logo.png")).unwrap();

    assert!(icons.has_icon("1"));
    assert_eq!(session.resolve("1").unwrap().icon_ref(), Some(icon));
}

#[test]
fn test_unsupported_icon_leaves_model_and_cache_unchanged() {
    let (mut session, _store, icons) = setup_session(vec![gaming()]);

    let result = session.set_icon("1", Path::new("anim.gif"));

    assert!(matches!(
        result,
        Err(SessionError::Icon(IconError::UnsupportedFormat(_)))
    ));
    assert!(!icons.has_icon("1"));
    assert!(session.resolve("1").unwrap().icon_ref().is_none());
    assert!(!session.has_unsaved_changes());
}

#[test]
fn test_failed_icon_write_leaves_reference_unchanged() {
    let poster = "/mock/LGHUB/icon_cache/1.bmp";
    let (mut session, _store, icons) =
        setup_session(vec![record("1", "Gaming", "", poster)]);
    icons.set_fail_writes(true);

    let result = session.set_icon("1", Path::new("logo.png"));

    assert!(matches!(
        result,
        Err(SessionError::Icon(IconError::AssetWriteFailed(_)))
    ));
    assert_eq!(
        session.resolve("1").unwrap().icon_ref(),
        Some(IconRef::new(poster))
    );
}

#[test]
fn test_cleared_icon_stays_cleared_on_disk_after_discard() {
    // Arrange
    let poster = "/mock/LGHUB/icon_cache/1.bmp";
    let (mut session, _store, icons) =
        setup_session(vec![record("1", "Gaming", "", poster)]);
    session.set_icon("1", Path::new("logo.png")).unwrap();

    // Act
    session.clear_icon("1").unwrap();
    session.rename_profile("1", "Renamed").unwrap();
    session.discard().unwrap();

    // Assert
    assert!(!icons.has_icon("1"), "icon deletion is immediate");
    let reloaded = session.resolve("1").unwrap();
    assert_eq!(reloaded.name(), "Gaming");
    assert_eq!(reloaded.icon_ref(), Some(IconRef::new(poster)));
    assert!(!session.has_unsaved_changes());
}

#[test]
fn test_rejected_save_keeps_unsaved_changes() {
    let (mut session, store, _icons) = setup_session(vec![gaming()]);
    session.rename_profile("1", "FPS").unwrap();
    store.set_save_rejects(true);

    let result = session.save();

    assert!(matches!(
        result,
        Err(SessionError::Store(StoreError::WriteRejected(_)))
    ));
    assert!(session.has_unsaved_changes());

    store.set_save_rejects(false);
    session.save().unwrap();
    assert_eq!(store.load().unwrap().records()[0].name(), "FPS");
}

#[test]
fn test_resolve_prefers_identifier_over_name() {
    let (session, _store, _icons) = setup_session(vec![
        record("Gaming", "Other", "", ""),
        record("2", "Gaming", "", ""),
    ]);

    assert_eq!(session.resolve("Gaming").unwrap().id(), "Gaming");
    assert_eq!(session.resolve("Other").unwrap().id(), "Gaming");
    assert!(matches!(
        session.resolve("missing"),
        Err(SessionError::ProfileNotFound(_))
    ));
}

#[test]
fn test_end_to_end_icon_and_save_over_real_store() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("settings.db");
    let conn = rusqlite::Connection::open(&db_path).unwrap();
    conn.execute_batch("CREATE TABLE DATA (_id INTEGER PRIMARY KEY, FILE BLOB);")
        .unwrap();
    let doc = json!({"applications": {"applications": [
        {"applicationId": "1", "name": "Gaming", "applicationPath": "C:\\Games\\app.exe", "posterPath": ""}
    ]}});
    conn.execute(
        "INSERT INTO DATA (_id, FILE) VALUES (1, ?1)",
        [serde_json::to_vec(&doc).unwrap()],
    )
    .unwrap();
    drop(conn);

    let source = dir.path().join("logo.png");
    image::RgbImage::new(6, 4).save(&source).unwrap();

    let store = Arc::new(CoreSettingsStore::new(&db_path));
    let icons = Arc::new(CoreIconCache::for_store(&db_path));
    let mut session = EditorSession::open(store.clone(), icons.clone()).unwrap();

    // Act
    let icon = session.set_icon("1", &source).unwrap();
    session.save().unwrap();

    // Assert
    let expected_file = dir.path().join("icon_cache").join("1.bmp");
    assert!(expected_file.exists());
    assert_eq!(image::image_dimensions(&expected_file).unwrap(), (6, 4));
    let reopened = EditorSession::open(store, icons).unwrap();
    assert_eq!(reopened.resolve("1").unwrap().icon_ref(), Some(icon));
}
