/*
 * Reads and writes the profile list inside G HUB's `settings.db`.
 *
 * The database is SQLite with a single `DATA` table; each row's `FILE` column
 * holds one complete JSON settings document. The profiles live in the array at
 * `applications.applications` of the newest row that has one. Everything else in
 * the document, and every other row, is passed through untouched.
 *
 * The store is owned by another application. There is no way to lock it against
 * that application; writes use an IMMEDIATE transaction with no busy timeout so a
 * held database is reported as `WriteRejected` instead of blocking.
 */
use super::models::{ProfileCollection, ProfileRecord};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Connection, ErrorCode, OpenFlags, TransactionBehavior, params};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const TABLE_NAME: &str = "DATA";
pub const ID_COLUMN: &str = "_id";
pub const DOCUMENT_COLUMN: &str = "FILE";
const APPLICATIONS_KEY: &str = "applications";

#[derive(Debug)]
pub enum StoreError {
    StoreUnavailable(String),
    WriteRejected(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::StoreUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::StoreUnavailable(format!("settings document is not valid JSON: {err}"))
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::StoreUnavailable(reason) => {
                write!(f, "Settings store unavailable: {reason}")
            }
            StoreError::WriteRejected(reason) => write!(
                f,
                "Settings store rejected the write (is G HUB still running?): {reason}"
            ),
        }
    }
}

impl std::error::Error for StoreError {}

pub type Result<T> = std::result::Result<T, StoreError>;

pub trait SettingsStoreOperations: Send + Sync {
    fn load(&self) -> Result<ProfileCollection>;
    fn save(&self, collection: &ProfileCollection) -> Result<()>;
    fn store_path(&self) -> &Path;
}

// The row holding the profile list, decoded.
struct ProfilesDocument {
    row_id: i64,
    stored_as_text: bool,
    document: Value,
}

impl ProfilesDocument {
    fn entries(&self) -> Option<&Vec<Value>> {
        self.document
            .get(APPLICATIONS_KEY)
            .and_then(|section| section.get(APPLICATIONS_KEY))
            .and_then(Value::as_array)
    }

    fn entries_mut(&mut self) -> Option<&mut Vec<Value>> {
        self.document
            .get_mut(APPLICATIONS_KEY)
            .and_then(|section| section.get_mut(APPLICATIONS_KEY))
            .and_then(Value::as_array_mut)
    }
}

pub struct CoreSettingsStore {
    db_path: PathBuf,
}

impl CoreSettingsStore {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        CoreSettingsStore {
            db_path: db_path.into(),
        }
    }

    fn open(&self, flags: OpenFlags) -> Result<Connection> {
        if !self.db_path.is_file() {
            return Err(StoreError::StoreUnavailable(format!(
                "settings store {:?} does not exist",
                self.db_path
            )));
        }
        let conn =
            Connection::open_with_flags(&self.db_path, flags | OpenFlags::SQLITE_OPEN_NO_MUTEX)?;
        conn.busy_timeout(Duration::ZERO)?;
        Ok(conn)
    }

    /*
     * Finds the newest row whose document contains the profile array. Rows that
     * are empty or fail to decode are skipped with a warning, as they may belong
     * to other settings the application keeps in the same table.
     */
    fn read_profiles_document(conn: &Connection) -> Result<ProfilesDocument> {
        let sql = format!(
            "SELECT {ID_COLUMN}, {DOCUMENT_COLUMN} FROM {TABLE_NAME} ORDER BY {ID_COLUMN} DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;

        while let Some(row) = rows.next()? {
            let row_id: i64 = row.get(0)?;
            let (bytes, stored_as_text) = match row.get_ref(1)? {
                ValueRef::Blob(b) => (b, false),
                ValueRef::Text(t) => (t, true),
                _ => {
                    log::trace!("CoreSettingsStore: Row {row_id} has no document, skipping.");
                    continue;
                }
            };
            let document: Value = match serde_json::from_slice(bytes) {
                Ok(doc) => doc,
                Err(e) => {
                    log::warn!("CoreSettingsStore: Failed to parse JSON in row {row_id}: {e}");
                    continue;
                }
            };
            let candidate = ProfilesDocument {
                row_id,
                stored_as_text,
                document,
            };
            if candidate.entries().is_some() {
                log::debug!("CoreSettingsStore: Profiles found in row {row_id}.");
                return Ok(candidate);
            }
        }

        Err(StoreError::StoreUnavailable(format!(
            "no row of {TABLE_NAME} contains an '{APPLICATIONS_KEY}.{APPLICATIONS_KEY}' list"
        )))
    }

    fn collection_from_entries(entries: &[Value]) -> Result<ProfileCollection> {
        let mut records = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            match entry {
                Value::Object(fields) => records.push(ProfileRecord::from_stored(fields.clone())),
                other => {
                    return Err(StoreError::StoreUnavailable(format!(
                        "profile entry {index} is not an object: {other}"
                    )));
                }
            }
        }
        Ok(ProfileCollection::from_records(records))
    }
}

// Busy, locked and read-only databases mean another process holds the store.
fn classify_write_failure(err: rusqlite::Error) -> StoreError {
    match err.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked | ErrorCode::ReadOnly) => {
            StoreError::WriteRejected(err.to_string())
        }
        _ => StoreError::StoreUnavailable(err.to_string()),
    }
}

impl SettingsStoreOperations for CoreSettingsStore {
    fn load(&self) -> Result<ProfileCollection> {
        log::trace!("CoreSettingsStore: Loading profiles from {:?}", self.db_path);
        let conn = self.open(OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        let profiles_doc = Self::read_profiles_document(&conn)?;
        let entries = profiles_doc.entries().map(Vec::as_slice).unwrap_or_default();
        let collection = Self::collection_from_entries(entries)?;
        log::info!(
            "CoreSettingsStore: Loaded {} profiles from row {}.",
            collection.len(),
            profiles_doc.row_id
        );
        Ok(collection)
    }

    /*
     * Replaces the profile array of the same row `load` reads, leaving the rest of
     * the document alone. When the array already equals the collection the row is
     * not rewritten at all, so loading and saving an untouched store keeps its
     * bytes identical.
     */
    fn save(&self, collection: &ProfileCollection) -> Result<()> {
        log::trace!(
            "CoreSettingsStore: Saving {} profiles to {:?}",
            collection.len(),
            self.db_path
        );
        let mut conn = self.open(OpenFlags::SQLITE_OPEN_READ_WRITE)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(classify_write_failure)?;

        let mut profiles_doc = Self::read_profiles_document(&tx)?;
        let new_entries = collection.to_stored();
        if profiles_doc.entries() == Some(&new_entries) {
            log::debug!(
                "CoreSettingsStore: Row {} already up to date, nothing written.",
                profiles_doc.row_id
            );
            return Ok(());
        }
        if let Some(entries) = profiles_doc.entries_mut() {
            *entries = new_entries;
        }

        let encoded = if profiles_doc.stored_as_text {
            SqlValue::Text(serde_json::to_string_pretty(&profiles_doc.document)?)
        } else {
            SqlValue::Blob(serde_json::to_vec_pretty(&profiles_doc.document)?)
        };
        let sql = format!("UPDATE {TABLE_NAME} SET {DOCUMENT_COLUMN} = ?1 WHERE {ID_COLUMN} = ?2");
        tx.execute(&sql, params![encoded, profiles_doc.row_id])
            .map_err(classify_write_failure)?;
        tx.commit().map_err(classify_write_failure)?;

        log::info!(
            "CoreSettingsStore: Saved {} profiles to row {}.",
            collection.len(),
            profiles_doc.row_id
        );
        Ok(())
    }

    fn store_path(&self) -> &Path {
        &self.db_path
    }
}
