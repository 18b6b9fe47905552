/*
 * Data structures for the profile records held in the G HUB settings document.
 * A `ProfileRecord` keeps the complete JSON object it was read from, so keys this
 * editor does not know about (e.g. `isCustom`, category colours) survive a save
 * verbatim and in their original position. Only the four owned keys are ever
 * written through the accessors below.
 */
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

pub const KEY_APPLICATION_ID: &str = "applicationId";
pub const KEY_APPLICATION_PATH: &str = "applicationPath";
pub const KEY_IS_CUSTOM: &str = "isCustom";
pub const KEY_NAME: &str = "name";
pub const KEY_POSTER_PATH: &str = "posterPath";

// Reference to an icon cache entry, as stored in `posterPath`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IconRef(String);

impl IconRef {
    pub fn new(reference: impl Into<String>) -> Self {
        IconRef(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IconRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileRecord {
    id: String,
    fields: Map<String, Value>,
}

impl ProfileRecord {
    /// Creates a custom application entry with a fresh identifier and no icon.
    pub fn new(name: &str, path: &str) -> Self {
        let id = generate_profile_id();
        let mut fields = Map::new();
        fields.insert(KEY_APPLICATION_ID.to_string(), Value::String(id.clone()));
        fields.insert(
            KEY_APPLICATION_PATH.to_string(),
            Value::String(path.to_string()),
        );
        fields.insert(KEY_IS_CUSTOM.to_string(), Value::Bool(true));
        fields.insert(KEY_NAME.to_string(), Value::String(name.to_string()));
        fields.insert(KEY_POSTER_PATH.to_string(), Value::String(String::new()));
        ProfileRecord { id, fields }
    }

    /*
     * Wraps a JSON object read from the settings document. Entries written by
     * older tools may lack `applicationId`; those get a freshly generated one
     * so that every record in a session is addressable. A numeric identifier is
     * kept as stored and addressed by its decimal text.
     */
    pub fn from_stored(mut fields: Map<String, Value>) -> Self {
        let id = match fields.get(KEY_APPLICATION_ID) {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(Value::Number(number)) => number.to_string(),
            _ => {
                let id = generate_profile_id();
                log::warn!(
                    "ProfileRecord: Stored entry without '{KEY_APPLICATION_ID}' was assigned '{id}'."
                );
                fields.insert(KEY_APPLICATION_ID.to_string(), Value::String(id.clone()));
                id
            }
        };
        ProfileRecord { id, fields }
    }

    pub fn to_stored(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        self.string_field(KEY_NAME)
    }

    pub fn path(&self) -> &str {
        self.string_field(KEY_APPLICATION_PATH)
    }

    pub fn icon_ref(&self) -> Option<IconRef> {
        let poster = self.string_field(KEY_POSTER_PATH);
        if poster.trim().is_empty() {
            None
        } else {
            Some(IconRef::new(poster))
        }
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.set_string_field(KEY_NAME, name);
    }

    pub(crate) fn set_path(&mut self, path: &str) {
        self.set_string_field(KEY_APPLICATION_PATH, path);
    }

    pub(crate) fn set_icon_ref(&mut self, icon: Option<&IconRef>) {
        self.set_string_field(KEY_POSTER_PATH, icon.map(IconRef::as_str).unwrap_or(""));
    }

    fn reassign_id(&mut self) {
        let id = generate_profile_id();
        self.fields
            .insert(KEY_APPLICATION_ID.to_string(), Value::String(id.clone()));
        self.id = id;
    }

    fn string_field(&self, key: &str) -> &str {
        self.fields.get(key).and_then(Value::as_str).unwrap_or("")
    }

    // Existing keys keep their position in the object.
    fn set_string_field(&mut self, key: &str, value: &str) {
        self.fields
            .insert(key.to_string(), Value::String(value.to_string()));
    }
}

/*
 * The ordered list of profile records as found in `applications.applications`.
 * Identifiers are unique within a collection; this is enforced on construction.
 */
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileCollection {
    records: Vec<ProfileRecord>,
}

impl ProfileCollection {
    pub fn new() -> Self {
        ProfileCollection::default()
    }

    /*
     * Builds a collection, keeping the given order. A record whose identifier was
     * already seen earlier in the list is given a new one; an earlier editor release
     * used a fixed placeholder id for every added entry, so real stores contain
     * such duplicates.
     */
    pub fn from_records(records: Vec<ProfileRecord>) -> Self {
        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(records.len());
        for mut record in records {
            if !seen.insert(record.id.clone()) {
                let old_id = record.id.clone();
                record.reassign_id();
                log::warn!(
                    "ProfileCollection: Duplicate identifier '{old_id}' for '{}' replaced by '{}'.",
                    record.name(),
                    record.id
                );
                seen.insert(record.id.clone());
            }
            unique.push(record);
        }
        ProfileCollection { records: unique }
    }

    pub fn records(&self) -> &[ProfileRecord] {
        &self.records
    }

    pub(crate) fn records_mut(&mut self) -> &mut Vec<ProfileRecord> {
        &mut self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn to_stored(&self) -> Vec<Value> {
        self.records.iter().map(ProfileRecord::to_stored).collect()
    }
}

pub fn generate_profile_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
