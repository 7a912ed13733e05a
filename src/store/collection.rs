//! A JSON-file backed document collection.
//!
//! Every collection lives in one file inside the store directory. The whole
//! file is rewritten on each mutation through a temp file and a rename, so
//! the on-disk copy is either the old or the new state. In-memory state only
//! changes after the write succeeded.

use super::error::{Result, StoreError};
use super::schema::Schema;
use crate::utils::versioned;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Current on-disk format. Version 0 files are bare JSON arrays.
pub const FILE_VERSION: u32 = 1;

/// A type that can be stored in a [`Collection`].
pub trait Document: Serialize + DeserializeOwned + Clone {
    fn id(&self) -> &str;
    fn schema() -> &'static Schema;
}

/// Filter used by [`Collection::find`] and [`Collection::remove`].
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    All,
    Id(String),
    /// Field equals the value exactly
    Eq { field: String, value: Value },
    /// Field is a list containing the value, or a string equal to it
    Contains { field: String, value: String },
}

impl Query {
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Contains {
            field: field.into(),
            value: value.into(),
        }
    }

    fn matches(&self, id: &str, doc: &Value) -> bool {
        match self {
            Self::All => true,
            Self::Id(wanted) => wanted == id,
            Self::Eq { field, value } => doc.get(field) == Some(value),
            Self::Contains { field, value } => match doc.get(field) {
                Some(Value::Array(items)) => items.iter().any(|item| item.as_str() == Some(value)),
                Some(Value::String(s)) => s == value,
                _ => false,
            },
        }
    }

    /// Indexed field and lookup key, if the query can use an index.
    fn index_key(&self) -> Option<(&str, String)> {
        match self {
            Self::Eq { field, value } => scalar_key(value).map(|key| (field.as_str(), key)),
            Self::Contains { field, value } => Some((field.as_str(), value.clone())),
            _ => None,
        }
    }
}

/// Outcome of [`Collection::insert_missing`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertReport {
    pub inserted: usize,
    pub skipped: usize,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollectionFile {
    version: u32,
    #[serde(default)]
    saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    documents: Vec<Value>,
}

type FieldIndex = HashMap<String, BTreeSet<String>>;

pub struct Collection<T: Document> {
    path: PathBuf,
    documents: Vec<T>,
    positions: HashMap<String, usize>,
    indexes: HashMap<&'static str, FieldIndex>,
}

impl<T: Document> Collection<T> {
    /// Open the collection file inside `dir`, migrating old file versions.
    /// A missing file is an empty collection.
    pub fn open(dir: &Path) -> Result<Self> {
        let schema = T::schema();
        let path = dir.join(format!("{}.json", schema.collection));
        let mut collection = Self {
            path,
            documents: Vec::new(),
            positions: HashMap::new(),
            indexes: HashMap::new(),
        };

        if !collection.path.exists() {
            debug!("{}: no file yet, starting empty", schema.collection);
            collection.rebuild()?;
            return Ok(collection);
        }

        let content = fs::read_to_string(&collection.path)
            .map_err(|e| StoreError::io(&collection.path, e))?;
        let raw: Value = serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: collection.path.clone(),
            source,
        })?;

        let (version, raw_documents) = match raw {
            Value::Array(documents) => (0, documents),
            object @ Value::Object(_) => {
                let file: CollectionFile =
                    serde_json::from_value(object).map_err(|source| StoreError::Parse {
                        path: collection.path.clone(),
                        source,
                    })?;
                (file.version, file.documents)
            }
            _ => {
                return Err(StoreError::schema(
                    schema.collection,
                    "<file>",
                    "must be a JSON array or object",
                ))
            }
        };

        if version > FILE_VERSION {
            return Err(StoreError::UnsupportedVersion {
                collection: schema.collection.to_string(),
                version,
            });
        }

        let mut documents = Vec::with_capacity(raw_documents.len());
        for raw_document in raw_documents {
            schema.validate(&raw_document)?;
            let document: T =
                serde_json::from_value(raw_document).map_err(|source| StoreError::Parse {
                    path: collection.path.clone(),
                    source,
                })?;
            documents.push(document);
        }
        collection.documents = documents;
        collection.rebuild()?;

        if version < FILE_VERSION {
            info!(
                "{}: migrating file from v{} to v{}",
                schema.collection, version, FILE_VERSION
            );
            versioned::migrate_file(&collection.path, version, || {
                collection.write_file(&collection.documents)?;
                Ok(())
            })
            .map_err(|e| StoreError::Migration {
                path: collection.path.clone(),
                message: format!("{e:#}"),
            })?;
        }

        debug!(
            "{}: loaded {} documents",
            schema.collection,
            collection.documents.len()
        );
        Ok(collection)
    }

    pub fn name(&self) -> &'static str {
        T::schema().collection
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn count(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    /// All documents in insertion order.
    pub fn find_all(&self) -> Vec<T> {
        self.documents.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.documents.iter()
    }

    pub fn find_by_id(&self, id: &str) -> Option<&T> {
        self.positions.get(id).map(|&pos| &self.documents[pos])
    }

    /// Documents matching the query, in insertion order.
    pub fn find(&self, query: &Query) -> Result<Vec<&T>> {
        let ids = self.matching_ids(query)?;
        Ok(self
            .documents
            .iter()
            .filter(|doc| ids.contains(doc.id()))
            .collect())
    }

    /// Insert a new document. Fails if the id is already taken.
    pub fn insert(&mut self, document: T) -> Result<()> {
        self.check(&document)?;
        if self.contains_id(document.id()) {
            return Err(StoreError::DuplicateId {
                collection: self.name().to_string(),
                id: document.id().to_string(),
            });
        }
        let mut documents = self.documents.clone();
        documents.push(document);
        self.commit(documents)
    }

    /// Insert or replace. Returns `true` when the document was new.
    pub fn upsert(&mut self, document: T) -> Result<bool> {
        self.check(&document)?;
        let mut documents = self.documents.clone();
        let inserted = match self.positions.get(document.id()) {
            Some(&pos) => {
                documents[pos] = document;
                false
            }
            None => {
                documents.push(document);
                true
            }
        };
        self.commit(documents)?;
        Ok(inserted)
    }

    /// Insert every document whose id is not stored yet, in one write.
    /// Repeated ids within `incoming` count as skipped after the first.
    pub fn insert_missing<I>(&mut self, incoming: I) -> Result<InsertReport>
    where
        I: IntoIterator<Item = T>,
    {
        let mut report = InsertReport::default();
        let mut documents = self.documents.clone();
        let mut known: BTreeSet<String> = self.positions.keys().cloned().collect();

        for document in incoming {
            if known.contains(document.id()) {
                report.skipped += 1;
                continue;
            }
            self.check(&document)?;
            known.insert(document.id().to_string());
            documents.push(document);
            report.inserted += 1;
        }

        if report.inserted > 0 {
            self.commit(documents)?;
        }
        Ok(report)
    }

    /// Merge top-level fields into a stored document.
    ///
    /// A `null` value removes the field so its default applies. The `id`
    /// cannot be changed. Returns the stored result.
    pub fn update(&mut self, id: &str, fields: Map<String, Value>) -> Result<T> {
        let Some(&pos) = self.positions.get(id) else {
            return Err(StoreError::NotFound {
                collection: self.name().to_string(),
                id: id.to_string(),
            });
        };

        let mut merged = serde_json::to_value(&self.documents[pos])?;
        let Some(object) = merged.as_object_mut() else {
            return Err(StoreError::schema(self.name(), "<document>", "must be an object"));
        };
        for (key, value) in fields {
            if key == "id" && value.as_str() != Some(id) {
                return Err(StoreError::schema(self.name(), "id", "is immutable"));
            }
            if value.is_null() {
                object.remove(&key);
            } else {
                object.insert(key, value);
            }
        }

        T::schema().validate(&merged)?;
        let updated: T = serde_json::from_value(merged)
            .map_err(|e| StoreError::schema(self.name(), "<document>", e.to_string()))?;

        let mut documents = self.documents.clone();
        documents[pos] = updated.clone();
        self.commit(documents)?;
        Ok(updated)
    }

    /// Remove every matching document. Returns how many were removed.
    pub fn remove(&mut self, query: &Query) -> Result<usize> {
        let ids = self.matching_ids(query)?;
        if ids.is_empty() {
            return Ok(0);
        }
        let documents: Vec<T> = self
            .documents
            .iter()
            .filter(|doc| !ids.contains(doc.id()))
            .cloned()
            .collect();
        self.commit(documents)?;
        Ok(ids.len())
    }

    fn matching_ids(&self, query: &Query) -> Result<BTreeSet<String>> {
        if let Query::Id(id) = query {
            let mut ids = BTreeSet::new();
            if self.contains_id(id) {
                ids.insert(id.clone());
            }
            return Ok(ids);
        }

        let candidates: Vec<&T> = match query.index_key() {
            Some((field, key)) if T::schema().is_indexed(field) => self
                .indexes
                .get(field)
                .and_then(|index| index.get(&key))
                .map(|ids| ids.iter().filter_map(|id| self.find_by_id(id)).collect())
                .unwrap_or_default(),
            _ => self.documents.iter().collect(),
        };

        let mut ids = BTreeSet::new();
        for doc in candidates {
            let value = serde_json::to_value(doc)?;
            if query.matches(doc.id(), &value) {
                ids.insert(doc.id().to_string());
            }
        }
        Ok(ids)
    }

    fn check(&self, document: &T) -> Result<()> {
        let value = serde_json::to_value(document)?;
        T::schema().validate(&value)
    }

    fn commit(&mut self, documents: Vec<T>) -> Result<()> {
        self.write_file(&documents)?;
        self.documents = documents;
        self.rebuild()
    }

    fn write_file(&self, documents: &[T]) -> Result<()> {
        let documents = documents
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let file = CollectionFile {
            version: FILE_VERSION,
            saved_at: Some(Utc::now()),
            documents,
        };
        let content = serde_json::to_string_pretty(&file)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content).map_err(|e| StoreError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::io(&self.path, e))?;

        debug!("{}: wrote {} documents", self.name(), file.documents.len());
        Ok(())
    }

    fn rebuild(&mut self) -> Result<()> {
        let schema = T::schema();
        let mut positions = HashMap::with_capacity(self.documents.len());
        let mut indexes: HashMap<&'static str, FieldIndex> = schema
            .indexes
            .iter()
            .map(|&field| (field, FieldIndex::new()))
            .collect();

        for (pos, doc) in self.documents.iter().enumerate() {
            if positions.insert(doc.id().to_string(), pos).is_some() {
                return Err(StoreError::DuplicateId {
                    collection: schema.collection.to_string(),
                    id: doc.id().to_string(),
                });
            }
            let value = serde_json::to_value(doc)?;
            for (field, index) in &mut indexes {
                for key in index_keys(value.get(*field)) {
                    index.entry(key).or_default().insert(doc.id().to_string());
                }
            }
        }

        self.positions = positions;
        self.indexes = indexes;
        Ok(())
    }
}

fn scalar_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn index_keys(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_key).collect(),
        Some(value) => scalar_key(value).into_iter().collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::schema::{FieldSpec, FieldType};
    use serde_json::json;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Note {
        id: String,
        title: String,
        #[serde(default)]
        labels: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_id: Option<String>,
        #[serde(flatten)]
        extra: Map<String, Value>,
    }

    const NOTE_FIELDS: &[FieldSpec] = &[
        FieldSpec::required("title", FieldType::Text),
        FieldSpec::optional("labels", FieldType::TextList),
        FieldSpec::optional("parentId", FieldType::Text),
    ];

    static NOTE_SCHEMA: Schema = Schema {
        collection: "notes",
        fields: NOTE_FIELDS,
        indexes: &["labels", "parentId"],
    };

    impl Document for Note {
        fn id(&self) -> &str {
            &self.id
        }

        fn schema() -> &'static Schema {
            &NOTE_SCHEMA
        }
    }

    fn note(id: &str, labels: &[&str]) -> Note {
        Note {
            id: id.to_string(),
            title: format!("Note {id}"),
            labels: labels.iter().map(|l| (*l).to_string()).collect(),
            parent_id: None,
            extra: Map::new(),
        }
    }

    #[test]
    fn test_insert_persists_and_reopens() {
        let temp_dir = TempDir::new().unwrap();
        let mut notes = Collection::<Note>::open(temp_dir.path()).unwrap();
        notes.insert(note("n1", &["a"])).unwrap();
        notes.insert(note("n2", &[])).unwrap();

        let reopened = Collection::<Note>::open(temp_dir.path()).unwrap();
        assert_eq!(reopened.count(), 2);
        assert_eq!(reopened.find_all()[0].id, "n1");
        assert!(reopened.find_by_id("n2").is_some());
    }

    #[test]
    fn test_insert_duplicate_fails() {
        let temp_dir = TempDir::new().unwrap();
        let mut notes = Collection::<Note>::open(temp_dir.path()).unwrap();
        notes.insert(note("n1", &[])).unwrap();
        let err = notes.insert(note("n1", &[])).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId { .. }));
        assert_eq!(notes.count(), 1);
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let temp_dir = TempDir::new().unwrap();
        let mut notes = Collection::<Note>::open(temp_dir.path()).unwrap();
        assert!(notes.upsert(note("n1", &[])).unwrap());
        assert!(notes.upsert(note("n2", &[])).unwrap());

        let mut changed = note("n1", &["x"]);
        changed.title = "Changed".to_string();
        assert!(!notes.upsert(changed).unwrap());

        let all = notes.find_all();
        assert_eq!(all[0].title, "Changed");
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_update_merges_and_null_removes() {
        let temp_dir = TempDir::new().unwrap();
        let mut notes = Collection::<Note>::open(temp_dir.path()).unwrap();
        let mut n1 = note("n1", &["a"]);
        n1.parent_id = Some("p".to_string());
        notes.insert(n1).unwrap();

        let fields = json!({"title": "Updated", "parentId": null});
        let updated = notes
            .update("n1", fields.as_object().unwrap().clone())
            .unwrap();
        assert_eq!(updated.title, "Updated");
        assert_eq!(updated.labels, vec!["a".to_string()]);
        assert!(updated.parent_id.is_none());
    }

    #[test]
    fn test_undeclared_fields_survive_rewrites() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.json");
        fs::write(
            &path,
            r#"{"version": 1, "documents": [{"id": "n1", "title": "Alt", "colour": "red"}]}"#,
        )
        .unwrap();

        let mut notes = Collection::<Note>::open(temp_dir.path()).unwrap();
        let fields = json!({"title": "Neu"});
        let updated = notes
            .update("n1", fields.as_object().unwrap().clone())
            .unwrap();
        assert_eq!(updated.extra["colour"], "red");
        notes.insert(note("n2", &[])).unwrap();

        let file: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(file["documents"][0]["title"], "Neu");
        assert_eq!(file["documents"][0]["colour"], "red");
        assert!(file["documents"][1].get("colour").is_none());
    }

    #[test]
    fn test_update_rejects_bad_fields() {
        let temp_dir = TempDir::new().unwrap();
        let mut notes = Collection::<Note>::open(temp_dir.path()).unwrap();
        notes.insert(note("n1", &[])).unwrap();

        let bad_type = json!({"title": 5});
        assert!(notes
            .update("n1", bad_type.as_object().unwrap().clone())
            .is_err());

        let new_id = json!({"id": "n9"});
        assert!(notes
            .update("n1", new_id.as_object().unwrap().clone())
            .is_err());

        let missing = notes.update("nope", Map::new()).unwrap_err();
        assert!(matches!(missing, StoreError::NotFound { .. }));
        assert_eq!(notes.find_by_id("n1").unwrap().title, "Note n1");
    }

    #[test]
    fn test_find_with_index_and_scan() {
        let temp_dir = TempDir::new().unwrap();
        let mut notes = Collection::<Note>::open(temp_dir.path()).unwrap();
        let mut child = note("n3", &[]);
        child.parent_id = Some("n1".to_string());
        notes.insert(note("n1", &["red", "blue"])).unwrap();
        notes.insert(note("n2", &["blue"])).unwrap();
        notes.insert(child).unwrap();

        let blue = notes.find(&Query::contains("labels", "blue")).unwrap();
        assert_eq!(blue.len(), 2);

        let children = notes.find(&Query::eq("parentId", "n1")).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, "n3");

        // "title" is not indexed and goes through a scan
        let by_title = notes.find(&Query::eq("title", "Note n2")).unwrap();
        assert_eq!(by_title.len(), 1);

        // equality on a list field does not match a single element
        assert!(notes.find(&Query::eq("labels", "blue")).unwrap().is_empty());
    }

    #[test]
    fn test_remove_by_query() {
        let temp_dir = TempDir::new().unwrap();
        let mut notes = Collection::<Note>::open(temp_dir.path()).unwrap();
        notes.insert(note("n1", &["old"])).unwrap();
        notes.insert(note("n2", &["old"])).unwrap();
        notes.insert(note("n3", &["new"])).unwrap();

        assert_eq!(notes.remove(&Query::contains("labels", "old")).unwrap(), 2);
        assert_eq!(notes.remove(&Query::id("missing")).unwrap(), 0);
        assert_eq!(notes.count(), 1);
        assert!(notes.find(&Query::contains("labels", "old")).unwrap().is_empty());

        assert_eq!(notes.remove(&Query::All).unwrap(), 1);
        assert!(notes.is_empty());
    }

    #[test]
    fn test_insert_missing_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let mut notes = Collection::<Note>::open(temp_dir.path()).unwrap();
        let batch = vec![note("n1", &[]), note("n2", &[]), note("n1", &[])];

        let first = notes.insert_missing(batch.clone()).unwrap();
        assert_eq!(first, InsertReport { inserted: 2, skipped: 1 });

        let second = notes.insert_missing(batch).unwrap();
        assert_eq!(second, InsertReport { inserted: 0, skipped: 3 });
        assert_eq!(notes.count(), 2);
    }

    #[test]
    fn test_failed_write_leaves_memory_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let mut notes = Collection::<Note>::open(temp_dir.path()).unwrap();
        notes.insert(note("n1", &[])).unwrap();

        // A directory in the temp file's place makes the write fail
        fs::create_dir(temp_dir.path().join("notes.json.tmp")).unwrap();
        assert!(notes.insert(note("n2", &[])).is_err());
        assert_eq!(notes.count(), 1);
        assert!(!notes.contains_id("n2"));
    }

    #[test]
    fn test_migrates_bare_array_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.json");
        fs::write(&path, r#"[{"id": "n1", "title": "Legacy"}]"#).unwrap();

        let notes = Collection::<Note>::open(temp_dir.path()).unwrap();
        assert_eq!(notes.count(), 1);

        let content = fs::read_to_string(&path).unwrap();
        let file: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(file["version"], json!(FILE_VERSION));
        assert!(!temp_dir.path().join("notes.json.backup-v0").exists());
    }

    #[test]
    fn test_rejects_future_version_and_invalid_documents() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.json");

        fs::write(&path, r#"{"version": 99, "documents": []}"#).unwrap();
        assert!(matches!(
            Collection::<Note>::open(temp_dir.path()),
            Err(StoreError::UnsupportedVersion { version: 99, .. })
        ));

        fs::write(&path, r#"{"version": 1, "documents": [{"id": "n1"}]}"#).unwrap();
        assert!(matches!(
            Collection::<Note>::open(temp_dir.path()),
            Err(StoreError::Schema { .. })
        ));

        fs::write(
            &path,
            r#"{"version": 1, "documents": [{"id": "n1", "title": "A"}, {"id": "n1", "title": "B"}]}"#,
        )
        .unwrap();
        assert!(matches!(
            Collection::<Note>::open(temp_dir.path()),
            Err(StoreError::DuplicateId { .. })
        ));
    }
}
