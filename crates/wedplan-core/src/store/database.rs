use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{CollectionSpec, ObjectStore, Schema, KEY_PATH};
use crate::error::StorageError;

/// Database name and version, stored next to the collection files
const META_FILE: &str = "meta.json";

/// Keys start at 1 so that 0 and negatives never name a stored record.
const FIRST_KEY: i64 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct DatabaseMeta {
    name: String,
    version: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollectionFile {
    next_key: i64,
    #[serde(default)]
    records: BTreeMap<i64, Value>,
}

impl Default for CollectionFile {
    fn default() -> Self {
        Self {
            next_key: FIRST_KEY,
            records: BTreeMap::new(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CollectionFileRef<'a> {
    next_key: i64,
    records: &'a BTreeMap<i64, Value>,
}

/// Equality index: serialized field value -> primary keys holding it.
#[derive(Debug)]
struct Index {
    key_path: String,
    entries: BTreeMap<String, BTreeSet<i64>>,
}

impl Index {
    fn new(key_path: &str) -> Self {
        Self {
            key_path: key_path.to_string(),
            entries: BTreeMap::new(),
        }
    }

    fn insert(&mut self, key: i64, record: &Value) {
        if let Some(index_key) = index_key(record, &self.key_path) {
            self.entries.entry(index_key).or_default().insert(key);
        }
    }

    fn remove(&mut self, key: i64, record: &Value) {
        if let Some(index_key) = index_key(record, &self.key_path) {
            if let Some(keys) = self.entries.get_mut(&index_key) {
                keys.remove(&key);
                if keys.is_empty() {
                    self.entries.remove(&index_key);
                }
            }
        }
    }
}

/// Records without a value at `key_path` (or with null) are left out of the index.
fn index_key(record: &Value, key_path: &str) -> Option<String> {
    let value = key_path
        .split('.')
        .try_fold(record, |value, part| value.get(part))?;
    query_key(value)
}

fn query_key(value: &Value) -> Option<String> {
    if value.is_null() {
        return None;
    }
    serde_json::to_string(value).ok()
}

#[derive(Debug)]
struct CollectionState {
    next_key: i64,
    records: BTreeMap<i64, Value>,
    indexes: HashMap<String, Index>,
}

impl CollectionState {
    fn new(spec: &CollectionSpec, file: CollectionFile) -> Self {
        let mut state = Self {
            next_key: file.next_key.max(FIRST_KEY),
            records: BTreeMap::new(),
            indexes: spec
                .indexes
                .iter()
                .map(|i| (i.name.clone(), Index::new(&i.key_path)))
                .collect(),
        };
        for (key, record) in file.records {
            state.insert(key, record);
        }
        state
    }

    /// Store a record under `key`, returning the record it replaced.
    fn insert(&mut self, key: i64, record: Value) -> Option<Value> {
        let previous = self.remove(key);
        for index in self.indexes.values_mut() {
            index.insert(key, &record);
        }
        self.records.insert(key, record);
        if key >= self.next_key {
            self.next_key = key + 1;
        }
        previous
    }

    fn remove(&mut self, key: i64) -> Option<Value> {
        let record = self.records.remove(&key)?;
        for index in self.indexes.values_mut() {
            index.remove(key, &record);
        }
        Some(record)
    }

    fn file(&self) -> CollectionFileRef<'_> {
        CollectionFileRef {
            next_key: self.next_key,
            records: &self.records,
        }
    }
}

/// The embedded record store.
pub struct Database {
    name: String,
    version: u32,
    dir: Option<PathBuf>,
    collections: RwLock<HashMap<String, CollectionState>>,
}

impl Database {
    /// Open (or create) the database stored under `dir`, upgrading it to
    /// `schema` when it is older.
    pub fn open(dir: impl Into<PathBuf>, schema: &Schema) -> Result<Self, StorageError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        let meta_path = dir.join(META_FILE);
        let stored: Option<DatabaseMeta> = read_json(&meta_path)?;
        if let Some(ref meta) = stored {
            if meta.version > schema.version {
                return Err(StorageError::VersionDowngrade {
                    name: schema.name.clone(),
                    found: meta.version,
                    expected: schema.version,
                });
            }
        }

        let mut collections = HashMap::new();
        for spec in &schema.collections {
            let path = collection_path(&dir, &spec.name);
            let state = match read_json::<CollectionFile>(&path)? {
                Some(file) => CollectionState::new(spec, file),
                None => {
                    debug!(collection = %spec.name, "Creating collection");
                    let state = CollectionState::new(spec, CollectionFile::default());
                    write_json(&path, &state.file())?;
                    state
                }
            };
            collections.insert(spec.name.clone(), state);
        }

        let stored_version = stored.map(|m| m.version);
        if stored_version != Some(schema.version) {
            info!(
                database = %schema.name,
                from = ?stored_version,
                to = schema.version,
                "Upgraded database schema"
            );
            write_json(
                &meta_path,
                &DatabaseMeta {
                    name: schema.name.clone(),
                    version: schema.version,
                },
            )?;
        }

        Ok(Self {
            name: schema.name.clone(),
            version: schema.version,
            dir: Some(dir),
            collections: RwLock::new(collections),
        })
    }

    /// A database that lives only as long as this value.
    pub fn in_memory(schema: &Schema) -> Self {
        let collections = schema
            .collections
            .iter()
            .map(|spec| {
                (
                    spec.name.clone(),
                    CollectionState::new(spec, CollectionFile::default()),
                )
            })
            .collect();

        Self {
            name: schema.name.clone(),
            version: schema.version,
            dir: None,
            collections: RwLock::new(collections),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    fn persist(&self, name: &str, state: &CollectionState) -> Result<(), StorageError> {
        match self.dir {
            Some(ref dir) => write_json(&collection_path(dir, name), &state.file()),
            None => Ok(()),
        }
    }
}

fn lookup<'a>(
    collections: &'a HashMap<String, CollectionState>,
    name: &str,
) -> Result<&'a CollectionState, StorageError> {
    collections
        .get(name)
        .ok_or_else(|| StorageError::UnknownCollection(name.to_string()))
}

fn lookup_mut<'a>(
    collections: &'a mut HashMap<String, CollectionState>,
    name: &str,
) -> Result<&'a mut CollectionState, StorageError> {
    collections
        .get_mut(name)
        .ok_or_else(|| StorageError::UnknownCollection(name.to_string()))
}

#[async_trait]
impl ObjectStore for Database {
    async fn get_all(&self, collection: &str) -> Result<Vec<Value>, StorageError> {
        let collections = self.collections.read().await;
        let state = lookup(&collections, collection)?;
        Ok(state.records.values().cloned().collect())
    }

    async fn get(&self, collection: &str, key: i64) -> Result<Option<Value>, StorageError> {
        let collections = self.collections.read().await;
        let state = lookup(&collections, collection)?;
        Ok(state.records.get(&key).cloned())
    }

    async fn add(&self, collection: &str, mut record: Value) -> Result<i64, StorageError> {
        let fields = record.as_object_mut().ok_or_else(|| {
            StorageError::InvalidRecord(format!("{} records must be JSON objects", collection))
        })?;

        let mut collections = self.collections.write().await;
        let state = lookup_mut(&mut collections, collection)?;

        let key = state.next_key;
        fields.insert(KEY_PATH.to_string(), Value::from(key));
        state.insert(key, record);

        if let Err(e) = self.persist(collection, state) {
            state.remove(key);
            state.next_key = key;
            return Err(e);
        }

        debug!(collection, key, "Record added");
        Ok(key)
    }

    async fn put(&self, collection: &str, record: Value) -> Result<i64, StorageError> {
        let key = record
            .get(KEY_PATH)
            .and_then(Value::as_i64)
            .ok_or(StorageError::MissingId)?;

        let mut collections = self.collections.write().await;
        let state = lookup_mut(&mut collections, collection)?;

        let next_key = state.next_key;
        let previous = state.insert(key, record);

        if let Err(e) = self.persist(collection, state) {
            state.remove(key);
            if let Some(previous) = previous {
                state.insert(key, previous);
            }
            state.next_key = next_key;
            return Err(e);
        }

        debug!(collection, key, "Record stored");
        Ok(key)
    }

    async fn delete(&self, collection: &str, key: i64) -> Result<(), StorageError> {
        let mut collections = self.collections.write().await;
        let state = lookup_mut(&mut collections, collection)?;

        if let Some(previous) = state.remove(key) {
            if let Err(e) = self.persist(collection, state) {
                state.insert(key, previous);
                return Err(e);
            }
            debug!(collection, key, "Record deleted");
        }
        Ok(())
    }

    async fn get_all_by_index(
        &self,
        collection: &str,
        index: &str,
        query: &Value,
    ) -> Result<Vec<Value>, StorageError> {
        let collections = self.collections.read().await;
        let state = lookup(&collections, collection)?;
        let index = state
            .indexes
            .get(index)
            .ok_or_else(|| StorageError::unknown_index(collection, index))?;

        let Some(wanted) = query_key(query) else {
            return Ok(Vec::new());
        };

        Ok(index
            .entries
            .get(&wanted)
            .into_iter()
            .flatten()
            .filter_map(|key| state.records.get(key).cloned())
            .collect())
    }
}

fn collection_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.json", name))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&contents)?))
}

/// Write through a temp file so a crash never leaves a half-written collection.
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let contents = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
