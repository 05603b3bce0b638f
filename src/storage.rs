//! Key-value persistence used by the schema registry and the table store.
//!
//! The registry lives under [SCHEMA_KEY]; each table collection lives under
//! `data/<table>`. Values are JSON documents produced by `serde_json`.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::table::TableCollection;

/// Storage key of the persisted schema registry.
pub const SCHEMA_KEY: &str = "db_meta";

/// A byte store addressed by string keys.
pub trait Storage {
    /// Returns the bytes saved under `key`, or `None` if nothing was saved.
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replaces whatever is stored under `key`.
    fn save(&mut self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Forgets `key`. Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Storage key of a table collection.
pub fn table_key(table: &str) -> String {
    format!("data/{table}")
}

/// Loads the collection of `table`, or a fresh empty one if the table has
/// never been saved.
pub fn load_table(storage: &dyn Storage, table: &str) -> Result<TableCollection> {
    match storage.load(&table_key(table))? {
        Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
        None => {
            debug!(table, "no persisted rows, starting empty collection");
            Ok(TableCollection::new())
        }
    }
}

pub fn save_table(storage: &mut dyn Storage, table: &str, collection: &TableCollection) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(collection)?;
    storage.save(&table_key(table), &bytes)?;
    debug!(table, rows = collection.len(), next_id = collection.next_id, "saved table");
    Ok(())
}

pub fn remove_table(storage: &mut dyn Storage, table: &str) -> Result<()> {
    storage.remove(&table_key(table))
}

/// In-process storage, lost when dropped.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl Storage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, bytes: &[u8]) -> Result<()> {
        self.entries.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One JSON file per key under a root directory.
///
/// `db_meta` maps to `<root>/db_meta.json` and `data/users` to
/// `<root>/data/users.json`. Writes go to a temporary sibling that is then
/// renamed over the target.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == IoErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&mut self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Err(err) if err.kind() != IoErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}
