use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::storage::{SCHEMA_KEY, Storage};
use crate::table::Schema;

/// Table name to schema mapping, persisted under [SCHEMA_KEY].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaRegistry {
    tables: BTreeMap<String, Schema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the registry from storage, starting empty if none was saved.
    pub fn load(storage: &dyn Storage) -> Result<Self> {
        match storage.load(SCHEMA_KEY)? {
            Some(bytes) => {
                let registry: Self = serde_json::from_slice(&bytes)?;
                debug!(tables = registry.len(), "loaded schema registry");
                Ok(registry)
            }
            None => Ok(Self::new()),
        }
    }

    pub fn save(&self, storage: &mut dyn Storage) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(self)?;
        storage.save(SCHEMA_KEY, &bytes)
    }

    /// Registers a new table built from `<name>:<type>` specs.
    ///
    /// # Errors
    /// - [Error::InvalidName] if `name` is not a valid table name.
    /// - [Error::AlreadyExists] if the table is already registered.
    /// - Any column spec error from [Schema::from_specs].
    ///
    /// The registry is unchanged on error.
    pub fn create_table<S: AsRef<str>>(&mut self, name: &str, column_specs: &[S]) -> Result<&Schema> {
        validate_table_name(name)?;
        if self.tables.contains_key(name) {
            return Err(Error::AlreadyExists(name.to_string()));
        }

        let schema = Schema::from_specs(column_specs)?;
        Ok(self.tables.entry(name.to_string()).or_insert(schema))
    }

    /// Removes a table and returns its schema.
    ///
    /// # Errors
    /// [Error::NotFound] if the table does not exist.
    pub fn drop_table(&mut self, name: &str) -> Result<Schema> {
        self.tables
            .remove(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// Puts back a schema removed by [SchemaRegistry::drop_table].
    pub(crate) fn restore(&mut self, name: &str, schema: Schema) {
        self.tables.insert(name.to_string(), schema);
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.tables.get(name)
    }

    /// Like [SchemaRegistry::get] but fails with [Error::NotFound].
    pub fn require(&self, name: &str) -> Result<&Schema> {
        self.get(name).ok_or_else(|| Error::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Table names in lexical order.
    pub fn names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Table names double as storage keys: a letter or underscore followed by
/// letters, digits or underscores.
pub fn validate_table_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(Error::InvalidName(name.to_string()))
    }
}
