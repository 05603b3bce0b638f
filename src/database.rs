use tracing::{info, warn};

use crate::{
    cache::{CacheStats, QueryCache},
    error::{Error, Result},
    query::{self, Clause},
    schema::SchemaRegistry,
    storage::{self, Storage},
    table::{ID_COLUMN, Record, Schema},
};

/// The storage-and-query engine.
///
/// It owns the schema registry, reads and writes table collections through an
/// injected [Storage] and serves selects through an optional [QueryCache].
/// Every mutating call loads the table, applies the change and saves it back
/// before returning; when any step fails nothing is persisted.
pub struct Database {
    storage: Box<dyn Storage>,
    registry: SchemaRegistry,
    cache: Option<QueryCache>,
}

/// Description of a table returned by [Database::table_info].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub name: String,
    pub schema: Schema,
    pub rows: usize,
}

impl Database {
    /// Opens a database over `storage` with a fresh query cache.
    ///
    /// # Errors
    /// Returns an error if the persisted schema registry cannot be read.
    pub fn open(storage: impl Storage + 'static) -> Result<Self> {
        Self::open_with_cache(storage, Some(QueryCache::new()))
    }

    /// Opens a database over `storage` using `cache` for selects, or no cache
    /// at all when `cache` is `None`.
    pub fn open_with_cache(storage: impl Storage + 'static, cache: Option<QueryCache>) -> Result<Self> {
        let registry = SchemaRegistry::load(&storage)?;
        Ok(Self {
            storage: Box::new(storage),
            registry,
            cache,
        })
    }

    /// Creates a new table whose schema is `ID:int` followed by `column_specs`.
    ///
    /// # Errors
    /// Returns an error if the table already exists, a spec is malformed or
    /// names an unknown type, or the registry cannot be saved.
    pub fn create_table<S: AsRef<str>>(&mut self, name: &str, column_specs: &[S]) -> Result<Schema> {
        let schema = self.registry.create_table(name, column_specs)?.clone();

        // rows left behind by an earlier table of the same name must not resurface
        let persisted = storage::remove_table(self.storage.as_mut(), name)
            .and_then(|_| self.registry.save(self.storage.as_mut()));
        if let Err(err) = persisted {
            self.registry.drop_table(name)?;
            return Err(err);
        }

        info!(table = name, columns = ?schema.column_names(), "created table");
        Ok(schema)
    }

    /// Removes a table and its rows.
    ///
    /// # Errors
    /// Returns an error if the table does not exist or the registry cannot be saved.
    pub fn drop_table(&mut self, name: &str) -> Result<Schema> {
        let schema = self.registry.drop_table(name)?;

        if let Err(err) = self.registry.save(self.storage.as_mut()) {
            self.registry.restore(name, schema);
            return Err(err);
        }

        if let Err(err) = storage::remove_table(self.storage.as_mut(), name) {
            // the registry no longer knows the table and create_table clears leftovers
            warn!(table = name, error = %err, "could not remove rows of dropped table");
        }

        info!(table = name, "dropped table");
        Ok(schema)
    }

    /// Inserts one record from raw text values given in schema order
    /// (excluding `ID`) and returns the assigned ID.
    ///
    /// # Example
    /// ```
    /// use primdb::{Database, MemoryStorage, Value, query::clause};
    ///
    /// let mut db = Database::open(MemoryStorage::new()).unwrap();
    /// db.create_table("users", &["name:str", "age:int"]).unwrap();
    ///
    /// let id = db.insert("users", &["John", "28"]).unwrap();
    /// assert_eq!(id, 1);
    ///
    /// let rows = db.select("users", Some(&clause([("age", 28)]))).unwrap();
    /// assert_eq!(rows[0].get("name"), Some(&Value::Text("John".into())));
    /// ```
    ///
    /// # Errors
    /// Returns an error if the table does not exist, the number of values is
    /// wrong, a value does not convert to its column type, or storage fails.
    pub fn insert<S: AsRef<str>>(&mut self, table: &str, raw_values: &[S]) -> Result<i64> {
        let schema = self.registry.require(table)?;
        let mut collection = storage::load_table(self.storage.as_ref(), table)?;

        let id = collection.insert(schema, raw_values)?;
        storage::save_table(self.storage.as_mut(), table, &collection)?;

        info!(table, id, "inserted record");
        Ok(id)
    }

    /// Returns the records of `table` matching `filter`, or all of them.
    ///
    /// Results are served from the query cache when the same filter already
    /// ran against identical data.
    pub fn select(&mut self, table: &str, filter: Option<&Clause>) -> Result<Vec<Record>> {
        self.registry.require(table)?;
        let collection = storage::load_table(self.storage.as_ref(), table)?;

        let rows = match self.cache.as_mut() {
            Some(cache) => {
                cache.get_or_compute(&collection, filter, || query::select(&collection, filter))
            }
            None => query::select(&collection, filter),
        };
        Ok(rows)
    }

    /// Applies `assignments` to every record matching `filter` and returns the
    /// number of matched records. An empty `filter` matches every record.
    ///
    /// Assignments to columns outside the schema are ignored.
    ///
    /// # Errors
    /// Returns an error if the table does not exist, an assignment targets
    /// `ID`, an assigned value has the wrong type for its column, or storage
    /// fails.
    pub fn update(&mut self, table: &str, assignments: &Clause, filter: &Clause) -> Result<usize> {
        let schema = self.registry.require(table)?;
        check_assignments(schema, assignments)?;

        let mut collection = storage::load_table(self.storage.as_ref(), table)?;
        let matched = query::update(&mut collection, assignments, filter);
        if matched > 0 {
            storage::save_table(self.storage.as_mut(), table, &collection)?;
        }

        info!(table, matched, "updated records");
        Ok(matched)
    }

    /// Removes every record matching `filter` and returns how many were
    /// removed. An empty `filter` removes every record; IDs are not reused.
    pub fn delete(&mut self, table: &str, filter: &Clause) -> Result<usize> {
        self.registry.require(table)?;

        let mut collection = storage::load_table(self.storage.as_ref(), table)?;
        let deleted = query::delete(&mut collection, filter);
        if deleted > 0 {
            storage::save_table(self.storage.as_mut(), table, &collection)?;
        }

        info!(table, deleted, "deleted records");
        Ok(deleted)
    }

    /// Returns a list of all table names, sorted.
    pub fn list_tables(&self) -> Vec<&str> {
        self.registry.names()
    }

    pub fn schema(&self, table: &str) -> Option<&Schema> {
        self.registry.get(table)
    }

    pub fn table_info(&self, table: &str) -> Result<TableInfo> {
        let schema = self.registry.require(table)?.clone();
        let rows = storage::load_table(self.storage.as_ref(), table)?.len();
        Ok(TableInfo {
            name: table.to_string(),
            schema,
            rows,
        })
    }

    pub fn clear_cache(&mut self) {
        if let Some(cache) = self.cache.as_mut() {
            cache.clear();
        }
    }

    /// Cache statistics; all zero when caching is disabled.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache
            .as_ref()
            .map(QueryCache::stats)
            .unwrap_or_default()
    }
}

/// Rejects assignments that would break record typing or ID uniqueness.
fn check_assignments(schema: &Schema, assignments: &Clause) -> Result<()> {
    for (column, value) in assignments {
        if column == ID_COLUMN {
            return Err(Error::ReadOnlyColumn(column.clone()));
        }
        if let Some(col) = schema.get_col(column) {
            if col.data_type != value.data_type() {
                return Err(Error::TypeMismatch {
                    column: column.clone(),
                    expected: col.data_type,
                    actual: value.data_type(),
                });
            }
        }
    }
    Ok(())
}
