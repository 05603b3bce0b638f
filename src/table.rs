use std::collections::BTreeMap;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::data_type::DataType;
use crate::error::{Error, Result};
use crate::value::Value;

/// Name of the identifier column every schema starts with.
pub const ID_COLUMN: &str = "ID";

/// Column definition in the schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    /// Parses a `<name>:<type>` column spec.
    ///
    /// # Errors
    /// [Error::MalformedColumnSpec] if the spec does not contain exactly one
    /// `:` or the name is empty, [Error::UnknownType] if the type token is not
    /// a supported type.
    pub fn parse(spec: &str) -> Result<Self> {
        let mut parts = spec.split(':');
        let (Some(name), Some(type_token), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::MalformedColumnSpec(spec.to_string()));
        };

        let name = name.trim();
        if name.is_empty() {
            return Err(Error::MalformedColumnSpec(spec.to_string()));
        }

        Ok(Self::new(name, type_token.trim().parse()?))
    }
}

/// Ordered column definitions of a table, always starting with `ID:int`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub columns: Vec<ColumnDef>,
}

impl Schema {
    /// Builds a schema from caller column specs, prepending the implicit
    /// `ID:int` column.
    ///
    /// # Errors
    /// Fails on the first malformed spec, unknown type, or repeated column
    /// name. A caller-supplied `ID` column counts as a repeat.
    pub fn from_specs<S: AsRef<str>>(specs: &[S]) -> Result<Self> {
        let mut columns = vec![ColumnDef::new(ID_COLUMN, DataType::Int)];
        let mut seen: HashSet<String> = HashSet::from([ID_COLUMN.to_string()]);

        for spec in specs {
            let column = ColumnDef::parse(spec.as_ref())?;
            if !seen.insert(column.name.clone()) {
                return Err(Error::DuplicateColumn(column.name));
            }
            columns.push(column);
        }

        Ok(Self { columns })
    }

    pub fn get_col(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|col| col.name == name)
    }

    /// Columns the caller provides values for, i.e. everything but `ID`.
    pub fn data_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|col| col.name != ID_COLUMN)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|col| col.name.as_str()).collect()
    }
}

/// One row: column name to typed value, always containing `ID`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn id(&self) -> Option<i64> {
        self.get(ID_COLUMN).and_then(Value::as_int)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    /// Overwrites an existing field. Returns `false` and leaves the record
    /// untouched when the column is not present.
    pub fn set(&mut self, column: &str, value: Value) -> bool {
        match self.0.get_mut(column) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Values laid out in schema column order, `None` for absent fields.
    pub fn row(&self, schema: &Schema) -> Vec<Option<&Value>> {
        schema.columns.iter().map(|col| self.get(&col.name)).collect()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Persisted state of a single table.
///
/// `next_id` is strictly greater than every ID ever handed out by this
/// collection, including IDs of records that were deleted since.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCollection {
    pub next_id: i64,
    pub records: Vec<Record>,
}

impl Default for TableCollection {
    fn default() -> Self {
        Self {
            next_id: 1,
            records: Vec::new(),
        }
    }
}

impl TableCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Converts `raw_values` positionally against the data columns of
    /// `schema`, assigns the next ID and appends the record.
    ///
    /// All values are converted before anything is appended, so a failure
    /// leaves the collection unchanged.
    ///
    /// # Errors
    /// [Error::ArityMismatch] when the number of values differs from the
    /// number of data columns, [Error::InvalidValue] on the first value that
    /// does not convert to its column type.
    pub fn insert<S: AsRef<str>>(&mut self, schema: &Schema, raw_values: &[S]) -> Result<i64> {
        let data_columns: Vec<&ColumnDef> = schema.data_columns().collect();
        if raw_values.len() != data_columns.len() {
            return Err(Error::ArityMismatch {
                expected: data_columns.len(),
                actual: raw_values.len(),
            });
        }

        let mut record = data_columns
            .iter()
            .zip(raw_values)
            .map(|(col, raw)| {
                col.data_type
                    .convert(raw.as_ref())
                    .map(|value| (col.name.clone(), value))
                    .map_err(|err| Error::invalid_value(&col.name, err))
            })
            .collect::<Result<BTreeMap<String, Value>>>()?;

        let id = self.next_id;
        record.insert(ID_COLUMN.to_string(), Value::Int(id));
        self.records.push(Record(record));
        self.next_id += 1;

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users_schema() -> Schema {
        Schema::from_specs(&["name:str", "age:int"]).unwrap()
    }

    #[test]
    fn test_schema_starts_with_id() {
        let schema = users_schema();
        assert_eq!(schema.column_names(), vec!["ID", "name", "age"]);
        assert_eq!(schema.columns[0], ColumnDef::new("ID", DataType::Int));
        assert_eq!(schema.get_col("age").unwrap().data_type, DataType::Int);
        assert!(schema.get_col("email").is_none());

        let empty = Schema::from_specs::<&str>(&[]).unwrap();
        assert_eq!(empty.column_names(), vec!["ID"]);
    }

    #[test]
    fn test_column_spec_errors() {
        assert!(matches!(
            ColumnDef::parse("name"),
            Err(Error::MalformedColumnSpec(_))
        ));
        assert!(matches!(
            ColumnDef::parse("a:int:x"),
            Err(Error::MalformedColumnSpec(_))
        ));
        assert!(matches!(
            ColumnDef::parse(":int"),
            Err(Error::MalformedColumnSpec(_))
        ));
        assert!(matches!(
            ColumnDef::parse("price:float"),
            Err(Error::UnknownType(_))
        ));
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        assert!(matches!(
            Schema::from_specs(&["a:int", "a:str"]),
            Err(Error::DuplicateColumn(c)) if c == "a"
        ));
        assert!(matches!(
            Schema::from_specs(&["ID:int"]),
            Err(Error::DuplicateColumn(c)) if c == "ID"
        ));
    }

    #[test]
    fn test_table_insert_and_get() {
        let schema = users_schema();
        let mut table = TableCollection::new();

        assert_eq!(table.insert(&schema, &["John", "28"]).unwrap(), 1);
        assert_eq!(table.insert(&schema, &["Ann", "31"]).unwrap(), 2);

        assert_eq!(table.len(), 2);
        assert_eq!(table.next_id, 3);

        let row0 = &table.records[0];
        assert_eq!(row0.id(), Some(1));
        assert_eq!(row0.get("name"), Some(&Value::Text("John".into())));
        assert_eq!(row0.get("age"), Some(&Value::Int(28)));
        assert_eq!(row0.len(), 3);
    }

    #[test]
    fn test_column_count_mismatch() {
        let schema = users_schema();
        let mut table = TableCollection::new();

        // too many values
        let result = table.insert(&schema, &["a", "1", "x"]);
        assert!(matches!(
            result,
            Err(Error::ArityMismatch {
                expected: 2,
                actual: 3
            })
        ));

        // not enough values
        assert!(table.insert::<&str>(&schema, &[]).is_err());
        assert_eq!(table, TableCollection::new());
    }

    #[test]
    fn test_invalid_value_leaves_table_unchanged() {
        let schema = users_schema();
        let mut table = TableCollection::new();

        let err = table.insert(&schema, &["John", "abc"]).unwrap_err();
        match err {
            Error::InvalidValue {
                column,
                value,
                expected,
            } => {
                assert_eq!(column, "age");
                assert_eq!(value, "abc");
                assert_eq!(expected, DataType::Int);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(table.is_empty());
        assert_eq!(table.next_id, 1);
    }

    #[test]
    fn test_record_set_only_existing() {
        let mut record: Record = [("ID", Value::Int(1)), ("age", Value::Int(3))]
            .into_iter()
            .collect();

        assert!(record.set("age", Value::Int(4)));
        assert!(!record.set("email", Value::Text("x".into())));
        assert_eq!(record.get("age"), Some(&Value::Int(4)));
        assert!(!record.contains("email"));
    }

    #[test]
    fn test_row_in_schema_order() {
        let schema = users_schema();
        let mut table = TableCollection::new();
        table.insert(&schema, &["John", "28"]).unwrap();

        let row = table.records[0].row(&schema);
        assert_eq!(
            row,
            vec![
                Some(&Value::Int(1)),
                Some(&Value::Text("John".into())),
                Some(&Value::Int(28))
            ]
        );
    }

    #[test]
    fn test_collection_json_round_trip() {
        let schema = users_schema();
        let mut table = TableCollection::new();
        table.insert(&schema, &["John", "28"]).unwrap();

        let json = serde_json::to_string(&table).unwrap();
        let back: TableCollection = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }
}
