//! Full-scan query evaluation over a [TableCollection].
//!
//! Filters are equality-only and AND-combined: a record matches when every
//! filtered column is present in the record with an equal value. A record
//! missing a filtered column never matches.

use std::collections::BTreeMap;

use crate::table::{Record, TableCollection};
use crate::value::Value;

/// Column name to literal mapping, used both as a filter (WHERE) and as a
/// set of assignments (SET).
pub type Clause = BTreeMap<String, Value>;

/// Builds a [Clause] from `(column, value)` pairs.
///
/// ```
/// # use primdb::{query::clause, Value};
/// let filter = clause([("age", Value::Int(28))]);
/// assert_eq!(filter.get("age"), Some(&Value::Int(28)));
/// ```
pub fn clause<K, V, I>(pairs: I) -> Clause
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Returns `true` if `record` satisfies every condition of `filter`.
/// An empty filter matches everything.
pub fn matches(record: &Record, filter: &Clause) -> bool {
    filter
        .iter()
        .all(|(column, expected)| record.get(column) == Some(expected))
}

/// Scans the collection and applies `map_fn` to every record satisfying
/// `filter` (all records when `filter` is `None`).
///
/// `map_fn` receives the record index and the record and decides what is
/// collected (e.g. the index or a copy of the record).
fn filter_rows<T, F>(collection: &TableCollection, filter: Option<&Clause>, mut map_fn: F) -> Vec<T>
where
    F: FnMut(usize, &Record) -> T,
{
    collection
        .records
        .iter()
        .enumerate()
        .filter(|(_, record)| filter.is_none_or(|f| matches(record, f)))
        .map(|(i, record)| map_fn(i, record))
        .collect()
}

/// Returns copies of the records matching `filter`, in storage order.
///
/// # Example
/// ```
/// # use primdb::{query, Schema, TableCollection, Value};
/// let schema = Schema::from_specs(&["name:str", "age:int"]).unwrap();
/// let mut users = TableCollection::new();
/// users.insert(&schema, &["John", "28"]).unwrap();
/// users.insert(&schema, &["Ann", "31"]).unwrap();
///
/// let found = query::select(&users, Some(&query::clause([("age", 28)])));
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0].get("name"), Some(&Value::Text("John".into())));
/// assert_eq!(query::select(&users, None).len(), 2);
/// ```
pub fn select(collection: &TableCollection, filter: Option<&Clause>) -> Vec<Record> {
    filter_rows(collection, filter, |_, record| record.clone())
}

/// Overwrites fields of every record matching `filter`.
///
/// Only assignments to columns already present in a record are applied;
/// other keys are ignored. An empty `filter` matches every record.
///
/// Returns the number of matched records, whether or not a value actually
/// changed.
pub fn update(collection: &mut TableCollection, assignments: &Clause, filter: &Clause) -> usize {
    let rows = filter_rows(collection, Some(filter), |i, _| i);

    for &row in &rows {
        let record = &mut collection.records[row];
        for (column, value) in assignments {
            record.set(column, value.clone());
        }
    }

    rows.len()
}

/// Removes every record matching `filter` and returns how many were removed.
/// Remaining records keep their order. An empty `filter` removes everything.
pub fn delete(collection: &mut TableCollection, filter: &Clause) -> usize {
    let before = collection.records.len();
    collection.records.retain(|record| !matches(record, filter));
    before - collection.records.len()
}
