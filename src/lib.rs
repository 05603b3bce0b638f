pub mod cache;
pub mod config;
pub mod data_type;
pub mod database;
pub mod error;
pub mod guard;
pub mod query;
pub mod schema;
pub mod session;
pub mod storage;
pub mod table;
pub mod value;

pub use cache::{CacheStats, QueryCache};
pub use config::Config;
pub use data_type::DataType;
pub use database::{Database, TableInfo};
pub use error::{Error, ErrorKind, Result};
pub use guard::{Confirm, OperationGuard, Outcome};
pub use query::Clause;
pub use schema::SchemaRegistry;
pub use session::{GuardOptions, Session};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use table::{ColumnDef, Record, Schema, TableCollection};
pub use value::Value;
