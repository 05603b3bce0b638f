//! Caller-facing surface: every operation of [Database] run through an
//! [OperationGuard].

use crate::cache::CacheStats;
use crate::config::Config;
use crate::database::{Database, TableInfo};
use crate::guard::{AlwaysConfirm, Confirm, OperationGuard, Outcome};
use crate::query::Clause;
use crate::table::{Record, Schema};

/// Which guard layers a [Session] applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardOptions {
    /// Ask the [Confirm] capability before `drop_table` and `delete`.
    pub confirm_destructive: bool,
    /// Log the duration of each operation.
    pub log_timing: bool,
}

impl Default for GuardOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for GuardOptions {
    fn from(config: &Config) -> Self {
        Self {
            confirm_destructive: config.confirm_destructive,
            log_timing: config.log_timing,
        }
    }
}

/// A [Database] whose operations never fail outright: errors come back as
/// [Outcome::Failed] and refused confirmations as [Outcome::Declined].
///
/// # Example
/// ```
/// use primdb::{Database, MemoryStorage, Session, GuardOptions, Outcome, ErrorKind};
///
/// let db = Database::open(MemoryStorage::new()).unwrap();
/// let mut session = Session::new(db, GuardOptions::default(), |_: &str| false);
///
/// assert!(session.create_table("users", &["name:str"]).is_done());
/// assert_eq!(session.drop_table("users"), Outcome::Declined);
/// assert_eq!(
///     session.create_table("users", &["name:str"]).kind(),
///     Some(ErrorKind::AlreadyExists)
/// );
/// ```
pub struct Session {
    db: Database,
    confirm: Box<dyn Confirm>,
    options: GuardOptions,
}

impl Session {
    pub fn new(db: Database, options: GuardOptions, confirm: impl Confirm + 'static) -> Self {
        Self {
            db,
            confirm: Box::new(confirm),
            options,
        }
    }

    /// A session that never asks for confirmation.
    pub fn unconfirmed(db: Database, log_timing: bool) -> Self {
        let options = GuardOptions {
            confirm_destructive: false,
            log_timing,
        };
        Self::new(db, options, AlwaysConfirm)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn into_database(self) -> Database {
        self.db
    }

    /// Runs `op` against the database behind the configured layers.
    fn guarded<T>(
        &mut self,
        action: &str,
        destructive: bool,
        op: impl FnOnce(&mut Database) -> crate::Result<T>,
    ) -> Outcome<T> {
        let Self {
            db,
            confirm,
            options,
        } = self;

        let mut guard = OperationGuard::new(action);
        if options.log_timing {
            guard = guard.timed();
        }
        if destructive && options.confirm_destructive {
            guard = guard.confirmed_by(&mut **confirm);
        }
        guard.run(|| op(db))
    }

    pub fn create_table<S: AsRef<str>>(&mut self, name: &str, column_specs: &[S]) -> Outcome<Schema> {
        self.guarded("create_table", false, |db| db.create_table(name, column_specs))
    }

    pub fn drop_table(&mut self, name: &str) -> Outcome<Schema> {
        self.guarded("drop_table", true, |db| db.drop_table(name))
    }

    pub fn insert<S: AsRef<str>>(&mut self, table: &str, raw_values: &[S]) -> Outcome<i64> {
        self.guarded("insert", false, |db| db.insert(table, raw_values))
    }

    pub fn select(&mut self, table: &str, filter: Option<&Clause>) -> Outcome<Vec<Record>> {
        self.guarded("select", false, |db| db.select(table, filter))
    }

    pub fn update(&mut self, table: &str, assignments: &Clause, filter: &Clause) -> Outcome<usize> {
        self.guarded("update", false, |db| db.update(table, assignments, filter))
    }

    pub fn delete(&mut self, table: &str, filter: &Clause) -> Outcome<usize> {
        self.guarded("delete", true, |db| db.delete(table, filter))
    }

    pub fn table_info(&mut self, table: &str) -> Outcome<TableInfo> {
        self.guarded("info", false, |db| db.table_info(table))
    }

    pub fn list_tables(&self) -> Vec<&str> {
        self.db.list_tables()
    }

    pub fn clear_cache(&mut self) {
        self.db.clear_cache();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.db.cache_stats()
    }
}
