//! `primdb` command-line front end.
//!
//! Each invocation runs one operation against the store in the data
//! directory and exits.
//!
//! ```bash
//! primdb create-table users name:str age:int
//! primdb insert users John 28
//! primdb select users --where age=28
//! primdb update users --set age=30 --where name=John
//! primdb delete users --where ID=1
//! ```

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use primdb::{
    Clause, Config, Database, FileStorage, GuardOptions, Outcome, QueryCache, Record, Schema,
    Session, TableInfo, Value,
};
use tracing_subscriber::EnvFilter;

/// Minimal tabular data store
#[derive(Parser, Debug)]
#[command(name = "primdb", version, about)]
struct Args {
    /// Directory holding the schema registry and table data
    #[arg(short = 'd', long, env = "PRIMDB_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Do not ask for confirmation before destructive operations
    #[arg(short = 'y', long)]
    yes: bool,

    /// Enable verbose output
    #[arg(short = 'v', long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a table from <name>:<type> column specs (types: int, str, bool)
    CreateTable {
        name: String,
        columns: Vec<String>,
    },
    /// Drop a table and all of its records
    DropTable { name: String },
    /// List all tables
    List,
    /// Show the columns and row count of a table
    Info { name: String },
    /// Insert one record; values follow the column order, without ID
    Insert {
        table: String,
        #[arg(required = true)]
        values: Vec<String>,
    },
    /// Print records, optionally filtered with --where column=value
    Select {
        table: String,
        #[arg(short = 'w', long = "where", value_name = "COLUMN=VALUE", value_parser = parse_pair)]
        filter: Vec<(String, String)>,
    },
    /// Overwrite fields of matching records
    Update {
        table: String,
        #[arg(short = 's', long = "set", value_name = "COLUMN=VALUE", required = true, value_parser = parse_pair)]
        assignments: Vec<(String, String)>,
        #[arg(short = 'w', long = "where", value_name = "COLUMN=VALUE", value_parser = parse_pair, required_unless_present = "all")]
        filter: Vec<(String, String)>,
        /// Update every record
        #[arg(long, conflicts_with = "filter")]
        all: bool,
    },
    /// Delete matching records
    Delete {
        table: String,
        #[arg(short = 'w', long = "where", value_name = "COLUMN=VALUE", value_parser = parse_pair, required_unless_present = "all")]
        filter: Vec<(String, String)>,
        /// Delete every record
        #[arg(long, conflicts_with = "filter")]
        all: bool,
    },
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    let (column, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected COLUMN=VALUE, got {raw:?}"))?;
    let column = column.trim();
    if column.is_empty() {
        return Err(format!("missing column name in {raw:?}"));
    }
    Ok((column.to_string(), value.to_string()))
}

/// Types each `column=value` pair by its column in `schema`. Columns the
/// schema does not know and text that does not convert fall back to
/// [Value::parse_literal].
fn to_clause(schema: Option<&Schema>, pairs: Vec<(String, String)>) -> Clause {
    pairs
        .into_iter()
        .map(|(column, raw)| {
            let value = schema
                .and_then(|schema| schema.get_col(&column))
                .and_then(|col| col.data_type.convert(unquote(raw.trim())).ok())
                .unwrap_or_else(|| Value::parse_literal(&raw));
            (column, value)
        })
        .collect()
}

fn unquote(raw: &str) -> &str {
    ['"', '\'']
        .iter()
        .find_map(|&q| raw.strip_prefix(q).and_then(|rest| rest.strip_suffix(q)))
        .unwrap_or(raw)
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    if args.yes {
        config.confirm_destructive = false;
    }

    let cache = config.cache_enabled.then(QueryCache::new);
    let db = Database::open_with_cache(FileStorage::new(&config.data_dir), cache)?;
    let mut session = Session::new(db, GuardOptions::from(&config), prompt_confirm);

    let code = match args.command {
        Command::CreateTable { name, columns } => report(session.create_table(&name, &columns), |schema| {
            println!("Table \"{name}\" created with columns: {}", describe(&schema));
        }),
        Command::DropTable { name } => report(session.drop_table(&name), |_| {
            println!("Table \"{name}\" dropped.");
        }),
        Command::List => {
            for table in session.list_tables() {
                println!("- {table}");
            }
            ExitCode::SUCCESS
        }
        Command::Info { name } => report(session.table_info(&name), |info| print_info(&info)),
        Command::Insert { table, values } => report(session.insert(&table, &values), |id| {
            println!("Record with ID={id} inserted into \"{table}\".");
        }),
        Command::Select { table, filter } => {
            let schema = session.database().schema(&table).cloned();
            let filter = to_clause(schema.as_ref(), filter);
            let filter = (!filter.is_empty()).then_some(filter);
            report(session.select(&table, filter.as_ref()), |rows| match &schema {
                Some(schema) => print_records(schema, &rows),
                None => println!("{} record(s)", rows.len()),
            })
        }
        Command::Update {
            table,
            assignments,
            filter,
            ..
        } => {
            let schema = session.database().schema(&table).cloned();
            let assignments = to_clause(schema.as_ref(), assignments);
            let filter = to_clause(schema.as_ref(), filter);
            report(session.update(&table, &assignments, &filter), |matched| {
                println!("{matched} record(s) in \"{table}\" updated.");
            })
        }
        Command::Delete { table, filter, .. } => {
            let schema = session.database().schema(&table).cloned();
            let filter = to_clause(schema.as_ref(), filter);
            report(session.delete(&table, &filter), |deleted| {
                println!("{deleted} record(s) deleted from \"{table}\".");
            })
        }
    };

    Ok(code)
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("primdb=debug")
        } else {
            EnvFilter::new("primdb=warn,primdb::guard=info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .init();
}

fn prompt_confirm(action: &str) -> bool {
    print!("Are you sure you want to run \"{action}\"? [y/n]: ");
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => answer.trim().eq_ignore_ascii_case("y"),
        Err(_) => false,
    }
}

fn report<T>(outcome: Outcome<T>, on_done: impl FnOnce(T)) -> ExitCode {
    match outcome {
        Outcome::Done(value) => {
            on_done(value);
            ExitCode::SUCCESS
        }
        Outcome::Declined => {
            println!("Operation cancelled.");
            ExitCode::SUCCESS
        }
        failed @ Outcome::Failed { .. } => {
            eprintln!("{failed}");
            ExitCode::FAILURE
        }
    }
}

fn describe(schema: &Schema) -> String {
    schema
        .columns
        .iter()
        .map(|col| format!("{}:{}", col.name, col.data_type))
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_info(info: &TableInfo) {
    println!("Table: {}", info.name);
    println!("Columns: {}", describe(&info.schema));
    println!("Records: {}", info.rows);
}

fn print_records(schema: &Schema, records: &[Record]) {
    if records.is_empty() {
        println!("No records.");
        return;
    }

    let header = schema.column_names();
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|record| {
            record
                .row(schema)
                .into_iter()
                .map(|value| value.map(Value::to_string).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = header
        .iter()
        .enumerate()
        .map(|(i, name)| {
            rows.iter()
                .map(|row| row[i].len())
                .chain(std::iter::once(name.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join(" | ")
    };

    println!("{}", line(header.clone()));
    println!("{}", "-".repeat(widths.iter().sum::<usize>() + 3 * (widths.len() - 1)));
    for row in &rows {
        println!("{}", line(row.iter().map(String::as_str).collect()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair() {
        assert_eq!(parse_pair("age=28").unwrap(), ("age".into(), "28".into()));
        assert_eq!(
            parse_pair("name='John Smith'").unwrap(),
            ("name".into(), "'John Smith'".into())
        );
        assert_eq!(parse_pair("note=a=b").unwrap(), ("note".into(), "a=b".into()));
        assert!(parse_pair("age").is_err());
        assert!(parse_pair("=3").is_err());
    }

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter().map(|(c, v)| (c.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_clause_typed_by_schema() {
        let schema = Schema::from_specs(&["code:str", "age:int", "on:bool"]).unwrap();
        let typed = to_clause(
            Some(&schema),
            pairs(&[("code", "007"), ("age", "28"), ("on", "yes"), ("note", "12")]),
        );

        assert_eq!(typed["code"], Value::Text("007".into()));
        assert_eq!(typed["age"], Value::Int(28));
        assert_eq!(typed["on"], Value::Bool(true));
        // not a column: literal rules
        assert_eq!(typed["note"], Value::Int(12));
    }

    #[test]
    fn test_clause_fallbacks() {
        let schema = Schema::from_specs(&["name:str", "age:int"]).unwrap();
        let typed = to_clause(
            Some(&schema),
            pairs(&[("name", "'John Smith'"), ("age", "abc")]),
        );
        assert_eq!(typed["name"], Value::Text("John Smith".into()));
        assert_eq!(typed["age"], Value::Text("abc".into()));

        let untyped = to_clause(None, pairs(&[("code", "007")]));
        assert_eq!(untyped["code"], Value::Int(7));
    }

    #[test]
    fn test_text_digits_filter_matches() {
        let mut db = Database::open(primdb::MemoryStorage::new()).unwrap();
        db.create_table("codes", &["code:str"]).unwrap();
        db.insert("codes", &["007"]).unwrap();

        let filter = to_clause(db.schema("codes"), pairs(&[("code", "007")]));
        assert_eq!(db.select("codes", Some(&filter)).unwrap().len(), 1);

        let set = to_clause(db.schema("codes"), pairs(&[("code", "008")]));
        assert_eq!(db.update("codes", &set, &filter).unwrap(), 1);
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "primdb", "update", "users", "--set", "age=30", "--where", "name=John",
        ])
        .unwrap();
        match args.command {
            Command::Update { table, assignments, filter, all } => {
                assert_eq!(table, "users");
                assert_eq!(assignments, pairs(&[("age", "30")]));
                assert_eq!(filter, pairs(&[("name", "John")]));
                assert!(!all);
            }
            other => panic!("unexpected command {other:?}"),
        }

        assert!(Args::try_parse_from(["primdb", "delete", "users"]).is_err());
        assert!(Args::try_parse_from(["primdb", "delete", "users", "--all"]).is_ok());
    }

    #[test]
    fn test_describe() {
        let schema = Schema::from_specs(&["name:str", "age:int"]).unwrap();
        assert_eq!(describe(&schema), "ID:int, name:str, age:int");
    }
}
