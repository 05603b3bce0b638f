use primdb::{
    Database, GuardOptions, MemoryStorage, Outcome, Session, Value,
    query::{Clause, clause},
};

fn main() -> Result<(), primdb::Error> {
    println!("Tabular Store Demo\n");

    // Create DB
    let db = Database::open(MemoryStorage::new())?;
    let options = GuardOptions {
        confirm_destructive: true,
        log_timing: false,
    };
    // refuse to drop anything, allow deletes
    let mut session = Session::new(db, options, |action: &str| action != "drop_table");

    // Create table "users"
    if let Outcome::Done(schema) = session.create_table("users", &["name:str", "age:int"]) {
        println!("Created table 'users' with columns {:?}", schema.column_names());
    }

    // Insert data
    println!("Inserting data...");
    for row in [["Alice", "30"], ["Bob", "41"], ["Charlie", "25"]] {
        session.insert("users", &row);
    }
    println!("Bad row: {}", session.insert("users", &["Dave", "old"]));
    println!();

    // Read and Printing data
    println!("Reading data:");
    println!("{:<5} {:<10} {:<5}", "ID", "NAME", "AGE");
    println!("{}", "-".repeat(25));

    let rows = session.select("users", None).ok().unwrap_or_default();
    for row in &rows {
        let field = |name: &str| row.get(name).map(Value::to_string).unwrap_or_default();
        println!("{:<5} {:<10} {:<5}", field("ID"), field("name"), field("age"));
    }
    println!();

    // Update, delete and the cache
    session.update("users", &clause([("age", 31)]), &clause([("name", "Alice")]));
    session.select("users", Some(&clause([("age", 31)])));
    session.select("users", Some(&clause([("age", 31)])));
    println!("Cache after two identical selects: {:?}", session.cache_stats().hits);

    println!("delete Bob: {:?}", session.delete("users", &clause([("name", "Bob")])));
    println!("drop users: {}", session.drop_table("users"));
    println!("delete all: {:?}", session.delete("users", &Clause::new()));

    // List tables
    println!("Tables in database:");
    for table_name in session.list_tables() {
        println!("  - {}", table_name);
    }

    Ok(())
}
