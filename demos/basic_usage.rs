// Example: Basic cursor usage
// Run with: cargo run --example basic_usage

use sqlcursor::{
    Column, Conditions, DataType, Database, Direction, MemoryDatabase, TracingInstrument, Value,
};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    println!("=== sqlcursor Basic Usage Example ===\n");

    // 1. Create a table and some data
    let mut memory = MemoryDatabase::new();
    memory.create_table(
        "users",
        vec![
            Column::new("id", DataType::Integer).not_null(),
            Column::new("name", DataType::Text),
            Column::new("age", DataType::Integer),
            Column::new("active", DataType::Boolean),
        ],
    )?;
    let users = [
        (1, "Alice Johnson", 30, true),
        (2, "Bob Smith", 25, true),
        (3, "Charlie Brown", 35, false),
        (4, "Diana Prince", 28, true),
        (5, "Eve Adams", 32, true),
    ];
    for (id, name, age, active) in users {
        memory.insert("users", vec![id.into(), name.into(), age.into(), active.into()])?;
    }

    // Every query is logged with its execution time
    let db = Database::new(memory).with_instrument(TracingInstrument);

    // 2. All rows
    println!("1. All users:");
    for row in db.select("users").fetch()?.into_rows().unwrap_or_default() {
        println!("   {}", serde_json::to_string(&row)?);
    }

    // 3. Comparison filter, projection and ordering
    println!("\n2. Users aged 30 or more, oldest first:");
    let mut cursor = db
        .select("users")
        .filter_by(Conditions::new().with("age", ">=30"))
        .project(["name", "age"])
        .order_by("age", Some(Direction::Desc));
    println!("   SQL: {}", cursor.compile());
    println!("   {}", serde_json::to_string(&cursor.fetch()?)?);

    // 4. Wildcards become LIKE
    println!("\n3. Active users whose second letter is 'l':");
    let names = db
        .select("users")
        .filter_by(Conditions::new().with("name", "?l*").with("active", true))
        .as_column("name")
        .fetch()?;
    println!("   {}", serde_json::to_string(&names)?);

    // 5. Single values and counts
    let oldest = db
        .select("users")
        .project(["name"])
        .order_by("age", Some(Direction::Desc))
        .as_value()
        .fetch()?;
    println!("\n4. Oldest user: {}", oldest.into_value().unwrap_or(Value::Null));

    let active = db
        .select("users")
        .filter_by(Conditions::new().with("active", true))
        .as_count()
        .fetch()?;
    println!("5. Active users: {:?}", active.into_count());

    // 6. Missing rows are not errors for the row shape
    let nobody = db
        .select("users")
        .filter_by(Conditions::new().with("name", "Zed"))
        .as_row()
        .fetch()?;
    println!("6. Lookup of 'Zed': {:?}", nobody.into_row().flatten());

    db.close();
    println!("\n=== Example Complete ===");
    Ok(())
}
