use once_cell::sync::OnceCell;
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};

static DB_CONN: OnceCell<DatabaseConnection> = OnceCell::new();

/// Sales fact schema: orders shipped to a state, with product lines,
/// an optional salesperson and an optional store.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS d402_state_province (
        id INTEGER PRIMARY KEY NOT NULL,
        code TEXT NOT NULL,
        name TEXT NOT NULL,
        country_code TEXT NOT NULL DEFAULT 'US'
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS d402_product (
        id INTEGER PRIMARY KEY NOT NULL,
        name TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS d402_sales_person (
        id INTEGER PRIMARY KEY NOT NULL,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS d402_store (
        id INTEGER PRIMARY KEY NOT NULL,
        name TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS d402_sales_order (
        id INTEGER PRIMARY KEY NOT NULL,
        order_date TEXT NOT NULL,
        ship_state_id INTEGER NOT NULL REFERENCES d402_state_province(id),
        sales_person_id INTEGER REFERENCES d402_sales_person(id),
        store_id INTEGER REFERENCES d402_store(id)
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS d402_sales_order_detail (
        id INTEGER PRIMARY KEY NOT NULL,
        order_id INTEGER NOT NULL REFERENCES d402_sales_order(id),
        product_id INTEGER NOT NULL REFERENCES d402_product(id),
        line_total REAL NOT NULL
    );
    "#,
    "CREATE INDEX IF NOT EXISTS idx_d402_sales_order_date ON d402_sales_order(order_date);",
    "CREATE INDEX IF NOT EXISTS idx_d402_detail_order ON d402_sales_order_detail(order_id);",
];

/// Open the SQLite file, bootstrap the schema and store the process-wide connection
pub async fn initialize_database(db_path: Option<&str>) -> anyhow::Result<()> {
    let db_file = db_path.unwrap_or("target/db/app.db");
    if let Some(parent) = std::path::Path::new(db_file).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if std::path::Path::new(db_file).is_absolute() {
        std::path::PathBuf::from(db_file)
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);
    tracing::info!("Connecting to database at {}", absolute_path.display());
    let conn = Database::connect(&db_url).await?;

    ensure_schema(&conn).await?;

    DB_CONN
        .set(conn)
        .map_err(|_| anyhow::anyhow!("Failed to set DB_CONN"))?;
    Ok(())
}

/// Create the sales tables if they do not exist
pub async fn ensure_schema<C: ConnectionTrait>(conn: &C) -> Result<(), sea_orm::DbErr> {
    for sql in SCHEMA {
        conn.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            sql.to_string(),
        ))
        .await?;
    }
    Ok(())
}

pub fn get_connection() -> &'static DatabaseConnection {
    DB_CONN
        .get()
        .expect("Database connection has not been initialized")
}

#[cfg(test)]
pub(crate) async fn memory_connection() -> DatabaseConnection {
    let mut options = sea_orm::ConnectOptions::new("sqlite::memory:".to_string());
    // Every pooled connection would get its own in-memory database
    options.max_connections(1).min_connections(1);
    let conn = Database::connect(options).await.unwrap();
    ensure_schema(&conn).await.unwrap();
    conn
}
