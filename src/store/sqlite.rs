//! Local SQLite copy of the inventory table
//!
//! Used for development and tests. Uses parameterized queries exclusively and
//! wraps imports in a transaction.

use super::{InventoryRow, InventoryStore, StoreResult};
use crate::error::StoreError;
use rusqlite::types::Value;
use rusqlite::{params, Connection, Row, ToSql};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const COLUMNS: &str = "id, plant_name, scientific_name, category, description, image_url, sku,
     item_type, unit, age, quantity, price, ready_for_sale, created_at, updated_at";

/// Returns the default database path: ~/.local/share/nursery_feed/inventory.db
pub fn default_db_path() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("nursery_feed")
        .join("inventory.db")
        .to_string_lossy()
        .to_string()
}

/// Inventory store backed by a SQLite connection
#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database file and initialise the schema
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
                log::info!("Created directory: {}", parent.display());
            }
        }
        let conn = Connection::open(path)?;
        log::info!("Opened database: {}", path.display());
        Self::from_connection(conn)
    }

    /// In-memory database, empty schema
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        init_schema(&conn)?;
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the underlying connection
    pub fn with_connection<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut conn = self.db.lock().map_err(|_| StoreError::LockPoisoned)?;
        f(&mut conn)
    }

    /// Upsert rows (e.g. a JSON export of the hosted table) in one transaction
    ///
    /// Returns the number of rows written.
    pub fn import_rows(&self, rows: &[InventoryRow]) -> StoreResult<usize> {
        self.with_connection(|conn| {
            let tx = conn.transaction()?;
            let mut count = 0;
            {
                let mut stmt = tx.prepare_cached(&format!(
                    "INSERT OR REPLACE INTO inventory ({COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
                ))?;
                for row in rows {
                    let quantity = number_value(row.quantity, &row.quantity_unparsed);
                    let price = number_value(row.price, &row.price_unparsed);
                    stmt.execute(params![
                        &row.id,
                        &row.plant_name,
                        &row.scientific_name,
                        &row.category,
                        &row.description,
                        &row.image_url,
                        &row.sku,
                        &row.item_type,
                        &row.unit,
                        &row.age,
                        quantity,
                        price,
                        row.ready_for_sale,
                        &row.created_at,
                        &row.updated_at,
                    ])?;
                    count += 1;
                }
            }
            tx.commit()?;
            log::info!("Imported {} inventory rows", count);
            Ok(count)
        })
    }

    /// Read a JSON array of rows from disk and import it
    pub fn import_json_file(&self, path: &Path) -> StoreResult<usize> {
        let json = std::fs::read_to_string(path)?;
        let rows: Vec<InventoryRow> = serde_json::from_str(&json)?;
        self.import_rows(&rows)
    }

    fn query_rows(&self, sql: &str, args: &[&dyn ToSql]) -> StoreResult<Vec<InventoryRow>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt
                .query_map(args, read_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }
}

#[async_trait::async_trait]
impl InventoryStore for SqliteStore {
    async fn list_feed_rows(&self) -> StoreResult<Vec<InventoryRow>> {
        self.query_rows(
            &format!(
                "SELECT {COLUMNS} FROM inventory
                 WHERE ready_for_sale = 1
                   AND (item_type = 'Honey' OR category = 'Organic Honey' OR item_type IS NULL)
                 ORDER BY plant_name"
            ),
            &[],
        )
    }

    async fn list_all_rows(&self) -> StoreResult<Vec<InventoryRow>> {
        self.query_rows(
            &format!("SELECT {COLUMNS} FROM inventory ORDER BY created_at"),
            &[],
        )
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<InventoryRow>> {
        let mut rows = self.query_rows(
            &format!("SELECT {COLUMNS} FROM inventory WHERE id = ?1 LIMIT 1"),
            &[&id],
        )?;
        Ok(rows.pop())
    }
}

/// Create the `inventory` table if it does not already exist
///
/// Numeric columns use NUMERIC affinity so hand-entered junk (e.g. a price of
/// `'free'`) survives as text and is rejected later by the feed validation.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS inventory (
            id TEXT PRIMARY KEY,
            plant_name TEXT,
            scientific_name TEXT,
            category TEXT,
            description TEXT,
            image_url TEXT,
            sku TEXT,
            item_type TEXT,
            unit TEXT,
            age TEXT,
            quantity NUMERIC,
            price NUMERIC,
            ready_for_sale INTEGER,
            created_at TEXT,
            updated_at TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_inventory_ready ON inventory(ready_for_sale);
        CREATE INDEX IF NOT EXISTS idx_inventory_item_type ON inventory(item_type);
        ",
    )?;

    log::debug!("Inventory schema initialized");
    Ok(())
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<InventoryRow> {
    let (quantity, quantity_unparsed) = number(row, 10)?;
    let (price, price_unparsed) = number(row, 11)?;
    Ok(InventoryRow {
        id: text(row, 0)?,
        plant_name: text(row, 1)?,
        scientific_name: text(row, 2)?,
        category: text(row, 3)?,
        description: text(row, 4)?,
        image_url: text(row, 5)?,
        sku: text(row, 6)?,
        item_type: text(row, 7)?,
        unit: text(row, 8)?,
        age: text(row, 9)?,
        quantity,
        price,
        ready_for_sale: flag(row, 12)?,
        created_at: text(row, 13)?,
        updated_at: text(row, 14)?,
        quantity_unparsed,
        price_unparsed,
    })
}

fn text(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    Ok(match row.get::<_, Value>(idx)? {
        Value::Text(s) => Some(s),
        Value::Integer(i) => Some(i.to_string()),
        Value::Real(f) => Some(f.to_string()),
        Value::Null | Value::Blob(_) => None,
    })
}

/// Numeric column as (number, leftover text)
fn number(row: &Row<'_>, idx: usize) -> rusqlite::Result<(Option<f64>, Option<String>)> {
    Ok(match row.get::<_, Value>(idx)? {
        Value::Integer(i) => (Some(i as f64), None),
        Value::Real(f) => (Some(f), None),
        Value::Text(s) => (None, Some(s)),
        Value::Null | Value::Blob(_) => (None, None),
    })
}

fn number_value(value: Option<f64>, unparsed: &Option<String>) -> Value {
    match (value, unparsed) {
        (Some(f), _) => Value::Real(f),
        (None, Some(s)) => Value::Text(s.clone()),
        (None, None) => Value::Null,
    }
}

fn flag(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<bool>> {
    Ok(match row.get::<_, Value>(idx)? {
        Value::Integer(i) => Some(i != 0),
        _ => None,
    })
}
