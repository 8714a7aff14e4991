#![allow(dead_code)]

use rusqlite::types::Value as SqlValue;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const HEADER: &str =
    "InvoiceNo,StockCode,Description,Quantity,InvoiceDate,UnitPrice,CustomerID,Country";

pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join("ecommerce.db")
    }

    pub fn db_url(&self) -> String {
        self.db_path().to_string_lossy().to_string()
    }

    /// Writes `HEADER` followed by `rows` to a CSV file inside the workspace.
    pub fn source(&self, name: &str, rows: &[&str]) -> PathBuf {
        self.raw_source(name, &format!("{}\n{}", HEADER, lines(rows)))
    }

    pub fn raw_source(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }
}

fn lines(rows: &[&str]) -> String {
    rows.iter().map(|row| format!("{}\n", row)).collect()
}

pub fn table_exists(db: &Path) -> bool {
    let conn = Connection::open(db).unwrap();
    conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master \
         WHERE type = 'table' AND name = 'Customer_Sale_Analytics'",
        [],
        |row| row.get::<_, i64>(0),
    )
    .unwrap()
        == 1
}

/// Every row of the sales table, rendered for order-insensitive comparison.
pub fn read_rows(db: &Path) -> Vec<Vec<SqlValue>> {
    let conn = Connection::open(db).unwrap();
    let mut stmt = conn
        .prepare("SELECT * FROM Customer_Sale_Analytics ORDER BY rowid")
        .unwrap();
    let width = stmt.column_count();
    let rows = stmt
        .query_map([], |row| {
            (0..width)
                .map(|i| row.get::<_, SqlValue>(i))
                .collect::<rusqlite::Result<Vec<_>>>()
        })
        .unwrap()
        .collect::<rusqlite::Result<Vec<_>>>()
        .unwrap();
    rows
}

pub fn as_set(rows: &[Vec<SqlValue>]) -> Vec<String> {
    let mut rendered: Vec<String> = rows.iter().map(|row| format!("{:?}", row)).collect();
    rendered.sort();
    rendered
}
