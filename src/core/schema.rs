use crate::adapters::Destination;
use crate::domain::model::{PRIMARY_KEY, RECORD_COLUMNS, TABLE_NAME};
use crate::domain::ports::EventLog;
use crate::utils::error::{EtlError, Result};
use rusqlite::Connection;
use std::sync::Arc;

pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `CREATE TABLE IF NOT EXISTS` for the sales relation with its composite key.
pub fn create_table_sql() -> String {
    let columns: Vec<String> = RECORD_COLUMNS
        .iter()
        .map(|spec| {
            let mut column = format!("    {} {}", spec.name, spec.sql_type);
            if spec.not_null {
                column.push_str(" NOT NULL");
            }
            column
        })
        .collect();

    format!(
        "CREATE TABLE IF NOT EXISTS {}(\n{},\n    PRIMARY KEY ({})\n);",
        TABLE_NAME,
        columns.join(",\n"),
        PRIMARY_KEY.join(", ")
    )
}

/// Names of all tables in the store's catalog.
pub fn list_tables(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}

pub struct SchemaProvisioner {
    log: Arc<dyn EventLog>,
}

impl SchemaProvisioner {
    pub fn new(log: Arc<dyn EventLog>) -> Self {
        Self { log }
    }

    /// Creates the relation when absent and verifies it through the catalog.
    pub fn ensure_schema(&self, destination: &Destination) -> Result<()> {
        destination
            .with_connection(|conn| self.provision(conn))
            .inspect_err(|e| {
                self.log
                    .error(&format!("Error creating {} table: {}", TABLE_NAME, e));
            })
    }

    fn provision(&self, conn: &mut Connection) -> Result<()> {
        conn.execute_batch(&create_table_sql())
            .map_err(|e| EtlError::SchemaError {
                message: format!("cannot create {}: {}", TABLE_NAME, e),
            })?;

        let tables = list_tables(conn).map_err(|e| EtlError::SchemaError {
            message: format!("cannot read the catalog: {}", e),
        })?;
        self.log
            .debug(&format!("Tables present in the database: {:?}", tables));

        if !tables.iter().any(|name| name == TABLE_NAME) {
            return Err(EtlError::SchemaError {
                message: format!("table {} was not created as expected", TABLE_NAME),
            });
        }

        self.log.info(&format!("{} table is present.", TABLE_NAME));
        Ok(())
    }
}
