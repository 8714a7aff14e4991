use crate::adapters::Destination;
use crate::core::schema::quote_ident;
use crate::domain::model::{
    record_column, Column, TabularDataset, Value, PRIMARY_KEY, TABLE_NAME,
};
use crate::domain::ports::EventLog;
use crate::utils::error::{EtlError, Result};
use rusqlite::Connection;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub rows_written: usize,
    pub duplicates_removed: usize,
}

/// Drops rows equal in every column to an earlier row. Order of survivors is kept.
pub fn drop_duplicates(mut dataset: TabularDataset) -> (TabularDataset, usize) {
    let before = dataset.len();

    let mut seen: HashSet<Vec<Value>> = HashSet::with_capacity(before);
    dataset.retain_rows(|row| seen.insert(row.to_vec()));

    let removed = before - dataset.len();
    (dataset, removed)
}

/// `CREATE TABLE` for the dataset's own columns.
///
/// Columns that name a not-null column of the sales relation keep `NOT NULL`, and the
/// composite primary key is declared when the dataset carries all of its columns.
pub fn replacement_table_sql(columns: &[Column]) -> String {
    let mut definitions: Vec<String> = columns
        .iter()
        .map(|column| {
            let mut definition = format!(
                "{} {}",
                quote_ident(&column.name),
                column.data_type.sql_type()
            );
            if record_column(&column.name).is_some_and(|spec| spec.not_null) {
                definition.push_str(" NOT NULL");
            }
            definition
        })
        .collect();

    let key_columns: Vec<&Column> = PRIMARY_KEY
        .iter()
        .filter_map(|key| columns.iter().find(|c| c.name.eq_ignore_ascii_case(key)))
        .collect();
    if key_columns.len() == PRIMARY_KEY.len() {
        let key: Vec<String> = key_columns.iter().map(|c| quote_ident(&c.name)).collect();
        definitions.push(format!("PRIMARY KEY ({})", key.join(", ")));
    }

    format!(
        "CREATE TABLE {} ({})",
        quote_ident(TABLE_NAME),
        definitions.join(", ")
    )
}

fn insert_sql(columns: &[Column]) -> String {
    let names: Vec<String> = columns.iter().map(|c| quote_ident(&c.name)).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(TABLE_NAME),
        names.join(", "),
        placeholders.join(", ")
    )
}

fn replace_table(conn: &mut Connection, dataset: &TabularDataset) -> rusqlite::Result<usize> {
    // one transaction: a failed write leaves the previous snapshot untouched
    let tx = conn.transaction()?;
    tx.execute(&format!("DROP TABLE IF EXISTS {}", quote_ident(TABLE_NAME)), [])?;
    tx.execute(&replacement_table_sql(dataset.columns()), [])?;

    {
        let mut stmt = tx.prepare(&insert_sql(dataset.columns()))?;
        for row in dataset.rows() {
            stmt.execute(rusqlite::params_from_iter(row.iter()))?;
        }
    }

    tx.commit()?;
    Ok(dataset.len())
}

pub struct Loader {
    log: Arc<dyn EventLog>,
}

impl Loader {
    pub fn new(log: Arc<dyn EventLog>) -> Self {
        Self { log }
    }

    /// Removes exact duplicates, then replaces the destination table with the dataset.
    ///
    /// Rows that share a primary key but differ elsewhere are not reconciled here; the
    /// store rejects them and the whole write is abandoned.
    pub fn load(&self, destination: &Destination, dataset: TabularDataset) -> Result<LoadReport> {
        let (dataset, duplicates_removed) = drop_duplicates(dataset);
        if duplicates_removed > 0 {
            self.log.warning(&format!(
                "Removed {} duplicate rows before loading.",
                duplicates_removed
            ));
        }

        let missing_key: Vec<&str> = PRIMARY_KEY
            .iter()
            .copied()
            .filter(|key| {
                !dataset
                    .columns()
                    .iter()
                    .any(|c| c.name.eq_ignore_ascii_case(key))
            })
            .collect();
        if !missing_key.is_empty() {
            self.log.warning(&format!(
                "Key columns [{}] are absent; {} is written without a primary key.",
                missing_key.join(", "),
                TABLE_NAME
            ));
        }

        let result = destination.with_connection(|conn| {
            replace_table(conn, &dataset).map_err(|e| EtlError::LoadError {
                message: format!("writing {} failed: {}", TABLE_NAME, e),
            })
        });

        match result {
            Ok(rows_written) => {
                self.log.info(&format!(
                    "Data loaded successfully into the '{}' table ({} rows).",
                    TABLE_NAME, rows_written
                ));
                Ok(LoadReport {
                    rows_written,
                    duplicates_removed,
                })
            }
            Err(e) => {
                self.log.error(&format!(
                    "Error during loading into '{}' table: {}",
                    TABLE_NAME, e
                ));
                Err(e)
            }
        }
    }
}
