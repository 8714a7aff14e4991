mod common;

use common::{read_rows, table_exists, Workspace};
use customer_sales_etl::utils::logger::{Level, MemoryLog};
use customer_sales_etl::{run_configured, run_etl, EtlError, EtlSettings};
use std::sync::Arc;

const ROW: &str = "536365,85123A,WHITE HANGING HEART,6,2010-12-01,2.55,17850,United Kingdom";

#[test]
fn test_run_etl_accepts_sqlite_url() {
    let ws = Workspace::new();
    let source = ws.source("sales.csv", &[ROW]);
    let url = format!("sqlite://{}", ws.db_path().display());

    run_etl(&url, &source).unwrap();

    assert_eq!(read_rows(&ws.db_path()).len(), 1);
}

#[test]
fn test_escaped_url_writes_the_named_file() {
    let ws = Workspace::new();
    let source = ws.source("sales.csv", &[ROW]);
    let url = format!("sqlite://{}/my sales.db", ws.dir.path().display());

    run_etl(&url, &source).unwrap();

    let intended = ws.dir.path().join("my sales.db");
    assert_eq!(read_rows(&intended).len(), 1);
    assert!(!ws.dir.path().join("my%20sales.db").exists());
}

#[test]
fn test_missing_source_still_provisions_table() {
    let ws = Workspace::new();

    let result = run_etl(&ws.db_url(), ws.dir.path().join("missing.csv"));

    assert!(matches!(result, Err(EtlError::NotFoundError { .. })));
    assert!(table_exists(&ws.db_path()));
}

#[test]
fn test_in_memory_destination_is_rejected() {
    let ws = Workspace::new();
    let source = ws.source("sales.csv", &[ROW]);

    let result = run_etl(":memory:", &source);

    assert!(matches!(result, Err(EtlError::ConfigError { .. })));
}

#[test]
fn test_fresh_start_discards_stale_store() {
    let ws = Workspace::new();
    let source = ws.source("sales.csv", &[ROW]);
    std::fs::write(ws.db_path(), vec![b'x'; 4096]).unwrap();

    let stale = EtlSettings {
        source: source.clone(),
        destination: ws.db_url(),
        ..EtlSettings::default()
    };
    let result = run_configured(&stale, Arc::new(MemoryLog::new()));
    assert!(matches!(result, Err(EtlError::SchemaError { .. })));

    let fresh = EtlSettings {
        fresh_start: true,
        ..stale
    };
    let log = Arc::new(MemoryLog::new());
    let summary = run_configured(&fresh, log.clone()).unwrap();

    assert_eq!(summary.rows_loaded, 1);
    assert_eq!(read_rows(&ws.db_path()).len(), 1);
    assert_eq!(
        log.messages(Level::Info)
            .iter()
            .filter(|m| m.as_str() == "ETL process completed successfully.")
            .count(),
        1
    );
}
