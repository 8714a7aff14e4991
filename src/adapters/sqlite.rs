use crate::domain::model::Value;
use crate::domain::ports::EventLog;
use crate::utils::error::{EtlError, Result};
use percent_encoding::percent_decode_str;
use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::Connection;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// A file-backed SQLite store addressed by a connection string.
///
/// Accepted forms: a plain path, `sqlite:///abs/path.db`, `sqlite://relative.db`,
/// `sqlite:relative.db` and `file:///abs/path.db`. Every logical operation opens its
/// own connection, so in-memory databases are rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    path: PathBuf,
}

impl Destination {
    pub fn parse(connection_string: &str) -> Result<Self> {
        let trimmed = connection_string.trim();
        if trimmed.is_empty() {
            return Err(EtlError::ConfigError {
                message: "destination connection string is empty".to_string(),
            });
        }

        let lower = trimmed.to_ascii_lowercase();
        let path = if lower.starts_with("sqlite:") || lower.starts_with("file:") {
            Self::path_from_url(trimmed)?
        } else {
            PathBuf::from(trimmed)
        };

        if path.as_os_str().is_empty() || path.as_os_str() == ":memory:" {
            return Err(EtlError::ConfigError {
                message: format!(
                    "'{}' does not name a file-backed database",
                    connection_string
                ),
            });
        }

        Ok(Self { path })
    }

    pub fn from_path<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    fn path_from_url(connection_string: &str) -> Result<PathBuf> {
        let url = Url::parse(connection_string).map_err(|e| EtlError::ConfigError {
            message: format!("invalid connection string '{}': {}", connection_string, e),
        })?;

        if url.scheme() == "file" {
            return url.to_file_path().map_err(|_| EtlError::ConfigError {
                message: format!("'{}' is not a local file URL", connection_string),
            });
        }

        // sqlite:///abs.db has an empty host; sqlite://rel.db keeps the file name in the host
        let host = url.host_str().unwrap_or("");
        let encoded = format!("{}{}", host, url.path());
        let decoded = percent_decode_str(&encoded)
            .decode_utf8()
            .map_err(|e| EtlError::ConfigError {
                message: format!("invalid escape in '{}': {}", connection_string, e),
            })?;
        Ok(PathBuf::from(decoded.as_ref()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn connect(&self) -> Result<Connection> {
        Connection::open(&self.path).map_err(|e| EtlError::ConnectionError {
            message: format!("cannot open {}: {}", self.path.display(), e),
        })
    }

    /// Runs `operation` on a fresh connection and closes it on every exit path.
    ///
    /// Uncommitted transactions are rolled back when the connection is dropped.
    pub fn with_connection<T, F>(&self, operation: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.connect()?;
        let outcome = operation(&mut conn);

        match outcome {
            Ok(value) => {
                conn.close().map_err(|(_, e)| EtlError::ConnectionError {
                    message: format!("cannot close {}: {}", self.path.display(), e),
                })?;
                Ok(value)
            }
            Err(e) => {
                drop(conn);
                Err(e)
            }
        }
    }

    /// Deletes a store file left by an earlier run. Failure to delete is reported, not raised.
    pub fn remove_existing(&self, log: &dyn EventLog) -> bool {
        if !self.exists() {
            return false;
        }

        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                log.info(&format!(
                    "Existing database file '{}' removed.",
                    self.path.display()
                ));
                true
            }
            Err(e) => {
                log.warning(&format!(
                    "Could not remove '{}': {}",
                    self.path.display(),
                    e
                ));
                false
            }
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sqlite://{}", self.path.display())
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Integer(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Value::Real(r) => ToSqlOutput::Owned(SqlValue::Real(*r)),
            // dates are stored as ISO-8601 text
            Value::Date(_) | Value::Timestamp(_) => {
                ToSqlOutput::Owned(SqlValue::Text(self.to_string()))
            }
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}
