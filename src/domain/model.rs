use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Destination relation every run writes to.
pub const TABLE_NAME: &str = "Customer_Sale_Analytics";

/// Columns forming the relation's composite primary key.
pub const PRIMARY_KEY: [&str; 4] = ["InvoiceNo", "StockCode", "CustomerID", "InvoiceDate"];

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub not_null: bool,
}

const fn column_spec(name: &'static str, sql_type: &'static str, not_null: bool) -> ColumnSpec {
    ColumnSpec {
        name,
        sql_type,
        not_null,
    }
}

/// Column catalogue of `Customer_Sale_Analytics`, in declaration order.
pub const RECORD_COLUMNS: [ColumnSpec; 8] = [
    column_spec("InvoiceNo", "INTEGER", true),
    column_spec("StockCode", "TEXT", true),
    column_spec("description", "TEXT", false),
    column_spec("quantity", "INTEGER", false),
    column_spec("InvoiceDate", "DATE", false),
    column_spec("UnitPrice", "REAL", false),
    column_spec("CustomerID", "INTEGER", true),
    column_spec("country", "TEXT", true),
];

/// Looks up a catalogue column the way SQLite resolves identifiers (ASCII case-insensitive).
pub fn record_column(name: &str) -> Option<&'static ColumnSpec> {
    RECORD_COLUMNS
        .iter()
        .find(|spec| spec.name.eq_ignore_ascii_case(name))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Integer,
    Real,
    Date,
    Timestamp,
    Text,
}

impl DataType {
    pub fn sql_type(self) -> &'static str {
        match self {
            DataType::Integer => "INTEGER",
            DataType::Real => "REAL",
            DataType::Date => "DATE",
            DataType::Timestamp => "TIMESTAMP",
            DataType::Text => "TEXT",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, DataType::Integer | DataType::Real)
    }
}

/// A single cell. `Null` is the missing-value marker for every column type.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Real(r) => Some(*r),
            _ => None,
        }
    }

    // -0.0 and 0.0 compare equal, so they must hash alike
    fn real_bits(r: f64) -> u64 {
        if r == 0.0 {
            0.0f64.to_bits()
        } else {
            r.to_bits()
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => Value::real_bits(*a) == Value::real_bits(*b),
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Integer(i) => i.hash(state),
            Value::Real(r) => Value::real_bits(*r).hash(state),
            Value::Date(d) => d.hash(state),
            Value::Timestamp(t) => t.hash(state),
            Value::Text(s) => s.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Value::Timestamp(t) => write!(f, "{}", t.format(TIMESTAMP_FORMAT)),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
}

/// Ordered rows sharing one column schema. Handed between stages by value.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularDataset {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl TabularDataset {
    /// Builds a dataset, rejecting rows whose width differs from the schema.
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Option<Self> {
        if rows.iter().any(|row| row.len() != columns.len()) {
            return None;
        }
        Some(Self { columns, rows })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Case-sensitive column lookup.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |row| &row[index])
    }

    /// Names of the columns holding at least one null, in schema order.
    pub fn columns_with_nulls(&self) -> Vec<&str> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(i, _)| self.rows.iter().any(|row| row[*i].is_null()))
            .map(|(_, c)| c.name.as_str())
            .collect()
    }

    /// Keeps only the rows for which `keep` returns true, preserving their order.
    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[Value]) -> bool,
    {
        self.rows.retain(|row| keep(row));
    }

    pub fn into_parts(self) -> (Vec<Column>, Vec<Vec<Value>>) {
        (self.columns, self.rows)
    }
}
