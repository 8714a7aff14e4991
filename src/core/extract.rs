use crate::domain::model::{Column, DataType, TabularDataset, Value, DATE_FORMAT, TIMESTAMP_FORMAT};
use crate::domain::ports::EventLog;
use crate::utils::error::{EtlError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

/// Field contents read as a missing value. Matched exactly, surrounding spaces included.
pub const MISSING_VALUE_TOKENS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

const TIMESTAMP_FORMATS: [&str; 2] = [TIMESTAMP_FORMAT, "%Y-%m-%dT%H:%M:%S"];

fn is_missing(field: &str) -> bool {
    MISSING_VALUE_TOKENS.contains(&field)
}

fn parse_timestamp(field: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(field.trim(), format).ok())
}

fn parse_real(field: &str) -> Option<f64> {
    field.trim().parse::<f64>().ok().filter(|r| r.is_finite())
}

/// Narrowest type every non-missing value of a column parses as.
pub fn infer_type<'a, I>(values: I) -> DataType
where
    I: IntoIterator<Item = &'a str> + Clone,
{
    let mut present = values.clone().into_iter().peekable();
    if present.peek().is_none() {
        // all-missing columns behave as numeric NULLs
        return DataType::Real;
    }

    let all = |check: &dyn Fn(&str) -> bool| values.clone().into_iter().all(check);

    if all(&|v: &str| v.trim().parse::<i64>().is_ok()) {
        DataType::Integer
    } else if all(&|v: &str| parse_real(v).is_some()) {
        DataType::Real
    } else if all(&|v: &str| NaiveDate::parse_from_str(v.trim(), DATE_FORMAT).is_ok()) {
        DataType::Date
    } else if all(&|v: &str| parse_timestamp(v).is_some()) {
        DataType::Timestamp
    } else {
        DataType::Text
    }
}

fn convert(field: Option<String>, data_type: DataType) -> Value {
    let Some(field) = field else {
        return Value::Null;
    };

    // infer_type guarantees every present value parses as the column type
    let parsed = match data_type {
        DataType::Integer => field.trim().parse().ok().map(Value::Integer),
        DataType::Real => parse_real(&field).map(Value::Real),
        DataType::Date => NaiveDate::parse_from_str(field.trim(), DATE_FORMAT)
            .ok()
            .map(Value::Date),
        DataType::Timestamp => parse_timestamp(&field).map(Value::Timestamp),
        DataType::Text => None,
    };
    parsed.unwrap_or(Value::Text(field))
}

pub struct Extractor {
    log: Arc<dyn EventLog>,
}

impl Extractor {
    pub fn new(log: Arc<dyn EventLog>) -> Self {
        Self { log }
    }

    /// Reads a headed CSV file into a dataset, typing each column from its values.
    pub fn extract(&self, path: &Path) -> Result<TabularDataset> {
        match self.read(path) {
            Ok(dataset) => {
                self.log.info(&format!(
                    "Data extracted successfully from {} ({} rows, {} columns)",
                    path.display(),
                    dataset.len(),
                    dataset.columns().len()
                ));
                Ok(dataset)
            }
            Err(e) => {
                match &e {
                    EtlError::NotFoundError { .. } => {
                        self.log.error(&format!("File not found: {}", path.display()))
                    }
                    _ => self.log.error(&format!(
                        "Error during extraction from {}: {}",
                        path.display(),
                        e
                    )),
                }
                Err(e)
            }
        }
    }

    fn read(&self, path: &Path) -> Result<TabularDataset> {
        let not_found = || EtlError::NotFoundError {
            path: path.display().to_string(),
        };
        let format_error = |message: String| EtlError::FormatError {
            path: path.display().to_string(),
            message,
        };

        if !path.is_file() {
            return Err(not_found());
        }
        let file = File::open(path).map_err(|_| not_found())?;

        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| format_error(e.to_string()))?
            .iter()
            .enumerate()
            .map(|(i, name)| {
                if i == 0 {
                    name.trim_start_matches('\u{feff}').to_string()
                } else {
                    name.to_string()
                }
            })
            .collect();

        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(format_error("no columns to parse from file".to_string()));
        }

        let mut seen = HashSet::new();
        if let Some(duplicate) = headers.iter().find(|h| !seen.insert(h.as_str())) {
            return Err(format_error(format!("duplicate column name '{}'", duplicate)));
        }

        let mut raw_rows: Vec<Vec<Option<String>>> = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| format_error(e.to_string()))?;
            raw_rows.push(
                record
                    .iter()
                    .map(|field| (!is_missing(field)).then(|| field.to_string()))
                    .collect(),
            );
        }

        let types: Vec<DataType> = (0..headers.len())
            .map(|i| infer_type(raw_rows.iter().filter_map(|row| row[i].as_deref())))
            .collect();

        let rows: Vec<Vec<Value>> = raw_rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .zip(types.iter())
                    .map(|(field, data_type)| convert(field, *data_type))
                    .collect()
            })
            .collect();

        let columns = headers
            .into_iter()
            .zip(types)
            .map(|(name, data_type)| Column { name, data_type })
            .collect();

        TabularDataset::new(columns, rows)
            .ok_or_else(|| format_error("rows do not match the header width".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::logger::{Level, MemoryLog};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file
    }

    fn extractor() -> (Extractor, Arc<MemoryLog>) {
        let log = Arc::new(MemoryLog::new());
        (Extractor::new(log.clone()), log)
    }

    #[test]
    fn test_extract_infers_column_types() {
        let file = csv_file(
            b"InvoiceNo,StockCode,Description,Quantity,InvoiceDate,UnitPrice,CustomerID,Country\n\
              536365,85123A,WHITE HANGING HEART,6,2010-12-01,2.55,17850,United Kingdom\n\
              536366,22633,HAND WARMER,,2010-12-01,1.85,17850,United Kingdom\n",
        );
        let (extractor, log) = extractor();

        let dataset = extractor.extract(file.path()).unwrap();

        let types: Vec<DataType> = dataset.columns().iter().map(|c| c.data_type).collect();
        assert_eq!(
            types,
            vec![
                DataType::Integer,
                DataType::Text,
                DataType::Text,
                DataType::Integer,
                DataType::Date,
                DataType::Real,
                DataType::Integer,
                DataType::Text,
            ]
        );
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.rows()[1][3], Value::Null);
        assert_eq!(dataset.rows()[0][1], Value::Text("85123A".to_string()));
        assert_eq!(log.messages(Level::Info).len(), 1);
    }

    #[test]
    fn test_every_missing_token_reads_as_null() {
        let mut content = String::from("InvoiceNo,Quantity\n");
        for (i, token) in MISSING_VALUE_TOKENS.iter().enumerate() {
            content.push_str(&format!("{},{}\n", i, token));
        }
        content.push_str("99,4\n");
        let file = csv_file(content.as_bytes());
        let (extractor, _) = extractor();

        let dataset = extractor.extract(file.path()).unwrap();

        assert_eq!(dataset.columns()[1].data_type, DataType::Integer);
        let quantities: Vec<&Value> = dataset.column_values(1).collect();
        assert_eq!(quantities.len(), MISSING_VALUE_TOKENS.len() + 1);
        assert!(quantities[..MISSING_VALUE_TOKENS.len()].iter().all(|v| v.is_null()));
        assert_eq!(quantities[MISSING_VALUE_TOKENS.len()], &Value::Integer(4));
    }

    #[test]
    fn test_padded_token_is_not_missing() {
        let file = csv_file(b"InvoiceNo,Country\n1, NA \n");
        let (extractor, _) = extractor();

        let dataset = extractor.extract(file.path()).unwrap();

        assert_eq!(dataset.columns()[1].data_type, DataType::Text);
        assert_eq!(dataset.rows()[0][1], Value::Text(" NA ".to_string()));
    }

    #[test]
    fn test_header_only_file_yields_empty_dataset() {
        let file = csv_file(b"InvoiceNo,StockCode,Quantity,UnitPrice\n");
        let (extractor, _) = extractor();

        let dataset = extractor.extract(file.path()).unwrap();

        assert!(dataset.is_empty());
        assert_eq!(dataset.columns().len(), 4);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let (extractor, log) = extractor();
        let result = extractor.extract(Path::new("/definitely/not/here.csv"));

        assert!(matches!(result, Err(EtlError::NotFoundError { .. })));
        assert_eq!(
            log.messages(Level::Error),
            vec!["File not found: /definitely/not/here.csv".to_string()]
        );
    }

    #[test]
    fn test_ragged_row_is_format_error() {
        let file = csv_file(b"a,b\n1,2\n3\n");
        let (extractor, _) = extractor();

        assert!(matches!(
            extractor.extract(file.path()),
            Err(EtlError::FormatError { .. })
        ));
    }

    #[test]
    fn test_invalid_utf8_is_format_error() {
        let file = csv_file(b"a,b\n1,\xff\xfe\n");
        let (extractor, _) = extractor();

        assert!(matches!(
            extractor.extract(file.path()),
            Err(EtlError::FormatError { .. })
        ));
    }

    #[test]
    fn test_empty_file_and_duplicate_headers_are_format_errors() {
        let (extractor, _) = extractor();

        let empty = csv_file(b"");
        assert!(matches!(
            extractor.extract(empty.path()),
            Err(EtlError::FormatError { .. })
        ));

        let duplicated = csv_file(b"a,a\n1,2\n");
        assert!(matches!(
            extractor.extract(duplicated.path()),
            Err(EtlError::FormatError { .. })
        ));
    }

    #[test]
    fn test_infer_type() {
        assert_eq!(infer_type(["1", "2"]), DataType::Integer);
        assert_eq!(infer_type(["1", "2.5"]), DataType::Real);
        assert_eq!(infer_type(["2010-12-01 08:26:00"]), DataType::Timestamp);
        assert_eq!(infer_type(["inf"]), DataType::Text);
        assert_eq!(infer_type(Vec::<&str>::new().iter().copied()), DataType::Real);
    }
}
