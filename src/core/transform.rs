use crate::domain::model::{Column, DataType, TabularDataset, Value};
use crate::domain::ports::EventLog;
use crate::utils::error::{EtlError, Result};
use std::sync::Arc;

pub const UNIT_PRICE_COLUMN: &str = "UnitPrice";
pub const QUANTITY_COLUMN: &str = "Quantity";

pub struct Transformer {
    log: Arc<dyn EventLog>,
}

impl Transformer {
    pub fn new(log: Arc<dyn EventLog>) -> Self {
        Self { log }
    }

    /// Replaces `UnitPrice` with the line total `UnitPrice * Quantity`.
    ///
    /// The per-unit price is not kept. A null operand makes the total null.
    pub fn transform(&self, dataset: TabularDataset) -> Result<TabularDataset> {
        self.warn_on_nulls(&dataset);

        let transformed = line_totals(dataset).inspect_err(|e| {
            self.log.error(&format!("Error during transformation: {}", e));
        })?;

        self.log.info("Data transformed successfully with UnitPrice column.");
        Ok(transformed)
    }

    fn warn_on_nulls(&self, dataset: &TabularDataset) {
        let columns = dataset.columns_with_nulls();
        if !columns.is_empty() {
            self.log.warning(&format!(
                "Data contains null values in columns [{}]. Please check the input data.",
                columns.join(", ")
            ));
        }
    }
}

fn numeric_column(dataset: &TabularDataset, name: &str) -> Result<(usize, DataType)> {
    let index = dataset
        .column_index(name)
        .ok_or_else(|| EtlError::TransformError {
            message: format!("required column '{}' is missing", name),
        })?;

    let data_type = dataset.columns()[index].data_type;
    if !data_type.is_numeric() {
        return Err(EtlError::TransformError {
            message: format!("column '{}' is not numeric", name),
        });
    }
    Ok((index, data_type))
}

fn multiply(price: &Value, quantity: &Value) -> Result<Value> {
    let product = match (price, quantity) {
        (Value::Null, _) | (_, Value::Null) => Value::Null,
        (Value::Integer(p), Value::Integer(q)) => {
            Value::Integer(p.checked_mul(*q).ok_or_else(|| EtlError::TransformError {
                message: format!("{} * {} overflows a 64-bit integer", p, q),
            })?)
        }
        (p, q) => match (p.as_f64(), q.as_f64()) {
            (Some(p), Some(q)) => Value::Real(p * q),
            _ => {
                return Err(EtlError::TransformError {
                    message: format!("cannot multiply '{}' by '{}'", p, q),
                })
            }
        },
    };
    Ok(product)
}

fn line_totals(dataset: TabularDataset) -> Result<TabularDataset> {
    let (price_index, price_type) = numeric_column(&dataset, UNIT_PRICE_COLUMN)?;
    let (quantity_index, quantity_type) = numeric_column(&dataset, QUANTITY_COLUMN)?;

    let total_type = if price_type == DataType::Integer && quantity_type == DataType::Integer {
        DataType::Integer
    } else {
        DataType::Real
    };

    let (mut columns, mut rows) = dataset.into_parts();
    for row in rows.iter_mut() {
        row[price_index] = multiply(&row[price_index], &row[quantity_index])?;
    }
    columns[price_index] = Column {
        name: UNIT_PRICE_COLUMN.to_string(),
        data_type: total_type,
    };

    TabularDataset::new(columns, rows).ok_or_else(|| EtlError::TransformError {
        message: "row width changed during transformation".to_string(),
    })
}
