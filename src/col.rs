use std::collections::HashMap;
use std::fmt::Debug;

use crate::constant::SqlType;
use crate::error::{Error, Result};

/// Column as announced by the server, before row offsets are known
#[derive(Debug, Clone)]
pub struct ColumnDescription<D> {
    pub data_type: D,
    pub sql_type: SqlType,
    pub name: String,
    /// Declared maximum length of the value
    pub max_length: u32,
    /// Whether the value always occupies `max_row_bytes` in a row
    pub constant_length: bool,
    /// Largest number of row bytes a value of this column can take
    pub max_row_bytes: usize,
}

/// One column of a result set
#[derive(Debug, Clone)]
pub struct ResultColumn<D> {
    data_type: D,
    sql_type: SqlType,
    name: String,
    max_length: u32,
    constant_length: bool,
    num_row_bytes: usize,
    byte_array_row_offset: usize,
    retrieve_by_offset: bool,
}

impl<D: Copy> ResultColumn<D> {
    pub fn data_type(&self) -> D {
        self.data_type
    }

    pub fn sql_type(&self) -> SqlType {
        self.sql_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_length(&self) -> u32 {
        self.max_length
    }

    pub fn is_constant_length(&self) -> bool {
        self.constant_length
    }

    /// Row bytes of a constant-length value, or the maximum for a variable one
    pub fn num_row_bytes(&self) -> usize {
        self.num_row_bytes
    }

    /// Offset of the value within a row; meaningful when `retrieve_by_offset` holds
    pub fn byte_array_row_offset(&self) -> usize {
        self.byte_array_row_offset
    }

    /// True when this column and every column before it have constant length
    pub fn retrieve_by_offset(&self) -> bool {
        self.retrieve_by_offset
    }
}

/// Immutable description of a result: columns, row footprint and row count
#[derive(Debug, Clone)]
pub struct ResultSetMetaData<D> {
    columns: Vec<ResultColumn<D>>,
    labels: HashMap<String, usize>,
    max_bytes_per_row: usize,
    total_rows: Option<u64>,
}

impl<D: Copy + Debug> ResultSetMetaData<D> {
    /// `total_rows` is `None` when the server does not announce a row count
    pub fn new(columns: Vec<ColumnDescription<D>>, total_rows: Option<u64>) -> Self {
        let mut offset = 0;
        let mut all_constant = true;
        let mut max_bytes_per_row = 0;
        let mut labels = HashMap::with_capacity(columns.len());

        let columns: Vec<ResultColumn<D>> = columns
            .into_iter()
            .enumerate()
            .map(|(index, desc)| {
                all_constant &= desc.constant_length;
                let column = ResultColumn {
                    data_type: desc.data_type,
                    sql_type: desc.sql_type,
                    max_length: desc.max_length,
                    constant_length: desc.constant_length,
                    num_row_bytes: desc.max_row_bytes,
                    byte_array_row_offset: if all_constant { offset } else { 0 },
                    retrieve_by_offset: all_constant,
                    name: desc.name,
                };
                offset += desc.max_row_bytes;
                max_bytes_per_row += desc.max_row_bytes;
                // First column wins on duplicate labels
                labels.entry(column.name.to_lowercase()).or_insert(index);
                column
            })
            .collect();

        Self {
            columns,
            labels,
            max_bytes_per_row,
            total_rows,
        }
    }

    /// Same columns with a different announced row count
    pub fn with_total_rows(&self, total_rows: Option<u64>) -> Self {
        Self {
            total_rows,
            ..self.clone()
        }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[ResultColumn<D>] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Result<&ResultColumn<D>> {
        self.columns.get(index).ok_or_else(|| {
            Error::BadUsageError(format!(
                "column index {} out of range for {} columns",
                index,
                self.columns.len()
            ))
        })
    }

    pub fn column_label(&self, index: usize) -> Result<&str> {
        self.column(index).map(ResultColumn::name)
    }

    pub fn sql_type(&self, index: usize) -> Result<SqlType> {
        self.column(index).map(ResultColumn::sql_type)
    }

    pub fn max_length(&self, index: usize) -> Result<u32> {
        self.column(index).map(ResultColumn::max_length)
    }

    /// Index of the column labelled `label`, ignoring case
    pub fn find_column(&self, label: &str) -> Result<usize> {
        self.labels
            .get(&label.to_lowercase())
            .copied()
            .ok_or_else(|| Error::BadUsageError(format!("no column labelled {:?}", label)))
    }

    pub fn max_bytes_per_row(&self) -> usize {
        self.max_bytes_per_row
    }

    pub fn total_rows(&self) -> Option<u64> {
        self.total_rows
    }
}
