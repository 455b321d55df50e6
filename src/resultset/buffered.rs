use std::sync::Arc;

use crate::chunks::{IntLargeArray, ResultSetBuffer};
use crate::col::ResultSetMetaData;
use crate::error::{Error, Result};
use crate::protocol::decoder::RowDecoder;
use crate::resultset::RowView;

#[derive(Debug, Clone, Copy)]
enum Cursor {
    BeforeFirst,
    OnRow { index: usize, offset: usize },
    AfterLast,
}

/// Result set whose rows are all held in memory
#[derive(Debug)]
pub struct BufferedResultSet<D: RowDecoder> {
    metadata: Arc<ResultSetMetaData<D::DataType>>,
    decoder: D,
    rows: ResultSetBuffer,
    row_lengths: IntLargeArray,
    cursor: Cursor,
    scratch: Vec<u8>,
    closed: bool,
}

impl<D: RowDecoder> BufferedResultSet<D> {
    /// `positioned` puts the cursor on the first row instead of before it
    pub fn new(
        metadata: Arc<ResultSetMetaData<D::DataType>>,
        decoder: D,
        rows: ResultSetBuffer,
        row_lengths: IntLargeArray,
        positioned: bool,
    ) -> Result<Self> {
        if !row_lengths.is_empty() && rows.is_empty() {
            return Err(Error::BadUsageError(
                "row lengths without row data".to_string(),
            ));
        }
        let cursor = if positioned && !row_lengths.is_empty() {
            Cursor::OnRow {
                index: 0,
                offset: 0,
            }
        } else {
            Cursor::BeforeFirst
        };
        Ok(Self {
            metadata,
            decoder,
            rows,
            row_lengths,
            cursor,
            scratch: Vec::new(),
            closed: false,
        })
    }

    pub fn metadata(&self) -> &Arc<ResultSetMetaData<D::DataType>> {
        &self.metadata
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn num_rows(&self) -> usize {
        self.row_lengths.len()
    }

    pub fn next(&mut self) -> Result<bool> {
        if self.closed {
            return Err(Error::ResultSetClosed);
        }
        let (index, offset) = match self.cursor {
            Cursor::BeforeFirst => (0, 0),
            Cursor::OnRow { index, offset } => {
                (index + 1, offset + self.row_lengths.get_value(index)? as usize)
            }
            Cursor::AfterLast => return Ok(false),
        };
        if index < self.row_lengths.len() {
            self.cursor = Cursor::OnRow { index, offset };
            Ok(true)
        } else {
            self.cursor = Cursor::AfterLast;
            Ok(false)
        }
    }

    pub fn row_view(&mut self) -> Result<RowView<'_, D>> {
        if self.closed {
            return Err(Error::ResultSetClosed);
        }
        let Cursor::OnRow { index, offset } = self.cursor else {
            return Err(Error::BadUsageError("no current row".to_string()));
        };
        let len = self.row_lengths.get_value(index)? as usize;
        let row = self.rows.decode(offset, len, &mut self.scratch)?;
        Ok(RowView::new(row, &self.metadata, &self.decoder))
    }

    pub fn close(&mut self) {
        self.closed = true;
    }
}
