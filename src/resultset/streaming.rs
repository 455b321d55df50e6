use std::sync::Arc;

use crate::buffer_pool::{GLOBAL_ROW_BUFFER_POOL, PooledRowBuffer};
use crate::chunks::{IntLargeArray, ResultSetBuffer};
use crate::col::ResultSetMetaData;
use crate::constant::{MAX_ROW_BUFFER_BYTES, MIN_BUFFERED_CHUNK_BYTES};
use crate::error::{Error, Result};
use crate::protocol::database::RetrievedRows;
use crate::protocol::decoder::RowDecoder;
use crate::resultset::{BufferedResultSet, ResultRetrieval, RowView};

/// Result set reading its rows from the connection in batches
///
/// Rows of one batch share a single reusable buffer that each fetch
/// overwrites.
#[derive(Debug)]
pub struct StreamingResultSet<D: RowDecoder> {
    metadata: Arc<ResultSetMetaData<D::DataType>>,
    decoder: D,
    buffer: Option<PooledRowBuffer>,
    /// Rows per fetch
    max_rows: usize,
    /// Rows still to fetch; `None` when the server did not announce a count
    remaining: Option<u64>,
    retrieved: RetrievedRows,
    num_buffered: usize,
    row_index: usize,
    row_offset: usize,
    exhausted: bool,
    closed: bool,
}

impl<D: RowDecoder + Clone> StreamingResultSet<D> {
    pub fn new(metadata: Arc<ResultSetMetaData<D::DataType>>, decoder: D) -> Self {
        let bytes_per_row = metadata.max_bytes_per_row().max(1);
        let rows_in_budget = (MAX_ROW_BUFFER_BYTES / bytes_per_row).max(1);
        let total_rows = metadata.total_rows();

        let (max_rows, buffer) = match total_rows {
            Some(0) => (0, None),
            Some(total) => {
                let rows = usize::try_from(total).map_or(rows_in_budget, |t| t.min(rows_in_budget));
                (
                    rows,
                    Some(GLOBAL_ROW_BUFFER_POOL.get_row_buffer(rows * bytes_per_row)),
                )
            }
            None => (
                rows_in_budget,
                Some(GLOBAL_ROW_BUFFER_POOL.get_row_buffer(rows_in_budget * bytes_per_row)),
            ),
        };

        Self {
            metadata,
            decoder,
            buffer,
            max_rows,
            remaining: total_rows,
            retrieved: RetrievedRows::new(),
            num_buffered: 0,
            row_index: 0,
            row_offset: 0,
            exhausted: total_rows == Some(0),
            closed: false,
        }
    }

    pub fn metadata(&self) -> &Arc<ResultSetMetaData<D::DataType>> {
        &self.metadata
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Whether rows may still be pending on the connection
    pub fn is_attached(&self) -> bool {
        !self.closed && !self.exhausted
    }

    /// Rows fetched per batch
    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.as_ref().map_or(0, |buffer| buffer.len())
    }

    fn on_row(&self) -> bool {
        self.num_buffered > 0
    }

    pub fn next(&mut self, source: &mut dyn ResultRetrieval) -> Result<bool> {
        if self.closed {
            return Err(Error::ResultSetClosed);
        }
        if self.exhausted {
            self.num_buffered = 0;
            return Ok(false);
        }

        if self.num_buffered == 0 || self.row_index + 1 == self.num_buffered {
            self.num_buffered = self.retrieve_more_rows(source)?;
            self.row_index = 0;
            self.row_offset = 0;
            if self.num_buffered == 0 {
                self.exhausted = true;
                source.end_result_retrieval()?;
            }
        } else {
            self.row_offset += self.current_row_length()?;
            self.row_index += 1;
        }

        Ok(self.on_row())
    }

    fn current_row_length(&self) -> Result<usize> {
        self.retrieved
            .row_length(self.row_index)
            .map(|len| len as usize)
            .ok_or_else(|| Error::BadUsageError("no current row".to_string()))
    }

    /// One fetch; returns the number of rows now buffered
    fn retrieve_more_rows(&mut self, source: &mut dyn ResultRetrieval) -> Result<usize> {
        self.retrieved.clear();
        let rows_to_fetch = match self.remaining {
            None => self.max_rows,
            Some(0) => return Ok(0),
            Some(remaining) => usize::try_from(remaining).map_or(self.max_rows, |r| r.min(self.max_rows)),
        };
        let Some(buffer) = self.buffer.as_mut() else {
            return Ok(0);
        };

        let bytes_per_row = self.metadata.max_bytes_per_row();
        if let Err(err) = source.retrieve_rows(buffer, rows_to_fetch, bytes_per_row, &mut self.retrieved) {
            self.detach();
            return Err(err);
        }
        let fetched = self.retrieved.num_rows();

        if let Some(remaining) = self.remaining.as_mut() {
            if fetched == 0 {
                let err = Error::protocol(format!("no rows returned while {} rows remain", remaining));
                self.detach();
                source.end_result_retrieval()?;
                return Err(err);
            }
            *remaining = remaining.saturating_sub(fetched as u64);
        }
        Ok(fetched)
    }

    pub fn row_view(&mut self) -> Result<RowView<'_, D>> {
        if self.closed {
            return Err(Error::ResultSetClosed);
        }
        if !self.on_row() {
            return Err(Error::BadUsageError("no current row".to_string()));
        }
        let len = self.current_row_length()?;
        let row = self
            .buffer
            .as_ref()
            .and_then(|buffer| buffer.get(self.row_offset..self.row_offset + len))
            .ok_or_else(|| Error::protocol("row extends past the fetched bytes"))?;
        Ok(RowView::new(row, &self.metadata, &self.decoder))
    }

    /// Copy the unread rows, current row included, into a buffered result set
    ///
    /// Keeps fetching until the connection has no more rows for this result.
    pub fn materialize(&mut self, source: &mut dyn ResultRetrieval) -> Result<BufferedResultSet<D>> {
        if self.closed {
            return Err(Error::ResultSetClosed);
        }
        let chunk_size = MIN_BUFFERED_CHUNK_BYTES.max(self.metadata.max_bytes_per_row());
        let mut rows = ResultSetBuffer::new(chunk_size)?;
        let mut row_lengths = IntLargeArray::new();
        let positioned = self.on_row();

        if positioned {
            self.append_buffered(self.row_index, self.row_offset, &mut rows, &mut row_lengths)?;
        }

        while !self.exhausted {
            let fetched = self.retrieve_more_rows(source)?;
            if fetched == 0 {
                self.exhausted = true;
            } else {
                self.append_buffered(0, 0, &mut rows, &mut row_lengths)?;
            }
        }
        self.num_buffered = 0;

        tracing::debug!(
            rows = row_lengths.len(),
            bytes = rows.len(),
            "materialized connection-attached result set"
        );

        BufferedResultSet::new(
            Arc::clone(&self.metadata),
            self.decoder.clone(),
            rows,
            row_lengths,
            positioned,
        )
    }

    fn append_buffered(
        &self,
        from_row: usize,
        from_offset: usize,
        rows: &mut ResultSetBuffer,
        row_lengths: &mut IntLargeArray,
    ) -> Result<()> {
        let num_rows = self.retrieved.num_rows();
        let num_bytes = self.retrieved.bytes_from(from_row);
        let bytes = self
            .buffer
            .as_ref()
            .and_then(|buffer| buffer.get(from_offset..from_offset + num_bytes))
            .ok_or_else(|| Error::protocol("rows extend past the fetched bytes"))?;
        if !bytes.is_empty() {
            rows.add_data(bytes)?;
        }
        row_lengths.add(
            self.retrieved.row_lengths(),
            from_row,
            num_rows.saturating_sub(from_row),
        )
    }

    /// Close; rows still pending on the connection are discarded
    pub fn close(&mut self, source: &mut dyn ResultRetrieval) -> Result<()> {
        if self.closed {
            return Err(Error::AlreadyClosed);
        }
        let attached = self.is_attached();
        self.invalidate();
        if attached {
            source.close_result_set()?;
        }
        Ok(())
    }

    /// Stop reading from the connection after a failed fetch
    fn detach(&mut self) {
        self.exhausted = true;
        self.num_buffered = 0;
        self.retrieved.clear();
    }

    /// Mark closed and release the row buffer, without I/O
    pub fn invalidate(&mut self) {
        self.closed = true;
        self.num_buffered = 0;
        self.buffer = None;
    }
}
