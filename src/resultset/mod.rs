//! Result set family.
//!
//! A result set starts out connection-attached ([`StreamingResultSet`]),
//! fetching rows from the socket as it is iterated. When the connection has
//! to serve another statement first, the remaining rows are materialized into
//! a [`BufferedResultSet`] and swapped in behind the same
//! [`SwappableResultSet`].

mod buffered;
mod streaming;


pub use buffered::BufferedResultSet;
pub use streaming::StreamingResultSet;

use std::sync::Arc;

use crate::col::{ResultColumn, ResultSetMetaData};
use crate::constant::SqlType;
use crate::error::{Error, Result};
use crate::protocol::data::ResultSetId;
use crate::protocol::database::RetrievedRows;
use crate::protocol::decoder::RowDecoder;
use crate::value::{Date, Time, Timestamp, Value};

/// Connection-side services a result set calls back into
pub trait ResultRetrieval {
    /// Fetch up to `max_rows` rows into `dst`
    fn retrieve_rows(
        &mut self,
        dst: &mut [u8],
        max_rows: usize,
        bytes_per_row: usize,
        retrieved: &mut RetrievedRows,
    ) -> Result<()>;

    /// The attached result set has been read to the end
    fn end_result_retrieval(&mut self) -> Result<()>;

    /// The attached result set is closed before its end
    fn close_result_set(&mut self) -> Result<()>;

    /// Bookkeeping after any result set closes
    fn result_set_closed(&mut self, id: ResultSetId) -> Result<()>;
}

// ============================================================================
// Column access over one row
// ============================================================================

/// Typed access to the columns of the current row
pub struct RowView<'a, D: RowDecoder> {
    row: &'a [u8],
    metadata: &'a ResultSetMetaData<D::DataType>,
    decoder: &'a D,
}

impl<'a, D: RowDecoder> RowView<'a, D> {
    pub(crate) fn new(
        row: &'a [u8],
        metadata: &'a ResultSetMetaData<D::DataType>,
        decoder: &'a D,
    ) -> Self {
        Self {
            row,
            metadata,
            decoder,
        }
    }

    pub fn row(&self) -> &[u8] {
        self.row
    }

    /// Offset of column `index` within the row
    pub fn column_offset(&self, index: usize) -> Result<usize> {
        let column = self.metadata.column(index)?;
        self.offset_of(column, index)
    }

    fn offset_of(&self, column: &ResultColumn<D::DataType>, index: usize) -> Result<usize> {
        if column.retrieve_by_offset() {
            Ok(column.byte_array_row_offset())
        } else {
            self.decoder
                .find_row_column_offset(self.metadata.columns(), index, self.row)
        }
    }

    fn locate(
        &self,
        index: usize,
        accepts: impl Fn(SqlType) -> bool,
    ) -> Result<(&'a ResultColumn<D::DataType>, usize)> {
        let column = self.metadata.column(index)?;
        if !accepts(column.sql_type()) {
            return Err(Error::WrongColumnType {
                index,
                actual: column.sql_type(),
            });
        }
        Ok((column, self.offset_of(column, index)?))
    }

    fn exact(expected: SqlType) -> impl Fn(SqlType) -> bool {
        move |actual| actual == expected
    }

    pub fn get_boolean(&self, index: usize) -> Result<bool> {
        let (column, offset) = self.locate(index, Self::exact(SqlType::Boolean))?;
        self.decoder.decode_boolean(self.row, offset, column)
    }

    pub fn get_byte(&self, index: usize) -> Result<i8> {
        let (column, offset) = self.locate(index, Self::exact(SqlType::TinyInt))?;
        self.decoder.decode_byte(self.row, offset, column)
    }

    pub fn get_short(&self, index: usize) -> Result<i16> {
        let (column, offset) = self.locate(index, Self::exact(SqlType::SmallInt))?;
        self.decoder.decode_short(self.row, offset, column)
    }

    pub fn get_int(&self, index: usize) -> Result<i32> {
        let (column, offset) = self.locate(index, Self::exact(SqlType::Integer))?;
        self.decoder.decode_int(self.row, offset, column)
    }

    pub fn get_long(&self, index: usize) -> Result<i64> {
        let (column, offset) = self.locate(index, Self::exact(SqlType::BigInt))?;
        self.decoder.decode_long(self.row, offset, column)
    }

    pub fn get_float(&self, index: usize) -> Result<f32> {
        let (column, offset) = self.locate(index, Self::exact(SqlType::Float))?;
        self.decoder.decode_float(self.row, offset, column)
    }

    pub fn get_double(&self, index: usize) -> Result<f64> {
        let (column, offset) = self.locate(index, Self::exact(SqlType::Double))?;
        self.decoder.decode_double(self.row, offset, column)
    }

    #[cfg(feature = "with-rust-decimal")]
    pub fn get_decimal(&self, index: usize) -> Result<rust_decimal::Decimal> {
        let (column, offset) = self.locate(index, Self::exact(SqlType::Decimal))?;
        match self.decoder.decode_object(self.row, offset, column)? {
            Value::Decimal(value) => Ok(value),
            other => Err(Error::unsupported(format!(
                "decimal decode of {:?} produced {:?}",
                column.data_type(),
                other.parameter_type()
            ))),
        }
    }

    pub fn get_string(&self, index: usize) -> Result<Arc<str>> {
        let (column, offset) = self.locate(index, SqlType::is_string)?;
        self.decoder.decode_string(self.row, offset, column)
    }

    pub fn get_bytes(&self, index: usize) -> Result<Vec<u8>> {
        let (column, offset) = self.locate(index, SqlType::is_binary)?;
        self.decoder.decode_bytes(self.row, offset, column)
    }

    pub fn get_date(&self, index: usize) -> Result<Date> {
        let (column, offset) = self.locate(index, Self::exact(SqlType::Date))?;
        self.decoder.decode_date(self.row, offset, column)
    }

    pub fn get_time(&self, index: usize) -> Result<Time> {
        let (column, offset) = self.locate(index, Self::exact(SqlType::Time))?;
        self.decoder.decode_time(self.row, offset, column)
    }

    pub fn get_timestamp(&self, index: usize) -> Result<Timestamp> {
        let (column, offset) = self.locate(index, Self::exact(SqlType::Timestamp))?;
        self.decoder.decode_timestamp(self.row, offset, column)
    }

    pub fn get_object(&self, index: usize) -> Result<Value> {
        let (column, offset) = self.locate(index, |_| true)?;
        self.decoder.decode_object(self.row, offset, column)
    }
}

// ============================================================================
// Swappable front
// ============================================================================

#[derive(Debug)]
pub enum Backing<D: RowDecoder> {
    Streaming(StreamingResultSet<D>),
    Buffered(BufferedResultSet<D>),
}

/// Stable result set whose backing implementation can be replaced
#[derive(Debug)]
pub struct SwappableResultSet<D: RowDecoder> {
    id: ResultSetId,
    backing: Backing<D>,
}

impl<D: RowDecoder + Clone> SwappableResultSet<D> {
    pub fn new(id: ResultSetId, backing: Backing<D>) -> Self {
        Self { id, backing }
    }

    pub fn id(&self) -> ResultSetId {
        self.id
    }

    pub fn backing(&self) -> &Backing<D> {
        &self.backing
    }

    /// Install `replacement` as the backing, returning the previous one
    pub fn swap(&mut self, replacement: Backing<D>) -> Backing<D> {
        std::mem::replace(&mut self.backing, replacement)
    }

    pub fn metadata(&self) -> &Arc<ResultSetMetaData<D::DataType>> {
        match &self.backing {
            Backing::Streaming(rs) => rs.metadata(),
            Backing::Buffered(rs) => rs.metadata(),
        }
    }

    pub fn is_closed(&self) -> bool {
        match &self.backing {
            Backing::Streaming(rs) => rs.is_closed(),
            Backing::Buffered(rs) => rs.is_closed(),
        }
    }

    /// Whether rows are still pending on the connection
    pub fn is_connection_attached(&self) -> bool {
        match &self.backing {
            Backing::Streaming(rs) => rs.is_attached(),
            Backing::Buffered(_) => false,
        }
    }

    pub fn next(&mut self, source: &mut dyn ResultRetrieval) -> Result<bool> {
        match &mut self.backing {
            Backing::Streaming(rs) => rs.next(source),
            Backing::Buffered(rs) => rs.next(),
        }
    }

    pub fn row_view(&mut self) -> Result<RowView<'_, D>> {
        match &mut self.backing {
            Backing::Streaming(rs) => rs.row_view(),
            Backing::Buffered(rs) => rs.row_view(),
        }
    }

    /// Read the rest of a connection-attached backing into memory and swap it in
    ///
    /// Returns whether a swap happened.
    pub fn materialize(&mut self, source: &mut dyn ResultRetrieval) -> Result<bool> {
        let Backing::Streaming(streaming) = &mut self.backing else {
            return Ok(false);
        };
        if !streaming.is_attached() {
            return Ok(false);
        }
        let buffered = streaming.materialize(source)?;
        self.swap(Backing::Buffered(buffered));
        Ok(true)
    }

    /// Close the backing, then let the connection drop its bookkeeping
    pub fn close(&mut self, source: &mut dyn ResultRetrieval) -> Result<()> {
        if self.is_closed() {
            return Err(Error::AlreadyClosed);
        }
        let closed = match &mut self.backing {
            Backing::Streaming(rs) => rs.close(source),
            Backing::Buffered(rs) => {
                rs.close();
                Ok(())
            }
        };
        let notified = source.result_set_closed(self.id);
        closed.and(notified)
    }

    /// Mark closed without any I/O, for when the connection itself goes away
    pub fn invalidate(&mut self) {
        match &mut self.backing {
            Backing::Streaming(rs) => rs.invalidate(),
            Backing::Buffered(rs) => rs.close(),
        }
    }
}
