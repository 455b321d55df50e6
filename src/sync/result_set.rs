use std::sync::Arc;

use crate::col::ResultSetMetaData;
use crate::error::Result;
use crate::protocol::connection::ResultSetCell;
use crate::protocol::data::ResultSetId;
use crate::protocol::database::DatabaseProtocol;
use crate::resultset::RowView;
use crate::share::{Sharing, Unsynchronized};
use crate::sync::conn::ProtocolCell;
use crate::value::{Date, Time, Timestamp, Value};

/// Rows produced by a query
///
/// Rows are read from the connection as [`next`](Self::next) advances. When
/// another operation needs the connection first, the remaining rows are moved
/// into memory and iteration goes on from there.
pub struct ResultSet<P: DatabaseProtocol, S: Sharing = Unsynchronized> {
    protocol: ProtocolCell<P, S>,
    cell: ResultSetCell<P, S>,
    id: ResultSetId,
}

impl<P: DatabaseProtocol, S: Sharing> ResultSet<P, S> {
    pub(crate) fn new(protocol: ProtocolCell<P, S>, id: ResultSetId, cell: ResultSetCell<P, S>) -> Self {
        Self { protocol, cell, id }
    }

    pub fn id(&self) -> ResultSetId {
        self.id
    }

    /// Advance to the next row; `false` once the rows are exhausted
    pub fn next(&mut self) -> Result<bool> {
        S::with(&self.protocol, |p| S::with(&self.cell, |rs| rs.next(p)))
    }

    pub fn close(&mut self) -> Result<()> {
        S::with(&self.protocol, |p| S::with(&self.cell, |rs| rs.close(p)))
    }

    pub fn is_closed(&self) -> Result<bool> {
        S::with(&self.cell, |rs| Ok(rs.is_closed()))
    }

    /// Whether unread rows are still pending on the connection
    pub fn is_connection_attached(&self) -> Result<bool> {
        S::with(&self.cell, |rs| Ok(rs.is_connection_attached()))
    }

    pub fn metadata(&self) -> Result<Arc<ResultSetMetaData<P::DataType>>> {
        S::with(&self.cell, |rs| Ok(Arc::clone(rs.metadata())))
    }

    pub fn column_count(&self) -> Result<usize> {
        S::with(&self.cell, |rs| Ok(rs.metadata().column_count()))
    }

    pub fn column_label(&self, index: usize) -> Result<String> {
        S::with(&self.cell, |rs| rs.metadata().column_label(index).map(ToOwned::to_owned))
    }

    /// Index of the column labelled `label`
    pub fn find_column(&self, label: &str) -> Result<usize> {
        S::with(&self.cell, |rs| rs.metadata().find_column(label))
    }

    fn with_row<R>(&self, f: impl FnOnce(&RowView<'_, Arc<P::Decoder>>) -> Result<R>) -> Result<R> {
        S::with(&self.cell, |rs| f(&rs.row_view()?))
    }

    pub fn get_boolean(&self, index: usize) -> Result<bool> {
        self.with_row(|row| row.get_boolean(index))
    }

    pub fn get_byte(&self, index: usize) -> Result<i8> {
        self.with_row(|row| row.get_byte(index))
    }

    pub fn get_short(&self, index: usize) -> Result<i16> {
        self.with_row(|row| row.get_short(index))
    }

    pub fn get_int(&self, index: usize) -> Result<i32> {
        self.with_row(|row| row.get_int(index))
    }

    pub fn get_long(&self, index: usize) -> Result<i64> {
        self.with_row(|row| row.get_long(index))
    }

    pub fn get_float(&self, index: usize) -> Result<f32> {
        self.with_row(|row| row.get_float(index))
    }

    pub fn get_double(&self, index: usize) -> Result<f64> {
        self.with_row(|row| row.get_double(index))
    }

    #[cfg(feature = "with-rust-decimal")]
    pub fn get_decimal(&self, index: usize) -> Result<rust_decimal::Decimal> {
        self.with_row(|row| row.get_decimal(index))
    }

    pub fn get_string(&self, index: usize) -> Result<Arc<str>> {
        self.with_row(|row| row.get_string(index))
    }

    pub fn get_bytes(&self, index: usize) -> Result<Vec<u8>> {
        self.with_row(|row| row.get_bytes(index))
    }

    pub fn get_date(&self, index: usize) -> Result<Date> {
        self.with_row(|row| row.get_date(index))
    }

    pub fn get_time(&self, index: usize) -> Result<Time> {
        self.with_row(|row| row.get_time(index))
    }

    pub fn get_timestamp(&self, index: usize) -> Result<Timestamp> {
        self.with_row(|row| row.get_timestamp(index))
    }

    pub fn get_object(&self, index: usize) -> Result<Value> {
        self.with_row(|row| row.get_object(index))
    }
}

impl<P: DatabaseProtocol, S: Sharing> Drop for ResultSet<P, S> {
    fn drop(&mut self) {
        if let Ok(false) = self.is_closed()
            && let Err(e) = self.close()
        {
            tracing::warn!(error = %e, result_set = self.id, "failed to close result set on drop");
        }
    }
}
